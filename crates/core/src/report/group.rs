use crate::domain::fare::FareOffer;
use chrono::{Datelike, Month};
use std::collections::BTreeMap;

/// Offers falling in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGroup {
    pub year: i32,
    pub month: Month,
    pub offers: Vec<FareOffer>,
}

impl MonthGroup {
    pub fn name(&self) -> &'static str {
        self.month.name()
    }
}

/// Buckets offers by calendar month.
///
/// Buckets are keyed by `(year, month)`, so within one year they run January through December,
/// and a calendar crossing New Year keeps December ahead of the following January. Each bucket
/// is chronological. Months without offers are not present.
pub fn group_by_month(offers: &[FareOffer]) -> Vec<MonthGroup> {
    let mut buckets: BTreeMap<(i32, u32), Vec<FareOffer>> = BTreeMap::new();
    for offer in offers {
        buckets
            .entry((offer.date.year(), offer.date.month()))
            .or_default()
            .push(offer.clone());
    }

    buckets
        .into_iter()
        .filter_map(|((year, month), mut offers)| {
            let month = Month::try_from(u8::try_from(month).ok()?).ok()?;
            offers.sort_by(|a, b| {
                a.date
                    .cmp(&b.date)
                    .then_with(|| a.price_source.cmp(&b.price_source))
            });
            Some(MonthGroup {
                year,
                month,
                offers,
            })
        })
        .collect()
}
