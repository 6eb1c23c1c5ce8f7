use crate::domain::fare::{round_money, FareOffer, Route};
use crate::ingest::types::{CalendarDay, FareCalendar, NO_FARE};
use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// Admits calendar days that are bookable and priced within `(0, ceiling]`.
#[derive(Debug, Clone)]
pub struct FareFilter {
    pub ceiling: Decimal,
    pub source_currency: String,
    pub target_currency: String,
}

impl FareFilter {
    /// Returns qualifying offers in calendar traversal order, without converted prices.
    pub fn apply(&self, calendar: &FareCalendar, route: &Route) -> Vec<FareOffer> {
        let mut out = Vec::new();
        for month in &calendar.months {
            let origin = month.dep_port.as_deref().unwrap_or(&route.origin);
            let destination = month.arr_port.as_deref().unwrap_or(&route.destination);

            for day in &month.days {
                let Some(price) = self.admit(day) else {
                    continue;
                };

                let Some(date) = parse_flight_date(&day.flight_date) else {
                    tracing::warn!(flight_date = %day.flight_date, "skipping day with unparseable date");
                    continue;
                };

                let currency = day
                    .cheap_fare
                    .as_ref()
                    .and_then(|f| f.currency.clone())
                    .unwrap_or_else(|| self.source_currency.clone());

                out.push(FareOffer {
                    date,
                    price_source: price,
                    price_converted: None,
                    source_currency: currency,
                    target_currency: self.target_currency.clone(),
                    origin: origin.to_string(),
                    destination: destination.to_string(),
                });
            }
        }
        out
    }

    fn admit(&self, day: &CalendarDay) -> Option<Decimal> {
        if day.avail_flight_message.as_deref() == Some(NO_FARE) {
            return None;
        }
        let fare = day.cheap_fare.as_ref()?;
        if fare.amount <= 0.0 {
            return None;
        }
        let price = round_money(Decimal::from_f64(fare.amount)?);
        (price > Decimal::ZERO && price <= self.ceiling).then_some(price)
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time component.
fn parse_flight_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}
