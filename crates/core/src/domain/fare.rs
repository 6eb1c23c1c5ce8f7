use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Round a money amount to two decimal places, half away from zero.
///
/// The result always carries a scale of two, so it serializes as `38.00` rather than `38`.
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Fixed origin/destination pair queried by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub origin: String,
    pub destination: String,
}

impl Route {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.origin, self.destination)
    }
}

/// One qualifying flight on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareOffer {
    pub date: NaiveDate,
    pub price_source: Decimal,
    pub price_converted: Option<Decimal>,
    pub source_currency: String,
    pub target_currency: String,
    pub origin: String,
    pub destination: String,
}

impl FareOffer {
    /// Consumes the offer and returns a copy carrying the converted price.
    pub fn with_converted(self, price_converted: Option<Decimal>) -> Self {
        Self {
            price_converted,
            ..self
        }
    }

    pub fn is_cheaper_than(&self, threshold: Decimal) -> bool {
        self.price_source < threshold
    }
}

/// The ordered set of offers accepted by a single run.
///
/// Offers are sorted by price, then date, on construction so that the same fare set always
/// compares equal across runs regardless of upstream traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FareSnapshot {
    offers: Vec<FareOffer>,
}

impl FareSnapshot {
    pub fn new(mut offers: Vec<FareOffer>) -> Self {
        offers.sort_by(|a, b| {
            a.price_source
                .cmp(&b.price_source)
                .then_with(|| a.date.cmp(&b.date))
                .then_with(|| a.origin.cmp(&b.origin))
                .then_with(|| a.destination.cmp(&b.destination))
        });
        Self { offers }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a snapshot keeping the given order as-is.
    ///
    /// Used when reading back a persisted snapshot, whose order is already canonical.
    pub fn from_ordered(offers: Vec<FareOffer>) -> Self {
        Self { offers }
    }

    pub fn offers(&self) -> &[FareOffer] {
        &self.offers
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}
