pub mod frankfurter;

use crate::domain::fare::{round_money, FareOffer};
use crate::error::CheckerError;
use rust_decimal::Decimal;

/// Provider of the latest conversion rate for a currency pair.
#[async_trait::async_trait]
pub trait RateSource: Send + Sync {
    async fn latest_rate(&self, from: &str, to: &str) -> Result<Decimal, CheckerError>;
}

/// Applies one per-run rate to every offer.
///
/// A missing rate, or an offer quoted in a currency other than the rate's base, leaves
/// `price_converted` empty; the offer itself is always kept.
#[derive(Debug, Clone)]
pub struct CurrencyConverter {
    base: String,
    rate: Option<Decimal>,
}

impl CurrencyConverter {
    pub fn new(base: impl Into<String>, rate: Result<Decimal, CheckerError>) -> Self {
        let base = base.into();
        let rate = match rate {
            Ok(rate) => Some(rate),
            Err(err) => {
                tracing::warn!(error = %err, "exchange rate unavailable; converted prices omitted");
                None
            }
        };
        Self { base, rate }
    }

    pub fn rate(&self) -> Option<Decimal> {
        self.rate
    }

    pub fn convert(&self, offer: &FareOffer) -> Option<Decimal> {
        if !offer.source_currency.eq_ignore_ascii_case(&self.base) {
            return None;
        }
        self.rate.map(|rate| convert_amount(offer.price_source, rate))
    }

    /// Returns the offers with converted prices, in the same order.
    pub fn convert_all(&self, offers: Vec<FareOffer>) -> Vec<FareOffer> {
        offers
            .into_iter()
            .map(|offer| {
                let converted = self.convert(&offer);
                offer.with_converted(converted)
            })
            .collect()
    }
}

pub fn convert_amount(amount: Decimal, rate: Decimal) -> Decimal {
    round_money(amount * rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fare::tests::offer;

    #[test]
    fn converts_and_rounds_to_two_places() {
        assert_eq!(
            convert_amount(Decimal::from(38), Decimal::from(30)),
            Decimal::new(114000, 2)
        );
        assert_eq!(
            convert_amount(Decimal::new(3999, 2), Decimal::new(352_117, 4)),
            Decimal::new(140812, 2)
        );
    }

    #[test]
    fn missing_rate_keeps_offer_without_conversion() {
        let converter = CurrencyConverter::new(
            "EUR",
            Err(CheckerError::RateUnavailable {
                from: "EUR".to_string(),
                to: "TRY".to_string(),
                detail: "timeout".to_string(),
            }),
        );
        let out = converter.convert_all(vec![offer("2024-01-10", Decimal::from(42))]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].price_source, Decimal::from(42));
        assert_eq!(out[0].price_converted, None);
    }

    #[test]
    fn foreign_currency_offer_is_not_converted() {
        let converter = CurrencyConverter::new("EUR", Ok(Decimal::from(30)));
        let mut usd = offer("2024-01-10", Decimal::from(40));
        usd.source_currency = "USD".to_string();
        let out = converter.convert_all(vec![usd, offer("2024-01-11", Decimal::from(41))]);
        assert_eq!(out[0].price_converted, None);
        assert_eq!(out[1].price_converted, Some(Decimal::from(1230)));
    }
}
