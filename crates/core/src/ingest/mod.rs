pub mod filter;
pub mod pegasus;
pub mod types;

use crate::domain::fare::Route;
use crate::error::CheckerError;
use chrono::NaiveDate;
use types::FareCalendar;

/// Source of the per-day fare calendar for a route.
#[async_trait::async_trait]
pub trait FareSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch_calendar(
        &self,
        route: &Route,
        flight_date: NaiveDate,
        currency: &str,
    ) -> Result<FareCalendar, CheckerError>;
}
