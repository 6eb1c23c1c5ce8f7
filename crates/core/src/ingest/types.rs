use serde::{Deserialize, Serialize};

/// Availability marker the fare source uses for days without a bookable fare.
pub const NO_FARE: &str = "NO_FARE";

/// Field of the fare source response holding the month list.
pub const CALENDAR_FIELD: &str = "cheapFareFlightCalenderModelList";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FareCalendar {
    pub months: Vec<CalendarMonth>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarMonth {
    #[serde(default)]
    pub dep_port: Option<String>,
    #[serde(default)]
    pub arr_port: Option<String>,
    #[serde(default)]
    pub days: Vec<CalendarDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub flight_date: String,
    #[serde(default)]
    pub avail_flight_message: Option<String>,
    #[serde(default)]
    pub cheap_fare: Option<CheapFare>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheapFare {
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarRequest<'a> {
    pub dep_port: &'a str,
    pub arr_port: &'a str,
    pub flight_date: String,
    pub currency: &'a str,
}
