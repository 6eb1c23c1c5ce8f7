pub mod flight_date;
