pub mod change;
pub mod fare;
