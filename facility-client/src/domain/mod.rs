mod facility;
mod meter;
mod reading;

pub use facility::Facility;
pub use meter::{Meter, MeterType};
pub use reading::{parse_reading_date, parse_reading_value, Reading};
