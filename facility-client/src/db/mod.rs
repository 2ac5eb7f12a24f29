mod facility_queries;

pub use facility_queries::{facilities, meters_for_facility, readings_for_facility};
