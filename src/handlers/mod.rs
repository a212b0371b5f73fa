//! HTTP request handlers.

mod health;
mod jobs;
pub(crate) mod problem_details;
mod sensors;

pub use health::{livez, readyz, version};
pub use jobs::{get_job, list_jobs, start_job, stop_job};
pub use sensors::{
    get_relay, latest_climate, list_relays, read_climate, read_water_level,
    read_water_temperature, set_relay,
};
