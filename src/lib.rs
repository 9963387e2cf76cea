pub mod config;
pub mod db;
pub mod error;
pub mod influx;
pub mod mqtt;
pub mod poller;
pub mod portal;
pub mod reading;
pub mod scheduler;
pub mod sink;

pub use config::Config;
pub use error::{AuthError, CycleError, DeliveryError, FetchError};
pub use poller::Poller;
pub use reading::{HeatPumpState, Reading};
pub use scheduler::Scheduler;
