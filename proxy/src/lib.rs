//! Backend for the Aranet dashboard: forwards queries to the Aranet Cloud
//! API and flattens the measurements payload for the frontend.

pub mod aranet;
pub mod config;
pub mod errors;
pub mod lookup;
pub mod metrics;
pub mod model;
pub mod rest;

pub use aranet::AranetClient;
pub use config::Config;
pub use errors::{Error, Result};
