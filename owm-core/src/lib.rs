//! Core library for the `owm` client.
//!
//! This crate defines:
//! - Attribute scraping over OpenWeatherMap XML payloads
//! - The forecast record and its typed accessors
//! - Request building, the byte-stream transport seam and the fetch client
//! - Configuration handling
//!
//! It is used by `owm-cli`, but is small enough to embed in any device-side service.

pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod record;
pub mod transport;

mod response;

pub use client::{ClientSettings, OpenWeather};
pub use config::{Config, ServerConfig, TimeoutConfig};
pub use error::{FetchError, FetchStatus};
pub use extract::extract_attribute;
pub use model::{ForecastKind, ForecastQuery, Location, Units};
pub use record::ForecastRecord;
pub use transport::{TcpTransport, Transport};
