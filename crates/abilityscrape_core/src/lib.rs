pub mod aggregate;
pub mod config;
pub mod driver;
pub mod error;
pub mod fetch;
pub mod matcher;
pub mod model;
pub mod observer;
pub mod output;
pub mod report_url;

pub use error::{Result, ScrapeError};
