pub mod bus;
pub mod config;
pub mod covert;
pub mod error;
pub mod packet;
pub mod relay;
pub mod report;
pub mod stats;

pub use error::{Error, Result};

#[cfg(test)]
mod test;
