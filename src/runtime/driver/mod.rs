pub mod cli;

pub use cli::{CliDriver, DriverError, DriverResult};
