// utilkit library root
// CSV stream parsing and table driven command line handling.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod services;

pub use error::{Result, ToolkitError};
