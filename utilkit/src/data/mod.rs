pub mod csv_parser;
pub mod typed;

pub use csv_parser::{CsvReader, DEFAULT_DELIMITER};
pub use typed::{FromRow, Skip};
