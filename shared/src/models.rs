use serde::{Deserialize, Serialize};

/// One parsed CSV record, fields in column order.
pub type Row = Vec<String>;

/// Raw command line arguments, program name excluded.
pub type ArgList = Vec<String>;

/// Serializable description of how a CSV stream is laid out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvDialect {
    pub delimiter: char,
    pub skip_first_row: bool,
}

impl Default for CsvDialect {
    fn default() -> Self {
        CsvDialect {
            delimiter: ';',
            skip_first_row: false,
        }
    }
}
