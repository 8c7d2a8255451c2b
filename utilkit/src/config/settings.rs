// Tool settings, loaded from a JSON file and overridden by command line options
use std::fs;
use std::path::Path;

use serde::Deserialize;
use shared::models::CsvDialect;
use tracing::debug;

use crate::data::csv_parser::CsvReader;
use crate::error::{Result, ToolkitError};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ToolSettings {
    pub csv: CsvDialect,
    pub output_delimiter: char,
}

impl Default for ToolSettings {
    fn default() -> Self {
        ToolSettings {
            csv: CsvDialect::default(),
            output_delimiter: ',',
        }
    }
}

impl ToolSettings {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let settings: ToolSettings = serde_json::from_str(&text)?;
        debug!(path = %path.display(), ?settings, "Loaded tool settings");
        Ok(settings)
    }

    pub fn reader(&self) -> Result<CsvReader> {
        CsvReader::try_from(&self.csv)
    }

    pub fn output_delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.output_delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                ToolkitError::ConfigError(format!(
                    "Output delimiter '{}' is not a single ASCII character",
                    self.output_delimiter
                ))
            })
    }
}
