pub mod settings;

pub use settings::ToolSettings;
