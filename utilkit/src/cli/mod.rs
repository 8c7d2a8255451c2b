// Command line handling: option table, dispatcher and stock actions.
pub mod params;
pub mod parser;

pub use params::{increment_param, toggle_param, value_param};
pub use parser::{Arg, Parser, ProcessOutcome};
