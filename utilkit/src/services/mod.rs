// Pipelines that combine the parser with an output format.
pub mod recode;
