pub mod error;

// Municipality reference data and import pipeline types
pub mod municipio;
