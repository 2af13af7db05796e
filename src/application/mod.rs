pub mod use_cases;

pub use use_cases::municipio_export::MunicipioExporter;
pub use use_cases::municipio_import::MunicipioImporter;
