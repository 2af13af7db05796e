pub mod municipio_export;
pub mod municipio_import;
