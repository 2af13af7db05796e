pub mod app;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod shared;

pub use crate::app::run;
pub use crate::application::{MunicipioExporter, MunicipioImporter};
pub use crate::domain::error::{AppError, Result};
pub use crate::domain::municipio::{ImportConfig, ImportReport, MunicipioRecord};
pub use crate::infrastructure::config::AppConfig;
pub use crate::interfaces::cli::Cli;
