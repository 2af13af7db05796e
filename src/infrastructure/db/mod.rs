pub mod municipios;
pub mod sqlite;
