pub mod import_log;
