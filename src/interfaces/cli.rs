//! Command-line arguments for the `fiscalbook` binary

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "fiscalbook",
    version,
    about = "Municipal bookkeeping service and municipality reference-data importer"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments available to all subcommands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Configuration file (default: ./fiscalbook.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Database URL, overrides `database.url`
    #[arg(long, global = true, value_name = "URL")]
    pub database: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API
    Serve(ServeArgs),

    /// Replace the municipality table with the contents of a file
    Import(ImportArgs),

    /// Write the municipality table as a SQL script
    ExportSql(ExportSqlArgs),

    /// List states, or the municipalities of one state
    List(ListArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Bind address, overrides `http.host`
    #[arg(long)]
    pub host: Option<String>,

    /// Port, overrides `http.port`
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// Municipality file (semicolon, comma or key-value layout)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ExportSqlArgs {
    /// Only export one state
    #[arg(long, value_name = "UF")]
    pub uf: Option<String>,

    /// Maximum number of rows (0 = all)
    #[arg(long, default_value_t = 0)]
    pub limit: usize,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// State whose municipalities to list
    #[arg(long, value_name = "UF")]
    pub uf: Option<String>,
}

impl Cli {
    /// Log filter directive derived from the verbosity flags
    pub fn log_level(&self) -> &'static str {
        if self.global.verbose {
            "debug"
        } else if self.global.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_import() {
        let cli = Cli::try_parse_from(["fiscalbook", "import", "municipios.txt", "-v"]).unwrap();
        assert_eq!(cli.log_level(), "debug");
        match cli.command {
            Commands::Import(args) => assert_eq!(args.file, PathBuf::from("municipios.txt")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_export_sql_defaults() {
        let cli = Cli::try_parse_from(["fiscalbook", "export-sql", "--uf", "sp"]).unwrap();
        match cli.command {
            Commands::ExportSql(args) => {
                assert_eq!(args.uf.as_deref(), Some("sp"));
                assert_eq!(args.limit, 0);
                assert!(args.output.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["fiscalbook", "-v", "-q", "list"]).is_err());
    }

    #[test]
    fn test_global_database_flag() {
        let cli =
            Cli::try_parse_from(["fiscalbook", "list", "--database", "sqlite://x.db"]).unwrap();
        assert_eq!(cli.global.database.as_deref(), Some("sqlite://x.db"));
        assert_eq!(cli.log_level(), "info");
    }
}
