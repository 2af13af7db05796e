use std::sync::{Arc, Mutex};

use crate::application::{MunicipioExporter, MunicipioImporter};
use crate::domain::error::Result;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::db::municipios::MunicipioRepository;
use crate::infrastructure::db::sqlite;
use crate::infrastructure::storage::ensure_upload_dir;
use crate::interfaces::cli::{
    Cli, Commands, ExportSqlArgs, GlobalArgs, ImportArgs, ListArgs, ServeArgs,
};
use crate::interfaces::http::{start_server, HttpState};
use crate::shared::import_log::{add_log, ImportLog};

/// Run one CLI command; `Ok(false)` means it completed but did not succeed
pub async fn run(cli: Cli) -> Result<bool> {
    let config = load_config(&cli.global)?;

    match cli.command {
        Commands::Serve(args) => serve(config, args).await.map(|_| true),
        Commands::Import(args) => import(config, args).await,
        Commands::ExportSql(args) => export_sql(config, args).await.map(|_| true),
        Commands::List(args) => list(config, args).await.map(|_| true),
    }
}

pub fn load_config(global: &GlobalArgs) -> Result<AppConfig> {
    let mut config = AppConfig::load(global.config.as_deref())?;
    if let Some(url) = &global.database {
        config.database.url = url.clone();
    }
    config.validate()?;
    Ok(config)
}

async fn open_repository(config: &AppConfig) -> Result<Arc<MunicipioRepository>> {
    let pool = sqlite::connect(&config.database.url).await?;
    let repo = MunicipioRepository::new(pool);
    repo.ensure_table().await?;
    Ok(Arc::new(repo))
}

async fn serve(mut config: AppConfig, args: ServeArgs) -> Result<()> {
    if let Some(host) = args.host {
        config.http.host = host;
    }
    if let Some(port) = args.port {
        config.http.port = port;
    }

    let repo = open_repository(&config).await?;
    ensure_upload_dir(&config.http.upload_dir).await?;

    let logs = Arc::new(Mutex::new(Vec::new()));
    add_log(
        &logs,
        "INFO",
        "System",
        &format!(
            "HTTP API listening on {}:{}",
            config.http.host, config.http.port
        ),
    );
    tracing::info!(
        host = %config.http.host,
        port = config.http.port,
        database = %config.database.url,
        "Starting HTTP API"
    );

    let state = HttpState::new(repo, &config, logs);
    start_server(state, &config.http.host, config.http.port)?.await?;
    Ok(())
}

async fn import(config: AppConfig, args: ImportArgs) -> Result<bool> {
    let repo = open_repository(&config).await?;
    let importer = MunicipioImporter::new(repo, config.import.clone());

    let mut log = ImportLog::new("CLI");
    let report = importer.import_file(&args.file, &mut log).await;

    for message in &report.messages {
        println!("  {}", message);
    }
    println!("{}", report.summary());
    if let (Some(encoding), Some(format)) = (&report.encoding, &report.format) {
        println!("  encoding: {}, format: {}", encoding, format);
    }

    Ok(report.success)
}

async fn export_sql(config: AppConfig, args: ExportSqlArgs) -> Result<()> {
    let repo = open_repository(&config).await?;
    let sql = MunicipioExporter::new(repo)
        .export_sql(args.uf.as_deref(), args.limit)
        .await?;

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, sql).await?;
            tracing::info!(path = %path.display(), "SQL script written");
        }
        None => print!("{}", sql),
    }
    Ok(())
}

async fn list(config: AppConfig, args: ListArgs) -> Result<()> {
    let repo = open_repository(&config).await?;

    match args.uf {
        Some(uf) => {
            for record in repo.list_by_uf(&uf).await? {
                println!("{};{};{}", record.cod_municipio, record.nome_municipio, record.uf);
            }
        }
        None => {
            for uf in repo.list_ufs().await? {
                let count = repo.count(Some(&uf)).await?;
                println!("{}\t{}", uf, count);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(dir: &tempfile::TempDir, args: &[&str]) -> Cli {
        let url = sqlite::db_path_to_url(&dir.path().join("cli.db")).unwrap();
        let mut argv = vec!["fiscalbook", "--database", url.as_str()];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[tokio::test]
    async fn test_import_then_export() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("municipios.txt");
        std::fs::write(&file, "MG;Belo Horizonte;3106200\n").unwrap();
        let out = dir.path().join("out.sql");

        let ok = run(cli(&dir, &["import", file.to_str().unwrap()])).await.unwrap();
        assert!(ok);

        run(cli(&dir, &["export-sql", "--output", out.to_str().unwrap()]))
            .await
            .unwrap();
        let sql = std::fs::read_to_string(out).unwrap();
        assert!(sql.contains("VALUES ('MG', '3106200', 'BELO HORIZONTE');"));
    }

    #[tokio::test]
    async fn test_import_failure_is_not_success() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");

        let ok = run(cli(&dir, &["import", missing.to_str().unwrap()])).await.unwrap();
        assert!(!ok);
    }
}
