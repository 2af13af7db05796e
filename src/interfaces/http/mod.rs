use actix_cors::Cors;
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::application::{MunicipioExporter, MunicipioImporter};
use crate::domain::error::AppError;
use crate::domain::municipio::ImportReport;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::db::municipios::MunicipioRepository;
use crate::infrastructure::storage::save_upload;
use crate::shared::import_log::{add_log, append_to_ring, ImportLog, LogEntry};

/// Largest accepted upload body
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub struct HttpState {
    pub repo: Arc<MunicipioRepository>,
    pub importer: MunicipioImporter,
    pub exporter: MunicipioExporter,
    pub upload_dir: PathBuf,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,

    // One upload at a time, from saving the body to committing the import
    import_lock: tokio::sync::Mutex<()>,
}

impl HttpState {
    pub fn new(
        repo: Arc<MunicipioRepository>,
        config: &AppConfig,
        logs: Arc<Mutex<Vec<LogEntry>>>,
    ) -> Self {
        Self {
            importer: MunicipioImporter::new(repo.clone(), config.import.clone()),
            exporter: MunicipioExporter::new(repo.clone()),
            repo,
            upload_dir: config.http.upload_dir.clone(),
            logs,
            import_lock: tokio::sync::Mutex::new(()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Success,
    Warning,
    Error,
}

impl ImportStatus {
    /// Success when clean, warning when some lines were rejected
    pub fn of(report: &ImportReport) -> Self {
        match (report.success, report.errors) {
            (true, 0) => ImportStatus::Success,
            (true, _) => ImportStatus::Warning,
            (false, _) => ImportStatus::Error,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ImportResponse {
    pub status: ImportStatus,
    pub message: String,
    pub report: Option<ImportReport>,
}

#[derive(Deserialize)]
struct UploadQuery {
    filename: String,
}

#[derive(Deserialize)]
struct ExportQuery {
    uf: Option<String>,
    #[serde(default)]
    limit: usize,
}

fn error_response(err: &AppError) -> HttpResponse {
    match err {
        AppError::ValidationError(_) => HttpResponse::BadRequest().body(err.to_string()),
        AppError::NotFound(_) => HttpResponse::NotFound().body(err.to_string()),
        _ => HttpResponse::InternalServerError().body(err.to_string()),
    }
}

/// Empty or blank `uf` query values mean "all states"
fn uf_filter(uf: &Option<String>) -> Option<&str> {
    uf.as_deref().map(str::trim).filter(|uf| !uf.is_empty())
}

#[post("/importar-municipios")]
async fn import_municipios(
    data: web::Data<HttpState>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> impl Responder {
    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!("Upload received: {} ({} bytes)", query.filename, body.len()),
    );

    if body.is_empty() {
        return HttpResponse::BadRequest().json(ImportResponse {
            status: ImportStatus::Error,
            message: "No file content received".to_string(),
            report: None,
        });
    }

    // Held from save to import so a concurrent upload with the same name
    // cannot replace this body before it is read
    let guard = data.import_lock.lock().await;

    let path = match save_upload(&data.upload_dir, &query.filename, &body).await {
        Ok(path) => path,
        Err(e) => {
            add_log(&data.logs, "ERROR", "HttpApi", &format!("Upload rejected: {}", e));
            let response = ImportResponse {
                status: ImportStatus::Error,
                message: e.to_string(),
                report: None,
            };
            return match e {
                AppError::ValidationError(_) => HttpResponse::BadRequest().json(response),
                _ => HttpResponse::InternalServerError().json(response),
            };
        }
    };

    let mut log = ImportLog::new("Municipios");
    let report = data.importer.import_file(&path, &mut log).await;
    append_to_ring(&data.logs, log.into_entries());
    drop(guard);

    let status = ImportStatus::of(&report);
    let response = ImportResponse {
        status,
        message: report.summary(),
        report: Some(report),
    };
    match status {
        ImportStatus::Error => HttpResponse::UnprocessableEntity().json(response),
        _ => HttpResponse::Ok().json(response),
    }
}

#[get("/ufs")]
async fn list_ufs(data: web::Data<HttpState>) -> impl Responder {
    match data.repo.list_ufs().await {
        Ok(ufs) => HttpResponse::Ok().json(ufs),
        Err(e) => {
            add_log(&data.logs, "ERROR", "HttpApi", &format!("Failed to list UFs: {}", e));
            error_response(&e)
        }
    }
}

#[get("/municipios/export.sql")]
async fn export_sql(data: web::Data<HttpState>, query: web::Query<ExportQuery>) -> impl Responder {
    match data.exporter.export_sql(uf_filter(&query.uf), query.limit).await {
        Ok(sql) => HttpResponse::Ok()
            .content_type("application/sql; charset=utf-8")
            .insert_header(("Content-Disposition", "attachment; filename=\"municipios.sql\""))
            .body(sql),
        Err(e) => {
            add_log(&data.logs, "ERROR", "HttpApi", &format!("SQL export failed: {}", e));
            error_response(&e)
        }
    }
}

#[get("/municipios/export.csv")]
async fn export_csv(data: web::Data<HttpState>, query: web::Query<ExportQuery>) -> impl Responder {
    match data.exporter.export_csv(uf_filter(&query.uf)).await {
        Ok(csv) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header(("Content-Disposition", "attachment; filename=\"municipios.csv\""))
            .body(csv),
        Err(e) => {
            add_log(&data.logs, "ERROR", "HttpApi", &format!("CSV export failed: {}", e));
            error_response(&e)
        }
    }
}

#[get("/municipios/{uf}")]
async fn list_municipios(data: web::Data<HttpState>, uf: web::Path<String>) -> impl Responder {
    match data.repo.list_by_uf(&uf).await {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(e) => error_response(&e),
    }
}

#[get("/municipio/{codigo}")]
async fn get_municipio(data: web::Data<HttpState>, codigo: web::Path<String>) -> impl Responder {
    match data.repo.find_by_code(&codigo).await {
        Ok(Some(record)) => HttpResponse::Ok().json(record),
        Ok(None) => error_response(&AppError::NotFound(format!("Municipality {}", codigo))),
        Err(e) => error_response(&e),
    }
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = match data.logs.lock() {
        Ok(logs) => logs,
        Err(poisoned) => poisoned.into_inner(),
    };
    HttpResponse::Ok().json(&*logs)
}

/// Register every `/api` route; export routes precede `/municipios/{uf}`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_UPLOAD_BYTES)).service(
        web::scope("/api")
            .service(import_municipios)
            .service(list_ufs)
            .service(export_sql)
            .service(export_csv)
            .service(list_municipios)
            .service(get_municipio)
            .service(get_logs),
    );
}

pub fn start_server(state: HttpState, host: &str, port: u16) -> std::io::Result<Server> {
    let state = web::Data::new(state);

    let server = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((host, port))?
    .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::municipio::MunicipioRecord;
    use crate::infrastructure::db::sqlite::{connect, db_path_to_url};
    use actix_web::{http::StatusCode, test};

    async fn state(dir: &tempfile::TempDir) -> web::Data<HttpState> {
        let url = db_path_to_url(&dir.path().join("http.db")).unwrap();
        let repo = Arc::new(MunicipioRepository::new(connect(&url).await.unwrap()));
        repo.ensure_table().await.unwrap();

        let mut config = AppConfig::default();
        config.http.upload_dir = dir.path().join("uploads");
        web::Data::new(HttpState::new(repo, &config, Arc::new(Mutex::new(Vec::new()))))
    }

    #[actix_web::test]
    async fn test_upload_then_query() {
        let dir = tempfile::tempdir().unwrap();
        let data = state(&dir).await;
        let app =
            test::init_service(App::new().app_data(data.clone()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/importar-municipios?filename=lista.txt")
            .set_payload("3106200;Belo Horizonte;MG\n5208707;Goiânia;GO\nbroken\n")
            .to_request();
        let resp: ImportResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.status, ImportStatus::Warning);
        assert_eq!(resp.report.unwrap().imported, 2);
        assert!(dir.path().join("uploads").join("lista.txt").exists());

        let req = test::TestRequest::get().uri("/api/ufs").to_request();
        let ufs: Vec<String> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ufs, vec!["GO", "MG"]);

        let req = test::TestRequest::get().uri("/api/municipio/3106200").to_request();
        let found: MunicipioRecord = test::call_and_read_body_json(&app, req).await;
        assert_eq!(found.nome_municipio, "BELO HORIZONTE");

        let req = test::TestRequest::get().uri("/api/logs").to_request();
        let logs: Vec<LogEntry> = test::call_and_read_body_json(&app, req).await;
        assert!(logs.iter().any(|e| e.source == "Municipios"));
    }

    #[actix_web::test]
    async fn test_concurrent_uploads_with_same_name_import_own_body() {
        let dir = tempfile::tempdir().unwrap();
        let data = state(&dir).await;
        let app =
            test::init_service(App::new().app_data(data.clone()).configure(configure)).await;

        let first = test::TestRequest::post()
            .uri("/api/importar-municipios?filename=lista.txt")
            .set_payload("01;Acme;GO\n")
            .to_request();
        let second = test::TestRequest::post()
            .uri("/api/importar-municipios?filename=lista.txt")
            .set_payload("02;Beta;SP\n03;Gama;MT\n")
            .to_request();

        let (first, second) = tokio::join!(
            test::call_service(&app, first),
            test::call_service(&app, second)
        );
        let first: ImportResponse = test::read_body_json(first).await;
        let second: ImportResponse = test::read_body_json(second).await;

        assert_eq!(first.report.unwrap().imported, 1);
        assert_eq!(second.report.unwrap().imported, 2);
    }

    #[actix_web::test]
    async fn test_failed_import_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let data = state(&dir).await;
        let app =
            test::init_service(App::new().app_data(data.clone()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/importar-municipios?filename=bad.txt")
            .set_payload("hello world\n")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: ImportResponse = test::read_body_json(resp).await;
        assert_eq!(body.status, ImportStatus::Error);
    }

    #[actix_web::test]
    async fn test_lookup_errors() {
        let dir = tempfile::tempdir().unwrap();
        let data = state(&dir).await;
        let app =
            test::init_service(App::new().app_data(data.clone()).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/municipios/XYZ").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/api/municipio/999").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri("/api/municipios/export.sql?limit=5")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
