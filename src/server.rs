use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer, Responder};
use farsi_norm::{
    detect_all, detect_numbers, Error, NormalizationConfig, Normalizer, NumberMatch,
    SimilarityRequest, SimilarityScorer,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Clone)]
pub struct AppState {
    pub default_config: Arc<NormalizationConfig>,
}

#[derive(Deserialize)]
pub struct NormalizeRequest {
    text: String,
    config: Option<NormalizationConfig>,
}

#[derive(Serialize, Deserialize)]
pub struct NormalizeResponse {
    text: String,
}

#[derive(Deserialize)]
pub struct NumbersRequest {
    text: String,
    #[serde(default)]
    words: bool,
}

#[derive(Serialize, Deserialize)]
pub struct NumbersResponse {
    count: usize,
    matches: Vec<NumberMatch>,
}

pub async fn run_server(default_config: NormalizationConfig, host: String) -> anyhow::Result<()> {
    let data = web::Data::new(AppState {
        default_config: Arc::new(default_config),
    });

    info!("🚀 Server starting at http://{}", host);

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(Logger::default())
            .configure(routes)
    })
    .bind(host)?
    .run()
    .await?;
    Ok(())
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/normalize", web::post().to(normalize_handler))
        .route("/numbers", web::post().to(numbers_handler))
        .route("/similarity", web::post().to(similarity_handler));
}

fn error_response(err: &Error) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "error": err.to_string(),
        "code": err.code(),
    }))
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn normalize_handler(
    data: web::Data<AppState>,
    req: web::Json<NormalizeRequest>,
) -> impl Responder {
    let req = req.into_inner();
    let start_time = Instant::now();
    let config = req
        .config
        .unwrap_or_else(|| data.default_config.as_ref().clone());

    let text = Normalizer::new(config).normalize(&req.text);
    debug!(elapsed = ?start_time.elapsed(), "normalize request");
    HttpResponse::Ok().json(NormalizeResponse { text })
}

async fn numbers_handler(req: web::Json<NumbersRequest>) -> impl Responder {
    let matches = if req.words {
        detect_all(&req.text)
    } else {
        detect_numbers(&req.text)
    };
    HttpResponse::Ok().json(NumbersResponse {
        count: matches.len(),
        matches,
    })
}

async fn similarity_handler(req: web::Json<SimilarityRequest>) -> impl Responder {
    match SimilarityScorer::default().score(&req) {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(e) => error_response(&e),
    }
}
