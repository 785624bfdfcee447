#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the tree census dashboard.
//!
//! Loads the census once at startup, encodes it into a shared
//! [`CensusContext`], and serves the chart API plus the static dashboard
//! page. Every request only reads the shared context.

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpResponse, HttpServer, error, middleware, web};
use tree_census::CensusContext;
use tree_census_server_models::ApiError;
use tree_census_source::{CensusSource, FetchOptions, SnapshotSource, SocrataSource, socrata};

/// Shared application state.
pub struct AppState {
    /// Encoded census, read-only after startup.
    pub census: Arc<CensusContext>,
}

/// Server settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind (`BIND_ADDR`).
    pub bind_addr: String,
    /// Port to listen on (`PORT`).
    pub port: u16,
    /// Snapshot file to load instead of the live API (`TREE_CENSUS_SNAPSHOT`).
    pub snapshot: Option<String>,
    /// Socrata resource URL (`TREE_CENSUS_API_URL`).
    pub api_url: String,
    /// Row cap for the startup fetch (`TREE_CENSUS_LIMIT`).
    pub limit: Option<u64>,
    /// Socrata application token (`SOCRATA_APP_TOKEN`).
    pub app_token: Option<String>,
    /// Directory holding `index.html`.
    pub static_dir: String,
}

/// Default port, matching the dashboard's historical address.
pub const DEFAULT_PORT: u16 = 8050;

impl ServerConfig {
    /// Reads the configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: non_empty("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            snapshot: non_empty("TREE_CENSUS_SNAPSHOT"),
            api_url: non_empty("TREE_CENSUS_API_URL")
                .unwrap_or_else(|| socrata::TREE_CENSUS_API_URL.to_string()),
            limit: non_empty("TREE_CENSUS_LIMIT").and_then(|l| l.parse().ok()),
            app_token: non_empty("SOCRATA_APP_TOKEN"),
            static_dir: non_empty("TREE_CENSUS_STATIC_DIR").unwrap_or_else(|| "app".to_string()),
        }
    }

    fn source(&self) -> Box<dyn CensusSource> {
        match &self.snapshot {
            Some(path) => Box::new(SnapshotSource::new(path)),
            None => Box::new(SocrataSource::new(&self.api_url)),
        }
    }

    fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            limit: self.limit,
            page_size: None,
            app_token: self.app_token.clone(),
        }
    }
}

/// Registers the `/api` routes.
///
/// Malformed query strings are answered with `400` and an [`ApiError`] body.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    let query_config = web::QueryConfig::default().error_handler(|err, _req| {
        let body = ApiError {
            error: err.to_string(),
        };
        error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    });

    cfg.service(
        web::scope("/api")
            .app_data(query_config)
            .route("/health", web::get().to(handlers::health))
            .route("/options", web::get().to(handlers::options))
            .route(
                "/charts/species-health",
                web::get().to(handlers::species_chart),
            )
            .route(
                "/charts/steward-health",
                web::get().to(handlers::steward_chart),
            ),
    );
}

/// Loads and encodes the census from the configured source.
///
/// # Errors
///
/// Returns an `std::io::Error` if the rows cannot be fetched or none of
/// them can be encoded.
pub async fn load_census(config: &ServerConfig) -> std::io::Result<CensusContext> {
    let source = config.source();
    log::info!("Loading tree census from {}...", source.name());

    let records = source
        .fetch(&config.fetch_options())
        .await
        .map_err(std::io::Error::other)?;

    CensusContext::from_raw(&records).map_err(std::io::Error::other)
}

/// Starts the tree census API server.
///
/// Fetches the census once, then serves requests from memory. This is a
/// regular async function; the caller provides the runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Error` if the census cannot be loaded, or if the
/// HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env();

    let census = match load_census(&config).await {
        Ok(census) => census,
        Err(e) => {
            log::error!("Failed to load tree census: {e}");
            return Err(e);
        }
    };

    let state = web::Data::new(AppState {
        census: Arc::new(census),
    });

    let static_dir = config.static_dir.clone();
    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_api)
            .service(Files::new("/", &static_dir).index_file("index.html"))
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use actix_web::{http::StatusCode, test as actix_test};
    use serde_json::Value;
    use tree_census_models::RawRecord;

    use super::*;

    fn raw(species: &str, borough: &str, health: &str, steward: &str, count: u64) -> RawRecord {
        RawRecord {
            species: Some(species.to_string()),
            borough: Some(borough.to_string()),
            health: Some(health.to_string()),
            steward: Some(steward.to_string()),
            count,
        }
    }

    fn state() -> web::Data<AppState> {
        let records = vec![
            raw("ash", "Bronx", "Good", "None", 3),
            raw("ash", "Bronx", "Poor", "1or2", 1),
            raw("birch", "Queens", "Fair", "None", 2),
            raw("birch", "Bronx", "Good", "3or4", 5),
        ];
        web::Data::new(AppState {
            census: Arc::new(CensusContext::from_raw(&records).unwrap()),
        })
    }

    async fn get(uri: &str) -> (StatusCode, Value) {
        let app =
            actix_test::init_service(App::new().app_data(state()).configure(configure_api)).await;
        let req = actix_test::TestRequest::get().uri(uri).to_request();
        let resp = actix_test::call_service(&app, req).await;
        let status = resp.status();
        let body: Value = actix_test::read_body_json(resp).await;
        (status, body)
    }

    #[test]
    fn config_defaults() {
        let config = ServerConfig::from_lookup(|_| None);
        assert_eq!(config.bind_addr, "127.0.0.1");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.api_url, socrata::TREE_CENSUS_API_URL);
        assert_eq!(config.snapshot, None);
        assert_eq!(config.limit, None);
        assert_eq!(config.static_dir, "app");
    }

    #[test]
    fn config_from_vars() {
        let vars: BTreeMap<&str, &str> = [
            ("PORT", "9000"),
            ("TREE_CENSUS_SNAPSHOT", "data/trees.json"),
            ("TREE_CENSUS_LIMIT", "500"),
            ("SOCRATA_APP_TOKEN", "  "),
        ]
        .into_iter()
        .collect();
        let config = ServerConfig::from_lookup(|key| vars.get(key).map(ToString::to_string));

        assert_eq!(config.port, 9000);
        assert_eq!(config.snapshot.as_deref(), Some("data/trees.json"));
        assert_eq!(config.limit, Some(500));
        assert_eq!(config.app_token, None);
        assert!(config.source().name().starts_with("snapshot"));
    }

    #[test]
    fn unparseable_port_falls_back() {
        let config = ServerConfig::from_lookup(|key| (key == "PORT").then(|| "http".to_string()));
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[actix_web::test]
    async fn health_reports_rows() {
        let (status, body) = get("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["healthy"], true);
        assert_eq!(body["rows"], 4);
        assert_eq!(body["species"], 2);
    }

    #[actix_web::test]
    async fn options_list_every_control() {
        let (status, body) = get("/api/options").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["boroughs"].as_array().unwrap().len(), 5);
        assert_eq!(body["boroughs"][4]["label"], "Staten Island");
        assert_eq!(body["species"][0]["label"], "ash");
        assert_eq!(body["species"][1]["value"], 1);
        assert_eq!(body["sortPolicies"][1]["value"], "Count");
        assert_eq!(body["normalizations"][1]["value"], "Full Counts");
        assert_eq!(body["minCount"]["max"], 100);
    }

    #[actix_web::test]
    async fn species_chart_defaults() {
        let (status, body) = get("/api/charts/species-health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["categoryField"], "Species");
        assert_eq!(body["valueField"], "Proportion of Trees");
        assert_eq!(body["categoryOrder"], serde_json::json!(["ash", "birch"]));
        assert_eq!(body["figure"]["layout"]["height"], 3000);
    }

    #[actix_web::test]
    async fn species_chart_full_counts_in_borough() {
        let (status, body) =
            get("/api/charts/species-health?borough=0&mode=Full%20Counts&sort=Alpha").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valueField"], "Count of Trees");
        let rows = body["rows"].as_array().unwrap();
        assert!(rows.iter().all(|r| r["Count of Trees"].is_u64()));
    }

    #[actix_web::test]
    async fn species_chart_rejects_off_step_threshold() {
        let (status, body) = get("/api/charts/species-health?minCount=30").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("30"));
    }

    #[actix_web::test]
    async fn malformed_query_is_bad_request() {
        let (status, body) = get("/api/charts/species-health?sort=Sideways").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn steward_chart_for_species() {
        let (status, body) = get("/api/charts/steward-health?species=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["categoryField"], "Number of Stewards");
        assert_eq!(body["figure"]["layout"]["height"], 200);
        assert_eq!(
            body["categoryOrder"],
            serde_json::json!(["None", "1 or 2", "3 or 4", "More than 4"])
        );
    }

    #[actix_web::test]
    async fn unknown_borough_yields_empty_chart() {
        let (status, body) = get("/api/charts/steward-health?borough=9").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["rows"].as_array().unwrap().is_empty());
    }
}
