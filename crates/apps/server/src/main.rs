use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use catalog::DancerCatalog;
use layers::DeclusterConfig;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod api;

use api::AppState;

#[derive(Clone, Debug)]
struct ServerConfig {
    addr: SocketAddr,
    data_path: PathBuf,
    static_root: PathBuf,
    base_url: String,
    decluster: DeclusterConfig,
}

impl ServerConfig {
    fn from_env() -> Self {
        let default_addr = SocketAddr::from(([127, 0, 0, 1], 8080));
        let addr = match env::var("DANCEMAP_ADDR") {
            Ok(raw) => raw.parse().unwrap_or_else(|err| {
                warn!("invalid DANCEMAP_ADDR {raw:?} ({err}); using {default_addr}");
                default_addr
            }),
            Err(_) => default_addr,
        };
        let defaults = DeclusterConfig::default();

        Self {
            addr,
            data_path: env::var("DANCEMAP_DATA")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/dancers.json")),
            static_root: env::var("DANCEMAP_STATIC_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("public")),
            base_url: env::var("DANCEMAP_BASE_URL").unwrap_or_else(|_| "/".to_string()),
            decluster: DeclusterConfig {
                overlap_threshold_px: env_var_f64(
                    "DANCEMAP_OVERLAP_PX",
                    defaults.overlap_threshold_px,
                ),
                separation_radius_px: env_var_f64(
                    "DANCEMAP_SEPARATION_PX",
                    defaults.separation_radius_px,
                ),
            },
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::from_env();

    // A broken dataset does not stop the server; dataset endpoints report it.
    let dataset = match DancerCatalog::load(&config.data_path) {
        Ok(catalog) => {
            info!(
                path = %config.data_path.display(),
                dancers = catalog.len(),
                hash = catalog.content_hash(),
                "loaded dancer dataset"
            );
            Ok(catalog)
        }
        Err(err) => {
            error!("failed to load {}: {err}", config.data_path.display());
            Err(err.to_string())
        }
    };

    let state = AppState {
        dataset: Arc::new(dataset),
        decluster: config.decluster,
        base_url: config.base_url.clone(),
    };
    let app = api::router(state, &config.static_root);

    let listener = match tokio::net::TcpListener::bind(config.addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {}: {err}", config.addr);
            return;
        }
    };
    info!("dance map server listening on http://{}", config.addr);
    if let Err(err) = axum::serve(listener, app).await {
        error!("server error: {err}");
    }
}

fn env_var_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(default)
}
