use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use plantcare::{web, Config, HttpPredictor, UploadController};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let predictor = match HttpPredictor::new(&config.predictor) {
        Ok(predictor) => predictor,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };
    let controller = Arc::new(UploadController::new(Arc::new(predictor)));
    let app = web::router(controller, config.body_limit_bytes);

    let addr = match config.resolve_bind_addr().await {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid bind address: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Listening on http://{}, predictions via {}",
        addr,
        config.predictor.predict_url()
    );
    let server = match axum::Server::try_bind(&addr) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = server.serve(app.into_make_service()).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("plantcare=info"));

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(env_filter)
            .init();
    }
}
