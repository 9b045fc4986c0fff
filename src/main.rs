mod classifier;
mod config;
mod engine;
mod error;
mod features;
mod lemmatizer;
mod normalizer;
mod pipeline_engine;
mod stopwords;
mod types;
mod vectorizer;

use anyhow::Context;
use axum::{
    Router,
    extract::{DefaultBodyLimit, State, rejection::JsonRejection},
    response::Json,
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use axum_prometheus::metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use clap::Parser;
use metrics::counter;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use config::{ArtifactConfig, Config, HttpConfig, ServeMode};
use engine::Engine;
use error::ApiError;
use pipeline_engine::{Pipeline, PipelineEngine};
use types::{MessageResponse, PredictionRequest, PredictionResponse};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.log_json);
    tracing::info!("Starting question classifier with config: {:?}", config);

    let artifact_config = ArtifactConfig::from(&config);

    tracing::info!("Loading model and vectorizer...");
    let pipeline =
        Pipeline::load(&artifact_config).context("Failed to load model or vectorizer")?;
    tracing::info!("Model loaded successfully");

    let metric_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install metrics recorder")?;

    let state = AppState::new(Arc::new(PipelineEngine::new(pipeline)));
    let app = build_app(state, &HttpConfig::from(&config), metric_handle);

    match config.serve_mode() {
        ServeMode::Lambda => {
            tracing::info!("Serving through the AWS Lambda runtime");
            lambda_http::run(app)
                .await
                .map_err(|e| anyhow::anyhow!("Lambda runtime failed: {e}"))?;
        }
        ServeMode::Http => {
            let listener = TcpListener::bind(&config.server_address()).await?;
            tracing::info!("Server running on http://{}", config.server_address());

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }
    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,qclass=debug".into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutting down gracefully");
}

#[derive(Clone)]
struct AppState {
    engine: Arc<dyn Engine + Send + Sync>,
}

impl AppState {
    fn new(engine: Arc<dyn Engine + Send + Sync>) -> Self {
        Self { engine }
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/predict", post(predict_handler))
        .with_state(state)
}

/// The routes plus `/metrics` and the middleware stack shared by both serving modes.
fn build_app(state: AppState, http: &HttpConfig, metric_handle: PrometheusHandle) -> Router {
    let app = router(state)
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .layer(PrometheusMetricLayer::new())
        .layer(TimeoutLayer::new(http.request_timeout))
        .layer(DefaultBodyLimit::disable());

    let app = match http.max_body_bytes {
        Some(limit) => app.layer(RequestBodyLimitLayer::new(limit)),
        None => app,
    };
    app.layer(TraceLayer::new_for_http())
}

async fn root_handler() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Hello World",
    })
}

#[tracing::instrument(skip_all, fields(text_len = tracing::field::Empty))]
async fn predict_handler(
    State(state): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    counter!("prediction_requests_total").increment(1);
    let Json(request) = payload?;
    tracing::Span::current().record("text_len", request.text.len());

    let prediction = state.engine.predict(request.text).await.map_err(|e| {
        counter!("prediction_failures_total").increment(1);
        ApiError::Prediction(e)
    })?;

    counter!("predictions_total", "label" => prediction.as_str()).increment(1);
    tracing::info!(prediction = prediction.as_str(), "Prediction completed");
    Ok(Json(PredictionResponse { prediction }))
}
