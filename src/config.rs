use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Server host to bind to
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Server port to bind to
    #[arg(long, env = "PORT", default_value = "8000")]
    pub port: u16,

    /// Path to the serialized classifier
    #[arg(long, env = "MODEL_PATH", default_value = "artifacts/svm_model.json")]
    pub model_path: PathBuf,

    /// Path to the serialized TF-IDF vectorizer
    #[arg(
        long,
        env = "VECTORIZER_PATH",
        default_value = "artifacts/tfidf_vectorizer.json"
    )]
    pub vectorizer_path: PathBuf,

    /// NLTK data directory holding the stopword and WordNet corpora
    #[arg(long, env = "RESOURCE_PATH", default_value = "/usr/share/nltk_data")]
    pub resource_path: PathBuf,

    /// Stopword list to load from the resource directory
    #[arg(long, env = "STOPWORD_LANGUAGE", default_value = "english")]
    pub stopword_language: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Maximum accepted request body size in bytes; unlimited when unset
    #[arg(long, env = "MAX_BODY_BYTES")]
    pub max_body_bytes: Option<usize>,

    /// Serve through the AWS Lambda runtime instead of binding a port
    #[arg(long, env = "LAMBDA_MODE")]
    pub lambda: bool,

    /// Set by the Lambda execution environment; selects Lambda mode when present
    #[arg(long, env = "AWS_LAMBDA_RUNTIME_API", hide = true)]
    pub lambda_runtime_api: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeMode {
    Http,
    Lambda,
}

/// Layers wrapped around the router.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub request_timeout: Duration,
    pub max_body_bytes: Option<usize>,
}

impl From<&Config> for HttpConfig {
    fn from(config: &Config) -> Self {
        Self {
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            max_body_bytes: config.max_body_bytes,
        }
    }
}

/// Everything needed to bring the classification pipeline up.
#[derive(Debug, Clone)]
pub struct ArtifactConfig {
    pub model_path: PathBuf,
    pub vectorizer_path: PathBuf,
    pub resource_path: PathBuf,
    pub stopword_language: String,
}

impl From<&Config> for ArtifactConfig {
    fn from(config: &Config) -> Self {
        Self {
            model_path: config.model_path.clone(),
            vectorizer_path: config.vectorizer_path.clone(),
            resource_path: config.resource_path.clone(),
            stopword_language: config.stopword_language.clone(),
        }
    }
}

impl Config {
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn serve_mode(&self) -> ServeMode {
        if self.lambda || self.lambda_runtime_api.is_some() {
            ServeMode::Lambda
        } else {
            ServeMode::Http
        }
    }
}
