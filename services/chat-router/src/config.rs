use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 3100;
const ACS_TRIGGER_TIMEOUT: Duration = Duration::from_secs(10);

/// Process configuration, read once from the environment at startup and
/// threaded through [`crate::state::AppState`] / the CLI argument
/// defaults from there on — handlers never re-read the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub router_url: String,
    pub self_url: String,
    pub acs_job_name: Option<String>,
    pub acs_url: String,
    pub acs_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("CHAT_ROUTER_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let data_dir = std::env::var("CHAT_ROUTER_DATA_DIR")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let router_url = std::env::var("CHAT_ROUTER_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"));
        let self_url = std::env::var("ROUTER_SELF_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"));
        let acs_job_name = std::env::var("ACS_JOB_NAME").ok().filter(|s| !s.is_empty());
        let acs_url =
            std::env::var("ACS_URL").unwrap_or_else(|_| "http://127.0.0.1:8377".to_string());

        Self {
            port,
            data_dir,
            router_url,
            self_url,
            acs_job_name,
            acs_url,
            acs_timeout: ACS_TRIGGER_TIMEOUT,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("chat-router.db")
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
