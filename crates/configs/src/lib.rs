use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub gcp: GcpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
}

/// Cloud project plus per-service endpoints. Endpoints are overridable so
/// emulators and test servers can stand in for the real services.
#[derive(Debug, Clone, Deserialize)]
pub struct GcpConfig {
    #[serde(default = "default_project_id")]
    pub project_id: String,
    #[serde(default)]
    pub vision: VisionConfig,
    #[serde(default)]
    pub pubsub: PubSubConfig,
    #[serde(default)]
    pub spanner: SpannerConfig,
}

impl Default for GcpConfig {
    fn default() -> Self {
        Self {
            project_id: default_project_id(),
            vision: VisionConfig::default(),
            pubsub: PubSubConfig::default(),
            spanner: SpannerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisionConfig {
    #[serde(default = "default_vision_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self { endpoint: default_vision_endpoint(), max_results: default_max_results() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PubSubConfig {
    #[serde(default = "default_pubsub_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default = "default_subscription")]
    pub subscription: String,
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self {
            endpoint: default_pubsub_endpoint(),
            topic: default_topic(),
            subscription: default_subscription(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpannerConfig {
    #[serde(default = "default_spanner_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_instance")]
    pub instance: String,
    #[serde(default = "default_spanner_database")]
    pub database: String,
}

impl Default for SpannerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_spanner_endpoint(),
            instance: default_instance(),
            database: default_spanner_database(),
        }
    }
}

fn default_project_id() -> String { "demo-project".into() }
fn default_vision_endpoint() -> String { "https://vision.googleapis.com".into() }
fn default_max_results() -> u32 { 10 }
fn default_pubsub_endpoint() -> String { "https://pubsub.googleapis.com".into() }
fn default_topic() -> String { "reservations".into() }
fn default_subscription() -> String { "reservations-subscription".into() }
fn default_spanner_endpoint() -> String { "https://spanner.googleapis.com".into() }
fn default_instance() -> String { "demo-instance".into() }
fn default_spanner_database() -> String { "demo".into() }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load config.toml if present, fall back to serde defaults, then
    /// apply env overrides and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default().unwrap_or_default();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.gcp.normalize_from_env();
        self.gcp.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        // TOML may omit the URL; the env var wins in that case.
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        // Empty is allowed: the relational demo is skipped without a database.
        if self.url.trim().is_empty() {
            return Ok(());
        }
        if !self.url.to_lowercase().starts_with("mysql://") {
            return Err(anyhow!("database.url must start with mysql://"));
        }
        Ok(())
    }
}

impl GcpConfig {
    /// Honor the conventional emulator env vars and project override.
    pub fn normalize_from_env(&mut self) {
        if let Ok(project) = std::env::var("GCP_PROJECT") {
            if !project.trim().is_empty() {
                self.project_id = project;
            }
        }
        if let Ok(host) = std::env::var("PUBSUB_EMULATOR_HOST") {
            if !host.trim().is_empty() {
                self.pubsub.endpoint = format!("http://{host}");
            }
        }
        if let Ok(host) = std::env::var("SPANNER_EMULATOR_HOST") {
            if !host.trim().is_empty() {
                self.spanner.endpoint = format!("http://{host}");
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.project_id.trim().is_empty() {
            return Err(anyhow!("gcp.project_id must not be empty"));
        }
        for (key, value) in [
            ("gcp.vision.endpoint", &self.vision.endpoint),
            ("gcp.pubsub.endpoint", &self.pubsub.endpoint),
            ("gcp.spanner.endpoint", &self.spanner.endpoint),
        ] {
            let lower = value.to_lowercase();
            if !(lower.starts_with("http://") || lower.starts_with("https://")) {
                return Err(anyhow!("{key} must be an http(s) URL"));
            }
        }
        if self.vision.max_results == 0 {
            return Err(anyhow!("gcp.vision.max_results must be >= 1"));
        }
        Ok(())
    }
}
