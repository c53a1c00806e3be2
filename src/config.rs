use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deployment {
    Local,
    Dev,
    Stage,
    Prod,
}

impl Deployment {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Self::Dev,
            "stage" | "staging" => Self::Stage,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

pub const DEFAULT_ANALYZE_BASE_URL: &str = "http://localhost:5000/api/v1";
pub const DEFAULT_PAGE_SIZE: u32 = 1000;
pub const DEFAULT_LABEL_FORMAT: &str = "%d.%m %H:%M";

#[derive(Debug, Clone)]
pub struct Config {
    // Analyze API
    pub analyze_base_url: String,
    /// `None` leaves upstream calls without a timeout.
    pub upstream_timeout_seconds: Option<u64>,
    pub sensor_data_page_size: u32,

    // Charting
    pub chart_label_format: String,

    // API settings
    pub api_host: String,
    pub api_port: u16,

    // Application metadata
    pub deployment: Deployment,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analyze_base_url: DEFAULT_ANALYZE_BASE_URL.to_string(),
            upstream_timeout_seconds: None,
            sensor_data_page_size: DEFAULT_PAGE_SIZE,
            chart_label_format: DEFAULT_LABEL_FORMAT.to_string(),
            api_host: "0.0.0.0".to_string(),
            api_port: 3000,
            deployment: Deployment::Local,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `ANALYZE_BASE_URL` is not an http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let analyze_base_url = env::var("ANALYZE_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_ANALYZE_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        if !analyze_base_url.starts_with("http://") && !analyze_base_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                name: "ANALYZE_BASE_URL",
                value: analyze_base_url,
            });
        }

        Ok(Self {
            analyze_base_url,
            upstream_timeout_seconds: env::var("UPSTREAM_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs: &u64| *secs > 0),
            sensor_data_page_size: page_size_from(
                env::var("SENSOR_DATA_PAGE_SIZE").ok().as_deref(),
            ),

            chart_label_format: env::var("CHART_LABEL_FORMAT")
                .unwrap_or_else(|_| DEFAULT_LABEL_FORMAT.to_string()),

            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),

            deployment: Deployment::from_str(
                &env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            ),
        })
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Rows requested per data call; missing, unparseable, or zero falls back to
/// [`DEFAULT_PAGE_SIZE`].
#[must_use]
pub fn page_size_from(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse().ok())
        .filter(|size: &u32| *size > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE)
}
