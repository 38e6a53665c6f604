/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. In production,
/// override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Compute service connection settings.
    pub compute: ComputeConfig,
    /// Upper bound on concurrently cached running tasks (default: `256`).
    pub result_cache_max_entries: usize,
}

/// Where and how to reach the compute service.
#[derive(Debug, Clone)]
pub struct ComputeConfig {
    /// Base URL (default: `http://localhost:8000`).
    pub base_url: String,
    /// Per-request timeout in seconds (default: `20`).
    pub timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                    |
    /// |----------------------------|----------------------------|
    /// | `HOST`                     | `0.0.0.0`                  |
    /// | `PORT`                     | `3000`                     |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`    | `30`                       |
    /// | `COMPUTE_BASE_URL`         | `http://localhost:8000`    |
    /// | `COMPUTE_TIMEOUT_SECS`     | `20`                       |
    /// | `RESULT_CACHE_MAX_ENTRIES` | `256`                      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let compute = ComputeConfig::from_env();

        let result_cache_max_entries: usize = std::env::var("RESULT_CACHE_MAX_ENTRIES")
            .unwrap_or_else(|_| "256".into())
            .parse()
            .expect("RESULT_CACHE_MAX_ENTRIES must be a valid usize");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            compute,
            result_cache_max_entries,
        }
    }
}

impl ComputeConfig {
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("COMPUTE_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".into());

        let timeout_secs: u64 = std::env::var("COMPUTE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "20".into())
            .parse()
            .expect("COMPUTE_TIMEOUT_SECS must be a valid u64");

        Self {
            base_url,
            timeout_secs,
        }
    }
}
