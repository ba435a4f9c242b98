use clap::{Args, ValueEnum};

/// Which [`rcp_store::StateStore`] implementation to back the running server with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "lower")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

/// Process-level configuration for the control plane server (§6).
#[derive(Debug, Args)]
pub struct ServerConfig {
    #[arg(long, env = "RCP_BIND", default_value = "127.0.0.1")]
    pub bind: String,

    #[arg(long, env = "RCP_PORT", default_value_t = 8080)]
    pub port: u16,

    #[arg(long, env = "RCP_STORE", value_enum, default_value = "memory")]
    pub store: StoreBackend,

    /// Required when `--store postgres`.
    #[arg(long, env = "RCP_DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long, env = "RCP_AUTH_TOKEN")]
    pub auth_token: Option<String>,

    /// Absolute base URL used to build poll-location URLs for requests that
    /// carry no `Host` header. Defaults to `http://{bind}:{port}`.
    #[arg(long, env = "RCP_API_BASE")]
    pub api_base: Option<String>,
}

impl ServerConfig {
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn resolved_api_base(&self) -> String {
        self.api_base.clone().unwrap_or_else(|| format!("http://{}", self.listen_address()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_api_base_falls_back_to_listen_address() {
        let cfg = ServerConfig {
            bind: "0.0.0.0".into(),
            port: 9090,
            store: StoreBackend::Memory,
            database_url: None,
            auth_token: None,
            api_base: None,
        };
        assert_eq!(cfg.resolved_api_base(), "http://0.0.0.0:9090");
    }

    #[test]
    fn resolved_api_base_honors_explicit_override() {
        let cfg = ServerConfig {
            bind: "0.0.0.0".into(),
            port: 9090,
            store: StoreBackend::Memory,
            database_url: None,
            auth_token: None,
            api_base: Some("https://rcp.example.com".into()),
        };
        assert_eq!(cfg.resolved_api_base(), "https://rcp.example.com");
    }
}
