use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Top-level process configuration for GatewayCtl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayCtlConfig {
    /// xDS gRPC bind address.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Admin HTTP bind address.
    #[serde(default = "default_admin_addr")]
    pub admin_addr: SocketAddr,

    /// Filesystem path to the durable-store SQLite file.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Tracing verbosity.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Tracing output format: "text" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Soft deadline (ms) from a committed mutation to a pushed xDS update.
    #[serde(default = "default_push_budget_ms")]
    pub push_budget_ms: u64,

    /// Overrides the startup snapshot-version counter. Testing only.
    #[serde(default)]
    pub snapshot_version_initial: Option<u64>,

    /// Observability sub-configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus `/metrics` text-exposition endpoint.
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,

    /// Path the Prometheus endpoint is served under.
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { prometheus_enabled: true, metrics_path: default_metrics_path() }
    }
}

impl GatewayCtlConfig {
    /// Load configuration from a YAML file plus `GATEWAYCTL_`-prefixed
    /// environment variable overrides (nested keys via `__`, e.g.
    /// `GATEWAYCTL_OBSERVABILITY__PROMETHEUS_ENABLED`).
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        let mut figment = Figment::new();

        if let Some(path) = config_path {
            figment = figment.merge(Yaml::file(path));
        } else {
            for default_path in &["gatewayctl.yaml", "/etc/gatewayctl/gatewayctl.yaml"] {
                if std::path::Path::new(default_path).exists() {
                    figment = figment.merge(Yaml::file(default_path));
                    break;
                }
            }
        }

        figment = figment.merge(Env::prefixed("GATEWAYCTL_").split("__"));

        let config: Self = figment.extract()?;
        Ok(config)
    }
}

impl Default for GatewayCtlConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            admin_addr: default_admin_addr(),
            store_path: default_store_path(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            push_budget_ms: default_push_budget_ms(),
            snapshot_version_initial: None,
            observability: ObservabilityConfig::default(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    "0.0.0.0:18000".parse().unwrap()
}

fn default_admin_addr() -> SocketAddr {
    "0.0.0.0:9180".parse().unwrap()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/gatewayctl.db")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_push_budget_ms() -> u64 {
    5000
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_knobs() {
        let cfg = GatewayCtlConfig::default();
        assert_eq!(cfg.listen_addr.port(), 18000);
        assert_eq!(cfg.admin_addr.port(), 9180);
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.push_budget_ms, 5000);
        assert!(cfg.snapshot_version_initial.is_none());
        assert!(cfg.observability.prometheus_enabled);
    }
}
