use serde::Deserialize;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub uri: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Postgres,
    Files,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Export directory, required when `kind = "files"`.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    pub concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: Option<DatabaseConfig>,
    pub source: SourceConfig,
    pub http: Option<HttpConfig>,
    /// Only needed by `generate_report`, which writes reports to disk.
    pub output: Option<OutputConfig>,
    #[serde(default)]
    pub fetch: FetchConfig,
    pub metrics: Option<MetricsConfig>,
    /// Unit overrides keyed by meter type token or label.
    #[serde(default)]
    pub units: HashMap<String, String>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("REPORT_CONFIG").unwrap_or_else(|_| "report-config.toml".to_string());
        let contents = fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read config {path}: {e}"))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn output_dir(&self) -> anyhow::Result<&Path> {
        match &self.output {
            Some(output) => Ok(&output.dir),
            None => anyhow::bail!("writing reports to disk requires an [output] section"),
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        match self.source.kind {
            SourceKind::Postgres if self.database.is_none() => {
                anyhow::bail!("source.kind = \"postgres\" requires a [database] section")
            }
            SourceKind::Files if self.source.dir.is_none() => {
                anyhow::bail!("source.kind = \"files\" requires source.dir")
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let cfg = AppConfig::from_toml(
            r#"
            [database]
            uri = "postgres://reports@localhost/facilities"
            max_connections = 5

            [source]
            kind = "postgres"

            [http]
            bind_addr = "0.0.0.0:8080"

            [output]
            dir = "reports"

            [fetch]
            concurrency = 8

            [metrics]
            bind_addr = "0.0.0.0:9100"

            [units]
            HEAT = "MWh"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.source.kind, SourceKind::Postgres);
        assert_eq!(cfg.fetch.concurrency, 8);
        assert_eq!(cfg.units.get("HEAT").map(String::as_str), Some("MWh"));
        assert_eq!(cfg.database.unwrap().max_connections, 5);
    }

    #[test]
    fn files_source_defaults_optional_sections() {
        let cfg = AppConfig::from_toml(
            r#"
            [source]
            kind = "files"
            dir = "exports"

            [output]
            dir = "reports"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.fetch.concurrency, 4);
        assert!(cfg.http.is_none());
        assert!(cfg.metrics.is_none());
        assert!(cfg.units.is_empty());
        assert_eq!(cfg.output_dir().unwrap(), Path::new("reports"));
    }

    #[test]
    fn postgres_source_requires_database() {
        let res = AppConfig::from_toml(
            r#"
            [source]
            kind = "postgres"

            [output]
            dir = "reports"
            "#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn http_service_config_needs_no_output_section() {
        let cfg = AppConfig::from_toml(
            r#"
            [source]
            kind = "files"
            dir = "exports"

            [http]
            bind_addr = "0.0.0.0:8080"
            "#,
        )
        .unwrap();

        assert!(cfg.output.is_none());
        assert!(cfg.output_dir().is_err());
    }
}
