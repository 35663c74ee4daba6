//! Server configuration

use clap::Parser;
use cropcheck_advisory::CatalogPaths;
use cropcheck_classifiers::{ModelConfigSpec, ModelSourceSpec};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

/// Command line arguments
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "cropcheck-server")]
#[command(about = "CropCheck plant disease advisory service", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CROPCHECK_CONFIG", default_value = "cropcheck.yaml")]
    pub config: PathBuf,

    /// Listen address
    #[arg(short, long, env = "CROPCHECK_LISTEN")]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long, env = "CROPCHECK_PORT")]
    pub port: Option<u16>,

    /// Local SafeTensors weights, replacing the configured model source
    #[arg(short, long, env = "CROPCHECK_MODEL")]
    pub model: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "CROPCHECK_LOG_JSON")]
    pub log_json: bool,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Leaf classifier; without one the service runs but cannot predict
    #[serde(default)]
    pub model: Option<ModelConfigSpec>,

    /// Replacements for the embedded reference data
    #[serde(default)]
    pub data: CatalogPaths,

    /// Largest accepted request body, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    #[serde(default)]
    pub cors: CorsConfig,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = if Path::new(&cli.config).exists() {
            let content = std::fs::read_to_string(&cli.config)?;
            Self::from_yaml(&content)?
        } else {
            Self::default()
        };

        config.apply_overrides(cli);
        Ok(config)
    }

    /// Parse a YAML document
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(listen) = &cli.listen {
            self.listen = listen.clone();
        }

        if let Some(port) = cli.port {
            self.port = port;
        }

        if let Some(path) = &cli.model {
            let source = ModelSourceSpec::Local { path: path.clone() };
            match &mut self.model {
                Some(model) => model.source = source,
                None => self.model = Some(ModelConfigSpec::local(path.clone())),
            }
        }
    }

    /// Socket address to bind; `listen` may be an IPv4 or IPv6 literal
    pub fn bind_address(&self) -> anyhow::Result<SocketAddr> {
        let ip: IpAddr = self
            .listen
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid listen address '{}': {}", self.listen, e))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            model: None,
            data: CatalogPaths::default(),
            max_upload_bytes: default_max_upload_bytes(),
            cors: CorsConfig::default(),
        }
    }
}

/// Cross-origin settings for browser and mobile clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; `*` allows any
    #[serde(default = "default_origins")]
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn allows_any(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_origins(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_origins() -> Vec<String> {
    vec!["*".to_string()]
}
