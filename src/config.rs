use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProfileOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub pool_size: u32,
    /// Values that win over whatever a connect request supplies
    #[serde(default)]
    pub overrides: ProfileOverrides,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub backend: String, // "ollama" or "remote"
    pub model: String,   // Model used for SQL generation
    pub insight_model: Option<String>,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
}

impl LlmConfig {
    pub fn insight_model(&self) -> &str {
        self.insight_model.as_deref().unwrap_or(&self.model)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub format: String, // "text" or "json"
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub web: WebConfig,
    pub llm: LlmConfig,
    pub logging: LoggingConfig,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl AppConfig {
    pub fn new(args: &CliArgs) -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();

        // Start with built-in defaults so the config file is optional
        let mut config_builder = Config::builder()
            .set_default("database.pool_size", defaults.database.pool_size)?
            .set_default("web.host", defaults.web.host.clone())?
            .set_default("web.port", defaults.web.port)?
            .set_default("llm.backend", defaults.llm.backend.clone())?
            .set_default("llm.model", defaults.llm.model.clone())?
            .set_default("llm.insight_model", defaults.llm.insight_model.clone())?
            .set_default("llm.api_url", defaults.llm.api_url.clone())?
            .set_default("logging.format", defaults.logging.format.clone())?;

        // Add configuration from file if specified
        if let Some(config_path) = &args.config {
            config_builder = config_builder.add_source(File::from(config_path.as_path()));
        } else {
            // Check for config in default locations
            let default_locations = vec![
                "config.toml",
                "config/config.toml",
                "/etc/dblens/config.toml",
            ];

            for location in default_locations {
                if Path::new(location).exists() {
                    config_builder =
                        config_builder.add_source(File::new(location, config::FileFormat::Toml));
                    break;
                }
            }
        }

        // DBLENS_LLM__MODEL=..., DBLENS_DATABASE__OVERRIDES__HOST=...
        config_builder = config_builder.add_source(
            Environment::with_prefix("DBLENS")
                .prefix_separator("_")
                .separator("__"),
        );

        let mut config: AppConfig = config_builder.build()?.try_deserialize()?;

        // Override with command line args if provided
        if let Some(host) = &args.host {
            config.web.host = host.clone();
        }
        if let Some(port) = args.port {
            config.web.port = port;
        }

        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                pool_size: 10,
                overrides: ProfileOverrides::default(),
            },
            web: WebConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
            },
            llm: LlmConfig {
                backend: "ollama".to_string(),
                model: "phi:2.7b".to_string(),
                insight_model: Some("qwen2.5-coder:7b".to_string()),
                api_key: None,
                api_url: Some("http://localhost:11434/api/generate".to_string()),
                temperature: None,
                timeout_secs: None,
            },
            logging: LoggingConfig {
                format: "text".to_string(),
            },
        }
    }
}
