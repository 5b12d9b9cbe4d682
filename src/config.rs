use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

use crate::content::ExcerptOptions;

pub const DEFAULT_CONFIG_FILE: &str = "pasci.toml";

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub excerpt: ExcerptOptions,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    /// 读取配置文件；文件不存在时使用默认值。环境变量 DATABASE_URL 覆盖数据库地址
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("读取 {} 失败：{}", path.display(), e))?;
            Self::parse(&content)
                .map_err(|e| anyhow::anyhow!("解析 {} 失败：{}", path.display(), e))?
        } else {
            Self::default()
        };

        if let Ok(url) = std::env::var("DATABASE_URL")
            && !url.trim().is_empty()
        {
            config.database.url = url;
        }

        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        if config.excerpt.max_length == 0 {
            anyhow::bail!("excerpt.max_length 必须大于 0");
        }
        Ok(config)
    }
}

// 默认值函数
fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8000 }
fn default_log_level() -> String { "info".into() }
fn default_database_url() -> String { "sqlite:pasci.db?mode=rwc".into() }
fn default_max_connections() -> u32 { 5 }
fn default_allowed_origins() -> Vec<String> { vec!["http://localhost:3000".into()] }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.database.url, "sqlite:pasci.db?mode=rwc");
        assert_eq!(config.cors.allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.excerpt, ExcerptOptions::default());
    }

    #[test]
    fn partial_tables_keep_remaining_defaults() {
        let config = AppConfig::parse(
            r#"
[server]
port = 9090

[excerpt]
max_length = 120
preserve_paragraphs = true
"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.excerpt.max_length, 120);
        assert_eq!(config.excerpt.min_length, 50);
        assert!(config.excerpt.preserve_paragraphs);
    }

    #[test]
    fn rejects_zero_excerpt_length() {
        assert!(AppConfig::parse("[excerpt]\nmax_length = 0").is_err());
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(AppConfig::parse("[server\nport = 1").is_err());
    }
}
