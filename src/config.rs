use anyhow::{Context, Result};
use rand::{distr::Alphanumeric, Rng};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub game: GameConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Durable store; memory-only when unset
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public base URL used to build join links
    pub base_url: String,
    pub frontend_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    /// Custom word bank file; built-in words when unset
    pub word_bank_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a number")?,
        };

        let server = ServerConfig {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .context("PORT must be a number")?,
            base_url: env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:5000".to_string()),
            frontend_dir: env::var("FRONTEND_DIR").unwrap_or_else(|_| "./frontend".to_string()),
        };

        let session = SessionConfig {
            secret: match env::var("SESSION_SECRET") {
                Ok(secret) if !secret.is_empty() => secret,
                _ => {
                    tracing::warn!(
                        "SESSION_SECRET not set; generated a per-process secret, sessions end on restart"
                    );
                    random_secret()
                }
            },
            ttl_hours: parse_ttl_hours(
                &env::var("SESSION_TTL_HOURS").unwrap_or_else(|_| "12".to_string()),
            )?,
        };

        let game = GameConfig {
            word_bank_path: env::var("WORD_BANK_PATH").ok().filter(|p| !p.is_empty()),
        };

        Ok(Config {
            database,
            server,
            session,
            game,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Link players open to join a game
    pub fn join_url(&self, game_id: &str) -> String {
        format!("{}/join/{}", self.server.base_url.trim_end_matches('/'), game_id)
    }
}

/// Longest session a token may grant: one year
const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

fn parse_ttl_hours(raw: &str) -> Result<i64> {
    let hours: i64 = raw
        .trim()
        .parse()
        .context("SESSION_TTL_HOURS must be a number")?;
    if !(1..=MAX_SESSION_TTL_HOURS).contains(&hours) {
        anyhow::bail!(
            "SESSION_TTL_HOURS must be between 1 and {}, got {}",
            MAX_SESSION_TTL_HOURS,
            hours
        );
    }
    Ok(hours)
}

fn random_secret() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database: DatabaseConfig {
            url: None,
            max_connections: 1,
        },
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            base_url: "http://party.test/".to_string(),
            frontend_dir: "./frontend".to_string(),
        },
        session: SessionConfig {
            secret: "test-session-secret".to_string(),
            ttl_hours: 1,
        },
        game: GameConfig {
            word_bank_path: None,
        },
    }
}
