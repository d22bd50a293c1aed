use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub name: String,
    pub database_url: String,
    pub max_per_page: u64,
    pub tmdb_access_token: String,
    pub tmdb_base_url: String,
    pub tmdb_rps: u32,
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            name: "Riks Flix".to_string(),
            database_url: "sqlite://riksflix.db?mode=rwc".to_string(),
            max_per_page: 100,
            tmdb_access_token: String::new(),
            tmdb_base_url: "https://api.themoviedb.org/3".to_string(),
            tmdb_rps: 4,
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let host = env_any(&["HOST"]).unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = env_any(&["PORT"]).unwrap_or_else(|| "8080".to_string()).parse().context("PORT")?;

        let max_per_page: u64 = env_any(&["MAX_PER_PAGE"])
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_per_page)
            .max(1);

        let tmdb_rps: u32 =
            env_any(&["TMDB_RPS"]).and_then(|s| s.parse().ok()).unwrap_or(defaults.tmdb_rps);

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            name: env_any(&["NAME"]).unwrap_or(defaults.name),
            database_url: env_any(&["DATABASE_URL", "DB_URI"]).unwrap_or(defaults.database_url),
            max_per_page,
            tmdb_access_token: env_any(&["TMDB_ACCESS_TOKEN", "TMDB_API_KEY"])
                .unwrap_or(defaults.tmdb_access_token),
            tmdb_base_url: env_any(&["TMDB_BASE_URL", "TMDB_API_URL"]).unwrap_or(defaults.tmdb_base_url),
            tmdb_rps,
            data_dir: env_any(&["DATA_DIR"]).map(PathBuf::from).unwrap_or(defaults.data_dir),
        })
    }
}

/// First non-empty variable among `keys`.
fn env_any(keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|k| std::env::var(k).ok()).find(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_any_skips_blank_and_missing_keys() {
        unsafe {
            std::env::set_var("RIKSFLIX_TEST_BLANK", "  ");
            std::env::set_var("RIKSFLIX_TEST_SET", "postgres://db");
        }
        let found = env_any(&["RIKSFLIX_TEST_MISSING", "RIKSFLIX_TEST_BLANK", "RIKSFLIX_TEST_SET"]);
        assert_eq!(found.as_deref(), Some("postgres://db"));
        assert_eq!(env_any(&["RIKSFLIX_TEST_MISSING"]), None);
    }

    #[test]
    fn defaults_cap_pages_at_one_hundred() {
        let config = Config::default();
        assert_eq!(config.max_per_page, 100);
        assert_eq!(config.addr.port(), 8080);
    }
}
