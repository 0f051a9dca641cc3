use std::net::SocketAddr;

use anyhow::Context;

const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const DEFAULT_TMDB_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub tmdb_access_token: String,
    pub tmdb_base_url: String,
    pub tmdb_image_base_url: String,
    pub tmdb_language: String,
    pub tmdb_rps: u32,
    pub database_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Unset keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 =
            lookup("PORT").unwrap_or_else(|| "3000".to_string()).parse().context("PORT")?;

        // API_KEY is the name older .env files use for the same bearer token.
        let tmdb_access_token =
            lookup("TMDB_ACCESS_TOKEN").or_else(|| lookup("API_KEY")).unwrap_or_default();
        let tmdb_base_url =
            lookup("TMDB_BASE_URL").unwrap_or_else(|| DEFAULT_TMDB_BASE_URL.to_string());
        let tmdb_image_base_url = lookup("TMDB_IMAGE_BASE_URL")
            .unwrap_or_else(|| DEFAULT_TMDB_IMAGE_BASE_URL.to_string());
        let tmdb_language = lookup("TMDB_LANGUAGE").unwrap_or_else(|| "en-US".to_string());

        let tmdb_rps: u32 = lookup("TMDB_RPS").and_then(|s| s.parse().ok()).unwrap_or(4);

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://movies.db?mode=rwc".to_string());

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            tmdb_access_token,
            tmdb_base_url,
            tmdb_image_base_url,
            tmdb_language,
            tmdb_rps,
            database_url,
        })
    }
}
