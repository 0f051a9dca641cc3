use std::{num::NonZeroU32, sync::Arc};

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use jiff::civil::Date;
use serde::Deserialize;
use wreq::header::{ACCEPT, AUTHORIZATION};

use crate::{
    error::AppResult,
    models::{NewMovie, SearchCandidate},
};

pub struct TmdbClient {
    client: wreq::Client,
    access_token: String,
    base_url: String,
    image_base_url: String,
    language: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl TmdbClient {
    pub fn new(
        client: wreq::Client,
        access_token: String,
        base_url: String,
        image_base_url: String,
        language: String,
        rps: u32,
    ) -> Self {
        // Warn once on app load if using mock data
        if access_token.trim().is_empty() {
            tracing::warn!("Using mock TMDB data - no TMDB_ACCESS_TOKEN provided");
        }

        let rps = NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(rps)));
        Self { client, access_token, base_url, image_base_url, language, limiter }
    }

    pub fn image_base_url(&self) -> &str {
        &self.image_base_url
    }

    pub async fn search_movies(&self, title: &str) -> AppResult<Vec<SearchCandidate>> {
        if self.is_mock() {
            return Ok(vec![mock_candidate()]);
        }

        self.limiter.until_ready().await;

        let url = format!("{}/search/movie", self.base_url.trim_end_matches('/'));
        tracing::debug!(title = %title, "searching movie database");

        let resp: SearchResponse = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .query(&[("query", title), ("language", self.language.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        tracing::debug!(title = %title, hits = resp.results.len(), "search finished");
        Ok(resp.results)
    }

    pub async fn movie_details(&self, tmdb_id: i64) -> AppResult<MovieDetails> {
        if self.is_mock() {
            return Ok(mock_details());
        }

        self.limiter.until_ready().await;

        let url = format!("{}/movie/{}", self.base_url.trim_end_matches('/'), tmdb_id);
        tracing::debug!(tmdb_id, "fetching movie details");

        let details = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .query(&[("language", self.language.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(details)
    }

    fn is_mock(&self) -> bool {
        self.access_token.trim().is_empty()
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MovieDetails {
    pub original_title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

impl MovieDetails {
    /// Release year, taken from the leading segment of the ISO release date.
    pub fn year(&self) -> AppResult<i32> {
        let raw = self.release_date.as_deref().unwrap_or("").trim();
        if raw.len() == 4 {
            if let Ok(year) = raw.parse::<i32>() {
                return Ok(year);
            }
        }
        let date: Date = raw.parse()?;
        Ok(i32::from(date.year()))
    }

    pub fn poster_url(&self, image_base_url: &str) -> String {
        match self.poster_path.as_deref() {
            Some(path) if !path.is_empty() => {
                format!("{}/{}", image_base_url.trim_end_matches('/'), path.trim_start_matches('/'))
            },
            _ => String::new(),
        }
    }

    pub fn into_new_movie(self, image_base_url: &str) -> AppResult<NewMovie> {
        let year = self.year()?;
        let img_url = self.poster_url(image_base_url);
        Ok(NewMovie {
            title: self.original_title,
            year,
            description: self.overview.unwrap_or_default(),
            img_url,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchCandidate>,
}

fn mock_candidate() -> SearchCandidate {
    SearchCandidate {
        id: 550,
        title: "Fight Club".to_string(),
        release_date: Some("1999-10-15".to_string()),
        poster_path: Some("/pB8BM7pdSp6B6Ih7QZ4DrQ3PmJK.jpg".to_string()),
    }
}

fn mock_details() -> MovieDetails {
    MovieDetails {
        original_title: "Fight Club".to_string(),
        release_date: Some("1999-10-15".to_string()),
        overview: Some(
            "A ticking-time-bomb insomniac and a slippery soap salesman channel primal male \
             aggression into a shocking new form of therapy."
                .to_string(),
        ),
        poster_path: Some("/pB8BM7pdSp6B6Ih7QZ4DrQ3PmJK.jpg".to_string()),
    }
}
