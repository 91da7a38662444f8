//! Metadata lookups against TMDB.
//!
//! Content ids take one of three shapes, judged on the part before the first
//! `:`. IMDb ids (`tt…`, any case, optionally followed by `:season:episode`)
//! go through TMDB's `/find` endpoint. `tmdb:<numeric id>` and bare numeric
//! ids are TMDB ids and are looked up directly.

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use hb_core::config::MetadataConfig;
use hb_core::{ContentKey, Error, MetaDetail, MetaSummary, Result};

/// A shared rate limiter for outbound metadata requests.
pub type SharedLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Build a limiter allowing `requests_per_second` lookups.
pub fn create_limiter(requests_per_second: u32) -> SharedLimiter {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Source of display metadata for content keys.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Short provider name for logging.
    fn name(&self) -> &'static str;

    /// Title and poster. `Ok(None)` when the id shape is unsupported or the
    /// provider has no match.
    async fn summary(&self, key: &ContentKey) -> Result<Option<MetaSummary>>;

    /// Full descriptor, same `Ok(None)` semantics as [`summary`](Self::summary).
    async fn detail(&self, key: &ContentKey) -> Result<Option<MetaDetail>>;
}

/// Content id shapes a metadata lookup understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalRef {
    /// IMDb title id, episode suffix stripped.
    Imdb(String),
    /// Numeric TMDB id.
    Tmdb(u64),
}

impl ExternalRef {
    /// Classify the token before the first `:`. `tmdb:` ids use the segment
    /// after the namespace instead.
    pub fn parse(id: &str) -> Option<Self> {
        let mut parts = id.split(':');
        let head = parts.next().unwrap_or_default();

        if head.eq_ignore_ascii_case("tmdb") {
            return parts.next().and_then(|n| n.parse().ok()).map(Self::Tmdb);
        }
        if !head.is_empty() && head.bytes().all(|b| b.is_ascii_digit()) {
            return head.parse().ok().map(Self::Tmdb);
        }

        let digits = head.get(2..).filter(|_| head[..2].eq_ignore_ascii_case("tt"))?;
        let is_imdb = !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit());
        is_imdb.then(|| Self::Imdb(format!("tt{digits}")))
    }
}

// ---------------------------------------------------------------------------
// TMDB wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct TmdbRecord {
    id: u64,
    title: Option<String>,
    name: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    overview: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    runtime: Option<u32>,
    episode_run_time: Vec<u32>,
    vote_average: Option<f64>,
}

impl TmdbRecord {
    fn display_name(&self) -> String {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .filter(|n| !n.is_empty())
            .unwrap_or_default()
            .to_owned()
    }

    fn year(&self) -> Option<String> {
        self.release_date
            .as_deref()
            .or(self.first_air_date.as_deref())
            .filter(|d| d.len() >= 4)
            .map(|d| d.chars().take(4).collect())
    }

    fn runtime_minutes(&self) -> Option<u32> {
        self.runtime
            .filter(|r| *r > 0)
            .or_else(|| self.episode_run_time.first().copied())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TmdbFindResponse {
    movie_results: Vec<TmdbRecord>,
    tv_results: Vec<TmdbRecord>,
}

impl TmdbFindResponse {
    fn pick(mut self, episodic: bool) -> Option<TmdbRecord> {
        let tv = (!self.tv_results.is_empty()).then(|| self.tv_results.remove(0));
        let movie = (!self.movie_results.is_empty()).then(|| self.movie_results.remove(0));
        if episodic {
            tv.or(movie)
        } else {
            movie.or(tv)
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Rate-limited TMDB client bound to one API key.
pub struct TmdbProvider {
    http: reqwest::Client,
    api_key: String,
    config: MetadataConfig,
    limiter: SharedLimiter,
}

impl TmdbProvider {
    pub fn new(
        http: reqwest::Client,
        api_key: String,
        config: MetadataConfig,
        limiter: SharedLimiter,
    ) -> Self {
        Self {
            http,
            api_key,
            config,
            limiter,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, extra_params: &[(&str, &str)]) -> Result<T> {
        self.limiter.until_ready().await;

        let url = format!("{}{path}", self.config.api_base_url.trim_end_matches('/'));
        let mut params: Vec<(&str, &str)> = vec![("api_key", &self.api_key)];
        params.extend_from_slice(extra_params);

        let resp = self
            .http
            .get(&url)
            .query(&params)
            .timeout(self.config.timeout())
            .send()
            .await
            .map_err(|e| Error::MetadataUnavailable(format!("TMDB request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(Error::MetadataUnavailable(format!("TMDB {}", resp.status())));
        }

        resp.json::<T>()
            .await
            .map_err(|e| Error::MetadataUnavailable(format!("TMDB parse error: {e}")))
    }

    async fn find(&self, imdb_id: &str, episodic: bool) -> Result<Option<TmdbRecord>> {
        let found: TmdbFindResponse = self
            .get(&format!("/find/{imdb_id}"), &[("external_source", "imdb_id")])
            .await?;
        Ok(found.pick(episodic))
    }

    async fn details(&self, tmdb_id: u64, episodic: bool) -> Result<TmdbRecord> {
        let section = if episodic { "tv" } else { "movie" };
        self.get(&format!("/{section}/{tmdb_id}"), &[]).await
    }

    fn image(base: &str, path: Option<&str>) -> Option<String> {
        path.filter(|p| !p.is_empty())
            .map(|p| format!("{}{p}", base.trim_end_matches('/')))
    }
}

#[async_trait]
impl MetadataProvider for TmdbProvider {
    fn name(&self) -> &'static str {
        "tmdb"
    }

    async fn summary(&self, key: &ContentKey) -> Result<Option<MetaSummary>> {
        let record = match ExternalRef::parse(&key.id) {
            Some(ExternalRef::Imdb(imdb)) => self.find(&imdb, key.is_episodic()).await?,
            Some(ExternalRef::Tmdb(id)) => Some(self.details(id, key.is_episodic()).await?),
            None => None,
        };
        Ok(record.map(|r| MetaSummary {
            title: r.display_name(),
            poster: Self::image(&self.config.poster_base_url, r.poster_path.as_deref()),
        }))
    }

    async fn detail(&self, key: &ContentKey) -> Result<Option<MetaDetail>> {
        let episodic = key.is_episodic();
        let tmdb_id = match ExternalRef::parse(&key.id) {
            Some(ExternalRef::Imdb(imdb)) => match self.find(&imdb, episodic).await? {
                Some(found) => found.id,
                None => return Ok(None),
            },
            Some(ExternalRef::Tmdb(id)) => id,
            None => return Ok(None),
        };

        let record = self.details(tmdb_id, episodic).await?;
        Ok(Some(MetaDetail {
            id: key.id.clone(),
            kind: key.kind.clone(),
            name: record.display_name(),
            poster: Self::image(&self.config.poster_base_url, record.poster_path.as_deref()),
            background: Self::image(&self.config.backdrop_base_url, record.backdrop_path.as_deref()),
            description: record.overview.clone(),
            release_info: record.year(),
            runtime: record.runtime_minutes(),
            imdb_rating: record.vote_average,
        }))
    }
}
