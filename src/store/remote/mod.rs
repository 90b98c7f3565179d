
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::{BackendKind, ChunkRecord, QueryOutcome, ScoredChunk, VectorStore};
use crate::RagError;
use crate::config::RemoteIndexConfig;

const SPACE_TYPE: &str = "cosine";

/// Blocking HTTP client for the remote vector index service
#[derive(Debug, Clone)]
pub struct RemoteIndexClient {
    base_url: Url,
    api_token: Option<String>,
    probe_agent: ureq::Agent,
    agent: ureq::Agent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

#[derive(Debug, Serialize)]
struct CreateIndexRequest<'a> {
    index_name: &'a str,
    dim: usize,
    space_type: &'a str,
    precision: &'a str,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    k: usize,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    Hits(Vec<RawHit>),
    Wrapped { results: Vec<RawHit> },
}

impl SearchResponse {
    fn into_hits(self) -> Vec<RawHit> {
        match self {
            Self::Hits(hits) | Self::Wrapped { results: hits } => hits,
        }
    }
}

/// A search hit as the service returns it; versions differ in field naming
#[derive(Debug, Default, Deserialize)]
struct RawHit {
    #[serde(default, alias = "metadata")]
    meta: Option<RawMeta>,
    #[serde(default)]
    similarity: Option<f64>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    distance: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawMeta {
    Object(HitMeta),
    Encoded(String),
    Other(serde_json::Value),
}

#[derive(Debug, Default, Deserialize)]
struct HitMeta {
    #[serde(default)]
    text: Option<String>,
}

impl RawHit {
    fn text(&self) -> String {
        match &self.meta {
            Some(RawMeta::Object(meta)) => meta.text.clone().unwrap_or_default(),
            Some(RawMeta::Encoded(encoded)) => serde_json::from_str::<HitMeta>(encoded)
                .ok()
                .and_then(|meta| meta.text)
                .unwrap_or_default(),
            Some(RawMeta::Other(_)) | None => String::new(),
        }
    }

    fn score(&self) -> f32 {
        self.similarity
            .or(self.score)
            .or_else(|| self.distance.map(|d| 1.0 - d))
            .filter(|s| s.is_finite())
            .map_or(f32::NEG_INFINITY, |s| s as f32)
    }

    fn into_scored(self) -> ScoredChunk {
        ScoredChunk {
            score: self.score(),
            text: self.text(),
        }
    }
}

/// Turn any accepted search response body into ranked chunks, keeping the service's order
fn parse_search_response(body: &str) -> Result<Vec<ScoredChunk>> {
    let response: SearchResponse =
        serde_json::from_str(body).context("Failed to parse search response")?;

    Ok(response
        .into_hits()
        .into_iter()
        .map(RawHit::into_scored)
        .collect())
}

type HttpResult = std::result::Result<ureq::http::Response<ureq::Body>, ureq::Error>;

impl RemoteIndexClient {
    #[inline]
    pub fn new(config: &RemoteIndexConfig) -> Result<Self> {
        let base_url = config
            .base_url()
            .context("Failed to parse remote index URL from config")?;

        let connect_timeout = Duration::from_secs(config.connect_timeout_secs);
        let probe_agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_connect(Some(connect_timeout))
            .timeout_global(Some(connect_timeout))
            .build()
            .into();
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_connect(Some(connect_timeout))
            .timeout_global(Some(Duration::from_secs(config.request_timeout_secs)))
            .build()
            .into();

        Ok(Self {
            base_url,
            api_token: config.api_token.clone().filter(|t| !t.is_empty()),
            probe_agent,
            agent,
        })
    }

    #[inline]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Check that the service answers its health endpoint within the connect timeout
    #[inline]
    pub fn probe(&self) -> Result<()> {
        let url = self.endpoint("/api/v1/health")?;
        debug!("Probing remote index at {}", url);

        let (status, body) =
            read_response(self.authorize(self.probe_agent.get(url.as_str())).call())
                .context("Remote index is unreachable")?;

        if !is_success(status) {
            bail!("Health check returned HTTP {}: {}", status, body);
        }
        Ok(())
    }

    #[inline]
    pub fn create_index(
        &self,
        index_name: &str,
        dimension: usize,
        precision: &str,
    ) -> Result<CreateOutcome> {
        let url = self.endpoint("/api/v1/index/create")?;
        let payload = serde_json::to_string(&CreateIndexRequest {
            index_name,
            dim: dimension,
            space_type: SPACE_TYPE,
            precision,
        })
        .context("Failed to serialize create request")?;

        let (status, body) = read_response(
            self.authorize(self.agent.post(url.as_str()))
                .header("Content-Type", "application/json")
                .send(&payload),
        )
        .context("Failed to create index")?;

        match status {
            409 => Ok(CreateOutcome::AlreadyExists),
            s if is_success(s) => Ok(CreateOutcome::Created),
            s => Err(anyhow!("Index creation returned HTTP {}: {}", s, body)),
        }
    }

    /// Fetch the service's description of an index; fails when the index does not exist
    #[inline]
    pub fn describe_index(&self, index_name: &str) -> Result<serde_json::Value> {
        let url = self.endpoint(&format!("/api/v1/index/{}/info", index_name))?;

        let (status, body) = read_response(self.authorize(self.agent.get(url.as_str())).call())
            .with_context(|| format!("Failed to look up index {}", index_name))?;

        if !is_success(status) {
            bail!("Index lookup returned HTTP {}: {}", status, body);
        }

        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&body).context("Failed to parse index info")
    }

    #[inline]
    pub fn insert(&self, index_name: &str, records: &[ChunkRecord]) -> Result<()> {
        let url = self.endpoint(&format!("/api/v1/index/{}/vector/insert", index_name))?;
        let payload = serde_json::to_string(records).context("Failed to serialize records")?;

        let (status, body) = read_response(
            self.authorize(self.agent.post(url.as_str()))
                .header("Content-Type", "application/json")
                .send(&payload),
        )
        .context("Failed to insert vectors")?;

        if !is_success(status) {
            bail!("Insert returned HTTP {}: {}", status, body);
        }
        Ok(())
    }

    #[inline]
    pub fn search(&self, index_name: &str, vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let url = self.endpoint(&format!("/api/v1/index/{}/search", index_name))?;
        let payload = serde_json::to_string(&SearchRequest { vector, k })
            .context("Failed to serialize search request")?;

        let (status, body) = read_response(
            self.authorize(self.agent.post(url.as_str()))
                .header("Content-Type", "application/json")
                .send(&payload),
        )
        .context("Failed to search index")?;

        if !is_success(status) {
            bail!("Search returned HTTP {}: {}", status, body);
        }

        let mut hits = parse_search_response(&body)?;
        hits.truncate(k);
        Ok(hits)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Failed to build URL for {}", path))
    }

    fn authorize<B>(&self, request: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        match &self.api_token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }
}

fn read_response(result: HttpResult) -> Result<(u16, String)> {
    let mut response = result?;
    let status = response.status().as_u16();
    let body = response
        .body_mut()
        .read_to_string()
        .context("Failed to read response body")?;
    Ok((status, body))
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// A connected index on the remote service
#[derive(Debug, Clone)]
pub struct RemoteIndex {
    client: RemoteIndexClient,
    index_name: String,
    dimension: usize,
}

impl RemoteIndex {
    /// Probe the service, create the index if needed, then confirm it can be looked up.
    ///
    /// Blocks on network IO; call from `spawn_blocking` inside async code.
    #[inline]
    pub fn connect(config: &RemoteIndexConfig, dimension: usize) -> Result<Self> {
        let client = RemoteIndexClient::new(config)?;
        client.probe()?;

        match client.create_index(&config.index_name, dimension, &config.precision) {
            Ok(CreateOutcome::Created) => info!("Created remote index {}", config.index_name),
            Ok(CreateOutcome::AlreadyExists) => {
                info!("Remote index {} already exists", config.index_name);
            }
            Err(e) => warn!("Remote index creation note: {:#}", e),
        }

        let info = client.describe_index(&config.index_name)?;
        debug!("Remote index info: {}", info);

        info!(
            "Connected to remote index {} at {}",
            config.index_name,
            client.base_url()
        );

        Ok(Self {
            client,
            index_name: config.index_name.clone(),
            dimension,
        })
    }

    /// Check the service and the index without creating anything
    ///
    /// Blocks on network IO like [`RemoteIndex::connect`].
    #[inline]
    pub fn inspect(config: &RemoteIndexConfig) -> Result<serde_json::Value> {
        let client = RemoteIndexClient::new(config)?;
        client.probe()?;
        client.describe_index(&config.index_name)
    }

    #[inline]
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

fn unavailable(e: &anyhow::Error) -> RagError {
    RagError::BackendUnavailable(format!("{:#}", e))
}

#[async_trait]
impl VectorStore for RemoteIndex {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn upsert(&self, records: Vec<ChunkRecord>) -> crate::Result<()> {
        let index = self.clone();
        let count = records.len();

        tokio::task::spawn_blocking(move || index.client.insert(&index.index_name, &records))
            .await
            .map_err(|e| RagError::BackendUnavailable(format!("insert task failed: {}", e)))?
            .map_err(|e| unavailable(&e))?;

        info!("Stored {} records in remote index {}", count, self.index_name);
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> crate::Result<QueryOutcome> {
        let index = self.clone();
        let vector = vector.to_vec();

        let hits = tokio::task::spawn_blocking(move || {
            index.client.search(&index.index_name, &vector, top_k)
        })
        .await
        .map_err(|e| RagError::BackendUnavailable(format!("search task failed: {}", e)))?
        .map_err(|e| unavailable(&e))?;

        debug!("Remote search returned {} hits", hits.len());
        Ok(QueryOutcome::Ranked(hits))
    }
}
