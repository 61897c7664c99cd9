use color_eyre::{eyre::eyre, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::cache::{ErrorInfo, NormalizedArgs};
use crate::config::ApiConfig;

use super::endpoint::Endpoint;
use super::types::Page;

/// Longest response body excerpt carried in an error message
const BODY_EXCERPT_LEN: usize = 200;

/// Which kind of resource a request addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
  List,
  Detail,
}

/// Catalog REST API client
#[derive(Clone)]
pub struct CatalogClient {
  http: reqwest::Client,
  base: Url,
}

impl CatalogClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let base = parse_base_url(&config.base_url)?;

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .user_agent(concat!("cosview/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base })
  }

  pub fn base_url(&self) -> &Url {
    &self.base
  }

  /// `{base}/{endpoint}/?{args}`
  pub fn list_url(&self, endpoint: Endpoint, args: &NormalizedArgs) -> Result<Url, ErrorInfo> {
    let mut url = self.join(&format!("{}/", endpoint.api_path()))?;
    if !args.is_empty() {
      url.set_query(Some(&args.to_query_string()));
    }
    Ok(url)
  }

  /// `{base}/{endpoint}/{id}/`
  pub fn detail_url(&self, endpoint: Endpoint, id: u64) -> Result<Url, ErrorInfo> {
    self.join(&format!("{}/{}/", endpoint.api_path(), id))
  }

  /// Fetch one page of a list endpoint
  pub async fn get_page<T: DeserializeOwned>(
    &self,
    endpoint: Endpoint,
    args: &NormalizedArgs,
  ) -> Result<Page<T>, ErrorInfo> {
    let url = self.list_url(endpoint, args)?;
    self.get_json(url, RequestKind::List).await
  }

  /// Fetch a single entity by id
  pub async fn get_one<T: DeserializeOwned>(&self, endpoint: Endpoint, id: u64) -> Result<T, ErrorInfo> {
    let url = self.detail_url(endpoint, id)?;
    self.get_json(url, RequestKind::Detail).await
  }

  fn join(&self, path: &str) -> Result<Url, ErrorInfo> {
    self
      .base
      .join(path)
      .map_err(|e| ErrorInfo::network(format!("Invalid request path {}: {}", path, e)))
  }

  async fn get_json<T: DeserializeOwned>(&self, url: Url, kind: RequestKind) -> Result<T, ErrorInfo> {
    debug!(%url, "GET");

    let response = self
      .http
      .get(url.clone())
      .send()
      .await
      .map_err(|e| ErrorInfo::network(format!("GET {} failed: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(classify_status(status, &body, kind));
    }

    let bytes = response
      .bytes()
      .await
      .map_err(|e| ErrorInfo::network(format!("Failed to read response from {}: {}", url, e)))?;

    serde_json::from_slice(&bytes)
      .map_err(|e| ErrorInfo::server(format!("Malformed response from {}: {}", url, e)))
  }
}

/// Map a non-2xx response to the cache error taxonomy.
///
/// Only a missing entity is `NotFound`; a 404 on a list endpoint means the
/// API itself is misrouted.
fn classify_status(status: StatusCode, body: &str, kind: RequestKind) -> ErrorInfo {
  let excerpt: String = body.trim().chars().take(BODY_EXCERPT_LEN).collect();
  let message = if excerpt.is_empty() {
    status.to_string()
  } else {
    format!("{}: {}", status, excerpt)
  };

  if status == StatusCode::NOT_FOUND && kind == RequestKind::Detail {
    ErrorInfo::not_found(message)
  } else {
    ErrorInfo::server(message)
  }
}

/// Parse the API base URL, making sure relative joins stay below it
fn parse_base_url(raw: &str) -> Result<Url> {
  let mut url = Url::parse(raw).map_err(|e| eyre!("Invalid API base URL '{}': {}", raw, e))?;
  if url.cannot_be_a_base() {
    return Err(eyre!("API base URL '{}' cannot be a base", raw));
  }
  if !url.path().ends_with('/') {
    let path = format!("{}/", url.path());
    url.set_path(&path);
  }
  Ok(url)
}
