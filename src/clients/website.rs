//! 事業者Webサイトの本文取得クライアント。
//!
//! HTMLはテキストノードを連結した文字列に変換して返します。
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode, Url};
use scraper::Html;
use thiserror::Error;
use tracing::debug;

use super::ContentFetcher;

/// 一般的なデスクトップブラウザのUser-Agent。
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// 本文取得の失敗。呼び出し側では「本文なし」として扱う。
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid website URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },
    #[error("{url} returned non-text content ({content_type})")]
    NonText { url: String, content_type: String },
}

#[derive(Debug, Clone)]
pub struct WebsiteConfig {
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for WebsiteConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Html,
    Plain,
}

fn body_kind(content_type: Option<&str>) -> Option<BodyKind> {
    let Some(content_type) = content_type else {
        return Some(BodyKind::Html);
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if mime.is_empty() || mime.contains("html") || mime.contains("xml") {
        Some(BodyKind::Html)
    } else if mime.starts_with("text/") {
        Some(BodyKind::Plain)
    } else {
        None
    }
}

/// HTML文書の全テキストノードを連結する。
#[must_use]
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    document.root_element().text().collect()
}

#[derive(Debug, Clone)]
pub struct WebsiteClient {
    client: Client,
}

impl WebsiteClient {
    /// # Errors
    /// HTTPクライアントの構築に失敗した場合はエラーを返します。
    pub fn new(config: WebsiteConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .build()
            .context("failed to build website HTTP client")?;
        Ok(Self { client })
    }

    /// ページを取得して本文テキストを返す。
    ///
    /// # Errors
    /// URL不正、通信失敗・タイムアウト、2xx以外のステータス、テキスト以外のコンテンツで [`FetchError`] を返します。
    pub async fn fetch_page_text(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|error| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: error.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let Some(kind) = body_kind(content_type.as_deref()) else {
            return Err(FetchError::NonText {
                url: url.to_string(),
                content_type: content_type.unwrap_or_default(),
            });
        };

        let body = response.text().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;
        debug!(url, bytes = body.len(), ?kind, "fetched website");

        Ok(match kind {
            BodyKind::Html => extract_text(&body),
            BodyKind::Plain => body,
        })
    }
}

#[async_trait]
impl ContentFetcher for WebsiteClient {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.fetch_page_text(url).await
    }
}
