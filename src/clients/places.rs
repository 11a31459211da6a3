//! プレイスAPI（Geocoding / Nearby Search / Place Details）クライアント。
//!
//! APIキーはクエリに付与するため、reqwest のエラーからは URL を除去してからログに流す。
use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

pub mod models;

use self::models::{
    GeocodeResponse, NearbySearchResponse, PlaceDetails, PlaceDetailsResponse, PlaceSummary,
};
use super::{LocationResolver, NearbyQuery, NearbySearch, PlaceDetailsProvider};
use crate::business::Coordinates;
use crate::util::text::{redact, truncate_error_message};

const GEOCODE_PATH: &str = "maps/api/geocode/json";
const NEARBY_SEARCH_PATH: &str = "maps/api/place/nearbysearch/json";
const PLACE_DETAILS_PATH: &str = "maps/api/place/details/json";
const DETAIL_FIELDS: &str =
    "formatted_address,formatted_phone_number,website,opening_hours,address_components";

/// APIの `status` が成功以外だった場合のエラー。
#[derive(Debug, Error)]
pub enum PlacesApiError {
    #[error("{endpoint} returned status {status}: {message}")]
    Status {
        endpoint: &'static str,
        status: String,
        message: String,
    },
    #[error("{endpoint} returned OK without a result")]
    MissingResult { endpoint: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApiStatus {
    Ok,
    ZeroResults,
}

fn check_status(
    endpoint: &'static str,
    status: &str,
    message: Option<String>,
) -> Result<ApiStatus, PlacesApiError> {
    match status {
        "OK" => Ok(ApiStatus::Ok),
        "ZERO_RESULTS" => Ok(ApiStatus::ZeroResults),
        other => Err(PlacesApiError::Status {
            endpoint,
            status: other.to_string(),
            message: message.unwrap_or_default(),
        }),
    }
}

/// プレイスAPIクライアントの設定。
#[derive(Clone)]
pub struct PlacesConfig {
    pub base_url: String,
    pub api_key: String,
    pub connect_timeout: Duration,
    pub total_timeout: Duration,
    pub max_pages: usize,
    pub page_token_delay: Duration,
}

impl fmt::Debug for PlacesConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlacesConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("connect_timeout", &self.connect_timeout)
            .field("total_timeout", &self.total_timeout)
            .field("max_pages", &self.max_pages)
            .field("page_token_delay", &self.page_token_delay)
            .finish()
    }
}

/// プレイスAPIとの通信を管理するクライアント。
#[derive(Clone)]
pub struct PlacesClient {
    client: Client,
    base_url: Url,
    api_key: String,
    max_pages: usize,
    page_token_delay: Duration,
}

impl fmt::Debug for PlacesClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlacesClient")
            .field("base_url", &self.base_url.as_str())
            .field("max_pages", &self.max_pages)
            .finish_non_exhaustive()
    }
}

impl PlacesClient {
    /// 新しいプレイスAPIクライアントを作成する。
    ///
    /// # Errors
    /// URLのパースまたはHTTPクライアントの構築に失敗した場合はエラーを返します。
    pub fn new(config: PlacesConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.total_timeout)
            .build()
            .context("failed to build places HTTP client")?;

        let mut raw = config.base_url;
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw).context("invalid places API base URL")?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
            max_pages: config.max_pages.max(1),
            page_token_delay: config.page_token_delay,
        })
    }

    /// ロケーション文字列をジオコーディングし、先頭候補の座標を返す。
    ///
    /// # Errors
    /// HTTPエラー、レスポンスのパース失敗、`OK`／`ZERO_RESULTS` 以外のステータスでエラーを返します。
    pub async fn geocode(&self, address: &str) -> Result<Option<Coordinates>> {
        let mut url = self.endpoint(GEOCODE_PATH)?;
        url.query_pairs_mut().append_pair("address", address);

        let response: GeocodeResponse = self.get_json("geocode", url).await?;
        match check_status("geocode", &response.status, response.error_message)? {
            ApiStatus::ZeroResults => Ok(None),
            ApiStatus::Ok => Ok(response.results.first().and_then(|result| {
                Coordinates::new(result.geometry.location.lat, result.geometry.location.lng)
            })),
        }
    }

    /// 周辺検索を行う。`next_page_token` は `max_pages` まで辿る。
    ///
    /// 2ページ目以降の失敗は警告に留め、それまでの結果を返します。
    ///
    /// # Errors
    /// 1ページ目の取得に失敗した場合はエラーを返します。
    pub async fn nearby_search(&self, query: &NearbyQuery) -> Result<Vec<PlaceSummary>> {
        let mut places = Vec::new();
        let mut page_token: Option<String> = None;

        for page in 1..=self.max_pages {
            if page_token.is_some() {
                // Page tokens become valid only after a short delay.
                tokio::time::sleep(self.page_token_delay).await;
            }

            let (results, next) = match self.nearby_page(query, page_token.as_deref()).await {
                Ok(page_result) => page_result,
                Err(err) if page > 1 => {
                    warn!(page, error = %err, "stopping nearby search pagination");
                    break;
                }
                Err(err) => return Err(err),
            };

            places.extend(results);
            debug!(page, total = places.len(), "fetched nearby search page");

            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(places)
    }

    async fn nearby_page(
        &self,
        query: &NearbyQuery,
        page_token: Option<&str>,
    ) -> Result<(Vec<PlaceSummary>, Option<String>)> {
        let mut url = self.endpoint(NEARBY_SEARCH_PATH)?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(token) = page_token {
                pairs.append_pair("pagetoken", token);
            } else {
                pairs.append_pair(
                    "location",
                    &format!("{},{}", query.location.lat, query.location.lng),
                );
                pairs.append_pair("radius", &query.radius_meters.to_string());
                pairs.append_pair("keyword", &query.keyword);
                if let Some(place_type) = &query.place_type {
                    pairs.append_pair("type", place_type);
                }
            }
        }

        let response: NearbySearchResponse = self.get_json("nearbysearch", url).await?;
        match check_status("nearbysearch", &response.status, response.error_message)? {
            ApiStatus::ZeroResults => Ok((Vec::new(), None)),
            ApiStatus::Ok => Ok((response.results, response.next_page_token)),
        }
    }

    /// Place Details を取得する。
    ///
    /// # Errors
    /// HTTPエラー、レスポンスのパース失敗、異常ステータスでエラーを返します。
    pub async fn place_details(&self, place_id: &str) -> Result<PlaceDetails> {
        let mut url = self.endpoint(PLACE_DETAILS_PATH)?;
        url.query_pairs_mut()
            .append_pair("place_id", place_id)
            .append_pair("fields", DETAIL_FIELDS);

        let response: PlaceDetailsResponse = self.get_json("details", url).await?;
        match check_status("details", &response.status, response.error_message)? {
            ApiStatus::ZeroResults => Ok(PlaceDetails::default()),
            ApiStatus::Ok => response.result.ok_or_else(|| {
                anyhow::Error::new(PlacesApiError::MissingResult {
                    endpoint: "details",
                })
            }),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .with_context(|| format!("failed to build {path} URL"))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &'static str, url: Url) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("{endpoint} request failed"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "{endpoint} returned HTTP {status}: {}",
                truncate_error_message(&body)
            );
        }

        response
            .json::<T>()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("failed to deserialize {endpoint} response"))
    }
}

#[async_trait]
impl LocationResolver for PlacesClient {
    async fn resolve(&self, location: &str) -> Result<Option<Coordinates>> {
        self.geocode(location).await
    }
}

#[async_trait]
impl NearbySearch for PlacesClient {
    async fn nearby(&self, query: &NearbyQuery) -> Result<Vec<PlaceSummary>> {
        self.nearby_search(query).await
    }
}

#[async_trait]
impl PlaceDetailsProvider for PlacesClient {
    async fn details(&self, place_id: &str) -> Result<PlaceDetails> {
        self.place_details(place_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_KEY: &str = "test-key-123";

    fn test_config(base_url: String, max_pages: usize) -> PlacesConfig {
        PlacesConfig {
            base_url,
            api_key: TEST_KEY.to_string(),
            connect_timeout: Duration::from_secs(3),
            total_timeout: Duration::from_secs(10),
            max_pages,
            page_token_delay: Duration::ZERO,
        }
    }

    fn query() -> NearbyQuery {
        NearbyQuery {
            location: Coordinates::new(53.8, -1.55).expect("finite"),
            radius_meters: 5000,
            keyword: "recycling".to_string(),
            place_type: Some("establishment".to_string()),
        }
    }

    fn place(id: &str, name: &str) -> serde_json::Value {
        serde_json::json!({
            "place_id": id,
            "name": name,
            "geometry": {"location": {"lat": 53.8, "lng": -1.55}},
            "rating": 4.2
        })
    }

    #[tokio::test]
    async fn geocode_returns_first_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/maps/api/geocode/json"))
            .and(query_param("address", "Leeds, UK"))
            .and(query_param("key", TEST_KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "results": [
                    {"geometry": {"location": {"lat": 53.8008, "lng": -1.5491}}},
                    {"geometry": {"location": {"lat": 0.0, "lng": 0.0}}}
                ]
            })))
            .mount(&server)
            .await;

        let client = PlacesClient::new(test_config(server.uri(), 1)).expect("client should build");
        let coordinates = client.geocode("Leeds, UK").await.expect("geocode should succeed");

        assert_eq!(coordinates, Coordinates::new(53.8008, -1.5491));
    }

    #[tokio::test]
    async fn geocode_zero_results_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/maps/api/geocode/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ZERO_RESULTS",
                "results": []
            })))
            .mount(&server)
            .await;

        let client = PlacesClient::new(test_config(server.uri(), 1)).expect("client should build");
        let coordinates = client.geocode("Atlantis").await.expect("geocode should succeed");

        assert!(coordinates.is_none());
    }

    #[tokio::test]
    async fn denied_status_surfaces_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/maps/api/geocode/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "REQUEST_DENIED",
                "error_message": "The provided API key is invalid."
            })))
            .mount(&server)
            .await;

        let client = PlacesClient::new(test_config(server.uri(), 1)).expect("client should build");
        let error = client.geocode("Leeds").await.expect_err("denied should fail");

        match error.downcast_ref::<PlacesApiError>() {
            Some(PlacesApiError::Status { status, message, .. }) => {
                assert_eq!(status, "REQUEST_DENIED");
                assert_eq!(message, "The provided API key is invalid.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_error_does_not_leak_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/maps/api/place/details/json"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let client = PlacesClient::new(test_config(server.uri(), 1)).expect("client should build");
        let error = client.place_details("p1").await.expect_err("503 should fail");
        let rendered = format!("{error:#}");

        assert!(rendered.contains("503"));
        assert!(!rendered.contains(TEST_KEY));
    }

    #[tokio::test]
    async fn nearby_search_follows_page_tokens_up_to_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/maps/api/place/nearbysearch/json"))
            .and(query_param("pagetoken", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "results": [place("p2", "Second")],
                "next_page_token": "page-3"
            })))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/maps/api/place/nearbysearch/json"))
            .and(query_param("keyword", "recycling"))
            .and(query_param("radius", "5000"))
            .and(query_param("type", "establishment"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "results": [place("p1", "First")],
                "next_page_token": "page-2"
            })))
            .mount(&server)
            .await;

        let client = PlacesClient::new(test_config(server.uri(), 2)).expect("client should build");
        let places = client.nearby_search(&query()).await.expect("search should succeed");

        let ids: Vec<_> = places.iter().filter_map(|p| p.place_id.as_deref()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn nearby_search_single_page_ignores_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/maps/api/place/nearbysearch/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "results": [place("p1", "First")],
                "next_page_token": "page-2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = PlacesClient::new(test_config(server.uri(), 1)).expect("client should build");
        let places = client.nearby_search(&query()).await.expect("search should succeed");

        assert_eq!(places.len(), 1);
    }

    #[tokio::test]
    async fn nearby_search_keeps_first_page_when_follow_up_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/maps/api/place/nearbysearch/json"))
            .and(query_param("pagetoken", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "INVALID_REQUEST"
            })))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/maps/api/place/nearbysearch/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "results": [place("p1", "First")],
                "next_page_token": "page-2"
            })))
            .mount(&server)
            .await;

        let client = PlacesClient::new(test_config(server.uri(), 3)).expect("client should build");
        let places = client.nearby_search(&query()).await.expect("search should succeed");

        assert_eq!(places.len(), 1);
    }

    #[tokio::test]
    async fn place_details_parses_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/maps/api/place/details/json"))
            .and(query_param("place_id", "p1"))
            .and(query_param("fields", DETAIL_FIELDS))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "result": {
                    "formatted_address": "1 Canal St, Leeds LS1, UK",
                    "formatted_phone_number": "0113 496 0000",
                    "website": "https://depot.example.com/",
                    "opening_hours": {"weekday_text": ["Monday: 8:00 AM – 4:00 PM"]},
                    "address_components": [
                        {"long_name": "Leeds", "short_name": "Leeds", "types": ["postal_town"]}
                    ]
                }
            })))
            .mount(&server)
            .await;

        let client = PlacesClient::new(test_config(server.uri(), 1)).expect("client should build");
        let details = client.place_details("p1").await.expect("details should succeed");

        assert_eq!(details.formatted_address.as_deref(), Some("1 Canal St, Leeds LS1, UK"));
        assert_eq!(details.website.as_deref(), Some("https://depot.example.com/"));
        assert_eq!(details.address_component_map()["postal_town"], "Leeds");
    }

    #[test]
    fn config_debug_redacts_key() {
        let rendered = format!("{:?}", test_config("http://localhost".to_string(), 1));
        assert!(!rendered.contains(TEST_KEY));
        assert!(rendered.contains("test***"));
    }
}
