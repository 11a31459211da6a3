//! 外部サービス（プレイスAPI・事業者Webサイト）との境界。
//!
//! パイプラインはここで定義するトレイト越しに協調者を呼び出すため、テストでは差し替えられる。
use async_trait::async_trait;

use crate::business::Coordinates;

pub mod places;
pub mod website;

pub use places::models::{PlaceDetails, PlaceSummary};
pub use places::{PlacesApiError, PlacesClient, PlacesConfig};
pub use website::{FetchError, WebsiteClient, WebsiteConfig};

/// Nearby Search の検索条件。
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyQuery {
    pub location: Coordinates,
    pub radius_meters: u32,
    pub keyword: String,
    pub place_type: Option<String>,
}

/// 自由記述のロケーションを座標へ解決する。`None` は「見つからない」。
#[async_trait]
pub trait LocationResolver: Send + Sync {
    async fn resolve(&self, location: &str) -> anyhow::Result<Option<Coordinates>>;
}

/// 座標周辺のキーワード一致事業者を列挙する。
#[async_trait]
pub trait NearbySearch: Send + Sync {
    async fn nearby(&self, query: &NearbyQuery) -> anyhow::Result<Vec<PlaceSummary>>;
}

#[async_trait]
pub trait PlaceDetailsProvider: Send + Sync {
    async fn details(&self, place_id: &str) -> anyhow::Result<PlaceDetails>;
}

/// URLのページ本文テキストを取得する。
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}
