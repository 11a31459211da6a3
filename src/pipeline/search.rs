use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::business::{BusinessRecord, PlaceFields};
use crate::classification::NameClassifier;
use crate::clients::{
    LocationResolver, NearbyQuery, NearbySearch, PlaceDetails, PlaceDetailsProvider, PlaceSummary,
};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("location not found: {0}")]
    LocationNotFound(String),
    #[error("places lookup failed for {location}: {source}")]
    Upstream {
        location: String,
        #[source]
        source: anyhow::Error,
    },
}

/// 周辺検索の条件のうちロケーションに依存しない部分。
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub radius_meters: u32,
    pub keyword: String,
    pub place_type: Option<String>,
}

/// ジオコーディング → 周辺検索 → 詳細取得 → 名前分類 を行うステージ。
pub struct PlaceSearchStage {
    resolver: Arc<dyn LocationResolver>,
    nearby: Arc<dyn NearbySearch>,
    details: Arc<dyn PlaceDetailsProvider>,
    names: Arc<NameClassifier>,
    settings: SearchSettings,
}

impl PlaceSearchStage {
    #[must_use]
    pub fn new(
        resolver: Arc<dyn LocationResolver>,
        nearby: Arc<dyn NearbySearch>,
        details: Arc<dyn PlaceDetailsProvider>,
        names: Arc<NameClassifier>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            resolver,
            nearby,
            details,
            names,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// ロケーション周辺の事業者を検索し、名前分類済みのレコードを返す。
    ///
    /// # Errors
    /// [`PlaceSearchStage::search_excluding`] と同じ。
    pub async fn search(&self, location: &str) -> Result<Vec<BusinessRecord>, SearchError> {
        self.search_excluding(location, |_| false).await
    }

    /// 検索結果のうち `already_kept` が真を返すプレイスIDは詳細取得を省く。
    ///
    /// 同じ応答内で繰り返されるIDの詳細取得は1回だけ行う。
    /// 詳細取得の失敗は警告に留め、要約フィールドだけでレコードを組み立てる。
    ///
    /// # Errors
    /// 座標が解決できない場合は [`SearchError::LocationNotFound`]、
    /// ジオコーディングまたは周辺検索が失敗した場合は [`SearchError::Upstream`] を返す。
    pub async fn search_excluding<F>(
        &self,
        location: &str,
        already_kept: F,
    ) -> Result<Vec<BusinessRecord>, SearchError>
    where
        F: Fn(&str) -> bool + Sync,
    {
        let coordinates = self
            .resolver
            .resolve(location)
            .await
            .map_err(|source| SearchError::Upstream {
                location: location.to_string(),
                source,
            })?
            .ok_or_else(|| SearchError::LocationNotFound(location.to_string()))?;
        debug!(location, lat = coordinates.lat, lng = coordinates.lng, "location resolved");

        let query = NearbyQuery {
            location: coordinates,
            radius_meters: self.settings.radius_meters,
            keyword: self.settings.keyword.clone(),
            place_type: self.settings.place_type.clone(),
        };
        let summaries =
            self.nearby
                .nearby(&query)
                .await
                .map_err(|source| SearchError::Upstream {
                    location: location.to_string(),
                    source,
                })?;
        info!(location, found = summaries.len(), "nearby search finished");

        let mut fetched: HashMap<String, Option<PlaceDetails>> = HashMap::new();
        let mut records = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let details = match summary.place_id.as_deref() {
                Some(place_id) if !already_kept(place_id) => {
                    if let Some(cached) = fetched.get(place_id) {
                        cached.clone()
                    } else {
                        let details = self.lookup_details(place_id).await;
                        fetched.insert(place_id.to_string(), details.clone());
                        details
                    }
                }
                _ => None,
            };
            records.push(BusinessRecord::assemble(
                place_fields(summary, details),
                &self.names,
                None,
            ));
        }

        Ok(records)
    }

    async fn lookup_details(&self, place_id: &str) -> Option<PlaceDetails> {
        match self.details.details(place_id).await {
            Ok(details) => Some(details),
            Err(error) => {
                warn!(place_id, error = %error, "place details unavailable");
                None
            }
        }
    }
}

/// 要約と詳細を突き合わせる。住所は詳細を優先し、なければ `vicinity` を使う。
fn place_fields(summary: PlaceSummary, details: Option<PlaceDetails>) -> PlaceFields {
    let coordinates = summary.coordinates();
    let PlaceSummary {
        place_id,
        name,
        rating,
        vicinity,
        ..
    } = summary;

    let mut fields = PlaceFields {
        name: name.unwrap_or_default(),
        address: vicinity,
        coordinates,
        external_id: place_id,
        rating,
        ..PlaceFields::default()
    };

    if let Some(details) = details {
        fields.opening_hours = details.weekday_text();
        fields.address_components = details.address_component_map();
        if details.formatted_address.is_some() {
            fields.address = details.formatted_address;
        }
        fields.phone = details.formatted_phone_number;
        fields.website = details.website;
    }

    fields
}
