//! ロケーション単位で検索・ウェブサイト走査・重複排除を順に実行する。
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::business::BusinessRecord;
use crate::classification::{Taxonomies, build_classifiers};
use crate::clients::{PlacesClient, WebsiteClient};
use crate::config::Config;

pub mod dedup;
pub mod enrich;
pub mod export;
pub mod report;
pub mod search;

pub use dedup::{UniquePlaces, deduplicate};
pub use enrich::WebsiteScanStage;
pub use export::{JsonExporter, export_file_name};
pub use search::{PlaceSearchStage, SearchError, SearchSettings};

/// ロケーション1件分の処理結果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationOutcome {
    Searched { found: usize, added: usize },
    NotFound,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationReport {
    pub location: String,
    pub outcome: LocationOutcome,
}

/// 実行全体の結果。`records` は全ロケーションを通じた初出順。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub records: Vec<BusinessRecord>,
    pub locations: Vec<LocationReport>,
}

/// ロケーションを入力順に1件ずつ処理するパイプライン本体。
pub struct FinderPipeline {
    search: PlaceSearchStage,
    website_scan: Option<WebsiteScanStage>,
}

impl FinderPipeline {
    #[must_use]
    pub fn new(search: PlaceSearchStage, website_scan: Option<WebsiteScanStage>) -> Self {
        Self {
            search,
            website_scan,
        }
    }

    /// 設定から実クライアントと分類器を組み立てる。
    ///
    /// # Errors
    /// 分類器またはHTTPクライアントの構築に失敗した場合はエラーを返す。
    pub fn from_config(config: &Config, taxonomies: Taxonomies) -> Result<Self> {
        let (names, content) =
            build_classifiers(taxonomies).context("failed to build keyword classifiers")?;

        let places = Arc::new(
            PlacesClient::new(config.places_config()).context("failed to create places client")?,
        );
        let search = PlaceSearchStage::new(
            places.clone(),
            places.clone(),
            places,
            Arc::new(names),
            SearchSettings {
                radius_meters: config.search_radius_meters().get(),
                keyword: config.search_keyword().to_string(),
                place_type: config.search_place_type().map(ToString::to_string),
            },
        );

        let website_scan = if config.website_scan_enabled() {
            let fetcher = WebsiteClient::new(config.website_config())
                .context("failed to create website client")?;
            Some(WebsiteScanStage::new(
                Arc::new(fetcher),
                Arc::new(content),
                config.website_fetch_delay(),
            ))
        } else {
            None
        };

        Ok(Self::new(search, website_scan))
    }

    /// 全ロケーションを順に処理する。1件の失敗で全体は止めない。
    pub async fn run(&self, locations: &[String]) -> RunSummary {
        let mut unique = UniquePlaces::new();
        let mut reports = Vec::with_capacity(locations.len());

        for location in locations {
            info!(location = %location, "searching location");
            let searched = self
                .search
                .search_excluding(location, |id| unique.contains(id))
                .await;
            let outcome = match searched {
                Ok(records) => {
                    let found = records.len();
                    let added = self.collect(&mut unique, records).await;
                    info!(location = %location, found, added, "location processed");
                    LocationOutcome::Searched { found, added }
                }
                Err(SearchError::LocationNotFound(_)) => {
                    warn!(location = %location, "location could not be geocoded");
                    LocationOutcome::NotFound
                }
                Err(error) => {
                    warn!(location = %location, error = %error, "location search failed");
                    LocationOutcome::Failed {
                        reason: error.to_string(),
                    }
                }
            };
            reports.push(LocationReport {
                location: location.clone(),
                outcome,
            });
        }

        info!(
            locations = reports.len(),
            businesses = unique.len(),
            "run finished"
        );
        RunSummary {
            records: unique.into_records(),
            locations: reports,
        }
    }

    /// 未登録のレコードだけWebサイトを走査してから取り込む。
    async fn collect(&self, unique: &mut UniquePlaces, records: Vec<BusinessRecord>) -> usize {
        let mut added = 0;
        for mut record in records {
            if record.external_id().is_some_and(|id| unique.contains(id)) {
                continue;
            }
            if let Some(scan) = &self.website_scan {
                scan.enrich(&mut record).await;
            }
            if unique.insert(record) {
                added += 1;
            }
        }
        added
    }
}
