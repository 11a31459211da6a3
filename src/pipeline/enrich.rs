use std::{sync::Arc, time::Duration};

use tracing::{debug, warn};

use crate::business::BusinessRecord;
use crate::classification::ContentClassifier;
use crate::clients::ContentFetcher;

/// 事業者Webサイトの本文から素材キーワードを拾い、レコードへ追記するステージ。
pub struct WebsiteScanStage {
    fetcher: Arc<dyn ContentFetcher>,
    classifier: Arc<ContentClassifier>,
    courtesy_delay: Duration,
}

impl WebsiteScanStage {
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        classifier: Arc<ContentClassifier>,
        courtesy_delay: Duration,
    ) -> Self {
        Self {
            fetcher,
            classifier,
            courtesy_delay,
        }
    }

    /// Webサイトがあれば取得・分類して結果をマージする。取得を試みた場合は `true`。
    ///
    /// 取得失敗は本文なしとして扱い、試行のたびに `courtesy_delay` だけ待機する。
    pub async fn enrich(&self, record: &mut BusinessRecord) -> bool {
        let Some(url) = record
            .website
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
        else {
            return false;
        };

        let text = match self.fetcher.fetch_text(&url).await {
            Ok(text) => text,
            Err(error) => {
                warn!(url = %url, error = %error, "website fetch failed");
                String::new()
            }
        };

        let found = self.classifier.classify(&text);
        debug!(url = %url, categories = found.len(), "website scanned");
        record.merge_content(found);

        tokio::time::sleep(self.courtesy_delay).await;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use reqwest::StatusCode;

    use crate::business::PlaceFields;
    use crate::classification::{KeywordTaxonomy, MaterialCategory, NameClassifier};
    use crate::clients::FetchError;

    struct FakeFetcher {
        body: Option<String>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ContentFetcher for FakeFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
            self.calls.lock().expect("lock").push(url.to_string());
            self.body.clone().ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: StatusCode::SERVICE_UNAVAILABLE,
            })
        }
    }

    fn stage(body: Option<&str>) -> (WebsiteScanStage, Arc<FakeFetcher>) {
        let fetcher = Arc::new(FakeFetcher {
            body: body.map(str::to_string),
            calls: Mutex::new(Vec::new()),
        });
        let classifier = Arc::new(
            ContentClassifier::new(KeywordTaxonomy::builtin_content()).expect("classifier"),
        );
        (
            WebsiteScanStage::new(fetcher.clone(), classifier, Duration::ZERO),
            fetcher,
        )
    }

    fn record(website: Option<&str>) -> BusinessRecord {
        let names = NameClassifier::new(KeywordTaxonomy::builtin_name()).expect("classifier");
        BusinessRecord::assemble(
            PlaceFields {
                name: "Civic Amenity Site".to_string(),
                website: website.map(str::to_string),
                ..PlaceFields::default()
            },
            &names,
            None,
        )
    }

    #[tokio::test]
    async fn enrich_merges_page_keywords() {
        let (stage, fetcher) = stage(Some("We accept Batteries and scrap metal"));
        let mut record = record(Some("https://depot.example"));

        assert!(stage.enrich(&mut record).await);

        assert_eq!(
            record.content_materials()[&MaterialCategory::Metal],
            vec!["metal", "scrap metal"]
        );
        assert!(record.materials().contains(&MaterialCategory::Batteries));
        assert_eq!(*fetcher.calls.lock().expect("lock"), vec!["https://depot.example"]);
    }

    #[tokio::test]
    async fn fetch_failure_leaves_record_unchanged() {
        let (stage, _) = stage(None);
        let mut record = record(Some("https://down.example"));
        let before = record.clone();

        assert!(stage.enrich(&mut record).await);
        assert_eq!(record, before);
    }

    #[tokio::test]
    async fn records_without_website_are_skipped() {
        let (stage, fetcher) = stage(Some("glass"));
        let mut record = record(None);

        assert!(!stage.enrich(&mut record).await);
        assert!(fetcher.calls.lock().expect("lock").is_empty());
    }
}
