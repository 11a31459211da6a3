use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tracing::info;

use crate::business::BusinessRecord;
use crate::util::text::slugify;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// 結果を整形済みJSON配列として1ファイルに書き出す。
#[derive(Debug, Clone)]
pub struct JsonExporter {
    output_dir: PathBuf,
}

impl JsonExporter {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 出力ディレクトリを作成し、レコードを書き出したファイルのパスを返す。
    ///
    /// # Errors
    /// ディレクトリ作成、シリアライズ、書き込みのいずれかに失敗した場合はエラーを返す。
    pub async fn export(
        &self,
        records: &[BusinessRecord],
        locations: &[String],
        timestamp: NaiveDateTime,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| {
                format!(
                    "failed to create output directory {}",
                    self.output_dir.display()
                )
            })?;

        let path = self.output_dir.join(export_file_name(locations, timestamp));
        let body =
            serde_json::to_string_pretty(records).context("failed to serialize business records")?;
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;

        info!(path = %path.display(), records = records.len(), "exported businesses");
        Ok(path)
    }
}

/// `{label}_{YYYYmmdd_HHMMSS}.json` 形式のファイル名を作る。
#[must_use]
pub fn export_file_name(locations: &[String], timestamp: NaiveDateTime) -> String {
    let label = match locations {
        [] => "locations".to_string(),
        [only] => location_slug(only),
        [first, rest @ ..] => format!("{}_plus_{}", location_slug(first), rest.len()),
    };
    format!("{label}_{}.json", timestamp.format(TIMESTAMP_FORMAT))
}

fn location_slug(location: &str) -> String {
    slugify(location).unwrap_or_else(|| "location".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    use crate::business::{Coordinates, PlaceFields};
    use crate::classification::{KeywordTaxonomy, NameClassifier};

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|date| date.and_hms_opt(7, 5, 1))
            .expect("valid timestamp")
    }

    fn locations(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_string()).collect()
    }

    #[rstest]
    #[case(&["Leeds, UK"], "leeds_uk_20240309_070501.json")]
    #[case(&["Greater London", "Leeds", "York"], "greater_london_plus_2_20240309_070501.json")]
    #[case(&[], "locations_20240309_070501.json")]
    #[case(&["???"], "location_20240309_070501.json")]
    fn file_name_reflects_locations(#[case] names: &[&str], #[case] expected: &str) {
        assert_eq!(export_file_name(&locations(names), timestamp()), expected);
    }

    #[tokio::test]
    async fn export_writes_pretty_json_with_unicode() {
        let dir = tempfile::tempdir().expect("temp dir");
        let exporter = JsonExporter::new(dir.path().join("recyclers"));
        let names = NameClassifier::new(KeywordTaxonomy::builtin_name()).expect("classifier");
        let record = BusinessRecord::assemble(
            PlaceFields {
                name: "Café Verre Glass".to_string(),
                coordinates: Coordinates::new(48.85, 2.35),
                external_id: Some("fr1".to_string()),
                ..PlaceFields::default()
            },
            &names,
            None,
        );

        let path = exporter
            .export(std::slice::from_ref(&record), &locations(&["Paris"]), timestamp())
            .await
            .expect("export");

        assert_eq!(
            path.file_name().and_then(|name| name.to_str()),
            Some("paris_20240309_070501.json")
        );
        let written = std::fs::read_to_string(&path).expect("read export");
        assert!(written.contains("Café Verre Glass"));
        assert!(written.contains("\n  {\n    \"name\""));

        let decoded: Vec<BusinessRecord> = serde_json::from_str(&written).expect("parse");
        assert_eq!(decoded, vec![record]);
    }

    #[tokio::test]
    async fn export_of_no_records_writes_empty_array() {
        let dir = tempfile::tempdir().expect("temp dir");
        let exporter = JsonExporter::new(dir.path());

        let path = exporter
            .export(&[], &[], timestamp())
            .await
            .expect("export");

        assert_eq!(std::fs::read_to_string(path).expect("read"), "[]");
    }
}
