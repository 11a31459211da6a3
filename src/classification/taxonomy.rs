//! 素材カテゴリとキーワード辞書。
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 取り扱い素材のカテゴリ（閉じた列挙）。
///
/// 派生 `Ord` がエクスポート時のソート順になるため、ラベルのアルファベット順に宣言する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialCategory {
    Automotive,
    Batteries,
    Electronics,
    General,
    Glass,
    Hazardous,
    Metal,
    Organic,
    Paper,
    Plastic,
    Textile,
}

impl MaterialCategory {
    pub const ALL: [Self; 11] = [
        Self::Automotive,
        Self::Batteries,
        Self::Electronics,
        Self::General,
        Self::Glass,
        Self::Hazardous,
        Self::Metal,
        Self::Organic,
        Self::Paper,
        Self::Plastic,
        Self::Textile,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Automotive => "automotive",
            Self::Batteries => "batteries",
            Self::Electronics => "electronics",
            Self::General => "general",
            Self::Glass => "glass",
            Self::Hazardous => "hazardous",
            Self::Metal => "metal",
            Self::Organic => "organic",
            Self::Paper => "paper",
            Self::Plastic => "plastic",
            Self::Textile => "textile",
        }
    }
}

impl fmt::Display for MaterialCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("failed to read taxonomy file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid taxonomy document: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("category {0} has no keywords")]
    EmptyCategory(MaterialCategory),
    #[error("category {0} contains an empty keyword")]
    EmptyKeyword(MaterialCategory),
    #[error("failed to compile keyword matcher: {0}")]
    Matcher(#[from] aho_corasick::BuildError),
}

/// 1カテゴリ分のトリガーキーワード。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyEntry {
    category: MaterialCategory,
    keywords: Vec<String>,
}

impl TaxonomyEntry {
    #[must_use]
    pub fn category(&self) -> MaterialCategory {
        self.category
    }

    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// カテゴリ → キーワード列の順序付き辞書。
///
/// 起動時に一度だけ構築し、以降は変更しない。分類器には明示的に渡す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordTaxonomy {
    entries: Vec<TaxonomyEntry>,
}

impl KeywordTaxonomy {
    /// 任意のエントリ列から辞書を構築する。
    ///
    /// 同じカテゴリが複数回現れた場合は最初の位置にまとめ、カテゴリ内の重複キーワードは初出のみ残す。
    ///
    /// # Errors
    /// キーワードが空文字列、またはカテゴリのキーワード列が空の場合は [`TaxonomyError`] を返す。
    pub fn new<I, K>(entries: I) -> Result<Self, TaxonomyError>
    where
        I: IntoIterator<Item = (MaterialCategory, Vec<K>)>,
        K: Into<String>,
    {
        let mut merged: IndexMap<MaterialCategory, Vec<String>> = IndexMap::new();
        for (category, keywords) in entries {
            let slot = merged.entry(category).or_default();
            for keyword in keywords {
                let keyword: String = keyword.into();
                if keyword.trim().is_empty() {
                    return Err(TaxonomyError::EmptyKeyword(category));
                }
                if !slot.contains(&keyword) {
                    slot.push(keyword);
                }
            }
        }

        let mut result = Vec::with_capacity(merged.len());
        for (category, keywords) in merged {
            if keywords.is_empty() {
                return Err(TaxonomyError::EmptyCategory(category));
            }
            result.push(TaxonomyEntry { category, keywords });
        }

        Ok(Self { entries: result })
    }

    /// 店舗名ヒューリスティック用の既定辞書。
    #[must_use]
    pub fn builtin_name() -> Self {
        Self::from_static(NAME_KEYWORDS)
    }

    /// Webサイト本文スキャン用の既定辞書（素材コード略称を含む）。
    #[must_use]
    pub fn builtin_content() -> Self {
        Self::from_static(CONTENT_KEYWORDS)
    }

    fn from_static(table: &[(MaterialCategory, &[&str])]) -> Self {
        let entries = table
            .iter()
            .map(|(category, keywords)| TaxonomyEntry {
                category: *category,
                keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
            })
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[TaxonomyEntry] {
        &self.entries
    }

    pub fn categories(&self) -> impl Iterator<Item = MaterialCategory> + '_ {
        self.entries.iter().map(TaxonomyEntry::category)
    }

    #[must_use]
    pub fn keywords(&self, category: MaterialCategory) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|entry| entry.category == category)
            .map(TaxonomyEntry::keywords)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 名前用・本文用の辞書の組。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxonomies {
    pub name: KeywordTaxonomy,
    pub content: KeywordTaxonomy,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TaxonomyDocument {
    name: IndexMap<MaterialCategory, Vec<String>>,
    content: IndexMap<MaterialCategory, Vec<String>>,
}

impl Taxonomies {
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            name: KeywordTaxonomy::builtin_name(),
            content: KeywordTaxonomy::builtin_content(),
        }
    }

    /// YAML文書から辞書を読み込む。
    ///
    /// # Errors
    /// YAMLのパースに失敗した場合、未知のカテゴリや空キーワードを含む場合はエラーを返す。
    pub fn from_yaml_str(raw: &str) -> Result<Self, TaxonomyError> {
        let document: TaxonomyDocument = serde_yaml::from_str(raw)?;
        Ok(Self {
            name: KeywordTaxonomy::new(document.name)?,
            content: KeywordTaxonomy::new(document.content)?,
        })
    }

    /// YAMLファイルから辞書を読み込む。
    ///
    /// # Errors
    /// ファイルの読み込みに失敗した場合は [`TaxonomyError::Read`] を返す。
    pub fn from_yaml_file(path: &Path) -> Result<Self, TaxonomyError> {
        let raw = fs::read_to_string(path).map_err(|source| TaxonomyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }
}

impl Default for Taxonomies {
    fn default() -> Self {
        Self::builtin()
    }
}

const NAME_KEYWORDS: &[(MaterialCategory, &[&str])] = &[
    (
        MaterialCategory::Plastic,
        &["plastic", "pet", "polymer", "hdpe", "ldpe", "pvc"],
    ),
    (
        MaterialCategory::Metal,
        &["metal", "scrap", "aluminum", "steel", "copper", "iron"],
    ),
    (
        MaterialCategory::Paper,
        &["paper", "cardboard", "newspaper", "magazine"],
    ),
    (MaterialCategory::Glass, &["glass", "bottles"]),
    (
        MaterialCategory::Electronics,
        &["electronic", "e-waste", "computer", "phone", "laptop"],
    ),
    (
        MaterialCategory::Batteries,
        &["battery", "batteries", "accumulator"],
    ),
    (
        MaterialCategory::Automotive,
        &["car", "automotive", "vehicle", "auto parts"],
    ),
    (
        MaterialCategory::Organic,
        &["organic", "compost", "food waste", "green waste"],
    ),
    (
        MaterialCategory::Textile,
        &["textile", "clothing", "fabric", "clothes", "garment"],
    ),
    (
        MaterialCategory::General,
        &["recycling center", "waste management", "collection center"],
    ),
];

const CONTENT_KEYWORDS: &[(MaterialCategory, &[&str])] = &[
    (
        MaterialCategory::Plastic,
        &["plastic", "PET", "HDPE", "PVC", "LDPE", "PP", "PS"],
    ),
    (
        MaterialCategory::Metal,
        &["metal", "aluminum", "steel", "copper", "iron", "scrap metal"],
    ),
    (
        MaterialCategory::Paper,
        &["paper", "cardboard", "newspaper", "magazine"],
    ),
    (MaterialCategory::Glass, &["glass", "bottles"]),
    (
        MaterialCategory::Electronics,
        &[
            "electronics",
            "e-waste",
            "computers",
            "phones",
            "electronic waste",
        ],
    ),
    (MaterialCategory::Batteries, &["batteries", "battery"]),
    (
        MaterialCategory::Automotive,
        &["automotive", "car parts", "vehicle"],
    ),
    (
        MaterialCategory::Organic,
        &["organic waste", "compost", "food waste"],
    ),
    (
        MaterialCategory::Textile,
        &["textile", "clothing", "fabric", "clothes"],
    ),
    (
        MaterialCategory::Hazardous,
        &["hazardous", "chemical", "paint", "oil"],
    ),
];
