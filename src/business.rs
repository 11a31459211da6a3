//! エクスポート単位となる事業者レコード。
use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::classification::{ContentMatches, MaterialCategory, NameClassifier};

/// 緯度経度。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// 両方が有限値の場合のみ座標を返す。
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        (lat.is_finite() && lng.is_finite()).then_some(Self { lat, lng })
    }
}

/// 上流APIから集めた生のフィールド。欠落はそのまま `None`／空になる。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceFields {
    pub name: String,
    pub address: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub external_id: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub rating: Option<f64>,
    pub opening_hours: Vec<String>,
    pub address_components: IndexMap<String, String>,
}

/// 1事業者分の識別情報・所在地・連絡先・分類結果。
///
/// `materials` は名前分類と本文分類のキーの和集合で、追加のみ行い削除はしない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub name: String,
    pub address: Option<String>,
    pub coordinates: Option<Coordinates>,
    #[serde(rename = "place_id")]
    external_id: Option<String>,
    materials: BTreeSet<MaterialCategory>,
    #[serde(rename = "website_materials", default)]
    content_materials: ContentMatches,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub rating: Option<f64>,
    #[serde(default)]
    pub opening_hours: Vec<String>,
    #[serde(default)]
    pub address_components: IndexMap<String, String>,
}

impl BusinessRecord {
    /// 生フィールドと名前分類、任意の本文分類結果からレコードを組み立てる。
    #[must_use]
    pub fn assemble(
        fields: PlaceFields,
        names: &NameClassifier,
        content: Option<ContentMatches>,
    ) -> Self {
        let PlaceFields {
            name,
            address,
            coordinates,
            external_id,
            phone,
            website,
            rating,
            opening_hours,
            address_components,
        } = fields;

        let materials = names.classify(&name);
        let mut record = Self {
            name,
            address,
            coordinates,
            external_id,
            materials,
            content_materials: ContentMatches::new(),
            phone,
            website,
            rating,
            opening_hours,
            address_components,
        };

        if let Some(found) = content {
            record.merge_content(found);
        }

        record
    }

    /// 本文分類結果を取り込む。カテゴリ・キーワードは追加のみ。
    pub fn merge_content(&mut self, found: ContentMatches) {
        for (category, keywords) in found {
            self.materials.insert(category);
            let slot = self.content_materials.entry(category).or_default();
            for keyword in keywords {
                if !slot.contains(&keyword) {
                    slot.push(keyword);
                }
            }
        }
    }

    #[must_use]
    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }

    #[must_use]
    pub fn materials(&self) -> &BTreeSet<MaterialCategory> {
        &self.materials
    }

    #[must_use]
    pub fn content_materials(&self) -> &ContentMatches {
        &self.content_materials
    }
}

/// `types[0]` をキーに住所要素を集約する。重複タイプは後勝ち、タイプなしの要素は無視する。
#[must_use]
pub fn collect_address_components<'a, I>(components: I) -> IndexMap<String, String>
where
    I: IntoIterator<Item = (&'a [String], &'a str)>,
{
    let mut collected = IndexMap::new();
    for (types, long_name) in components {
        if let Some(kind) = types.first() {
            collected.insert(kind.clone(), long_name.to_string());
        }
    }
    collected
}
