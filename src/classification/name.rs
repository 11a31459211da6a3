use std::collections::BTreeSet;

use super::matcher::KeywordMatcher;
use super::taxonomy::{KeywordTaxonomy, MaterialCategory, TaxonomyError};

/// 店舗名から取り扱い素材を推定する分類器。
///
/// 名前を小文字化し、各カテゴリのトリガー文字列のいずれかが部分一致すればそのカテゴリを採用する。
/// カテゴリは排他的ではない。
#[derive(Debug)]
pub struct NameClassifier {
    taxonomy: KeywordTaxonomy,
    matcher: KeywordMatcher,
}

impl NameClassifier {
    /// # Errors
    /// 照合オートマトンを構築できない場合は [`TaxonomyError::Matcher`] を返す。
    pub fn new(taxonomy: KeywordTaxonomy) -> Result<Self, TaxonomyError> {
        let matcher = KeywordMatcher::new(&taxonomy)?;
        Ok(Self { taxonomy, matcher })
    }

    #[must_use]
    pub fn classify(&self, name: &str) -> BTreeSet<MaterialCategory> {
        let hits = self.matcher.scan(name);
        self.taxonomy
            .entries()
            .iter()
            .enumerate()
            .filter(|(idx, _)| hits.entry_matched(*idx))
            .map(|(_, entry)| entry.category())
            .collect()
    }

    #[must_use]
    pub fn taxonomy(&self) -> &KeywordTaxonomy {
        &self.taxonomy
    }
}
