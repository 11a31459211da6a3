use indexmap::IndexMap;

use super::matcher::KeywordMatcher;
use super::taxonomy::{KeywordTaxonomy, MaterialCategory, TaxonomyError};

/// 本文分類の結果。カテゴリ → 一致したキーワード（辞書の宣言順・宣言時の大文字小文字）。
pub type ContentMatches = IndexMap<MaterialCategory, Vec<String>>;

/// Webページ本文から素材キーワードを抽出する分類器。
///
/// ネットワーク I/O は行わない。取得に失敗した場合は呼び出し側が空文字列を渡すか、呼び出さない。
#[derive(Debug)]
pub struct ContentClassifier {
    taxonomy: KeywordTaxonomy,
    matcher: KeywordMatcher,
}

impl ContentClassifier {
    /// # Errors
    /// 照合オートマトンを構築できない場合は [`TaxonomyError::Matcher`] を返す。
    pub fn new(taxonomy: KeywordTaxonomy) -> Result<Self, TaxonomyError> {
        let matcher = KeywordMatcher::new(&taxonomy)?;
        Ok(Self { taxonomy, matcher })
    }

    #[must_use]
    pub fn classify(&self, page_text: &str) -> ContentMatches {
        let hits = self.matcher.scan(page_text);
        let mut found = ContentMatches::new();

        for (idx, entry) in self.taxonomy.entries().iter().enumerate() {
            let keywords: Vec<String> = hits
                .matched_keywords(idx)
                .map(|keyword_idx| entry.keywords()[keyword_idx].clone())
                .collect();
            if !keywords.is_empty() {
                found.insert(entry.category(), keywords);
            }
        }

        found
    }

    #[must_use]
    pub fn taxonomy(&self) -> &KeywordTaxonomy {
        &self.taxonomy
    }
}
