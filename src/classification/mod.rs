//! 素材分類（店舗名・Webページ本文）。
pub mod content;
pub(crate) mod matcher;
pub mod name;
pub mod taxonomy;

pub use content::{ContentClassifier, ContentMatches};
pub use name::NameClassifier;
pub use taxonomy::{KeywordTaxonomy, MaterialCategory, Taxonomies, TaxonomyEntry, TaxonomyError};

/// 辞書の組から両分類器を構築する。
///
/// # Errors
/// いずれかの照合オートマトンを構築できない場合は [`TaxonomyError`] を返す。
pub fn build_classifiers(
    taxonomies: Taxonomies,
) -> Result<(NameClassifier, ContentClassifier), TaxonomyError> {
    let Taxonomies { name, content } = taxonomies;
    Ok((NameClassifier::new(name)?, ContentClassifier::new(content)?))
}
