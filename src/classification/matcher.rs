//! 辞書全体を一度の走査で照合する Aho-Corasick 検索構造体。
use std::collections::HashMap;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, BuildError, MatchKind};

use super::taxonomy::KeywordTaxonomy;

/// パターンが指す辞書上の位置（エントリ番号, キーワード番号）。
#[derive(Debug, Clone, Copy)]
struct KeywordSlot {
    entry: usize,
    keyword: usize,
}

/// 小文字化したキーワードをパターンとして保持する。
///
/// 同じ小文字表記のキーワードは1パターンに畳み込み、該当する全スロットへ配る。
#[derive(Debug)]
pub(crate) struct KeywordMatcher {
    automaton: AhoCorasick,
    targets: Vec<Vec<KeywordSlot>>,
    shape: Vec<usize>,
}

impl KeywordMatcher {
    pub(crate) fn new(taxonomy: &KeywordTaxonomy) -> Result<Self, BuildError> {
        let mut patterns: Vec<String> = Vec::new();
        let mut targets: Vec<Vec<KeywordSlot>> = Vec::new();
        let mut pattern_ids: HashMap<String, usize> = HashMap::new();

        for (entry_idx, entry) in taxonomy.entries().iter().enumerate() {
            for (keyword_idx, keyword) in entry.keywords().iter().enumerate() {
                let lowered = keyword.to_lowercase();
                let id = match pattern_ids.get(&lowered) {
                    Some(id) => *id,
                    None => {
                        let id = patterns.len();
                        pattern_ids.insert(lowered.clone(), id);
                        patterns.push(lowered);
                        targets.push(Vec::new());
                        id
                    }
                };
                targets[id].push(KeywordSlot {
                    entry: entry_idx,
                    keyword: keyword_idx,
                });
            }
        }

        // 重なり検出には Standard セマンティクスが必要。
        let automaton = AhoCorasickBuilder::new()
            .match_kind(MatchKind::Standard)
            .build(&patterns)?;

        let shape = taxonomy
            .entries()
            .iter()
            .map(|entry| entry.keywords().len())
            .collect();

        Ok(Self {
            automaton,
            targets,
            shape,
        })
    }

    /// テキストを小文字化して走査し、出現したキーワード位置を返す。
    #[must_use]
    pub(crate) fn scan(&self, text: &str) -> MatchSet {
        let mut hits: Vec<Vec<bool>> = self.shape.iter().map(|len| vec![false; *len]).collect();
        if text.is_empty() {
            return MatchSet { hits };
        }

        let lowered = text.to_lowercase();
        for mat in self.automaton.find_overlapping_iter(&lowered) {
            for slot in &self.targets[mat.pattern().as_usize()] {
                hits[slot.entry][slot.keyword] = true;
            }
        }

        MatchSet { hits }
    }
}

/// 走査結果。辞書のエントリ順・キーワード順に対応する。
#[derive(Debug, Clone)]
pub(crate) struct MatchSet {
    hits: Vec<Vec<bool>>,
}

impl MatchSet {
    pub(crate) fn entry_matched(&self, entry: usize) -> bool {
        self.hits
            .get(entry)
            .is_some_and(|keywords| keywords.iter().any(|hit| *hit))
    }

    pub(crate) fn matched_keywords(&self, entry: usize) -> impl Iterator<Item = usize> + '_ {
        self.hits
            .get(entry)
            .into_iter()
            .flat_map(|keywords| keywords.iter().enumerate())
            .filter_map(|(idx, hit)| hit.then_some(idx))
    }
}
