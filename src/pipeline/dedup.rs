use std::collections::HashSet;

use crate::business::BusinessRecord;

/// 初出順を保った事業者一覧と、取り込み済みプレイスIDの集合。
///
/// プレイスIDを持たないレコードは照合できないため常に取り込む。
#[derive(Debug, Default, Clone)]
pub struct UniquePlaces {
    records: Vec<BusinessRecord>,
    seen: HashSet<String>,
}

impl UniquePlaces {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 未登録のIDであれば末尾に追加し `true` を返す。
    pub fn insert(&mut self, record: BusinessRecord) -> bool {
        if let Some(id) = record.external_id()
            && !self.seen.insert(id.to_string())
        {
            return false;
        }
        self.records.push(record);
        true
    }

    /// まとめて取り込み、実際に追加した件数を返す。
    pub fn extend<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = BusinessRecord>,
    {
        records
            .into_iter()
            .map(|record| self.insert(record))
            .filter(|added| *added)
            .count()
    }

    #[must_use]
    pub fn contains(&self, external_id: &str) -> bool {
        self.seen.contains(external_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[BusinessRecord] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<BusinessRecord> {
        self.records
    }
}

/// 先勝ちでプレイスIDの重複を取り除く。
#[must_use]
pub fn deduplicate(records: Vec<BusinessRecord>) -> Vec<BusinessRecord> {
    let mut unique = UniquePlaces::new();
    unique.extend(records);
    unique.into_records()
}
