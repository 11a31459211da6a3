//! テキスト処理ユーティリティ。
//!
//! ファイル名用のスラッグ化、秘匿値のマスク、エラーメッセージの切り詰めを提供します。

/// エラーメッセージの最大長
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 300;

/// ロケーション名などをファイル名に使える形へ変換する。
///
/// 小文字化し、英数字以外の連続は `_` 1文字に置き換え、前後の `_` を取り除く。
/// 何も残らない場合は `None`。
#[must_use]
pub fn slugify(input: &str) -> Option<String> {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;

    for ch in input.chars() {
        if ch.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_separator = true;
        }
    }

    (!slug.is_empty()).then_some(slug)
}

/// 秘匿値の先頭4文字以外を伏せる。
#[must_use]
pub fn redact(input: &str) -> String {
    let mut chars = input.chars();
    let head: String = chars.by_ref().take(4).collect();
    if chars.next().is_none() {
        "****".to_string()
    } else {
        format!("{head}***")
    }
}

/// エラーメッセージを要約して切り詰める。
#[must_use]
pub fn truncate_error_message(msg: &str) -> String {
    let char_count = msg.chars().count();
    if char_count <= MAX_ERROR_MESSAGE_LENGTH {
        return msg.to_string();
    }
    let truncated: String = msg.chars().take(MAX_ERROR_MESSAGE_LENGTH).collect();
    format!("{truncated}... (truncated, {char_count} chars)")
}
