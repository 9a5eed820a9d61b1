//! 共通型定義
//!
//! ペイロード種別やヘッダー定数など、アクションで使う小さな値型

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Content-Typeヘッダー名
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// ヘッダーマップ（キーの大文字小文字は比較時に無視される）
pub type Headers = HashMap<String, String>;

/// クエリパラメーター（同じキーが複数回現れるため値はリスト）
pub type QueryParams = HashMap<String, Vec<String>>;

/// ペイロードの比較方法
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PayloadType {
    /// 文字列として完全一致で比較
    #[default]
    Plaintext,
    /// JSONとして構造的に比較
    Json,
}

impl fmt::Display for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plaintext => write!(f, "plaintext"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// 空白のみの文字列も空とみなす
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_type_serialization() {
        assert_eq!(
            serde_json::to_string(&PayloadType::Plaintext).unwrap(),
            "\"plaintext\""
        );
        assert_eq!(serde_json::to_string(&PayloadType::Json).unwrap(), "\"json\"");
        let parsed: PayloadType = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(parsed, PayloadType::Json);
    }

    #[test]
    fn test_payload_type_default_is_plaintext() {
        assert_eq!(PayloadType::default(), PayloadType::Plaintext);
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank("   \t"));
        assert!(!is_blank(" a "));
    }
}
