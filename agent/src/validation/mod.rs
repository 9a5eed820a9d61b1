//! 検証エンジン
//!
//! 期待値と実際のHTTPデータ（パス、メソッド、ヘッダー、クエリパラメーター、
//! ステータスコード、ペイロード）を比較する純粋関数群。
//! 各関数は独立しており、呼び出し側が `ValidationErrors::collect` で集約する。

pub mod json;

use http::HeaderMap;
use std::collections::HashMap;
use test_agent_common::error::{Facet, Mismatch};
use test_agent_common::types::{is_blank, Headers, PayloadType, QueryParams};
use tracing::{debug, info};

pub use json::{JsonComparator, JsonComparison, StructuralJsonComparator};

/// 検証結果
pub type Check = Result<(), Mismatch>;

/// パスを正規化して比較する
pub fn validate_path(expected: &str, actual: &str) -> Check {
    let expected = clean_path(expected);
    let actual = clean_path(actual);

    if expected != actual {
        return Err(Mismatch::new(
            Facet::Path,
            format!(
                "validation error - path mismatch - expected [{}] but received [{}]",
                expected, actual
            ),
        ));
    }
    debug!("path validation successful");
    Ok(())
}

/// メソッドを大文字小文字を区別して比較する
pub fn validate_method(expected: &str, actual: &str) -> Check {
    if expected != actual {
        return Err(Mismatch::new(
            Facet::Method,
            format!(
                "validation error - method mismatch - expected [{}] but received [{}]",
                expected, actual
            ),
        ));
    }
    debug!("method validation successful");
    Ok(())
}

/// ヘッダーを検証する
///
/// ヘッダー名は大文字小文字を区別しない。期待する各ヘッダーについて、
/// 実際の値のいずれかが期待値と一致すればよい。余分なヘッダーは無視する。
pub fn validate_headers(expected: &Headers, actual: &HeaderMap) -> Check {
    for (name, expected_value) in sorted(expected) {
        let lower = name.to_ascii_lowercase();
        let received: Vec<&str> = actual
            .iter()
            .filter(|(actual_name, _)| actual_name.as_str() == lower)
            .filter_map(|(_, value)| value.to_str().ok())
            .collect();

        if received.is_empty() {
            return Err(Mismatch::new(
                Facet::Header,
                format!("validation error - header <{}> missing", lower),
            ));
        }
        if !received.contains(&expected_value.as_str()) {
            return Err(Mismatch::new(
                Facet::Header,
                format!(
                    "validation error - header <{}> mismatch - expected [{}] but received [{}]",
                    lower,
                    expected_value,
                    received.join(", ")
                ),
            ));
        }
    }
    debug!("header validation successful");
    Ok(())
}

/// クエリパラメーターを検証する
///
/// 期待する各キーが存在し、期待する値がすべて実際の値に含まれていればよい。
/// 余分なキーや値は無視する。
pub fn validate_query_params(expected: &QueryParams, actual_query: Option<&str>) -> Check {
    let received = parse_query(actual_query.unwrap_or_default());

    for (key, expected_values) in sorted(expected) {
        let Some(received_values) = received.get(key.as_str()) else {
            return Err(Mismatch::new(
                Facet::QueryParam,
                format!("validation error - query param <{}> missing", key),
            ));
        };
        if expected_values
            .iter()
            .any(|value| !received_values.contains(value))
        {
            return Err(Mismatch::new(
                Facet::QueryParam,
                format!(
                    "validation error - query param <{}> values mismatch - expected [{}] but received [{}]",
                    key,
                    expected_values.join(", "),
                    received_values.join(", ")
                ),
            ));
        }
    }
    debug!("query params validation successful");
    Ok(())
}

/// ステータスコードを比較する
pub fn validate_status_code(expected: u16, actual: u16) -> Check {
    if expected != actual {
        return Err(Mismatch::new(
            Facet::StatusCode,
            format!(
                "validation error - status mismatch - expected [{}] but received [{}]",
                expected, actual
            ),
        ));
    }
    debug!("status validation successful");
    Ok(())
}

/// ペイロードを検証する
///
/// 期待値が空の場合は検証しない。
pub fn validate_payload(
    expected: &str,
    actual: &[u8],
    payload_type: PayloadType,
    comparator: &dyn JsonComparator,
) -> Check {
    if is_blank(expected) {
        info!("message payload is empty - no body validation will be done");
        return Ok(());
    }
    if actual.is_empty() {
        return Err(Mismatch::new(
            Facet::Payload,
            format!(
                "validation error - payload missing - expected [{}] but received no payload",
                expected
            ),
        ));
    }

    match payload_type {
        PayloadType::Plaintext => {
            let received = String::from_utf8_lossy(actual);
            if expected != received {
                return Err(Mismatch::new(
                    Facet::Payload,
                    format!(
                        "validation error - payload mismatch - expected [{}] but received [{}]",
                        expected, received
                    ),
                ));
            }
        }
        PayloadType::Json => {
            let comparison = comparator.compare(expected.as_bytes(), actual);
            if !comparison.is_match() {
                info!("json validation log: {}", comparison.report);
                return Err(Mismatch::new(
                    Facet::Payload,
                    format!("json validation errors: [{}]", comparison.diffs.join(", ")),
                ));
            }
            debug!("json payload validation log: {}", comparison.report);
        }
    }
    debug!("payload validation successful");
    Ok(())
}

/// パスを字句的に正規化し、先頭の `/` を取り除く
///
/// 連続する `/`、`.` 要素、`..` 要素を解決する。空のパスは `.` になる。
pub fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), Some(last) if *last != "..") {
                    segments.pop();
                } else if !rooted {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if joined.is_empty() {
        if rooted {
            String::new()
        } else {
            ".".to_string()
        }
    } else {
        joined
    }
}

fn parse_query(query: &str) -> HashMap<String, Vec<String>> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap_or_default();
    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    for (key, value) in pairs {
        grouped.entry(key).or_default().push(value);
    }
    grouped
}

fn sorted<V>(map: &HashMap<String, V>) -> Vec<(&String, &V)> {
    let mut entries: Vec<(&String, &V)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}
