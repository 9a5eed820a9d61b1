//! JSONペイロード比較
//!
//! 期待値と実際の値を構造的に比較し、差分ごとにJSONパスを報告する。

use serde_json::Value;

/// JSON比較の結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonComparison {
    /// 人間向けの比較ログ
    pub report: String,
    /// 差分（空なら一致）
    pub diffs: Vec<String>,
}

impl JsonComparison {
    /// 差分がないか
    pub fn is_match(&self) -> bool {
        self.diffs.is_empty()
    }
}

/// JSONペイロードの比較器
pub trait JsonComparator: Send + Sync {
    /// `expected` と `actual` を比較する
    fn compare(&self, expected: &[u8], actual: &[u8]) -> JsonComparison;
}

/// 厳密な構造比較
///
/// オブジェクトはキー集合が一致し、配列は長さと順序が一致し、
/// スカラー値は等しいことを要求する。
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralJsonComparator;

impl JsonComparator for StructuralJsonComparator {
    fn compare(&self, expected: &[u8], actual: &[u8]) -> JsonComparison {
        let expected: Value = match serde_json::from_slice(expected) {
            Ok(value) => value,
            Err(err) => return parse_failure("expected", err),
        };
        let actual: Value = match serde_json::from_slice(actual) {
            Ok(value) => value,
            Err(err) => return parse_failure("actual", err),
        };

        let mut diffs = Vec::new();
        compare_values("$", &expected, &actual, &mut diffs);

        let report = if diffs.is_empty() {
            "$: documents are equal".to_string()
        } else {
            diffs.join("\n")
        };
        JsonComparison { report, diffs }
    }
}

fn parse_failure(side: &str, err: serde_json::Error) -> JsonComparison {
    let diff = format!("$: {} payload is not valid JSON - {}", side, err);
    JsonComparison {
        report: diff.clone(),
        diffs: vec![diff],
    }
}

fn compare_values(path: &str, expected: &Value, actual: &Value, diffs: &mut Vec<String>) {
    match (expected, actual) {
        (Value::Object(expected), Value::Object(actual)) => {
            for (key, expected_value) in expected {
                let child = format!("{}.{}", path, key);
                match actual.get(key) {
                    Some(actual_value) => compare_values(&child, expected_value, actual_value, diffs),
                    None => diffs.push(format!("{}: missing field", child)),
                }
            }
            for key in actual.keys().filter(|key| !expected.contains_key(*key)) {
                diffs.push(format!("{}.{}: unexpected field", path, key));
            }
        }
        (Value::Array(expected), Value::Array(actual)) => {
            if expected.len() != actual.len() {
                diffs.push(format!(
                    "{}: array size mismatch - expected [{}] but received [{}]",
                    path,
                    expected.len(),
                    actual.len()
                ));
                return;
            }
            for (index, (expected_item, actual_item)) in expected.iter().zip(actual).enumerate() {
                compare_values(&format!("{}[{}]", path, index), expected_item, actual_item, diffs);
            }
        }
        (expected, actual) if expected == actual => {}
        (expected, actual) => diffs.push(format!(
            "{}: value mismatch - expected [{}] but received [{}]",
            path, expected, actual
        )),
    }
}
