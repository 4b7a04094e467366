// ==========================================
// 商品目录后台 - 仓储公共工具
// ==========================================
// 职责: 时间戳/JSON 列的读写转换
// ==========================================

use chrono::{DateTime, Utc};
use rusqlite::types::Type;

/// 时间戳写入格式（RFC3339，字典序与时间序一致）
pub fn ts_to_db(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

/// 解析时间戳列
///
/// # 参数
/// - `idx`: 列序号（仅用于错误定位）
/// - `raw`: 数据库中的文本
pub fn ts_from_db(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// 解析可空时间戳列
pub fn opt_ts_from_db(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    raw.map(|s| ts_from_db(idx, &s)).transpose()
}

/// 解析可空 JSON 列
pub fn opt_json_from_db<T: serde::de::DeserializeOwned>(
    idx: usize,
    raw: Option<String>,
) -> rusqlite::Result<Option<T>> {
    raw.map(|s| {
        serde_json::from_str(&s)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ts_roundtrip() {
        let now = Utc::now();
        let parsed = ts_from_db(0, &ts_to_db(&now)).unwrap();
        assert_eq!(parsed, now);
    }

    #[test]
    fn test_ts_invalid_text() {
        assert!(ts_from_db(3, "not a date").is_err());
    }
}
