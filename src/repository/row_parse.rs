// ==========================================
// 行字段解析辅助
// ==========================================
// 日期: "%Y-%m-%d"；时间戳: "%Y-%m-%d %H:%M:%S"（UTC）
// 解析失败统一转为 FromSqlConversionFailure，由 RepositoryError 归类为字段错误
// ==========================================

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::types::Type;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn conversion_error(col: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(col, Type::Text, message.into())
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn parse_date(col: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| conversion_error(col, format!("日期格式错误 '{}': {}", raw, e)))
}

pub(crate) fn parse_opt_date(col: usize, raw: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| parse_date(col, &s))
        .transpose()
}

pub(crate) fn parse_timestamp(col: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
        .map(|dt| dt.and_utc())
        .map_err(|e| conversion_error(col, format!("时间格式错误 '{}': {}", raw, e)))
}

/// 通用枚举字段解析
pub(crate) fn parse_enum<T>(
    col: usize,
    raw: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    parse(raw).ok_or_else(|| conversion_error(col, format!("无法识别的取值 '{}'", raw)))
}
