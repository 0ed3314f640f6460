//! Per-column display formatting: dates, currency and raw values.
//!
//! Which columns get which treatment is decided by an explicit
//! `column -> ColumnFormat` map supplied per endpoint. The legacy rule that
//! inferred the format from the column name (`fecha` / `precio`) is still
//! available behind `ColumnFormats::infer`, but only applies to columns that
//! have no explicit entry.

use crate::utils::error::{Result, ViewerError};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnFormat {
    #[default]
    None,
    Date,
    Currency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    EsEs,
    EnUs,
}

struct LocaleStyle {
    decimal: char,
    group: char,
    /// Grouping separators only appear once the integer part has at least
    /// `3 + min_grouping_digits` digits (es-ES writes 1234 but 12.345).
    min_grouping_digits: usize,
    currency_symbol: &'static str,
    day_first: bool,
}

impl Locale {
    pub fn tag(&self) -> &'static str {
        match self {
            Locale::EsEs => "es-ES",
            Locale::EnUs => "en-US",
        }
    }

    fn style(&self) -> LocaleStyle {
        match self {
            Locale::EsEs => LocaleStyle {
                decimal: ',',
                group: '.',
                min_grouping_digits: 2,
                currency_symbol: "$",
                day_first: true,
            },
            Locale::EnUs => LocaleStyle {
                decimal: '.',
                group: ',',
                min_grouping_digits: 1,
                currency_symbol: "$",
                day_first: false,
            },
        }
    }

    pub fn format_date(&self, date: NaiveDate) -> String {
        if self.style().day_first {
            format!("{}/{}/{}", date.day(), date.month(), date.year())
        } else {
            format!("{}/{}/{}", date.month(), date.day(), date.year())
        }
    }

    /// Currency with exactly two fraction digits.
    pub fn format_currency(&self, amount: f64) -> String {
        let style = self.style();
        let fixed = format!("{:.2}", amount.abs());
        let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

        let grouped = if int_part.len() >= 3 + style.min_grouping_digits {
            group_digits(int_part, style.group)
        } else {
            int_part.to_string()
        };

        let negative = amount < 0.0 && fixed != "0.00";
        format!(
            "{}{}{}{}{}",
            style.currency_symbol,
            if negative { "-" } else { "" },
            grouped,
            style.decimal,
            frac_part
        )
    }
}

impl FromStr for Locale {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "es-es" | "es" => Ok(Locale::EsEs),
            "en-us" | "en" => Ok(Locale::EnUs),
            _ => Err(ViewerError::InvalidConfigValueError {
                field: "viewer.locale".to_string(),
                value: s.to_string(),
                reason: "Supported locales: es-ES, en-US".to_string(),
            }),
        }
    }
}

fn group_digits(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnFormats {
    explicit: HashMap<String, ColumnFormat>,
    infer: bool,
}

impl ColumnFormats {
    pub fn new(explicit: HashMap<String, ColumnFormat>, infer: bool) -> Self {
        Self { explicit, infer }
    }

    pub fn format_for(&self, column: &str) -> ColumnFormat {
        if let Some(format) = self.explicit.get(column) {
            return *format;
        }
        if self.infer {
            let lower = column.to_lowercase();
            if lower.contains("fecha") {
                return ColumnFormat::Date;
            }
            if lower.contains("precio") {
                return ColumnFormat::Currency;
            }
        }
        ColumnFormat::None
    }
}

/// Raw cell text. Missing and `null` become an empty string; other falsy
/// values (`0`, `false`) are shown as-is.
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn format_cell(value: Option<&Value>, format: ColumnFormat, locale: Locale) -> String {
    match format {
        ColumnFormat::None => display_value(value),
        ColumnFormat::Date => match value.and_then(parse_date) {
            Some(date) => locale.format_date(date),
            None => display_value(value),
        },
        ColumnFormat::Currency => match value.and_then(parse_decimal) {
            Some(amount) => locale.format_currency(amount),
            None => display_value(value),
        },
    }
}

pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date_str(s.trim()),
        // epoch milliseconds
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.date_naive()),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    for pattern in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, pattern) {
            return Some(dt.date());
        }
    }
    // Flask serializes dates as HTTP-dates: "Mon, 15 Jan 2024 00:00:00 GMT"
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.date_naive());
    }
    None
}

fn decimal_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?")
            .expect("decimal prefix pattern is valid")
    })
}

/// Numbers are taken as-is; strings by their leading decimal prefix, so
/// `"19.99 USD"` parses as `19.99`.
pub fn parse_decimal(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => decimal_prefix()
            .find(s.trim_start())
            .and_then(|m| m.as_str().parse::<f64>().ok()),
        _ => None,
    }?;
    amount.is_finite().then_some(amount)
}
