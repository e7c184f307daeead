//! Нормализация чисел в чешском и международном формате и вспомогательные функции для кодов.

use crate::raw::Cell;
use crate::types::Money;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;

/// Значения по модулю от этой границы считаются мусором (склеенные ячейки, переполнение).
const MAGNITUDE_LIMIT: f64 = 1e12;

static PLAIN_FLOAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("valid float regex")
});
static NUMERIC_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("valid numeric code regex"));
static TRAILING_ZERO_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.0+$").expect("valid trailing zero regex"));

/// Нормализует последовательность символов, схлопывая группы пробельных.
pub fn normalize_chars<I: IntoIterator<Item = char>>(iter: I) -> String {
    let mut output = String::new();
    let mut prev_space = false;
    for ch in iter {
        let is_space = ch.is_whitespace();
        if is_space {
            if !prev_space {
                output.push(' ');
            }
        } else {
            output.push(ch);
        }
        prev_space = is_space;
    }
    output.trim().to_string()
}

/// Переводит `f64` в `Money`, обнуляя нечисла и значения за пределами границы.
pub fn money_from_f64(value: f64) -> Money {
    if !value.is_finite() || value.abs() >= MAGNITUDE_LIMIT {
        return Decimal::ZERO;
    }
    // Через строку, чтобы 0.1 не превратилось в 0.1000000000000000055…
    Decimal::from_str(&format!("{value}"))
        .or_else(|_| Decimal::try_from(value))
        .unwrap_or_default()
}

/// Разбирает цену из произвольного текста; всё нераспознанное даёт ноль.
///
/// Поддерживаются `45 172 993,25`, `45.172.993,25`, `1250,5 Kč`, `1e3`.
pub fn parse_price(value: &str) -> Money {
    let compact: String = value.chars().filter(|ch| !ch.is_whitespace()).collect();
    if compact.is_empty() || !compact.chars().any(|ch| ch.is_ascii_digit()) {
        return Decimal::ZERO;
    }
    if PLAIN_FLOAT_RE.is_match(&compact) {
        return compact.parse::<f64>().map_or(Decimal::ZERO, money_from_f64);
    }

    let has_comma = compact.contains(',');
    let has_dot = compact.contains('.');
    let localized = if has_comma && has_dot {
        compact.replace('.', "").replace(',', ".")
    } else if has_comma {
        compact.replace(',', ".")
    } else {
        compact
    };
    let digits: String = localized
        .chars()
        .filter(|ch| ch.is_ascii_digit() || matches!(*ch, '.' | '-'))
        .collect();
    if digits.is_empty() {
        return Decimal::ZERO;
    }
    match Decimal::from_str(&digits) {
        Ok(parsed) if parsed.abs() < Decimal::from(1_000_000_000_000_i64) => parsed,
        _ => Decimal::ZERO,
    }
}

/// Цена из ячейки любого типа.
pub fn cell_price(cell: &Cell) -> Money {
    match cell {
        Cell::Empty => Decimal::ZERO,
        Cell::Number(value) => money_from_f64(*value),
        Cell::Text(text) => parse_price(text),
    }
}

/// Код из одних цифр с необязательной дробной частью (`1`, `711`, `1.1`).
#[inline]
pub fn is_numeric_code(code: &str) -> bool {
    NUMERIC_CODE_RE.is_match(code.trim())
}

/// Нормализует код раздела: `1.0` → `1`, `2.50` → `2.5`.
pub fn normalize_code(code: &str) -> String {
    let code = code.trim();
    if TRAILING_ZERO_CODE_RE.is_match(code) {
        return code.split('.').next().unwrap_or(code).to_string();
    }
    if code.contains('.') && is_numeric_code(code) {
        return code.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    code.to_string()
}

/// Совпадение кодов с учётом нормализации дробной части.
#[inline]
pub fn codes_match(left: &str, right: &str) -> bool {
    let (left, right) = (left.trim(), right.trim());
    left == right || normalize_code(left) == normalize_code(right)
}

/// Обрезает строку до `max` символов.
pub fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// Значения-заглушки, которые выгрузки вставляют вместо пустой ячейки.
#[inline]
pub fn is_null_marker(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "" | "nan" | "none" | "null"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_czech_thousands_with_spaces() {
        assert_eq!(parse_price("45 172 993,25"), dec!(45172993.25));
        assert_eq!(parse_price("45\u{a0}172\u{a0}993,25"), dec!(45172993.25));
    }

    #[test]
    fn parses_dot_thousands_comma_decimal() {
        assert_eq!(parse_price("45.172.993,25"), dec!(45172993.25));
    }

    #[test]
    fn strips_currency_and_text() {
        assert_eq!(parse_price("1 250,50 Kč"), dec!(1250.50));
        assert_eq!(parse_price("CZK 300"), dec!(300));
        assert_eq!(parse_price("-12,5"), dec!(-12.5));
    }

    #[test]
    fn overflow_and_garbage_collapse_to_zero() {
        assert_eq!(parse_price("1e13"), Decimal::ZERO);
        assert_eq!(parse_price("2000000000000"), Decimal::ZERO);
        assert_eq!(parse_price(""), Decimal::ZERO);
        assert_eq!(parse_price("   "), Decimal::ZERO);
        assert_eq!(parse_price("cena dohodou"), Decimal::ZERO);
        assert_eq!(parse_price("1,234,567"), Decimal::ZERO);
    }

    #[test]
    fn plain_floats_pass_through() {
        assert_eq!(parse_price("1234.5"), dec!(1234.5));
        assert_eq!(parse_price("1e3"), dec!(1000));
    }

    #[test]
    fn numeric_cells_respect_magnitude_guard() {
        assert_eq!(cell_price(&Cell::Number(0.1)), dec!(0.1));
        assert_eq!(cell_price(&Cell::Number(1e13)), Decimal::ZERO);
        assert_eq!(cell_price(&Cell::Number(f64::NAN)), Decimal::ZERO);
        assert_eq!(cell_price(&Cell::Empty), Decimal::ZERO);
    }

    #[test]
    fn normalizes_trailing_zero_codes() {
        assert_eq!(normalize_code("1.0"), "1");
        assert_eq!(normalize_code("2.50"), "2.5");
        assert_eq!(normalize_code("711"), "711");
        assert_eq!(normalize_code("SO 01"), "SO 01");
        assert!(codes_match("1.0", "1"));
        assert!(!codes_match("1.1", "1"));
    }
}
