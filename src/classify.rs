//! Классификация текста ячеек: настоящее наименование, формула/продолжение или служебный шум.

use regex::Regex;
use std::sync::LazyLock;

/// Маркеры шапок и подвалов, при которых строка отбрасывается при любой длине.
const STRONG_MARKERS: &[&str] = &["ič:", "dič:", "tel:", "fax:", "strana:"];

/// Слова, которые могут встретиться и в длинном описании работ.
const WEAK_MARKERS: &[&str] = &[
    "tel.",
    "fax.",
    "e-mail",
    "email",
    "ičo:",
    "dič ",
    "psč",
    "zadavatel",
    "zhotovitel",
    "objednatel",
    "vypracoval",
    "vyřizuje",
    "datum",
    "číslo nabídky",
    "strana ",
    "projektant",
];

/// Длина, начиная с которой слабые маркеры считаются частью описания.
const WEAK_MARKER_MAX_LEN: usize = 50;

static PAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"strana\s+\d").expect("valid page regex"));
static MULTIPLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[^\w]*\*[^\w]*\d").expect("valid multiply regex"));
static DIVIDE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[^\w\s]*/[^\w\s]*\d").expect("valid divide regex"));
static WORD_SLASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{L}\s*/\s*\p{L}").expect("valid word slash regex"));
static PURE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d\s,.\-]+$").expect("valid pure number regex"));
static SUBSHEET_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[A-Z]{2,}\s*[\dA-Z.]+\s*$").expect("valid subsheet code regex")
});

/// Проверяет, что текст может быть наименованием строки сметы, а не служебной надписью.
pub fn is_valid_name(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    if matches!(lower.as_str(), "nan" | "null" | "none" | "0" | "0.0") {
        return false;
    }
    if STRONG_MARKERS.iter().any(|kw| lower.contains(kw)) || PAGE_RE.is_match(&lower) {
        return false;
    }
    let short = text.chars().count() < WEAK_MARKER_MAX_LEN;
    !(short && WEAK_MARKERS.iter().any(|kw| lower.contains(kw)))
}

/// Отсекает формулы (`7,50*1,50`), голые числа (`11,25000`) и строки-продолжения (`… :`).
pub fn looks_like_formula_or_continuation(name: &str) -> bool {
    let s = name.trim();
    let len = s.chars().count();
    if len < 2 {
        return true;
    }
    let lower = s.to_lowercase();
    let compact: String = s.chars().filter(|ch| *ch != ' ').collect();

    if s.contains('*') && MULTIPLY_RE.is_match(&compact) {
        return true;
    }
    // «podloží / pláně» остаётся наименованием, «7,50/2» нет.
    if s.contains('/') && DIVIDE_RE.is_match(&compact) && !WORD_SLASH_RE.is_match(s) {
        return true;
    }
    if PURE_NUMBER_RE.is_match(s) && len > 2 && !lower.contains("so") {
        return true;
    }
    if name.ends_with(" : ") || (s.ends_with(" :") && len < 80) {
        return true;
    }
    if lower.contains("začátek provozního součtu") || lower.contains("konec provozního součtu") {
        return true;
    }
    lower.contains("součet:") && len < 50
}

/// Наименование настоящей строки сметы: проходит оба фильтра.
#[inline]
pub fn is_item_name(text: &str) -> bool {
    is_valid_name(text) && !looks_like_formula_or_continuation(text)
}

/// Код вида `IO 710`, `SO 000`, `IO 720a`, ссылающийся на отдельный лист объекта.
pub fn is_subsheet_code(code: &str) -> bool {
    let code = code.trim();
    code.chars().count() >= 3 && SUBSHEET_CODE_RE.is_match(code)
}
