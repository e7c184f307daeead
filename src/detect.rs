//! Детекторы вариантов входной таблицы. Все функции чистые и только читают книгу.

use crate::header::{contains_any, find_row_with_all};
use crate::raw::{Sheet, Workbook};

/// Маркер сводной таблицы объектов на листе «Stavba».
pub const STAVBA_MARKER: &str = "rekapitulace dílčích částí";
/// Маркер блока рекапитуляции в Soupis prací.
pub const SOUPIS_RECAP_MARKER: &str = "rekapitulace členění soupisu prací";
/// Сколько строк просматривает полнотекстовая проверка блоков Soupis.
pub const SOUPIS_TEXT_SCAN_ROWS: usize = 200;
/// Сколько строк просматривает структурная проверка шапки D/K.
pub const SOUPIS_HEADER_SCAN_ROWS: usize = 50;

const MIN_SOUPIS_ROWS: usize = 10;
const REKAP_SCAN_ROWS: usize = 20;

pub(crate) const POSITION_KEYWORDS: &[&str] = &["pozice", "pořadí", "poz."];
pub(crate) const DESCRIPTION_KEYWORDS: &[&str] = &["popis", "název", "nazev", "položka", "polozka"];
pub(crate) const SOUPIS_HEADER: &[&str] = &["pč", "typ", "kód"];

/// Как был найден главный лист варианта 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StavbaSheet {
    /// Лист буквально называется «Stavba».
    Named(usize),
    /// Лист содержит маркер «Rekapitulace dílčích částí».
    Marker(usize),
}

impl StavbaSheet {
    /// Индекс листа в книге.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::Named(idx) | Self::Marker(idx) => idx,
        }
    }
}

/// Лист «Stavba» или, если его нет, лист с маркером сводки объектов.
pub fn find_stavba_sheet(workbook: &Workbook) -> Option<StavbaSheet> {
    workbook
        .position(|name| name.trim().to_lowercase() == "stavba")
        .map(StavbaSheet::Named)
        .or_else(|| {
            workbook
                .sheets
                .iter()
                .position(|sheet| sheet.flattened_text(usize::MAX).contains(STAVBA_MARKER))
                .map(StavbaSheet::Marker)
        })
}

/// Лист с инструкциями к заполнению, его пропускают все проверки Soupis.
#[inline]
pub fn is_instruction_sheet(sheet: &Sheet) -> bool {
    sheet.name.to_lowercase().contains("pokyny")
}

/// Лист «Krycí list» с метаданными проекта.
#[inline]
pub fn is_cover_sheet(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("krycí") || lower.contains("kryci")
}

/// В первых строках есть шапка Pozice / Popis / Cena.
pub fn is_rekapitulace_table(sheet: &Sheet) -> bool {
    (0..sheet.len().min(REKAP_SCAN_ROWS)).any(|idx| {
        let cells: Vec<String> = sheet
            .row(idx)
            .iter()
            .map(|c| c.text().to_lowercase())
            .collect();
        let has = |keywords: &[&str]| cells.iter().any(|v| contains_any(v, keywords));
        has(POSITION_KEYWORDS)
            && has(DESCRIPTION_KEYWORDS)
            && cells.iter().any(|v| is_price_header(v))
    })
}

/// Вариант 2: таблица Pozice/Popis/Cena на любом листе или лист «Rekapitulace» / «Krycí list».
pub fn is_rekapitulace_workbook(workbook: &Workbook) -> bool {
    workbook
        .position(|name| name.to_lowercase().contains("rekapitulace") || is_cover_sheet(name))
        .is_some()
        || workbook.sheets.iter().any(is_rekapitulace_table)
}

/// Заголовок ценового столбца Rekapitulace: «cena…» или ровно «celkem», без DPH.
#[inline]
pub(crate) fn is_price_header(value: &str) -> bool {
    (value.contains("cena") || value == "celkem") && !value.contains("dph")
}

/// На листе есть оба блока: рекапитуляция членения и сам Soupis prací.
pub fn has_soupis_markers(sheet: &Sheet, rows: usize) -> bool {
    if sheet.len() < MIN_SOUPIS_ROWS {
        return false;
    }
    let text = sheet.flattened_text(rows);
    text.contains(SOUPIS_RECAP_MARKER) && is_soupis_text(&text)
}

/// Текст содержит «soupis prací» (с диакритикой или без).
#[inline]
pub(crate) fn is_soupis_text(text: &str) -> bool {
    text.contains("soupis prací") || text.contains("soupis praci")
}

/// Структурная проверка: шапка PČ / Typ / Kód, под ней строки типа D и K в одном блоке.
pub fn has_soupis_structure(sheet: &Sheet) -> bool {
    let Some(header) = find_row_with_all(sheet, 0..SOUPIS_HEADER_SCAN_ROWS, SOUPIS_HEADER) else {
        return false;
    };
    let Some(typ_col) = sheet
        .row(header)
        .iter()
        .position(|cell| cell.text().to_lowercase() == "typ")
    else {
        return false;
    };

    let mut has_division = false;
    let mut has_item = false;
    for idx in header + 1..sheet.len() {
        if SOUPIS_HEADER.iter().all(|kw| sheet.row_text(idx).contains(kw)) {
            break;
        }
        match sheet.text(idx, typ_col).to_uppercase().as_str() {
            "D" => has_division = true,
            "K" => has_item = true,
            _ => {}
        }
        if has_division && has_item {
            return true;
        }
    }
    false
}

/// Лист «Rekapitulace stavby» из многолистовых выгрузок KROS.
pub fn find_construction_recap(workbook: &Workbook) -> Option<usize> {
    workbook.position(|name| name.to_lowercase().contains("rekapitulace stavby"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::Cell;

    fn sheet(name: &str, rows: Vec<Vec<&str>>) -> Sheet {
        Sheet::new(
            name,
            rows.into_iter()
                .map(|row| row.into_iter().map(Cell::from).collect())
                .collect(),
        )
    }

    #[test]
    fn stavba_by_name_wins_over_marker() {
        let book = Workbook::new(vec![
            sheet("Objekty", vec![vec!["Rekapitulace dílčích částí"]]),
            sheet("STAVBA", vec![]),
        ]);
        assert_eq!(find_stavba_sheet(&book), Some(StavbaSheet::Named(1)));
    }

    #[test]
    fn stavba_by_marker() {
        let book = Workbook::new(vec![
            sheet("List1", vec![]),
            sheet("Souhrn", vec![vec!["", "Rekapitulace dílčích částí"]]),
        ]);
        assert_eq!(find_stavba_sheet(&book), Some(StavbaSheet::Marker(1)));
        assert_eq!(find_stavba_sheet(&Workbook::new(vec![sheet("a", vec![])])), None);
    }

    #[test]
    fn rekapitulace_header() {
        let table = sheet("List1", vec![vec!["Pozice", "Popis", "Cena"]]);
        assert!(is_rekapitulace_table(&table));
        let vat_only = sheet("List1", vec![vec!["Pozice", "Popis", "DPH cena"]]);
        assert!(!is_rekapitulace_table(&vat_only));
    }

    #[test]
    fn rekapitulace_by_sheet_name() {
        let book = Workbook::new(vec![sheet("Krycí list", vec![])]);
        assert!(is_rekapitulace_workbook(&book));
    }

    fn soupis_rows() -> Vec<Vec<&'static str>> {
        vec![
            vec!["REKAPITULACE ČLENĚNÍ SOUPISU PRACÍ"],
            vec![],
            vec![],
            vec![],
            vec!["SOUPIS PRACÍ"],
            vec!["PČ", "Typ", "Kód", "Popis", "MJ", "Množství", "J.cena [CZK]", "Cena celkem [CZK]"],
            vec!["", "D", "HSV", "Práce a dodávky HSV"],
            vec!["", "D", "1", "Zemní práce"],
            vec!["1", "K", "131201101", "Hloubení jam", "m3", "10", "250", "2500"],
            vec![],
        ]
    }

    #[test]
    fn soupis_markers_and_structure() {
        let table = sheet("SO 01", soupis_rows());
        assert!(has_soupis_markers(&table, SOUPIS_TEXT_SCAN_ROWS));
        assert!(has_soupis_structure(&table));
    }

    #[test]
    fn structure_needs_item_rows() {
        let mut rows = soupis_rows();
        rows.remove(8);
        assert!(!has_soupis_structure(&sheet("SO 01", rows)));
    }

    #[test]
    fn short_sheets_never_match_markers() {
        let table = sheet(
            "x",
            vec![vec!["REKAPITULACE ČLENĚNÍ SOUPISU PRACÍ"], vec!["SOUPIS PRACÍ"]],
        );
        assert!(!has_soupis_markers(&table, SOUPIS_TEXT_SCAN_ROWS));
    }
}
