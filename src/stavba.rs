//! Вариант 1: книга с листом «Stavba» (сводка объектов) и отдельными листами объектов.

use crate::child_sheet::parse_child_sheet;
use crate::classify::{is_subsheet_code, is_valid_name};
use crate::detect::{STAVBA_MARKER, find_stavba_sheet, is_cover_sheet};
use crate::error::ExtractError;
use crate::meta::project_name;
use crate::raw::{Sheet, Workbook};
use crate::types::{BudgetKind, ChildBudget, LineItem, RawExtraction};
use crate::utils::cell_price;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Сколько строк ниже маркера ищется шапка «Číslo / Název».
const HEADER_LOOKAHEAD: usize = 5;

/// Коды объектов из сводки, по которым ищутся листы объектов.
#[derive(Debug, Default)]
pub(crate) struct SubsheetIndex {
    names: HashMap<String, String>,
    codes: Vec<String>,
}

impl SubsheetIndex {
    pub(crate) fn insert(&mut self, code: &str, name: &str) {
        self.names.insert(code.to_string(), name.to_string());
        if !self.codes.iter().any(|c| c == code) {
            self.codes.push(code.to_string());
        }
    }

    /// Код, который входит в имя листа (`SO 01` или `SO01`); длинные коды проверяются первыми.
    /// Последним шансом служит хвост кода (`710` из `IO 710`), если он не короче трёх символов.
    pub(crate) fn match_sheet(&self, sheet_name: &str) -> Option<(&str, &str)> {
        let mut codes: Vec<&String> = self.codes.iter().collect();
        codes.sort_by_key(|c| std::cmp::Reverse(c.chars().count()));
        let found = codes
            .iter()
            .copied()
            .find(|code| {
                sheet_name.contains(code.as_str()) || sheet_name.contains(&code.replace(' ', ""))
            })
            .or_else(|| {
                codes.iter().copied().find(|code| {
                    code.split_whitespace().last().is_some_and(|tail| {
                        tail.chars().count() >= 3 && tail != code.as_str() && sheet_name.contains(tail)
                    })
                })
            });
        found.and_then(|code| {
            self.names
                .get(code.as_str())
                .map(|name| (code.as_str(), name.as_str()))
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct SummaryColumns {
    number: Option<usize>,
    name: usize,
    price: usize,
}

/// Извлекает вариант 1. Всегда возвращает результат (возможно пустой): это запасной путь.
pub(crate) fn extract_stavba(workbook: &Workbook) -> RawExtraction {
    let mut result = RawExtraction::new(BudgetKind::Type1);
    let main = find_stavba_sheet(workbook).map(|found| found.index());
    let mut index = SubsheetIndex::default();

    if let Some(main_sheet) = main.map(|idx| &workbook.sheets[idx]) {
        result.project_name = project_name(main_sheet);
        result.parent_items = parse_summary(main_sheet, &mut index);
        if result.parent_items.is_empty() {
            warn!(sheet = %main_sheet.name, "no '{STAVBA_MARKER}' section with items found");
        }
    }

    for (idx, sheet) in workbook.sheets.iter().enumerate() {
        if Some(idx) == main || is_cover_sheet(&sheet.name) {
            continue;
        }
        let Some((code, parent_name)) = index.match_sheet(&sheet.name) else {
            continue;
        };
        match parse_child_sheet(sheet, true) {
            Some(items) if !items.is_empty() => {
                debug!(sheet = %sheet.name, code, items = items.len(), "object sheet matched");
                result.child_budgets.push(ChildBudget {
                    name: parent_name.to_string(),
                    number_code: code.to_string(),
                    items,
                });
            }
            _ => debug!(sheet = %sheet.name, code, "object sheet without items"),
        }
    }
    result
}

/// Разбирает все блоки «Rekapitulace dílčích částí» главного листа.
fn parse_summary(sheet: &Sheet, index: &mut SubsheetIndex) -> Vec<LineItem> {
    let mut items = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for marker_row in 0..sheet.len() {
        if !sheet.row_text(marker_row).contains(STAVBA_MARKER) {
            continue;
        }
        let (header_row, columns) = match summary_header(sheet, marker_row) {
            Ok(Some(found)) => found,
            Ok(None) => {
                debug!(sheet = %sheet.name, marker_row, "summary marker without header");
                continue;
            }
            Err(err) => {
                warn!(sheet = %sheet.name, marker_row, "summary block skipped: {err}");
                continue;
            }
        };

        for idx in header_row + 1..sheet.len() {
            let text = sheet.row_text(idx);
            if text.trim().is_empty() {
                continue;
            }
            if text.contains("rekapitulace") || text.contains("celkem za stavbu") {
                break;
            }
            let name = sheet.text(idx, columns.name);
            if !is_valid_name(&name) {
                continue;
            }
            let code = columns
                .number
                .map(|col| sheet.text(idx, col))
                .unwrap_or_default();
            if !seen.insert((code.clone(), name.clone())) {
                continue;
            }

            let price_cell = sheet.cell(idx, columns.price);
            let price = if price_cell.is_blank() {
                sheet
                    .row(idx)
                    .iter()
                    .rev()
                    .find(|cell| !cell.is_blank())
                    .map_or(Decimal::ZERO, cell_price)
            } else {
                cell_price(price_cell)
            };

            if price > Decimal::ZERO || (!code.is_empty() && name.chars().count() > 2) {
                if is_subsheet_code(&code) {
                    index.insert(&code, &name);
                }
                items.push(LineItem::section(code, name, price, true));
            }
        }
    }
    items
}

/// Шапка «Číslo / Název / Cena celkem» в пределах нескольких строк под маркером.
///
/// Шапка без отдельных столбцов наименования или цены даёт [`ExtractError::MissingColumn`].
fn summary_header(
    sheet: &Sheet,
    marker_row: usize,
) -> Result<Option<(usize, SummaryColumns)>, ExtractError> {
    let end = (marker_row + 1 + HEADER_LOOKAHEAD).min(sheet.len());
    let Some(header_row) = (marker_row + 1..end).find(|idx| {
        let text = sheet.row_text(*idx);
        text.contains("číslo") && text.contains("název")
    }) else {
        return Ok(None);
    };

    let (mut number, mut name, mut price) = (None, None, None);
    for (col, cell) in sheet.row(header_row).iter().enumerate() {
        let value = cell.text().to_lowercase();
        if value.contains("číslo") {
            number = Some(col);
        } else if value.contains("název") {
            name = Some(col);
        } else if value.contains("cena celkem") {
            price = Some(col);
        }
    }
    let missing = |column| ExtractError::MissingColumn {
        sheet: sheet.name.clone(),
        column,
    };
    Ok(Some((
        header_row,
        SummaryColumns {
            number,
            name: name.ok_or_else(|| missing("name"))?,
            price: price.ok_or_else(|| missing("price"))?,
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::Cell;
    use rust_decimal_macros::dec;

    fn row(values: &[&str]) -> Vec<Cell> {
        values
            .iter()
            .map(|v| if v.is_empty() { Cell::Empty } else { Cell::from(*v) })
            .collect()
    }

    fn stavba_sheet() -> Sheet {
        Sheet::new(
            "Stavba",
            vec![
                row(&["Stavba:", "Polyfunkční dům Brno"]),
                row(&[]),
                row(&["Rekapitulace dílčích částí"]),
                row(&["Číslo", "Název", "", "Cena celkem"]),
                row(&["SO 01", "Hlavní objekt", "", "1 000 000"]),
                row(&["SO 02", "Přípojky", "", ""]),
                row(&["SO 01", "Hlavní objekt", "", "1 000 000"]),
                row(&["", "IČ: 12345678", "", "5"]),
                row(&["", "Celkem za stavbu", "", "1 000 000"]),
                row(&["VRN", "Vedlejší náklady", "", "50 000"]),
            ],
        )
    }

    #[test]
    fn summary_rows_until_total() {
        let mut index = SubsheetIndex::default();
        let items = parse_summary(&stavba_sheet(), &mut index);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].number, "SO 01");
        assert_eq!(items[0].price, dec!(1000000));
        assert_eq!(items[1].number, "SO 02");
        assert_eq!(items[1].price, Decimal::ZERO);
        assert_eq!(items[0].is_section_header, Some(true));
        assert_eq!(index.match_sheet("SO 02 Přípojky"), Some(("SO 02", "Přípojky")));
        assert_eq!(index.match_sheet("SO01"), Some(("SO 01", "Hlavní objekt")));
        assert_eq!(index.match_sheet("Krycí list"), None);
    }

    #[test]
    fn longer_codes_match_first() {
        let mut index = SubsheetIndex::default();
        index.insert("IO 72", "Kratší");
        index.insert("IO 720a", "Delší");
        assert_eq!(index.match_sheet("IO 720a Kanalizace"), Some(("IO 720a", "Delší")));
    }

    #[test]
    fn matches_by_code_tail() {
        let mut index = SubsheetIndex::default();
        index.insert("IO 710", "Komunikace");
        assert_eq!(index.match_sheet("710 - komunikace"), Some(("IO 710", "Komunikace")));
        index.insert("SO 01", "Budova");
        assert_eq!(index.match_sheet("List 01"), None);
    }

    #[test]
    fn attaches_object_sheets() {
        let object = Sheet::new(
            "SO 01 Hlavní objekt",
            vec![
                row(&["Kód", "Popis", "Cena celkem"]),
                row(&["1", "Výkopy", "400 000"]),
                row(&["2", "Základy", "600 000"]),
            ],
        );
        let book = Workbook::new(vec![stavba_sheet(), object]);
        let result = extract_stavba(&book);
        assert_eq!(result.project_name.as_deref(), Some("Polyfunkční dům Brno"));
        assert_eq!(result.child_budgets.len(), 1);
        let child = &result.child_budgets[0];
        assert_eq!(child.number_code, "SO 01");
        assert_eq!(child.name, "Hlavní objekt");
        assert_eq!(child.total(), dec!(1000000));
    }

    #[test]
    fn header_without_price_column_is_reported() {
        let sheet = Sheet::new(
            "Stavba",
            vec![
                row(&["Rekapitulace dílčích částí"]),
                row(&["Číslo", "Název", "Poznámka"]),
                row(&["SO 01", "Hlavní objekt", "bez ceny"]),
            ],
        );
        assert!(matches!(
            summary_header(&sheet, 0),
            Err(ExtractError::MissingColumn { column: "price", .. })
        ));
        let mut index = SubsheetIndex::default();
        assert!(parse_summary(&sheet, &mut index).is_empty());
        assert_eq!(summary_header(&stavba_sheet(), 2).unwrap().map(|(row, _)| row), Some(3));
    }

    #[test]
    fn empty_without_main_sheet() {
        let book = Workbook::new(vec![Sheet::new("List1", vec![row(&["něco"])])]);
        let result = extract_stavba(&book);
        assert!(!result.is_usable());
    }
}
