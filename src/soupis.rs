//! Вариант 3: Soupis prací (выгрузки KROS / Unistav).
//!
//! Лист состоит из блока «REKAPITULACE ČLENĚNÍ SOUPISU PRACÍ» (разделы с итогами) и блока
//! «SOUPIS PRACÍ», где строки типа `D` открывают раздел, а строки типа `K` являются позициями.

use crate::child_sheet::parse_child_sheet;
use crate::classify::{is_item_name, is_valid_name};
use crate::detect::{SOUPIS_HEADER, is_cover_sheet, is_instruction_sheet, is_soupis_text};
use crate::error::ExtractError;
use crate::header::find_row_with_all;
use crate::meta::{object_name, project_name};
use crate::raw::{Sheet, Workbook};
use crate::stavba::SubsheetIndex;
use crate::types::{BudgetKind, ChildBudget, LineItem, Money, RawExtraction};
use crate::utils::{cell_price, codes_match, is_numeric_code};
use regex::Regex;
use rust_decimal::Decimal;
use std::sync::LazyLock;
use tracing::{debug, info};

/// Коды разделов, которые в рекапитуляции стоят без группы (`N00`, `VRN`, `R`).
pub const STANDALONE_CODES: &[&str] = &["N00", "VRN", "R"];

const RECAP_HEADER_SCAN_ROWS: usize = 120;
const RECAP_MAX_ROW: usize = 500;
const RECAP_NAME_CELLS: usize = 10;
const PRICE_SCAN_COLS: std::ops::Range<usize> = 5..20;
const DEFAULT_RECAP_PRICE_COL: usize = 8;
const MIN_RECAP_PRICE: i64 = 100;

const DEFAULT_CODE_COL: usize = 4;
const DEFAULT_DESCRIPTION_COL: usize = 5;
const DEFAULT_PRICE_COL: usize = 9;
const MAX_GROUP_CODE_LEN: usize = 6;

static LEADING_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\d+(\.\d+)?(\s*[-–]|\s+)").expect("valid leading code regex")
});
static CODE_DASH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*[-–]\s*(.+)").expect("valid code dash regex")
});
static CODE_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+(?:\.\d+)?)\s+(.+)").expect("valid code space regex")
});
static DIVISION_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9.]+$").expect("valid division code regex"));

/// Роль кода в строке типа `D`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DivisionCode {
    /// `1`, `711`, `1.1`: раздел со своей дочерней сметой.
    Numeric,
    /// `N00`, `VRN`, `R`.
    Standalone,
    /// `HSV`, `PSV`: только заголовок группы.
    Group,
    Invalid,
}

impl DivisionCode {
    fn of(code: &str) -> Self {
        let code = code.trim();
        if code.is_empty() {
            return Self::Invalid;
        }
        let well_formed = code.chars().all(|ch| ch.is_ascii_digit())
            || (code.chars().count() <= MAX_GROUP_CODE_LEN && DIVISION_CODE_RE.is_match(code));
        if !well_formed {
            Self::Invalid
        } else if is_numeric_code(code) {
            Self::Numeric
        } else if is_standalone(code) {
            Self::Standalone
        } else {
            Self::Group
        }
    }

    const fn opens_section(self) -> bool {
        matches!(self, Self::Numeric | Self::Standalone)
    }
}

#[inline]
fn is_standalone(code: &str) -> bool {
    let upper = code.trim().to_uppercase();
    STANDALONE_CODES.contains(&upper.as_str())
}

/// Столбцы блока «Rekapitulace členění».
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RecapColumns {
    data_start: usize,
    price: usize,
}

/// Столбцы блока «Soupis prací».
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SoupisColumns {
    data_start: usize,
    kind: usize,
    code: usize,
    description: usize,
    price: usize,
    quantity: Option<usize>,
    unit_price: Option<usize>,
}

/// Раздел рекапитуляции, для которого строится дочерняя смета.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RecapSection {
    code: String,
    name: String,
    price: Money,
}

#[derive(Debug, Default)]
struct Recap {
    parent_items: Vec<LineItem>,
    sections: Vec<RecapSection>,
    total_price: Option<Money>,
}

/// Раздел блока Soupis с позициями `K`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SoupisSection {
    code: String,
    name: String,
    price: Money,
    kind: DivisionCode,
    items: Vec<LineItem>,
}

/// Разбирает лист Soupis prací.
///
/// Без блока рекапитуляции разделы родительской сметы берутся из строк `D`. Ошибка
/// возвращается, если на листе нет ни рекапитуляции, ни шапки `PČ / Typ / Kód`.
pub(crate) fn extract_soupis_sheet(sheet: &Sheet) -> Result<RawExtraction, ExtractError> {
    let recap = recap_columns(sheet).map(|columns| parse_recap(sheet, columns));
    let soupis = soupis_columns(sheet);
    if recap.is_none() && soupis.is_none() {
        return Err(ExtractError::Structure {
            sheet: sheet.name.clone(),
            reason: "neither recap nor soupis header found".into(),
        });
    }
    let sections = soupis.map_or_else(Vec::new, |columns| walk_sections(sheet, &columns));

    let mut result = RawExtraction::new(BudgetKind::Type3);
    result.project_name = object_name(sheet).or_else(|| project_name(sheet));

    match recap {
        Some(recap) => {
            result.total_price = recap.total_price;
            result.child_budgets = recap_children(&recap.sections, &sections);
            result.parent_items = recap.parent_items;
        }
        None => {
            debug!(sheet = %sheet.name, "no recap block, sections from D rows");
            for section in sections {
                let Some(name) = section_name(&section) else {
                    debug!(code = %section.code, "D row without a usable name");
                    continue;
                };
                result.parent_items.push(LineItem::section(
                    section.code.clone(),
                    name.clone(),
                    section.price,
                    true,
                ));
                if !section.items.is_empty() {
                    result.child_budgets.push(ChildBudget {
                        name,
                        number_code: section.code,
                        items: section.items,
                    });
                }
            }
        }
    }

    debug!(
        sheet = %sheet.name,
        parent_items = result.parent_items.len(),
        child_budgets = result.child_budgets.len(),
        "soupis parsed"
    );
    Ok(result)
}

/// Дочерние сметы по разделам рекапитуляции, затем разделы Soupis, которых нет в рекапитуляции.
fn recap_children(recap: &[RecapSection], sections: &[SoupisSection]) -> Vec<ChildBudget> {
    let mut children: Vec<ChildBudget> = Vec::new();
    for meta in recap {
        let mut items = find_section(sections, &meta.code)
            .map(|section| section.items.clone())
            .unwrap_or_default();
        // Синтетическая строка раздела идёт без номера.
        if items.is_empty() && meta.price > Decimal::ZERO {
            items.push(LineItem::new("", meta.name.clone(), meta.price));
        }
        if items.is_empty() {
            debug!(code = %meta.code, "recap section without items");
            continue;
        }
        children.push(ChildBudget {
            name: meta.name.clone(),
            number_code: meta.code.clone(),
            items,
        });
    }

    for section in sections {
        let known = recap.iter().any(|meta| codes_match(&meta.code, &section.code));
        if known || section.kind != DivisionCode::Numeric || section.items.is_empty() {
            continue;
        }
        let Some(name) = section_name(section) else {
            continue;
        };
        children.push(ChildBudget {
            name,
            number_code: section.code.clone(),
            items: section.items.clone(),
        });
    }
    children
}

/// Наименование раздела: описание строки `D`, иначе наименование первой позиции.
fn section_name(section: &SoupisSection) -> Option<String> {
    if is_valid_name(&section.name) {
        return Some(section.name.clone());
    }
    section
        .items
        .first()
        .map(|item| item.name.clone())
        .filter(|name| is_valid_name(name))
}

fn find_section<'a>(sections: &'a [SoupisSection], code: &str) -> Option<&'a SoupisSection> {
    sections
        .iter()
        .find(|section| section.code == code.trim())
        .or_else(|| sections.iter().find(|section| codes_match(&section.code, code)))
}

fn recap_columns(sheet: &Sheet) -> Option<RecapColumns> {
    let header = find_row_with_all(sheet, 0..RECAP_HEADER_SCAN_ROWS, &["kód dílu", "popis"])?;
    let data_start = header + 1;
    let price = find_cell(sheet, header, |v| v.contains("cena celkem") && v.contains("czk"))
        .or_else(|| {
            (data_start.saturating_sub(2)..(data_start + 3).min(sheet.len()))
                .find_map(|row| find_cell(sheet, row, |v| v.contains("cena") && v.contains("celkem")))
        })
        .or_else(|| {
            let end = PRICE_SCAN_COLS.end.min(sheet.width(data_start));
            (PRICE_SCAN_COLS.start..end)
                .rev()
                .find(|col| cell_price(sheet.cell(data_start, *col)) > Decimal::from(MIN_RECAP_PRICE))
        })
        .unwrap_or(DEFAULT_RECAP_PRICE_COL);

    Some(RecapColumns { data_start, price })
}

/// Первый столбец строки, текст которого (в нижнем регистре) проходит проверку.
fn find_cell(sheet: &Sheet, row: usize, test: impl Fn(&str) -> bool) -> Option<usize> {
    sheet
        .row(row)
        .iter()
        .position(|cell| test(&cell.text().to_lowercase()))
}

fn parse_recap(sheet: &Sheet, columns: RecapColumns) -> Recap {
    let mut recap = Recap::default();
    for idx in columns.data_start..sheet.len().min(RECAP_MAX_ROW) {
        let name = recap_row_name(sheet, idx, columns.price);
        if name.is_empty() {
            continue;
        }
        let lower = name.to_lowercase();
        if is_soupis_text(&lower) {
            break;
        }
        if lower.contains("kód dílu") || lower.contains("kod dilu") {
            continue;
        }

        let mut price = cell_price(sheet.cell(idx, columns.price));
        if lower.contains("náklady soupisu celkem") || lower.contains("naklady soupisu celkem") {
            if price == Decimal::ZERO {
                price = PRICE_SCAN_COLS
                    .map(|col| cell_price(sheet.cell(idx, col)))
                    .max()
                    .unwrap_or_default();
            }
            recap.total_price = Some(price);
            continue;
        }

        let (code, display) = split_code(&name);
        if !is_valid_name(&display) {
            continue;
        }
        match DivisionCode::of(&code) {
            DivisionCode::Numeric => {
                recap
                    .parent_items
                    .push(LineItem::section(code.clone(), display.clone(), price, true));
                recap.sections.push(RecapSection {
                    code,
                    name: display,
                    price,
                });
            }
            DivisionCode::Standalone => {
                recap
                    .parent_items
                    .push(LineItem::section(code.clone(), name.clone(), price, true));
                recap.sections.push(RecapSection {
                    code,
                    name: display,
                    price,
                });
            }
            _ => debug!(row = idx, code = %code, "recap group header"),
        }
    }
    recap
}

/// Наименование строки рекапитуляции: первая непустая ячейка, а для числового кода
/// `код - наименование` из двух первых ячеек.
fn recap_row_name(sheet: &Sheet, idx: usize, price_col: usize) -> String {
    let cells: Vec<String> = (0..sheet.width(idx).min(RECAP_NAME_CELLS))
        .filter(|col| *col != price_col)
        .map(|col| sheet.text(idx, col))
        .filter(|text| !text.is_empty())
        .collect();
    match cells.as_slice() {
        [] => String::new(),
        [code, name, ..] if is_numeric_code(code) => format!("{code} - {name}"),
        [first, ..] => first.clone(),
    }
}

/// Делит `711 - Izolace proti vodě` на код и наименование.
fn split_code(name: &str) -> (String, String) {
    let trimmed = name.trim();
    let (mut code, display) = if LEADING_CODE_RE.is_match(trimmed) {
        CODE_DASH_RE
            .captures(trimmed)
            .or_else(|| CODE_SPACE_RE.captures(trimmed))
            .map_or_else(
                || (String::new(), trimmed.to_string()),
                |caps| (caps[1].trim().to_string(), caps[2].trim().to_string()),
            )
    } else if let Some((left, right)) = trimmed.split_once(" - ")
        && !left.trim().is_empty()
    {
        (left.trim().to_string(), right.trim().to_string())
    } else {
        (String::new(), trimmed.to_string())
    };
    if code.is_empty() {
        code = display.split_whitespace().next().unwrap_or_default().to_string();
    }
    let display = if display.is_empty() { trimmed.to_string() } else { display };
    (code, display)
}

fn soupis_columns(sheet: &Sheet) -> Option<SoupisColumns> {
    let header = (0..sheet.len()).find(|idx| {
        let text = sheet.row_text(*idx);
        SOUPIS_HEADER.iter().all(|kw| text.contains(kw))
            && sheet.row(*idx).iter().any(|cell| cell.text().to_lowercase() == "typ")
    })?;

    let mut columns = SoupisColumns {
        data_start: header + 1,
        kind: 0,
        code: DEFAULT_CODE_COL,
        description: DEFAULT_DESCRIPTION_COL,
        price: DEFAULT_PRICE_COL,
        quantity: None,
        unit_price: None,
    };
    let (mut code, mut description, mut price) = (None, None, None);
    for (col, cell) in sheet.row(header).iter().enumerate() {
        let v = cell.text().to_lowercase();
        match v.as_str() {
            "typ" => columns.kind = col,
            "kód" | "kod" => code = code.or(Some(col)),
            "popis" => description = description.or(Some(col)),
            _ if v.contains("cena celkem") && v.contains("czk") => price = price.or(Some(col)),
            _ if v.contains("množství") => columns.quantity = columns.quantity.or(Some(col)),
            _ if v.contains("j.cena") || v.contains("j. cena") || v.contains("jednotková") => {
                columns.unit_price = columns.unit_price.or(Some(col));
            }
            _ => {}
        }
    }
    columns.code = code.unwrap_or(DEFAULT_CODE_COL);
    columns.description = description.unwrap_or(DEFAULT_DESCRIPTION_COL);
    columns.price = price.unwrap_or(DEFAULT_PRICE_COL);
    Some(columns)
}

/// Строка типа `K` как позиция сметы.
///
/// Если итог пустой, а количество и цена за единицу положительны, цена пересчитывается.
fn item_row(sheet: &Sheet, idx: usize, columns: &SoupisColumns) -> Option<LineItem> {
    let name = sheet.text(idx, columns.description);
    if name.is_empty() || !is_item_name(&name) {
        return None;
    }
    let mut price = cell_price(sheet.cell(idx, columns.price));
    if price == Decimal::ZERO {
        let value = |col: Option<usize>| col.map_or(Decimal::ZERO, |c| cell_price(sheet.cell(idx, c)));
        let (quantity, unit_price) = (value(columns.quantity), value(columns.unit_price));
        if quantity > Decimal::ZERO && unit_price > Decimal::ZERO {
            price = (quantity * unit_price).round_dp(2);
        }
    }
    Some(LineItem::new(sheet.text(idx, columns.code), name, price))
}

#[inline]
fn row_kind(sheet: &Sheet, idx: usize, columns: &SoupisColumns) -> String {
    sheet.text(idx, columns.kind).to_uppercase()
}

/// Обход блока Soupis: `D` открывает или закрывает раздел, `K` добавляется в открытый.
fn walk_sections(sheet: &Sheet, columns: &SoupisColumns) -> Vec<SoupisSection> {
    let mut sections: Vec<SoupisSection> = Vec::new();
    let mut current: Option<usize> = None;

    for idx in columns.data_start..sheet.len() {
        match row_kind(sheet, idx, columns).as_str() {
            "D" => {
                let code = sheet.text(idx, columns.code);
                let kind = DivisionCode::of(&code);
                if !kind.opens_section() {
                    current = None;
                    continue;
                }
                let position = sections.iter().position(|s| s.code == code);
                current = Some(position.unwrap_or_else(|| {
                    sections.push(SoupisSection {
                        code,
                        name: sheet.text(idx, columns.description),
                        price: cell_price(sheet.cell(idx, columns.price)),
                        kind,
                        items: Vec::new(),
                    });
                    sections.len() - 1
                }));
            }
            "K" => {
                let Some(open) = current else { continue };
                if let Some(item) = item_row(sheet, idx, columns) {
                    sections[open].items.push(item);
                }
            }
            _ => {}
        }
    }
    sections
}

/// Многолистовая выгрузка с листом «Rekapitulace stavby».
///
/// Разделы берутся с листа рекапитуляции, дочерние сметы с листов, в имени которых есть код
/// раздела, и содержат все строки `K` такого листа.
pub(crate) fn extract_construction_recap(
    workbook: &Workbook,
    recap_idx: usize,
) -> Result<RawExtraction, ExtractError> {
    let recap = &workbook.sheets[recap_idx];
    let rows = parse_child_sheet(recap, true).ok_or_else(|| ExtractError::Structure {
        sheet: recap.name.clone(),
        reason: "no header row in construction recap".into(),
    })?;

    let mut result = RawExtraction::new(BudgetKind::Type3);
    result.project_name = project_name(recap);
    let mut index = SubsheetIndex::default();
    for row in rows {
        if !row.number.is_empty() {
            index.insert(&row.number, &row.name);
        }
        result
            .parent_items
            .push(LineItem::section(row.number, row.name, row.price, true));
    }

    for (idx, sheet) in workbook.sheets.iter().enumerate() {
        if idx == recap_idx || is_instruction_sheet(sheet) || is_cover_sheet(&sheet.name) {
            continue;
        }
        let Some((code, name)) = index.match_sheet(&sheet.name) else {
            continue;
        };
        let items = match soupis_columns(sheet) {
            Some(columns) => (columns.data_start..sheet.len())
                .filter(|row| row_kind(sheet, *row, &columns) == "K")
                .filter_map(|row| item_row(sheet, row, &columns))
                .collect(),
            None => parse_child_sheet(sheet, true).unwrap_or_default(),
        };
        if items.is_empty() {
            continue;
        }
        result.child_budgets.push(ChildBudget {
            name: name.to_string(),
            number_code: code.to_string(),
            items,
        });
    }
    info!(
        sheet = %recap.name,
        parent_items = result.parent_items.len(),
        child_budgets = result.child_budgets.len(),
        "construction recap parsed"
    );
    Ok(result)
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

    const SOUPIS_HEADER_ROW: &[&str] = &[
        "PČ", "Typ", "", "", "Kód", "Popis", "MJ", "Množství", "J.cena [CZK]", "Cena celkem [CZK]",
    ];

    fn soupis_header() -> Vec<Cell> {
        row(SOUPIS_HEADER_ROW)
    }

    fn unistav_sheet() -> Sheet {
        let mut rows = vec![
            row(&["", "Objekt:", "SO 01 - Bytový dům"]),
            row(&["REKAPITULACE ČLENĚNÍ SOUPISU PRACÍ"]),
            row(&["Kód dílu - Popis", "", "", "", "", "", "", "", "Cena celkem [CZK]"]),
            row(&["Náklady soupisu celkem", "", "", "", "", "", "", "", "32 500,00"]),
            row(&["HSV - Práce a dodávky HSV", "", "", "", "", "", "", "", "30 000,00"]),
            row(&["1", "Zemní práce", "", "", "", "", "", "", "25 000,00"]),
            row(&["2", "Zakládání", "", "", "", "", "", "", "5 000,00"]),
            row(&["VRN - Vedlejší rozpočtové náklady", "", "", "", "", "", "", "", "2 500,00"]),
            row(&[]),
            row(&["SOUPIS PRACÍ"]),
        ];
        rows.push(soupis_header());
        rows.extend([
            row(&["", "D", "", "", "HSV", "Práce a dodávky HSV", "", "", "", "30000"]),
            row(&["", "D", "", "", "1", "Zemní práce", "", "", "", "25000"]),
            row(&["1", "K", "", "", "131201101", "Hloubení jam", "m3", "10", "500", "5000"]),
            row(&["", "VV", "", "", "", "10*2", "", "20"]),
            row(&["2", "K", "", "", "162701105", "Vodorovné přemístění výkopku", "m3", "40", "500", ""]),
            row(&["", "D", "", "", "PSV", "Práce a dodávky PSV"]),
            row(&["3", "K", "", "", "999", "Sirotek bez dílu", "", "", "", "10"]),
            row(&["", "D", "", "", "3", "Svislé konstrukce", "", "", "", "0"]),
            row(&["4", "K", "", "", "311", "Zdivo nosné", "m3", "", "", "4 000"]),
        ]);
        Sheet::new("SO 01", rows)
    }

    #[test]
    fn splits_recap_names() {
        assert_eq!(split_code("711 - Izolace proti vodě"), ("711".into(), "Izolace proti vodě".into()));
        assert_eq!(split_code("1.1 Zemní práce"), ("1.1".into(), "Zemní práce".into()));
        assert_eq!(split_code("HSV - Práce a dodávky"), ("HSV".into(), "Práce a dodávky".into()));
        assert_eq!(split_code("N00"), ("N00".into(), "N00".into()));
    }

    #[test]
    fn division_codes() {
        assert_eq!(DivisionCode::of("711"), DivisionCode::Numeric);
        assert_eq!(DivisionCode::of("1.1"), DivisionCode::Numeric);
        assert_eq!(DivisionCode::of("VRN"), DivisionCode::Standalone);
        assert_eq!(DivisionCode::of("HSV"), DivisionCode::Group);
        assert_eq!(DivisionCode::of("Díl 1"), DivisionCode::Invalid);
        assert_eq!(DivisionCode::of(""), DivisionCode::Invalid);
    }

    #[test]
    fn recap_sections_become_parent_items() {
        let result = extract_soupis_sheet(&unistav_sheet()).unwrap();
        assert_eq!(result.kind, BudgetKind::Type3);
        assert_eq!(result.project_name.as_deref(), Some("SO 01 - Bytový dům"));
        assert_eq!(result.total_price, Some(dec!(32500)));
        let numbers: Vec<_> = result.parent_items.iter().map(|i| i.number.as_str()).collect();
        assert_eq!(numbers, ["1", "2", "VRN"]);
        assert_eq!(result.parent_items[0].name, "Zemní práce");
        assert_eq!(result.parent_items[2].name, "VRN - Vedlejší rozpočtové náklady");
    }

    #[test]
    fn items_follow_their_division() {
        let result = extract_soupis_sheet(&unistav_sheet()).unwrap();
        let codes: Vec<_> = result
            .child_budgets
            .iter()
            .map(|c| c.number_code.as_str())
            .collect();
        assert_eq!(codes, ["1", "2", "VRN", "3"]);

        let earthworks = &result.child_budgets[0];
        assert_eq!(earthworks.items.len(), 2);
        assert_eq!(earthworks.items[0].number, "131201101");
        // 40 × 500 при пустом итоге
        assert_eq!(earthworks.items[1].price, dec!(20000));

        // без строк K, но с ценой в рекапитуляции
        assert_eq!(result.child_budgets[1].items, vec![LineItem::new("", "Zakládání", dec!(5000))]);
        assert_eq!(result.child_budgets[3].name, "Svislé konstrukce");
        assert!(result
            .child_budgets
            .iter()
            .flat_map(|c| &c.items)
            .all(|i| i.name != "Sirotek bez dílu" && i.name != "10*2"));
    }

    #[test]
    fn without_recap_sections_come_from_d_rows() {
        let rows = vec![
            row(&["Stavba:", "Oprava chodníku"]),
            soupis_header(),
            row(&["", "D", "", "", "1", "Zemní práce", "", "", "", "1000"]),
            row(&["1", "K", "", "", "113", "Rozebrání dlažby", "m2", "", "", "1 000,00"]),
            row(&["", "D", "", "", "VRN", "Vedlejší náklady", "", "", "", "0"]),
        ];
        let result = extract_soupis_sheet(&Sheet::new("List1", rows)).unwrap();
        assert_eq!(result.project_name.as_deref(), Some("Oprava chodníku"));
        assert_eq!(result.parent_items.len(), 2);
        assert_eq!(result.parent_items[1].number, "VRN");
        assert_eq!(result.child_budgets.len(), 1);
        assert_eq!(result.child_budgets[0].total(), dec!(1000));
    }

    #[test]
    fn d_rows_without_description_take_first_item_name() {
        let rows = vec![
            soupis_header(),
            row(&["", "D", "", "", "1", "", "", "", "", "1000"]),
            row(&["1", "K", "", "", "113", "Rozebrání dlažby", "m2", "", "", "1 000,00"]),
            row(&["", "D", "", "", "2", "IČ: 12345678", "", "", "", "0"]),
        ];
        let result = extract_soupis_sheet(&Sheet::new("List1", rows)).unwrap();
        assert_eq!(
            result.parent_items,
            vec![LineItem::section("1", "Rozebrání dlažby", dec!(1000), true)]
        );
        assert_eq!(result.child_budgets.len(), 1);
        assert_eq!(result.child_budgets[0].name, "Rozebrání dlažby");
    }

    #[test]
    fn sheet_without_blocks_is_structure_error() {
        let sheet = Sheet::new("x", vec![row(&["nic"])]);
        assert!(matches!(
            extract_soupis_sheet(&sheet),
            Err(ExtractError::Structure { .. })
        ));
    }

    #[test]
    fn recap_price_column_from_first_data_row() {
        let sheet = Sheet::new(
            "x",
            vec![
                row(&["Kód dílu - Popis"]),
                row(&["1", "Zemní práce", "", "", "", "", "", "12 000", ""]),
            ],
        );
        assert_eq!(
            recap_columns(&sheet),
            Some(RecapColumns {
                data_start: 1,
                price: 7
            })
        );
    }

    #[test]
    fn construction_recap_workbook() {
        let recap = Sheet::new(
            "Rekapitulace stavby",
            vec![
                row(&["Kód", "Popis", "Cena celkem [CZK]"]),
                row(&["SO 01", "Hlavní budova", "15 000"]),
                row(&["SO 02", "Venkovní úpravy", "0"]),
            ],
        );
        let mut object_rows = vec![row(&["Soupis prací"]), soupis_header()];
        object_rows.extend([
            row(&["", "D", "", "", "1", "Zemní práce"]),
            row(&["1", "K", "", "", "131", "Hloubení", "", "", "", "10 000"]),
            row(&["", "D", "", "", "2", "Zakládání"]),
            row(&["2", "K", "", "", "271", "Podkladní beton", "", "", "", "5 000"]),
        ]);
        let book = Workbook::new(vec![
            Sheet::new("Pokyny pro vyplnění", vec![row(&["SO 01"])]),
            recap,
            Sheet::new("SO 01 - Hlavní budova", object_rows),
        ]);
        let result = extract_construction_recap(&book, 1).unwrap();
        assert_eq!(result.parent_items.len(), 2);
        assert_eq!(result.child_budgets.len(), 1);
        let child = &result.child_budgets[0];
        assert_eq!(child.number_code, "SO 01");
        assert_eq!(child.name, "Hlavní budova");
        assert_eq!(child.items.len(), 2);
        assert_eq!(child.total(), dec!(15000));
    }
}
