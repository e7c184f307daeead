//! Вариант 2: таблица «Rekapitulace» (Pozice / Popis / Cena) с разделами и подразделами.
//!
//! Целая позиция (`1`, `2`, `1.0`) открывает раздел верхнего уровня, дробная (`1.1`) открывает
//! подраздел со своей дочерней сметой, остальные строки относятся к открытому разделу.

use crate::child_sheet::parse_child_sheet;
use crate::classify::{is_item_name, is_valid_name};
use crate::detect::{DESCRIPTION_KEYWORDS, is_cover_sheet, is_instruction_sheet, is_price_header};
use crate::header::contains_any;
use crate::meta::project_name;
use crate::raw::{Cell, Sheet, Workbook};
use crate::types::{BudgetKind, ChildBudget, LineItem, Money, RawExtraction};
use crate::utils::{cell_price, is_null_marker, normalize_code};
use regex::Regex;
use rust_decimal::Decimal;
use std::sync::LazyLock;
use tracing::{debug, info};

const HEADER_SCAN_ROWS: usize = 20;
const POSITIONAL_SCAN_ROWS: usize = 30;
/// Позиции от этого значения считаются не номером раздела, а мусором.
const MAX_SECTION_NUMBER: f64 = 10_000.0;

static INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("valid integer regex"));
static INTEGER_ZERO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.0+$").expect("valid integer zero regex"));
static DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+$").expect("valid decimal regex"));

/// Столбцы таблицы Rekapitulace и первая строка данных.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RekapColumns {
    position: usize,
    description: usize,
    price: usize,
    data_start: usize,
}

/// Вид значения в столбце «Pozice».
#[derive(Debug, Clone, PartialEq, Eq)]
enum Position {
    Empty,
    TopLevel(String),
    Subsection(String),
    Other(String),
}

impl Position {
    fn from_cell(cell: &Cell) -> Self {
        match cell {
            Cell::Empty => Self::Empty,
            Cell::Number(value) => {
                let in_range = *value > 0.0 && *value < MAX_SECTION_NUMBER;
                if in_range && value.fract() == 0.0 {
                    Self::TopLevel(cell.text())
                } else if in_range {
                    Self::Subsection(cell.text())
                } else {
                    Self::Other(cell.text())
                }
            }
            Cell::Text(text) => {
                let s = text.trim();
                if is_null_marker(s) {
                    Self::Empty
                } else if INTEGER_RE.is_match(s) {
                    Self::TopLevel(s.to_string())
                } else if INTEGER_ZERO_RE.is_match(s) {
                    Self::TopLevel(normalize_code(s))
                } else if DECIMAL_RE.is_match(s) {
                    Self::Subsection(s.to_string())
                } else {
                    Self::Other(s.to_string())
                }
            }
        }
    }

    fn as_str(&self) -> &str {
        match self {
            Self::Empty => "",
            Self::TopLevel(s) | Self::Subsection(s) | Self::Other(s) => s,
        }
    }
}

/// Строка данных таблицы после нормализации ячеек.
#[derive(Debug, Clone)]
struct RekapRow {
    position: Position,
    name: String,
    price: Money,
}

/// Решение по одной строке таблицы.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RowAction {
    Skip,
    Section { number: String, name: String, price: Money },
    Subsection { number: String, name: String, price: Money },
    Detail(LineItem),
}

/// Таблица правил: первое сработавшее правило определяет действие.
fn classify_row(row: &RekapRow, section_open: bool) -> RowAction {
    // Пустая строка только разделяет блоки и раздел не закрывает.
    if is_null_marker(&row.name) {
        return RowAction::Skip;
    }
    match &row.position {
        Position::TopLevel(_) | Position::Subsection(_) if !is_valid_name(&row.name) => {
            return RowAction::Skip;
        }
        Position::TopLevel(number) => {
            return RowAction::Section {
                number: number.clone(),
                name: row.name.clone(),
                price: row.price,
            };
        }
        Position::Subsection(number) => {
            return RowAction::Subsection {
                number: number.clone(),
                name: row.name.clone(),
                price: row.price,
            };
        }
        Position::Empty | Position::Other(_) => {}
    }
    if !section_open || !is_item_name(&row.name) {
        return RowAction::Skip;
    }
    let number = row.position.as_str();
    if number.is_empty() && row.price == Decimal::ZERO {
        return RowAction::Skip;
    }
    RowAction::Detail(LineItem::new(number, row.name.clone(), row.price))
}

/// Состояние обхода: родительские строки, закрытые дочерние сметы и открытый раздел.
#[derive(Debug, Default)]
struct SectionWalk {
    parent_items: Vec<LineItem>,
    child_budgets: Vec<ChildBudget>,
    current: Option<ChildBudget>,
}

impl SectionWalk {
    const fn is_open(&self) -> bool {
        self.current.is_some()
    }

    fn flush(&mut self) {
        if let Some(section) = self.current.take() {
            if section.items.is_empty() {
                debug!(section = %section.name, "section without items dropped");
            } else {
                self.child_budgets.push(section);
            }
        }
    }

    fn open(&mut self, number: String, name: String, price: Money, is_header: bool) {
        self.flush();
        self.parent_items
            .push(LineItem::section(number.clone(), name.clone(), price, is_header));
        self.current = Some(ChildBudget {
            name,
            number_code: number,
            items: Vec::new(),
        });
    }

    fn apply(mut self, action: RowAction) -> Self {
        match action {
            RowAction::Skip => {}
            RowAction::Section {
                number,
                name,
                price,
            } => self.open(number, name, price, true),
            RowAction::Subsection {
                number,
                name,
                price,
            } => self.open(number, name, price, false),
            RowAction::Detail(item) => {
                if let Some(section) = self.current.as_mut() {
                    section.items.push(item);
                }
            }
        }
        self
    }

    fn finish(mut self) -> (Vec<LineItem>, Vec<ChildBudget>) {
        self.flush();
        (self.parent_items, self.child_budgets)
    }
}

/// Разбирает один лист Rekapitulace в пару (родительские строки, дочерние сметы).
///
/// Если шапка не найдена ни по ключевым словам, ни по первой позиции «1», результат пуст.
pub fn parse_rekapitulace_sheet(sheet: &Sheet) -> (Vec<LineItem>, Vec<ChildBudget>) {
    let Some(columns) = find_columns(sheet) else {
        debug!(sheet = %sheet.name, "no Pozice/Popis/Cena header");
        return (Vec::new(), Vec::new());
    };
    debug!(sheet = %sheet.name, ?columns, "rekapitulace header");

    let (parent_items, child_budgets) = (columns.data_start..sheet.len())
        .map(|idx| RekapRow {
            position: Position::from_cell(sheet.cell(idx, columns.position)),
            name: sheet.text(idx, columns.description),
            price: cell_price(sheet.cell(idx, columns.price)),
        })
        .fold(SectionWalk::default(), |walk, row| {
            let action = classify_row(&row, walk.is_open());
            walk.apply(action)
        })
        .finish();

    debug!(
        sheet = %sheet.name,
        parent_items = parent_items.len(),
        child_budgets = child_budgets.len(),
        "rekapitulace parsed"
    );
    (parent_items, child_budgets)
}

fn find_columns(sheet: &Sheet) -> Option<RekapColumns> {
    (0..sheet.len().min(HEADER_SCAN_ROWS))
        .find_map(|idx| header_columns(sheet, idx))
        .or_else(|| positional_columns(sheet))
}

fn header_columns(sheet: &Sheet, row: usize) -> Option<RekapColumns> {
    let (mut position, mut description, mut price) = (None, None, None);
    for (col, cell) in sheet.row(row).iter().enumerate() {
        let v = cell.text().to_lowercase();
        if v.is_empty() {
            continue;
        }
        if v.contains("pozice") || v == "pořadí" || v == "poz." {
            position = Some(col);
        } else if contains_any(&v, DESCRIPTION_KEYWORDS) {
            description = Some(col);
        } else if is_price_header(&v) {
            price = Some(col);
        }
    }
    Some(RekapColumns {
        position: position.unwrap_or(0),
        description: description?,
        price: price?,
        data_start: row + 1,
    })
}

/// Без шапки: столбцы 0/1/2, данные с первой строки, где в позиции стоит «1».
fn positional_columns(sheet: &Sheet) -> Option<RekapColumns> {
    (0..sheet.len().min(POSITIONAL_SCAN_ROWS))
        .find(|idx| {
            if sheet.width(*idx) < 3 {
                return false;
            }
            let first = sheet.cell(*idx, 0);
            let starts_at_one = match first {
                Cell::Number(v) => v.fract() == 0.0 && *v > 0.0 && *v < MAX_SECTION_NUMBER,
                Cell::Text(t) => matches!(t.trim(), "1" | "1.0"),
                Cell::Empty => false,
            };
            let name = sheet.text(*idx, 1);
            starts_at_one
                && !name.is_empty()
                && (cell_price(sheet.cell(*idx, 2)) > Decimal::ZERO || name.chars().count() > 2)
        })
        .map(|idx| RekapColumns {
            position: 0,
            description: 1,
            price: 2,
            data_start: idx,
        })
}

/// Листы, в которых может быть смета варианта 2: без krycí list и инструкций.
fn budget_sheets(workbook: &Workbook) -> impl Iterator<Item = &Sheet> {
    workbook
        .sheets
        .iter()
        .filter(|sheet| !is_cover_sheet(&sheet.name) && !is_instruction_sheet(sheet))
}

fn cover_project_name(workbook: &Workbook) -> Option<String> {
    workbook
        .sheets
        .iter()
        .find(|sheet| is_cover_sheet(&sheet.name))
        .and_then(project_name)
}

/// Вариант 2 на уровне книги: первый лист, давший разделы.
///
/// Листы «Rekapitulace» пробуются первыми, затем остальные в порядке книги.
pub(crate) fn extract_rekapitulace(workbook: &Workbook) -> RawExtraction {
    let mut result = RawExtraction::new(BudgetKind::Type2);
    let (mut candidates, rest): (Vec<&Sheet>, Vec<&Sheet>) = budget_sheets(workbook)
        .partition(|sheet| sheet.name.to_lowercase().contains("rekapitulace"));
    candidates.extend(rest);

    for sheet in candidates {
        let (parent_items, child_budgets) = parse_rekapitulace_sheet(sheet);
        if !parent_items.is_empty() {
            info!(sheet = %sheet.name, parent_items = parent_items.len(), "parsed as Rekapitulace");
            result.project_name = cover_project_name(workbook);
            result.parent_items = parent_items;
            result.child_budgets = child_budgets;
            break;
        }
    }
    result
}

/// Запасной путь варианта 2: каждый лист книги становится дочерней сметой без родительских
/// строк.
pub(crate) fn extract_sheet_children(workbook: &Workbook) -> RawExtraction {
    let mut result = RawExtraction::new(BudgetKind::Type2);
    for sheet in budget_sheets(workbook) {
        match parse_child_sheet(sheet, false) {
            Some(items) if !items.is_empty() => result.child_budgets.push(ChildBudget {
                name: sheet.name.clone(),
                number_code: String::new(),
                items,
            }),
            _ => debug!(sheet = %sheet.name, "sheet without detail rows"),
        }
    }
    if !result.child_budgets.is_empty() {
        info!(sheets = result.child_budgets.len(), "Rekapitulace fallback: sheets as child budgets");
        result.project_name = cover_project_name(workbook);
    }
    result
}
