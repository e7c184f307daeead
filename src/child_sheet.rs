//! Разбор листа с детальными строками по найденной шапке (листы объектов, запасной вариант 2).

use crate::classify::is_item_name;
use crate::header::find_header_row;
use crate::raw::{Cell, Sheet, join_lower};
use crate::types::{LineItem, Money};
use crate::utils::{cell_price, is_null_marker};
use rust_decimal::Decimal;
use tracing::debug;

/// Разбирает лист с детальными строками.
///
/// Возвращает `None`, если шапка не найдена. Строки без кода (продолжения, vzorce, výkaz
/// výměr) пропускаются.
pub fn parse_child_sheet(sheet: &Sheet, prefer_total: bool) -> Option<Vec<LineItem>> {
    let Some(header) = find_header_row(sheet, prefer_total) else {
        debug!(sheet = %sheet.name, "no header row in detail sheet");
        return None;
    };
    let name_col = header.columns.name?;

    let items: Vec<LineItem> = (header.row + 1..sheet.len())
        .filter_map(|idx| {
            detail_item(sheet, idx, name_col, header.columns.number, header.columns.price)
        })
        .collect();
    debug!(sheet = %sheet.name, header_row = header.row, items = items.len(), "detail sheet parsed");
    Some(items)
}

fn detail_item(
    sheet: &Sheet,
    idx: usize,
    name_col: usize,
    number_col: Option<usize>,
    price_col: Option<usize>,
) -> Option<LineItem> {
    if sheet.cell(idx, name_col).is_blank() {
        return None;
    }
    let row = sheet.row(idx);
    let lead = join_lower(&row[..row.len().min(3)]);
    if lead.contains("díl:") || lead.contains("oddíl:") {
        return None;
    }

    let code = number_col.map(|col| sheet.text(idx, col)).unwrap_or_default();
    let code_lower = code.to_lowercase();
    if is_null_marker(&code) || code_lower == "vv" {
        return None;
    }
    if code_lower.contains("díl") || code_lower.contains("dil") {
        return None;
    }

    let name = sheet.text(idx, name_col);
    let name_lower = name.to_lowercase();
    if !is_item_name(&name) || name_lower.starts_with("celkem") || name_lower.starts_with("mezisoučet")
    {
        return None;
    }

    let price = match price_col.map(|col| sheet.cell(idx, col)) {
        Some(cell) if !cell.is_blank() => cell_price(cell),
        _ => last_value_price(row),
    };
    Some(LineItem::new(code, name, price))
}

/// Последняя непустая ячейка строки как цена, если в строке хотя бы две непустые ячейки.
fn last_value_price(row: &[Cell]) -> Money {
    let values: Vec<_> = row.iter().filter(|cell| !cell.is_blank()).collect();
    if values.len() >= 2 {
        values.last().map_or(Decimal::ZERO, |cell| cell_price(cell))
    } else {
        Decimal::ZERO
    }
}
