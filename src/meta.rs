//! Название проекта из титульного блока листа («Stavba:», «Akce:», «Objekt:»).

use crate::classify::is_valid_name;
use crate::raw::Sheet;
use crate::utils::{is_null_marker, truncate_chars};

const PROJECT_SCAN_ROWS: usize = 20;
const OBJECT_SCAN_ROWS: usize = 50;
const PROJECT_PREFIXES: &[&str] = &["stavba", "akce", "projekt", "název"];

/// Ищет название проекта в первых строках листа.
///
/// Поддерживаются подписи `Stavba: Název`, подпись и значение в соседних столбцах, а также
/// «NÁZEV AKCE :» с названием в следующей строке (krycí list).
pub fn project_name(sheet: &Sheet) -> Option<String> {
    for idx in 0..sheet.len().min(PROJECT_SCAN_ROWS) {
        let row = sheet.row(idx);
        for (col, cell) in row.iter().enumerate() {
            let value = cell.text();
            let lower = value.to_lowercase();
            if !PROJECT_PREFIXES.iter().any(|p| lower.starts_with(p)) {
                continue;
            }
            if let Some((_, rest)) = value.split_once(':') {
                let rest = rest.trim();
                if rest.chars().count() > 3 {
                    return Some(rest.to_string());
                }
            }
            let neighbour = (1..5)
                .map(|offset| sheet.text(idx, col + offset))
                .find(|next| next.chars().count() > 3 && !is_null_marker(next));
            if neighbour.is_some() {
                return neighbour;
            }
            if idx + 1 < sheet.len() && (lower.contains("akce") || lower.contains("název")) {
                let below = (0..3)
                    .map(|c| sheet.text(idx + 1, c))
                    .find(|next| {
                        next.chars().count() > 3 && !is_null_marker(next) && is_valid_name(next)
                    });
                if below.is_some() {
                    return below;
                }
            }
        }
    }
    None
}

/// Значение справа от ячейки «Objekt:» (листы Soupis prací), не длиннее 80 символов.
pub fn object_name(sheet: &Sheet) -> Option<String> {
    for idx in 0..sheet.len().min(OBJECT_SCAN_ROWS) {
        for (col, cell) in sheet.row(idx).iter().enumerate() {
            if !cell.text().to_lowercase().contains("objekt:") {
                continue;
            }
            let next = sheet.text(idx, col + 1);
            if !next.is_empty() {
                return Some(truncate_chars(&next, 80));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::Cell;

    fn sheet(rows: Vec<Vec<&str>>) -> Sheet {
        Sheet::new(
            "Stavba",
            rows.into_iter()
                .map(|row| row.into_iter().map(Cell::from).collect())
                .collect(),
        )
    }

    #[test]
    fn reads_inline_label() {
        let s = sheet(vec![vec!["Stavba: Bytový dům Na Výsluní"]]);
        assert_eq!(project_name(&s).as_deref(), Some("Bytový dům Na Výsluní"));
    }

    #[test]
    fn reads_neighbour_cell() {
        let s = sheet(vec![vec!["Akce", "", "Rekonstrukce školy"]]);
        assert_eq!(project_name(&s).as_deref(), Some("Rekonstrukce školy"));
    }

    #[test]
    fn reads_next_row_on_cover_sheet() {
        let s = sheet(vec![vec!["NÁZEV AKCE :"], vec!["Přístavba tělocvičny"]]);
        assert_eq!(project_name(&s).as_deref(), Some("Přístavba tělocvičny"));
    }

    #[test]
    fn none_without_labels() {
        let s = sheet(vec![vec!["Rekapitulace"], vec!["1", "Zemní práce"]]);
        assert_eq!(project_name(&s), None);
    }

    #[test]
    fn object_label() {
        let s = sheet(vec![vec![], vec!["", "Objekt:", "SO 01 - Hlavní budova"]]);
        assert_eq!(object_name(&s).as_deref(), Some("SO 01 - Hlavní budova"));
    }
}
