//! Поиск строки шапки и сопоставление столбцов ролям (код, наименование, цена).

use crate::raw::Sheet;

/// Сколько строк сверху просматривается в поисках шапки.
pub const HEADER_SCAN_ROWS: usize = 50;

const CODE_KEYWORDS: &[&str] = &[
    "číslo", "cislo", "kód", "kod", "pč", "pol", "poř", "id", "označení", "p.č.",
];
const NAME_KEYWORDS: &[&str] = &["název", "nazev", "popis", "zkrácený", "text", "položka"];
const PRICE_KEYWORDS: &[&str] = &[
    "cena",
    "celkem",
    "náklady",
    "odbytová",
    "montáž",
    "dodávka",
    "jednotková",
];

/// Столбцы, найденные в строке шапки.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnMap {
    /// Код / порядковый номер.
    pub number: Option<usize>,
    /// Наименование.
    pub name: Option<usize>,
    /// Цена.
    pub price: Option<usize>,
}

impl ColumnMap {
    fn score(&self) -> i32 {
        let mut score = 0;
        if self.name.is_some() {
            score += 2;
        }
        if self.number.is_some() {
            score += 1;
        }
        if self.price.is_some() {
            score += 1;
        }
        score
    }

    const fn is_eligible(&self) -> bool {
        self.name.is_some() && (self.number.is_some() || self.price.is_some())
    }
}

/// Найденная шапка таблицы.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderMatch {
    /// Индекс строки шапки.
    pub row: usize,
    /// Роли столбцов.
    pub columns: ColumnMap,
}

/// Ищет строку шапки среди первых [`HEADER_SCAN_ROWS`] строк.
///
/// При `prefer_total` из нескольких ценовых столбцов выбирается «Celkem», а не «Cena / MJ».
/// Строки из первых пяти с неполной шапкой штрафуются: обычно это ещё титульный блок.
pub fn find_header_row(sheet: &Sheet, prefer_total: bool) -> Option<HeaderMatch> {
    let mut best: Option<HeaderMatch> = None;
    let mut best_score = 0;

    for idx in 0..sheet.len().min(HEADER_SCAN_ROWS) {
        let columns = map_columns(sheet, idx, prefer_total);
        let mut score = columns.score();
        if idx < 5 && score < 4 {
            score -= 1;
        }
        if columns.is_eligible() && score > best_score {
            best_score = score;
            best = Some(HeaderMatch { row: idx, columns });
        }
    }
    best
}

fn map_columns(sheet: &Sheet, row: usize, prefer_total: bool) -> ColumnMap {
    let mut columns = ColumnMap::default();
    // (столбец, это «celkem» без «cena»)
    let mut price_candidates: Vec<(usize, bool)> = Vec::new();

    for (col, cell) in sheet.row(row).iter().enumerate() {
        let value = cell.text().to_lowercase();
        if value.is_empty() || value.contains("zakázky") || value.contains("projektu") {
            continue;
        }
        if columns.number.is_none() && contains_any(&value, CODE_KEYWORDS) {
            columns.number = Some(col);
        }
        if columns.name.is_none() && contains_any(&value, NAME_KEYWORDS) && !value.contains("měrná")
        {
            columns.name = Some(col);
        }
        if contains_any(&value, PRICE_KEYWORDS) && !value.contains("dph") {
            let is_total = value.contains("celkem") && !value.contains("cena");
            price_candidates.push((col, is_total));
        }
    }

    columns.price = if prefer_total {
        price_candidates
            .iter()
            .find(|(_, is_total)| *is_total)
            .or_else(|| price_candidates.first())
            .map(|(col, _)| *col)
    } else {
        price_candidates.first().map(|(col, _)| *col)
    };
    columns
}

/// Первая строка в `rows`, текст которой содержит все фразы.
pub fn find_row_with_all(
    sheet: &Sheet,
    rows: std::ops::Range<usize>,
    required: &[&str],
) -> Option<usize> {
    rows.take_while(|idx| *idx < sheet.len()).find(|idx| {
        let text = sheet.row_text(*idx);
        required.iter().all(|target| text.contains(target))
    })
}

#[inline]
pub(crate) fn contains_any(value: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| value.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::Cell;

    fn sheet(rows: Vec<Vec<&str>>) -> Sheet {
        Sheet::new(
            "List1",
            rows.into_iter()
                .map(|row| row.into_iter().map(Cell::from).collect())
                .collect(),
        )
    }

    #[test]
    fn skips_title_block() {
        let table = sheet(vec![
            vec!["Rozpočet stavby"],
            vec!["Akce:", "Rodinný dům Lhota"],
            vec![""],
            vec!["Číslo", "Název", "Cena celkem"],
            vec!["1", "Zemní práce", "1000"],
        ]);
        let header = find_header_row(&table, false).unwrap();
        assert_eq!(header.row, 3);
        assert_eq!(header.columns.number, Some(0));
        assert_eq!(header.columns.name, Some(1));
        assert_eq!(header.columns.price, Some(2));
    }

    #[test]
    fn prefers_total_over_unit_price() {
        let table = sheet(vec![vec![
            "P.č.",
            "Popis",
            "MJ",
            "Jednotková cena",
            "Celkem",
        ]]);
        let plain = find_header_row(&table, false).unwrap();
        assert_eq!(plain.columns.price, Some(3));
        let total = find_header_row(&table, true).unwrap();
        assert_eq!(total.columns.price, Some(4));
    }

    #[test]
    fn ignores_vat_columns_and_unit_names() {
        let table = sheet(vec![vec!["Kód", "Měrná jednotka", "Popis", "DPH celkem"]]);
        let header = find_header_row(&table, false).unwrap();
        assert_eq!(header.columns.name, Some(2));
        assert_eq!(header.columns.price, None);
    }

    #[test]
    fn requires_name_and_one_more_role() {
        let table = sheet(vec![vec!["Popis"], vec!["Cena"]]);
        assert!(find_header_row(&table, false).is_none());
    }

    #[test]
    fn ties_keep_first_row() {
        let table = sheet(vec![
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec!["Kód", "Popis", "Cena"],
            vec!["Kód", "Popis", "Cena"],
        ]);
        assert_eq!(find_header_row(&table, false).unwrap().row, 5);
    }

    #[test]
    fn finds_marker_rows() {
        let table = sheet(vec![vec!["x"], vec!["PČ", "Typ", "Kód", "Popis"]]);
        assert_eq!(find_row_with_all(&table, 0..10, &["pč", "typ", "kód"]), Some(1));
        assert_eq!(find_row_with_all(&table, 0..1, &["pč"]), None);
    }
}
