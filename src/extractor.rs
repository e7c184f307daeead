//! Выбор варианта таблицы, запуск экстрактора и сверка результата.

use crate::detect::{
    SOUPIS_TEXT_SCAN_ROWS, StavbaSheet, find_construction_recap, find_stavba_sheet,
    has_soupis_markers, has_soupis_structure, is_instruction_sheet, is_rekapitulace_workbook,
};
use crate::error::ExtractError;
use crate::raw::{Sheet, Workbook};
use crate::reconcile::{backfill, deduplicate};
use crate::rekapitulace::{extract_rekapitulace, extract_sheet_children};
use crate::soupis::{extract_construction_recap, extract_soupis_sheet};
use crate::stavba::extract_stavba;
use crate::types::{Extraction, ParentBudget, RawExtraction};
use tracing::{debug, info, warn};

/// Название родительской сметы, если его не удалось определить.
pub const DEFAULT_PROJECT_NAME: &str = "Rozpočet";

/// Набор флагов постобработки (внутренний тип).
#[derive(Debug, Clone, Copy)]
pub(crate) struct ExtractOptions {
    pub deduplicate: bool,
    pub backfill: bool,
}

impl ExtractOptions {
    /// Обе стадии сверки включены.
    pub const fn reconciled() -> Self {
        Self {
            deduplicate: true,
            backfill: true,
        }
    }

    /// Сырой результат экстрактора без сверки.
    pub const fn raw() -> Self {
        Self {
            deduplicate: false,
            backfill: false,
        }
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::reconciled()
    }
}

impl Extraction {
    /// Извлекает иерархию смет из книги со сверкой и без переопределения названия.
    #[inline]
    pub fn extract(workbook: &Workbook) -> Self {
        Extractor::new(workbook).extract()
    }
}

/// Builder для извлечения `Extraction` с настройками.
pub struct Extractor<'a> {
    workbook: &'a Workbook,
    project_name: Option<String>,
    options: ExtractOptions,
}

impl<'a> Extractor<'a> {
    /// Создаёт builder для указанной книги.
    ///
    /// # Пример
    ///
    /// ```
    /// # use rozpocet_extract::{Extractor, Sheet, Workbook};
    /// # let workbook = Workbook::single(Sheet::new("List1", Vec::new()));
    /// let extraction = Extractor::new(&workbook)
    ///     .project_name("Bytový dům")
    ///     .backfill(false)
    ///     .extract();
    /// assert_eq!(extraction.parent_budget.name, "Bytový dům");
    /// ```
    #[inline]
    pub fn new(workbook: &'a Workbook) -> Self {
        Self {
            workbook,
            project_name: None,
            options: ExtractOptions::default(),
        }
    }

    /// Название проекта, которое важнее найденного в таблице.
    #[inline]
    pub fn project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = Some(name.into());
        self
    }

    /// Включает или отключает удаление задвоенных строк раздела.
    #[inline]
    pub const fn deduplicate(mut self, enabled: bool) -> Self {
        self.options.deduplicate = enabled;
        self
    }

    /// Включает или отключает дозаполнение нулевых цен разделов.
    #[inline]
    pub const fn backfill(mut self, enabled: bool) -> Self {
        self.options.backfill = enabled;
        self
    }

    /// Отключает обе стадии сверки.
    #[inline]
    pub const fn raw(mut self) -> Self {
        self.options = ExtractOptions::raw();
        self
    }

    /// Запускает извлечение. Нераспознанная книга даёт пустой результат, а не ошибку.
    pub fn extract(self) -> Extraction {
        let mut raw = dispatch(self.workbook);
        if self.options.deduplicate {
            deduplicate(&raw.parent_items, &mut raw.child_budgets);
        }
        if self.options.backfill {
            backfill(&mut raw.parent_items, &raw.child_budgets);
        }

        let name = self
            .project_name
            .or(raw.project_name)
            .or_else(|| self.workbook.source_name.clone())
            .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string());

        let extraction = Extraction {
            kind: raw.kind,
            parent_budget: ParentBudget {
                name,
                items: raw.parent_items,
                total_price: raw.total_price,
            },
            child_budgets: raw.child_budgets,
        };
        if extraction.is_empty() {
            warn!(source = ?self.workbook.source_name, "nothing extracted");
        } else {
            info!(
                kind = ?extraction.kind,
                parent_items = extraction.parent_budget.items.len(),
                child_budgets = extraction.child_budgets.len(),
                child_items = extraction.child_item_count(),
                "extraction finished"
            );
        }
        extraction
    }
}

/// Перебирает варианты в порядке приоритета и возвращает первый непустой результат.
fn dispatch(workbook: &Workbook) -> RawExtraction {
    let stavba = find_stavba_sheet(workbook);
    if let Some(StavbaSheet::Named(_)) = stavba
        && let Some(result) = accept("type1", Ok(extract_stavba(workbook)))
    {
        return result;
    }

    for sheet in soupis_candidates(workbook).filter(|sheet| has_soupis_structure(sheet)) {
        if let Some(result) = accept("type3 structural", extract_soupis_sheet(sheet)) {
            return result;
        }
    }

    if let Some(idx) = find_construction_recap(workbook)
        && let Some(result) = accept(
            "type3 construction recap",
            extract_construction_recap(workbook, idx),
        )
    {
        return result;
    }

    for sheet in soupis_candidates(workbook)
        .filter(|sheet| has_soupis_markers(sheet, SOUPIS_TEXT_SCAN_ROWS))
    {
        if let Some(result) = accept("type3 markers", extract_soupis_sheet(sheet)) {
            return result;
        }
    }

    // Маркер сводки объектов проверяется до варианта 2, кроме книг Rekapitulace.
    if let Some(StavbaSheet::Marker(_)) = stavba
        && !is_rekapitulace_workbook(workbook)
        && let Some(result) = accept("type1 marker", Ok(extract_stavba(workbook)))
    {
        return result;
    }

    if let Some(result) = accept("type2", Ok(extract_rekapitulace(workbook))) {
        return result;
    }

    if let Some(result) = accept("type2 sheets", Ok(extract_sheet_children(workbook))) {
        return result;
    }

    info!("no variant matched, falling back to type1");
    extract_stavba(workbook)
}

fn soupis_candidates(workbook: &Workbook) -> impl Iterator<Item = &Sheet> {
    workbook
        .sheets
        .iter()
        .filter(|sheet| !is_instruction_sheet(sheet))
}

/// Результат варианта, если он пригоден. Ошибки пишутся в лог и не прерывают перебор.
fn accept(variant: &str, result: Result<RawExtraction, ExtractError>) -> Option<RawExtraction> {
    match result {
        Ok(raw) if raw.is_usable() => {
            info!(variant, "workbook recognized");
            Some(raw)
        }
        Ok(_) => {
            debug!(variant, "variant produced nothing");
            None
        }
        Err(err) => {
            warn!(variant, "variant failed: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::Cell;
    use crate::types::BudgetKind;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn row(values: &[&str]) -> Vec<Cell> {
        values
            .iter()
            .map(|v| if v.is_empty() { Cell::Empty } else { Cell::from(*v) })
            .collect()
    }

    fn rekapitulace() -> Workbook {
        Workbook::single(Sheet::new(
            "List1",
            vec![
                row(&["Pozice", "Popis", "Cena"]),
                row(&["1", "Earthworks", "0"]),
                row(&["", "Excavation", "5000"]),
            ],
        ))
    }

    #[test]
    fn override_beats_inferred_and_source_names() {
        let book = rekapitulace().with_source_name("soubor");
        assert_eq!(Extraction::extract(&book).parent_budget.name, "soubor");
        let named = Extractor::new(&book).project_name("Můj projekt").extract();
        assert_eq!(named.parent_budget.name, "Můj projekt");
        assert_eq!(
            Extraction::extract(&rekapitulace()).parent_budget.name,
            DEFAULT_PROJECT_NAME
        );
    }

    #[test]
    fn raw_mode_skips_reconciliation() {
        let book = rekapitulace();
        let raw = Extractor::new(&book).raw().extract();
        assert_eq!(raw.kind, BudgetKind::Type2);
        assert_eq!(raw.parent_budget.items[0].price, Decimal::ZERO);
        let reconciled = Extraction::extract(&book);
        assert_eq!(reconciled.parent_budget.items[0].price, dec!(5000));
    }

    #[test]
    fn unrecognized_workbook_is_empty_type1() {
        let book = Workbook::single(Sheet::new("List1", vec![row(&["a", "b"]), row(&["c", "d"])]));
        let extraction = Extraction::extract(&book);
        assert_eq!(extraction.kind, BudgetKind::Type1);
        assert!(extraction.is_empty());
    }

    #[test]
    fn instruction_sheets_are_ignored_for_soupis() {
        let mut rows = vec![row(&["PČ", "Typ", "", "", "Kód", "Popis", "", "", "", "Cena celkem [CZK]"])];
        rows.push(row(&["", "D", "", "", "1", "Zemní práce", "", "", "", "100"]));
        rows.push(row(&["1", "K", "", "", "11", "Výkop", "", "", "", "100"]));
        let book = Workbook::new(vec![Sheet::new("Pokyny pro vyplnění", rows)]);
        assert!(Extraction::extract(&book).is_empty());
    }
}
