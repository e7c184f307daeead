//! Сверка родительской и дочерних смет: удаление задвоенных строк раздела и дозаполнение цен.

use crate::types::{ChildBudget, LineItem};
use crate::utils::{codes_match, normalize_code};
use rust_decimal::Decimal;
use tracing::debug;

/// Удаляет из дочерних смет строки, повторяющие строку раздела родительской сметы.
///
/// Дочерняя смета сопоставляется по коду (`1.0` ≡ `1`), строка удаляется при совпадении пары
/// (наименование, нормализованный номер). Сметы, опустевшие после удаления, выбрасываются.
/// Возвращает число удалённых строк.
pub fn deduplicate(parent_items: &[LineItem], child_budgets: &mut Vec<ChildBudget>) -> usize {
    let mut removed = 0;
    child_budgets.retain_mut(|child| {
        if child.number_code.trim().is_empty() {
            return true;
        }
        let sections: Vec<&LineItem> = parent_items
            .iter()
            .filter(|item| !item.number.trim().is_empty())
            .filter(|item| codes_match(&item.number, &child.number_code))
            .collect();
        if sections.is_empty() {
            return true;
        }

        let before = child.items.len();
        child.items.retain(|item| {
            !sections.iter().any(|section| {
                item.name.trim() == section.name.trim()
                    && normalize_code(&item.number) == normalize_code(&section.number)
            })
        });
        let dropped = before - child.items.len();
        if dropped == 0 {
            return true;
        }
        debug!(child = %child.name, dropped, "duplicated section rows removed");
        removed += dropped;
        if child.items.is_empty() {
            debug!(child = %child.name, "child budget emptied and dropped");
            return false;
        }
        true
    });
    removed
}

/// Проставляет нулевым строкам родительской сметы сумму строк соответствующей дочерней сметы.
///
/// Дочерняя смета ищется по коду, затем по наименованию. Сумма округляется до двух знаков и
/// применяется, только если она положительна. Возвращает число изменённых строк.
pub fn backfill(parent_items: &mut [LineItem], child_budgets: &[ChildBudget]) -> usize {
    let mut filled = 0;
    for item in parent_items.iter_mut().filter(|item| item.price.is_zero()) {
        let matched = child_budgets
            .iter()
            .find(|child| !item.number.trim().is_empty() && codes_match(&child.number_code, &item.number))
            .or_else(|| {
                child_budgets
                    .iter()
                    .find(|child| child.name.trim() == item.name.trim())
            });
        let Some(child) = matched else {
            continue;
        };
        let total = child.total().round_dp(2);
        if total > Decimal::ZERO {
            debug!(number = %item.number, %total, "parent price taken from child budget");
            item.price = total;
            filled += 1;
        }
    }
    filled
}
