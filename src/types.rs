//! Доменные типы: строки сметы, родительская и дочерние сметы, результат извлечения.

use rust_decimal::Decimal;
use serde::Serialize;

/// Денежное значение, используем `Decimal` для точных расчётов.
pub type Money = Decimal;

/// Вариант входной таблицы, по которому построен результат.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BudgetKind {
    /// Книга с листом «Stavba» и листами объектов.
    #[serde(rename = "type1")]
    Type1,
    /// Таблица «Rekapitulace» (Pozice / Popis / Cena).
    #[serde(rename = "type2")]
    Type2,
    /// Soupis prací с блоками D/K (KROS, Unistav).
    #[serde(rename = "type3")]
    Type3,
}

/// Строка сметы.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    /// Код или позиция (может быть пустым).
    pub number: String,
    /// Наименование.
    pub name: String,
    /// Цена.
    pub price: Money,
    /// Признак заголовка раздела.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_section_header: Option<bool>,
}

impl LineItem {
    /// Создаёт обычную строку без признака раздела.
    pub fn new(number: impl Into<String>, name: impl Into<String>, price: Money) -> Self {
        Self {
            number: number.into(),
            name: name.into(),
            price,
            is_section_header: None,
        }
    }

    /// Создаёт строку с явным признаком раздела.
    pub fn section(
        number: impl Into<String>,
        name: impl Into<String>,
        price: Money,
        is_header: bool,
    ) -> Self {
        Self {
            is_section_header: Some(is_header),
            ..Self::new(number, name, price)
        }
    }
}

/// Родительская (сводная) смета.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentBudget {
    /// Название проекта.
    pub name: String,
    /// Разделы верхнего уровня.
    pub items: Vec<LineItem>,
    /// Итог по смете, если он указан в таблице.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<Money>,
}

/// Дочерняя смета одного раздела.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildBudget {
    /// Название раздела.
    pub name: String,
    /// Код раздела, совпадающий с `number` строки родительской сметы.
    pub number_code: String,
    /// Детальные строки.
    pub items: Vec<LineItem>,
}

impl ChildBudget {
    /// Сумма цен всех строк.
    pub fn total(&self) -> Money {
        self.items.iter().map(|item| item.price).sum()
    }
}

/// Итог извлечения одной таблицы.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    /// Распознанный вариант.
    #[serde(rename = "type")]
    pub kind: BudgetKind,
    /// Родительская смета.
    pub parent_budget: ParentBudget,
    /// Дочерние сметы.
    pub child_budgets: Vec<ChildBudget>,
}

impl Extraction {
    /// `true`, если не извлечено ни одной строки и ни одной дочерней сметы.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parent_budget.items.is_empty() && self.child_budgets.is_empty()
    }

    /// Общее количество строк во всех дочерних сметах.
    pub fn child_item_count(&self) -> usize {
        self.child_budgets.iter().map(|child| child.items.len()).sum()
    }
}

/// Сырой результат экстрактора до сверки.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawExtraction {
    pub kind: BudgetKind,
    pub project_name: Option<String>,
    pub parent_items: Vec<LineItem>,
    pub total_price: Option<Money>,
    pub child_budgets: Vec<ChildBudget>,
}

impl RawExtraction {
    pub const fn new(kind: BudgetKind) -> Self {
        Self {
            kind,
            project_name: None,
            parent_items: Vec::new(),
            total_price: None,
            child_budgets: Vec::new(),
        }
    }

    /// Есть ли что-то, что можно отдать вызывающему.
    #[inline]
    pub fn is_usable(&self) -> bool {
        !self.parent_items.is_empty() || !self.child_budgets.is_empty()
    }
}
