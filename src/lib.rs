#![warn(missing_docs)]
//! Библиотека для извлечения иерархии смет (родительская смета и дочерние сметы разделов)
//! из чешских строительных таблиц: «Stavba», «Rekapitulace» и «Soupis prací».

mod budget_set;
mod child_sheet;
mod classify;
mod detect;
mod error;
mod extractor;
mod header;
mod meta;
mod raw;
mod reconcile;
mod rekapitulace;
mod soupis;
mod stavba;
mod types;
mod utils;

pub use crate::budget_set::{BudgetFile, BudgetSet, SUPPORTED_EXTENSIONS, is_supported};
pub use crate::child_sheet::parse_child_sheet;
pub use crate::classify::{
    is_item_name, is_subsheet_code, is_valid_name, looks_like_formula_or_continuation,
};
pub use crate::detect::{
    StavbaSheet, find_construction_recap, find_stavba_sheet, has_soupis_markers,
    has_soupis_structure, is_cover_sheet, is_instruction_sheet, is_rekapitulace_table,
    is_rekapitulace_workbook,
};
pub use crate::error::ExtractError;
pub use crate::extractor::{DEFAULT_PROJECT_NAME, Extractor};
pub use crate::header::{ColumnMap, HeaderMatch, find_header_row};
pub use crate::meta::{object_name, project_name};
pub use crate::raw::{Cell, Sheet, Workbook};
pub use crate::reconcile::{backfill, deduplicate};
pub use crate::rekapitulace::parse_rekapitulace_sheet;
pub use crate::types::*;
pub use crate::utils::{cell_price, codes_match, normalize_code, parse_price};
