//! Пакетное извлечение смет из каталога.

use crate::error::ExtractError;
use crate::extractor::Extractor;
use crate::raw::Workbook;
use crate::types::{BudgetKind, Extraction};
use serde::Serialize;
use std::fs::{self, DirEntry};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Расширения файлов, которые умеет читать [`Workbook::open`].
pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Результат извлечения одного файла.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetFile {
    /// Путь к исходному файлу.
    pub path: PathBuf,
    /// Извлечённая иерархия.
    pub extraction: Extraction,
}

/// Набор извлечённых смет.
#[derive(Debug, Clone, Default)]
pub struct BudgetSet {
    /// Файлы в порядке сортировки путей.
    pub files: Vec<BudgetFile>,
}

impl BudgetSet {
    /// Загружает и извлекает все поддерживаемые файлы каталога с настройками по умолчанию.
    #[inline]
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, ExtractError> {
        Self::from_dir_with(dir, |builder| builder.extract())
    }

    /// Загружает все поддерживаемые файлы каталога, позволяя настроить builder.
    ///
    /// # Пример
    ///
    /// ```no_run
    /// # use rozpocet_extract::BudgetSet;
    /// let set = BudgetSet::from_dir_with("rozpocty", |builder| builder.raw().extract()).unwrap();
    /// println!("{} files", set.files.len());
    /// ```
    pub fn from_dir_with<P, F>(dir: P, mut extract_fn: F) -> Result<Self, ExtractError>
    where
        P: AsRef<Path>,
        for<'a> F: FnMut(Extractor<'a>) -> Extraction,
    {
        let mut entries: Vec<_> = fs::read_dir(dir)?
            .filter_map(std::result::Result::ok)
            .collect();
        entries.sort_by_key(DirEntry::path);

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.path();
            if !path.is_file() || !is_supported(&path) {
                continue;
            }
            debug!(path = %path.display(), "loading workbook");
            let workbook = Workbook::open(&path)?;
            let extraction = extract_fn(Extractor::new(&workbook));
            files.push(BudgetFile { path, extraction });
        }

        Ok(Self { files })
    }

    /// Файлы, распознанные как указанный вариант.
    #[inline]
    pub fn by_kind(&self, kind: BudgetKind) -> impl Iterator<Item = &BudgetFile> {
        self.files
            .iter()
            .filter(move |file| file.extraction.kind == kind && !file.extraction.is_empty())
    }

    /// Файлы, из которых ничего не извлечено.
    pub fn empty(&self) -> impl Iterator<Item = &BudgetFile> {
        self.files.iter().filter(|file| file.extraction.is_empty())
    }
}

/// Расширение файла входит в [`SUPPORTED_EXTENSIONS`] (без учёта регистра).
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_extensions_ignore_case() {
        assert!(is_supported(Path::new("a/rozpocet.XLSX")));
        assert!(is_supported(Path::new("rekap.csv")));
        assert!(!is_supported(Path::new("poznamky.txt")));
        assert!(!is_supported(Path::new("bez_pripony")));
    }
}
