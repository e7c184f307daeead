//! Ошибки загрузки таблиц и структурного разбора смет.

/// Ошибка загрузки или разбора сметы.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    /// Ошибка ввода-вывода при чтении исходного файла.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Книга Excel/ODS не открылась или лист не прочитался.
    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::Error),
    /// Ошибка чтения CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// Расширение файла не поддерживается загрузчиком.
    #[error("Unsupported file extension '{extension}'")]
    UnsupportedFormat {
        /// Расширение файла (может быть пустым).
        extension: String,
    },
    /// В найденной шапке нет обязательного столбца.
    #[error("Column '{column}' not found in header of sheet '{sheet}'")]
    MissingColumn {
        /// Имя листа.
        sheet: String,
        /// Роль столбца.
        column: &'static str,
    },
    /// Лист не соответствует ожидаемой структуре варианта.
    #[error("Unexpected structure in sheet '{sheet}': {reason}")]
    Structure {
        /// Имя листа.
        sheet: String,
        /// Описание нарушения.
        reason: String,
    },
}
