//! Декодированная таблица: ячейки, листы, книга и загрузчики из файлов.

use crate::error::ExtractError;
use crate::utils::normalize_chars;
use calamine::{Data, Range, Reader};
use std::io::Read;
use std::path::Path;

/// Значение ячейки после декодирования файла.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    /// Пустая ячейка.
    #[default]
    Empty,
    /// Число.
    Number(f64),
    /// Текст.
    Text(String),
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    /// Текст ячейки со схлопнутыми пробелами и переводами строк; целые числа выводятся без `.0`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                format!("{}", *value as i64)
            }
            Self::Number(value) => format!("{value}"),
            Self::Text(text) => normalize_chars(text.chars()),
        }
    }

    /// Пустая ячейка или текст из одних пробелов.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Number(_) => false,
            Self::Text(text) => text.trim().is_empty(),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&Data> for Cell {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: &Data) -> Self {
        match value {
            Data::Int(v) => Self::Number(*v as f64),
            Data::Float(v) => Self::Number(*v),
            Data::DateTime(v) => Self::Number(v.as_f64()),
            Data::String(v) | Data::DateTimeIso(v) | Data::DurationIso(v) => {
                Self::Text(v.clone())
            }
            Data::Bool(v) => Self::Text(v.to_string()),
            Data::Error(_) | Data::Empty => Self::Empty,
        }
    }
}

/// Лист таблицы: имя и строки ячеек (строки могут быть разной длины).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    /// Имя листа.
    pub name: String,
    /// Строки листа сверху вниз.
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// Создаёт лист из готовых строк.
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Количество строк.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Лист без строк.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Ширина строки `row`.
    #[inline]
    pub fn width(&self, row: usize) -> usize {
        self.rows.get(row).map_or(0, Vec::len)
    }

    /// Ячейка по координатам; за пределами листа возвращает пустую.
    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    /// Текст ячейки по координатам.
    #[inline]
    pub fn text(&self, row: usize, col: usize) -> String {
        self.cell(row, col).text()
    }

    /// Ячейки строки (пустой срез за пределами листа).
    #[inline]
    pub fn row(&self, row: usize) -> &[Cell] {
        self.rows.get(row).map_or(&[], Vec::as_slice)
    }

    /// Непустые ячейки строки в нижнем регистре, склеенные пробелом.
    pub fn row_text(&self, row: usize) -> String {
        join_lower(self.row(row))
    }

    /// Текст первых `rows` строк одной строкой в нижнем регистре.
    pub fn flattened_text(&self, rows: usize) -> String {
        (0..self.len().min(rows))
            .map(|idx| self.row_text(idx))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Перевод диапазона calamine в лист с сохранением абсолютных координат.
    fn from_range(name: &str, range: &Range<Data>) -> Self {
        let (start_row, start_col) = range
            .start()
            .map_or((0, 0), |(r, c)| (r as usize, c as usize));
        let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); start_row];
        for source in range.rows() {
            let mut cells = vec![Cell::Empty; start_col];
            cells.extend(source.iter().map(Cell::from));
            rows.push(cells);
        }
        Self::new(name, rows)
    }
}

/// Склеивает непустые ячейки в нижнем регистре.
pub(crate) fn join_lower(cells: &[Cell]) -> String {
    cells
        .iter()
        .map(Cell::text)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Декодированная книга: упорядоченные листы и имя источника.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    /// Имя источника (обычно имя файла без расширения).
    pub source_name: Option<String>,
    /// Листы в порядке книги.
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Создаёт книгу из листов.
    pub const fn new(sheets: Vec<Sheet>) -> Self {
        Self {
            source_name: None,
            sheets,
        }
    }

    /// Книга из одного листа (CSV или отдельная таблица).
    pub fn single(sheet: Sheet) -> Self {
        Self::new(vec![sheet])
    }

    /// Задаёт имя источника.
    #[must_use]
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    /// Индекс первого листа, имя которого удовлетворяет предикату.
    pub fn position<F>(&self, predicate: F) -> Option<usize>
    where
        F: Fn(&str) -> bool,
    {
        self.sheets.iter().position(|s| predicate(&s.name))
    }

    /// Открывает файл по расширению: CSV через `csv`, остальное через `calamine`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let workbook = match extension.as_str() {
            "csv" => Self::from_csv_reader(std::fs::File::open(path)?, &stem)?,
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => {
                let mut book = calamine::open_workbook_auto(path)?;
                let mut sheets = Vec::new();
                for name in book.sheet_names() {
                    let range = book.worksheet_range(&name)?;
                    sheets.push(Sheet::from_range(&name, &range));
                }
                Self::new(sheets)
            }
            _ => return Err(ExtractError::UnsupportedFormat { extension }),
        };
        Ok(workbook.with_source_name(stem))
    }

    /// Читает CSV без строки заголовков; разделитель определяется по первой строке.
    pub fn from_csv_reader<R: Read>(mut reader: R, sheet_name: &str) -> Result<Self, ExtractError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        let text = text.trim_start_matches('\u{feff}');
        let delimiter = sniff_delimiter(text.lines().next().unwrap_or_default());

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .map(|field| {
                        if field.trim().is_empty() {
                            Cell::Empty
                        } else {
                            Cell::from(field)
                        }
                    })
                    .collect(),
            );
        }
        Ok(Self::single(Sheet::new(sheet_name, rows)))
    }
}

/// Выбирает самый частый разделитель первой строки; `;` побеждает при равенстве.
fn sniff_delimiter(first_line: &str) -> u8 {
    [b';', b'\t', b',']
        .into_iter()
        .map(|d| (d, first_line.bytes().filter(|b| *b == d).count()))
        .fold((b';', 0), |best, candidate| {
            if candidate.1 > best.1 { candidate } else { best }
        })
        .0
}
