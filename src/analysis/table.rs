use std::{fs::File, io::Read, path::Path};

use csv::ReaderBuilder;

use crate::{Error, error::io_error};

/// A produced table loaded back for analysis. Cells keep their text; numeric views are derived on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn from_reader(reader: impl Read, delimiter: u8) -> Result<Self, Error> {
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.iter().map(str::to_owned).collect();
        let rows = csv_reader
            .records()
            .map(|record| -> Result<Vec<String>, Error> {
                Ok(record?.iter().map(str::to_owned).collect())
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { headers, rows })
    }

    pub fn from_path(path: &Path, delimiter: u8) -> Result<Self, Error> {
        let file = File::open(path).map_err(|e| io_error(path, e))?;
        Self::from_reader(file, delimiter)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Raw cells of a column, `None` if the table has no such column.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.index_of(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map_or("", String::as_str))
                .collect(),
        )
    }

    /// A column coerced to numbers. Empty or non-numeric cells become `None`.
    pub fn column_f64(&self, name: &str) -> Option<Vec<Option<f64>>> {
        self.column(name)
            .map(|cells| cells.into_iter().map(parse_cell).collect())
    }

    /// Columns whose non-empty cells all parse as numbers.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| {
                self.rows.iter().all(|row| {
                    let cell = row.get(*idx).map_or("", String::as_str);
                    cell.is_empty() || parse_cell(cell).is_some()
                })
            })
            .map(|(_, name)| name.as_str())
            .collect()
    }

    /// Appends a column; `values` must hold one cell per row.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<String>) {
        debug_assert_eq!(values.len(), self.rows.len());
        self.headers.push(name.into());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    pub(crate) fn retain_rows(&mut self, mut keep: impl FnMut(&[String]) -> bool) {
        self.rows.retain(|row| keep(row));
    }

    pub(crate) fn require(&self, name: &str) -> Result<usize, Error> {
        self.index_of(name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }
}

pub(crate) fn parse_cell(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    cell.parse::<f64>().ok().filter(|v| !v.is_nan())
}
