use crate::core::PageDriver;
use crate::errors::{DriverError, Result, TableError};
use crate::table::selectors::SelectorCatalog;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Display label -> markup column key, for headers whose label differs
/// from the `col-*` class in the rendered cells.
#[derive(Debug, Clone, Default)]
pub struct HeaderMapping {
    entries: HashMap<String, String>,
}

impl HeaderMapping {
    pub fn new(raw: &HashMap<String, String>) -> Self {
        let entries = raw
            .iter()
            .map(|(label, key)| (label.trim().to_lowercase(), key.trim().to_lowercase()))
            .collect();
        Self { entries }
    }

    /// Lower-cased column key used to build the cell selector.
    pub fn column_key(&self, column: &str) -> String {
        let label = column.trim().to_lowercase();
        match self.entries.get(&label) {
            Some(key) => key.clone(),
            None => label,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub key: String,
    /// Keyed by lower-cased display label.
    pub cells: BTreeMap<String, String>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(&column.trim().to_lowercase()).map(String::as_str)
    }
}

/// Reads cell text out of a located row element.
pub struct RowProjector<'a, D: PageDriver> {
    driver: &'a D,
    catalog: &'a SelectorCatalog,
    mapping: &'a HeaderMapping,
    key_column: &'a str,
}

impl<'a, D: PageDriver> RowProjector<'a, D> {
    pub fn new(
        driver: &'a D,
        catalog: &'a SelectorCatalog,
        mapping: &'a HeaderMapping,
        key_column: &'a str,
    ) -> Self {
        Self {
            driver,
            catalog,
            mapping,
            key_column,
        }
    }

    pub async fn cell(&self, row: &D::Element, column: &str) -> Result<String> {
        let selector = self.catalog.cell(&self.mapping.column_key(column));

        let cell = match self.driver.locate_within(row, &selector).await {
            Ok(cell) => cell,
            Err(DriverError::NotFound(_)) => {
                return Err(TableError::CellNotFound {
                    column: column.to_string(),
                    selector: selector.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        Ok(self.driver.text(&cell).await?)
    }

    pub async fn key(&self, row: &D::Element) -> Result<String> {
        self.cell(row, self.key_column).await
    }

    pub async fn project(&self, row: &D::Element, headers: &[String]) -> Result<Row> {
        let key = self.key(row).await?;
        let mut cells = BTreeMap::new();

        for label in headers {
            let column = label.trim().to_lowercase();
            // Unlabelled headers (the actions column) carry no data cell
            if column.is_empty() {
                continue;
            }
            let value = self.cell(row, &column).await?;
            cells.insert(column, value);
        }

        debug!("Projected row '{}' with {} cells", key, cells.len());
        Ok(Row { key, cells })
    }
}

/// One pass over the rows rendered when the cursor was created.
///
/// Rows are projected as they are pulled. A cursor is invalidated by any
/// sort, filter or delete; ask the table for a fresh one afterwards.
pub struct RowCursor<'a, D: PageDriver> {
    projector: RowProjector<'a, D>,
    headers: Vec<String>,
    rows: std::vec::IntoIter<D::Element>,
}

impl<'a, D: PageDriver> RowCursor<'a, D> {
    pub(crate) fn new(projector: RowProjector<'a, D>, headers: Vec<String>, rows: Vec<D::Element>) -> Self {
        Self {
            projector,
            headers,
            rows: rows.into_iter(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    pub async fn next_row(&mut self) -> Option<Result<Row>> {
        let row = self.rows.next()?;
        Some(self.projector.project(&row, &self.headers).await)
    }

    pub async fn collect(mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::with_capacity(self.remaining());
        while let Some(row) = self.next_row().await {
            rows.push(row?);
        }
        Ok(rows)
    }
}

/// Like [`RowCursor`], for a single column.
pub struct ColumnCursor<'a, D: PageDriver> {
    projector: RowProjector<'a, D>,
    column: String,
    rows: std::vec::IntoIter<D::Element>,
}

impl<'a, D: PageDriver> ColumnCursor<'a, D> {
    pub(crate) fn new(projector: RowProjector<'a, D>, column: &str, rows: Vec<D::Element>) -> Self {
        Self {
            projector,
            column: column.to_string(),
            rows: rows.into_iter(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    pub async fn next_value(&mut self) -> Option<Result<String>> {
        let row = self.rows.next()?;
        Some(self.projector.cell(&row, &self.column).await)
    }

    pub async fn collect(mut self) -> Result<Vec<String>> {
        let mut values = Vec::with_capacity(self.remaining());
        while let Some(value) = self.next_value().await {
            values.push(value?);
        }
        Ok(values)
    }
}
