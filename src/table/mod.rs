//! Page object for a paginated, sortable, filterable data table.
//!
//! Every operation re-reads rows and headers from the page. Values returned
//! before a sort, filter or delete describe the old render and must be
//! fetched again afterwards.

pub mod actions;
pub mod delete;
pub mod filter;
pub mod row;
pub mod selectors;
pub mod sort;
pub mod sync;

pub use actions::{ActionMenu, ActionMenuProtocol, RowAction};
pub use delete::{DeleteConfirmation, DeleteOutcome, DeleteState, PromptedDelete};
pub use filter::FilterController;
pub use row::{ColumnCursor, HeaderMapping, Row, RowCursor, RowProjector};
pub use selectors::{SelectorCatalog, TableElement};
pub use sort::{SortController, SortDirection, SortOrder, SortState, SortSurface, SortTokens};
pub use sync::{SpinnerWaiter, SyncOutcome};

use crate::core::{Config, PageDriver, TimingConfig};
use crate::errors::{DriverError, Result, TableError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

pub type TableMap = BTreeMap<String, BTreeMap<String, String>>;

pub struct Table<D: PageDriver> {
    driver: Arc<D>,
    catalog: SelectorCatalog,
    mapping: HeaderMapping,
    tokens: SortTokens,
    waiter: SpinnerWaiter,
    filter_box: FilterController,
    sorter: SortController,
    timing: TimingConfig,
    key_column: String,
}

impl<D: PageDriver> Table<D> {
    pub fn new(driver: Arc<D>, container: &str, config: &Config) -> Result<Self> {
        let layout = &config.layout;
        let catalog = SelectorCatalog::new(container, layout)?;

        let key_column = layout.key_column.trim().to_lowercase();
        if key_column.is_empty() {
            return Err(TableError::InvalidLayout("key column is empty".to_string()));
        }

        let tokens = SortTokens::new(&layout.ascending_token, &layout.descending_token)?;
        let waiter = SpinnerWaiter::new(
            catalog.locate(TableElement::Spinner).clone(),
            &config.timing,
        );
        let filter_box = FilterController::new(
            catalog.locate(TableElement::FilterInput).clone(),
            catalog.locate(TableElement::FilterClear).clone(),
            &config.timing,
        );

        Ok(Self {
            driver,
            mapping: HeaderMapping::new(&config.header_mapping),
            catalog,
            tokens,
            waiter,
            filter_box,
            sorter: SortController::new(),
            timing: config.timing.clone(),
            key_column,
        })
    }

    /// Default layout and timing with a header mapping.
    pub fn with_mapping(
        driver: Arc<D>,
        container: &str,
        mapping: HashMap<String, String>,
    ) -> Result<Self> {
        let config = Config {
            header_mapping: mapping,
            ..Default::default()
        };
        Self::new(driver, container, &config)
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn catalog(&self) -> &SelectorCatalog {
        &self.catalog
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    fn projector(&self) -> RowProjector<'_, D> {
        RowProjector::new(&*self.driver, &self.catalog, &self.mapping, &self.key_column)
    }

    /// Text of the table's count label, e.g. "2 Inputs".
    pub async fn count_label(&self) -> Result<String> {
        let label = self
            .driver
            .locate(self.catalog.locate(TableElement::CountLabel))
            .await?;
        Ok(self.driver.text(&label).await?)
    }

    /// Like [`count_label`](Self::count_label), but `None` for a table that
    /// renders no count label. Other failures still propagate.
    pub async fn try_count_label(&self) -> Result<Option<String>> {
        match self.count_label().await {
            Ok(label) => Ok(Some(label)),
            Err(TableError::Driver(DriverError::NotFound(_))) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn row_count(&self) -> Result<usize> {
        let rows = self
            .driver
            .locate_all(self.catalog.locate(TableElement::Rows))
            .await?;
        Ok(rows.len())
    }

    /// Header labels in column order.
    pub async fn headers(&self) -> Result<Vec<String>> {
        let headers = self
            .driver
            .locate_all(self.catalog.locate(TableElement::Header))
            .await?;

        let mut labels = Vec::with_capacity(headers.len());
        for header in &headers {
            labels.push(self.driver.text(header).await?);
        }
        Ok(labels)
    }

    /// The first header whose class marks it as sorted.
    ///
    /// Derived from CSS classes only; a table that never marks its sort
    /// column reports `None` even when its rows are ordered.
    pub async fn current_sort(&self) -> Result<Option<SortOrder>> {
        let headers = self
            .driver
            .locate_all(self.catalog.locate(TableElement::Header))
            .await?;

        for header in &headers {
            let class = self.driver.attribute(header, "class").await?;
            let ascending = match self.tokens.state_of(class.as_deref()) {
                SortState::Unsorted => continue,
                SortState::Ascending => true,
                SortState::Descending => false,
            };
            let label = self.driver.text(header).await?;
            return Ok(Some(SortOrder {
                header: label.trim().to_lowercase(),
                ascending,
            }));
        }

        Ok(None)
    }

    /// Sort by `column` (matched case-insensitively against header labels).
    /// Returns the number of header clicks issued.
    pub async fn sort_by(&self, column: &str, ascending: bool) -> Result<usize> {
        let mut surface = HeaderSurface { table: self };
        self.sorter
            .reach(&mut surface, column, SortDirection::from_ascending(ascending))
            .await
    }

    /// Every rendered row as `key -> (lower-cased label -> text)`.
    pub async fn table(&self) -> Result<TableMap> {
        let mut cursor = self.rows().await?;
        let mut table = TableMap::new();

        while let Some(row) = cursor.next_row().await {
            let row = row?;
            if table.contains_key(&row.key) {
                return Err(TableError::DuplicateRowKey(row.key));
            }
            table.insert(row.key, row.cells);
        }

        debug!("Read table with {} rows", table.len());
        Ok(table)
    }

    pub async fn rows(&self) -> Result<RowCursor<'_, D>> {
        let headers = self.headers().await?;
        let rows = self
            .driver
            .locate_all(self.catalog.locate(TableElement::Rows))
            .await?;
        Ok(RowCursor::new(self.projector(), headers, rows))
    }

    pub async fn row(&self, key: &str) -> Result<Row> {
        let headers = self.headers().await?;
        let row = self.find_row(key).await?;
        self.projector().project(&row, &headers).await
    }

    pub async fn cell(&self, key: &str, column: &str) -> Result<String> {
        let row = self.find_row(key).await?;
        self.projector().cell(&row, column).await
    }

    pub async fn column_values(&self, column: &str) -> Result<ColumnCursor<'_, D>> {
        let rows = self
            .driver
            .locate_all(self.catalog.locate(TableElement::Rows))
            .await?;
        Ok(ColumnCursor::new(self.projector(), column, rows))
    }

    pub async fn open_actions(&self, key: &str) -> Result<ActionMenu> {
        let row = self.find_row(key).await?;
        self.menu().open(&row).await
    }

    /// Labels of the row's action dropdown. Leaves the dropdown open.
    pub async fn actions(&self, key: &str) -> Result<Vec<String>> {
        Ok(self.open_actions(key).await?.action_labels)
    }

    /// Open the edit form for a row. The form is driven elsewhere.
    pub async fn edit_row(&self, key: &str) -> Result<()> {
        let row = self.find_row(key).await?;
        self.menu().trigger(&row, RowAction::Edit).await
    }

    /// Open the clone form for a row. The form is driven elsewhere.
    pub async fn clone_row(&self, key: &str) -> Result<()> {
        let row = self.find_row(key).await?;
        self.menu().trigger(&row, RowAction::Clone).await
    }

    pub async fn delete_row(&self, key: &str, outcome: DeleteOutcome) -> Result<DeleteState> {
        let row = self.find_row(key).await?;
        self.menu().trigger(&row, RowAction::Delete).await?;

        let state = DeleteConfirmation::new(&*self.driver, &self.catalog, &self.timing)
            .prompt()
            .await?
            .resolve(outcome)
            .await?;

        info!("Delete of row '{}' ended {:?}", key, state);
        Ok(state)
    }

    /// Apply a filter and return the key column of the rows left.
    pub async fn filter(&self, query: &str) -> Result<ColumnCursor<'_, D>> {
        self.filter_box.apply(&*self.driver, &self.waiter, query).await?;
        self.column_values(&self.key_column).await
    }

    pub async fn clear_filter(&self) -> Result<()> {
        self.filter_box.clear(&*self.driver, &self.waiter).await?;
        Ok(())
    }

    /// Like [`clear_filter`](Self::clear_filter), through the clear control.
    pub async fn reset_filter(&self) -> Result<()> {
        self.filter_box.reset(&*self.driver, &self.waiter).await?;
        Ok(())
    }

    fn menu(&self) -> ActionMenuProtocol<'_, D> {
        ActionMenuProtocol::new(&*self.driver, &self.catalog)
    }

    async fn find_row(&self, key: &str) -> Result<D::Element> {
        let rows = self
            .driver
            .locate_all(self.catalog.locate(TableElement::Rows))
            .await?;

        let projector = self.projector();
        for row in rows {
            if projector.key(&row).await? == key {
                return Ok(row);
            }
        }

        Err(TableError::RowNotFound(key.to_string()))
    }

    async fn find_header(&self, column: &str) -> Result<D::Element> {
        let wanted = column.trim().to_lowercase();
        let headers = self
            .driver
            .locate_all(self.catalog.locate(TableElement::Header))
            .await?;

        for header in headers {
            if self.driver.text(&header).await?.trim().to_lowercase() == wanted {
                return Ok(header);
            }
        }

        Err(TableError::HeaderNotFound(column.to_string()))
    }
}

/// The live header set as seen by the sort state machine.
struct HeaderSurface<'t, D: PageDriver> {
    table: &'t Table<D>,
}

#[async_trait]
impl<'t, D: PageDriver> SortSurface for HeaderSurface<'t, D> {
    async fn observe(&mut self, column: &str) -> Result<SortState> {
        let header = self.table.find_header(column).await?;
        let class = self.table.driver.attribute(&header, "class").await?;
        Ok(self.table.tokens.state_of(class.as_deref()))
    }

    async fn advance(&mut self, column: &str) -> Result<()> {
        let header = self.table.find_header(column).await?;
        self.table.driver.click(&header).await?;
        debug!("Clicked header '{}'", column);
        self.table.waiter.settle(&*self.table.driver).await?;
        Ok(())
    }
}
