use crate::core::PageDriver;
use crate::errors::Result;
use crate::table::selectors::{SelectorCatalog, TableElement};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Entries of the per-row action dropdown that the table drives directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Edit,
    Clone,
    Delete,
}

impl RowAction {
    fn trigger(self) -> TableElement {
        match self {
            RowAction::Edit => TableElement::EditTrigger,
            RowAction::Clone => TableElement::CloneTrigger,
            RowAction::Delete => TableElement::DeleteTrigger,
        }
    }
}

impl fmt::Display for RowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowAction::Edit => f.write_str("edit"),
            RowAction::Clone => f.write_str("clone"),
            RowAction::Delete => f.write_str("delete"),
        }
    }
}

/// An opened action dropdown. Only valid until the next click on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionMenu {
    pub is_open: bool,
    pub action_labels: Vec<String>,
}

impl ActionMenu {
    pub fn has_action(&self, label: &str) -> bool {
        self.action_labels
            .iter()
            .any(|l| l.eq_ignore_ascii_case(label.trim()))
    }
}

/// Opens a row's dropdown and clicks its entries.
///
/// The trigger lives inside the row; the menu itself is a page-level
/// overlay and is looked up outside the row.
pub struct ActionMenuProtocol<'a, D: PageDriver> {
    driver: &'a D,
    catalog: &'a SelectorCatalog,
}

impl<'a, D: PageDriver> ActionMenuProtocol<'a, D> {
    pub fn new(driver: &'a D, catalog: &'a SelectorCatalog) -> Self {
        Self { driver, catalog }
    }

    pub async fn open(&self, row: &D::Element) -> Result<ActionMenu> {
        let toggle = self
            .driver
            .locate_within(row, self.catalog.locate(TableElement::ActionTrigger))
            .await?;
        self.driver.click(&toggle).await?;

        let items = self
            .driver
            .locate_all(self.catalog.locate(TableElement::ActionMenuItems))
            .await?;

        let mut action_labels = Vec::with_capacity(items.len());
        for item in &items {
            action_labels.push(self.driver.text(item).await?);
        }

        debug!("Action menu opened with {:?}", action_labels);
        Ok(ActionMenu {
            is_open: true,
            action_labels,
        })
    }

    pub async fn trigger(&self, row: &D::Element, action: RowAction) -> Result<()> {
        self.open(row).await?;

        let entry = self
            .driver
            .locate(self.catalog.locate(action.trigger()))
            .await?;
        self.driver.click(&entry).await?;

        debug!("Clicked '{}' in the action menu", action);
        Ok(())
    }
}
