use crate::core::{PageDriver, TimingConfig, WaitCondition};
use crate::errors::Result;
use crate::table::selectors::{SelectorCatalog, TableElement};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteState {
    Closed,
    Prompted,
    Loading,
    Committed,
    Cancelled,
    Dismissed,
}

impl DeleteState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DeleteState::Committed | DeleteState::Cancelled | DeleteState::Dismissed
        )
    }

    /// True when the flow ended without deleting the row.
    pub fn row_retained(self) -> bool {
        matches!(self, DeleteState::Cancelled | DeleteState::Dismissed)
    }
}

/// How to leave the confirmation modal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteOutcome {
    #[default]
    Commit,
    Cancel,
    Dismiss,
}

/// The modal opened by a row's delete action, before it has rendered.
pub struct DeleteConfirmation<'a, D: PageDriver> {
    driver: &'a D,
    catalog: &'a SelectorCatalog,
    timeout: Duration,
}

impl<'a, D: PageDriver> DeleteConfirmation<'a, D> {
    pub fn new(driver: &'a D, catalog: &'a SelectorCatalog, timing: &TimingConfig) -> Self {
        Self {
            driver,
            catalog,
            timeout: timing.element_timeout(),
        }
    }

    pub fn state(&self) -> DeleteState {
        DeleteState::Closed
    }

    /// Block until the prompt region is shown.
    pub async fn prompt(self) -> Result<PromptedDelete<'a, D>> {
        self.driver
            .wait_for(
                self.catalog.locate(TableElement::DeletePrompt),
                WaitCondition::Appear,
                self.timeout,
            )
            .await?;
        debug!("Delete prompt is visible");

        Ok(PromptedDelete {
            driver: self.driver,
            catalog: self.catalog,
            timeout: self.timeout,
        })
    }
}

/// A visible delete prompt. Each outcome consumes it, so exactly one is taken.
pub struct PromptedDelete<'a, D: PageDriver> {
    driver: &'a D,
    catalog: &'a SelectorCatalog,
    timeout: Duration,
}

impl<'a, D: PageDriver> PromptedDelete<'a, D> {
    pub fn state(&self) -> DeleteState {
        DeleteState::Prompted
    }

    pub async fn resolve(self, outcome: DeleteOutcome) -> Result<DeleteState> {
        match outcome {
            DeleteOutcome::Commit => self.commit().await,
            DeleteOutcome::Cancel => self.cancel().await,
            DeleteOutcome::Dismiss => self.dismiss().await,
        }
    }

    pub async fn cancel(self) -> Result<DeleteState> {
        self.close_with(TableElement::DeleteCancel).await?;
        info!("Delete cancelled");
        Ok(DeleteState::Cancelled)
    }

    pub async fn dismiss(self) -> Result<DeleteState> {
        self.close_with(TableElement::DeleteClose).await?;
        info!("Delete dialog dismissed");
        Ok(DeleteState::Dismissed)
    }

    /// Confirm and wait through the loading indicator. The caller re-reads
    /// the table to see the row gone.
    pub async fn commit(self) -> Result<DeleteState> {
        let confirm = self
            .driver
            .locate(self.catalog.locate(TableElement::DeleteConfirm))
            .await?;
        self.driver.click(&confirm).await?;

        let loading = self.catalog.locate(TableElement::DeleteLoading);
        self.driver
            .wait_for(loading, WaitCondition::Appear, self.timeout)
            .await?;
        debug!("Delete is {:?}", DeleteState::Loading);
        self.driver
            .wait_for(loading, WaitCondition::Disappear, self.timeout)
            .await?;

        info!("Delete committed");
        Ok(DeleteState::Committed)
    }

    async fn close_with(&self, control: TableElement) -> Result<()> {
        let selector = self.catalog.locate(control);
        let element = self.driver.locate(selector).await?;
        self.driver.click(&element).await?;
        self.driver
            .wait_for(selector, WaitCondition::Disappear, self.timeout)
            .await?;
        Ok(())
    }
}
