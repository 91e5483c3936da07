use crate::core::{CssSelector, PageDriver, TimingConfig};
use crate::errors::Result;
use crate::table::sync::{SpinnerWaiter, SyncOutcome};
use std::time::Duration;
use tracing::{debug, info};

/// Drives the table's free-text filter box.
#[derive(Debug, Clone)]
pub struct FilterController {
    input: CssSelector,
    clear_control: CssSelector,
    settle: Duration,
}

impl FilterController {
    pub fn new(input: CssSelector, clear_control: CssSelector, timing: &TimingConfig) -> Self {
        Self {
            input,
            clear_control,
            settle: timing.filter_settle(),
        }
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle
    }

    /// Replace the filter text with `query` and wait for the table to refresh.
    pub async fn apply<D: PageDriver + ?Sized>(
        &self,
        driver: &D,
        waiter: &SpinnerWaiter,
        query: &str,
    ) -> Result<SyncOutcome> {
        let input = driver.locate(&self.input).await?;
        driver.clear(&input).await?;
        driver.send_keys(&input, query).await?;
        debug!("Typed filter query '{}'", query);

        let outcome = self.settle_then_wait(driver, waiter).await?;
        info!("Filter '{}' applied", query);
        Ok(outcome)
    }

    /// Empty the filter box.
    pub async fn clear<D: PageDriver + ?Sized>(
        &self,
        driver: &D,
        waiter: &SpinnerWaiter,
    ) -> Result<SyncOutcome> {
        let input = driver.locate(&self.input).await?;
        driver.clear(&input).await?;

        let outcome = self.settle_then_wait(driver, waiter).await?;
        info!("Filter cleared");
        Ok(outcome)
    }

    /// Reset the filter through the box's own clear control.
    pub async fn reset<D: PageDriver + ?Sized>(
        &self,
        driver: &D,
        waiter: &SpinnerWaiter,
    ) -> Result<SyncOutcome> {
        let control = driver.locate(&self.clear_control).await?;
        driver.click(&control).await?;

        let outcome = self.settle_then_wait(driver, waiter).await?;
        info!("Filter reset via clear control");
        Ok(outcome)
    }

    async fn settle_then_wait<D: PageDriver + ?Sized>(
        &self,
        driver: &D,
        waiter: &SpinnerWaiter,
    ) -> Result<SyncOutcome> {
        // Debounced input may not start the spinner right away
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
        waiter.settle(driver).await
    }
}
