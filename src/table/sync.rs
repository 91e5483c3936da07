use crate::core::{CssSelector, PageDriver, TimingConfig, WaitCondition};
use crate::errors::Result;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The spinner appeared and went away again.
    Settled,
    /// The spinner never rendered within the appear timeout.
    SpinnerNotObserved,
}

/// Waits out the table's loading spinner after a mutating action.
///
/// A spinner that never shows up is not an error: the update may have been
/// synchronous. Only the driver's timeout on the appear phase is absorbed;
/// a bad selector, a dead session, or a spinner that never leaves all
/// propagate.
#[derive(Debug, Clone)]
pub struct SpinnerWaiter {
    spinner: CssSelector,
    appear_timeout: Duration,
    disappear_timeout: Duration,
}

impl SpinnerWaiter {
    pub fn new(spinner: CssSelector, timing: &TimingConfig) -> Self {
        Self {
            spinner,
            appear_timeout: timing.spinner_appear_timeout(),
            disappear_timeout: timing.spinner_disappear_timeout(),
        }
    }

    pub async fn settle<D: PageDriver + ?Sized>(&self, driver: &D) -> Result<SyncOutcome> {
        match driver
            .wait_for(&self.spinner, WaitCondition::Appear, self.appear_timeout)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_timeout() => {
                warn!("Wait spinner '{}' did not appear: {}", self.spinner, e);
                return Ok(SyncOutcome::SpinnerNotObserved);
            }
            Err(e) => return Err(e.into()),
        }

        driver
            .wait_for(&self.spinner, WaitCondition::Disappear, self.disappear_timeout)
            .await?;

        debug!("Wait spinner '{}' cleared", self.spinner);
        Ok(SyncOutcome::Settled)
    }
}
