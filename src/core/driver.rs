use crate::errors::DriverResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A CSS selector string handed to the driver as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CssSelector(String);

impl CssSelector {
    pub fn new(css: impl Into<String>) -> Self {
        Self(css.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CssSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CssSelector {
    fn from(css: &str) -> Self {
        Self::new(css)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitCondition {
    Appear,
    Disappear,
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitCondition::Appear => f.write_str("appear"),
            WaitCondition::Disappear => f.write_str("disappear"),
        }
    }
}

/// Element-level capabilities of a remote browser session.
///
/// Implementations own element location and interaction; the table layer
/// never keeps an `Element` past a single logical operation.
#[async_trait]
pub trait PageDriver: Send + Sync {
    type Element: Clone + Send + Sync;

    /// Locate the first element matching `selector` in the document.
    async fn locate(&self, selector: &CssSelector) -> DriverResult<Self::Element>;

    /// Locate every element matching `selector`, in document order.
    async fn locate_all(&self, selector: &CssSelector) -> DriverResult<Vec<Self::Element>>;

    /// Locate the first descendant of `parent` matching `selector`.
    async fn locate_within(
        &self,
        parent: &Self::Element,
        selector: &CssSelector,
    ) -> DriverResult<Self::Element>;

    async fn text(&self, element: &Self::Element) -> DriverResult<String>;

    async fn attribute(&self, element: &Self::Element, name: &str) -> DriverResult<Option<String>>;

    async fn click(&self, element: &Self::Element) -> DriverResult<()>;

    async fn send_keys(&self, element: &Self::Element, text: &str) -> DriverResult<()>;

    async fn clear(&self, element: &Self::Element) -> DriverResult<()>;

    /// Block until `selector` appears or disappears.
    ///
    /// Must return [`DriverError::Timeout`](crate::errors::DriverError::Timeout)
    /// when the condition is not met in time, and no other variant for that case.
    async fn wait_for(
        &self,
        selector: &CssSelector,
        condition: WaitCondition,
        timeout: Duration,
    ) -> DriverResult<()>;
}
