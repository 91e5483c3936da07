use crate::core::{CssSelector, PageDriver, WaitCondition};
use crate::dom::document::{HtmlDocument, NodePath};
use crate::errors::{DriverError, DriverResult, Result};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Read-only driver over a saved copy of the page markup.
///
/// Supports every lookup the table reads need. Anything that would change
/// the page fails with [`DriverError::Unsupported`].
pub struct SnapshotDriver {
    source: String,
}

impl SnapshotDriver {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Ok(Self::new(source))
    }

    fn with_document<T>(&self, f: impl FnOnce(&HtmlDocument) -> DriverResult<T>) -> DriverResult<T> {
        let document = HtmlDocument::parse(&self.source);
        f(&document)
    }

    fn read_only(operation: &str) -> DriverError {
        DriverError::Unsupported(format!("{} on a static snapshot", operation))
    }
}

#[async_trait]
impl PageDriver for SnapshotDriver {
    type Element = NodePath;

    async fn locate(&self, selector: &CssSelector) -> DriverResult<NodePath> {
        self.with_document(|doc| doc.select_first(None, selector.as_str()))
    }

    async fn locate_all(&self, selector: &CssSelector) -> DriverResult<Vec<NodePath>> {
        self.with_document(|doc| doc.select_all(None, selector.as_str()))
    }

    async fn locate_within(&self, parent: &NodePath, selector: &CssSelector) -> DriverResult<NodePath> {
        self.with_document(|doc| doc.select_first(Some(parent), selector.as_str()))
    }

    async fn text(&self, element: &NodePath) -> DriverResult<String> {
        self.with_document(|doc| doc.text(element))
    }

    async fn attribute(&self, element: &NodePath, name: &str) -> DriverResult<Option<String>> {
        self.with_document(|doc| doc.attribute(element, name))
    }

    async fn click(&self, _element: &NodePath) -> DriverResult<()> {
        Err(Self::read_only("click"))
    }

    async fn send_keys(&self, _element: &NodePath, _text: &str) -> DriverResult<()> {
        Err(Self::read_only("send_keys"))
    }

    async fn clear(&self, _element: &NodePath) -> DriverResult<()> {
        Err(Self::read_only("clear"))
    }

    async fn wait_for(
        &self,
        selector: &CssSelector,
        condition: WaitCondition,
        _timeout: Duration,
    ) -> DriverResult<()> {
        // The markup never changes, so the answer is known immediately.
        let present = self.with_document(|doc| doc.contains(selector.as_str()))?;
        let satisfied = match condition {
            WaitCondition::Appear => present,
            WaitCondition::Disappear => !present,
        };

        if satisfied {
            Ok(())
        } else {
            Err(DriverError::Timeout {
                selector: selector.to_string(),
                condition,
                waited_ms: 0,
            })
        }
    }
}
