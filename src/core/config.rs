use crate::errors::{Result, TableError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: BrowserConfig,
    pub session: SessionConfig,
    pub timing: TimingConfig,
    pub layout: TableLayout,
    /// Display label -> markup column key, e.g. `{"status": "disabled"}`.
    pub header_mapping: HashMap<String, String>,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.session.launch_attempts == 0 {
            return Err(TableError::Config(
                "session.launch_attempts must be at least 1".to_string(),
            ));
        }
        if self.layout.ascending_token.trim().is_empty()
            || self.layout.descending_token.trim().is_empty()
        {
            return Err(TableError::Config("sort tokens must not be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub viewport: Viewport,
    pub user_agent: Option<String>,
    pub args: Vec<String>,
    pub navigation_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub launch_attempts: u32,
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub spinner_appear_timeout_ms: u64,
    pub spinner_disappear_timeout_ms: u64,
    pub element_timeout_ms: u64,
    /// Fixed pause after typing into the filter box, before the spinner wait.
    /// Covers client-side debounce that the spinner does not signal.
    pub filter_settle_ms: u64,
}

impl TimingConfig {
    pub fn spinner_appear_timeout(&self) -> Duration {
        Duration::from_millis(self.spinner_appear_timeout_ms)
    }

    pub fn spinner_disappear_timeout(&self) -> Duration {
        Duration::from_millis(self.spinner_disappear_timeout_ms)
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }

    pub fn filter_settle(&self) -> Duration {
        Duration::from_millis(self.filter_settle_ms)
    }

    /// Zero waits everywhere; for drivers that update synchronously.
    pub fn immediate() -> Self {
        Self {
            spinner_appear_timeout_ms: 0,
            spinner_disappear_timeout_ms: 0,
            element_timeout_ms: 0,
            filter_settle_ms: 0,
        }
    }
}

/// Marker classes and fixed selectors of the rendered grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableLayout {
    pub row_class: String,
    pub action_toggle_class: String,
    pub open_menu: String,
    pub edit_trigger: String,
    pub clone_trigger: String,
    pub delete_trigger: String,
    pub modal_root: String,
    pub delete_prompt: String,
    pub delete_confirm: String,
    pub delete_cancel: String,
    pub delete_close: String,
    pub delete_loading: String,
    pub spinner_class: String,
    pub count_class: String,
    pub search_class: String,
    pub clear_class: String,
    pub ascending_token: String,
    pub descending_token: String,
    pub key_column: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Viewport::default(),
            user_agent: None,
            args: vec![],
            navigation_timeout_ms: 30000,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 768,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            launch_attempts: 3,
            retry_backoff_ms: 1000,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            spinner_appear_timeout_ms: 2000,
            spinner_disappear_timeout_ms: 20000,
            element_timeout_ms: 20000,
            filter_settle_ms: 1000,
        }
    }
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            row_class: "apps-table-tablerow".to_string(),
            action_toggle_class: "dropdown-toggle".to_string(),
            open_menu: ".dropdown-menu.open".to_string(),
            edit_trigger: "a.edit".to_string(),
            clone_trigger: "a.clone".to_string(),
            delete_trigger: "a.delete".to_string(),
            modal_root: ".modal-dialog".to_string(),
            delete_prompt: "div.delete-prompt".to_string(),
            delete_confirm: ".submit-btn".to_string(),
            delete_cancel: ".cancel-btn".to_string(),
            delete_close: "button.close".to_string(),
            delete_loading: ".msg-loading".to_string(),
            spinner_class: "shared-waitspinner".to_string(),
            count_class: "shared-collectioncount".to_string(),
            search_class: "search-query".to_string(),
            clear_class: "control-clear".to_string(),
            ascending_token: "asc".to_string(),
            descending_token: "desc".to_string(),
            key_column: "name".to_string(),
        }
    }
}
