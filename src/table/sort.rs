use crate::errors::{Result, TableError};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortState {
    Unsorted,
    Ascending,
    Descending,
}

impl fmt::Display for SortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortState::Unsorted => f.write_str("unsorted"),
            SortState::Ascending => f.write_str("ascending"),
            SortState::Descending => f.write_str("descending"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        }
    }

    pub fn is_ascending(self) -> bool {
        self == SortDirection::Ascending
    }

    pub fn state(self) -> SortState {
        match self {
            SortDirection::Ascending => SortState::Ascending,
            SortDirection::Descending => SortState::Descending,
        }
    }
}

/// The header currently driving row order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortOrder {
    /// Lower-cased header label.
    pub header: String,
    pub ascending: bool,
}

/// Class-attribute keywords marking a sorted header.
///
/// Matching is on whole words: with the default `asc` token a class of
/// `ascend` is unsorted, `sorts asc` is ascending.
#[derive(Debug, Clone)]
pub struct SortTokens {
    ascending: Regex,
    descending: Regex,
}

impl SortTokens {
    pub fn new(ascending: &str, descending: &str) -> Result<Self> {
        let compile = |token: &str| {
            Regex::new(&format!(r"\b{}\b", regex::escape(token.trim())))
                .map_err(|e| TableError::InvalidLayout(format!("sort token '{}': {}", token, e)))
        };

        Ok(Self {
            ascending: compile(ascending)?,
            descending: compile(descending)?,
        })
    }

    pub fn state_of(&self, class: Option<&str>) -> SortState {
        let Some(class) = class else {
            return SortState::Unsorted;
        };

        if self.ascending.is_match(class) {
            SortState::Ascending
        } else if self.descending.is_match(class) {
            SortState::Descending
        } else {
            SortState::Unsorted
        }
    }
}

/// Live view of one sortable header set.
///
/// `observe` must re-read the header from the page every time, and
/// `advance` must click it and wait for the table to settle.
#[async_trait]
pub trait SortSurface: Send {
    async fn observe(&mut self, column: &str) -> Result<SortState>;

    async fn advance(&mut self, column: &str) -> Result<()>;
}

/// Drives a header to a requested order with the fewest clicks.
///
/// Unsorted needs two clicks to reach descending; every other mismatch is
/// one click. The loop is bounded so an inconsistent class never spins.
#[derive(Debug, Clone, Copy)]
pub struct SortController {
    max_transitions: usize,
}

impl Default for SortController {
    fn default() -> Self {
        Self { max_transitions: 2 }
    }
}

impl SortController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of header clicks issued.
    pub async fn reach<S: SortSurface + ?Sized>(
        &self,
        surface: &mut S,
        column: &str,
        target: SortDirection,
    ) -> Result<usize> {
        let wanted = target.state();
        let mut clicks = 0;

        while clicks < self.max_transitions {
            let observed = surface.observe(column).await?;
            if observed == wanted {
                break;
            }
            debug!("Header '{}' is {}, clicking toward {}", column, observed, wanted);
            surface.advance(column).await?;
            clicks += 1;
        }

        let observed = surface.observe(column).await?;
        if observed != wanted {
            return Err(TableError::SortNotReached {
                column: column.to_string(),
                expected: wanted.to_string(),
                observed: observed.to_string(),
            });
        }

        info!("Column '{}' sorted {} after {} click(s)", column, wanted, clicks);
        Ok(clicks)
    }
}
