pub mod browser;
pub mod core;
pub mod dom;
pub mod errors;
pub mod table;
pub mod testing;

pub use browser::{ChromeDriver, ChromeElement};
pub use crate::core::{Config, CssSelector, PageDriver, TableLayout, TimingConfig, WaitCondition};
pub use dom::{NodePath, SnapshotDriver};
pub use errors::{DriverError, TableError};
pub use table::{DeleteOutcome, DeleteState, Row, SortOrder, SyncOutcome, Table, TableMap};
