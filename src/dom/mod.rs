pub mod document;
pub mod snapshot;

pub use document::{HtmlDocument, NodePath};
pub use snapshot::SnapshotDriver;
