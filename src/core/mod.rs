pub mod config;
pub mod driver;

pub use config::{BrowserConfig, Config, SessionConfig, TableLayout, TimingConfig, Viewport};
pub use driver::{CssSelector, PageDriver, WaitCondition};
