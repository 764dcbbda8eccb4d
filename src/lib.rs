// Library surface for the binary, headless tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod db;
pub mod error;
pub mod runtime;
pub mod session;
pub mod store;
pub mod ui;
pub mod word;

pub use error::{StoreError, WordError};
pub use session::{EndReason, Quiz, RoundSummary, Transition};
pub use store::{MemoryWordStore, WordStore};
pub use word::{SortOrder, Word, WordId, WordTally};
