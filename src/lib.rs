pub mod constants;
pub mod counter;
pub mod domain;
pub mod entry_log;
pub mod error;
pub mod export;
pub mod registry;
pub mod storage;
pub mod time;
pub mod undo;

pub use counter::FrontCounter;
pub use domain::{Category, CategoryId, Color, Entry, EntryId};
pub use error::{CounterError, CounterResult, StorageError};
pub use undo::UndoOutcome;
