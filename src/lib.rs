pub mod clock;
pub mod config;
pub mod db;
pub mod live;
pub mod memory;
pub mod models;
pub mod query;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, ConfigError};
pub use db::Database;
pub use live::LiveQuery;
pub use memory::{LogNotifier, MemoryNotice, MemoryNotifier, run_memory_check};
pub use models::{Category, Location, Note, NoteBuilder, NoteError, NoteId, UserId};
pub use query::{AggregationKind, DateFilter, QueryError, QuerySpec, SearchScope, SortOption};
pub use store::{NewNote, NoteEdit, NoteScope, NoteStore, Snapshot};
