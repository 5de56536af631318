// Public modules
pub mod config;
pub mod curator;
pub mod dates;
pub mod ibge;
pub mod input;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use curator::{
    add_if_absent, apply_action, remove_by_identity, select_by_position, sorted_view,
    ActionOutcome, AddOutcome, RecordAction, RemoveOutcome, Selection, SortKey,
};
pub use ibge::{IbgeClient, NewsSource, QueryError, SearchQuery};
pub use input::InputError;
pub use models::{ListKind, NewsRecord, UserProfile};
pub use store::ProfileStore;
