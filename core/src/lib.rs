pub mod api;
pub mod coordinator;
pub mod delete_flow;
pub mod error;
pub mod models;
pub mod notice;
pub mod ordering;
pub mod remote;
pub mod session;
pub mod share;
pub mod store;

#[cfg(test)]
mod testing;

pub use coordinator::{ActionKind, FavoriteChange, MutationCoordinator};
pub use delete_flow::{DeleteFlow, DeleteState, FlowError};
pub use error::SyncError;
pub use share::{PlatformError, ShareOutcome, ShareResolver, SharePlatform};
pub use store::EntityStore;
