pub mod backends;
mod connection;
pub mod repository;
pub(crate) mod schema;
pub mod traits;

pub use backends::LibSqlBackend;
pub use connection::Database;
pub use traits::{
    ArchiveStore, BeliefStore, ClaimStore, GraphStore, ProfileStore, RelationStore, TimelineStore,
};
