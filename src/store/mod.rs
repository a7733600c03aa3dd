//! The persistence context: identity map, lifecycle ledger and value-hash
//! snapshots for one session.

mod context;
mod entity_info;
mod options;
mod value_hash;

pub use context::PersistenceContext;
pub use entity_info::{EntityInfo, EntityState};
pub use options::ContextOptions;
pub use value_hash::{
    IdentityLookup, ValueHash, ValueHashes, ValueHashesFactory, ValuesHash, ValuesHashError,
};
