pub mod error;
pub mod gate;
pub mod memory;
pub mod ports;
pub mod types;

pub use error::{LookupError, LookupErrorKind, connection_unavailable, query_failed};
pub use gate::PermissionGate;
pub use memory::{DirectorySeed, GrantSeed, InMemoryDirectory, LrnOwnerSeed};
pub use ports::{DirectoryConnection, DirectoryPort};
pub use types::{LrnOwnershipKey, PermissionPolicy, PermissionSet};
