// Library module for hashkeep
// Re-exports modules for use in integration tests and the binary

pub mod cli;
pub mod digest;
pub mod error;
pub mod paths;
pub mod record;
pub mod router;
pub mod scan;
pub mod store;
pub mod stream;
pub mod verify;
pub mod walker;

pub use digest::{Algorithm, Hasher};
pub use error::HashkeepError;
pub use record::ChecksumRecord;
pub use router::StoreRouter;
pub use store::ChecksumStore;
pub use stream::StreamingHasher;
