// Public API
pub use cloud::{
    sync_local_matches_to_cloud, CloudMatchRecord, CloudMatchRepository, CloudStore, SyncReport,
};
pub use errors::StorageError;
pub use file::FileMatchRepository;
pub use repository::{InMemoryMatchRepository, MatchRepository};
pub use sharing::{PetNameTokenGenerator, ShareService, TokenGenerator};

// Internal modules
mod cloud;
mod errors;
mod file;
mod repository;
mod sharing;
