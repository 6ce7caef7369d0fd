pub mod credential_store;
pub mod storage;

// Re-export the primary store items so code outside can do
// "use crate::store::{CredentialStore, create_storage};"
pub use credential_store::CredentialStore;
pub use storage::{create_storage, FileStorage, MemoryStorage, SessionStorage};
