pub mod base;
pub mod cookie;
pub mod memory_relay;

// Re-export the primary relay items so code outside can do
// "use crate::relay::{Relay, MemoryRelay};"
pub use base::Relay;
pub use cookie::read_cookie;
pub use memory_relay::MemoryRelay;
