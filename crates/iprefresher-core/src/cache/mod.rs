// # IP Cache Implementations
//
// Implementations of the IpCache trait.

pub mod file;
pub mod memory;

pub use file::{DEFAULT_CACHE_PATH, FileIpCache};
pub use memory::MemoryIpCache;
