//! Configuration records, parsing, and the process-wide cache.

mod schema;
mod store;

pub use schema::{ActionBarConfig, RawActionConfig};
pub use store::{CacheConfig, CacheStats, ConfigCache};
