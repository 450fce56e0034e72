//! Movie data model shared by the catalog client, the cache and the
//! search components.

mod types;

pub use types::*;
