// Document store: JSON documents grouped into named collections,
// addressed by 12-byte object ids.

pub mod collection;
pub mod error;
pub mod filter;
pub mod object_id;
pub mod store;

pub use collection::Collection;
pub use error::{DocStoreError, Result};
pub use filter::Filter;
pub use object_id::ObjectId;
pub use store::{DocumentStore, DocumentStoreConfig};
