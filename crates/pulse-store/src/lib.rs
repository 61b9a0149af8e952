pub mod batch;
pub mod source;

pub use batch::{fetch_all, BatchPolicy};
pub use source::{EventSource, FetchQuery, MemorySource, Page, StoreError};
