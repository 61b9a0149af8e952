pub mod compile;
pub mod context;
pub mod filter;
pub mod intent;

pub use compile::{compile, summarize, Compiled};
pub use context::{ContextStore, ConversationContext};
pub use filter::{evaluate, Field, FilterPredicate, PredicateError};
pub use intent::Intent;
