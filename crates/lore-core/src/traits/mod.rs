//! Interfaces implemented by external collaborators.

mod graph_context;

pub use graph_context::{ContextLookup, GraphContext, GraphContextProvider};
