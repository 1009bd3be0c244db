//! Graph-context accessor supplied by the graph service.

use std::collections::HashMap;
use std::fmt;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// Neighborhood of an existing entity in the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphContext {
    /// Segments the entity has been mentioned in.
    #[serde(default)]
    pub segment_ids: Vec<String>,
    /// Ids of entities directly connected to it.
    #[serde(default)]
    pub neighbor_entity_ids: Vec<String>,
}

/// Outcome of a graph-context lookup.
///
/// Scoring is synchronous. A lookup that is still [`ContextLookup::Pending`]
/// is treated as absent for the current scoring round and is never awaited.
pub enum ContextLookup {
    /// Context is available now.
    Ready(GraphContext),
    /// Context is being fetched asynchronously.
    Pending(BoxFuture<'static, Option<GraphContext>>),
    /// No context exists for the entity.
    Missing,
}

impl ContextLookup {
    /// The context, if it is available without waiting.
    pub fn into_ready(self) -> Option<GraphContext> {
        match self {
            Self::Ready(context) => Some(context),
            Self::Pending(_) | Self::Missing => None,
        }
    }

    /// Whether the lookup is still in flight.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

impl fmt::Debug for ContextLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(context) => f.debug_tuple("Ready").field(context).finish(),
            Self::Pending(_) => f.write_str("Pending"),
            Self::Missing => f.write_str("Missing"),
        }
    }
}

/// Looks up the graph neighborhood of existing entities.
pub trait GraphContextProvider: Send + Sync {
    /// Look up the context of one entity.
    fn graph_context(&self, entity_id: &str) -> ContextLookup;
}

impl<F> GraphContextProvider for F
where
    F: Fn(&str) -> ContextLookup + Send + Sync,
{
    fn graph_context(&self, entity_id: &str) -> ContextLookup {
        self(entity_id)
    }
}

impl GraphContextProvider for HashMap<String, GraphContext> {
    fn graph_context(&self, entity_id: &str) -> ContextLookup {
        match self.get(entity_id) {
            Some(context) => ContextLookup::Ready(context.clone()),
            None => ContextLookup::Missing,
        }
    }
}
