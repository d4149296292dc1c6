//! Trace-cache export.
//!
//! The trace is a registry snapshot for incremental tooling: module ids with
//! their dependency lists, carrying contents only when those contents are
//! already final. Items that never went through analysis have no module id
//! or dependency list and are not cache material; stubbed modules resolve to
//! stand-ins, so caching them would pin a lie.

use serde::{Deserialize, Serialize};

use crate::item::ItemRegistry;
use crate::loader::LoaderConfigBuilder;

/// One exported cache record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub id: String,
    pub deps: Vec<String>,
    /// Present only when the stored contents need no further transform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
}

/// Collect cache records in registration order.
pub(crate) fn collect(registry: &ItemRegistry, loader: &LoaderConfigBuilder) -> Vec<TraceEntry> {
    registry
        .iter()
        .filter_map(|item| {
            let item = item.read();
            let id = item.module_id.as_ref()?;
            let deps = item.deps.as_ref()?;
            if loader.is_stub(id) {
                return None;
            }
            Some(TraceEntry {
                id: id.clone(),
                deps: deps.clone(),
                contents: (!item.requires_transform)
                    .then(|| item.contents.clone())
                    .flatten(),
            })
        })
        .collect()
}
