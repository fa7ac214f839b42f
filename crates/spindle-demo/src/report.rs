//! Summary of a wired graph for CLI output.

use std::sync::Arc;

use serde::Serialize;
use spindle_core::Injector;

use crate::graph::{NodeA, NodeB, Root};

/// What the demo graph looks like after resolution.
#[derive(Debug, Clone, Serialize)]
pub struct GraphReport {
    /// Injector that built the graph.
    pub injector: String,
    /// Injector label.
    pub label: String,
    /// Rendered root, e.g. `root(nodeAWithB(..), nodeBWithA(..))`.
    pub rendered: String,
    /// Leaf indices of `NodeA` and `NodeB`, in that order.
    pub leaves: [Option<usize>; 2],
    /// Whether `NodeA.b` and `NodeB.a` point at the cached peer singletons.
    pub mutual_reference_resolved: bool,
    /// Number of registered bindings.
    pub bindings: usize,
    /// Number of cached unqualified instances.
    pub singletons: usize,
    /// Number of cached qualified instances.
    pub qualified: usize,
}

/// Builds a report for `root` as resolved by `injector`.
///
/// # Errors
///
/// Returns an error if the node singletons cannot be resolved.
pub fn inspect(injector: &Injector, root: &Root) -> spindle_core::Result<GraphReport> {
    let node_a = injector.get_instance::<NodeA>()?;
    let node_b = injector.get_instance::<NodeB>()?;

    let a_sees_b = node_a.b.get().zip(root.b.get()).is_some_and(|(x, y)| Arc::ptr_eq(x, y));
    let b_sees_a = node_b.a.get().zip(root.a.get()).is_some_and(|(x, y)| Arc::ptr_eq(x, y));

    Ok(GraphReport {
        injector: injector.id().to_string(),
        label: injector.config().label.clone(),
        rendered: root.to_string(),
        leaves: [node_a.leaf.get().map(|leaf| leaf.index), Some(node_b.leaf.index)],
        mutual_reference_resolved: a_sees_b && b_sees_a,
        bindings: injector.registry().binding_count(),
        singletons: injector.cache().singleton_count(),
        qualified: injector.cache().qualified_count(),
    })
}
