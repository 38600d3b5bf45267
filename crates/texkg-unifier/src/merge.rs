//! Field-level merging of unified nodes

use std::collections::HashMap;
use texkg_domain::{EdgeKey, GraphEdge, GraphNode};

/// Fold `other` into `into`
///
/// The longer title and content win; on a tie the value already held is
/// kept. `source` and `meta` are shallow-merged with `other` overriding.
/// A public type displaces a unification-only type.
pub(crate) fn absorb(into: &mut GraphNode, other: GraphNode) {
    if other.title.chars().count() > into.title.chars().count() {
        into.title = other.title;
    }
    if other.content.as_deref().unwrap_or("").chars().count() > into.content_str().chars().count() {
        into.content = other.content;
    }
    match (&mut into.source, other.source) {
        (Some(existing), Some(incoming)) => existing.merge_from(&incoming),
        (slot @ None, incoming) => *slot = incoming,
        (Some(_), None) => {}
    }
    into.meta.extend(other.meta);
    if into.entity_type.is_internal() && !other.entity_type.is_internal() {
        into.entity_type = other.entity_type;
    }
}

/// Remap edge endpoints, drop self-loops and duplicate keys
///
/// The first edge for a key is kept; later duplicates contribute their
/// metadata.
pub(crate) fn rewrite_edges<F>(edges: impl IntoIterator<Item = GraphEdge>, resolve: F) -> Vec<GraphEdge>
where
    F: Fn(&str) -> String,
{
    let mut out: Vec<GraphEdge> = Vec::new();
    let mut seen: HashMap<EdgeKey, usize> = HashMap::new();
    for mut edge in edges {
        edge.source = resolve(&edge.source);
        edge.target = resolve(&edge.target);
        if edge.is_self_loop() {
            continue;
        }
        match seen.get(&edge.key()) {
            Some(&i) => out[i].meta.extend(edge.meta),
            None => {
                seen.insert(edge.key(), out.len());
                out.push(edge);
            }
        }
    }
    out
}
