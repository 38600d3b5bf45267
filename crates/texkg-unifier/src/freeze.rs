//! Freezing the base-concept namespace

use crate::alias::AliasMap;
use crate::merge::{absorb, rewrite_edges};
use crate::union_find::IdArena;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use texkg_domain::graph::LABEL_ID_PREFIX;
use texkg_domain::{free_label_id, AlignDecision, EntityType, Graph, GraphNode, RelationType};
use tracing::{debug, info};

/// A graph whose identities have been unified, with the renames applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrozenNamespace {
    /// Unified graph
    pub graph: Graph,
    /// Every input id (and label) mapped onto its canonical id
    pub alias_map: AliasMap,
    /// Input nodes folded into another node
    pub merged: usize,
}

/// Unify node identities conservatively
///
/// Ids are unioned only when they carry the same explicit label, when an
/// `EquivalentTo` edge joins two base-concept nodes, or when a confident
/// [`AlignDecision`] names two present base-concept nodes. Labels are
/// compared verbatim, so `def:x` and `thm:x` stay apart. Titles and content
/// never merge nodes on their own.
///
/// Each class is represented by a label-derived (`tex:`) member id when it
/// has one, else by an id allocated from the class's first label, else by its
/// first-seen id. Internal `Notation`/`Construction` nodes come out typed as
/// `Definition` with `meta.conceptKind` recording the original kind.
pub fn freeze_namespace(graph: &Graph, decisions: &[AlignDecision]) -> FrozenNamespace {
    let mut arena = IdArena::new();
    // Handle of each label's synthetic `\label{...}` key
    let mut label_keys: HashMap<usize, String> = HashMap::new();
    let mut labels: Vec<(String, usize)> = Vec::new();
    let mut base: HashSet<usize> = HashSet::new();

    for node in &graph.nodes {
        let h = arena.intern(&node.id);
        if node.entity_type.is_base_concept() {
            base.insert(h);
        }
        if let Some(label) = node.latex_label() {
            let label = label.trim();
            let lh = arena.intern(&format!("\\label{{{}}}", label));
            arena.union(h, lh);
            if label_keys.insert(lh, label.to_string()).is_none() {
                labels.push((label.to_string(), lh));
            }
        }
    }

    let mut equivalences = 0;
    for edge in &graph.edges {
        if edge.relation_type != RelationType::EquivalentTo {
            continue;
        }
        if let (Some(a), Some(b)) = (arena.get(&edge.source), arena.get(&edge.target)) {
            if base.contains(&a) && base.contains(&b) && arena.union(a, b) {
                equivalences += 1;
            }
        }
    }

    let mut aligned = 0;
    for decision in decisions.iter().filter(|d| d.is_confident()) {
        if let (Some(a), Some(b)) = (arena.get(&decision.alias), arena.get(&decision.canonical)) {
            if base.contains(&a) && base.contains(&b) && arena.union(b, a) {
                aligned += 1;
            }
        }
    }
    debug!(
        "Freeze unions: {} from EquivalentTo, {} from alignment",
        equivalences, aligned
    );

    // Representative per class
    let mut used: HashSet<String> = graph.nodes.iter().map(|n| n.id.clone()).collect();
    let mut canonical: Vec<String> = vec![String::new(); arena.len()];
    for class in arena.classes() {
        let label_derived = class
            .iter()
            .copied()
            .filter(|h| !label_keys.contains_key(h))
            .map(|h| arena.id(h))
            .find(|id| id.starts_with(LABEL_ID_PREFIX))
            .map(str::to_string);
        let rep = match label_derived {
            Some(id) => id,
            None => match class.iter().find_map(|h| label_keys.get(h)) {
                Some(label) => {
                    let id = free_label_id(label, |id| used.contains(id));
                    used.insert(id.clone());
                    id
                }
                // A label key is always interned after its node
                None => arena.id(class[0]).to_string(),
            },
        };
        for h in class {
            canonical[h] = rep.clone();
        }
    }

    let mut alias_map = AliasMap::new();
    for h in (0..arena.len()).filter(|h| !label_keys.contains_key(h)) {
        alias_map.insert(arena.id(h), canonical[h].as_str());
    }
    for (label, lh) in labels {
        alias_map.insert_label(label, canonical[lh].as_str());
    }

    let mut nodes: Vec<GraphNode> = Vec::new();
    let mut slot: HashMap<String, usize> = HashMap::new();
    for node in &graph.nodes {
        let mut node = node.clone();
        node.id = alias_map.resolve(&node.id).to_string();
        match slot.get(&node.id) {
            Some(&i) => absorb(&mut nodes[i], node),
            None => {
                slot.insert(node.id.clone(), nodes.len());
                nodes.push(node);
            }
        }
    }
    for node in nodes.iter_mut() {
        retype_internal(node);
    }

    let edges = rewrite_edges(graph.edges.iter().cloned(), |id| alias_map.resolve(id).to_string());

    let merged = graph.nodes.len() - nodes.len();
    info!(
        "Froze namespace: {} nodes -> {} nodes ({} merged)",
        graph.nodes.len(),
        nodes.len(),
        merged
    );
    FrozenNamespace {
        graph: Graph { nodes, edges },
        alias_map,
        merged,
    }
}

fn retype_internal(node: &mut GraphNode) {
    if node.entity_type.is_internal() {
        node.meta.insert(
            "conceptKind".to_string(),
            Value::String(node.entity_type.to_string()),
        );
        node.entity_type = EntityType::Definition;
    }
}
