//! JSON export/import of the graph data model

use crate::StoreError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use texkg_domain::Graph;

/// Current export envelope version
pub const EXPORT_VERSION: u64 = 1;

/// Versioned export envelope: `{ "version": 1, "graph": { nodes, edges } }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphExport {
    /// Envelope version
    pub version: u64,
    /// Graph contents
    pub graph: Graph,
}

/// Serialize a graph inside the versioned envelope
pub fn export_graph_json(graph: &Graph) -> Result<String, StoreError> {
    let envelope = GraphExport {
        version: EXPORT_VERSION,
        graph: graph.clone(),
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Parse either the versioned envelope or a bare `{ nodes, edges }` object
pub fn import_graph_json(raw: &str) -> Result<Graph, StoreError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let Some(obj) = value.as_object() else {
        return Err(StoreError::InvalidData("Expected a JSON object".to_string()));
    };

    if obj.contains_key("graph") {
        let version = obj.get("version").and_then(|v| v.as_u64()).unwrap_or(EXPORT_VERSION);
        if version != EXPORT_VERSION {
            return Err(StoreError::UnsupportedVersion(version));
        }
        let envelope: GraphExport = serde_json::from_value(value)?;
        return Ok(envelope.graph);
    }

    if !obj.contains_key("nodes") {
        return Err(StoreError::InvalidData("Missing `nodes` array".to_string()));
    }
    Ok(serde_json::from_value(value)?)
}

/// Write an export envelope to a file
pub fn write_graph_file<P: AsRef<Path>>(path: P, graph: &Graph) -> Result<(), StoreError> {
    std::fs::write(path, export_graph_json(graph)?)?;
    Ok(())
}

/// Read a graph file written by [`write_graph_file`] (or a bare graph)
pub fn read_graph_file<P: AsRef<Path>>(path: P) -> Result<Graph, StoreError> {
    let raw = std::fs::read_to_string(path)?;
    import_graph_json(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_bare_graph() {
        let graph = import_graph_json(r#"{"nodes":[{"id":"a","type":"Lemma","title":"L"}],"edges":[]}"#)
            .unwrap();
        assert_eq!(graph.nodes[0].id, "a");
    }

    #[test]
    fn test_import_rejects_future_version() {
        let err = import_graph_json(r#"{"version":2,"graph":{"nodes":[],"edges":[]}}"#).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedVersion(2)));
    }

    #[test]
    fn test_import_rejects_unrelated_object() {
        assert!(import_graph_json(r#"{"hello":"world"}"#).is_err());
        assert!(import_graph_json("[]").is_err());
    }
}
