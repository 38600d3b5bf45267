//! Parse oracle output into candidate nodes and edges

use crate::error::ExtractorError;
use serde_json::{Map, Value};
use texkg_domain::{EntityType, GraphEdge, GraphNode, NodeSource, RelationType};
use tracing::debug;

/// Candidates recovered from one oracle response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedResponse {
    /// Well-formed nodes
    pub nodes: Vec<GraphNode>,
    /// Well-formed, non-self-loop edges
    pub edges: Vec<GraphEdge>,
    /// Node entries discarded as malformed
    pub dropped_nodes: usize,
    /// Edge entries discarded as malformed
    pub dropped_edges: usize,
}

/// Parse an extraction response
///
/// The response must contain one JSON object; `nodes` and `edges` default to
/// empty when missing. Entries lacking a string `id`/`type`/`title` (nodes)
/// or `type`/`source`/`target` (edges), carrying an unknown type, or
/// forming a self-loop are dropped and counted.
pub fn parse_oracle_response(response: &str) -> Result<ParsedResponse, ExtractorError> {
    let root = parse_object(response)?;

    let mut parsed = ParsedResponse::default();
    for entry in array_field(&root, "nodes") {
        match parse_node(entry) {
            Some(node) => parsed.nodes.push(node),
            None => parsed.dropped_nodes += 1,
        }
    }
    for entry in array_field(&root, "edges") {
        match parse_edge(entry) {
            Some(edge) => parsed.edges.push(edge),
            None => parsed.dropped_edges += 1,
        }
    }

    if parsed.dropped_nodes + parsed.dropped_edges > 0 {
        debug!(
            "Dropped {} malformed nodes and {} malformed edges",
            parsed.dropped_nodes, parsed.dropped_edges
        );
    }
    Ok(parsed)
}

/// Parse the first JSON object in a response
pub fn parse_object(response: &str) -> Result<Map<String, Value>, ExtractorError> {
    let json_str = extract_json(response)?;
    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| ExtractorError::InvalidFormat(format!("JSON parse error: {}", e)))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ExtractorError::InvalidFormat("Expected JSON object".to_string())),
    }
}

/// Extract JSON from a response, handling markdown fences and chatter
fn extract_json(response: &str) -> Result<&str, ExtractorError> {
    let mut trimmed = response.trim();

    if let Some(rest) = trimmed.strip_prefix("```") {
        // Drop the info string (```json) and the closing fence
        let rest = rest.split_once('\n').map_or("", |(_, body)| body);
        trimmed = rest.trim_end().strip_suffix("```").unwrap_or(rest).trim();
    }

    if trimmed.starts_with('{') {
        return Ok(trimmed);
    }
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&trimmed[start..=end]),
        _ => Err(ExtractorError::InvalidFormat("No JSON object in response".to_string())),
    }
}

fn array_field<'a>(root: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    root.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn meta_field(obj: &Map<String, Value>) -> Map<String, Value> {
    obj.get("meta")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

fn parse_source(value: &Value) -> Option<NodeSource> {
    let obj = value.as_object()?;
    let section_path = obj.get("sectionPath").and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect::<Vec<_>>()
    });
    Some(NodeSource {
        file: string_field(obj, "file").unwrap_or_default(),
        latex_label: string_field(obj, "latexLabel")
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty()),
        section_path,
    })
}

fn parse_node(value: &Value) -> Option<GraphNode> {
    let obj = value.as_object()?;
    let id = string_field(obj, "id").map(|s| s.trim().to_string()).filter(|s| !s.is_empty())?;
    let entity_type: EntityType = obj.get("type")?.as_str()?.parse().ok()?;
    let title = string_field(obj, "title")?;

    Some(GraphNode {
        id,
        entity_type,
        title: title.trim().to_string(),
        content: string_field(obj, "content"),
        source: obj.get("source").and_then(parse_source),
        meta: meta_field(obj),
    })
}

fn parse_edge(value: &Value) -> Option<GraphEdge> {
    let obj = value.as_object()?;
    let relation_type: RelationType = obj.get("type")?.as_str()?.parse().ok()?;
    let source = string_field(obj, "source")?.trim().to_string();
    let target = string_field(obj, "target")?.trim().to_string();
    if source.is_empty() || target.is_empty() || source == target {
        return None;
    }

    Some(GraphEdge {
        id: string_field(obj, "id"),
        relation_type,
        source,
        target,
        evidence: string_field(obj, "evidence"),
        meta: meta_field(obj),
    })
}
