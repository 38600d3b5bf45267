//! Oracle extraction adapter

use crate::completion::ContentCompleter;
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::grounding::ground_candidates;
use crate::parser::{parse_object, parse_oracle_response};
use crate::prompt::{build_align_prompt, AlignCard, PromptBuilder};
use crate::summary::summarize_graph;
use crate::types::OracleRequest;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use texkg_domain::graph::LABEL_ID_PREFIX;
use texkg_domain::{AlignDecision, ExtractionOracle, ExtractionResult, GraphNode, SamplingParams};
use texkg_gatekeeper::Gatekeeper;
use tokio::time::timeout;
use tracing::{debug, info};

const EVIDENCE_CHARS: usize = 180;

/// Extracts candidates for one chunk through an [`ExtractionOracle`]
pub struct OracleExtractor {
    oracle: Arc<dyn ExtractionOracle>,
    gatekeeper: Gatekeeper,
    completer: ContentCompleter,
    config: ExtractorConfig,
    params: SamplingParams,
}

impl OracleExtractor {
    /// Create a new adapter
    pub fn new(oracle: Arc<dyn ExtractionOracle>, config: ExtractorConfig) -> Self {
        Self {
            oracle,
            gatekeeper: Gatekeeper::new(config.validation.clone()),
            completer: ContentCompleter::new(config.completion_window_chars, config.max_recovery_chars),
            config,
            params: SamplingParams::default(),
        }
    }

    /// Override sampling parameters
    pub fn with_sampling(mut self, params: SamplingParams) -> Self {
        self.params = params;
        self
    }

    /// Name of the underlying model
    pub fn model_name(&self) -> &str {
        self.oracle.model_name()
    }

    /// Build the prompt for a request
    pub fn build_prompt(&self, request: &OracleRequest<'_>) -> String {
        let summary = summarize_graph(
            request.graph,
            request.chunk,
            self.config.summary_max_nodes,
            self.config.summary_max_edges,
        );
        PromptBuilder::new(request.chunk)
            .with_vocabulary(request.phase.vocabulary(request.schema))
            .with_graph_summary(summary)
            .with_phase(request.phase, request.frozen)
            .with_concept_registry(request.concept_registry)
            .build()
    }

    /// Extract candidates for one chunk
    ///
    /// Oracle failures and malformed output are errors; grounding rejections
    /// are warnings on the returned result.
    pub async fn extract(&self, request: OracleRequest<'_>) -> Result<ExtractionResult, ExtractorError> {
        let prompt = self.build_prompt(&request);
        debug!("Prompt for {}: {} chars", request.chunk.id, prompt.len());

        let response = self.invoke(&prompt, &self.params).await?;
        debug!("Oracle response for {}: {} chars", request.chunk.id, response.len());

        let parsed = parse_oracle_response(&response)?;
        let vocabulary = request.phase.vocabulary(request.schema);
        let result = ground_candidates(
            parsed,
            request.chunk,
            &vocabulary,
            &self.gatekeeper,
            &self.completer,
            &request.graph.label_index(),
        );

        info!(
            "Extracted {} nodes and {} edges from {} ({} warnings)",
            result.nodes.len(),
            result.edges.len(),
            request.chunk.id,
            result.warnings.len()
        );
        Ok(result)
    }

    /// Ask the oracle for conservative alias decisions among base concepts
    ///
    /// Only unlabeled base-concept nodes are offered. Decisions are kept when
    /// they clear the confidence bar and both ids belong to the same batch.
    pub async fn align_concepts(&self, nodes: &[GraphNode]) -> Result<Vec<AlignDecision>, ExtractorError> {
        let cards: Vec<AlignCard> = nodes
            .iter()
            .filter(|n| n.entity_type.is_base_concept())
            .filter(|n| n.latex_label().is_none() && !n.id.starts_with(LABEL_ID_PREFIX))
            .map(align_card)
            .collect();
        if cards.is_empty() {
            return Ok(Vec::new());
        }

        let params = SamplingParams {
            temperature: 0.0,
            top_p: 1.0,
            max_tokens: (self.params.max_tokens / 10).clamp(800, 4000),
        };

        let mut decisions = Vec::new();
        for batch in cards.chunks(self.config.align_batch_size.clamp(20, 120)) {
            let response = self.invoke(&build_align_prompt(batch), &params).await?;
            let ids: HashSet<&str> = batch.iter().map(|c| c.id.as_str()).collect();
            decisions.extend(
                parse_decisions(&response)?
                    .into_iter()
                    .filter(|d| d.is_confident())
                    .filter(|d| ids.contains(d.alias.as_str()) && ids.contains(d.canonical.as_str())),
            );
        }
        info!("Concept alignment proposed {} merges", decisions.len());
        Ok(decisions)
    }

    async fn invoke(&self, prompt: &str, params: &SamplingParams) -> Result<String, ExtractorError> {
        let secs = self.config.extraction_timeout_secs;
        timeout(self.config.extraction_timeout(), self.oracle.invoke(prompt, params))
            .await
            .map_err(|_| ExtractorError::Timeout(secs))?
            .map_err(ExtractorError::from)
    }
}

fn align_card(node: &GraphNode) -> AlignCard {
    let section = node
        .source
        .as_ref()
        .and_then(|s| s.section_path.as_ref())
        .map(|p| p[p.len().saturating_sub(2)..].join(" / "))
        .unwrap_or_default();
    let evidence: String = node
        .content_str()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(EVIDENCE_CHARS)
        .collect();
    AlignCard {
        id: node.id.clone(),
        entity_type: node.entity_type.to_string(),
        title: node.title.clone(),
        section,
        evidence,
    }
}

fn parse_decisions(response: &str) -> Result<Vec<AlignDecision>, ExtractorError> {
    let root = parse_object(response)?;
    let entries = root.get("decisions").and_then(Value::as_array).cloned().unwrap_or_default();
    Ok(entries
        .into_iter()
        .filter_map(|entry| {
            let obj = entry.as_object()?;
            let alias = obj.get("alias")?.as_str()?.trim().to_string();
            let canonical = obj.get("canonical")?.as_str()?.trim().to_string();
            if alias.is_empty() || canonical.is_empty() {
                return None;
            }
            Some(AlignDecision {
                alias,
                canonical,
                confidence: obj.get("confidence").and_then(Value::as_f64).unwrap_or(0.0),
                reason: obj.get("reason").and_then(Value::as_str).map(str::to_string),
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decisions() {
        let response = r#"{"decisions": [
            {"alias": "a", "canonical": "b", "confidence": 0.95, "reason": "same"},
            {"alias": " ", "canonical": "b", "confidence": 0.99},
            {"alias": "c", "canonical": "b"}
        ]}"#;
        let decisions = parse_decisions(response).unwrap();
        assert_eq!(decisions.len(), 2);
        assert_eq!(decisions[0].reason.as_deref(), Some("same"));
        assert_eq!(decisions[1].confidence, 0.0);
    }

    #[test]
    fn test_align_card_compacts_evidence() {
        let node = GraphNode::new("n", texkg_domain::EntityType::Notation, "Bracket")
            .with_content(format!("a  \n b {}", "x".repeat(300)));
        let card = align_card(&node);
        assert!(card.evidence.starts_with("a b x"));
        assert_eq!(card.evidence.chars().count(), EVIDENCE_CHARS);
        assert_eq!(card.section, "");
    }
}
