//! Prompt construction for oracle extraction

use crate::types::Phase;
use texkg_domain::{LatexChunk, SchemaSelection};

/// Builds extraction prompts for one chunk
pub struct PromptBuilder<'a> {
    chunk: &'a LatexChunk,
    vocabulary: SchemaSelection,
    graph_summary: String,
    phase: Phase,
    frozen: bool,
    concept_registry: Option<String>,
}

impl<'a> PromptBuilder<'a> {
    /// Create a builder over the full default vocabulary
    pub fn new(chunk: &'a LatexChunk) -> Self {
        Self {
            chunk,
            vocabulary: SchemaSelection::default(),
            graph_summary: String::new(),
            phase: Phase::Single,
            frozen: false,
            concept_registry: None,
        }
    }

    /// Restrict the entity/relation vocabulary
    pub fn with_vocabulary(mut self, vocabulary: SchemaSelection) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    /// Summary of the existing graph for cross-chunk linking
    pub fn with_graph_summary(mut self, summary: impl Into<String>) -> Self {
        self.graph_summary = summary.into();
        self
    }

    /// Phase-specific instructions
    pub fn with_phase(mut self, phase: Phase, frozen: bool) -> Self {
        self.phase = phase;
        self.frozen = frozen;
        self
    }

    /// Canonical base concepts to reuse
    pub fn with_concept_registry(mut self, registry: Option<&str>) -> Self {
        self.concept_registry = registry
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        self
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        // 1. Role and vocabularies
        prompt.push_str(ROLE_INSTRUCTIONS);
        prompt.push_str("\n\n## Entity types (use only these)\n");
        for t in &self.vocabulary.entity_types {
            prompt.push_str(&format!("- {}\n", t));
        }
        prompt.push_str("\n## Relation types (use only these)\n");
        for r in &self.vocabulary.relation_types {
            prompt.push_str(&format!("- {}\n", r));
        }
        prompt.push('\n');

        // 2. Phase guidance
        match self.phase {
            Phase::Single => {}
            Phase::Base => {
                prompt.push_str(PHASE_BASE_INSTRUCTIONS);
                prompt.push_str("\n\n");
            }
            Phase::Rest => {
                prompt.push_str(PHASE_REST_INSTRUCTIONS);
                if self.frozen {
                    prompt.push('\n');
                    prompt.push_str(FROZEN_NAMESPACE_NOTE);
                }
                prompt.push_str("\n\n");
            }
        }

        if let Some(registry) = &self.concept_registry {
            prompt.push_str("## Concept registry (reuse these ids)\n");
            prompt.push_str(registry);
            prompt.push_str("\n\n");
        }

        // 3. Grounding rules
        prompt.push_str(GROUNDING_RULES);
        prompt.push_str("\n\n");

        // 4. Existing graph
        prompt.push_str("## Existing graph summary (for cross-chunk links)\n");
        prompt.push_str(&self.graph_summary);
        prompt.push_str("\n\n");

        if let Some(notes) = self.vocabulary.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            prompt.push_str("## User guidance\n");
            prompt.push_str(notes);
            prompt.push_str("\n\n");
        }

        // 5. The chunk
        prompt.push_str("## Chunk context\n");
        prompt.push_str(&format!("- chunk_id: {}\n", self.chunk.id));
        prompt.push_str(&format!("- file: {}\n", self.chunk.file));
        prompt.push_str(&format!("- section_path: {}\n", self.chunk.section_path.join(" / ")));
        prompt.push_str(&format!("- title: {}\n\n", self.chunk.title));
        prompt.push_str("## LaTeX fragment\n");
        prompt.push_str(&self.chunk.text);
        prompt.push_str("\n\n");

        // 6. Output format
        prompt.push_str(OUTPUT_FORMAT);
        prompt
    }
}

/// Prompt asking the oracle for conservative alias decisions
pub fn build_align_prompt(cards: &[AlignCard]) -> String {
    let mut prompt = String::from(ALIGN_INSTRUCTIONS);
    prompt.push_str("\n\nInput cards:\n");
    for c in cards {
        let evidence = if c.evidence.is_empty() { "(none)" } else { c.evidence.as_str() };
        prompt.push_str(&format!(
            "- id: {}\n  type: {}\n  title: {}\n  section: {}\n  evidence: {}\n",
            c.id, c.entity_type, c.title, c.section, evidence
        ));
    }
    prompt.push('\n');
    prompt.push_str(ALIGN_OUTPUT_FORMAT);
    prompt
}

/// Compact description of one alias candidate
#[derive(Debug, Clone, PartialEq)]
pub struct AlignCard {
    /// Node id
    pub id: String,
    /// Entity type name
    pub entity_type: String,
    /// Node title
    pub title: String,
    /// Last two section headings
    pub section: String,
    /// Leading content, whitespace-collapsed
    pub evidence: String,
}

const ROLE_INSTRUCTIONS: &str = "You extract a mathematical knowledge graph from LaTeX. \
Read the fragment below and output strict JSON with entities and relations. \
No markdown, no commentary.";

const PHASE_BASE_INSTRUCTIONS: &str = r#"## Phase 1: build the universe (sequential)
- Extract ONLY definitions, notations and basic constructions.
- Names must be stable and reusable. Prefer ids already listed in the concept registry or the graph summary; never create two ids for one concept."#;

const PHASE_REST_INSTRUCTIONS: &str = r#"## Phase 2: extract the rest (parallel)
- Extract every other entity and relation. Connect to base concepts by referencing their existing ids."#;

const FROZEN_NAMESPACE_NOTE: &str = "- The namespace is FROZEN: if a concept already appears in the registry or the summary you MUST reuse its id. Do not create synonym nodes.";

const GROUNDING_RULES: &str = r#"## Rules (do not invent content)
- Extract only what the fragment states explicitly (environments, display math, explicit statements). Never complete from general knowledge.
- Formula nodes come only from display math (equation, align, \[ \], $$ $$). Prose sentences are never formulas.
- Titles are short and traceable: prefer numbers, labels and environment titles over summaries.
- NEVER elide content: no "...", "…" or similar placeholders. Keep the LaTeX source as complete as this fragment allows.
- An example or exercise keeps its solution and answer in the same node. Do not create separate nodes for them.
- Do not split trivial child nodes out of examples or exercises unless they carry their own label or number and are referenced elsewhere.
- Use \label, \ref and \eqref to link across fragments."#;

const OUTPUT_FORMAT: &str = r#"## Output format (strict)
Return one object with "nodes" and "edges":
{
  "nodes": [
    {
      "id": "stable unique id; tex:<name> for \label{kind:name} (e.g. \label{def:ring} -> tex:ring), otherwise chunk:<chunkId>:<type>:<idx>",
      "type": "EntityType",
      "title": "short title, number or name",
      "content": "complete LaTeX source of the statement; formulas must contain renderable math",
      "source": { "file": "string", "latexLabel": "string or null", "sectionPath": ["..."] },
      "meta": { "chunkId": "string", "confidence": 0.0 }
    }
  ],
  "edges": [
    {
      "type": "RelationType",
      "source": "node id",
      "target": "node id",
      "evidence": "optional short quote from the source",
      "meta": { "chunkId": "string", "confidence": 0.0 }
    }
  ]
}
Constraints:
- Output JSON only.
- nodes[].type must be an entity type above; edges[].type must be a relation type above.
- Edge endpoints must be ids in "nodes" or ids shown in the graph summary. Do not repeat an existing node unless adding title, content or source."#;

const ALIGN_INSTRUCTIONS: &str = r#"You align mathematical concepts, very conservatively. Among the cards below, find aliases that are CERTAINLY the same concept and map each alias to a canonical id.
- When unsure, output nothing. A missed merge is better than a false merge.
- Merge only the same object, definition or notation convention. Related or similar concepts are never merged.
- The canonical id must be one of the card ids.
- Give each mapping a confidence in 0..1. Do not output mappings below 0.88."#;

const ALIGN_OUTPUT_FORMAT: &str = r#"Output strict JSON (no markdown, no commentary):
{
  "decisions": [
    { "alias": "id", "canonical": "id", "confidence": 0.0, "reason": "one sentence (optional)" }
  ]
}"#;
