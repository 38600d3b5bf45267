//! Scenario tests for the Extractor

#[cfg(test)]
mod tests {
    use crate::{
        approx_token_spans, ExtractorConfig, ExtractorError, LatexSegmenter, LocalExtractor, OracleExtractor,
        OracleRequest, Phase,
    };
    use proptest::prelude::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use texkg_domain::{
        ChunkGranularity, EntityType, Graph, GraphNode, LatexChunk, RelationType, SchemaSelection, SourceFile,
    };
    use texkg_llm::MockOracle;

    fn book() -> Vec<SourceFile> {
        vec![SourceFile::new(
            "book.tex",
            "\\chapter{Algebra}\n\\section{Basics}\n\\begin{definition}\\label{def:x}An object $x$ with $x^2 = x$.\\end{definition}\n\\section{Results}\n\\begin{theorem}\\label{thm:y}Uses \\ref{def:x} to show $x = 0$ or $x = 1$.\\end{theorem}\n",
        )]
    }

    fn run_local(chunks: &[LatexChunk], selection: &SchemaSelection) -> (Vec<GraphNode>, Vec<texkg_domain::GraphEdge>) {
        let extractor = LocalExtractor::new();
        let mut labels = HashMap::new();
        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        for chunk in chunks {
            let result = extractor.extract(chunk, selection, &mut labels);
            nodes.extend(result.nodes);
            edges.extend(result.edges);
        }
        (nodes, edges)
    }

    #[test]
    fn test_local_end_to_end_cross_chunk_reference() {
        let chunks = LatexSegmenter::new(ChunkGranularity::Section, None).segment(&book());
        // chapter heading, Basics, Results
        assert_eq!(chunks.len(), 3);

        let (nodes, edges) = run_local(&chunks, &SchemaSelection::default());
        let x = nodes.iter().find(|n| n.id == "tex:x").unwrap();
        let y = nodes.iter().find(|n| n.id == "tex:y").unwrap();
        assert_eq!(x.entity_type, EntityType::Definition);
        assert_eq!(y.entity_type, EntityType::Theorem);
        assert!(edges
            .iter()
            .any(|e| e.relation_type == RelationType::DependsOn && e.source == "tex:y" && e.target == "tex:x"));
    }

    #[test]
    fn test_coarser_granularity_never_adds_chunks() {
        let files = book();
        let counts: Vec<usize> = [
            ChunkGranularity::Paragraph,
            ChunkGranularity::Subsection,
            ChunkGranularity::Section,
            ChunkGranularity::Chapter,
            ChunkGranularity::File,
        ]
        .iter()
        .map(|g| LatexSegmenter::new(*g, None).segment(&files).len())
        .collect();
        assert!(counts.windows(2).all(|w| w[0] >= w[1]), "{:?}", counts);
        assert_eq!(counts.last(), Some(&1));
    }

    #[test]
    fn test_section_path_under_chapter() {
        let chunks = LatexSegmenter::new(ChunkGranularity::Section, None).segment(&book());
        assert_eq!(chunks[0].section_path, vec!["book.tex", "Algebra"]);
        assert_eq!(chunks[1].section_path, vec!["book.tex", "Algebra", "Basics"]);
        assert_eq!(chunks[1].display_title(), "Algebra / Basics");
    }

    fn heading_line() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z ]{0,12}",
            "[A-Z][a-z]{1,6}".prop_map(|t| format!("\\section{{{}}}", t)),
            "[A-Z][a-z]{1,6}".prop_map(|t| format!("\\subsection{{{}}}", t)),
            "[A-Z][a-z]{1,6}".prop_map(|t| format!("\\chapter{{{}}}", t)),
        ]
    }

    proptest! {
        #[test]
        fn prop_segmentation_is_deterministic_and_lossless(
            lines in proptest::collection::vec(heading_line(), 1..30),
            granularity in prop_oneof![
                Just(ChunkGranularity::File),
                Just(ChunkGranularity::Chapter),
                Just(ChunkGranularity::Section),
                Just(ChunkGranularity::Subsection),
            ],
        ) {
            let files = vec![SourceFile::new("p.tex", lines.join("\n"))];
            let segmenter = LatexSegmenter::new(granularity, None);
            let first = segmenter.segment(&files);
            prop_assert_eq!(&first, &segmenter.segment(&files));

            for line in &lines {
                let line = line.trim();
                if !line.is_empty() {
                    prop_assert!(first.iter().any(|c| c.text.contains(line)));
                }
            }
        }

        #[test]
        fn prop_windows_cover_every_token(words in proptest::collection::vec("[a-z]{1,5}", 1..60), max in 2usize..12) {
            let text = words.join(" ");
            let files = vec![SourceFile::new("w.tex", text.clone())];
            let chunks = LatexSegmenter::new(ChunkGranularity::File, Some(max)).segment(&files);
            let total = approx_token_spans(&text).len();
            if total <= max {
                prop_assert_eq!(chunks.len(), 1);
            } else {
                let windowed: usize = chunks.iter().map(|c| approx_token_spans(&c.text).len()).sum();
                prop_assert!(windowed >= total);
                prop_assert!(chunks.iter().all(|c| approx_token_spans(&c.text).len() <= max));
                prop_assert!(chunks[0].text.starts_with(words[0].as_str()));
                prop_assert!(chunks[chunks.len() - 1].text.ends_with(words[words.len() - 1].as_str()));
            }
        }
    }

    fn chunk() -> LatexChunk {
        LatexChunk {
            id: "chunk:a.tex:0".to_string(),
            file: "a.tex".to_string(),
            title: "Rings".to_string(),
            section_path: vec!["a.tex".to_string(), "Rings".to_string()],
            text: "\\begin{definition}\\label{def:ring}A ring is a set with two binary operations satisfying the ring axioms.\\end{definition}\n\\begin{equation}\\label{eq:dist} a(b + c) = ab + ac \\end{equation}".to_string(),
        }
    }

    const RESPONSE: &str = r#"{
        "nodes": [
            {"id": "tex:def:ring", "type": "Definition", "title": "Ring", "content": "A ring is ...",
             "source": {"file": "a.tex", "latexLabel": "def:ring"}},
            {"id": "tex:dist", "type": "Formula", "title": "Distributive law", "content": "",
             "source": {"latexLabel": "eq:dist"}},
            {"id": "fake", "type": "Formula", "title": "Lesson count", "content": "many lessons"}
        ],
        "edges": [
            {"type": "DependsOn", "source": "tex:dist", "target": "tex:def:ring"},
            {"type": "Uses", "source": "fake", "target": "tex:dist"}
        ]
    }"#;

    #[tokio::test]
    async fn test_oracle_extraction_grounds_output() {
        let mut oracle = MockOracle::default();
        oracle.add_response("chunk_id: chunk:a.tex:0", RESPONSE);
        let extractor = OracleExtractor::new(Arc::new(oracle), ExtractorConfig::default());

        let c = chunk();
        let schema = SchemaSelection::default();
        let graph = Graph::new();
        let result = extractor.extract(OracleRequest::single(&c, &schema, &graph)).await.unwrap();

        let ids: Vec<&str> = result.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["tex:ring", "tex:dist"]);
        let ring = &result.nodes[0];
        assert!(ring.content_str().contains("two binary operations"));
        let dist = &result.nodes[1];
        assert_eq!(dist.title, "Formula (eq:dist)");
        assert!(dist.content_str().contains("a(b + c)"));

        assert_eq!(result.edges.len(), 1);
        assert_eq!(result.edges[0].source, "tex:dist");
        assert_eq!(result.edges[0].target, "tex:ring");
        assert!(result.warnings.iter().any(|w| w.contains("fake")));
    }

    #[tokio::test]
    async fn test_oracle_failure_is_error() {
        let mut oracle = MockOracle::default();
        oracle.add_error("chunk_id: chunk:a.tex:0");
        let extractor = OracleExtractor::new(Arc::new(oracle), ExtractorConfig::default());

        let c = chunk();
        let schema = SchemaSelection::default();
        let graph = Graph::new();
        let err = extractor.extract(OracleRequest::single(&c, &schema, &graph)).await.unwrap_err();
        assert!(matches!(err, ExtractorError::Oracle(_)));
    }

    #[tokio::test]
    async fn test_oracle_garbage_is_invalid_format() {
        let extractor = OracleExtractor::new(Arc::new(MockOracle::new("<html>nope</html>")), ExtractorConfig::default());
        let c = chunk();
        let schema = SchemaSelection::default();
        let graph = Graph::new();
        let err = extractor.extract(OracleRequest::single(&c, &schema, &graph)).await.unwrap_err();
        assert!(matches!(err, ExtractorError::InvalidFormat(_)));
    }

    #[tokio::test]
    async fn test_base_phase_restricts_vocabulary() {
        let oracle = MockOracle::new(RESPONSE);
        let extractor = OracleExtractor::new(Arc::new(oracle.clone()), ExtractorConfig::default());

        let c = chunk();
        let schema = SchemaSelection::default();
        let graph = Graph::new();
        let request = OracleRequest {
            chunk: &c,
            schema: &schema,
            graph: &graph,
            phase: Phase::Base,
            frozen: false,
            concept_registry: Some("- tex:ring | Definition | Ring"),
        };
        let result = extractor.extract(request).await.unwrap();

        // Formulas are outside the phase-1 vocabulary
        assert!(result.nodes.iter().all(|n| n.entity_type == EntityType::Definition));
        assert!(result.edges.is_empty());

        let prompts = oracle.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Phase 1"));
        assert!(prompts[0].contains("- tex:ring | Definition | Ring"));
        assert!(!prompts[0].contains("- Formula\n"));
    }

    #[tokio::test]
    async fn test_prompt_includes_relevant_summary() {
        let oracle = MockOracle::default();
        let extractor = OracleExtractor::new(Arc::new(oracle.clone()), ExtractorConfig::default());

        let c = chunk();
        let schema = SchemaSelection::default();
        let graph = Graph {
            nodes: vec![GraphNode::new("tex:field", EntityType::Definition, "Field")],
            edges: vec![],
        };
        extractor.extract(OracleRequest::single(&c, &schema, &graph)).await.unwrap();
        assert!(oracle.prompts()[0].contains("- tex:field | Definition | Field"));
    }

    #[tokio::test]
    async fn test_align_concepts_filters_decisions() {
        let oracle = MockOracle::new(
            r#"{"decisions": [
                {"alias": "n2", "canonical": "n1", "confidence": 0.95},
                {"alias": "n3", "canonical": "n1", "confidence": 0.5},
                {"alias": "n1", "canonical": "outside", "confidence": 0.99}
            ]}"#,
        );
        let extractor = OracleExtractor::new(Arc::new(oracle.clone()), ExtractorConfig::default());
        let nodes = vec![
            GraphNode::new("n1", EntityType::Definition, "Group"),
            GraphNode::new("n2", EntityType::Notation, "Group notation"),
            GraphNode::new("n3", EntityType::Construction, "Group construction"),
            GraphNode::new("tex:labeled", EntityType::Definition, "Labeled"),
            GraphNode::new("t", EntityType::Theorem, "Not a concept"),
        ];
        let decisions = extractor.align_concepts(&nodes).await.unwrap();
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].alias, "n2");

        let prompt = &oracle.prompts()[0];
        assert!(!prompt.contains("tex:labeled"));
        assert!(!prompt.contains("- id: t\n"));
    }

    #[tokio::test]
    async fn test_align_without_candidates_skips_oracle() {
        let oracle = MockOracle::default();
        let extractor = OracleExtractor::new(Arc::new(oracle.clone()), ExtractorConfig::default());
        let nodes = vec![GraphNode::new("t", EntityType::Theorem, "T")];
        assert!(extractor.align_concepts(&nodes).await.unwrap().is_empty());
        assert_eq!(oracle.call_count(), 0);
    }
}
