//! The extraction orchestrator

use crate::config::{ExtractionMode, PipelineConfig};
use crate::error::PipelineError;
use crate::status::{summarize_warnings, PipelineProgress, PipelineReport, PipelineStatus};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use texkg_domain::{
    ExtractionOracle, ExtractionResult, Graph, LatexChunk, SchemaSelection, SnapshotId, SnapshotStore,
    SourceFile,
};
use texkg_extractor::{
    concept_registry, ChunkPreview, ExtractorError, LatexSegmenter, LocalExtractor, OracleExtractor,
    OracleRequest, Phase,
};
use texkg_store::{GraphStore, StoreError};
use texkg_unifier::{apply_alias_mapping, freeze_namespace, AliasMap};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Snapshot persistence the pipeline saves into
pub type BoxedSnapshotStore = Box<dyn SnapshotStore<Error = StoreError> + Send>;

type ChunkOutcome = (usize, Result<ExtractionResult, ExtractorError>);

type SaveTask = JoinHandle<Result<SnapshotId, String>>;

/// Whether a stage ran to completion or observed cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Completed,
    Cancelled,
}

#[derive(Debug, Default)]
struct RunState {
    chunks: usize,
    commit_order: Vec<usize>,
    warnings: Vec<String>,
    oracle_commits: usize,
    snapshots_saved: usize,
    merged_concepts: usize,
    saving: Option<SaveTask>,
}

/// Drives segmentation, extraction, unification and merging
///
/// The pipeline owns the graph store; extraction only ever sees immutable
/// snapshots, and every mutation happens at a commit point inside
/// [`start`](Self::start).
///
/// # Examples
///
/// ```
/// use texkg_domain::{SchemaSelection, SourceFile};
/// use texkg_pipeline::{Pipeline, PipelineConfig, PipelineStatus};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let files = vec![SourceFile::new(
///     "a.tex",
///     "\\begin{definition}\\label{def:x}An object $x$.\\end{definition}",
/// )];
/// let mut pipeline = Pipeline::new(PipelineConfig::local(), SchemaSelection::default());
/// let report = pipeline.start(&files, CancellationToken::new()).await?;
/// assert_eq!(report.status, PipelineStatus::Done);
/// assert!(pipeline.graph().contains_node("tex:x"));
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    schema: SchemaSelection,
    store: GraphStore,
    oracle: Option<Arc<dyn ExtractionOracle>>,
    snapshots: Option<Arc<Mutex<BoxedSnapshotStore>>>,
    alias_map: Option<AliasMap>,
    progress: watch::Sender<PipelineProgress>,
}

impl Pipeline {
    /// Create an idle pipeline over an empty graph
    pub fn new(config: PipelineConfig, schema: SchemaSelection) -> Self {
        let (progress, _) = watch::channel(PipelineProgress::default());
        Self {
            config,
            schema,
            store: GraphStore::new(),
            oracle: None,
            snapshots: None,
            alias_map: None,
            progress,
        }
    }

    /// Start from an existing graph (incremental extraction)
    pub fn with_graph(mut self, graph: Graph) -> Self {
        self.store = GraphStore::from_graph(graph);
        self
    }

    /// Attach the oracle used in oracle mode
    pub fn with_oracle(mut self, oracle: Arc<dyn ExtractionOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Attach a snapshot store for periodic saves
    pub fn with_snapshot_store(mut self, store: BoxedSnapshotStore) -> Self {
        self.snapshots = Some(Arc::new(Mutex::new(store)));
        self
    }

    /// Active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Schema selection in effect
    pub fn schema(&self) -> &SchemaSelection {
        &self.schema
    }

    /// The graph store
    pub fn graph(&self) -> &GraphStore {
        &self.store
    }

    /// Consume the pipeline, returning the graph
    pub fn into_graph(self) -> Graph {
        self.store.into_graph()
    }

    /// Alias map from the most recent freeze, if any
    pub fn alias_map(&self) -> Option<&AliasMap> {
        self.alias_map.as_ref()
    }

    /// Current state
    pub fn status(&self) -> PipelineStatus {
        self.progress.borrow().status
    }

    /// Copy of the current progress
    pub fn progress(&self) -> PipelineProgress {
        self.progress.borrow().clone()
    }

    /// Watch progress updates
    pub fn subscribe(&self) -> watch::Receiver<PipelineProgress> {
        self.progress.subscribe()
    }

    /// Segmenter built from the extractor settings
    pub fn segmenter(&self) -> LatexSegmenter {
        let extractor = &self.config.extractor;
        LatexSegmenter::new(extractor.granularity, extractor.token_budget())
    }

    /// Chunk count and leading titles under the configured segmentation
    pub fn preview(&self, files: &[SourceFile]) -> ChunkPreview {
        self.segmenter().preview(files, self.config.extractor.preview_titles)
    }

    /// Run the pipeline over `files`
    ///
    /// Returns a report for completed and cancelled runs. Per-chunk oracle
    /// failures are warnings on the report; anything else ends the run in
    /// [`PipelineStatus::Error`] and is returned as an error. Cancellation
    /// is checked first, so a cancelled run is never reported as failed.
    pub async fn start(
        &mut self,
        files: &[SourceFile],
        cancel: CancellationToken,
    ) -> Result<PipelineReport, PipelineError> {
        self.progress.send_replace(PipelineProgress {
            status: PipelineStatus::Chunking,
            ..PipelineProgress::default()
        });

        let mut run = RunState::default();
        let outcome = self.run(files, &cancel, &mut run).await;
        finish_save(&mut run).await;

        let status = match &outcome {
            _ if cancel.is_cancelled() => PipelineStatus::Stopped,
            Ok(Flow::Completed) => PipelineStatus::Done,
            Ok(Flow::Cancelled) => PipelineStatus::Stopped,
            Err(_) => PipelineStatus::Error,
        };

        if let (PipelineStatus::Error, Err(e)) = (status, outcome) {
            warn!("Pipeline failed: {}", e);
            let message = e.to_string();
            self.progress.send_modify(|p| {
                p.status = PipelineStatus::Error;
                p.error = Some(message);
            });
            return Err(e);
        }

        let message = match status {
            PipelineStatus::Done => summarize_warnings(
                &format!("Extraction complete ({})", self.config.mode),
                &run.warnings,
            ),
            _ => {
                let p = self.progress.borrow();
                format!("Extraction stopped after {} of {} units", p.done_chunks, p.total_chunks)
            }
        };
        info!("{}", message);
        self.progress.send_modify(|p| {
            p.status = status;
            p.message = Some(message.clone());
        });

        Ok(PipelineReport {
            status,
            chunks: run.chunks,
            commit_order: run.commit_order,
            warnings: run.warnings,
            nodes: self.store.node_count(),
            edges: self.store.edge_count(),
            merged_concepts: run.merged_concepts,
            snapshots_saved: run.snapshots_saved,
            message,
        })
    }

    async fn run(
        &mut self,
        files: &[SourceFile],
        cancel: &CancellationToken,
        run: &mut RunState,
    ) -> Result<Flow, PipelineError> {
        if files.is_empty() {
            return Err(PipelineError::EmptyInput("no documents supplied".to_string()));
        }
        self.config.validate().map_err(PipelineError::Config)?;
        let oracle = match self.config.mode {
            ExtractionMode::Local => None,
            ExtractionMode::Oracle => Some(self.oracle.clone().ok_or_else(|| {
                PipelineError::Config("oracle mode requires a configured oracle".to_string())
            })?),
        };

        let chunks = self.segmenter().segment(files);
        if chunks.is_empty() {
            return Err(PipelineError::EmptyInput("documents contain no text".to_string()));
        }
        run.chunks = chunks.len();

        let phased = oracle.is_some() && self.config.phase_aware;
        let total = if phased { 2 * chunks.len() } else { chunks.len() };
        self.progress.send_modify(|p| {
            p.status = PipelineStatus::Extracting;
            p.total_chunks = total;
            p.done_chunks = 0;
        });
        info!(
            "Extracting {} chunks from {} files ({} mode)",
            chunks.len(),
            files.len(),
            self.config.mode
        );

        match oracle {
            None => Ok(self.run_local(&chunks, cancel, run)),
            Some(oracle) => self.run_oracle(oracle, &chunks, cancel, run).await,
        }
    }

    fn run_local(&mut self, chunks: &[LatexChunk], cancel: &CancellationToken, run: &mut RunState) -> Flow {
        let extractor = LocalExtractor::new();
        // Seeded from the existing graph so new chunks link to earlier runs
        let mut labels = self.store.label_index();

        for (idx, chunk) in chunks.iter().enumerate() {
            if cancel.is_cancelled() {
                return Flow::Cancelled;
            }
            self.set_current(chunk);
            let result = extractor.extract(chunk, &self.schema, &mut labels);
            self.commit(idx, result, run);
            self.progress.send_modify(|p| p.done_chunks = idx + 1);
        }
        Flow::Completed
    }

    async fn run_oracle(
        &mut self,
        oracle: Arc<dyn ExtractionOracle>,
        chunks: &[LatexChunk],
        cancel: &CancellationToken,
        run: &mut RunState,
    ) -> Result<Flow, PipelineError> {
        let extractor = Arc::new(
            OracleExtractor::new(oracle, self.config.extractor.clone()).with_sampling(self.config.sampling),
        );
        info!("Oracle model: {}", extractor.model_name());
        self.alias_map = None;

        if !self.config.phase_aware {
            return self
                .run_ordered(extractor, chunks, Phase::Single, 0, cancel, run)
                .await;
        }

        if self.run_base_phase(&extractor, chunks, cancel, run).await == Flow::Cancelled {
            return Ok(Flow::Cancelled);
        }
        if self.freeze(&extractor, cancel, run).await == Flow::Cancelled {
            return Ok(Flow::Cancelled);
        }
        self.run_ordered(extractor, chunks, Phase::Rest, chunks.len(), cancel, run)
            .await
    }

    /// Phase 1: base concepts, one chunk at a time
    ///
    /// Each prompt carries the concept registry of the graph as committed so
    /// far, so no call may start before the previous one is merged.
    async fn run_base_phase(
        &mut self,
        extractor: &OracleExtractor,
        chunks: &[LatexChunk],
        cancel: &CancellationToken,
        run: &mut RunState,
    ) -> Flow {
        info!("Phase 1: base concepts over {} chunks", chunks.len());
        for (idx, chunk) in chunks.iter().enumerate() {
            if cancel.is_cancelled() {
                return Flow::Cancelled;
            }
            self.set_current(chunk);

            let graph = self.store.snapshot();
            let registry = concept_registry(&graph, self.config.extractor.registry_max_entries);
            let request = OracleRequest {
                chunk,
                schema: &self.schema,
                graph: &graph,
                phase: Phase::Base,
                frozen: false,
                concept_registry: (!registry.is_empty()).then_some(registry.as_str()),
            };
            let outcome = tokio::select! {
                _ = cancel.cancelled() => return Flow::Cancelled,
                outcome = extractor.extract(request) => outcome,
            };

            let result = recover(idx, outcome);
            if cancel.is_cancelled() {
                return Flow::Cancelled;
            }
            self.commit(idx, result, run);
            self.after_oracle_commit(run).await;
            self.progress.send_modify(|p| p.done_chunks = idx + 1);
        }
        Flow::Completed
    }

    /// Optional alignment, then freeze the namespace and replace the graph
    async fn freeze(&mut self, extractor: &OracleExtractor, cancel: &CancellationToken, run: &mut RunState) -> Flow {
        let mut decisions = Vec::new();
        if self.config.align_concepts {
            let outcome = tokio::select! {
                _ = cancel.cancelled() => return Flow::Cancelled,
                outcome = extractor.align_concepts(self.store.nodes()) => outcome,
            };
            match outcome {
                Ok(found) => decisions = found,
                Err(e) => {
                    warn!("Concept alignment failed: {}", e);
                    run.warnings.push(format!("concept alignment failed: {}", e));
                }
            }
        }
        if cancel.is_cancelled() {
            return Flow::Cancelled;
        }

        let frozen = freeze_namespace(&self.store.snapshot(), &decisions);
        run.merged_concepts = frozen.merged;
        self.store.replace(frozen.graph);
        self.alias_map = Some(frozen.alias_map);
        Flow::Completed
    }

    /// Bounded-concurrency extraction with strictly in-order commits
    ///
    /// Up to `concurrency` calls are in flight. A result arriving ahead of
    /// its turn waits in the sequencing buffer until every earlier chunk has
    /// been committed. After cancellation or failure, in-flight calls are
    /// aborted and drained before returning.
    async fn run_ordered(
        &mut self,
        extractor: Arc<OracleExtractor>,
        chunks: &[LatexChunk],
        phase: Phase,
        progress_offset: usize,
        cancel: &CancellationToken,
        run: &mut RunState,
    ) -> Result<Flow, PipelineError> {
        let total = chunks.len();
        let limit = self.config.effective_concurrency();
        let frozen = self.alias_map.is_some();
        let schema = Arc::new(self.schema.clone());
        info!("Phase 2: {} chunks, concurrency {}", total, limit);

        let mut tasks: JoinSet<ChunkOutcome> = JoinSet::new();
        let mut pending: BTreeMap<usize, ExtractionResult> = BTreeMap::new();
        let mut next_dispatch = 0;
        let mut next_commit = 0;
        let mut flow = Flow::Completed;
        let mut failure = None;

        'run: while next_commit < total {
            while !cancel.is_cancelled() && next_dispatch < total && tasks.len() < limit {
                let idx = next_dispatch;
                next_dispatch += 1;

                let chunk = chunks[idx].clone();
                self.set_current(&chunk);
                let graph = self.store.snapshot();
                let extractor = Arc::clone(&extractor);
                let schema = Arc::clone(&schema);
                tasks.spawn(async move {
                    let request = OracleRequest {
                        chunk: &chunk,
                        schema: &schema,
                        graph: &graph,
                        phase,
                        frozen,
                        concept_registry: None,
                    };
                    (idx, extractor.extract(request).await)
                });
                debug!("Dispatched chunk {} ({} in flight)", idx, tasks.len());
            }

            while let Some(result) = pending.remove(&next_commit) {
                if cancel.is_cancelled() {
                    flow = Flow::Cancelled;
                    break 'run;
                }
                let result = match &self.alias_map {
                    Some(map) => apply_alias_mapping(result, map),
                    None => result,
                };
                self.commit(next_commit, result, run);
                self.after_oracle_commit(run).await;
                next_commit += 1;
                let done = progress_offset + next_commit;
                self.progress.send_modify(|p| p.done_chunks = done);
            }
            if next_commit >= total {
                break;
            }
            if cancel.is_cancelled() {
                flow = Flow::Cancelled;
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    flow = Flow::Cancelled;
                    break;
                }
                joined = tasks.join_next() => match joined {
                    Some(Ok((idx, outcome))) => {
                        debug!("Chunk {} finished, waiting for chunk {}", idx, next_commit);
                        pending.insert(idx, recover(idx, outcome));
                    }
                    Some(Err(e)) => {
                        failure = Some(PipelineError::Task(e.to_string()));
                        break;
                    }
                    None => {
                        failure = Some(PipelineError::Task(format!(
                            "no extraction in flight for chunk {}",
                            next_commit
                        )));
                        break;
                    }
                },
            }
        }

        if !tasks.is_empty() {
            debug!("Draining {} in-flight extractions", tasks.len());
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(flow),
        }
    }

    fn set_current(&self, chunk: &LatexChunk) {
        let title = chunk.display_title();
        self.progress.send_modify(|p| p.current_chunk_title = Some(title));
    }

    /// Merge one chunk's result; the only place the graph grows
    fn commit(&mut self, idx: usize, result: ExtractionResult, run: &mut RunState) {
        let stats = self.store.merge(result.nodes, result.edges);
        debug!(
            "Committed chunk {}: +{} nodes, ~{} nodes, +{} edges",
            idx, stats.nodes_added, stats.nodes_updated, stats.edges_added
        );
        run.warnings.extend(result.warnings);
        run.commit_order.push(idx);
    }

    /// Count an oracle commit and start a snapshot save on schedule
    ///
    /// Saves run on the blocking pool, one at a time so snapshots land in
    /// commit order. Snapshot failures are logged and otherwise ignored.
    async fn after_oracle_commit(&mut self, run: &mut RunState) {
        run.oracle_commits += 1;
        let every = self.config.snapshot_every;
        if every == 0 || run.oracle_commits % every != 0 {
            return;
        }
        let Some(snapshots) = self.snapshots.as_ref().map(Arc::clone) else {
            return;
        };
        finish_save(run).await;

        let graph = self.store.snapshot();
        let schema = self.schema.clone();
        let note = format!("auto: {} oracle calls", run.oracle_commits);
        run.saving = Some(tokio::task::spawn_blocking(move || {
            let mut store = snapshots
                .lock()
                .map_err(|_| "snapshot store lock poisoned".to_string())?;
            store
                .save(&graph, &schema, Some(note.as_str()))
                .map_err(|e| e.to_string())
        }));
    }
}

/// Wait for the in-flight snapshot save, if any
async fn finish_save(run: &mut RunState) {
    let Some(task) = run.saving.take() else {
        return;
    };
    match task.await {
        Ok(Ok(id)) => {
            run.snapshots_saved += 1;
            debug!("Saved snapshot {}", id);
        }
        Ok(Err(e)) => warn!("Snapshot save failed: {}", e),
        Err(e) => warn!("Snapshot task failed: {}", e),
    }
}

/// An oracle failure becomes an empty result carrying one warning
fn recover(idx: usize, outcome: Result<ExtractionResult, ExtractorError>) -> ExtractionResult {
    match outcome {
        Ok(result) => result,
        Err(e) => {
            warn!("Chunk {} failed: {}", idx, e);
            ExtractionResult::from_warning(format!("chunk {} failed: {}", idx, e))
        }
    }
}
