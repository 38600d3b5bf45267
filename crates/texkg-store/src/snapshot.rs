//! Snapshot persistence
//!
//! Snapshots hold the graph and the schema selection in effect. Oracle
//! credentials are never part of a snapshot.

use crate::StoreError;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use texkg_domain::{Graph, SchemaSelection, Snapshot, SnapshotId, SnapshotMeta, SnapshotStore};
use tracing::debug;

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn meta_for(graph: &Graph, note: Option<&str>) -> SnapshotMeta {
    SnapshotMeta {
        id: SnapshotId::new(),
        created_at: now_millis(),
        nodes: graph.nodes.len(),
        edges: graph.edges.len(),
        note: note.map(str::to_string),
    }
}

/// SQLite-based implementation of SnapshotStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe to share. Wrap the store in a
/// mutex when saving from a blocking task.
pub struct SqliteSnapshotStore {
    conn: Connection,
}

impl SqliteSnapshotStore {
    /// Open (or create) a snapshot database at the given path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    fn parse_id(raw: &str) -> Result<SnapshotId, StoreError> {
        raw.parse()
            .map_err(|e| StoreError::InvalidData(format!("Bad snapshot id {}: {}", raw, e)))
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    type Error = StoreError;

    fn save(
        &mut self,
        graph: &Graph,
        schema: &SchemaSelection,
        note: Option<&str>,
    ) -> Result<SnapshotId, Self::Error> {
        let meta = meta_for(graph, note);
        let graph_json = serde_json::to_string(graph)?;
        let schema_json = serde_json::to_string(schema)?;

        self.conn.execute(
            "INSERT INTO snapshots (id, created_at, node_count, edge_count, note, graph_json, schema_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                meta.id.to_string(),
                meta.created_at,
                meta.nodes as i64,
                meta.edges as i64,
                meta.note,
                graph_json,
                schema_json,
            ],
        )?;

        debug!(id = %meta.id, nodes = meta.nodes, edges = meta.edges, "Saved snapshot");
        Ok(meta.id)
    }

    fn list(&self) -> Result<Vec<SnapshotMeta>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, created_at, node_count, edge_count, note
             FROM snapshots ORDER BY created_at DESC, id DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        let mut metas = Vec::new();
        for row in rows {
            let (id, created_at, nodes, edges, note) = row?;
            metas.push(SnapshotMeta {
                id: Self::parse_id(&id)?,
                created_at,
                nodes: nodes as usize,
                edges: edges as usize,
                note,
            });
        }
        Ok(metas)
    }

    fn load(&self, id: SnapshotId) -> Result<Option<Snapshot>, Self::Error> {
        let row = self
            .conn
            .query_row(
                "SELECT created_at, node_count, edge_count, note, graph_json, schema_json
                 FROM snapshots WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((created_at, nodes, edges, note, graph_json, schema_json)) = row else {
            return Ok(None);
        };

        let graph: Graph = serde_json::from_str(&graph_json)?;
        let schema: SchemaSelection = serde_json::from_str(&schema_json)?;
        Ok(Some(Snapshot {
            meta: SnapshotMeta {
                id,
                created_at,
                nodes: nodes as usize,
                edges: edges as usize,
                note,
            },
            graph,
            schema,
        }))
    }

    fn delete_all(&mut self) -> Result<usize, Self::Error> {
        let n = self.conn.execute("DELETE FROM snapshots", [])?;
        Ok(n)
    }

    fn delete_all_but_latest(&mut self) -> Result<usize, Self::Error> {
        let latest = self.list()?.into_iter().next();
        let Some(latest) = latest else {
            return Ok(0);
        };
        let n = self.conn.execute(
            "DELETE FROM snapshots WHERE id != ?1",
            params![latest.id.to_string()],
        )?;
        Ok(n)
    }
}

/// In-process snapshot store
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshots: Vec<Snapshot>,
}

impl MemorySnapshotStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    type Error = StoreError;

    fn save(
        &mut self,
        graph: &Graph,
        schema: &SchemaSelection,
        note: Option<&str>,
    ) -> Result<SnapshotId, Self::Error> {
        let meta = meta_for(graph, note);
        let id = meta.id;
        self.snapshots.push(Snapshot {
            meta,
            graph: graph.clone(),
            schema: schema.clone(),
        });
        Ok(id)
    }

    fn list(&self) -> Result<Vec<SnapshotMeta>, Self::Error> {
        let mut metas: Vec<SnapshotMeta> = self.snapshots.iter().map(|s| s.meta.clone()).collect();
        metas.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(metas)
    }

    fn load(&self, id: SnapshotId) -> Result<Option<Snapshot>, Self::Error> {
        Ok(self.snapshots.iter().find(|s| s.meta.id == id).cloned())
    }

    fn delete_all(&mut self) -> Result<usize, Self::Error> {
        let n = self.snapshots.len();
        self.snapshots.clear();
        Ok(n)
    }

    fn delete_all_but_latest(&mut self) -> Result<usize, Self::Error> {
        let Some(latest) = self.list()?.into_iter().next() else {
            return Ok(0);
        };
        let before = self.snapshots.len();
        self.snapshots.retain(|s| s.meta.id == latest.id);
        Ok(before - self.snapshots.len())
    }
}
