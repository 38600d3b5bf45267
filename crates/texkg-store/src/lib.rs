//! texkg Storage Layer
//!
//! The mutable, mergeable knowledge graph plus snapshot persistence.
//!
//! # Architecture
//!
//! - [`GraphStore`]: in-memory node/edge dedup-by-key with patch semantics
//! - [`SqliteSnapshotStore`]: SQLite-backed implementation of `SnapshotStore`
//! - [`MemorySnapshotStore`]: in-process implementation for tests and dry runs
//! - JSON export/import of the graph data model
//!
//! # Examples
//!
//! ```no_run
//! use texkg_store::SqliteSnapshotStore;
//!
//! let store = SqliteSnapshotStore::new(":memory:").unwrap();
//! // Store is now ready for snapshot operations
//! ```

#![warn(missing_docs)]

mod error;
mod graph_store;
mod io;
mod snapshot;
mod view;

pub use error::StoreError;
pub use graph_store::{merge_graph, GraphStore, MergeStats, NodePatch};
pub use io::{export_graph_json, import_graph_json, read_graph_file, write_graph_file, GraphExport};
pub use snapshot::{MemorySnapshotStore, SqliteSnapshotStore};
pub use view::{filter_graph_view, ViewFilters};
