//! Command implementations.

pub mod extract;
pub mod preview;
pub mod prune;
pub mod snapshots;

pub use self::extract::execute_extract;
pub use self::preview::execute_preview;
pub use self::prune::execute_prune;
pub use self::snapshots::execute_snapshots;

use crate::error::{CliError, Result};
use std::str::FromStr;
use texkg_domain::ChunkGranularity;

fn parse_granularity(raw: &str) -> Result<ChunkGranularity> {
    ChunkGranularity::from_str(raw).map_err(|e| CliError::InvalidInput(e.to_string()))
}
