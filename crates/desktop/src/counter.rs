//! Retro visitor counter
//!
//! The page carries a badge image (`#visitor-badge`) and six
//! `.counter-digit` cells. The counter shows a stored or default count,
//! zero-padded to the number of cells.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tree::{NodeId, Tree};

/// Digit cells on the counter
pub const DIGIT_COUNT: usize = 6;

/// Count shown when nothing else is known
pub const DEFAULT_COUNT: &str = "001998";

#[derive(Debug, Error)]
pub enum CounterError {
    #[error("visitor counter elements not found")]
    MissingElements,

    #[error("counter store IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("counter store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Left-pad a count to [`DIGIT_COUNT`] digits.
///
/// Counts too wide for the cells saturate at all nines.
pub fn format_count(count: &str) -> String {
    if count.chars().count() > DIGIT_COUNT {
        return "9".repeat(DIGIT_COUNT);
    }
    format!("{count:0>width$}", width = DIGIT_COUNT)
}

/// Persistent visit count
pub trait CounterStore {
    fn load(&self) -> Result<u64, CounterError>;
    fn save(&self, count: u64) -> Result<(), CounterError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredCount {
    count: u64,
}

/// Stores `{ "count": n }` in a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CounterStore for JsonFileStore {
    /// A missing file counts as zero
    fn load(&self) -> Result<u64, CounterError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str::<StoredCount>(&text)?.count),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(source) => Err(CounterError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn save(&self, count: u64) -> Result<(), CounterError> {
        let json = serde_json::to_string(&StoredCount { count })?;
        std::fs::write(&self.path, json).map_err(|source| CounterError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Bump the stored count and return the new value
pub fn increment_visit(store: &dyn CounterStore) -> Result<u64, CounterError> {
    let next = store.load()?.saturating_add(1);
    store.save(next)?;
    Ok(next)
}

/// Handles into the counter elements of a page
#[derive(Debug, Clone)]
pub struct VisitorCounter {
    badge: NodeId,
    digits: Vec<NodeId>,
}

impl VisitorCounter {
    /// Locate the badge and digit cells
    pub fn attach(tree: &mut Tree) -> Result<Self, CounterError> {
        let badge = tree.find_by_id("visitor-badge").ok_or(CounterError::MissingElements)?;
        let digits = tree.find_all_by_class(tree.root(), "counter-digit");
        if digits.is_empty() {
            return Err(CounterError::MissingElements);
        }
        tree.set_attr(badge, "crossorigin", "anonymous");
        tracing::info!(digits = digits.len(), "initializing visitor counter");
        Ok(Self { badge, digits })
    }

    pub fn badge(&self) -> NodeId {
        self.badge
    }

    /// Write a count into the digit cells
    pub fn display(&self, tree: &mut Tree, count: &str) {
        let padded = format_count(count);
        let mut chars = padded.chars();
        for &digit in &self.digits {
            let c = chars.next().unwrap_or('0');
            tree.set_text(digit, c.to_string());
        }
    }
}
