use crate::engines::adaptive::EliteEntry;
use crate::error::{EvotradeError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persistence collaborator: best candidates per generation, keyed by
/// strategy name and generation index.
pub trait CandidateStore: Send {
    fn save_generation(
        &mut self,
        strategy_name: &str,
        generation_index: usize,
        elites: &[EliteEntry],
    ) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct GenerationRecord {
    strategy_name: String,
    generation_index: usize,
    saved_at: DateTime<Utc>,
    elites: Vec<EliteEntry>,
}

/// One JSON file per (strategy, generation) under a root directory.
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)
            .map_err(|e| EvotradeError::Storage(format!("{}: {}", root.display(), e)))?;
        Ok(Self { root })
    }

    fn path_for(&self, strategy_name: &str, generation_index: usize) -> PathBuf {
        self.root
            .join(format!("{}_gen{:04}.json", strategy_name, generation_index))
    }
}

impl CandidateStore for JsonFileStore {
    fn save_generation(
        &mut self,
        strategy_name: &str,
        generation_index: usize,
        elites: &[EliteEntry],
    ) -> Result<()> {
        let record = GenerationRecord {
            strategy_name: strategy_name.to_string(),
            generation_index,
            saved_at: Utc::now(),
            elites: elites.to_vec(),
        };

        let path = self.path_for(strategy_name, generation_index);
        let json = serde_json::to_string_pretty(&record)?;
        std::fs::write(&path, json)
            .map_err(|e| EvotradeError::Storage(format!("{}: {}", path.display(), e)))?;
        log::debug!("Saved {} elites to {}", elites.len(), path.display());
        Ok(())
    }
}
