use crate::types::{ParamValue, StrategyCandidate, StrategyPerformance};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EliteEntry {
    pub candidate: StrategyCandidate,
    pub performance: StrategyPerformance,
}

/// Bounded roster of the historically best candidates, ranked by
/// outperformance. Incoming generations are merged, never swapped in
/// wholesale, so the best retained score can only rise.
pub struct EliteRoster {
    entries: Vec<EliteEntry>,
    capacity: usize,
    seen_signatures: HashSet<String>,
}

impl EliteRoster {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
            seen_signatures: HashSet::new(),
        }
    }

    /// Attempt to add one scored candidate. Parameter-identical duplicates
    /// are rejected; otherwise the roster is re-ranked and trimmed from the
    /// tail.
    pub fn try_add(&mut self, candidate: StrategyCandidate, performance: StrategyPerformance) -> bool {
        let signature = canonical_signature(&candidate);
        if self.seen_signatures.contains(&signature) {
            return false;
        }

        self.entries.push(EliteEntry {
            candidate,
            performance,
        });
        self.seen_signatures.insert(signature);
        self.sort_and_trim();
        true
    }

    fn sort_and_trim(&mut self) {
        self.entries.sort_by(|a, b| {
            b.performance
                .outperformance
                .partial_cmp(&a.performance.outperformance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        while self.entries.len() > self.capacity {
            if let Some(removed) = self.entries.pop() {
                self.seen_signatures
                    .remove(&canonical_signature(&removed.candidate));
            }
        }
    }

    pub fn best(&self) -> Option<&EliteEntry> {
        self.entries.first()
    }

    pub fn best_outperformance(&self) -> f64 {
        self.best()
            .map(|e| e.performance.outperformance)
            .unwrap_or(f64::NEG_INFINITY)
    }

    pub fn entries(&self) -> &[EliteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Order-stable signature of a candidate's parameters, for deduplication.
pub fn canonical_signature(candidate: &StrategyCandidate) -> String {
    let ordered: BTreeMap<&str, &ParamValue> = candidate
        .parameters
        .iter()
        .map(|(k, v)| (k.as_str(), v))
        .collect();
    format!(
        "{}:{}",
        candidate.strategy_name,
        serde_json::to_string(&ordered).unwrap_or_default()
    )
}
