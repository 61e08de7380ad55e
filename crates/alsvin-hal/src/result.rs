//! Execution results and measurement counts.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Order in which bitstring characters map to qubits.
///
/// The core normalizes everything to [`BitOrder::BigEndian`] (leftmost
/// character is qubit 0); adapters record the vendor's native order here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitOrder {
    /// Leftmost character is qubit 0.
    #[default]
    BigEndian,
    /// Rightmost character is qubit 0.
    LittleEndian,
}

/// Histogram of measured bitstrings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counts(FxHashMap<String, u64>);

impl Counts {
    /// Create an empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create counts from (bitstring, count) pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (impl Into<String>, u64)>) -> Self {
        let mut counts = Self::new();
        for (bitstring, count) in pairs {
            counts.insert(bitstring.into(), count);
        }
        counts
    }

    /// Add occurrences of a bitstring.
    pub fn insert(&mut self, bitstring: impl Into<String>, count: u64) {
        *self.0.entry(bitstring.into()).or_insert(0) += count;
    }

    /// Occurrences of a bitstring (zero if absent).
    pub fn get(&self, bitstring: &str) -> u64 {
        self.0.get(bitstring).copied().unwrap_or(0)
    }

    /// Total number of recorded shots.
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    /// The most frequent outcome, if any.
    pub fn most_frequent(&self) -> Option<(&str, u64)> {
        self.0
            .iter()
            .max_by_key(|&(_, &count)| count)
            .map(|(bitstring, &count)| (bitstring.as_str(), count))
    }

    /// Iterate over (bitstring, count) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(bitstring, &count)| (bitstring.as_str(), count))
    }

    /// Number of distinct outcomes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no outcomes were recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reverse every bitstring, converting between endianness conventions.
    #[must_use]
    pub fn reversed_bits(&self) -> Counts {
        Counts(
            self.0
                .iter()
                .map(|(bitstring, &count)| (bitstring.chars().rev().collect(), count))
                .collect(),
        )
    }
}

/// Provenance attached to a result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    /// The vendor's native bit order before normalization.
    pub source_bit_order: BitOrder,
    /// Extra vendor fields worth keeping.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The outcome of a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Number of shots executed.
    pub shots: u32,
    /// Measured bitstring histogram, big-endian.
    pub counts: Counts,
    /// Wall-clock execution time, if the vendor reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_ms: Option<u64>,
    /// Time spent queued at the vendor, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_ms: Option<u64>,
    /// Provenance.
    #[serde(default)]
    pub metadata: ResultMetadata,
}

impl ExecutionResult {
    /// Create a result from counts and the executed shot count.
    pub fn new(counts: Counts, shots: u32) -> Self {
        Self {
            shots,
            counts,
            execution_ms: None,
            queue_ms: None,
            metadata: ResultMetadata::default(),
        }
    }

    /// Attach the execution time.
    #[must_use]
    pub fn with_execution_time(mut self, ms: u64) -> Self {
        self.execution_ms = Some(ms);
        self
    }

    /// Attach the queue time.
    #[must_use]
    pub fn with_queue_time(mut self, ms: u64) -> Self {
        self.queue_ms = Some(ms);
        self
    }

    /// Attach metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: ResultMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Successful results account for every shot.
    pub fn is_consistent(&self) -> bool {
        self.counts.total() == u64::from(self.shots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_accumulate() {
        let mut counts = Counts::new();
        counts.insert("00", 10);
        counts.insert("00", 5);
        counts.insert("11", 7);

        assert_eq!(counts.get("00"), 15);
        assert_eq!(counts.get("01"), 0);
        assert_eq!(counts.total(), 22);
        assert_eq!(counts.most_frequent(), Some(("00", 15)));
    }

    #[test]
    fn test_reversed_bits() {
        let counts = Counts::from_pairs([("100", 3u64), ("001", 1)]);
        let reversed = counts.reversed_bits();
        assert_eq!(reversed.get("001"), 3);
        assert_eq!(reversed.get("100"), 1);
    }

    #[test]
    fn test_result_consistency() {
        let counts = Counts::from_pairs([("00", 500u64), ("11", 500)]);
        let result = ExecutionResult::new(counts, 1000);
        assert!(result.is_consistent());

        let short = ExecutionResult::new(Counts::from_pairs([("0", 5u64)]), 1000);
        assert!(!short.is_consistent());
    }
}
