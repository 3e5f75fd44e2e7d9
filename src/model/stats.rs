//! Counters reported by a document rewrite.

use serde::{Deserialize, Serialize};

/// Statistics accumulated across a whole document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformStats {
    /// Pages visited, in document order
    pub pages_processed: u32,

    /// Runs whose text changed (drawn or attempted)
    pub spans_modified: u32,

    /// Runs drawn with the minimal fallback style
    pub spans_degraded: u32,

    /// Runs erased but not redrawn because both draw attempts failed
    pub spans_skipped: u32,
}

impl TransformStats {
    /// Fold one page's outcome into the totals.
    pub fn record_page(&mut self, outcome: RewriteOutcome) {
        self.pages_processed += 1;
        self.spans_modified += outcome.modified;
        self.spans_degraded += outcome.degraded;
        self.spans_skipped += outcome.skipped;
    }

    /// Whether any text was rewritten.
    pub fn has_changes(&self) -> bool {
        self.spans_modified > 0
    }
}

/// What happened to the runs of a single page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub modified: u32,
    pub degraded: u32,
    pub skipped: u32,
}

/// A rewritten document together with its statistics.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    /// Serialized PDF
    pub data: Vec<u8>,
    pub stats: TransformStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_page() {
        let mut stats = TransformStats::default();
        stats.record_page(RewriteOutcome::default());
        stats.record_page(RewriteOutcome {
            modified: 3,
            degraded: 1,
            skipped: 1,
        });

        assert_eq!(stats.pages_processed, 2);
        assert_eq!(stats.spans_modified, 3);
        assert_eq!(stats.spans_degraded, 1);
        assert_eq!(stats.spans_skipped, 1);
        assert!(stats.has_changes());
    }

    #[test]
    fn test_stats_json() {
        let stats = TransformStats {
            pages_processed: 1,
            spans_modified: 2,
            ..Default::default()
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"pages_processed\":1"));
        assert!(json.contains("\"spans_modified\":2"));
    }
}
