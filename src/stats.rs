use crate::record::{CanonicalRecord, RecordStatus};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct ResolutionStats {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub processed: usize,
    pub succeeded: usize,
    pub invalid: usize,
    /// Failure causes and how often each occurred.
    pub causes: HashMap<String, usize>,
}

/// Run-level ledger shared across concurrent resolutions.
#[derive(Debug, Clone)]
pub struct RunStats {
    stats: Arc<RwLock<ResolutionStats>>,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(RwLock::new(ResolutionStats {
                start_time: Utc::now(),
                end_time: None,
                processed: 0,
                succeeded: 0,
                invalid: 0,
                causes: HashMap::new(),
            })),
        }
    }

    pub fn record(&self, record: &CanonicalRecord) {
        let mut stats = self.stats.write();
        stats.processed += 1;
        match &record.status {
            RecordStatus::Success => stats.succeeded += 1,
            RecordStatus::Invalid(reason) => {
                stats.invalid += 1;
                *stats.causes.entry(reason.clone()).or_insert(0) += 1;
            }
        }
    }

    pub fn finish(&self) {
        self.stats.write().end_time = Some(Utc::now());
    }

    pub fn snapshot(&self) -> ResolutionStats {
        self.stats.read().clone()
    }

    pub fn print_summary(&self) {
        let stats = self.stats.read();
        let duration = stats
            .end_time
            .unwrap_or_else(Utc::now)
            .signed_duration_since(stats.start_time);

        eprintln!("\nResolution Summary:");
        eprintln!("===================");
        eprintln!("Duration: {} seconds", duration.num_seconds());
        eprintln!("Processed: {}", stats.processed);
        eprintln!("Successful: {}", stats.succeeded);
        eprintln!("Failed/Invalid: {}", stats.invalid);

        if !stats.causes.is_empty() {
            eprintln!("\nFailure Causes:");
            for (cause, count) in &stats.causes {
                eprintln!("  {cause}: {count}");
            }
        }
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}
