//! Processing statistics over a tenant's logs

use absentia_domain::{ProcessingLog, ProcessingStatus};
use serde::Serialize;

/// Aggregate figures over processing logs
///
/// Rates are percentages of all runs. The average confidence only covers
/// runs that produced a score.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessingStats {
    /// Runs recorded
    pub total_processed: usize,

    /// Runs closed as completed
    pub successful_processed: usize,

    /// Runs closed as failed
    pub failed_processed: usize,

    /// Runs still open
    pub in_progress: usize,

    /// Runs linked to a created record
    pub auto_created_records: usize,

    /// Mean confidence of scored runs
    pub avg_confidence_score: f64,

    /// Cost in USD across runs
    pub total_cost: f64,

    /// Tokens billed across runs
    pub total_tokens: u64,

    /// `successful_processed / total_processed`, in percent
    pub success_rate: f64,

    /// `auto_created_records / total_processed`, in percent
    pub auto_creation_rate: f64,

    #[serde(skip)]
    confidence_sum: f64,

    #[serde(skip)]
    scored_runs: usize,
}

impl ProcessingStats {
    /// Create empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate a set of logs
    pub fn from_logs<'a>(logs: impl IntoIterator<Item = &'a ProcessingLog>) -> Self {
        let mut stats = Self::new();
        for log in logs {
            stats.record(log);
        }
        stats
    }

    /// Add one log to the figures
    pub fn record(&mut self, log: &ProcessingLog) {
        self.total_processed += 1;
        match log.status {
            ProcessingStatus::Completed => self.successful_processed += 1,
            ProcessingStatus::Failed => self.failed_processed += 1,
            ProcessingStatus::Processing => self.in_progress += 1,
        }
        if log.related_record_id.is_some() {
            self.auto_created_records += 1;
        }
        if let Some(score) = log.confidence_score {
            self.confidence_sum += score;
            self.scored_runs += 1;
        }
        self.total_cost += log.cost_usd;
        self.total_tokens += log.tokens_used;
        self.refresh_ratios();
    }

    fn refresh_ratios(&mut self) {
        self.avg_confidence_score = if self.scored_runs == 0 {
            0.0
        } else {
            self.confidence_sum / self.scored_runs as f64
        };
        self.success_rate = percent(self.successful_processed, self.total_processed);
        self.auto_creation_rate = percent(self.auto_created_records, self.total_processed);
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let lines = [
            "Processing Summary".to_string(),
            "==================".to_string(),
            format!("Runs: {}", self.total_processed),
            format!("  Completed: {}", self.successful_processed),
            format!("  Failed: {}", self.failed_processed),
            format!("  In progress: {}", self.in_progress),
            format!("Records created: {}", self.auto_created_records),
            format!("Success rate: {:.1}%", self.success_rate),
            format!("Auto-creation rate: {:.1}%", self.auto_creation_rate),
            format!("Average confidence: {:.2}", self.avg_confidence_score),
            format!("Tokens: {}", self.total_tokens),
            format!("Cost: ${:.4}", self.total_cost),
        ];
        lines.join("\n")
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}
