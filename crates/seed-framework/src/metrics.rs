//! Metrics collected over a seeding run.

use std::time::Duration;

/// Counters and timings of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedMetrics {
    /// Tables created (junction tables included).
    pub tables_created: u64,
    /// Initial passes completed.
    pub initial_passes: u64,
    /// Continuous passes completed.
    pub continuous_passes: u64,
    /// Records produced by the generator, fan-out included.
    pub records_generated: u64,
    /// Records written by INSERT.
    pub records_flushed: u64,
    /// Rows rewritten by continuous-mode updates.
    pub records_updated: u64,
    /// Rows removed by continuous-mode deletes.
    pub records_deleted: u64,
    /// Update / delete candidates dropped because the entity does not allow them.
    pub mutations_skipped: u64,
    /// Time spent generating records.
    pub generation_duration: Duration,
    /// Time spent in backend writes.
    pub flush_duration: Duration,
    /// Total time taken.
    pub total_duration: Duration,
}

impl SeedMetrics {
    /// Calculate flushed records per second.
    pub fn records_per_second(&self) -> f64 {
        if self.total_duration.as_secs_f64() > 0.0 {
            self.records_flushed as f64 / self.total_duration.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn passes(&self) -> u64 {
        self.initial_passes + self.continuous_passes
    }

    /// Get a summary of the run.
    pub fn summary(&self) -> String {
        format!(
            "Seeding completed in {:?}\n\
             Tables: {}\n\
             Passes: {} initial, {} continuous\n\
             Records: {} generated in {:?}, {} flushed in {:?} ({:.2} records/sec)\n\
             Mutations: {} updated, {} deleted, {} skipped",
            self.total_duration,
            self.tables_created,
            self.initial_passes,
            self.continuous_passes,
            self.records_generated,
            self.generation_duration,
            self.records_flushed,
            self.flush_duration,
            self.records_per_second(),
            self.records_updated,
            self.records_deleted,
            self.mutations_skipped,
        )
    }
}
