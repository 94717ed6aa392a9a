//! Observation of the statements the connector executes.

use crate::ast::ParameterizedValue;
use parking_lot::Mutex;
use query_structure::Query;
use tracing::debug;

/// What one executed statement did.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStats {
    /// The normalized query the statement was compiled from.
    pub query: Query,
    pub sql: String,
    /// Bound parameters in placeholder order.
    pub args: Vec<ParameterizedValue>,
    pub num_rows: usize,
    /// Number of leaf fields requested. Columns selected only to rebuild the
    /// result aren't counted.
    pub num_cols: usize,
}

/// Receives the stats of every executed statement. Implementations are shared
/// between concurrently running queries.
pub trait SqlMonitor: Send + Sync {
    fn query_mapped(&self, stats: SqlStats);
}

/// Collects stats in completion order.
#[derive(Debug, Default)]
pub struct SqlStatsMonitor {
    stats: Mutex<Vec<SqlStats>>,
}

impl SqlStatsMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything recorded so far.
    pub fn stats(&self) -> Vec<SqlStats> {
        self.stats.lock().clone()
    }

    /// Removes and returns everything recorded so far.
    pub fn take(&self) -> Vec<SqlStats> {
        std::mem::take(&mut *self.stats.lock())
    }
}

impl SqlMonitor for SqlStatsMonitor {
    fn query_mapped(&self, stats: SqlStats) {
        self.stats.lock().push(stats);
    }
}

/// Logs every statement as a `debug` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMonitor;

impl SqlMonitor for TracingMonitor {
    fn query_mapped(&self, stats: SqlStats) {
        debug!(
            query = %stats.query,
            sql = %stats.sql,
            args = ?stats.args,
            num_rows = stats.num_rows,
            num_cols = stats.num_cols,
            "executed statement"
        );
    }
}

/// Discards all stats.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMonitor;

impl SqlMonitor for NoopMonitor {
    fn query_mapped(&self, _: SqlStats) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tracing_test::traced_test;

    fn stats(sql: &str) -> SqlStats {
        SqlStats {
            query: Query::field("name"),
            sql: sql.to_owned(),
            args: Vec::new(),
            num_rows: 0,
            num_cols: 1,
        }
    }

    #[test]
    fn stats_are_kept_in_recording_order() {
        let monitor = Arc::new(SqlStatsMonitor::new());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let monitor = Arc::clone(&monitor);
                std::thread::spawn(move || monitor.query_mapped(stats(&format!("SELECT {i}"))))
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(monitor.stats().len(), 4);
        assert_eq!(monitor.take().len(), 4);
        assert!(monitor.stats().is_empty());
    }

    #[traced_test]
    #[test]
    fn tracing_monitor_logs_the_statement() {
        TracingMonitor.query_mapped(stats("SELECT `name` FROM `city`"));

        assert!(logs_contain("executed statement"));
        assert!(logs_contain("SELECT `name` FROM `city`"));
    }
}
