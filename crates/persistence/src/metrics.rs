//! Query timing and pool gauges for repositories.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;
use tracing::warn;

/// Queries slower than this are logged as well as measured.
const SLOW_QUERY_SECS: f64 = 0.5;

pub fn record_query_duration(query_name: &'static str, duration_secs: f64) {
    histogram!("database_query_duration_seconds", "query" => query_name).record(duration_secs);
    if duration_secs > SLOW_QUERY_SECS {
        warn!(
            query = query_name,
            duration_ms = (duration_secs * 1000.0) as u64,
            "Slow query"
        );
    }
}

/// Publishes connection pool gauges. Called from the readiness probe.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size();
    let idle = pool.num_idle() as u32;
    let busy = size.saturating_sub(idle);
    let max = pool.options().get_max_connections().max(1);

    gauge!("database_connections_active").set(f64::from(busy));
    gauge!("database_connections_idle").set(f64::from(idle));
    gauge!("database_pool_utilization").set(f64::from(busy) / f64::from(max));
}

/// Times a repository call.
///
/// ```ignore
/// let timer = QueryTimer::new("find_leave");
/// let result = sqlx::query_as::<_, LeaveEntity>(...).fetch_optional(&pool).await;
/// timer.record();
/// result
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    pub fn record(self) {
        record_query_duration(self.query_name, self.start.elapsed().as_secs_f64());
    }
}
