// src/worker.rs

use std::time::{Duration, Instant};

use crate::{quiz::flow, state::AppState};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub submitted: usize,
    pub purged: usize,
}

/// Auto-submits overdue quizzes nobody is polling and drops idle sessions.
/// Sessions busy with a request are skipped until the next pass.
pub async fn sweep_sessions(state: &AppState, now: Instant) -> SweepReport {
    let ttl = Duration::from_secs(state.config.session_ttl_secs);
    let mut report = SweepReport::default();
    let mut idle = Vec::new();

    for handle in state.sessions.handles() {
        let Ok(mut session) = handle.try_lock() else {
            continue;
        };
        if flow::expire_if_due(state, &mut session, now).await {
            report.submitted += 1;
        }
        if session.is_idle(now, ttl) {
            idle.push(session.id());
        }
    }

    for id in idle {
        if state.sessions.remove(&id) {
            report.purged += 1;
        }
    }
    report
}

pub async fn run_session_sweeper(state: AppState) {
    let period = Duration::from_secs(state.config.sweep_interval_secs.max(1));
    let mut ticker = tokio::time::interval(period);
    tracing::info!("Session sweeper running every {:?}", period);

    loop {
        ticker.tick().await;
        let report = sweep_sessions(&state, Instant::now()).await;
        if report != SweepReport::default() {
            tracing::info!(
                "Sweep: {} quiz(zes) auto-submitted, {} session(s) purged",
                report.submitted,
                report.purged
            );
        }
    }
}
