use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRef;

use crate::{
    config::Config,
    notifier::Notifier,
    quiz::{bank::QuestionBank, session::SessionStore},
    repository::{ResultStore, RosterRepository},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub bank: Arc<QuestionBank>,
    pub roster: Arc<dyn RosterRepository>,
    pub results: Arc<dyn ResultStore>,
    pub notifier: Arc<dyn Notifier>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(
        config: Config,
        bank: QuestionBank,
        roster: Arc<dyn RosterRepository>,
        results: Arc<dyn ResultStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            bank: Arc::new(bank),
            roster,
            results,
            notifier,
            sessions: SessionStore::new(),
        }
    }

    pub fn quiz_duration(&self) -> Duration {
        Duration::from_secs(self.config.quiz_duration_secs)
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
