// src/quiz/session.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{question::AnswerValue, student::StudentIdentity},
    quiz::bank::QuestionBank,
};

/// Pages a student moves through. `AlreadyTaken` and `Result` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Home,
    Identify,
    Quiz,
    AlreadyTaken,
    Result,
}

impl Page {
    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::Identify => "identify",
            Page::Quiz => "quiz",
            Page::AlreadyTaken => "already_taken",
            Page::Result => "result",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Page::AlreadyTaken | Page::Result)
    }
}

/// Outcome of the result email, shown on the result page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EmailStatus {
    Delivered { recipient: String },
    Failed { recipient: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    /// The student pressed submit.
    Explicit,
    /// The deadline passed while the quiz page was open.
    Timer,
}

/// Snapshot taken when a submission starts; scoring and storage run on it.
#[derive(Debug, Clone)]
pub struct Submission {
    pub student: StudentIdentity,
    pub answers: HashMap<String, AnswerValue>,
    pub automatic: bool,
}

/// Per-session context object. Lives for one student's visit and is never
/// shared between sessions.
#[derive(Debug)]
pub struct QuizSession {
    id: Uuid,
    page: Page,
    student: Option<StudentIdentity>,
    answers: HashMap<String, AnswerValue>,
    deadline: Option<Instant>,
    timer_running: bool,
    auto_submitted: bool,
    final_score: Option<i64>,
    max_score: Option<i64>,
    previous_score: Option<i64>,
    email: Option<EmailStatus>,
    error: Option<String>,
    last_seen: Instant,
}

impl QuizSession {
    pub fn new(id: Uuid, now: Instant) -> Self {
        Self {
            id,
            page: Page::Home,
            student: None,
            answers: HashMap::new(),
            deadline: None,
            timer_running: false,
            auto_submitted: false,
            final_score: None,
            max_score: None,
            previous_score: None,
            email: None,
            error: None,
            last_seen: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn student(&self) -> Option<&StudentIdentity> {
        self.student.as_ref()
    }

    pub fn answers(&self) -> &HashMap<String, AnswerValue> {
        &self.answers
    }

    pub fn timer_running(&self) -> bool {
        self.timer_running
    }

    pub fn auto_submitted(&self) -> bool {
        self.auto_submitted
    }

    pub fn final_score(&self) -> Option<i64> {
        self.final_score
    }

    pub fn max_score(&self) -> Option<i64> {
        self.max_score
    }

    pub fn previous_score(&self) -> Option<i64> {
        self.previous_score
    }

    pub fn email(&self) -> Option<&EmailStatus> {
        self.email.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_seen = now;
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Fails with `Conflict` unless the session is on `page`.
    pub fn require(&self, page: Page) -> Result<(), AppError> {
        if self.page == page {
            Ok(())
        } else {
            Err(AppError::Conflict(format!(
                "Action not available on the '{}' page",
                self.page.as_str()
            )))
        }
    }

    /// `home` -> `identify`.
    pub fn start(&mut self) -> Result<(), AppError> {
        self.require(Page::Home)?;
        self.page = Page::Identify;
        Ok(())
    }

    /// `identify` -> `quiz`, arming the deadline.
    pub fn enter_quiz(
        &mut self,
        student: StudentIdentity,
        now: Instant,
        duration: Duration,
    ) -> Result<(), AppError> {
        self.require(Page::Identify)?;
        self.student = Some(student);
        self.deadline = Some(now + duration);
        self.timer_running = true;
        self.page = Page::Quiz;
        Ok(())
    }

    /// `identify` -> `already_taken` after the attempt guard, or `quiz` ->
    /// `already_taken` when the insert hit the uniqueness constraint.
    pub fn enter_already_taken(
        &mut self,
        student: StudentIdentity,
        previous_score: Option<i64>,
    ) -> Result<(), AppError> {
        if !matches!(self.page, Page::Identify | Page::Quiz) {
            return self.require(Page::Identify);
        }
        self.student = Some(student);
        self.previous_score = previous_score;
        self.timer_running = false;
        self.page = Page::AlreadyTaken;
        Ok(())
    }

    /// Merges answers into the buffer. All entries are checked first; on error
    /// nothing is applied.
    pub fn buffer_answers(
        &mut self,
        bank: &QuestionBank,
        incoming: HashMap<String, AnswerValue>,
    ) -> Result<(), String> {
        for (question_id, answer) in &incoming {
            let question = bank
                .get(question_id)
                .ok_or_else(|| format!("Unknown question '{}'", question_id))?;
            question.check_answer(answer)?;
        }
        self.answers.extend(incoming);
        Ok(())
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .filter(|_| self.page == Page::Quiz)
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Remaining time rounded up, so the display reads 0 only at expiry.
    pub fn remaining_seconds(&self, now: Instant) -> Option<u64> {
        self.remaining(now).map(|left| {
            let secs = left.as_secs();
            if left.subsec_nanos() > 0 { secs + 1 } else { secs }
        })
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.page == Page::Quiz
            && self.timer_running
            && self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Stops the timer and hands out the answers to score. Returns `None` when
    /// no submission is due, which makes repeated expiry ticks harmless.
    /// An explicit submit after the deadline counts as the automatic one.
    pub fn begin_submission(&mut self, trigger: SubmitTrigger, now: Instant) -> Option<Submission> {
        if self.page != Page::Quiz || !self.timer_running {
            return None;
        }
        let expired = self.is_expired(now);
        if trigger == SubmitTrigger::Timer && (!expired || self.auto_submitted) {
            return None;
        }
        let student = self.student.clone()?;

        self.timer_running = false;
        if expired {
            self.auto_submitted = true;
        }

        Some(Submission {
            student,
            answers: self.answers.clone(),
            automatic: expired,
        })
    }

    /// `quiz` -> `result`.
    pub fn complete(&mut self, score: i64, max_score: i64) {
        self.final_score = Some(score);
        self.max_score = Some(max_score);
        self.page = Page::Result;
    }

    pub fn set_email(&mut self, status: EmailStatus) {
        self.email = Some(status);
    }

    /// Finished or abandoned sessions idle past `ttl`. A running quiz is
    /// never idle; it is auto-submitted first.
    pub fn is_idle(&self, now: Instant, ttl: Duration) -> bool {
        self.page != Page::Quiz && now.saturating_duration_since(self.last_seen) >= ttl
    }
}

pub type SessionHandle = Arc<tokio::sync::Mutex<QuizSession>>;

/// In-process registry of live sessions, carried in `AppState`.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<Uuid, SessionHandle>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, SessionHandle>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn create(&self, now: Instant) -> (Uuid, SessionHandle) {
        let id = Uuid::new_v4();
        let handle = Arc::new(tokio::sync::Mutex::new(QuizSession::new(id, now)));
        self.map().insert(id, handle.clone());
        (id, handle)
    }

    pub fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.map().get(id).cloned()
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        self.map().remove(id).is_some()
    }

    pub fn handles(&self) -> Vec<SessionHandle> {
        self.map().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ali() -> StudentIdentity {
        StudentIdentity {
            name: "Ali".into(),
            seat: "101".into(),
            email: "ali@x.com".into(),
        }
    }

    fn in_quiz(now: Instant) -> QuizSession {
        let mut session = QuizSession::new(Uuid::new_v4(), now);
        session.start().unwrap();
        session
            .enter_quiz(ali(), now, Duration::from_secs(300))
            .unwrap();
        session
    }

    #[test]
    fn test_start_only_from_home() {
        let now = Instant::now();
        let mut session = QuizSession::new(Uuid::new_v4(), now);
        assert!(session.start().is_ok());
        assert_eq!(session.page(), Page::Identify);
        assert!(matches!(session.start(), Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_enter_quiz_arms_timer() {
        let now = Instant::now();
        let session = in_quiz(now);
        assert_eq!(session.page(), Page::Quiz);
        assert!(session.timer_running());
        assert_eq!(session.remaining_seconds(now), Some(300));
        assert_eq!(
            session.remaining_seconds(now + Duration::from_millis(1500)),
            Some(299)
        );
    }

    #[test]
    fn test_timer_submission_happens_once() {
        let now = Instant::now();
        let mut session = in_quiz(now);
        let later = now + Duration::from_secs(301);

        assert!(session.begin_submission(SubmitTrigger::Timer, now).is_none());
        let first = session.begin_submission(SubmitTrigger::Timer, later);
        assert!(first.is_some_and(|s| s.automatic));
        assert!(session.auto_submitted());
        assert!(session.begin_submission(SubmitTrigger::Timer, later).is_none());
        assert!(session.begin_submission(SubmitTrigger::Explicit, later).is_none());
    }

    #[test]
    fn test_late_explicit_submit_counts_as_automatic() {
        let now = Instant::now();
        let mut session = in_quiz(now);
        let submission = session
            .begin_submission(SubmitTrigger::Explicit, now + Duration::from_secs(400))
            .unwrap();
        assert!(submission.automatic);
        assert!(session.auto_submitted());
    }

    #[test]
    fn test_buffer_answers_is_all_or_nothing() {
        let now = Instant::now();
        let bank = QuestionBank::default();
        let mut session = in_quiz(now);

        let mut bad = HashMap::new();
        bad.insert("q1".to_string(), AnswerValue::Text("Paris".into()));
        bad.insert("q9".to_string(), AnswerValue::Text("?".into()));
        assert!(session.buffer_answers(&bank, bad).is_err());
        assert!(session.answers().is_empty());

        let mut good = HashMap::new();
        good.insert("q1".to_string(), AnswerValue::Text("Paris".into()));
        assert!(session.buffer_answers(&bank, good).is_ok());
        assert_eq!(session.answers().len(), 1);
    }

    #[test]
    fn test_terminal_pages_reject_actions() {
        let now = Instant::now();
        let mut session = in_quiz(now);
        session.begin_submission(SubmitTrigger::Explicit, now).unwrap();
        session.complete(5, 8);
        assert!(session.page().is_terminal());
        assert!(session.enter_already_taken(ali(), Some(5)).is_err());
        assert!(session.require(Page::Quiz).is_err());
    }

    #[test]
    fn test_idle_sessions() {
        let now = Instant::now();
        let ttl = Duration::from_secs(60);
        let fresh = QuizSession::new(Uuid::new_v4(), now);
        assert!(!fresh.is_idle(now, ttl));
        assert!(fresh.is_idle(now + ttl, ttl));
        assert!(!in_quiz(now).is_idle(now + ttl, ttl));
    }

    #[test]
    fn test_session_store_lifecycle() {
        let store = SessionStore::new();
        let (id, _) = store.create(Instant::now());
        assert!(store.get(&id).is_some());
        assert_eq!(store.len(), 1);
        assert!(store.remove(&id));
        assert!(store.is_empty());
    }
}
