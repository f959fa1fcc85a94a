// src/quiz/view.rs

use std::time::Instant;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    models::{
        question::{AnswerValue, PublicQuestion},
        student::StudentIdentity,
    },
    quiz::{
        bank::QuestionBank,
        session::{EmailStatus, Page, QuizSession},
    },
    utils::time::format_time,
};

/// Below this many seconds the countdown is highlighted.
pub const LOW_TIME_SECS: u64 = 60;

/// A question on the quiz page with whatever the student has entered so far.
#[derive(Debug, Serialize)]
pub struct QuizItem {
    #[serde(flatten)]
    pub question: PublicQuestion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<AnswerValue>,
}

/// Everything needed to draw the current page.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub page: Page,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<StudentIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_remaining: Option<String>,
    pub time_low: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<QuizItem>>,
    pub auto_submitted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailStatus>,
}

impl SessionView {
    pub fn render(
        session: &QuizSession,
        bank: &QuestionBank,
        duration_seconds: u64,
        now: Instant,
    ) -> Self {
        let remaining_seconds = session.remaining_seconds(now);

        let questions: Option<Vec<QuizItem>> = (session.page() == Page::Quiz).then(|| {
            bank.questions()
                .iter()
                .map(|q| QuizItem {
                    question: q.to_public(),
                    answer: session.answers().get(&q.id).cloned(),
                })
                .collect()
        });

        Self {
            session_id: session.id(),
            page: session.page(),
            error: session.error().map(str::to_string),
            duration_seconds,
            student: session.student().cloned(),
            remaining_seconds,
            time_remaining: remaining_seconds.map(format_time),
            time_low: remaining_seconds.is_some_and(|s| s < LOW_TIME_SECS),
            questions,
            auto_submitted: session.auto_submitted(),
            score: session.final_score(),
            max_score: session.max_score(),
            previous_score: session.previous_score(),
            email: session.email().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_quiz_page_lists_questions_and_timer() {
        let now = Instant::now();
        let bank = QuestionBank::default();
        let mut session = QuizSession::new(Uuid::new_v4(), now);
        session.start().unwrap();
        session
            .enter_quiz(
                StudentIdentity {
                    name: "Ali".into(),
                    seat: "101".into(),
                    email: "ali@x.com".into(),
                },
                now,
                Duration::from_secs(300),
            )
            .unwrap();

        let view = SessionView::render(&session, &bank, 300, now + Duration::from_secs(250));
        assert_eq!(view.page, Page::Quiz);
        assert_eq!(view.time_remaining.as_deref(), Some("00:50"));
        assert!(view.time_low);
        assert_eq!(view.questions.as_ref().map(Vec::len), Some(4));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["page"], "quiz");
        assert!(json["questions"][0].get("correct_answer").is_none());
    }

    #[test]
    fn test_home_page_has_no_timer() {
        let now = Instant::now();
        let session = QuizSession::new(Uuid::new_v4(), now);
        let view = SessionView::render(&session, &QuestionBank::default(), 300, now);
        assert!(view.remaining_seconds.is_none());
        assert!(view.questions.is_none());
        assert!(!view.time_low);
    }
}
