// src/reporting.rs

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::models::response::StoredResponse;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Aggregates shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseSummary {
    pub attempts: usize,
    pub total_correct: usize,
    pub total_incorrect: usize,
    pub average_score: f64,
    /// score -> number of attempts with that score, ascending.
    pub score_distribution: BTreeMap<i64, usize>,
}

/// An answer counts as correct when it earned points.
pub fn summarize(responses: &[StoredResponse]) -> ResponseSummary {
    let mut total_correct = 0;
    let mut total_incorrect = 0;
    let mut score_distribution = BTreeMap::new();

    for response in responses {
        for answer in &response.answers {
            if answer.score > 0 {
                total_correct += 1;
            } else {
                total_incorrect += 1;
            }
        }
        *score_distribution.entry(response.row.score).or_insert(0) += 1;
    }

    let average_score = if responses.is_empty() {
        0.0
    } else {
        responses.iter().map(|r| r.row.score as f64).sum::<f64>() / responses.len() as f64
    };

    ResponseSummary {
        attempts: responses.len(),
        total_correct,
        total_incorrect,
        average_score,
        score_distribution,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page: u32,
    pub page_size: u32,
    pub total_rows: i64,
    pub total_pages: i64,
}

impl PageInfo {
    /// `page` is 1-based.
    pub fn new(page: u32, page_size: u32, total_rows: i64) -> Self {
        let size = i64::from(page_size.max(1));
        Self {
            page,
            page_size,
            total_rows,
            total_pages: (total_rows + size - 1) / size,
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

/// Number of `q{N}_*` column triples needed to show every row.
pub fn question_columns(responses: &[StoredResponse], bank_len: usize) -> usize {
    responses
        .iter()
        .map(StoredResponse::highest_index)
        .max()
        .unwrap_or(0)
        .max(bank_len)
}

/// Column names in export order.
pub fn column_names(questions: usize) -> Vec<String> {
    let mut columns: Vec<String> = [
        "id",
        "student_name",
        "student_seat",
        "student_email",
        "score",
        "timestamp",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect();

    for n in 1..=questions {
        columns.push(format!("q{}_student_answer", n));
        columns.push(format!("q{}_correct_answer", n));
        columns.push(format!("q{}_score", n));
    }
    columns
}

/// Wide row with `q{N}_student_answer`, `q{N}_correct_answer`, `q{N}_score`.
/// Questions the row predates come out as null.
pub fn flatten(response: &StoredResponse, questions: usize) -> Map<String, Value> {
    let row = &response.row;
    let mut out = Map::new();
    out.insert("id".into(), json!(row.id));
    out.insert("student_name".into(), json!(row.student_name));
    out.insert("student_seat".into(), json!(row.student_seat));
    out.insert("student_email".into(), json!(row.student_email));
    out.insert("score".into(), json!(row.score));
    out.insert(
        "timestamp".into(),
        json!(row.submitted_at.format("%Y-%m-%d %H:%M:%S").to_string()),
    );

    for n in 1..=questions {
        let answer = response.answer(n);
        out.insert(
            format!("q{}_student_answer", n),
            json!(answer.and_then(|a| a.student_answer.clone())),
        );
        out.insert(
            format!("q{}_correct_answer", n),
            json!(answer.and_then(|a| a.correct_answer.clone())),
        );
        out.insert(format!("q{}_score", n), json!(answer.map(|a| a.score)));
    }
    out
}

/// Quotes fields containing separators and neutralizes spreadsheet formulas.
pub fn escape_csv_field(value: &str) -> String {
    let mut field = value.to_string();
    if field.starts_with(['=', '+', '-', '@']) {
        field.insert(0, '\t');
    }
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field
    }
}

fn csv_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => escape_csv_field(s),
        Some(other) => escape_csv_field(&other.to_string()),
    }
}

pub fn to_csv(responses: &[StoredResponse], bank_len: usize) -> String {
    let questions = question_columns(responses, bank_len);
    let columns = column_names(questions);

    let mut out = columns.join(",");
    out.push('\n');
    for response in responses {
        let flat = flatten(response, questions);
        let line: Vec<String> = columns.iter().map(|c| csv_cell(flat.get(c))).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}
