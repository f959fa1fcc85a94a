// src/models/student.rs

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub const MAX_FIELD_LEN: usize = 255;

/// A student who passed the roster check.
/// `(name, seat)` is the natural key of an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentIdentity {
    pub name: String,
    pub seat: String,
    pub email: String,
}

/// DTO for the identify form.
/// Name and seat are compared against the roster verbatim, no trimming.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IdentifyRequest {
    #[validate(
        length(min = 1, message = "Name is required."),
        custom(function = "name_not_too_long")
    )]
    pub name: String,
    #[validate(
        length(min = 1, message = "Seat number is required."),
        custom(function = "seat_not_too_long")
    )]
    pub seat: String,
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
}

fn not_too_long(value: &str, label: &str) -> Result<(), ValidationError> {
    if value.chars().count() > MAX_FIELD_LEN {
        return Err(ValidationError::new("too_long").with_message(
            format!("{} must be at most {} characters.", label, MAX_FIELD_LEN).into(),
        ));
    }
    Ok(())
}

fn name_not_too_long(name: &str) -> Result<(), ValidationError> {
    not_too_long(name, "Name")
}

fn seat_not_too_long(seat: &str) -> Result<(), ValidationError> {
    not_too_long(seat, "Seat number")
}

impl From<IdentifyRequest> for StudentIdentity {
    fn from(req: IdentifyRequest) -> Self {
        Self {
            name: req.name,
            seat: req.seat,
            email: req.email,
        }
    }
}
