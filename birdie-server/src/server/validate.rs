//! Request body validation.
//!
//! Each request DTO implements [`Validate`], turning the loosely typed wire
//! body into a checked input value or a list of per-field errors. Handlers
//! take [`ValidJson<T>`] and receive the checked value directly.

use axum::Json;
use axum::extract::{FromRequest, Request};
use birdie_shared::api::{
    CarnetReq, CreateKidNoteReq, CreateKidReq, CreateTeacherNoteReq, CreateTeacherReq, DateReq,
    FieldErrorDto, PeriodReq, UpdateKidNoteReq, UpdateTeacherNoteReq,
};
use birdie_shared::domain::{Presence, parse_day};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;

use super::AppError;

pub const NAME_MAX: usize = 50;
pub const NOTE_MAX: usize = 250;

pub trait Validate {
    type Output;
    fn validate(self) -> Result<Self::Output, Vec<FieldErrorDto>>;
}

/// JSON body extractor that runs [`Validate`] after deserializing.
pub struct ValidJson<T: Validate>(pub T::Output);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
    T::Output: Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;
        body.validate().map(ValidJson).map_err(AppError::Validation)
    }
}

/// Rejects non-positive path identifiers.
pub fn path_id(field: &str, id: i64) -> Result<i64, AppError> {
    if id < 1 {
        return Err(AppError::Validation(vec![FieldErrorDto {
            field: field.to_string(),
            message: min_msg(1),
        }]));
    }
    Ok(id)
}

fn min_msg(n: usize) -> String {
    format!("Should be greater than {}", n)
}

fn max_msg(n: usize) -> String {
    format!("Should be less than {}", n)
}

#[derive(Default)]
struct Checker {
    errors: Vec<FieldErrorDto>,
}

impl Checker {
    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldErrorDto {
            field: field.to_string(),
            message: message.into(),
        });
    }

    fn required<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.fail(field, "This field is required");
        }
        value
    }

    fn text(&mut self, field: &str, value: String, min: usize, max: usize) -> Option<String> {
        let len = value.chars().count();
        if len < min {
            self.fail(field, min_msg(min));
            None
        } else if len > max {
            self.fail(field, max_msg(max));
            None
        } else {
            Some(value)
        }
    }

    fn name(&mut self, field: &str, value: Option<String>) -> Option<String> {
        let value = self.required(field, value)?;
        let value = self.text(field, value, 1, NAME_MAX)?;
        if !value.chars().all(char::is_alphabetic) {
            self.fail(field, "Should contain only letters");
            return None;
        }
        Some(value)
    }

    fn day(&mut self, field: &str, value: Option<String>) -> Option<NaiveDate> {
        let value = self.required(field, value)?;
        match parse_day(&value) {
            Ok(d) => Some(d),
            Err(_) => {
                self.fail(field, "Should be a valid date YYYY-MM-DD");
                None
            }
        }
    }

    fn presence(&mut self, field: &str, value: Option<Vec<Presence>>) -> Option<Vec<Presence>> {
        match value {
            Some(tags) if !tags.is_empty() => Some(tags),
            _ => {
                self.fail(field, "This field is required");
                None
            }
        }
    }

    /// Returns `value` when no field failed, all collected errors otherwise.
    fn finish<T>(self, value: Option<T>) -> Result<T, Vec<FieldErrorDto>> {
        match value {
            Some(v) if self.errors.is_empty() => Ok(v),
            _ => Err(self.errors),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonInput {
    pub name: String,
    pub surname: String,
}

fn validate_person(
    name: Option<String>,
    surname: Option<String>,
) -> Result<PersonInput, Vec<FieldErrorDto>> {
    let mut c = Checker::default();
    let name = c.name("name", name);
    let surname = c.name("surname", surname);
    let out = name
        .zip(surname)
        .map(|(name, surname)| PersonInput { name, surname });
    c.finish(out)
}

impl Validate for CreateKidReq {
    type Output = PersonInput;
    fn validate(self) -> Result<PersonInput, Vec<FieldErrorDto>> {
        validate_person(self.name, self.surname)
    }
}

impl Validate for CreateTeacherReq {
    type Output = PersonInput;
    fn validate(self) -> Result<PersonInput, Vec<FieldErrorDto>> {
        validate_person(self.name, self.surname)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KidNoteInput {
    pub note: String,
    pub date: NaiveDate,
    pub presence: Vec<Presence>,
    pub has_meal: bool,
}

impl Validate for CreateKidNoteReq {
    type Output = KidNoteInput;
    fn validate(self) -> Result<KidNoteInput, Vec<FieldErrorDto>> {
        let mut c = Checker::default();
        let note = c.text("note", self.note.unwrap_or_default(), 0, NOTE_MAX);
        let date = c.day("date", self.date);
        let presence = c.presence("presence", self.presence);
        let has_meal = c.required("has_meal", self.has_meal);
        let out = match (note, date, presence, has_meal) {
            (Some(note), Some(date), Some(presence), Some(has_meal)) => Some(KidNoteInput {
                note,
                date,
                presence,
                has_meal,
            }),
            _ => None,
        };
        c.finish(out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KidNoteUpdate {
    pub note: String,
    pub presence: Vec<Presence>,
    pub has_meal: bool,
}

impl Validate for UpdateKidNoteReq {
    type Output = KidNoteUpdate;
    fn validate(self) -> Result<KidNoteUpdate, Vec<FieldErrorDto>> {
        let mut c = Checker::default();
        let note = c.text("note", self.note.unwrap_or_default(), 0, NOTE_MAX);
        let presence = c.presence("presence", self.presence);
        let has_meal = c.required("has_meal", self.has_meal);
        let out = match (note, presence, has_meal) {
            (Some(note), Some(presence), Some(has_meal)) => Some(KidNoteUpdate {
                note,
                presence,
                has_meal,
            }),
            _ => None,
        };
        c.finish(out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeacherNoteInput {
    pub note: String,
    pub date: NaiveDate,
}

impl Validate for CreateTeacherNoteReq {
    type Output = TeacherNoteInput;
    fn validate(self) -> Result<TeacherNoteInput, Vec<FieldErrorDto>> {
        let mut c = Checker::default();
        let note = c
            .required("note", self.note)
            .and_then(|n| c.text("note", n, 1, NOTE_MAX));
        let date = c.day("date", self.date);
        let out = note.zip(date).map(|(note, date)| TeacherNoteInput { note, date });
        c.finish(out)
    }
}

impl Validate for UpdateTeacherNoteReq {
    type Output = String;
    fn validate(self) -> Result<String, Vec<FieldErrorDto>> {
        let mut c = Checker::default();
        let note = c
            .required("note", self.note)
            .and_then(|n| c.text("note", n, 1, NOTE_MAX));
        c.finish(note)
    }
}

impl Validate for DateReq {
    type Output = NaiveDate;
    fn validate(self) -> Result<NaiveDate, Vec<FieldErrorDto>> {
        let mut c = Checker::default();
        let date = c.day("date", self.date);
        c.finish(date)
    }
}

/// Inclusive day range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl Validate for PeriodReq {
    type Output = Period;
    fn validate(self) -> Result<Period, Vec<FieldErrorDto>> {
        let mut c = Checker::default();
        let from = c.day("date1", self.date1);
        let to = c.day("date2", self.date2);
        c.finish(from.zip(to).map(|(from, to)| Period { from, to }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarnetInput {
    pub date: NaiveDate,
    pub quantity: i32,
}

impl Validate for CarnetReq {
    type Output = CarnetInput;
    fn validate(self) -> Result<CarnetInput, Vec<FieldErrorDto>> {
        let mut c = Checker::default();
        let date = c.day("date", self.date);
        let quantity = c.required("quantity", self.quantity).and_then(|q| {
            if q < 1 {
                c.fail("quantity", min_msg(1));
                None
            } else {
                Some(q)
            }
        });
        c.finish(date.zip(quantity).map(|(date, quantity)| CarnetInput { date, quantity }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(errs: Vec<FieldErrorDto>) -> Vec<String> {
        errs.into_iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect()
    }

    #[test]
    fn person_requires_alphabetic_names() {
        let ok = CreateKidReq {
            name: Some("Chiara".into()),
            surname: Some("Rossi".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.name, "Chiara");

        let err = CreateKidReq {
            name: None,
            surname: Some("R0ssi".into()),
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            fields(err),
            vec![
                "name: This field is required",
                "surname: Should contain only letters",
            ]
        );
    }

    #[test]
    fn person_name_length_bounds() {
        let err = CreateTeacherReq {
            name: Some(String::new()),
            surname: Some("a".repeat(NAME_MAX + 1)),
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            fields(err),
            vec![
                "name: Should be greater than 1",
                "surname: Should be less than 50",
            ]
        );
    }

    #[test]
    fn kid_note_defaults_text_and_checks_rest() {
        let ok = CreateKidNoteReq {
            note: None,
            date: Some("2023-02-01".into()),
            presence: Some(vec![Presence::Morning]),
            has_meal: Some(true),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.note, "");
        assert!(ok.has_meal);

        let err = CreateKidNoteReq {
            note: Some("x".repeat(NOTE_MAX + 1)),
            date: Some("01/02/2023".into()),
            presence: Some(vec![]),
            has_meal: None,
        }
        .validate()
        .unwrap_err();
        let f: Vec<String> = err.into_iter().map(|e| e.field).collect();
        assert_eq!(f, vec!["note", "date", "presence", "has_meal"]);
    }

    #[test]
    fn empty_update_body_fails() {
        let err = UpdateKidNoteReq::default().validate().unwrap_err();
        assert_eq!(err.len(), 2);
        assert!(UpdateTeacherNoteReq::default().validate().is_err());
    }

    #[test]
    fn carnet_quantity_must_be_positive() {
        let err = CarnetReq {
            date: Some("2023-02-01".into()),
            quantity: Some(0),
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            fields(err),
            vec!["quantity: Should be greater than 1"]
        );
        let ok = CarnetReq {
            date: Some("2023-02-01".into()),
            quantity: Some(10),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.quantity, 10);
    }

    #[test]
    fn period_needs_both_days() {
        let err = PeriodReq {
            date1: Some("2023-01-01".into()),
            date2: None,
        }
        .validate()
        .unwrap_err();
        assert_eq!(fields(err), vec!["date2: This field is required"]);
        let p = PeriodReq {
            date1: Some("2023-01-01".into()),
            date2: Some("2023-01-31".into()),
        }
        .validate()
        .unwrap();
        assert!(p.from < p.to);
    }

    #[test]
    fn path_ids_must_be_positive() {
        assert!(path_id("id", 0).is_err());
        assert_eq!(path_id("id", 3).unwrap(), 3);
    }
}
