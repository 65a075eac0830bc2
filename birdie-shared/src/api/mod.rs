use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::carnet::KidCarnetInfo;
use crate::domain::Presence;

pub mod endpoints;

pub const API_V1_PREFIX: &str = "/api/v1";

// Health
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
    pub title: String,
    pub detail: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OkDto {
    pub ok: String,
}

// Errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrorDto {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationErrorsDto {
    pub errors: Vec<FieldErrorDto>,
}

// Kids / teachers. Fields are optional so missing ones surface as
// field errors instead of a deserialization failure.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateKidReq {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KidDto {
    pub id: i64,
    pub name: String,
    pub surname: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateTeacherReq {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TeacherDto {
    pub id: i64,
    pub name: String,
    pub surname: String,
}

// Kid notes
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateKidNoteReq {
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub presence: Option<Vec<Presence>>,
    #[serde(default)]
    pub has_meal: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateKidNoteReq {
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub presence: Option<Vec<Presence>>,
    #[serde(default)]
    pub has_meal: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KidNoteDto {
    pub id: i64,
    pub note: String,
    pub kid_id: i64,
    pub presence: Vec<Presence>,
    pub has_meal: bool,
    pub date: NaiveDate,
}

/// Kid note joined with its kid; kid fields are empty when the kid is gone.
#[derive(Debug, Serialize, Deserialize)]
pub struct KidNotePeriodRowDto {
    pub id: i64,
    pub note: String,
    pub date: NaiveDate,
    pub presence: Vec<Presence>,
    pub has_meal: bool,
    pub kid_name: Option<String>,
    pub kid_surname: Option<String>,
    pub kid_id: Option<i64>,
}

// Teacher notes
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateTeacherNoteReq {
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateTeacherNoteReq {
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TeacherNoteDto {
    pub id: i64,
    pub note: String,
    pub teacher_id: Option<i64>,
    pub date: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TeacherNotePeriodRowDto {
    pub id: i64,
    pub note: String,
    pub date: NaiveDate,
    pub teacher_name: Option<String>,
    pub teacher_surname: Option<String>,
    pub teacher_id: Option<i64>,
}

// Date filters
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DateReq {
    #[serde(default)]
    pub date: Option<String>,
}

/// Inclusive `[date1, date2]` range.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PeriodReq {
    #[serde(default)]
    pub date1: Option<String>,
    #[serde(default)]
    pub date2: Option<String>,
}

// Carnets. Create and update share the same body.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CarnetReq {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub quantity: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CarnetDto {
    pub id: i64,
    pub date: NaiveDate,
    pub quantity: i32,
    pub kid_id: i64,
}

// Reports
#[derive(Debug, Serialize, Deserialize)]
pub struct MonthlyReportDto {
    pub kid_notes: Vec<KidNotePeriodRowDto>,
    pub teacher_notes: Vec<TeacherNotePeriodRowDto>,
    pub carnet_info: KidCarnetInfo,
}
