use crate::storage::schema::{carnets, kid_notes, kids, teacher_notes, teachers, users};
use birdie_shared::domain::{self, KidId, Presence};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub role: &'a str,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = teachers)]
pub struct Teacher {
    pub id: i64,
    pub name: String,
    pub surname: String,
}

#[derive(Insertable)]
#[diesel(table_name = teachers)]
pub struct NewTeacher<'a> {
    pub name: &'a str,
    pub surname: &'a str,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = kids)]
pub struct Kid {
    pub id: i64,
    pub name: String,
    pub surname: String,
}

#[derive(Insertable)]
#[diesel(table_name = kids)]
pub struct NewKid<'a> {
    pub name: &'a str,
    pub surname: &'a str,
}

/// `presence` holds comma-separated tags, see [`encode_presence`].
#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = kid_notes)]
#[diesel(belongs_to(Kid, foreign_key = kid_id))]
pub struct KidNote {
    pub id: i64,
    pub note: String,
    pub kid_id: i64,
    pub presence: String,
    pub has_meal: bool,
    pub date: NaiveDate,
}

#[derive(Insertable)]
#[diesel(table_name = kid_notes)]
pub struct NewKidNote<'a> {
    pub note: &'a str,
    pub kid_id: i64,
    pub presence: &'a str,
    pub has_meal: bool,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = teacher_notes)]
#[diesel(belongs_to(Teacher, foreign_key = teacher_id))]
pub struct TeacherNote {
    pub id: i64,
    pub note: String,
    pub teacher_id: Option<i64>,
    pub date: NaiveDate,
}

#[derive(Insertable)]
#[diesel(table_name = teacher_notes)]
pub struct NewTeacherNote<'a> {
    pub note: &'a str,
    pub teacher_id: Option<i64>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = carnets)]
#[diesel(belongs_to(Kid, foreign_key = kid_id))]
pub struct Carnet {
    pub id: i64,
    pub date: NaiveDate,
    pub quantity: i32,
    pub kid_id: i64,
}

#[derive(Insertable)]
#[diesel(table_name = carnets)]
pub struct NewCarnet {
    pub date: NaiveDate,
    pub quantity: i32,
    pub kid_id: i64,
}

pub fn encode_presence(tags: &[Presence]) -> String {
    tags.iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn decode_presence(raw: &str) -> Vec<Presence> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse() {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!(tag = s, error = %e, "skipping stored presence tag");
                None
            }
        })
        .collect()
}

impl From<Kid> for domain::Kid {
    fn from(k: Kid) -> Self {
        domain::Kid {
            id: KidId(k.id),
            name: k.name,
            surname: k.surname,
        }
    }
}

impl From<Teacher> for domain::Teacher {
    fn from(t: Teacher) -> Self {
        domain::Teacher {
            id: t.id,
            name: t.name,
            surname: t.surname,
        }
    }
}

impl From<KidNote> for domain::KidNote {
    fn from(n: KidNote) -> Self {
        domain::KidNote {
            id: n.id,
            presence: decode_presence(&n.presence),
            note: n.note,
            kid_id: KidId(n.kid_id),
            has_meal: n.has_meal,
            date: n.date,
        }
    }
}

impl From<TeacherNote> for domain::TeacherNote {
    fn from(n: TeacherNote) -> Self {
        domain::TeacherNote {
            id: n.id,
            note: n.note,
            teacher_id: n.teacher_id,
            date: n.date,
        }
    }
}

impl From<Carnet> for domain::Purchase {
    fn from(c: Carnet) -> Self {
        domain::Purchase {
            id: c.id,
            date: c.date,
            quantity: c.quantity,
            kid_id: KidId(c.kid_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_column_round_trips() {
        let tags = vec![Presence::Morning, Presence::Evening];
        let raw = encode_presence(&tags);
        assert_eq!(raw, "MORNING,EVENING");
        assert_eq!(decode_presence(&raw), tags);
        assert!(decode_presence("").is_empty());
        assert_eq!(decode_presence("ABSENT, bogus"), vec![Presence::Absent]);
    }
}
