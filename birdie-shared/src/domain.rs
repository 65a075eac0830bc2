use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Wire and storage format for calendar days.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KidId(pub i64);

impl fmt::Display for KidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for KidId {
    fn from(value: i64) -> Self {
        KidId(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Presence {
    Morning,
    Afternoon,
    Evening,
    Absent,
}

impl Presence {
    pub fn as_str(self) -> &'static str {
        match self {
            Presence::Morning => "MORNING",
            Presence::Afternoon => "AFTERNOON",
            Presence::Evening => "EVENING",
            Presence::Absent => "ABSENT",
        }
    }
}

impl FromStr for Presence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MORNING" => Ok(Presence::Morning),
            "AFTERNOON" => Ok(Presence::Afternoon),
            "EVENING" => Ok(Presence::Evening),
            "ABSENT" => Ok(Presence::Absent),
            other => Err(format!("unknown presence tag: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kid {
    pub id: KidId,
    pub name: String,
    pub surname: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: i64,
    pub name: String,
    pub surname: String,
}

/// A batch of meal tickets bought for one kid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: i64,
    pub date: NaiveDate,
    pub quantity: i32,
    pub kid_id: KidId,
}

/// Daily presence/meal record of a kid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KidNote {
    pub id: i64,
    pub note: String,
    pub kid_id: KidId,
    pub presence: Vec<Presence>,
    pub has_meal: bool,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherNote {
    pub id: i64,
    pub note: String,
    pub teacher_id: Option<i64>,
    pub date: NaiveDate,
}

/// Parses a `YYYY-MM-DD` day.
pub fn parse_day(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s, DAY_FORMAT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn parses_valid_day() {
        let d = parse_day("2022-10-26").unwrap();
        assert_eq!(d.day(), 26);
        assert_eq!(d.month(), 10);
        assert_eq!(d.year(), 2022);
    }

    #[test]
    fn rejects_invalid_day() {
        assert!(parse_day("invalid").is_err());
        assert!(parse_day("2022-13-01").is_err());
        assert!(parse_day("").is_err());
    }

    #[test]
    fn presence_tags_are_uppercase_on_the_wire() {
        let tags = vec![Presence::Morning, Presence::Absent];
        let json = serde_json::to_string(&tags).unwrap();
        assert_eq!(json, r#"["MORNING","ABSENT"]"#);
        let back: Vec<Presence> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tags);
        assert!(serde_json::from_str::<Presence>("\"NIGHT\"").is_err());
    }
}
