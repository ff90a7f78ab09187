use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Attendance status symbols as they appear in the journal UI and exports.
/// `NotMarked` is both a storable value and the synthesized default for
/// cells without an explicit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    #[serde(rename = "П")]
    Present,
    #[serde(rename = "Б")]
    Sick,
    #[serde(rename = "НП")]
    Unexcused,
    #[serde(rename = "УП")]
    Excused,
    #[serde(rename = "Н")]
    NotMarked,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 5] = [
        AttendanceStatus::Present,
        AttendanceStatus::Sick,
        AttendanceStatus::Unexcused,
        AttendanceStatus::Excused,
        AttendanceStatus::NotMarked,
    ];

    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "П" => Some(AttendanceStatus::Present),
            "Б" => Some(AttendanceStatus::Sick),
            "НП" => Some(AttendanceStatus::Unexcused),
            "УП" => Some(AttendanceStatus::Excused),
            "Н" => Some(AttendanceStatus::NotMarked),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "П",
            AttendanceStatus::Sick => "Б",
            AttendanceStatus::Unexcused => "НП",
            AttendanceStatus::Excused => "УП",
            AttendanceStatus::NotMarked => "Н",
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Student {
    pub id: i64,
    pub full_name: String,
    pub email: Option<String>,
    pub subgroup_id: Option<i64>,
}

/// One entry of a bulk student upload. Entries with a blank `full_name`
/// are skipped rather than rejected.
#[derive(Debug, Clone, Deserialize)]
pub struct NewStudent {
    #[serde(default)]
    pub full_name: String,
    pub email: Option<String>,
    pub subgroup_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Lesson {
    pub id: i64,
    pub date: NaiveDate,
    pub lesson_num: i64,
    pub title: String,
    pub group_id: i64,
    pub subgroup_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewLesson {
    pub date: NaiveDate,
    pub lesson_num: i64,
    pub title: String,
    pub group_id: i64,
    pub subgroup_id: Option<i64>,
}

/// Lesson row joined with its group name, as returned by the lesson listing.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LessonRow {
    pub id: i64,
    pub date: NaiveDate,
    pub lesson_num: i64,
    pub title: String,
    pub group_id: i64,
    pub subgroup_id: Option<i64>,
    pub group_name: String,
}

/// Explicitly recorded mark, keyed by `(student_id, lesson_id)`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceMark {
    pub student_id: i64,
    pub lesson_id: i64,
    pub status: AttendanceStatus,
    pub note: Option<String>,
}

/// Full attendance record as stored, returned from the mark upsert.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceRecord {
    pub id: i64,
    pub student_id: i64,
    pub lesson_id: i64,
    pub status: AttendanceStatus,
    pub note: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Optional narrowing applied to the lesson/student axes of the matrix
/// and to exports. `None` fields leave the axis unrestricted.
#[derive(Debug, Clone, Default)]
pub struct MatrixFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub lesson_ids: Option<Vec<i64>>,
    pub student_ids: Option<Vec<i64>>,
    pub subgroup_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, FromRow)]
pub struct StatusCounts {
    pub present: i64,
    pub sick: i64,
    pub unexcused: i64,
    pub excused: i64,
    pub not_marked: i64,
}

/// Group-level attendance summary. Counts cover explicitly recorded marks
/// only; `absent` is the sum of sick and unexcused.
#[derive(Debug, Clone, Serialize)]
pub struct GroupStats {
    pub total_students: i64,
    pub present: i64,
    pub sick: i64,
    pub unexcused: i64,
    pub excused: i64,
    pub not_marked: i64,
    pub absent: i64,
}
