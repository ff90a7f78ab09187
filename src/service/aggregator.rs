//! Builds the per-student attendance matrix: every student of the
//! selection crossed with every lesson of the selection, recorded marks
//! filled in and the rest defaulting to "Н".

use crate::db::models::{AttendanceMark, AttendanceStatus, Lesson, MatrixFilter, Student};
use crate::db::sqlite::JournalStorage;
use crate::error::RollcallError;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

/// One cell of a student's row, carrying the lesson header fields so a
/// row is self-contained.
#[derive(Debug, Clone, Serialize)]
pub struct LessonCell {
    pub lesson_id: i64,
    pub date: NaiveDate,
    pub lesson_num: i64,
    pub title: String,
    pub status: AttendanceStatus,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentMatrix {
    #[serde(flatten)]
    pub student: Student,
    pub lessons: Vec<LessonCell>,
}

/// Matrix plus the lesson axis it was built over. The axis is kept
/// separately because exports need lesson fields (like the subgroup
/// label) that the cells do not repeat.
#[derive(Debug, Clone)]
pub struct AttendanceMatrix {
    pub lessons: Vec<Lesson>,
    pub students: Vec<StudentMatrix>,
}

/// Load both axes and the recorded marks, then cross them. Marks outside
/// the selection simply find no cell and drop out.
///
/// The three reads are separate queries, not one snapshot; a write
/// landing between them can show up in one axis and not the other.
pub async fn attendance_matrix(
    storage: &JournalStorage,
    group_id: i64,
    filter: &MatrixFilter,
) -> Result<AttendanceMatrix, RollcallError> {
    let students = storage.students_for_matrix(group_id, filter).await?;
    let lessons = storage.lessons_for_matrix(group_id, filter).await?;
    let marks = storage.group_marks(group_id).await?;
    let students = build_matrix(students, &lessons, marks);
    Ok(AttendanceMatrix { lessons, students })
}

/// Cross `students` with `lessons`. Every pair yields exactly one cell;
/// pairs without a recorded mark get `NotMarked` and no note.
pub fn build_matrix(
    students: Vec<Student>,
    lessons: &[Lesson],
    marks: Vec<AttendanceMark>,
) -> Vec<StudentMatrix> {
    let mut recorded: HashMap<(i64, i64), (AttendanceStatus, Option<String>)> = marks
        .into_iter()
        .map(|m| ((m.student_id, m.lesson_id), (m.status, m.note)))
        .collect();

    students
        .into_iter()
        .map(|student| {
            let cells = lessons
                .iter()
                .map(|lesson| {
                    let (status, note) = recorded
                        .remove(&(student.id, lesson.id))
                        .unwrap_or((AttendanceStatus::NotMarked, None));
                    LessonCell {
                        lesson_id: lesson.id,
                        date: lesson.date,
                        lesson_num: lesson.lesson_num,
                        title: lesson.title.clone(),
                        status,
                        note,
                    }
                })
                .collect();
            StudentMatrix {
                student,
                lessons: cells,
            }
        })
        .collect()
}
