//! Renders the attendance matrix into downloadable documents: a flat
//! UTF-8 CSV (with BOM, for spreadsheet imports) and a styled XLSX
//! workbook mirroring the journal layout.

use crate::db::models::{AttendanceStatus, Lesson};
use crate::error::RollcallError;
use crate::service::aggregator::{AttendanceMatrix, LessonCell};
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook};

/// Spreadsheet apps detect UTF-8 by this prefix; without it Cyrillic
/// headers come up garbled.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const CSV_HEADER: [&str; 8] = [
    "ФИО",
    "Email",
    "Подгруппа",
    "Дата",
    "№ занятия",
    "Тема",
    "Статус",
    "Примечание",
];

/// One CSV line per matrix cell, student-major. Every field is quoted.
pub fn render_csv(matrix: &AttendanceMatrix) -> Result<Vec<u8>, RollcallError> {
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::from(UTF8_BOM));

    wtr.write_record(CSV_HEADER)?;
    for row in &matrix.students {
        let subgroup = row
            .student
            .subgroup_id
            .map(|s| s.to_string())
            .unwrap_or_default();
        for cell in &row.lessons {
            let date = cell.date.to_string();
            let lesson_num = cell.lesson_num.to_string();
            wtr.write_record([
                row.student.full_name.as_str(),
                row.student.email.as_deref().unwrap_or(""),
                subgroup.as_str(),
                date.as_str(),
                lesson_num.as_str(),
                cell.title.as_str(),
                cell.status.as_symbol(),
                cell.note.as_deref().unwrap_or(""),
            ])?;
        }
    }

    let buf = wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(buf)
}

/// Journal-shaped workbook: one row per student, lesson columns after
/// the per-status tallies.
pub fn render_xlsx(group_id: i64, matrix: &AttendanceMatrix) -> Result<Vec<u8>, RollcallError> {
    let base = Format::new()
        .set_font_size(9)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap();
    let header = base.clone().set_background_color(Color::RGB(0xF8F9FA));

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(format!("Посещаемость {group_id}"))?;

    let fixed = ["Студент", "УП", "НП", "Б", "Всего"];
    for (col, title) in fixed.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header)?;
        sheet.set_column_width(col as u16, 10)?;
    }
    for (idx, lesson) in matrix.lessons.iter().enumerate() {
        let col = (fixed.len() + idx) as u16;
        sheet.write_string_with_format(0, col, lesson_header(lesson), &header)?;
        sheet.set_column_width(col, 15)?;
    }

    for (idx, row) in matrix.students.iter().enumerate() {
        let r = (idx + 1) as u32;
        let name = match row.student.subgroup_id {
            Some(sub) => format!("{} ({sub})", row.student.full_name),
            None => row.student.full_name.clone(),
        };
        sheet.write_string_with_format(r, 0, name, &base)?;

        let tally = tally(&row.lessons);
        sheet.write_number_with_format(r, 1, tally.excused as f64, &base)?;
        sheet.write_number_with_format(r, 2, tally.unexcused as f64, &base)?;
        sheet.write_number_with_format(r, 3, tally.sick as f64, &base)?;
        sheet.write_number_with_format(r, 4, tally.total() as f64, &base)?;

        for (cidx, cell) in row.lessons.iter().enumerate() {
            let col = (fixed.len() + cidx) as u16;
            sheet.write_string_with_format(r, col, cell.status.as_symbol(), &base)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

#[derive(Debug, Default, PartialEq)]
struct Tally {
    excused: u32,
    unexcused: u32,
    sick: u32,
}

impl Tally {
    /// Missed lessons overall; present and not-marked cells don't count.
    fn total(&self) -> u32 {
        self.excused + self.unexcused + self.sick
    }
}

fn tally(cells: &[LessonCell]) -> Tally {
    let mut tally = Tally::default();
    for cell in cells {
        match cell.status {
            AttendanceStatus::Excused => tally.excused += 1,
            AttendanceStatus::Unexcused => tally.unexcused += 1,
            AttendanceStatus::Sick => tally.sick += 1,
            AttendanceStatus::Present | AttendanceStatus::NotMarked => {}
        }
    }
    tally
}

/// Compact column caption: `DD.MM №N Title…`, with the subgroup label in
/// brackets when the lesson was held for one subgroup only.
fn lesson_header(lesson: &Lesson) -> String {
    let title = if lesson.title.chars().count() > 12 {
        let short: String = lesson.title.chars().take(12).collect();
        format!("{short}...")
    } else {
        lesson.title.clone()
    };
    let date = lesson.date.format("%d.%m");
    match lesson.subgroup_id {
        Some(sub) => format!("{date} №{} {title} [{sub}]", lesson.lesson_num),
        None => format!("{date} №{} {title}", lesson.lesson_num),
    }
}
