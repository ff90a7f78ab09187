use crate::db::models::{
    AttendanceMark, AttendanceRecord, AttendanceStatus, Group, GroupStats, Lesson, LessonRow,
    MatrixFilter, NewLesson, NewStudent, StatusCounts, Student, User,
};
use crate::db::schema::SQLITE_INIT;
use crate::error::RollcallError;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, QueryBuilder, Row, Sqlite};

pub type SqlitePool = Pool<Sqlite>;

#[derive(Clone)]
pub struct JournalStorage {
    pool: SqlitePool,
}

impl JournalStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), RollcallError> {
        // execute multiple statements safely (SQLite supports multi-commands but sqlx::query doesn't)
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Create the single curator account. Returns `None` when a user
    /// already exists; the guard and the insert are one statement, so
    /// concurrent registrations cannot both succeed.
    pub async fn create_curator(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<User>, RollcallError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password, role)
            SELECT ?, ?, 'curator'
            WHERE NOT EXISTS (SELECT 1 FROM users)
            RETURNING id, email, password, role
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RollcallError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password, role FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn create_group(
        &self,
        name: &str,
        description: Option<&str>,
        created_by: i64,
    ) -> Result<Group, RollcallError> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (name, description, created_by)
            VALUES (?, ?, ?)
            RETURNING id, name, description
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(group)
    }

    /// Groups of one curator, newest first.
    pub async fn list_groups(&self, created_by: i64) -> Result<Vec<Group>, RollcallError> {
        let groups = sqlx::query_as::<_, Group>(
            r#"SELECT id, name, description FROM groups
               WHERE created_by = ? ORDER BY created_at DESC, id DESC"#,
        )
        .bind(created_by)
        .fetch_all(&self.pool)
        .await?;
        Ok(groups)
    }

    /// Resolve a group only if it belongs to the given curator. Every
    /// group-scoped operation goes through this; a miss is reported the
    /// same way whether the group is foreign or absent.
    pub async fn find_owned_group(
        &self,
        group_id: i64,
        created_by: i64,
    ) -> Result<Option<Group>, RollcallError> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, name, description FROM groups WHERE id = ? AND created_by = ?",
        )
        .bind(group_id)
        .bind(created_by)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    /// Bulk-insert students in a single transaction. Entries with a blank
    /// name are skipped; the returned count covers actual inserts only.
    pub async fn add_students(
        &self,
        group_id: i64,
        entries: &[NewStudent],
    ) -> Result<u64, RollcallError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for entry in entries {
            let full_name = entry.full_name.trim();
            if full_name.is_empty() {
                continue;
            }
            let email = entry
                .email
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty());
            sqlx::query(
                "INSERT INTO students (full_name, email, group_id, subgroup_id) VALUES (?, ?, ?, ?)",
            )
            .bind(full_name)
            .bind(email)
            .bind(group_id)
            .bind(entry.subgroup_id)
            .execute(&mut *tx)
            .await?;
            inserted += 1;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Student roster of a group, optionally narrowed to one subgroup.
    /// Students without a subgroup sort after labelled ones.
    pub async fn list_students(
        &self,
        group_id: i64,
        subgroup_id: Option<i64>,
    ) -> Result<Vec<Student>, RollcallError> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT id, full_name, email, subgroup_id FROM students WHERE group_id = ",
        );
        qb.push_bind(group_id);
        if let Some(sub) = subgroup_id {
            qb.push(" AND subgroup_id = ");
            qb.push_bind(sub);
        }
        qb.push(" ORDER BY subgroup_id NULLS LAST, full_name");
        let students = qb.build_query_as::<Student>().fetch_all(&self.pool).await?;
        Ok(students)
    }

    /// Student axis of the attendance matrix, in a stable name order.
    pub async fn students_for_matrix(
        &self,
        group_id: i64,
        filter: &MatrixFilter,
    ) -> Result<Vec<Student>, RollcallError> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT id, full_name, email, subgroup_id FROM students WHERE group_id = ",
        );
        qb.push_bind(group_id);
        if let Some(ids) = &filter.student_ids {
            push_id_list(&mut qb, "id", ids);
        }
        if let Some(sub) = filter.subgroup_id {
            qb.push(" AND subgroup_id = ");
            qb.push_bind(sub);
        }
        qb.push(" ORDER BY full_name, id");
        let students = qb.build_query_as::<Student>().fetch_all(&self.pool).await?;
        Ok(students)
    }

    pub async fn find_student_in_group(
        &self,
        student_id: i64,
        group_id: i64,
    ) -> Result<Option<Student>, RollcallError> {
        let student = sqlx::query_as::<_, Student>(
            "SELECT id, full_name, email, subgroup_id FROM students WHERE id = ? AND group_id = ?",
        )
        .bind(student_id)
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(student)
    }

    pub async fn create_lesson(&self, lesson: &NewLesson) -> Result<Lesson, RollcallError> {
        let created = sqlx::query_as::<_, Lesson>(
            r#"
            INSERT INTO lessons (date, lesson_num, title, group_id, subgroup_id)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, date, lesson_num, title, group_id, subgroup_id
            "#,
        )
        .bind(lesson.date)
        .bind(lesson.lesson_num)
        .bind(lesson.title.as_str())
        .bind(lesson.group_id)
        .bind(lesson.subgroup_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// Resolve a lesson only if its group belongs to the given curator.
    pub async fn find_owned_lesson(
        &self,
        lesson_id: i64,
        created_by: i64,
    ) -> Result<Option<Lesson>, RollcallError> {
        let lesson = sqlx::query_as::<_, Lesson>(
            r#"SELECT l.id, l.date, l.lesson_num, l.title, l.group_id, l.subgroup_id
               FROM lessons l JOIN groups g ON g.id = l.group_id
               WHERE l.id = ? AND g.created_by = ?"#,
        )
        .bind(lesson_id)
        .bind(created_by)
        .fetch_optional(&self.pool)
        .await?;
        Ok(lesson)
    }

    /// Lessons of a group joined with the group name, in journal order
    /// (date, then lesson number within the day).
    pub async fn list_lessons(
        &self,
        group_id: i64,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
        subgroup_id: Option<i64>,
    ) -> Result<Vec<LessonRow>, RollcallError> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"SELECT l.id, l.date, l.lesson_num, l.title, l.group_id, l.subgroup_id, g.name AS group_name
               FROM lessons l JOIN groups g ON g.id = l.group_id WHERE l.group_id = "#,
        );
        qb.push_bind(group_id);
        if let Some(from) = date_from {
            qb.push(" AND l.date >= ");
            qb.push_bind(from);
        }
        if let Some(to) = date_to {
            qb.push(" AND l.date <= ");
            qb.push_bind(to);
        }
        if let Some(sub) = subgroup_id {
            qb.push(" AND l.subgroup_id = ");
            qb.push_bind(sub);
        }
        qb.push(" ORDER BY l.date, l.lesson_num");
        let lessons = qb.build_query_as::<LessonRow>().fetch_all(&self.pool).await?;
        Ok(lessons)
    }

    /// Lesson axis of the attendance matrix, in journal order.
    pub async fn lessons_for_matrix(
        &self,
        group_id: i64,
        filter: &MatrixFilter,
    ) -> Result<Vec<Lesson>, RollcallError> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT id, date, lesson_num, title, group_id, subgroup_id FROM lessons WHERE group_id = ",
        );
        qb.push_bind(group_id);
        if let Some(from) = filter.date_from {
            qb.push(" AND date >= ");
            qb.push_bind(from);
        }
        if let Some(to) = filter.date_to {
            qb.push(" AND date <= ");
            qb.push_bind(to);
        }
        if let Some(ids) = &filter.lesson_ids {
            push_id_list(&mut qb, "id", ids);
        }
        if let Some(sub) = filter.subgroup_id {
            qb.push(" AND subgroup_id = ");
            qb.push_bind(sub);
        }
        qb.push(" ORDER BY date, lesson_num, id");
        let lessons = qb.build_query_as::<Lesson>().fetch_all(&self.pool).await?;
        Ok(lessons)
    }

    /// Insert or overwrite the mark for one `(student, lesson)` cell.
    /// Uses SQLite `INSERT ... ON CONFLICT(student_id, lesson_id) DO UPDATE`.
    pub async fn upsert_mark(
        &self,
        student_id: i64,
        lesson_id: i64,
        status: AttendanceStatus,
        note: Option<&str>,
    ) -> Result<AttendanceRecord, RollcallError> {
        let updated_at = Utc::now().to_rfc3339();
        let row = sqlx::query(
            r#"
            INSERT INTO attendance (student_id, lesson_id, status, note, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(student_id, lesson_id) DO UPDATE SET
                status=excluded.status,
                note=excluded.note,
                updated_at=excluded.updated_at
            RETURNING id, student_id, lesson_id, status, note, updated_at
            "#,
        )
        .bind(student_id)
        .bind(lesson_id)
        .bind(status.as_symbol())
        .bind(note)
        .bind(updated_at)
        .fetch_one(&self.pool)
        .await?;
        Self::record_from_row(row)
    }

    /// All explicitly recorded marks for lessons of one group.
    pub async fn group_marks(&self, group_id: i64) -> Result<Vec<AttendanceMark>, RollcallError> {
        let rows = sqlx::query(
            r#"SELECT a.student_id, a.lesson_id, a.status, a.note
               FROM attendance a JOIN lessons l ON l.id = a.lesson_id
               WHERE l.group_id = ?"#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::mark_from_row).collect()
    }

    /// Per-status counts over recorded marks of a group, plus the roster
    /// size. Cells without a record are not counted.
    pub async fn group_stats(
        &self,
        group_id: i64,
        subgroup_id: Option<i64>,
    ) -> Result<GroupStats, RollcallError> {
        let mut count_qb =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM students WHERE group_id = ");
        count_qb.push_bind(group_id);
        if let Some(sub) = subgroup_id {
            count_qb.push(" AND subgroup_id = ");
            count_qb.push_bind(sub);
        }
        let total_students: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"SELECT
                 COUNT(*) FILTER (WHERE a.status = 'П') AS present,
                 COUNT(*) FILTER (WHERE a.status = 'Б') AS sick,
                 COUNT(*) FILTER (WHERE a.status = 'НП') AS unexcused,
                 COUNT(*) FILTER (WHERE a.status = 'УП') AS excused,
                 COUNT(*) FILTER (WHERE a.status = 'Н') AS not_marked
               FROM attendance a
               JOIN lessons l ON l.id = a.lesson_id
               JOIN students s ON s.id = a.student_id
               WHERE l.group_id = "#,
        );
        qb.push_bind(group_id);
        qb.push(" AND s.group_id = ");
        qb.push_bind(group_id);
        if let Some(sub) = subgroup_id {
            qb.push(" AND s.subgroup_id = ");
            qb.push_bind(sub);
        }
        let counts: StatusCounts = qb.build_query_as().fetch_one(&self.pool).await?;

        Ok(GroupStats {
            total_students,
            present: counts.present,
            sick: counts.sick,
            unexcused: counts.unexcused,
            excused: counts.excused,
            not_marked: counts.not_marked,
            absent: counts.sick + counts.unexcused,
        })
    }

    fn mark_from_row(row: SqliteRow) -> Result<AttendanceMark, RollcallError> {
        let student_id: i64 = row.try_get("student_id")?;
        let lesson_id: i64 = row.try_get("lesson_id")?;
        let status_s: String = row.try_get("status")?;
        let note: Option<String> = row.try_get("note")?;

        let status = AttendanceStatus::from_symbol(&status_s).ok_or_else(|| {
            sqlx::Error::Decode(format!("unknown attendance status: {status_s}").into())
        })?;

        Ok(AttendanceMark {
            student_id,
            lesson_id,
            status,
            note,
        })
    }

    fn record_from_row(row: SqliteRow) -> Result<AttendanceRecord, RollcallError> {
        let id: i64 = row.try_get("id")?;
        let student_id: i64 = row.try_get("student_id")?;
        let lesson_id: i64 = row.try_get("lesson_id")?;
        let status_s: String = row.try_get("status")?;
        let note: Option<String> = row.try_get("note")?;
        let updated_at_s: String = row.try_get("updated_at")?;

        let status = AttendanceStatus::from_symbol(&status_s).ok_or_else(|| {
            sqlx::Error::Decode(format!("unknown attendance status: {status_s}").into())
        })?;
        let updated_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&updated_at_s)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
            .with_timezone(&Utc);

        Ok(AttendanceRecord {
            id,
            student_id,
            lesson_id,
            status,
            note,
            updated_at,
        })
    }
}

/// Append `AND <column> IN (…)` with one bind per id. An empty id set
/// must select nothing, not everything.
fn push_id_list(qb: &mut QueryBuilder<'_, Sqlite>, column: &str, ids: &[i64]) {
    if ids.is_empty() {
        qb.push(" AND 0");
        return;
    }
    qb.push(" AND ");
    qb.push(column);
    qb.push(" IN (");
    let mut sep = qb.separated(", ");
    for id in ids {
        sep.push_bind(*id);
    }
    sep.push_unseparated(")");
}
