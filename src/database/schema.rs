use sqlx::PgPool;
use tracing::info;

use super::DatabaseError;

/// Idempotent DDL, applied in order inside one transaction.
const STATEMENTS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS department (
        dept_name   TEXT PRIMARY KEY,
        building    TEXT NOT NULL DEFAULT ''
    )"#,
    r#"CREATE TABLE IF NOT EXISTS student (
        id              TEXT PRIMARY KEY,
        name            TEXT NOT NULL,
        dept_name       TEXT NOT NULL REFERENCES department (dept_name),
        tot_cred        NUMERIC(6, 1) NOT NULL DEFAULT 0 CHECK (tot_cred >= 0),
        password_digest TEXT
    )"#,
    r#"CREATE TABLE IF NOT EXISTS instructor (
        id              TEXT PRIMARY KEY,
        name            TEXT NOT NULL,
        dept_name       TEXT NOT NULL REFERENCES department (dept_name),
        password_digest TEXT
    )"#,
    r#"CREATE TABLE IF NOT EXISTS course (
        course_id   TEXT PRIMARY KEY,
        title       TEXT NOT NULL,
        dept_name   TEXT NOT NULL REFERENCES department (dept_name),
        credits     NUMERIC(4, 1) NOT NULL CHECK (credits > 0)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS prereq (
        course_id   TEXT NOT NULL REFERENCES course (course_id) ON DELETE CASCADE,
        prereq_id   TEXT NOT NULL REFERENCES course (course_id),
        PRIMARY KEY (course_id, prereq_id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS classroom (
        building    TEXT NOT NULL,
        room_number TEXT NOT NULL,
        capacity    INTEGER NOT NULL CHECK (capacity >= 0),
        PRIMARY KEY (building, room_number)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS time_slot (
        time_slot_id TEXT PRIMARY KEY,
        days         SMALLINT[] NOT NULL,
        start_hr     SMALLINT NOT NULL CHECK (start_hr BETWEEN 0 AND 23),
        start_min    SMALLINT NOT NULL CHECK (start_min BETWEEN 0 AND 59),
        end_hr       SMALLINT NOT NULL CHECK (end_hr BETWEEN 0 AND 23),
        end_min      SMALLINT NOT NULL CHECK (end_min BETWEEN 0 AND 59)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS section (
        sec_id       TEXT PRIMARY KEY,
        course_id    TEXT NOT NULL REFERENCES course (course_id),
        semester     TEXT NOT NULL CHECK (semester IN ('Fall', 'Winter', 'Spring', 'Summer')),
        year         INTEGER NOT NULL CHECK (year > 1701 AND year < 2100),
        building     TEXT NOT NULL,
        room_number  TEXT NOT NULL,
        time_slot_id TEXT REFERENCES time_slot (time_slot_id),
        FOREIGN KEY (building, room_number) REFERENCES classroom (building, room_number)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS teaches (
        instructor_id TEXT NOT NULL REFERENCES instructor (id) ON DELETE CASCADE,
        sec_id        TEXT NOT NULL REFERENCES section (sec_id) ON DELETE CASCADE,
        PRIMARY KEY (instructor_id, sec_id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS takes (
        student_id  TEXT NOT NULL REFERENCES student (id) ON DELETE CASCADE,
        course_id   TEXT NOT NULL REFERENCES course (course_id),
        sec_id      TEXT NOT NULL REFERENCES section (sec_id) ON DELETE CASCADE,
        semester    TEXT NOT NULL,
        year        INTEGER NOT NULL,
        grade       TEXT,
        PRIMARY KEY (student_id, sec_id)
    )"#,
    "CREATE INDEX IF NOT EXISTS takes_sec_id_idx ON takes (sec_id)",
    "CREATE INDEX IF NOT EXISTS takes_student_course_idx ON takes (student_id, course_id)",
];

pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
    let mut tx = pool.begin().await?;
    for statement in STATEMENTS {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    info!("Applied {} schema statements", STATEMENTS.len());
    Ok(())
}
