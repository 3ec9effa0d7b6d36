use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::enrollment::{
    EnrollmentError, EnrollmentLedger, EnrollmentResult, Entity, Grade, NewEnrollment, RosterEntry, Takes,
    TranscriptEntry,
};

/// `takes` table access. The table's primary key on (student_id, sec_id) is
/// the uniqueness backstop for concurrent registrations.
#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn missing_enrollment(student_id: &str, section_id: &str) -> EnrollmentError {
    EnrollmentError::not_found(Entity::Enrollment, format!("{}/{}", student_id, section_id))
}

#[async_trait]
impl EnrollmentLedger for PgLedger {
    async fn create(&self, enrollment: NewEnrollment) -> EnrollmentResult<Takes> {
        let inserted = sqlx::query_as::<_, Takes>(
            r#"
            INSERT INTO takes (student_id, course_id, sec_id, semester, year, grade)
            VALUES ($1, $2, $3, $4, $5, NULL)
            RETURNING student_id, course_id, sec_id AS section_id, semester, year, grade
            "#,
        )
        .bind(&enrollment.student_id)
        .bind(&enrollment.course_id)
        .bind(&enrollment.section_id)
        .bind(&enrollment.semester)
        .bind(enrollment.year)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(takes) => Ok(takes),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(EnrollmentError::DuplicateEnrollment {
                    student_id: enrollment.student_id,
                    section_id: enrollment.section_id,
                })
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn delete(&self, student_id: &str, section_id: &str) -> EnrollmentResult<()> {
        let result = sqlx::query("DELETE FROM takes WHERE student_id = $1 AND sec_id = $2")
            .bind(student_id)
            .bind(section_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(missing_enrollment(student_id, section_id));
        }
        Ok(())
    }

    async fn update_grade(&self, student_id: &str, section_id: &str, grade: Grade) -> EnrollmentResult<()> {
        let result = sqlx::query("UPDATE takes SET grade = $3 WHERE student_id = $1 AND sec_id = $2")
            .bind(student_id)
            .bind(section_id)
            .bind(grade.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(missing_enrollment(student_id, section_id));
        }
        Ok(())
    }

    async fn find(&self, student_id: &str, section_id: &str) -> EnrollmentResult<Option<Takes>> {
        let row = sqlx::query_as::<_, Takes>(
            r#"
            SELECT student_id, course_id, sec_id AS section_id, semester, year, grade
            FROM takes
            WHERE student_id = $1 AND sec_id = $2
            "#,
        )
        .bind(student_id)
        .bind(section_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn active_sections(&self, student_id: &str) -> EnrollmentResult<BTreeSet<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT sec_id FROM takes WHERE student_id = $1")
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn count_active(&self, section_id: &str) -> EnrollmentResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM takes WHERE sec_id = $1")
            .bind(section_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn has_passed(&self, student_id: &str, course_id: &str) -> EnrollmentResult<bool> {
        let (passed,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM takes
                WHERE student_id = $1
                  AND course_id = $2
                  AND grade IS NOT NULL
                  AND grade <> ''
                  AND grade <> 'F'
            )
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(passed)
    }

    async fn transcript_entries(&self, student_id: &str) -> EnrollmentResult<Vec<TranscriptEntry>> {
        let rows = sqlx::query_as::<_, TranscriptEntry>(
            r#"
            SELECT t.course_id, t.sec_id AS section_id, c.title, t.semester, t.year, c.credits, t.grade
            FROM takes t
            JOIN course c ON c.course_id = t.course_id
            WHERE t.student_id = $1
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn section_roster(&self, section_id: &str) -> EnrollmentResult<Vec<RosterEntry>> {
        let rows = sqlx::query_as::<_, RosterEntry>(
            r#"
            SELECT t.student_id, s.name, s.dept_name, t.grade
            FROM takes t
            JOIN student s ON s.id = t.student_id
            WHERE t.sec_id = $1
            ORDER BY t.student_id
            "#,
        )
        .bind(section_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
