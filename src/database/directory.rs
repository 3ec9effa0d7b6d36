use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::auth::Role;
use crate::enrollment::{Course, Directory, EnrollmentError, EnrollmentResult, Entity, Section, Student, TimeSlot};

/// Catalog lookups against the registrar schema
#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct TimeSlotRow {
    id: String,
    days: Vec<i16>,
    start_hr: i16,
    start_min: i16,
    end_hr: i16,
    end_min: i16,
}

impl TimeSlotRow {
    fn into_time_slot(self) -> EnrollmentResult<TimeSlot> {
        let malformed = || EnrollmentError::infrastructure(format!("malformed time slot row '{}'", self.id));

        let markers = self
            .days
            .iter()
            .map(|d| u8::try_from(*d))
            .collect::<Result<Vec<u8>, _>>()
            .map_err(|_| malformed())?;
        let hm = |h: i16, m: i16| -> EnrollmentResult<(u32, u32)> {
            Ok((u32::try_from(h).map_err(|_| malformed())?, u32::try_from(m).map_err(|_| malformed())?))
        };
        let start = hm(self.start_hr, self.start_min)?;
        let end = hm(self.end_hr, self.end_min)?;

        TimeSlot::from_parts(self.id.clone(), &markers, start, end)
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn get_student(&self, id: &str) -> EnrollmentResult<Student> {
        sqlx::query_as::<_, Student>("SELECT id, name, dept_name, tot_cred FROM student WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| EnrollmentError::not_found(Entity::Student, id))
    }

    async fn get_course(&self, id: &str) -> EnrollmentResult<Course> {
        sqlx::query_as::<_, Course>(
            "SELECT course_id AS id, title, dept_name, credits FROM course WHERE course_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| EnrollmentError::not_found(Entity::Course, id))
    }

    async fn get_section(&self, id: &str) -> EnrollmentResult<Section> {
        sqlx::query_as::<_, Section>(
            r#"
            SELECT sec_id AS id, course_id, semester, year, building, room_number, time_slot_id
            FROM section
            WHERE sec_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| EnrollmentError::not_found(Entity::Section, id))
    }

    async fn get_prerequisite_course_ids(&self, course_id: &str) -> EnrollmentResult<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT prereq_id FROM prereq WHERE course_id = $1 ORDER BY prereq_id")
                .bind(course_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn get_classroom_capacity(&self, building: &str, room_number: &str) -> EnrollmentResult<i64> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT capacity::BIGINT FROM classroom WHERE building = $1 AND room_number = $2",
        )
        .bind(building)
        .bind(room_number)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(capacity,)| capacity).ok_or_else(|| {
            EnrollmentError::not_found(Entity::Classroom, format!("{} {}", building, room_number))
        })
    }

    async fn get_time_slot(&self, id: &str) -> EnrollmentResult<TimeSlot> {
        sqlx::query_as::<_, TimeSlotRow>(
            r#"
            SELECT time_slot_id AS id, days, start_hr, start_min, end_hr, end_min
            FROM time_slot
            WHERE time_slot_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| EnrollmentError::not_found(Entity::TimeSlot, id))?
        .into_time_slot()
    }

    async fn teaches(&self, instructor_id: &str, section_id: &str) -> EnrollmentResult<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM teaches WHERE instructor_id = $1 AND sec_id = $2)",
        )
        .bind(instructor_id)
        .bind(section_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn teaching_sections(&self, instructor_id: &str) -> EnrollmentResult<Vec<Section>> {
        let sections = sqlx::query_as::<_, Section>(
            r#"
            SELECT s.sec_id AS id, s.course_id, s.semester, s.year, s.building, s.room_number, s.time_slot_id
            FROM section s
            JOIN teaches t ON t.sec_id = s.sec_id
            WHERE t.instructor_id = $1
            ORDER BY s.sec_id
            "#,
        )
        .bind(instructor_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sections)
    }

    async fn get_password_digest(&self, role: Role, id: &str) -> EnrollmentResult<Option<String>> {
        let sql = match role {
            Role::Student => "SELECT password_digest FROM student WHERE id = $1",
            Role::Instructor => "SELECT password_digest FROM instructor WHERE id = $1",
            Role::Admin => return Ok(None),
        };

        let row: Option<(Option<String>,)> = sqlx::query_as(sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.and_then(|(digest,)| digest))
    }

    async fn ping(&self) -> EnrollmentResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
