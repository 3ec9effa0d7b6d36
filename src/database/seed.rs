use sqlx::PgPool;
use tracing::info;

use crate::fixture::{Fixture, FixtureError};

use super::DatabaseError;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for SeedError {
    fn from(err: sqlx::Error) -> Self {
        SeedError::Database(DatabaseError::Sqlx(err))
    }
}

/// Row counts written by `seed`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub students: usize,
    pub instructors: usize,
    pub courses: usize,
    pub sections: usize,
    pub takes: usize,
}

/// Upserts every record of the fixture in one transaction, parents first.
pub async fn seed(pool: &PgPool, fixture: &Fixture) -> Result<SeedReport, SeedError> {
    let takes = fixture.enrollments()?;
    let mut tx = pool.begin().await?;

    for dept in &fixture.departments {
        sqlx::query(
            "INSERT INTO department (dept_name, building) VALUES ($1, $2)
             ON CONFLICT (dept_name) DO UPDATE SET building = EXCLUDED.building",
        )
        .bind(&dept.dept_name)
        .bind(&dept.building)
        .execute(&mut *tx)
        .await?;
    }

    for account in &fixture.students {
        sqlx::query(
            "INSERT INTO student (id, name, dept_name, tot_cred, password_digest) VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, dept_name = EXCLUDED.dept_name,
                 tot_cred = EXCLUDED.tot_cred, password_digest = EXCLUDED.password_digest",
        )
        .bind(&account.id)
        .bind(&account.name)
        .bind(&account.dept_name)
        .bind(account.tot_cred)
        .bind(&account.password_digest)
        .execute(&mut *tx)
        .await?;
    }

    for account in &fixture.instructors {
        sqlx::query(
            "INSERT INTO instructor (id, name, dept_name, password_digest) VALUES ($1, $2, $3, $4)
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, dept_name = EXCLUDED.dept_name,
                 password_digest = EXCLUDED.password_digest",
        )
        .bind(&account.id)
        .bind(&account.name)
        .bind(&account.dept_name)
        .bind(&account.password_digest)
        .execute(&mut *tx)
        .await?;
    }

    for course in &fixture.courses {
        sqlx::query(
            "INSERT INTO course (course_id, title, dept_name, credits) VALUES ($1, $2, $3, $4)
             ON CONFLICT (course_id) DO UPDATE SET title = EXCLUDED.title, dept_name = EXCLUDED.dept_name,
                 credits = EXCLUDED.credits",
        )
        .bind(&course.id)
        .bind(&course.title)
        .bind(&course.dept_name)
        .bind(course.credits)
        .execute(&mut *tx)
        .await?;
    }

    for edge in &fixture.prerequisites {
        sqlx::query("INSERT INTO prereq (course_id, prereq_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(&edge.course_id)
            .bind(&edge.prereq_id)
            .execute(&mut *tx)
            .await?;
    }

    for room in &fixture.classrooms {
        let capacity = i32::try_from(room.capacity).unwrap_or(i32::MAX);
        sqlx::query(
            "INSERT INTO classroom (building, room_number, capacity) VALUES ($1, $2, $3)
             ON CONFLICT (building, room_number) DO UPDATE SET capacity = EXCLUDED.capacity",
        )
        .bind(&room.building)
        .bind(&room.room_number)
        .bind(capacity)
        .execute(&mut *tx)
        .await?;
    }

    for slot in &fixture.time_slots {
        let days: Vec<i16> = slot.days.markers().into_iter().map(i16::from).collect();
        let hm = |t: chrono::NaiveTime| {
            use chrono::Timelike;
            (t.hour() as i16, t.minute() as i16)
        };
        let (start_hr, start_min) = hm(slot.start);
        let (end_hr, end_min) = hm(slot.end);

        sqlx::query(
            "INSERT INTO time_slot (time_slot_id, days, start_hr, start_min, end_hr, end_min)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (time_slot_id) DO UPDATE SET days = EXCLUDED.days,
                 start_hr = EXCLUDED.start_hr, start_min = EXCLUDED.start_min,
                 end_hr = EXCLUDED.end_hr, end_min = EXCLUDED.end_min",
        )
        .bind(&slot.id)
        .bind(&days)
        .bind(start_hr)
        .bind(start_min)
        .bind(end_hr)
        .bind(end_min)
        .execute(&mut *tx)
        .await?;
    }

    for section in &fixture.sections {
        sqlx::query(
            "INSERT INTO section (sec_id, course_id, semester, year, building, room_number, time_slot_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (sec_id) DO UPDATE SET course_id = EXCLUDED.course_id, semester = EXCLUDED.semester,
                 year = EXCLUDED.year, building = EXCLUDED.building, room_number = EXCLUDED.room_number,
                 time_slot_id = EXCLUDED.time_slot_id",
        )
        .bind(&section.id)
        .bind(&section.course_id)
        .bind(&section.semester)
        .bind(section.year)
        .bind(&section.building)
        .bind(&section.room_number)
        .bind(&section.time_slot_id)
        .execute(&mut *tx)
        .await?;
    }

    for assignment in &fixture.teaches {
        sqlx::query("INSERT INTO teaches (instructor_id, sec_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(&assignment.instructor_id)
            .bind(&assignment.section_id)
            .execute(&mut *tx)
            .await?;
    }

    for row in &takes {
        sqlx::query(
            "INSERT INTO takes (student_id, course_id, sec_id, semester, year, grade)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (student_id, sec_id) DO UPDATE SET grade = EXCLUDED.grade",
        )
        .bind(&row.student_id)
        .bind(&row.course_id)
        .bind(&row.section_id)
        .bind(&row.semester)
        .bind(row.year)
        .bind(&row.grade)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let report = SeedReport {
        students: fixture.students.len(),
        instructors: fixture.instructors.len(),
        courses: fixture.courses.len(),
        sections: fixture.sections.len(),
        takes: takes.len(),
    };
    info!(?report, "fixture seeded");
    Ok(report)
}
