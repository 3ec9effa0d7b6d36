//! In-process backend over plain maps, for demos and tests.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::auth::Role;
use crate::fixture::{Fixture, FixtureError};

use super::directory::Directory;
use super::error::{EnrollmentError, EnrollmentResult, Entity};
use super::ledger::EnrollmentLedger;
use super::model::{
    Course, Grade, NewEnrollment, RosterEntry, Section, Student, Takes, TimeSlot, TranscriptEntry,
};

/// Immutable catalog snapshot.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    students: HashMap<String, Student>,
    courses: HashMap<String, Course>,
    prerequisites: HashMap<String, Vec<String>>,
    classrooms: HashMap<(String, String), i64>,
    time_slots: HashMap<String, TimeSlot>,
    sections: HashMap<String, Section>,
    teaches: HashSet<(String, String)>,
    passwords: HashMap<(Role, String), String>,
}

impl MemoryDirectory {
    pub fn from_fixture(fixture: &Fixture) -> Self {
        let mut directory = Self::default();

        for account in &fixture.students {
            if let Some(digest) = &account.password_digest {
                directory
                    .passwords
                    .insert((Role::Student, account.id.clone()), digest.clone());
            }
            directory.students.insert(account.id.clone(), account.record());
        }
        for account in &fixture.instructors {
            if let Some(digest) = &account.password_digest {
                directory
                    .passwords
                    .insert((Role::Instructor, account.id.clone()), digest.clone());
            }
        }
        for course in &fixture.courses {
            directory.courses.insert(course.id.clone(), course.clone());
        }
        for edge in &fixture.prerequisites {
            directory
                .prerequisites
                .entry(edge.course_id.clone())
                .or_default()
                .push(edge.prereq_id.clone());
        }
        for room in &fixture.classrooms {
            directory
                .classrooms
                .insert((room.building.clone(), room.room_number.clone()), room.capacity);
        }
        for slot in &fixture.time_slots {
            directory.time_slots.insert(slot.id.clone(), slot.clone());
        }
        for section in &fixture.sections {
            directory.sections.insert(section.id.clone(), section.clone());
        }
        for assignment in &fixture.teaches {
            directory
                .teaches
                .insert((assignment.instructor_id.clone(), assignment.section_id.clone()));
        }

        directory
    }
}

fn lookup<T: Clone>(map: &HashMap<String, T>, entity: Entity, id: &str) -> EnrollmentResult<T> {
    map.get(id)
        .cloned()
        .ok_or_else(|| EnrollmentError::not_found(entity, id))
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn get_student(&self, id: &str) -> EnrollmentResult<Student> {
        lookup(&self.students, Entity::Student, id)
    }

    async fn get_course(&self, id: &str) -> EnrollmentResult<Course> {
        lookup(&self.courses, Entity::Course, id)
    }

    async fn get_section(&self, id: &str) -> EnrollmentResult<Section> {
        lookup(&self.sections, Entity::Section, id)
    }

    async fn get_prerequisite_course_ids(&self, course_id: &str) -> EnrollmentResult<Vec<String>> {
        Ok(self.prerequisites.get(course_id).cloned().unwrap_or_default())
    }

    async fn get_classroom_capacity(&self, building: &str, room_number: &str) -> EnrollmentResult<i64> {
        self.classrooms
            .get(&(building.to_string(), room_number.to_string()))
            .copied()
            .ok_or_else(|| EnrollmentError::not_found(Entity::Classroom, format!("{} {}", building, room_number)))
    }

    async fn get_time_slot(&self, id: &str) -> EnrollmentResult<TimeSlot> {
        lookup(&self.time_slots, Entity::TimeSlot, id)
    }

    async fn teaches(&self, instructor_id: &str, section_id: &str) -> EnrollmentResult<bool> {
        Ok(self
            .teaches
            .contains(&(instructor_id.to_string(), section_id.to_string())))
    }

    async fn teaching_sections(&self, instructor_id: &str) -> EnrollmentResult<Vec<Section>> {
        let mut sections: Vec<Section> = self
            .teaches
            .iter()
            .filter(|(instructor, _)| instructor == instructor_id)
            .filter_map(|(_, section_id)| self.sections.get(section_id).cloned())
            .collect();
        sections.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(sections)
    }

    async fn get_password_digest(&self, role: Role, id: &str) -> EnrollmentResult<Option<String>> {
        Ok(self.passwords.get(&(role, id.to_string())).cloned())
    }
}

type RowKey = (String, String);

fn row_key(student_id: &str, section_id: &str) -> RowKey {
    (student_id.to_string(), section_id.to_string())
}

fn enrollment_id(student_id: &str, section_id: &str) -> String {
    format!("{}/{}", student_id, section_id)
}

/// Ledger keyed by (student, section); the key doubles as the uniqueness
/// constraint.
pub struct MemoryLedger {
    directory: Arc<dyn Directory>,
    rows: RwLock<BTreeMap<RowKey, Takes>>,
}

impl MemoryLedger {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self {
            directory,
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn from_fixture(directory: Arc<dyn Directory>, fixture: &Fixture) -> Result<Self, FixtureError> {
        let rows = fixture
            .enrollments()?
            .into_iter()
            .map(|takes| (row_key(&takes.student_id, &takes.section_id), takes))
            .collect();

        Ok(Self {
            directory,
            rows: RwLock::new(rows),
        })
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl EnrollmentLedger for MemoryLedger {
    async fn create(&self, enrollment: NewEnrollment) -> EnrollmentResult<Takes> {
        let key = row_key(&enrollment.student_id, &enrollment.section_id);
        let mut rows = self.rows.write().await;
        if rows.contains_key(&key) {
            return Err(EnrollmentError::DuplicateEnrollment {
                student_id: enrollment.student_id,
                section_id: enrollment.section_id,
            });
        }

        let takes = enrollment.into_takes();
        rows.insert(key, takes.clone());
        Ok(takes)
    }

    async fn delete(&self, student_id: &str, section_id: &str) -> EnrollmentResult<()> {
        self.rows
            .write()
            .await
            .remove(&row_key(student_id, section_id))
            .map(|_| ())
            .ok_or_else(|| EnrollmentError::not_found(Entity::Enrollment, enrollment_id(student_id, section_id)))
    }

    async fn update_grade(&self, student_id: &str, section_id: &str, grade: Grade) -> EnrollmentResult<()> {
        let mut rows = self.rows.write().await;
        let row = rows
            .get_mut(&row_key(student_id, section_id))
            .ok_or_else(|| EnrollmentError::not_found(Entity::Enrollment, enrollment_id(student_id, section_id)))?;
        row.grade = Some(grade.to_string());
        Ok(())
    }

    async fn find(&self, student_id: &str, section_id: &str) -> EnrollmentResult<Option<Takes>> {
        Ok(self.rows.read().await.get(&row_key(student_id, section_id)).cloned())
    }

    async fn active_sections(&self, student_id: &str) -> EnrollmentResult<BTreeSet<String>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .filter(|row| row.student_id == student_id)
            .map(|row| row.section_id.clone())
            .collect())
    }

    async fn count_active(&self, section_id: &str) -> EnrollmentResult<i64> {
        let count = self
            .rows
            .read()
            .await
            .values()
            .filter(|row| row.section_id == section_id)
            .count();
        Ok(count as i64)
    }

    async fn has_passed(&self, student_id: &str, course_id: &str) -> EnrollmentResult<bool> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .any(|row| row.student_id == student_id && row.course_id == course_id && row.is_passed()))
    }

    async fn transcript_entries(&self, student_id: &str) -> EnrollmentResult<Vec<TranscriptEntry>> {
        let rows: Vec<Takes> = self
            .rows
            .read()
            .await
            .values()
            .filter(|row| row.student_id == student_id)
            .cloned()
            .collect();

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let course = self.directory.get_course(&row.course_id).await?;
            entries.push(TranscriptEntry {
                course_id: row.course_id,
                section_id: row.section_id,
                title: course.title,
                semester: row.semester,
                year: row.year,
                credits: course.credits,
                grade: row.grade,
            });
        }
        Ok(entries)
    }

    async fn section_roster(&self, section_id: &str) -> EnrollmentResult<Vec<RosterEntry>> {
        // BTreeMap keys sort by student id first
        let rows: Vec<Takes> = self
            .rows
            .read()
            .await
            .values()
            .filter(|row| row.section_id == section_id)
            .cloned()
            .collect();

        let mut roster = Vec::with_capacity(rows.len());
        for row in rows {
            let student = self.directory.get_student(&row.student_id).await?;
            roster.push(RosterEntry {
                student_id: row.student_id,
                name: student.name,
                dept_name: student.dept_name,
                grade: row.grade,
            });
        }
        Ok(roster)
    }
}

/// Directory and ledger sharing one fixture
pub fn open(fixture: &Fixture) -> Result<(Arc<MemoryDirectory>, Arc<MemoryLedger>), FixtureError> {
    let directory = Arc::new(MemoryDirectory::from_fixture(fixture));
    let ledger = MemoryLedger::from_fixture(directory.clone(), fixture)?;
    Ok((directory, Arc::new(ledger)))
}
