use async_trait::async_trait;

use crate::auth::Role;

use super::error::EnrollmentResult;
use super::model::{Course, Section, Student, TimeSlot};

/// Read-only view of the records owned by the CRUD layer.
///
/// Every keyed lookup fails with `EnrollmentError::NotFound` when the record
/// does not exist; any other failure is `Infrastructure`.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn get_student(&self, id: &str) -> EnrollmentResult<Student>;

    async fn get_course(&self, id: &str) -> EnrollmentResult<Course>;

    async fn get_section(&self, id: &str) -> EnrollmentResult<Section>;

    /// Courses that must be passed before `course_id`; empty when none.
    async fn get_prerequisite_course_ids(&self, course_id: &str) -> EnrollmentResult<Vec<String>>;

    async fn get_classroom_capacity(&self, building: &str, room_number: &str) -> EnrollmentResult<i64>;

    async fn get_time_slot(&self, id: &str) -> EnrollmentResult<TimeSlot>;

    /// Whether a teaching assignment links the instructor to the section
    async fn teaches(&self, instructor_id: &str, section_id: &str) -> EnrollmentResult<bool>;

    /// Sections the instructor is assigned to, ordered by section id
    async fn teaching_sections(&self, instructor_id: &str) -> EnrollmentResult<Vec<Section>>;

    /// Stored password digest for a login account, `None` if there is no such account
    async fn get_password_digest(&self, role: Role, id: &str) -> EnrollmentResult<Option<String>>;

    /// Cheap liveness probe for `/health`
    async fn ping(&self) -> EnrollmentResult<()> {
        Ok(())
    }
}
