use std::collections::BTreeSet;

use async_trait::async_trait;

use super::error::EnrollmentResult;
use super::model::{Grade, NewEnrollment, RosterEntry, Student, Takes, Transcript, TranscriptEntry};

/// System of record for `Takes` rows.
///
/// Implementations must make `create` fail with `DuplicateEnrollment` when a
/// row for the (student, section) pair exists, atomically with the insert.
#[async_trait]
pub trait EnrollmentLedger: Send + Sync {
    /// Inserts an ungraded row.
    async fn create(&self, enrollment: NewEnrollment) -> EnrollmentResult<Takes>;

    /// Hard delete; `NotFound(Enrollment)` when there is no row.
    async fn delete(&self, student_id: &str, section_id: &str) -> EnrollmentResult<()>;

    /// `NotFound(Enrollment)` when there is no row.
    async fn update_grade(&self, student_id: &str, section_id: &str, grade: Grade) -> EnrollmentResult<()>;

    async fn find(&self, student_id: &str, section_id: &str) -> EnrollmentResult<Option<Takes>>;

    /// Sections holding a row for the student, graded or not
    async fn active_sections(&self, student_id: &str) -> EnrollmentResult<BTreeSet<String>>;

    async fn count_active(&self, section_id: &str) -> EnrollmentResult<i64>;

    /// Whether any row for (student, course) carries a passing mark
    async fn has_passed(&self, student_id: &str, course_id: &str) -> EnrollmentResult<bool>;

    /// Every row of the student joined with course title and credits
    async fn transcript_entries(&self, student_id: &str) -> EnrollmentResult<Vec<TranscriptEntry>>;

    /// Students holding a row for the section, ordered by student id
    async fn section_roster(&self, section_id: &str) -> EnrollmentResult<Vec<RosterEntry>>;

    async fn get_transcript(&self, student: &Student) -> EnrollmentResult<Transcript> {
        let entries = self.transcript_entries(&student.id).await?;
        Ok(Transcript::compile(student, entries))
    }
}
