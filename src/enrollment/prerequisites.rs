use std::sync::Arc;

use futures::future::try_join_all;

use super::directory::Directory;
use super::error::EnrollmentResult;
use super::ledger::EnrollmentLedger;

/// Decides whether a student has passed every prerequisite of a course.
#[derive(Clone)]
pub struct PrerequisiteChecker {
    directory: Arc<dyn Directory>,
    ledger: Arc<dyn EnrollmentLedger>,
}

impl PrerequisiteChecker {
    pub fn new(directory: Arc<dyn Directory>, ledger: Arc<dyn EnrollmentLedger>) -> Self {
        Self { directory, ledger }
    }

    /// Prerequisite course ids the student has not passed, in catalog order.
    ///
    /// A lookup failure is returned as an error, never as "satisfied".
    pub async fn missing(&self, student_id: &str, course_id: &str) -> EnrollmentResult<Vec<String>> {
        let required = self.directory.get_prerequisite_course_ids(course_id).await?;
        if required.is_empty() {
            return Ok(Vec::new());
        }

        let passed = try_join_all(
            required
                .iter()
                .map(|prereq_id| self.ledger.has_passed(student_id, prereq_id)),
        )
        .await?;

        Ok(required
            .into_iter()
            .zip(passed)
            .filter_map(|(prereq_id, ok)| (!ok).then_some(prereq_id))
            .collect())
    }

    pub async fn is_satisfied(&self, student_id: &str, course_id: &str) -> EnrollmentResult<bool> {
        Ok(self.missing(student_id, course_id).await?.is_empty())
    }
}
