use std::fmt;
use std::sync::Arc;

use tracing::{error, info};

use super::capacity::CapacityGuard;
use super::directory::Directory;
use super::error::{EnrollmentError, EnrollmentResult, Entity};
use super::ledger::EnrollmentLedger;
use super::locks::KeyedLocks;
use super::model::{
    most_recent_first, CourseGrade, Grade, NewEnrollment, RosterEntry, Section, SectionSeats, Takes, Term,
    Transcript,
};
use super::prerequisites::PrerequisiteChecker;
use super::schedule::ScheduleConflictDetector;

/// Last guard a registration attempt passed. A rejection reports the stage it
/// was rejected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStage {
    Start,
    StudentExists,
    SectionExists,
    NotDuplicate,
    PrereqsSatisfied,
    NoScheduleConflict,
    HasCapacity,
    Committed,
}

impl fmt::Display for RegistrationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegistrationStage::Start => "start",
            RegistrationStage::StudentExists => "student_exists",
            RegistrationStage::SectionExists => "section_exists",
            RegistrationStage::NotDuplicate => "not_duplicate",
            RegistrationStage::PrereqsSatisfied => "prereqs_satisfied",
            RegistrationStage::NoScheduleConflict => "no_schedule_conflict",
            RegistrationStage::HasCapacity => "has_capacity",
            RegistrationStage::Committed => "committed",
        };
        f.write_str(name)
    }
}

/// Entry point for every enrollment operation.
///
/// Register and Drop run under the student's lock and then the section's lock,
/// always in that order, so the check-then-insert sequence cannot interleave
/// with another writer on either key inside this process. The ledger's
/// (student, section) uniqueness covers writers in other processes.
pub struct EnrollmentCoordinator {
    directory: Arc<dyn Directory>,
    ledger: Arc<dyn EnrollmentLedger>,
    prerequisites: PrerequisiteChecker,
    schedule: ScheduleConflictDetector,
    capacity: CapacityGuard,
    locks: KeyedLocks,
}

impl EnrollmentCoordinator {
    pub fn new(directory: Arc<dyn Directory>, ledger: Arc<dyn EnrollmentLedger>) -> Self {
        Self {
            prerequisites: PrerequisiteChecker::new(directory.clone(), ledger.clone()),
            schedule: ScheduleConflictDetector::new(directory.clone(), ledger.clone()),
            capacity: CapacityGuard::new(directory.clone(), ledger.clone()),
            directory,
            ledger,
            locks: KeyedLocks::new(),
        }
    }

    pub fn directory(&self) -> &Arc<dyn Directory> {
        &self.directory
    }

    pub fn prerequisites(&self) -> &PrerequisiteChecker {
        &self.prerequisites
    }

    pub fn schedule(&self) -> &ScheduleConflictDetector {
        &self.schedule
    }

    pub fn capacity(&self) -> &CapacityGuard {
        &self.capacity
    }

    pub async fn register(&self, student_id: &str, section_id: &str) -> EnrollmentResult<Takes> {
        let mut stage = RegistrationStage::Start;
        let result = self.run_registration(student_id, section_id, &mut stage).await;

        match &result {
            Ok(_) => info!(student_id, section_id, %stage, "registration committed"),
            Err(err) if err.is_retryable() => {
                error!(student_id, section_id, %stage, error = %err, "registration failed")
            }
            Err(err) => {
                info!(student_id, section_id, %stage, reason = err.code(), "registration rejected")
            }
        }

        result
    }

    async fn run_registration(
        &self,
        student_id: &str,
        section_id: &str,
        stage: &mut RegistrationStage,
    ) -> EnrollmentResult<Takes> {
        self.directory.get_student(student_id).await?;
        *stage = RegistrationStage::StudentExists;

        let section = self.directory.get_section(section_id).await?;
        *stage = RegistrationStage::SectionExists;

        let _student_guard = self.locks.lock(&student_key(student_id)).await;
        let _section_guard = self.locks.lock(&section_key(section_id)).await;

        if self.ledger.find(student_id, section_id).await?.is_some() {
            return Err(EnrollmentError::DuplicateEnrollment {
                student_id: student_id.to_string(),
                section_id: section_id.to_string(),
            });
        }
        *stage = RegistrationStage::NotDuplicate;

        let missing = self.prerequisites.missing(student_id, &section.course_id).await?;
        if !missing.is_empty() {
            return Err(EnrollmentError::PrerequisitesNotSatisfied {
                course_id: section.course_id.clone(),
                missing,
            });
        }
        *stage = RegistrationStage::PrereqsSatisfied;

        if let Some(conflicting_section_id) = self.schedule.find_conflict(student_id, &section).await? {
            return Err(EnrollmentError::ScheduleConflict {
                section_id: section_id.to_string(),
                conflicting_section_id,
            });
        }
        *stage = RegistrationStage::NoScheduleConflict;

        let seats = self.capacity.seats(&section).await?;
        if seats.enrolled >= seats.capacity {
            return Err(EnrollmentError::SectionFull {
                section_id: section_id.to_string(),
                capacity: seats.capacity,
            });
        }
        *stage = RegistrationStage::HasCapacity;

        let takes = self
            .ledger
            .create(NewEnrollment::for_section(student_id, &section))
            .await?;
        *stage = RegistrationStage::Committed;

        Ok(takes)
    }

    pub async fn drop_enrollment(&self, student_id: &str, section_id: &str) -> EnrollmentResult<()> {
        let _student_guard = self.locks.lock(&student_key(student_id)).await;
        let _section_guard = self.locks.lock(&section_key(section_id)).await;

        if self.ledger.find(student_id, section_id).await?.is_none() {
            info!(student_id, section_id, "drop rejected: no enrollment");
            return Err(EnrollmentError::not_found(
                Entity::Enrollment,
                format!("{}/{}", student_id, section_id),
            ));
        }

        self.ledger.delete(student_id, section_id).await?;
        info!(student_id, section_id, "enrollment dropped");
        Ok(())
    }

    pub async fn transcript(&self, student_id: &str) -> EnrollmentResult<Transcript> {
        let student = self.directory.get_student(student_id).await?;
        self.ledger.get_transcript(&student).await
    }

    /// Rows for one term, or the in-progress rows when no term is given.
    pub async fn current_courses(&self, student_id: &str, term: Option<&Term>) -> EnrollmentResult<Vec<CourseGrade>> {
        self.directory.get_student(student_id).await?;

        let mut entries = self.ledger.transcript_entries(student_id).await?;
        entries.retain(|entry| match term {
            Some(term) => term.contains(&entry.semester, entry.year),
            None => entry.grade.as_deref().map_or(true, str::is_empty),
        });
        entries.sort_by(most_recent_first);

        Ok(entries.into_iter().map(CourseGrade::from).collect())
    }

    /// Every active row, graded or not
    pub async fn registered_courses(&self, student_id: &str) -> EnrollmentResult<Vec<CourseGrade>> {
        self.directory.get_student(student_id).await?;

        let mut entries = self.ledger.transcript_entries(student_id).await?;
        entries.sort_by(most_recent_first);
        Ok(entries.into_iter().map(CourseGrade::from).collect())
    }

    /// Grades an enrollment on behalf of an instructor, who must teach the section.
    pub async fn assign_grade(
        &self,
        instructor_id: &str,
        student_id: &str,
        section_id: &str,
        grade: &str,
    ) -> EnrollmentResult<()> {
        if !self.directory.teaches(instructor_id, section_id).await? {
            info!(instructor_id, section_id, "grade rejected: not teaching section");
            return Err(EnrollmentError::NotTeachingSection {
                instructor_id: instructor_id.to_string(),
                section_id: section_id.to_string(),
            });
        }

        self.update_grade(student_id, section_id, grade).await
    }

    /// Grades an enrollment without a teaching check. Never touches the
    /// registration path.
    pub async fn update_grade(&self, student_id: &str, section_id: &str, grade: &str) -> EnrollmentResult<()> {
        if self.ledger.find(student_id, section_id).await?.is_none() {
            return Err(EnrollmentError::not_found(
                Entity::Enrollment,
                format!("{}/{}", student_id, section_id),
            ));
        }

        let grade: Grade = grade.trim().parse()?;
        self.ledger.update_grade(student_id, section_id, grade).await?;
        info!(student_id, section_id, %grade, "grade recorded");
        Ok(())
    }

    pub async fn section_seats(&self, section_id: &str) -> EnrollmentResult<SectionSeats> {
        let section = self.directory.get_section(section_id).await?;
        self.capacity.seats(&section).await
    }

    pub async fn teaching_sections(&self, instructor_id: &str) -> EnrollmentResult<Vec<Section>> {
        self.directory.teaching_sections(instructor_id).await
    }

    /// Roster of a section for an instructor, who must teach it.
    pub async fn section_roster(&self, instructor_id: &str, section_id: &str) -> EnrollmentResult<Vec<RosterEntry>> {
        if !self.directory.teaches(instructor_id, section_id).await? {
            info!(instructor_id, section_id, "roster rejected: not teaching section");
            return Err(EnrollmentError::NotTeachingSection {
                instructor_id: instructor_id.to_string(),
                section_id: section_id.to_string(),
            });
        }

        self.roster(section_id).await
    }

    /// Roster without a teaching check
    pub async fn roster(&self, section_id: &str) -> EnrollmentResult<Vec<RosterEntry>> {
        self.directory.get_section(section_id).await?;
        self.ledger.section_roster(section_id).await
    }
}

fn student_key(student_id: &str) -> String {
    format!("student:{}", student_id)
}

fn section_key(section_id: &str) -> String {
    format!("section:{}", section_id)
}
