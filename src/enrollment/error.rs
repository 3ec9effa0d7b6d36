use std::fmt;

use thiserror::Error;

/// Kind of record a lookup failed to find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Student,
    Instructor,
    Course,
    Section,
    Classroom,
    TimeSlot,
    Enrollment,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Student => "student",
            Entity::Instructor => "instructor",
            Entity::Course => "course",
            Entity::Section => "section",
            Entity::Classroom => "classroom",
            Entity::TimeSlot => "time slot",
            Entity::Enrollment => "enrollment",
        };
        f.write_str(name)
    }
}

/// Errors produced by the enrollment core and the storage behind it.
///
/// Every business-rule rejection has its own variant so the HTTP boundary can
/// pick a status code without looking at message text.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnrollmentError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: Entity, id: String },

    #[error("student '{student_id}' is already registered for section '{section_id}'")]
    DuplicateEnrollment { student_id: String, section_id: String },

    #[error("prerequisites for course '{course_id}' not satisfied (missing: {})", missing.join(", "))]
    PrerequisitesNotSatisfied { course_id: String, missing: Vec<String> },

    #[error("section '{section_id}' conflicts with enrolled section '{conflicting_section_id}'")]
    ScheduleConflict { section_id: String, conflicting_section_id: String },

    #[error("section '{section_id}' is full (capacity {capacity})")]
    SectionFull { section_id: String, capacity: i64 },

    #[error("invalid grade '{0}'")]
    InvalidGrade(String),

    #[error("instructor '{instructor_id}' does not teach section '{section_id}'")]
    NotTeachingSection { instructor_id: String, section_id: String },

    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl EnrollmentError {
    pub fn not_found(entity: Entity, id: impl Into<String>) -> Self {
        EnrollmentError::NotFound { entity, id: id.into() }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        EnrollmentError::Infrastructure(message.into())
    }

    /// Only infrastructure failures may succeed on a retry; business-rule
    /// rejections are a deterministic function of the current state.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EnrollmentError::Infrastructure(_))
    }

    /// Stable machine-readable code for clients
    pub fn code(&self) -> &'static str {
        match self {
            EnrollmentError::NotFound { .. } => "NOT_FOUND",
            EnrollmentError::DuplicateEnrollment { .. } => "DUPLICATE_ENROLLMENT",
            EnrollmentError::PrerequisitesNotSatisfied { .. } => "PREREQUISITES_NOT_SATISFIED",
            EnrollmentError::ScheduleConflict { .. } => "SCHEDULE_CONFLICT",
            EnrollmentError::SectionFull { .. } => "SECTION_FULL",
            EnrollmentError::InvalidGrade(_) => "INVALID_GRADE",
            EnrollmentError::NotTeachingSection { .. } => "NOT_TEACHING_SECTION",
            EnrollmentError::Infrastructure(_) => "INFRASTRUCTURE_ERROR",
        }
    }
}

pub type EnrollmentResult<T> = Result<T, EnrollmentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_infrastructure_is_retryable() {
        assert!(EnrollmentError::infrastructure("pool timed out").is_retryable());
        assert!(!EnrollmentError::not_found(Entity::Section, "CS-101-1").is_retryable());
        assert!(!EnrollmentError::SectionFull { section_id: "S1".into(), capacity: 3 }.is_retryable());
    }

    #[test]
    fn messages_name_the_missing_prerequisites() {
        let err = EnrollmentError::PrerequisitesNotSatisfied {
            course_id: "CS-347".into(),
            missing: vec!["CS-101".into(), "CS-190".into()],
        };
        assert_eq!(
            err.to_string(),
            "prerequisites for course 'CS-347' not satisfied (missing: CS-101, CS-190)"
        );
        assert_eq!(err.code(), "PREREQUISITES_NOT_SATISFIED");
    }
}
