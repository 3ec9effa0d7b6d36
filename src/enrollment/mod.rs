//! Registration, drop, grading and transcript rules over pluggable storage.

pub mod capacity;
pub mod coordinator;
pub mod directory;
pub mod error;
pub mod ledger;
pub mod locks;
pub mod memory;
pub mod model;
pub mod prerequisites;
pub mod schedule;

pub use capacity::CapacityGuard;
pub use coordinator::{EnrollmentCoordinator, RegistrationStage};
pub use directory::Directory;
pub use error::{EnrollmentError, EnrollmentResult, Entity};
pub use ledger::EnrollmentLedger;
pub use locks::KeyedLocks;
pub use memory::{MemoryDirectory, MemoryLedger};
pub use model::{
    Classroom, Course, CourseGrade, Department, Grade, Instructor, NewEnrollment, RosterEntry, Section, SectionSeats,
    Student, Takes, Term, TimeSlot, Transcript, TranscriptEntry, Weekdays,
};
pub use prerequisites::PrerequisiteChecker;
pub use schedule::ScheduleConflictDetector;
