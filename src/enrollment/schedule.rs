use std::sync::Arc;

use super::directory::Directory;
use super::error::EnrollmentResult;
use super::ledger::EnrollmentLedger;
use super::model::Section;

/// Detects meeting-time overlap between a candidate section and the
/// sections a student already holds.
#[derive(Clone)]
pub struct ScheduleConflictDetector {
    directory: Arc<dyn Directory>,
    ledger: Arc<dyn EnrollmentLedger>,
}

impl ScheduleConflictDetector {
    pub fn new(directory: Arc<dyn Directory>, ledger: Arc<dyn EnrollmentLedger>) -> Self {
        Self { directory, ledger }
    }

    /// Id of the first enrolled section whose meeting time overlaps the
    /// candidate's. The candidate itself is skipped so re-checks after a
    /// successful registration stay clean. Sections without a time slot never
    /// conflict.
    pub async fn find_conflict(&self, student_id: &str, candidate: &Section) -> EnrollmentResult<Option<String>> {
        let Some(slot_id) = candidate.time_slot_id.as_deref() else {
            return Ok(None);
        };
        let candidate_slot = self.directory.get_time_slot(slot_id).await?;

        let active = self.ledger.active_sections(student_id).await?;
        for section_id in active.iter().filter(|id| **id != candidate.id) {
            let section = self.directory.get_section(section_id).await?;
            let Some(other_slot_id) = section.time_slot_id.as_deref() else {
                continue;
            };

            let conflicts = if other_slot_id == candidate_slot.id {
                !candidate_slot.days.is_empty()
            } else {
                let other_slot = self.directory.get_time_slot(other_slot_id).await?;
                candidate_slot.conflicts_with(&other_slot)
            };

            if conflicts {
                return Ok(Some(section.id));
            }
        }

        Ok(None)
    }

    pub async fn has_conflict(&self, student_id: &str, candidate_section_id: &str) -> EnrollmentResult<bool> {
        let candidate = self.directory.get_section(candidate_section_id).await?;
        Ok(self.find_conflict(student_id, &candidate).await?.is_some())
    }
}
