use std::sync::Arc;

use super::directory::Directory;
use super::error::EnrollmentResult;
use super::ledger::EnrollmentLedger;
use super::model::{Section, SectionSeats};

/// Compares a section's active rows with its classroom's capacity.
#[derive(Clone)]
pub struct CapacityGuard {
    directory: Arc<dyn Directory>,
    ledger: Arc<dyn EnrollmentLedger>,
}

impl CapacityGuard {
    pub fn new(directory: Arc<dyn Directory>, ledger: Arc<dyn EnrollmentLedger>) -> Self {
        Self { directory, ledger }
    }

    pub async fn seats(&self, section: &Section) -> EnrollmentResult<SectionSeats> {
        let capacity = self
            .directory
            .get_classroom_capacity(&section.building, &section.room_number)
            .await?;
        let enrolled = self.ledger.count_active(&section.id).await?;

        Ok(SectionSeats {
            section_id: section.id.clone(),
            enrolled,
            capacity,
            available: (capacity - enrolled).max(0),
        })
    }

    /// Strictly below capacity; a section at capacity is full.
    pub async fn has_room(&self, section_id: &str) -> EnrollmentResult<bool> {
        let section = self.directory.get_section(section_id).await?;
        let seats = self.seats(&section).await?;
        Ok(seats.enrolled < seats.capacity)
    }
}
