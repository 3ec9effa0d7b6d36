use axum::extract::{Path, State};

use crate::app::AppState;
use crate::enrollment::{SectionSeats, Transcript};
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/admin/students/:id/transcript
pub async fn student_transcript(State(state): State<AppState>, Path(student_id): Path<String>) -> ApiResult<Transcript> {
    let transcript = state.coordinator.transcript(&student_id).await?;
    Ok(ApiResponse::success(transcript))
}

/// GET /api/admin/sections/:id/seats
pub async fn section_seats(State(state): State<AppState>, Path(section_id): Path<String>) -> ApiResult<SectionSeats> {
    let seats = state.coordinator.section_seats(&section_id).await?;
    Ok(ApiResponse::success(seats))
}
