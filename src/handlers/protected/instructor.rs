use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::enrollment::{RosterEntry, Section};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Deserialize)]
pub struct GradeRequest {
    pub student_id: String,
    pub section_id: String,
    pub grade: String,
}

/// PUT /api/instructors/grade - Record a grade
///
/// The instructor must teach the section (403 NOT_TEACHING_SECTION otherwise);
/// the grade must be one of A, A-, B+, B, B-, C+, C, C-, D+, D, F
/// (422 INVALID_GRADE). Admin tokens skip the teaching check.
pub async fn grade(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<GradeRequest>,
) -> ApiResult<Value> {
    let student_id = payload.student_id.trim();
    let section_id = payload.section_id.trim();

    if user.is_admin() {
        state.coordinator.update_grade(student_id, section_id, &payload.grade).await?;
    } else {
        state
            .coordinator
            .assign_grade(&user.id, student_id, section_id, &payload.grade)
            .await?;
    }

    Ok(ApiResponse::success(json!({
        "student_id": student_id,
        "section_id": section_id,
        "grade": payload.grade.trim()
    })))
}

#[derive(Debug, Default, Deserialize)]
pub struct SectionsQuery {
    /// Admin only: the instructor to list for
    #[serde(default)]
    pub instructor_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RosterQuery {
    pub section_id: Option<String>,
}

/// GET /api/instructors/sections - Sections the caller teaches
pub async fn sections(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<SectionsQuery>,
) -> ApiResult<Vec<Section>> {
    let instructor_id = match (user.is_admin(), query.instructor_id) {
        (true, Some(id)) => id,
        (true, None) => return Err(ApiError::bad_request("instructor_id is required for admin requests")),
        (false, _) => user.id.clone(),
    };

    let sections = state.coordinator.teaching_sections(&instructor_id).await?;
    Ok(ApiResponse::success(sections))
}

/// GET /api/instructors/sections/students?section_id= - Who to grade
///
/// 403 NOT_TEACHING_SECTION unless the caller teaches the section; admin
/// tokens see any roster.
pub async fn section_students(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<RosterQuery>,
) -> ApiResult<Vec<RosterEntry>> {
    let section_id = query
        .section_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("section_id is required"))?;

    let roster = if user.is_admin() {
        state.coordinator.roster(section_id).await?
    } else {
        state.coordinator.section_roster(&user.id, section_id).await?
    };
    Ok(ApiResponse::success(roster))
}
