use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::enrollment::{CourseGrade, Takes};
use crate::handlers::acting_student;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Deserialize)]
pub struct SectionRequest {
    pub section_id: String,
    /// Admin only: the student to act for
    #[serde(default)]
    pub student_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StudentQuery {
    #[serde(default)]
    pub student_id: Option<String>,
}

/// POST /api/registration/register - Enroll in a section
///
/// Expected Input:
/// ```json
/// { "section_id": "CS-101-1" }
/// ```
///
/// Responds 201 with the new, ungraded enrollment. Rejections carry a
/// machine code: DUPLICATE_ENROLLMENT, SCHEDULE_CONFLICT, SECTION_FULL (409),
/// PREREQUISITES_NOT_SATISFIED (422) or NOT_FOUND (404).
pub async fn register(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<SectionRequest>,
) -> ApiResult<Takes> {
    let student_id = acting_student(&user, payload.student_id)?;
    let takes = state.coordinator.register(&student_id, payload.section_id.trim()).await?;
    Ok(ApiResponse::created(takes))
}

/// DELETE /api/registration/drop - Remove an enrollment (hard delete)
pub async fn drop(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<SectionRequest>,
) -> ApiResult<Value> {
    let student_id = acting_student(&user, payload.student_id)?;
    let section_id = payload.section_id.trim();
    state.coordinator.drop_enrollment(&student_id, section_id).await?;

    Ok(ApiResponse::success(json!({
        "student_id": student_id,
        "section_id": section_id,
        "dropped": true
    })))
}

/// GET /api/registration/courses - Every section the student holds
pub async fn courses(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<StudentQuery>,
) -> ApiResult<Vec<CourseGrade>> {
    let student_id = acting_student(&user, query.student_id)?;
    let courses = state.coordinator.registered_courses(&student_id).await?;
    Ok(ApiResponse::success(courses))
}
