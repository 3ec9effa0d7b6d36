use axum::{
    extract::{Query, State},
    Extension,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::enrollment::{CourseGrade, Term, Transcript};
use crate::error::ApiError;
use crate::handlers::acting_student;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

use super::registration::StudentQuery;

#[derive(Debug, Default, Deserialize)]
pub struct CurrentCoursesQuery {
    #[serde(default)]
    pub semester: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub student_id: Option<String>,
}

/// GET /api/students/transcript
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "data": {
///     "student": { "id": "00128", "name": "Zhang", "dept_name": "Comp. Sci.", "tot_cred": "7" },
///     "courses": [
///       { "course_id": "CS-101", "section_id": "CS-101-1-F23", "credits": "4", "grade": "A", "grade_point": "4.0", ... },
///       { "course_id": "HIS-351", "section_id": "HIS-351-1-F23", "credits": "3", "grade": "B", "grade_point": "3.0", ... }
///     ],
///     "total_credits": "7",
///     "credits_attempted": "7",
///     "gpa": "3.57"
///   }
/// }
/// ```
pub async fn transcript(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<StudentQuery>,
) -> ApiResult<Transcript> {
    let student_id = acting_student(&user, query.student_id)?;
    let transcript = state.coordinator.transcript(&student_id).await?;
    Ok(ApiResponse::success(transcript))
}

/// GET /api/students/courses?semester=&year= - One term's courses, or the
/// in-progress ones when no term is given
pub async fn current_courses(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<CurrentCoursesQuery>,
) -> ApiResult<Vec<CourseGrade>> {
    let student_id = acting_student(&user, query.student_id)?;

    let term = match (query.semester, query.year) {
        (Some(semester), Some(year)) => Some(Term { semester, year }),
        (None, None) => None,
        _ => return Err(ApiError::bad_request("semester and year must be given together")),
    };

    let courses = state.coordinator.current_courses(&student_id, term.as_ref()).await?;
    Ok(ApiResponse::success(courses))
}
