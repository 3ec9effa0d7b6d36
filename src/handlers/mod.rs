// handlers/mod.rs - 3-Tier Handler Architecture
//
// Public (no auth) → Protected (student / instructor JWT) → Elevated (admin JWT)
pub mod elevated;
pub mod protected;
pub mod public;

use crate::error::ApiError;
use crate::middleware::AuthUser;

/// Student a request acts on: the caller, or for an admin, the named student.
pub(crate) fn acting_student(user: &AuthUser, requested: Option<String>) -> Result<String, ApiError> {
    match requested {
        Some(student_id) if user.is_admin() => Ok(student_id),
        Some(student_id) if student_id != user.id => Err(ApiError::forbidden(
            "Students may only act on their own enrollments",
        )),
        _ if user.is_admin() => Err(ApiError::bad_request("student_id is required for admin requests")),
        _ => Ok(user.id.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    fn user(id: &str, role: Role) -> AuthUser {
        AuthUser { id: id.into(), role }
    }

    #[test]
    fn students_act_on_themselves() {
        let student = user("00128", Role::Student);
        assert_eq!(acting_student(&student, None).unwrap(), "00128");
        assert_eq!(acting_student(&student, Some("00128".into())).unwrap(), "00128");
        assert_eq!(acting_student(&student, Some("12345".into())).unwrap_err().status_code(), 403);
    }

    #[test]
    fn admins_must_name_a_student() {
        let admin = user("admin", Role::Admin);
        assert_eq!(acting_student(&admin, Some("12345".into())).unwrap(), "12345");
        assert_eq!(acting_student(&admin, None).unwrap_err().status_code(), 400);
    }
}
