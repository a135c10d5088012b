//! Authorization gate.

use crate::error::{ServiceError, ServiceResult};
use crate::model::Role;
use hemolink_identity::CallerIdentity;

/// Proof that a caller passed the gate for some role.
///
/// Only [`authorize`] constructs a `Grant`, so orchestrator operations that
/// take one cannot be reached by an unauthorized caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    uid: String,
    role: Role,
}

impl Grant {
    /// Uid of the authorized caller.
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Role the caller holds.
    pub fn role(&self) -> Role {
        self.role
    }
}

/// Checks the caller's stored role against `required`. Pure; no I/O.
///
/// A missing role is treated exactly like an insufficient one.
///
/// # Errors
///
/// Returns [`ServiceError::Forbidden`] if the role does not satisfy `required`.
pub fn authorize(
    caller: &CallerIdentity,
    role: Option<Role>,
    required: Role,
) -> ServiceResult<Grant> {
    match role {
        Some(role) if role.satisfies(required) => Ok(Grant {
            uid: caller.uid.clone(),
            role,
        }),
        Some(role) => Err(ServiceError::Forbidden(format!(
            "role {role} may not perform this action; {required} required"
        ))),
        None => Err(ServiceError::Forbidden(format!(
            "no role assigned; {required} required"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hemolink_identity::Claims;
    use serde_json::json;

    fn caller(uid: &str) -> CallerIdentity {
        CallerIdentity {
            uid: uid.into(),
            claims: Claims::new(),
        }
    }

    #[test]
    fn staff_passes_staff_gate() {
        let grant = authorize(&caller("nurse"), Some(Role::MedicalStaff), Role::MedicalStaff)
            .unwrap();
        assert_eq!(grant.uid(), "nurse");
        assert_eq!(grant.role(), Role::MedicalStaff);
    }

    #[test]
    fn regular_and_missing_are_denied() {
        for role in [Some(Role::RegularUser), None] {
            let err = authorize(&caller("donor"), role, Role::MedicalStaff).unwrap_err();
            assert!(matches!(err, ServiceError::Forbidden(_)));
        }
    }

    #[test]
    fn claims_do_not_grant() {
        let mut claims = Claims::new();
        claims.insert("role".into(), json!("medical_staff"));
        let caller = CallerIdentity {
            uid: "donor".into(),
            claims,
        };
        assert!(authorize(&caller, Some(Role::RegularUser), Role::MedicalStaff).is_err());
    }
}
