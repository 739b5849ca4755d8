use serde::Serialize;

use crate::{AuthError, Denial, Principal, Role};

/// What a route demands of its caller's role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "roles", rename_all = "snake_case")]
pub enum RoleRequirement {
    /// Role must dominate the given one in the hierarchy.
    AtLeast(Role),
    /// Role must equal the given one. No hierarchy.
    Exactly(Role),
    /// Role must be a member of the set. No hierarchy.
    AnyOf(Vec<Role>),
}

impl RoleRequirement {
    /// Parse a configured minimum role name.
    ///
    /// Route tables are static, so an unknown name here is a wiring bug and
    /// surfaces as `InvalidRoleConfiguration` instead of a denial.
    pub fn parse_minimum(name: &str) -> Result<Self, AuthError> {
        Ok(RoleRequirement::AtLeast(name.parse::<Role>()?))
    }

    pub fn permits(&self, role: Role) -> bool {
        match self {
            RoleRequirement::AtLeast(min) => role.dominates(*min),
            RoleRequirement::Exactly(required) => role == *required,
            RoleRequirement::AnyOf(roles) => roles.contains(&role),
        }
    }

    /// Gate a request.
    ///
    /// - No IO
    /// - No panics
    /// - Absent principal is `AuthenticationRequired`, never a denial
    pub fn check(&self, principal: Option<&Principal>) -> Result<(), AuthError> {
        let Some(principal) = principal else {
            return Err(AuthError::AuthenticationRequired);
        };

        if !principal.active {
            return Err(AuthError::UserInactive);
        }

        if self.permits(principal.role) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %principal.id,
                role = %principal.role,
                requirement = ?self,
                "role requirement not met"
            );
            Err(AuthError::AccessDenied(self.denial()))
        }
    }

    fn denial(&self) -> Denial {
        match self {
            RoleRequirement::AtLeast(role) => Denial::MinimumRole(*role),
            RoleRequirement::Exactly(role) => Denial::ExactRole(*role),
            RoleRequirement::AnyOf(roles) => Denial::AnyOf(roles.clone()),
        }
    }
}

pub fn require_role(principal: Option<&Principal>, minimum: Role) -> Result<(), AuthError> {
    RoleRequirement::AtLeast(minimum).check(principal)
}

pub fn require_exact_role(principal: Option<&Principal>, role: Role) -> Result<(), AuthError> {
    RoleRequirement::Exactly(role).check(principal)
}

pub fn require_any_of(principal: Option<&Principal>, roles: &[Role]) -> Result<(), AuthError> {
    RoleRequirement::AnyOf(roles.to_vec()).check(principal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use findoc_core::UserId;
    use proptest::prelude::*;

    fn principal(role: Role) -> Principal {
        Principal {
            id: UserId::new(),
            username: "u".to_string(),
            role,
            active: true,
        }
    }

    #[test]
    fn missing_principal_is_authentication_required() {
        assert_eq!(
            require_role(None, Role::Operator),
            Err(AuthError::AuthenticationRequired)
        );
        assert_eq!(
            require_exact_role(None, Role::SuperAdmin),
            Err(AuthError::AuthenticationRequired)
        );
        assert_eq!(
            require_any_of(None, &[Role::Admin]),
            Err(AuthError::AuthenticationRequired)
        );
    }

    #[test]
    fn minimum_role_follows_hierarchy() {
        let op = principal(Role::Operator);
        let admin = principal(Role::Admin);
        let sa = principal(Role::SuperAdmin);

        assert!(require_role(Some(&op), Role::Operator).is_ok());
        assert!(require_role(Some(&admin), Role::Operator).is_ok());
        assert!(require_role(Some(&sa), Role::Admin).is_ok());

        let err = require_role(Some(&op), Role::Admin).unwrap_err();
        assert_eq!(err, AuthError::AccessDenied(Denial::MinimumRole(Role::Admin)));
        assert_eq!(err.to_string(), "access denied. Required role: admin");
    }

    #[test]
    fn exact_role_ignores_hierarchy() {
        let sa = principal(Role::SuperAdmin);
        assert!(require_exact_role(Some(&sa), Role::SuperAdmin).is_ok());
        assert_eq!(
            require_exact_role(Some(&sa), Role::Admin),
            Err(AuthError::AccessDenied(Denial::ExactRole(Role::Admin)))
        );
    }

    #[test]
    fn any_of_is_pure_membership() {
        let sa = principal(Role::SuperAdmin);
        let admin = principal(Role::Admin);
        let roles = [Role::Operator, Role::Admin];

        assert!(require_any_of(Some(&admin), &roles).is_ok());
        let err = require_any_of(Some(&sa), &roles).unwrap_err();
        assert_eq!(err.to_string(), "access denied. Required one of: operator, admin");
    }

    #[test]
    fn inactive_principal_is_refused() {
        let mut p = principal(Role::SuperAdmin);
        p.active = false;
        assert_eq!(
            require_role(Some(&p), Role::Operator),
            Err(AuthError::UserInactive)
        );
    }

    #[test]
    fn unknown_minimum_role_is_configuration_error() {
        assert_eq!(
            RoleRequirement::parse_minimum("auditor"),
            Err(AuthError::InvalidRoleConfiguration)
        );
        assert_eq!(
            RoleRequirement::parse_minimum("admin"),
            Ok(RoleRequirement::AtLeast(Role::Admin))
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: the minimum-role gate agrees with role ordinals.
        #[test]
        fn minimum_gate_matches_ordinals(
            caller in prop::sample::select(Role::ALL.to_vec()),
            min in prop::sample::select(Role::ALL.to_vec()),
        ) {
            let p = principal(caller);
            let allowed = require_role(Some(&p), min).is_ok();
            prop_assert_eq!(allowed, caller.ordinal() >= min.ordinal());
        }

        /// Property: the exact gate admits only the named role.
        #[test]
        fn exact_gate_is_equality(
            caller in prop::sample::select(Role::ALL.to_vec()),
            required in prop::sample::select(Role::ALL.to_vec()),
        ) {
            let p = principal(caller);
            prop_assert_eq!(require_exact_role(Some(&p), required).is_ok(), caller == required);
        }
    }
}
