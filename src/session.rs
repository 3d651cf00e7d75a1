//! Request-scoped session context.
//!
//! A [`SessionContext`] is built once per request by the authentication middleware and
//! handed explicitly to every repository, workflow and service call. It decides tenant
//! scoping: authenticated non-admin users are confined to their own company.

use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::{company, user, user::UserRole};

/// Identity of the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: i32,
    pub external_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub company_id: Option<i32>,
}

impl From<&user::Model> for SessionUser {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id,
            external_id: user.external_id,
            email: user.email.clone(),
            role: user.role,
            company_id: user.company_id,
        }
    }
}

/// Company the session user belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCompany {
    pub id: i32,
    pub external_id: Uuid,
    pub name: String,
}

impl From<&company::Model> for SessionCompany {
    fn from(company: &company::Model) -> Self {
        Self {
            id: company.id,
            external_id: company.external_id,
            name: company.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    user: Option<SessionUser>,
    company: Option<SessionCompany>,
}

impl SessionContext {
    /// Context without identity, used for login and internal lookups.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Builds the context for an authenticated user.
    ///
    /// Fails with `USER_NOT_AUTHORIZED` when a non-admin has no company, since such a
    /// session could not be tenant-scoped.
    pub fn authenticated(
        user: SessionUser,
        company: Option<SessionCompany>,
    ) -> Result<Self, RepositoryError> {
        if user.role != UserRole::Admin && user.company_id.is_none() {
            return Err(RepositoryError::unauthorized());
        }
        Ok(Self {
            user: Some(user),
            company,
        })
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn company(&self) -> Option<&SessionCompany> {
        self.company.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user
            .as_ref()
            .is_some_and(|user| user.role == UserRole::Admin)
    }

    /// Tenant every scoped query is confined to, or `None` when unrestricted.
    pub fn tenant_id(&self) -> Option<i32> {
        match &self.user {
            Some(user) if user.role != UserRole::Admin => user.company_id,
            _ => None,
        }
    }

    pub fn require_user(&self) -> Result<&SessionUser, RepositoryError> {
        self.user.as_ref().ok_or_else(RepositoryError::unauthorized)
    }

    pub fn require_admin(&self) -> Result<&SessionUser, RepositoryError> {
        self.require_any_role(&[UserRole::Admin])
    }

    pub fn require_any_role(&self, roles: &[UserRole]) -> Result<&SessionUser, RepositoryError> {
        let user = self.require_user()?;
        if roles.contains(&user.role) {
            Ok(user)
        } else {
            Err(RepositoryError::unauthorized())
        }
    }
}
