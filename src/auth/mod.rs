/*!
 * # Caller identity
 *
 * Authentication happens upstream of this service. The authenticating
 * proxy forwards the account name in `x-auth-user` and its role in
 * `x-auth-role`; this module turns those headers into a typed [`Caller`]
 * and guards librarian-only routes.
 */

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};
use tracing::warn;
use utoipa::ToSchema;

use crate::errors::ServiceError;

pub const AUTH_USER_HEADER: &str = "x-auth-user";
pub const AUTH_ROLE_HEADER: &str = "x-auth-role";

pub const PERMISSION_DENIED_MESSAGE: &str = "You do not have permission to access this page!";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    /// Library staff; may manage the catalog, roster and loans
    Librarian,
    Student,
}

/// The authenticated account making a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub username: String,
    pub role: Role,
}

impl Caller {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ServiceError> {
        let username = header_value(headers, AUTH_USER_HEADER)
            .ok_or_else(|| ServiceError::Unauthorized("Authentication required".to_string()))?;
        let role = header_value(headers, AUTH_ROLE_HEADER)
            .ok_or_else(|| ServiceError::Unauthorized("Authentication required".to_string()))
            .and_then(|raw| {
                Role::from_str(raw).map_err(|_| {
                    ServiceError::Unauthorized(format!("Unknown role '{}'", raw))
                })
            })?;

        Ok(Self::new(username, role))
    }

    pub fn is_librarian(&self) -> bool {
        self.role == Role::Librarian
    }

    pub fn require_librarian(&self) -> Result<(), ServiceError> {
        if self.is_librarian() {
            Ok(())
        } else {
            warn!(username = %self.username, role = %self.role, "librarian-only access denied");
            Err(ServiceError::Forbidden(PERMISSION_DENIED_MESSAGE.to_string()))
        }
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(caller) = parts.extensions.get::<Caller>() {
            return Ok(caller.clone());
        }
        let caller = Caller::from_headers(&parts.headers)?;
        parts.extensions.insert(caller.clone());
        Ok(caller)
    }
}

/// Extractor admitting only librarians
#[derive(Debug, Clone)]
pub struct Librarian(pub Caller);

#[async_trait]
impl<S> FromRequestParts<S> for Librarian
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let caller = Caller::from_request_parts(parts, state).await?;
        caller.require_librarian()?;
        Ok(Librarian(caller))
    }
}
