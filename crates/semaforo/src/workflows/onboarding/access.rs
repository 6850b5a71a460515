use super::domain::{CustomerRecord, OnboardingError};
use serde::Serialize;
use std::fmt;

/// Which call centers an operator may see and insert into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "call_center_id")]
pub enum AccessScope {
    CallCenter(String),
    AllAccess,
}

/// One entry of the fixed credential set.
#[derive(Clone)]
pub struct OperatorCredential {
    username: String,
    secret: String,
    scope: AccessScope,
}

impl OperatorCredential {
    pub fn new(username: &str, secret: &str, scope: AccessScope) -> Self {
        Self {
            username: username.to_string(),
            secret: secret.to_string(),
            scope,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn scope(&self) -> &AccessScope {
        &self.scope
    }
}

impl fmt::Debug for OperatorCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorCredential")
            .field("username", &self.username)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("invalid operator credentials")]
    InvalidCredentials,
}

/// Authenticated identity carried through a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorContext {
    pub operator: String,
    pub scope: AccessScope,
}

impl OperatorContext {
    pub fn new(operator: impl Into<String>, scope: AccessScope) -> Self {
        Self {
            operator: operator.into(),
            scope,
        }
    }

    /// Context for local administrative tooling.
    pub fn administrator(operator: impl Into<String>) -> Self {
        Self::new(operator, AccessScope::AllAccess)
    }

    pub fn can_view(&self, record: &CustomerRecord) -> bool {
        match &self.scope {
            AccessScope::AllAccess => true,
            AccessScope::CallCenter(own) => record.call_center_id == *own,
        }
    }

    /// Call center a new block is filed under.
    ///
    /// Scoped operators always insert into their own call center; only administrators pick one.
    pub fn resolve_call_center(&self, requested: Option<&str>) -> Result<String, OnboardingError> {
        let requested = requested.map(str::trim).filter(|value| !value.is_empty());
        match (&self.scope, requested) {
            (AccessScope::CallCenter(own), None) => Ok(own.clone()),
            (AccessScope::CallCenter(own), Some(value)) if value == own => Ok(own.clone()),
            (AccessScope::CallCenter(_), Some(value)) => {
                Err(OnboardingError::OutOfScope(value.to_string()))
            }
            (AccessScope::AllAccess, Some(value)) => Ok(value.to_string()),
            (AccessScope::AllAccess, None) => Err(OnboardingError::MissingField("call_center_id")),
        }
    }
}

/// The fixed set of operators allowed to use the board.
#[derive(Debug, Clone, Default)]
pub struct OperatorDirectory {
    operators: Vec<OperatorCredential>,
}

impl OperatorDirectory {
    pub fn new(operators: Vec<OperatorCredential>) -> Self {
        Self { operators }
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    pub fn authenticate(&self, username: &str, secret: &str) -> Result<OperatorContext, AccessError> {
        self.operators
            .iter()
            .find(|operator| operator.username == username.trim() && operator.secret == secret)
            .map(|operator| OperatorContext::new(operator.username.clone(), operator.scope.clone()))
            .ok_or(AccessError::InvalidCredentials)
    }
}
