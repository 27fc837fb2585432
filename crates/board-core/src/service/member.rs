//! Member registration and lookup.

use std::sync::Arc;

use crate::domain::{Member, MemberId, NewMember};
use crate::error::{DomainError, RepoError};
use crate::ports::MemberRepository;

pub struct MemberService {
    members: Arc<dyn MemberRepository>,
}

impl MemberService {
    pub fn new(members: Arc<dyn MemberRepository>) -> Self {
        Self { members }
    }

    /// Register a new member. Emails are unique.
    pub async fn register(&self, input: NewMember) -> Result<Member, DomainError> {
        if input.email.trim().is_empty() || !input.email.contains('@') {
            return Err(DomainError::InvalidInput("invalid email address".to_string()));
        }
        if input.username.trim().is_empty() {
            return Err(DomainError::InvalidInput("username must not be empty".to_string()));
        }

        if self.members.find_by_email(&input.email).await?.is_some() {
            return Err(DomainError::Conflict("email already registered".to_string()));
        }

        // The unique index still catches a concurrent registration.
        let member = self.members.create(input).await.map_err(|e| match e {
            RepoError::Constraint(_) => {
                DomainError::Conflict("email already registered".to_string())
            }
            other => other.into(),
        })?;

        tracing::info!(member_id = member.id, "Member registered");
        Ok(member)
    }

    pub async fn get(&self, id: MemberId) -> Result<Member, DomainError> {
        self.members
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("member", id))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Member, DomainError> {
        self.members
            .find_by_email(email)
            .await?
            .ok_or_else(|| DomainError::not_found("member", email))
    }
}
