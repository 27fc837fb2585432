//! In-memory member repository - used when no database is configured and in tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use board_core::domain::{Member, MemberId, NewMember};
use board_core::error::RepoError;
use board_core::ports::{BaseRepository, MemberRepository};

struct MemberTable {
    rows: BTreeMap<MemberId, Member>,
    next_id: MemberId,
}

/// Member store backed by a `BTreeMap` under an async `RwLock`.
///
/// Note: Data is lost on process restart.
pub struct InMemoryMemberRepository {
    table: RwLock<MemberTable>,
}

impl InMemoryMemberRepository {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(MemberTable {
                rows: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Seed a member with a fixed id. Later generated ids never collide with it.
    pub async fn insert_with_id(&self, id: MemberId, member: NewMember) -> Member {
        let mut table = self.table.write().await;
        let now = Utc::now();
        let member = Member {
            id,
            email: member.email,
            username: member.username,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(id, member.clone());
        table.next_id = table.next_id.max(id + 1);
        member
    }
}

impl Default for InMemoryMemberRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRepository<Member, MemberId> for InMemoryMemberRepository {
    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>, RepoError> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).cloned())
    }
}

#[async_trait]
impl MemberRepository for InMemoryMemberRepository {
    async fn create(&self, member: NewMember) -> Result<Member, RepoError> {
        let mut table = self.table.write().await;

        if table.rows.values().any(|m| m.email == member.email) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }

        let id = table.next_id;
        table.next_id += 1;

        let now = Utc::now();
        let member = Member {
            id,
            email: member.email,
            username: member.username,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(id, member.clone());
        Ok(member)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Member>, RepoError> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|m| m.email == email).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let repo = InMemoryMemberRepository::new();
        let first = repo.create(NewMember::new("a@example.com", "a")).await.unwrap();
        let second = repo.create(NewMember::new("b@example.com", "b")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_constraint_violation() {
        let repo = InMemoryMemberRepository::new();
        repo.create(NewMember::new("a@example.com", "a")).await.unwrap();

        let result = repo.create(NewMember::new("a@example.com", "other")).await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_seeded_id_is_not_reused() {
        let repo = InMemoryMemberRepository::new();
        repo.insert_with_id(42, NewMember::new("x@example.com", "x")).await;
        let next = repo.create(NewMember::new("y@example.com", "y")).await.unwrap();
        assert_eq!(next.id, 43);
        assert!(repo.find_by_email("x@example.com").await.unwrap().is_some());
    }
}
