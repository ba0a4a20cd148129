//! In-memory user store.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::user::{StoreError, UNASSIGNED_ID, User, UserStore};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    usernames: HashMap<String, i64>,
    tokens: HashMap<String, i64>,
    last_id: i64,
}

impl Tables {
    /// Check that no other record owns the username or token of `user`.
    fn check_unique(&self, user: &User) -> Result<(), StoreError> {
        let owned_by_other = |owner: Option<&i64>| {
            owner.is_some_and(|owner| *owner != user.id)
        };

        if owned_by_other(self.usernames.get(&user.username)) {
            return Err(StoreError::Conflict { field: "username" });
        }

        let token_owner = user.token.as_ref().and_then(|t| self.tokens.get(t));
        if owned_by_other(token_owner) {
            return Err(StoreError::Conflict { field: "token" });
        }

        Ok(())
    }

    fn unindex(&mut self, user: &User) {
        self.usernames.remove(&user.username);
        if let Some(token) = &user.token {
            self.tokens.remove(token);
        }
    }

    fn index(&mut self, user: &User) {
        self.usernames.insert(user.username.clone(), user.id);
        if let Some(token) = &user.token {
            self.tokens.insert(token.clone(), user.id);
        }
    }
}

/// Process-local [`UserStore`], used when no database is configured.
///
/// Lookups by identifier, username and token are indexed.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty [`MemoryStore`].
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn save(&self, mut user: User) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        tables.check_unique(&user)?;

        if user.id == UNASSIGNED_ID {
            tables.last_id += 1;
            user.id = tables.last_id;
        } else {
            let previous = tables
                .users
                .get(&user.id)
                .cloned()
                .ok_or(StoreError::NotFound(user.id))?;
            tables.unindex(&previous);
        }

        tables.index(&user);
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .usernames
            .get(username)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        *tables = Tables {
            last_id: tables.last_id,
            ..Default::default()
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::UserStatus;

    fn user(username: &str, token: Option<&str>) -> User {
        User {
            username: username.into(),
            password: "$argon2id$fake".into(),
            token: token.map(Into::into),
            status: UserStatus::Online,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_save_assigns_increasing_ids() {
        let store = MemoryStore::new();

        let first = store.save(user("alice", Some("t1"))).await.unwrap();
        let second = store.save(user("bob", Some("t2"))).await.unwrap();

        assert!(first.is_persisted());
        assert!(second.id > first.id);
        assert_eq!(
            store
                .find_all()
                .await
                .unwrap()
                .into_iter()
                .map(|u| u.username)
                .collect::<Vec<_>>(),
            vec!["alice", "bob"]
        );
    }

    #[tokio::test]
    async fn test_save_rejects_duplicates() {
        let store = MemoryStore::new();
        store.save(user("alice", Some("t1"))).await.unwrap();

        assert!(matches!(
            store.save(user("alice", Some("t2"))).await,
            Err(StoreError::Conflict { field: "username" })
        ));
        assert!(matches!(
            store.save(user("bob", Some("t1"))).await,
            Err(StoreError::Conflict { field: "token" })
        ));
        assert_eq!(store.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_reindexes() {
        let store = MemoryStore::new();
        let mut alice = store.save(user("alice", Some("t1"))).await.unwrap();

        alice.username = "alicia".into();
        alice.token = None;
        let alice = store.save(alice).await.unwrap();

        assert!(store.find_by_username("alice").await.unwrap().is_none());
        assert_eq!(
            store.find_by_username("alicia").await.unwrap(),
            Some(alice.clone())
        );

        // Released username and token can be taken again.
        let other = store.save(user("alice", Some("t1"))).await.unwrap();
        assert_ne!(other.id, alice.id);
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let store = MemoryStore::new();
        let ghost = User {
            id: 42,
            ..user("ghost", None)
        };

        assert!(matches!(
            store.save(ghost).await,
            Err(StoreError::NotFound(42))
        ));
    }

    #[tokio::test]
    async fn test_delete_all_keeps_ids_unique() {
        let store = MemoryStore::new();
        let first = store.save(user("alice", None)).await.unwrap();
        store.delete_all().await.unwrap();

        assert!(store.find_all().await.unwrap().is_empty());
        assert!(store.find_by_id(first.id).await.unwrap().is_none());

        let second = store.save(user("alice", None)).await.unwrap();
        assert_ne!(first.id, second.id);
    }
}
