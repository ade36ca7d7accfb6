use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    repo::{StoreError, UserStore},
    repo_types::{NewUser, User},
};

/// Map-backed store for tests. The email check and insert happen under one
/// lock, mirroring the unique index in Postgres.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == new_user.email) {
            return Err(StoreError::Conflict);
        }
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.lock().unwrap();
        if users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(StoreError::Conflict);
        }
        match users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(())
            }
            None => Err(StoreError::Missing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            username: "ada".into(),
            email: email.into(),
            password_hash: "$argon2id$fake".into(),
        }
    }

    #[tokio::test]
    async fn create_then_find_by_email_and_id() {
        let store = MemoryUserStore::default();
        let user = store.create(new_user("ada@example.com")).await.unwrap();

        let by_email = store.find_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        let by_id = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "ada@example.com");
        assert!(store.find_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let store = MemoryUserStore::default();
        store.create(new_user("ada@example.com")).await.unwrap();
        let err = store.create(new_user("ada@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn save_updates_and_reports_missing() {
        let store = MemoryUserStore::default();
        let mut user = store.create(new_user("ada@example.com")).await.unwrap();
        user.password_hash = "$argon2id$other".into();
        store.save(&user).await.unwrap();
        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "$argon2id$other");

        user.id = Uuid::new_v4();
        assert!(matches!(store.save(&user).await, Err(StoreError::Missing)));
    }
}
