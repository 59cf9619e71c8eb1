//! In-process user store
//!
//! Mirrors the PostgreSQL store closely enough to drive the HTTP layer
//! without a database: serial ids, id ordering, case-insensitive substring
//! search. There is no unique index, so only the email pre-check guards
//! duplicates.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::users::{DbError, User, UserStore};
use crate::models::{Pagination, UserDraft, UserId};

#[derive(Default)]
struct Table {
    last_id: i32,
    rows: BTreeMap<i32, User>,
}

/// In-memory user store
#[derive(Default)]
pub struct MemoryUserStore {
    table: Mutex<Table>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.table().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn matches(user: &User, search: Option<&str>) -> bool {
    match search {
        None => true,
        Some(s) => {
            let needle = s.to_lowercase();
            user.name.to_lowercase().contains(&needle) || user.email.to_lowercase().contains(&needle)
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn count(&self, search: Option<&str>) -> Result<i64, DbError> {
        let n = self.table().rows.values().filter(|u| matches(u, search)).count();
        Ok(i64::try_from(n).unwrap_or(i64::MAX))
    }

    async fn list(&self, search: Option<&str>, page: Pagination) -> Result<Vec<User>, DbError> {
        let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        Ok(self
            .table()
            .rows
            .values()
            .filter(|u| matches(u, search))
            .skip(skip)
            .take(take)
            .cloned()
            .collect())
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, DbError> {
        Ok(self.table().rows.get(&id.get()).cloned())
    }

    async fn email_taken(&self, email: &str, excluding: Option<UserId>) -> Result<bool, DbError> {
        let skip_id = excluding.map(UserId::get);
        Ok(self
            .table()
            .rows
            .values()
            .any(|u| u.email == email && Some(u.id) != skip_id))
    }

    async fn insert(&self, draft: &UserDraft) -> Result<User, DbError> {
        let mut table = self.table();
        table.last_id += 1;
        let user = User {
            id: table.last_id,
            name: draft.name().to_owned(),
            email: draft.email().to_owned(),
        };
        table.rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: UserId, draft: &UserDraft) -> Result<Option<User>, DbError> {
        let mut table = self.table();
        Ok(table.rows.get_mut(&id.get()).map(|user| {
            user.name = draft.name().to_owned();
            user.email = draft.email().to_owned();
            user.clone()
        }))
    }

    async fn delete(&self, id: UserId) -> Result<u64, DbError> {
        Ok(u64::from(self.table().rows.remove(&id.get()).is_some()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, email: &str) -> UserDraft {
        UserDraft::new(Some(name), Some(email)).unwrap()
    }

    #[tokio::test]
    async fn ids_are_serial_and_not_reused() {
        let store = MemoryUserStore::new();
        let a = store.insert(&draft("A", "a@x.io")).await.unwrap();
        let b = store.insert(&draft("B", "b@x.io")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        store.delete(UserId::parse("2").unwrap()).await.unwrap();
        let c = store.insert(&draft("C", "c@x.io")).await.unwrap();
        assert_eq!(c.id, 3);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_on_name_or_email() {
        let store = MemoryUserStore::new();
        store.insert(&draft("Alice", "alice@x.io")).await.unwrap();
        store.insert(&draft("Bob", "bob@ALICE.io")).await.unwrap();
        store.insert(&draft("Carol", "carol@x.io")).await.unwrap();

        assert_eq!(store.count(Some("aLiCe")).await.unwrap(), 2);
        assert_eq!(store.count(None).await.unwrap(), 3);

        let page = store
            .list(Some("alice"), Pagination { page: 2, limit: 1 })
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "Bob");
    }

    #[tokio::test]
    async fn email_taken_respects_exclusion() {
        let store = MemoryUserStore::new();
        let a = store.insert(&draft("A", "a@x.io")).await.unwrap();
        let id = UserId::parse(&a.id.to_string()).unwrap();

        assert!(store.email_taken("a@x.io", None).await.unwrap());
        assert!(!store.email_taken("a@x.io", Some(id)).await.unwrap());
        assert!(!store.email_taken("A@x.io", None).await.unwrap());
    }

    #[tokio::test]
    async fn update_missing_row_is_none() {
        let store = MemoryUserStore::new();
        let id = UserId::parse("7").unwrap();
        assert_eq!(store.update(id, &draft("A", "a@x.io")).await.unwrap(), None);
        assert_eq!(store.delete(id).await.unwrap(), 0);
    }
}
