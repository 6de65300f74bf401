use std::collections::HashMap;

use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Child, DirectoryError, Parent, Psychologist};

#[derive(Default)]
struct DirectoryInner {
    psychologists: HashMap<Uuid, Psychologist>,
    parents: HashMap<Uuid, Parent>,
    children: HashMap<Uuid, Child>,
}

/// Registry of the people the scheduling core needs to know about. User
/// management proper (accounts, credentials, profile CRUD) lives elsewhere;
/// this cell only answers the lookups the booking path depends on:
/// guardianship and psychologist identity.
#[derive(Default)]
pub struct FamilyDirectory {
    inner: RwLock<DirectoryInner>,
}

impl FamilyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register_psychologist(&self, full_name: &str, email: &str) -> Psychologist {
        let psychologist = Psychologist {
            id: Uuid::new_v4(),
            full_name: full_name.to_string(),
            email: email.to_string(),
            is_active: true,
        };

        let mut inner = self.inner.write().await;
        inner.psychologists.insert(psychologist.id, psychologist.clone());
        debug!("Registered psychologist {}", psychologist.id);
        psychologist
    }

    pub async fn register_parent(&self, full_name: &str, email: &str) -> Parent {
        let parent = Parent {
            id: Uuid::new_v4(),
            full_name: full_name.to_string(),
            email: email.to_string(),
        };

        let mut inner = self.inner.write().await;
        inner.parents.insert(parent.id, parent.clone());
        debug!("Registered parent {}", parent.id);
        parent
    }

    pub async fn register_child(
        &self,
        parent_id: Uuid,
        full_name: &str,
        birth_date: NaiveDate,
    ) -> Result<Child, DirectoryError> {
        let mut inner = self.inner.write().await;

        if !inner.parents.contains_key(&parent_id) {
            return Err(DirectoryError::ParentNotFound(parent_id));
        }

        let child = Child {
            id: Uuid::new_v4(),
            parent_id,
            full_name: full_name.to_string(),
            birth_date,
        };
        inner.children.insert(child.id, child.clone());
        debug!("Registered child {} under parent {}", child.id, parent_id);
        Ok(child)
    }

    pub async fn psychologist(&self, id: Uuid) -> Option<Psychologist> {
        self.inner.read().await.psychologists.get(&id).cloned()
    }

    pub async fn psychologist_name(&self, id: Uuid) -> Option<String> {
        self.inner
            .read()
            .await
            .psychologists
            .get(&id)
            .map(|p| p.full_name.clone())
    }

    pub async fn child(&self, id: Uuid) -> Option<Child> {
        self.inner.read().await.children.get(&id).cloned()
    }

    /// True iff the child exists and is registered under this parent.
    pub async fn is_guardian(&self, parent_id: Uuid, child_id: Uuid) -> bool {
        self.inner
            .read()
            .await
            .children
            .get(&child_id)
            .map(|c| c.parent_id == parent_id)
            .unwrap_or(false)
    }

    pub async fn children_of(&self, parent_id: Uuid) -> Vec<Child> {
        self.inner
            .read()
            .await
            .children
            .values()
            .filter(|c| c.parent_id == parent_id)
            .cloned()
            .collect()
    }
}
