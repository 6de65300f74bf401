use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Psychologist {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parent {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
}

/// A minor under the care of a registered parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Child {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub full_name: String,
    pub birth_date: NaiveDate,
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Parent not found: {0}")]
    ParentNotFound(Uuid),
}
