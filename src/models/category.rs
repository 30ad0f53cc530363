use serde::{Deserialize, Serialize};

/// A category organisations can be filed under (advice, youth work, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategory {
    pub name: String,
}
