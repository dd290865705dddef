use serde::{Deserialize, Serialize};
use sparkfluence_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `linked_accounts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LinkedAccount {
    pub id: DbId,
    pub user_id: DbId,
    pub platform: String,
    pub platform_username: String,
    pub connected_at: Timestamp,
}

/// DTO for connecting (or renaming) an account on a platform.
#[derive(Debug, Deserialize)]
pub struct UpsertLinkedAccount {
    pub platform_username: String,
}
