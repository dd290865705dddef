//! Token balance and purchase models.

use serde::{Deserialize, Serialize};
use sparkfluence_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `token_purchases` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TokenPurchase {
    pub id: DbId,
    pub user_id: DbId,
    pub tokens: i64,
    pub amount: f64,
    pub payment_method: String,
    pub status: String,
    pub created_at: Timestamp,
}

/// DTO for a simulated purchase.
#[derive(Debug, Deserialize)]
pub struct CreateTokenPurchase {
    pub tokens: i64,
    pub amount: f64,
    pub payment_method: String,
}
