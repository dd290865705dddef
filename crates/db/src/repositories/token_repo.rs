//! Repository for `user_tokens` and `token_purchases`.

use sparkfluence_core::types::DbId;
use sqlx::PgPool;

use crate::models::token::{CreateTokenPurchase, TokenPurchase};

const PURCHASE_COLUMNS: &str =
    "id, user_id, tokens, amount, payment_method, status, created_at";

/// Status recorded for simulated purchases.
pub const PURCHASE_COMPLETED: &str = "completed";

pub struct TokenRepo;

impl TokenRepo {
    /// Current balance; users without a row have zero tokens.
    pub async fn balance(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT balance FROM user_tokens WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(pool)
                .await?;
        Ok(balance.unwrap_or(0))
    }

    /// Record a purchase and credit the balance atomically.
    ///
    /// Returns the receipt and the balance after crediting.
    pub async fn purchase(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateTokenPurchase,
    ) -> Result<(TokenPurchase, i64), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO token_purchases (user_id, tokens, amount, payment_method, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {PURCHASE_COLUMNS}"
        );
        let receipt = sqlx::query_as::<_, TokenPurchase>(&query)
            .bind(user_id)
            .bind(input.tokens)
            .bind(input.amount)
            .bind(&input.payment_method)
            .bind(PURCHASE_COMPLETED)
            .fetch_one(&mut *tx)
            .await?;

        let balance: i64 = sqlx::query_scalar(
            "INSERT INTO user_tokens (user_id, balance) VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET \
                balance = user_tokens.balance + EXCLUDED.balance, \
                updated_at = NOW() \
             RETURNING balance",
        )
        .bind(user_id)
        .bind(input.tokens)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((receipt, balance))
    }
}
