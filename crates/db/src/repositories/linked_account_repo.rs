//! Repository for the `linked_accounts` table.

use sparkfluence_core::types::DbId;
use sqlx::PgPool;

use crate::models::linked_account::LinkedAccount;

const COLUMNS: &str = "id, user_id, platform, platform_username, connected_at";

pub struct LinkedAccountRepo;

impl LinkedAccountRepo {
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<LinkedAccount>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM linked_accounts WHERE user_id = $1 ORDER BY platform"
        );
        sqlx::query_as::<_, LinkedAccount>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Connect a platform account, replacing the username if one is
    /// already linked for that platform.
    pub async fn upsert(
        pool: &PgPool,
        user_id: DbId,
        platform: &str,
        platform_username: &str,
    ) -> Result<LinkedAccount, sqlx::Error> {
        let query = format!(
            "INSERT INTO linked_accounts (user_id, platform, platform_username) \
             VALUES ($1, $2, $3) \
             ON CONFLICT ON CONSTRAINT uq_linked_accounts_user_platform DO UPDATE SET \
                platform_username = EXCLUDED.platform_username, \
                connected_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LinkedAccount>(&query)
            .bind(user_id)
            .bind(platform)
            .bind(platform_username)
            .fetch_one(pool)
            .await
    }

    /// Disconnect a platform. Returns `true` if a link existed.
    pub async fn delete(pool: &PgPool, user_id: DbId, platform: &str) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM linked_accounts WHERE user_id = $1 AND platform = $2")
                .bind(user_id)
                .bind(platform)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
