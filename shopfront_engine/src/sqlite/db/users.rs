use log::warn;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{AccountStatus, User},
    traits::StorageError,
};

#[derive(Debug, Clone, FromRow)]
struct UserRow {
    user_id: i64,
    full_name: String,
    email: Option<String>,
    phone: String,
    status: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            user_id: row.user_id,
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            status: AccountStatus::from(row.status),
        }
    }
}

const USER_COLUMNS: &str = "user_id, full_name, email, phone, status";

pub async fn fetch_user_by_id(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, StorageError> {
    let row: Option<UserRow> = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"))
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(User::from))
}

pub async fn fetch_user_by_phone(phone: &str, conn: &mut SqliteConnection) -> Result<Option<User>, StorageError> {
    let row: Option<UserRow> = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE phone = $1"))
        .bind(phone)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(User::from))
}

pub async fn set_account_status(user_id: i64, status: AccountStatus, conn: &mut SqliteConnection) -> Result<(), StorageError> {
    let result = sqlx::query("UPDATE users SET status = $1 WHERE user_id = $2")
        .bind(status.to_string())
        .bind(user_id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        warn!("🗃️ Tried to set account status for user {user_id}, but no such user exists");
    }
    Ok(())
}

/// Inserts or replaces a user record. User management proper lives outside the engine; this
/// exists for provisioning and test setup.
pub async fn upsert_user(user: &User, conn: &mut SqliteConnection) -> Result<(), StorageError> {
    sqlx::query(
        r#"
            INSERT INTO users (user_id, full_name, email, phone, status)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE
            SET full_name = $2, email = $3, phone = $4, status = $5
        "#,
    )
    .bind(user.user_id)
    .bind(user.full_name.clone())
    .bind(user.email.clone())
    .bind(user.phone.clone())
    .bind(user.status.to_string())
    .execute(conn)
    .await?;
    Ok(())
}
