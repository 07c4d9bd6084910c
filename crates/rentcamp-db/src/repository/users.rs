//! User operations

use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite};

use crate::error::DbError;
use crate::models::{NewUser, UpdateUser, User};
use crate::repository::Database;
use crate::utils::contains_pattern;

/// Query parameters for listing users
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    /// Filter by name (partial match)
    pub name: Option<String>,
    /// Pagination offset
    pub offset: i64,
    /// Pagination limit (non-positive means no limit)
    pub limit: i64,
}

impl Database {
    // ==================== User Operations ====================

    /// Insert a new user
    pub async fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (name, username, password_hash, email, phone, address, gender, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(user.gender.as_str())
        .bind(user.role.as_str())
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            DbError::unique_violation(e, || format!("User '{}' already exists", user.username))
        })?;

        let id: i64 = result.get("id");

        Ok(User {
            id,
            name: user.name,
            username: user.username,
            password_hash: user.password_hash,
            email: user.email,
            phone: user.phone,
            address: user.address,
            gender: user.gender,
            role: user.role,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a user by username
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, name, username, password_hash, email, phone, address, gender, role, created_at, updated_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, name, username, password_hash, email, phone, address, gender, role, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List users with an optional name filter and pagination
    pub async fn list_users(&self, query: UserQuery) -> Result<(Vec<User>, i64), DbError> {
        let (where_clause, params) = match &query.name {
            Some(name) => ("WHERE name LIKE ? ESCAPE '\\'", vec![contains_pattern(name)]),
            None => ("", Vec::new()),
        };

        // Get total count
        let count_sql = format!("SELECT COUNT(*) as count FROM users {}", where_clause);
        let mut count_query = sqlx::query(&count_sql);
        for param in &params {
            count_query = count_query.bind(param);
        }
        let total: i64 = count_query.fetch_one(&self.pool).await?.get("count");

        // SQLite treats a negative LIMIT as unbounded
        let limit = if query.limit > 0 { query.limit } else { -1 };
        let sql = format!(
            r#"
            SELECT id, name, username, password_hash, email, phone, address, gender, role, created_at, updated_at
            FROM users
            {}
            ORDER BY id
            LIMIT ? OFFSET ?
            "#,
            where_clause
        );

        let mut users_query = sqlx::query(&sql);
        for param in &params {
            users_query = users_query.bind(param);
        }
        users_query = users_query.bind(limit).bind(query.offset.max(0));

        let rows = users_query.fetch_all(&self.pool).await?;
        let users: Result<Vec<User>, _> = rows
            .iter()
            .map(|row| User::try_from(row).map_err(DbError::from))
            .collect();

        Ok((users?, total))
    }

    /// Apply a partial update and return the updated user
    ///
    /// Returns `None` when no user has the given ID.
    pub async fn update_user(&self, id: i64, update: UpdateUser) -> Result<Option<User>, DbError> {
        let taken = update
            .username
            .as_ref()
            .map(|username| format!("User '{}' already exists", username));

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET updated_at = ");
        builder.push_bind(Utc::now().to_rfc3339());

        if let Some(name) = update.name {
            builder.push(", name = ").push_bind(name);
        }
        if let Some(username) = update.username {
            builder.push(", username = ").push_bind(username);
        }
        if let Some(password_hash) = update.password_hash {
            builder.push(", password_hash = ").push_bind(password_hash);
        }
        if let Some(email) = update.email {
            builder.push(", email = ").push_bind(email);
        }
        if let Some(phone) = update.phone {
            builder.push(", phone = ").push_bind(phone);
        }
        if let Some(address) = update.address {
            builder.push(", address = ").push_bind(address);
        }
        if let Some(gender) = update.gender {
            builder.push(", gender = ").push_bind(gender.as_str());
        }
        if let Some(role) = update.role {
            builder.push(", role = ").push_bind(role.as_str());
        }

        builder.push(" WHERE id = ").push_bind(id);
        builder.push(
            " RETURNING id, name, username, password_hash, email, phone, address, gender, role, created_at, updated_at",
        );

        let result = builder
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DbError::unique_violation(e, || taken.unwrap_or_default()))?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Delete a user
    pub async fn delete_user(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Check if any users exist
    pub async fn has_users(&self) -> Result<bool, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = result.get("count");
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, UserRole};
    use crate::repository::test_support::{new_user, seed_user, test_db};

    #[tokio::test]
    async fn test_insert_and_fetch_user() {
        let db = test_db().await;
        let user = db.insert_user(new_user("alice", UserRole::Admin)).await.unwrap();

        let by_name = db.get_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert_eq!(by_name.role, UserRole::Admin);
        assert_eq!(by_name.gender, Gender::Female);

        let by_id = db.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
        assert!(db.has_users().await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = test_db().await;
        seed_user(&db, "bob").await;

        let result = db.insert_user(new_user("bob", UserRole::User)).await;
        assert!(matches!(result, Err(DbError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_concurrent_registration_one_wins() {
        let db = test_db().await;

        let (first, second) = tokio::join!(
            db.insert_user(new_user("citra", UserRole::User)),
            db.insert_user(new_user("citra", UserRole::User)),
        );

        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            outcomes
                .iter()
                .any(|r| matches!(r, Err(DbError::Duplicate(msg)) if msg.contains("citra")))
        );
    }

    #[tokio::test]
    async fn test_list_users_filters_and_paginates() {
        let db = test_db().await;
        for name in ["ana", "andi", "budi"] {
            seed_user(&db, name).await;
        }

        let (users, total) = db
            .list_users(UserQuery {
                name: Some("an".to_string()),
                offset: 0,
                limit: 1,
            })
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "ana");

        let (users, total) = db.list_users(UserQuery::default()).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(users.len(), 3);
    }

    #[tokio::test]
    async fn test_update_user_partial() {
        let db = test_db().await;
        let user = seed_user(&db, "carol").await;

        let updated = db
            .update_user(
                user.id,
                UpdateUser {
                    phone: Some("0811".to_string()),
                    role: Some(UserRole::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.phone, "0811");
        assert_eq!(updated.role, UserRole::Admin);
        assert_eq!(updated.email, user.email);

        let missing = db.update_user(9999, UpdateUser::default()).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_update_user_rejects_taken_username() {
        let db = test_db().await;
        seed_user(&db, "dina").await;
        let other = seed_user(&db, "edo").await;

        let result = db
            .update_user(
                other.id,
                UpdateUser {
                    username: Some("dina".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(DbError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_delete_user() {
        let db = test_db().await;
        let user = seed_user(&db, "fajar").await;

        assert!(db.delete_user(user.id).await.unwrap());
        assert!(!db.delete_user(user.id).await.unwrap());
        assert!(!db.has_users().await.unwrap());
    }
}
