// src/db/user_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{common::error::AppError, models::catalog::User};

/// Diretório de usuários — só nos interessa quem assina alerta de estoque.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list_stock_alert_subscribers(&self) -> Result<Vec<User>, AppError>;
}

#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn list_stock_alert_subscribers(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, notify_stock_alerts
            FROM users
            WHERE notify_stock_alerts = TRUE
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }
}
