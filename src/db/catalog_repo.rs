// src/db/catalog_repo.rs
//
// Lookup de clientes e serviços — colaborador externo, usado só para
// validar existência na abertura da ordem e para ler o preço do serviço.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::catalog::Service};

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn customer_exists(&self, id: Uuid) -> Result<bool, AppError>;

    async fn find_service(&self, id: Uuid) -> Result<Option<Service>, AppError>;
}

#[derive(Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn customer_exists(&self, id: Uuid) -> Result<bool, AppError> {
        let row: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM customers WHERE id = $1 AND active = TRUE")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    async fn find_service(&self, id: Uuid) -> Result<Option<Service>, AppError> {
        let service = sqlx::query_as::<_, Service>(
            "SELECT id, name, price FROM services WHERE id = $1 AND active = TRUE",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(service)
    }
}
