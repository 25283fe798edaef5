// src/db/order_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::orders::{OrderStatus, ServiceOrder, StockConsumption},
};

/// Contrato de armazenamento de ordens de serviço.
///
/// Escritas que deveriam afetar uma linha e não afetam nenhuma retornam
/// `PersistenceFailure` (o equivalente a um commit devolvendo `false`).
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create(&self, order: &ServiceOrder) -> Result<(), AppError>;

    /// Busca a ordem com suas linhas de consumo.
    async fn find(&self, id: Uuid) -> Result<Option<ServiceOrder>, AppError>;

    /// Ordens em `AguardandoAprovacao` cujo orçamento foi enviado antes do corte.
    async fn list_awaiting_approval(
        &self,
        submitted_before: DateTime<Utc>,
    ) -> Result<Vec<ServiceOrder>, AppError>;

    /// Grava valor e instante do orçamento e move a ordem para
    /// `AguardandoAprovacao`, tudo na mesma escrita. Os dois campos nunca
    /// são persistidos separados.
    async fn set_budget(
        &self,
        id: Uuid,
        amount: Decimal,
        submitted_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Transição condicional de status (compare-and-swap). Retorna `false`
    /// quando a ordem não estava mais em `from` — ninguém transita duas vezes.
    async fn transition(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, AppError>;

    /// Escrita simples de status, sem pré-condição.
    async fn set_status(&self, id: Uuid, status: OrderStatus) -> Result<(), AppError>;

    async fn add_consumptions(&self, lines: &[StockConsumption]) -> Result<(), AppError>;

    async fn update_description(&self, id: Uuid, description: &str) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_consumptions(&self, order_id: Uuid) -> Result<Vec<StockConsumption>, AppError> {
        let lines = sqlx::query_as::<_, StockConsumption>(
            r#"
            SELECT id, service_order_id, stock_item_id, quantity, created_at
            FROM stock_consumptions
            WHERE service_order_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create(&self, order: &ServiceOrder) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO service_orders
                (id, customer_id, vehicle_id, service_id, status, description,
                 budget_amount, budget_submitted_at, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(order.id)
        .bind(order.customer_id)
        .bind(order.vehicle_id)
        .bind(order.service_id)
        .bind(order.status)
        .bind(&order.description)
        .bind(order.budget_amount)
        .bind(order.budget_submitted_at)
        .bind(order.active)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<ServiceOrder>, AppError> {
        let order = sqlx::query_as::<_, ServiceOrder>(
            "SELECT * FROM service_orders WHERE id = $1 AND active = TRUE",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match order {
            Some(mut order) => {
                order.consumed_items = self.load_consumptions(order.id).await?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    async fn list_awaiting_approval(
        &self,
        submitted_before: DateTime<Utc>,
    ) -> Result<Vec<ServiceOrder>, AppError> {
        let mut orders = sqlx::query_as::<_, ServiceOrder>(
            r#"
            SELECT * FROM service_orders
            WHERE status = 'AGUARDANDO_APROVACAO'
              AND active = TRUE
              AND budget_submitted_at < $1
            ORDER BY budget_submitted_at ASC
            "#,
        )
        .bind(submitted_before)
        .fetch_all(&self.pool)
        .await?;

        for order in &mut orders {
            order.consumed_items = self.load_consumptions(order.id).await?;
        }
        Ok(orders)
    }

    async fn set_budget(
        &self,
        id: Uuid,
        amount: Decimal,
        submitted_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE service_orders
            SET budget_amount = $2,
                budget_submitted_at = $3,
                status = 'AGUARDANDO_APROVACAO',
                updated_at = NOW()
            WHERE id = $1 AND active = TRUE
            "#,
        )
        .bind(id)
        .bind(amount)
        .bind(submitted_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::PersistenceFailure);
        }
        Ok(())
    }

    async fn transition(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, AppError> {
        // A cláusula `status = $2` é o que impede duas transições concorrentes
        // sobre a mesma ordem (duas varreduras, ou varredura + requisição).
        let result = sqlx::query(
            r#"
            UPDATE service_orders
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2 AND active = TRUE
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_status(&self, id: Uuid, status: OrderStatus) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE service_orders SET status = $2, updated_at = NOW() WHERE id = $1 AND active = TRUE",
        )
        .bind(id)
        .bind(status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::PersistenceFailure);
        }
        Ok(())
    }

    async fn add_consumptions(&self, lines: &[StockConsumption]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        for line in lines {
            sqlx::query(
                r#"
                INSERT INTO stock_consumptions
                    (id, service_order_id, stock_item_id, quantity, created_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(line.id)
            .bind(line.service_order_id)
            .bind(line.stock_item_id)
            .bind(line.quantity)
            .bind(line.created_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn update_description(&self, id: Uuid, description: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE service_orders SET description = $2, updated_at = NOW() WHERE id = $1 AND active = TRUE",
        )
        .bind(id)
        .bind(description)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::PersistenceFailure);
        }
        Ok(())
    }
}
