// src/db/stock_repo.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::stock::{StockAlert, StockItem},
};

/// Contrato de armazenamento de estoque e dos marcadores de alerta.
///
/// Toda mutação de `quantity_available` passa por `reserve`/`release` —
/// nenhum outro componente escreve saldo diretamente.
#[async_trait]
pub trait StockRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<StockItem>, AppError>;

    /// Decremento condicional e atômico. Retorna `false` quando o saldo não
    /// cobre a quantidade pedida — o saldo nunca fica negativo, a reserva é
    /// recusada, não truncada.
    async fn reserve(&self, id: Uuid, quantity: i32) -> Result<bool, AppError>;

    /// Incrementa o saldo disponível (devolução).
    async fn release(&self, id: Uuid, quantity: i32) -> Result<(), AppError>;

    /// Insumos com saldo abaixo do mínimo.
    async fn list_critical(&self) -> Result<Vec<StockItem>, AppError>;

    async fn alert_exists_on(&self, stock_item_id: Uuid, date: NaiveDate) -> Result<bool, AppError>;

    async fn record_alert(&self, alert: &StockAlert) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgStockRepository {
    pool: PgPool,
}

impl PgStockRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StockRepository for PgStockRepository {
    async fn find(&self, id: Uuid) -> Result<Option<StockItem>, AppError> {
        let item = sqlx::query_as::<_, StockItem>("SELECT * FROM stock_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn reserve(&self, id: Uuid, quantity: i32) -> Result<bool, AppError> {
        // Decremento com piso na própria query: o banco serializa reservas
        // concorrentes sobre o mesmo insumo e elimina o lost update de um
        // read-then-write.
        let result = sqlx::query(
            r#"
            UPDATE stock_items
            SET quantity_available = quantity_available - $2, updated_at = NOW()
            WHERE id = $1 AND quantity_available >= $2
            "#,
        )
        .bind(id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn release(&self, id: Uuid, quantity: i32) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE stock_items
            SET quantity_available = quantity_available + $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::StockItemNotFound(id));
        }
        Ok(())
    }

    async fn list_critical(&self) -> Result<Vec<StockItem>, AppError> {
        let items = sqlx::query_as::<_, StockItem>(
            "SELECT * FROM stock_items WHERE quantity_available < quantity_minimum ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn alert_exists_on(&self, stock_item_id: Uuid, date: NaiveDate) -> Result<bool, AppError> {
        // O dia é sempre o dia UTC, igual ao índice único — a data da sessão
        // do banco não entra na conta.
        let exists: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM stock_alerts
            WHERE stock_item_id = $1 AND (created_at AT TIME ZONE 'UTC')::date = $2
            LIMIT 1
            "#,
        )
        .bind(stock_item_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(exists.is_some())
    }

    async fn record_alert(&self, alert: &StockAlert) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO stock_alerts (id, stock_item_id, created_at) VALUES ($1, $2, $3)",
        )
        .bind(alert.id)
        .bind(alert.stock_item_id)
        .bind(alert.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
