// src/models/stock.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    pub id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity_available: i32,
    pub quantity_minimum: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockItem {
    /// Estoque crítico: saldo disponível abaixo do mínimo configurado.
    pub fn is_critical(&self) -> bool {
        self.quantity_available < self.quantity_minimum
    }
}

/// Marcador de deduplicação do alerta de estoque crítico.
/// Invariante: no máximo um alerta por insumo por dia.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StockAlert {
    pub id: Uuid,
    pub stock_item_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl StockAlert {
    pub fn novo(stock_item_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            stock_item_id,
            created_at: Utc::now(),
        }
    }
}

/// Uma linha de (insumo, quantidade) pedida numa reserva ou devolução.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionLine {
    pub stock_item_id: Uuid,
    pub quantity: i32,
}

/// Detalhe de uma linha recusada por falta de saldo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StockShortage {
    pub stock_item_id: Uuid,
    pub requested: i32,
    pub available: i32,
}
