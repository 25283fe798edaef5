// src/models/orders.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// --- Enums ---

/// Ciclo de vida de uma ordem de serviço.
///
/// `Recebida` é o estado inicial; `Finalizada` e `Cancelada` são terminais.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Recebida,
    EmDiagnostico,
    AguardandoAprovacao,
    EmExecucao,
    Cancelada,
    Finalizada,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Finalizada | OrderStatus::Cancelada)
    }
}

// --- Structs de Operação ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrder {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub service_id: Uuid,
    pub status: OrderStatus,
    pub description: String,
    pub budget_amount: Option<Decimal>,
    pub budget_submitted_at: Option<DateTime<Utc>>,
    /// Insumos consumidos pela ordem. Carregados à parte (não vêm da linha principal).
    #[sqlx(skip)]
    pub consumed_items: Vec<StockConsumption>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceOrder {
    /// Monta uma ordem recém-recebida, sem orçamento e sem insumos.
    pub fn nova(customer_id: Uuid, vehicle_id: Uuid, service_id: Uuid, description: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            customer_id,
            vehicle_id,
            service_id,
            status: OrderStatus::Recebida,
            description,
            budget_amount: None,
            budget_submitted_at: None,
            consumed_items: Vec::new(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Um insumo consumido por uma ordem de serviço.
///
/// Nunca é editado depois de criado: correções são modeladas como
/// devolução + nova reserva.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StockConsumption {
    pub id: Uuid,
    pub service_order_id: Uuid,
    pub stock_item_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl StockConsumption {
    pub fn nova(service_order_id: Uuid, stock_item_id: Uuid, quantity: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            service_order_id,
            stock_item_id,
            quantity,
            created_at: Utc::now(),
        }
    }
}
