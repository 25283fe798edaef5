// src/jobs/expired_budget.rs

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    common::error::AppError,
    db::OrderRepository,
    models::{orders::OrderStatus, stock::ConsumptionLine},
    services::{order_workflow::expiry_window, stock_ledger::StockLedger},
};

/// Resultado de uma varredura de orçamentos expirados.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpiredSweep {
    /// Ordens expiradas encontradas pela consulta.
    pub examined: usize,
    /// Ordens efetivamente canceladas por esta varredura.
    pub cancelled: usize,
    /// Dessas, quantas tiveram insumos devolvidos ao estoque.
    pub released: usize,
}

/// Varredura horária: ordens paradas em `AguardandoAprovacao` além do prazo
/// são canceladas e seus insumos devolvidos ao estoque.
///
/// O cancelamento vem antes da devolução e é condicional ao status: uma
/// ordem já reivindicada por outra varredura (ou recusada pelo cliente no
/// meio do caminho) não é devolvida de novo. Rodar duas vezes não devolve
/// estoque em dobro.
#[derive(Clone)]
pub struct ExpiredBudgetReconciler {
    order_repo: Arc<dyn OrderRepository>,
    ledger: StockLedger,
}

impl ExpiredBudgetReconciler {
    pub fn new(order_repo: Arc<dyn OrderRepository>, ledger: StockLedger) -> Self {
        Self { order_repo, ledger }
    }

    pub async fn run(&self) -> Result<ExpiredSweep, AppError> {
        let cutoff = Utc::now() - expiry_window();
        let expired = self.order_repo.list_awaiting_approval(cutoff).await?;
        let mut sweep = ExpiredSweep {
            examined: expired.len(),
            ..ExpiredSweep::default()
        };

        for order in expired {
            let claimed = match self
                .order_repo
                .transition(order.id, OrderStatus::AguardandoAprovacao, OrderStatus::Cancelada)
                .await
            {
                Ok(claimed) => claimed,
                Err(e) => {
                    tracing::error!(ordem = %order.id, "Falha ao cancelar ordem expirada: {e}");
                    continue;
                }
            };
            if !claimed {
                // Outra varredura (ou o próprio cliente) chegou antes.
                continue;
            }
            sweep.cancelled += 1;

            if order.consumed_items.is_empty() {
                continue;
            }
            let lines: Vec<ConsumptionLine> = order
                .consumed_items
                .iter()
                .map(|c| ConsumptionLine {
                    stock_item_id: c.stock_item_id,
                    quantity: c.quantity,
                })
                .collect();

            match self.ledger.release_all(&lines).await {
                Ok(()) => sweep.released += 1,
                Err(e) => {
                    tracing::error!(ordem = %order.id, "Falha ao devolver insumos da ordem expirada: {e}");
                }
            }
        }

        if sweep.examined > 0 {
            tracing::info!(
                examinadas = sweep.examined,
                canceladas = sweep.cancelled,
                devolvidas = sweep.released,
                "Varredura de orçamentos expirados concluída"
            );
        }
        Ok(sweep)
    }
}
