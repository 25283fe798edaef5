// src/events.rs
//
// Eventos de domínio e um bus em processo sobre canal tokio. A publicação é
// fire-and-forget: quem publica não espera (nem depende de) a entrega.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    common::AppError, db::OrderRepository, models::stock::ConsumptionLine,
    services::OrderWorkflow,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DomainEvent {
    /// Ordem cancelada (recusa do orçamento). O consumidor devolve os
    /// insumos reservados ao estoque.
    OrderCancelled { order_id: Uuid },
    /// Uma reserva foi recusada por falta de saldo; dispara a checagem de
    /// estoque crítico fora da requisição interativa.
    StockShortage { stock_item_ids: Vec<Uuid> },
}

pub trait EventBus: Send + Sync {
    fn publish(&self, event: DomainEvent);
}

/// Bus em processo: publica num canal sem limite, consumido pelo worker.
#[derive(Clone)]
pub struct ChannelEventBus {
    sender: mpsc::UnboundedSender<DomainEvent>,
}

impl ChannelEventBus {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DomainEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventBus for ChannelEventBus {
    fn publish(&self, event: DomainEvent) {
        // Sem consumidor vivo o evento se perde; registramos e seguimos.
        if self.sender.send(event).is_err() {
            tracing::warn!("Evento de domínio descartado: nenhum consumidor ativo");
        }
    }
}

/// Consumidor dos eventos de domínio no worker: cancelamento devolve os
/// insumos da ordem ao estoque; falta de saldo vira gatilho do agendador.
pub struct EventDispatcher {
    workflow: OrderWorkflow,
    order_repo: Arc<dyn OrderRepository>,
    triggers: mpsc::UnboundedSender<()>,
}

impl EventDispatcher {
    pub fn new(
        workflow: OrderWorkflow,
        order_repo: Arc<dyn OrderRepository>,
        triggers: mpsc::UnboundedSender<()>,
    ) -> Self {
        Self {
            workflow,
            order_repo,
            triggers,
        }
    }

    pub async fn run(self, mut events: mpsc::UnboundedReceiver<DomainEvent>) {
        while let Some(event) = events.recv().await {
            if let Err(e) = self.handle(event).await {
                tracing::error!("Falha ao processar evento de domínio: {e}");
            }
        }
    }

    async fn handle(&self, event: DomainEvent) -> Result<(), AppError> {
        match event {
            DomainEvent::OrderCancelled { order_id } => {
                let Some(order) = self.order_repo.find(order_id).await? else {
                    tracing::warn!(ordem = %order_id, "Ordem cancelada não encontrada para devolução");
                    return Ok(());
                };
                if order.consumed_items.is_empty() {
                    return Ok(());
                }
                let lines: Vec<ConsumptionLine> = order
                    .consumed_items
                    .iter()
                    .map(|c| ConsumptionLine {
                        stock_item_id: c.stock_item_id,
                        quantity: c.quantity,
                    })
                    .collect();
                self.workflow.devolver_insumos(&lines).await
            }
            DomainEvent::StockShortage { .. } => {
                let _ = self.triggers.send(());
                Ok(())
            }
        }
    }
}
