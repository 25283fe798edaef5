// src/services/order_workflow.rs

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CatalogRepository, OrderRepository, StockRepository},
    events::{DomainEvent, EventBus},
    models::{
        orders::{OrderStatus, ServiceOrder, StockConsumption},
        stock::ConsumptionLine,
    },
    services::{budget, stock_ledger::StockLedger},
};

/// Prazo para o cliente aceitar um orçamento enviado. Depois disso o aceite
/// é recusado e a varredura horária devolve os insumos reservados.
pub const EXPIRY_WINDOW_DAYS: i64 = 7;

pub fn expiry_window() -> Duration {
    Duration::days(EXPIRY_WINDOW_DAYS)
}

/// A máquina de estados da ordem de serviço: abertura, reserva de insumos,
/// envio do orçamento, aceite e recusa.
#[derive(Clone)]
pub struct OrderWorkflow {
    order_repo: Arc<dyn OrderRepository>,
    stock_repo: Arc<dyn StockRepository>,
    catalog_repo: Arc<dyn CatalogRepository>,
    ledger: StockLedger,
    events: Arc<dyn EventBus>,
}

impl OrderWorkflow {
    pub fn new(
        order_repo: Arc<dyn OrderRepository>,
        stock_repo: Arc<dyn StockRepository>,
        catalog_repo: Arc<dyn CatalogRepository>,
        ledger: StockLedger,
        events: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            order_repo,
            stock_repo,
            catalog_repo,
            ledger,
            events,
        }
    }

    // --- ABERTURA ---

    /// Abre uma ordem de serviço em `Recebida`, sem orçamento e sem insumos.
    /// Cliente e serviço precisam existir no catálogo.
    pub async fn cadastrar(
        &self,
        customer_id: Uuid,
        vehicle_id: Uuid,
        service_id: Uuid,
        description: String,
    ) -> Result<ServiceOrder, AppError> {
        if !self.catalog_repo.customer_exists(customer_id).await? {
            return Err(AppError::CustomerNotFound);
        }
        if self.catalog_repo.find_service(service_id).await?.is_none() {
            return Err(AppError::ServiceNotFound);
        }

        let order = ServiceOrder::nova(customer_id, vehicle_id, service_id, description);
        self.order_repo.create(&order).await?;
        tracing::info!(ordem = %order.id, "Ordem de serviço aberta");
        Ok(order)
    }

    // --- INSUMOS ---

    /// Reserva os insumos pedidos e vincula uma linha de consumo por item.
    ///
    /// Tudo-ou-nada: se alguma linha não tem saldo, nada é reservado, o erro
    /// lista as linhas recusadas e a checagem de estoque crítico é disparada
    /// fora da requisição.
    pub async fn cadastrar_insumos(
        &self,
        order_id: Uuid,
        lines: &[ConsumptionLine],
    ) -> Result<Vec<StockConsumption>, AppError> {
        let order = self
            .order_repo
            .find(order_id)
            .await?
            .ok_or(AppError::OrderNotFound)?;

        // Valida existência de todos os insumos antes de qualquer mutação.
        for line in lines {
            if self.stock_repo.find(line.stock_item_id).await?.is_none() {
                return Err(AppError::StockItemNotFound(line.stock_item_id));
            }
        }

        if let Err(e) = self.ledger.reserve_all(lines).await {
            if let AppError::InsufficientStock(shortages) = &e {
                tracing::warn!(
                    ordem = %order_id,
                    linhas = shortages.len(),
                    "Reserva recusada por falta de saldo"
                );
                self.events.publish(DomainEvent::StockShortage {
                    stock_item_ids: shortages.iter().map(|s| s.stock_item_id).collect(),
                });
            }
            return Err(e);
        }

        let consumptions: Vec<StockConsumption> = lines
            .iter()
            .map(|line| StockConsumption::nova(order.id, line.stock_item_id, line.quantity))
            .collect();

        if let Err(e) = self.order_repo.add_consumptions(&consumptions).await {
            // A reserva já aconteceu; devolve antes de propagar.
            let _ = self.ledger.release_all(lines).await;
            return Err(e);
        }

        Ok(consumptions)
    }

    /// Devolve linhas de insumo ao estoque. Operação pura de ledger — não
    /// exige ordem existente (usada pelo cancelamento e pelas varreduras).
    pub async fn devolver_insumos(&self, lines: &[ConsumptionLine]) -> Result<(), AppError> {
        self.ledger.release_all(lines).await
    }

    // --- ORÇAMENTO ---

    /// Calcula o orçamento (preço do serviço + insumos consumidos), grava
    /// valor e instante de envio juntos e move a ordem para
    /// `AguardandoAprovacao`.
    pub async fn calcular_orcamento(&self, order_id: Uuid) -> Result<ServiceOrder, AppError> {
        let mut order = self
            .order_repo
            .find(order_id)
            .await?
            .ok_or(AppError::OrderNotFound)?;

        let service = self
            .catalog_repo
            .find_service(order.service_id)
            .await?
            .ok_or(AppError::ServiceNotFound)?;

        let mut items = Vec::with_capacity(order.consumed_items.len());
        for line in &order.consumed_items {
            let item = self
                .stock_repo
                .find(line.stock_item_id)
                .await?
                .ok_or(AppError::StockItemNotFound(line.stock_item_id))?;
            items.push((line.quantity, item.unit_price));
        }

        let amount = budget::calcular(service.price, &items);
        let submitted_at = Utc::now();

        self.order_repo.set_budget(order.id, amount, submitted_at).await?;

        order.budget_amount = Some(amount);
        order.budget_submitted_at = Some(submitted_at);
        order.status = OrderStatus::AguardandoAprovacao;
        tracing::info!(ordem = %order.id, valor = %amount, "Orçamento enviado para aprovação");
        Ok(order)
    }

    /// Aceite do orçamento. Recusado se a ordem não aguarda aprovação ou se
    /// o prazo de 7 dias já venceu.
    pub async fn aceitar_orcamento(&self, order_id: Uuid) -> Result<(), AppError> {
        let order = self
            .order_repo
            .find(order_id)
            .await?
            .ok_or(AppError::OrderNotFound)?;

        if order.status != OrderStatus::AguardandoAprovacao {
            return Err(AppError::InvalidState("ordem não aguarda aprovação"));
        }
        let submitted_at = order
            .budget_submitted_at
            .ok_or(AppError::InvalidState("ordem sem orçamento enviado"))?;
        if Utc::now() - submitted_at > expiry_window() {
            return Err(AppError::InvalidState("orçamento expirado"));
        }

        let committed = self
            .order_repo
            .transition(order.id, OrderStatus::AguardandoAprovacao, OrderStatus::EmExecucao)
            .await?;
        if !committed {
            return Err(AppError::PersistenceFailure);
        }
        tracing::info!(ordem = %order.id, "Orçamento aceito, ordem em execução");
        Ok(())
    }

    /// Recusa do orçamento. Sem checagem de prazo: recusar orçamento vencido
    /// é permitido. O evento de cancelamento só é publicado depois do commit
    /// — quem o consome devolve os insumos da ordem ao estoque.
    pub async fn recusar_orcamento(&self, order_id: Uuid) -> Result<(), AppError> {
        let order = self
            .order_repo
            .find(order_id)
            .await?
            .ok_or(AppError::OrderNotFound)?;

        if order.status != OrderStatus::AguardandoAprovacao {
            return Err(AppError::InvalidState("ordem não aguarda aprovação"));
        }

        let committed = self
            .order_repo
            .transition(order.id, OrderStatus::AguardandoAprovacao, OrderStatus::Cancelada)
            .await?;
        if !committed {
            return Err(AppError::PersistenceFailure);
        }

        self.events
            .publish(DomainEvent::OrderCancelled { order_id: order.id });
        tracing::info!(ordem = %order.id, "Orçamento recusado, ordem cancelada");
        Ok(())
    }

    // --- TRANSIÇÕES SIMPLES ---

    /// Diagnóstico e finalização não carregam regra própria: escrita simples
    /// de status. Ordens em estado terminal não saem mais dele.
    pub async fn atualizar_status(
        &self,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<(), AppError> {
        let order = self
            .order_repo
            .find(order_id)
            .await?
            .ok_or(AppError::OrderNotFound)?;
        if order.status.is_terminal() {
            return Err(AppError::InvalidState("ordem em estado terminal"));
        }
        self.order_repo.set_status(order_id, status).await
    }

    pub async fn atualizar_descricao(
        &self,
        order_id: Uuid,
        description: &str,
    ) -> Result<(), AppError> {
        if self.order_repo.find(order_id).await?.is_none() {
            return Err(AppError::OrderNotFound);
        }
        self.order_repo.update_description(order_id, description).await
    }
}
