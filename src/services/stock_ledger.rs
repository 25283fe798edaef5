// src/services/stock_ledger.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::StockRepository,
    models::stock::{ConsumptionLine, StockShortage},
};

/// Dono dos invariantes de saldo: reservar (decrementar) e devolver
/// (incrementar) passam por aqui, nunca direto no repositório.
#[derive(Clone)]
pub struct StockLedger {
    stock_repo: Arc<dyn StockRepository>,
}

impl StockLedger {
    pub fn new(stock_repo: Arc<dyn StockRepository>) -> Self {
        Self { stock_repo }
    }

    /// Reserva todas as linhas ou nenhuma.
    ///
    /// Primeiro confere o saldo de todas as linhas e recusa o pedido inteiro
    /// se alguma não fecha, sem tocar no estoque. Na fase de efetivação cada
    /// decremento é condicional; se um falhar por corrida, as linhas já
    /// reservadas são devolvidas antes de propagar o erro. Nenhuma reserva
    /// parcial sobrevive a uma chamada que falhou.
    pub async fn reserve_all(&self, lines: &[ConsumptionLine]) -> Result<(), AppError> {
        Self::validate_quantities(lines)?;

        // Fase 1: conferência, sem mutação.
        let mut shortages = Vec::new();
        for line in lines {
            let item = self
                .stock_repo
                .find(line.stock_item_id)
                .await?
                .ok_or(AppError::StockItemNotFound(line.stock_item_id))?;
            if item.quantity_available < line.quantity {
                shortages.push(StockShortage {
                    stock_item_id: line.stock_item_id,
                    requested: line.quantity,
                    available: item.quantity_available,
                });
            }
        }
        if !shortages.is_empty() {
            return Err(AppError::InsufficientStock(shortages));
        }

        // Fase 2: efetivação. O decremento condicional ainda pode recusar se
        // outra reserva passou na frente entre as duas fases.
        let mut reserved: Vec<ConsumptionLine> = Vec::with_capacity(lines.len());
        for line in lines {
            match self.stock_repo.reserve(line.stock_item_id, line.quantity).await {
                Ok(true) => reserved.push(*line),
                Ok(false) => {
                    let available = self
                        .stock_repo
                        .find(line.stock_item_id)
                        .await
                        .ok()
                        .flatten()
                        .map(|item| item.quantity_available)
                        .unwrap_or(0);
                    self.compensate(&reserved).await;
                    return Err(AppError::InsufficientStock(vec![StockShortage {
                        stock_item_id: line.stock_item_id,
                        requested: line.quantity,
                        available,
                    }]));
                }
                Err(e) => {
                    self.compensate(&reserved).await;
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Devolve cada linha ao estoque. Falha numa linha não impede as demais.
    pub async fn release_all(&self, lines: &[ConsumptionLine]) -> Result<(), AppError> {
        Self::validate_quantities(lines)?;

        let mut first_error = None;
        for line in lines {
            if let Err(e) = self.stock_repo.release(line.stock_item_id, line.quantity).await {
                tracing::error!(
                    insumo = %line.stock_item_id,
                    quantidade = line.quantity,
                    "Falha ao devolver insumo ao estoque: {e}"
                );
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // Quantidade é inteiro positivo por definição; zero ou negativo numa
    // devolução viraria baixa de estoque disfarçada.
    fn validate_quantities(lines: &[ConsumptionLine]) -> Result<(), AppError> {
        if lines.iter().any(|line| line.quantity <= 0) {
            return Err(AppError::InvalidState("quantidade de insumo deve ser positiva"));
        }
        Ok(())
    }

    async fn compensate(&self, reserved: &[ConsumptionLine]) {
        if reserved.is_empty() {
            return;
        }
        if let Err(e) = self.release_all(reserved).await {
            tracing::error!("Compensação de reserva parcial incompleta: {e}");
        }
    }
}
