// src/jobs/critical_stock.rs

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    common::error::AppError,
    db::{StockRepository, UserDirectory},
    models::stock::{StockAlert, StockItem},
    notifications::Mailer,
};

/// Resultado de uma varredura de estoque crítico.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CriticalSweep {
    /// Insumos críticos encontrados.
    pub examined: usize,
    /// Alertas enviados (e marcados) nesta varredura.
    pub alerted: usize,
    /// Insumos pulados por já terem alerta hoje.
    pub deduplicated: usize,
}

/// Varredura horária: acha insumos abaixo do mínimo, avisa os assinantes e
/// marca o alerta para não repetir no mesmo dia. Também roda sob demanda
/// quando uma reserva é recusada por falta de saldo.
#[derive(Clone)]
pub struct CriticalStockReconciler {
    stock_repo: Arc<dyn StockRepository>,
    users: Arc<dyn UserDirectory>,
    mailer: Arc<dyn Mailer>,
}

impl CriticalStockReconciler {
    pub fn new(
        stock_repo: Arc<dyn StockRepository>,
        users: Arc<dyn UserDirectory>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            stock_repo,
            users,
            mailer,
        }
    }

    /// Uma passada completa. Falha num insumo não derruba a varredura: é
    /// registrada e o laço segue para o próximo.
    pub async fn run(&self) -> Result<CriticalSweep, AppError> {
        let critical = self.stock_repo.list_critical().await?;
        let mut sweep = CriticalSweep {
            examined: critical.len(),
            ..CriticalSweep::default()
        };

        for item in critical {
            match self.process_item(&item).await {
                Ok(true) => sweep.alerted += 1,
                Ok(false) => sweep.deduplicated += 1,
                Err(e) => {
                    tracing::error!(insumo = %item.id, "Falha ao alertar estoque crítico: {e}");
                }
            }
        }

        if sweep.examined > 0 {
            tracing::info!(
                examinados = sweep.examined,
                alertados = sweep.alerted,
                repetidos = sweep.deduplicated,
                "Varredura de estoque crítico concluída"
            );
        }
        Ok(sweep)
    }

    /// Retorna `Ok(true)` quando um alerta foi enviado e marcado, `Ok(false)`
    /// quando o insumo já tinha alerta hoje.
    async fn process_item(&self, item: &StockItem) -> Result<bool, AppError> {
        let today = Utc::now().date_naive();
        if self.stock_repo.alert_exists_on(item.id, today).await? {
            return Ok(false);
        }

        let subscribers = self.users.list_stock_alert_subscribers().await?;
        // Assinante sem e-mail não é erro: só não recebe.
        let recipients: Vec<String> = subscribers
            .into_iter()
            .filter_map(|user| user.email.filter(|email| !email.is_empty()))
            .collect();

        if recipients.is_empty() {
            tracing::warn!(insumo = %item.id, "Estoque crítico sem destinatários para alertar");
            return Ok(false);
        }

        let subject = format!("Estoque crítico: {}", item.name);
        let body = format!(
            "O insumo \"{}\" está abaixo do mínimo: disponível {}, mínimo {}.",
            item.name, item.quantity_available, item.quantity_minimum
        );
        // O marcador só é gravado depois do envio: se o envio falhar, a
        // próxima varredura tenta de novo; se passar, não repete no dia.
        self.mailer.send(&recipients, &subject, &body).await?;
        self.stock_repo.record_alert(&StockAlert::novo(item.id)).await?;
        Ok(true)
    }
}
