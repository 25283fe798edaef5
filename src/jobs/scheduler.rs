// src/jobs/scheduler.rs

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::jobs::{CriticalStockReconciler, ExpiredBudgetReconciler};

/// Agendador explícito das duas varreduras, montado na inicialização — nada
/// de registro global de jobs.
///
/// Além do tique periódico, escuta um canal de gatilho: uma reserva recusada
/// por falta de saldo dispara a checagem de estoque crítico na hora, sem
/// esperar a próxima rodada.
pub struct JobScheduler {
    critical_stock: CriticalStockReconciler,
    expired_budget: ExpiredBudgetReconciler,
    interval: Duration,
}

impl JobScheduler {
    pub fn new(
        critical_stock: CriticalStockReconciler,
        expired_budget: ExpiredBudgetReconciler,
        interval: Duration,
    ) -> Self {
        Self {
            critical_stock,
            expired_budget,
            interval,
        }
    }

    /// Laço do worker. Só retorna quando a task for abortada.
    pub async fn run(self, mut triggers: mpsc::UnboundedReceiver<()>) {
        let mut tick = tokio::time::interval(self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut triggers_open = true;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.sweep().await;
                }
                maybe = triggers.recv(), if triggers_open => {
                    match maybe {
                        Some(()) => {
                            tracing::info!("Checagem de estoque crítico disparada sob demanda");
                            if let Err(e) = self.critical_stock.run().await {
                                tracing::error!("Varredura de estoque crítico falhou: {e}");
                            }
                        }
                        None => triggers_open = false,
                    }
                }
            }
        }
    }

    async fn sweep(&self) {
        if let Err(e) = self.critical_stock.run().await {
            tracing::error!("Varredura de estoque crítico falhou: {e}");
        }
        if let Err(e) = self.expired_budget.run().await {
            tracing::error!("Varredura de orçamentos expirados falhou: {e}");
        }
    }
}
