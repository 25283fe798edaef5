// src/config.rs

use std::{env, sync::Arc, time::Duration};

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    db::{PgCatalogRepository, PgOrderRepository, PgStockRepository, PgUserDirectory},
    events::EventBus,
    jobs::{CriticalStockReconciler, ExpiredBudgetReconciler},
    notifications::Mailer,
    services::{OrderWorkflow, StockLedger},
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub order_repo: Arc<PgOrderRepository>,
    pub workflow: OrderWorkflow,
    pub critical_stock: CriticalStockReconciler,
    pub expired_budget: ExpiredBudgetReconciler,
    /// Cadência das varreduras (JOBS_INTERVAL_SECONDS, padrão 1 hora).
    pub jobs_interval: Duration,
}

impl AppState {
    /// Monta o gráfico de dependências a partir do ambiente. O bus de
    /// eventos e o transporte de e-mail vêm de fora: o worker injeta os
    /// seus, os testes injetam dublês.
    pub async fn new(events: Arc<dyn EventBus>, mailer: Arc<dyn Mailer>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jobs_interval = env::var("JOBS_INTERVAL_SECONDS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(3600));

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let order_repo = Arc::new(PgOrderRepository::new(db_pool.clone()));
        let stock_repo = Arc::new(PgStockRepository::new(db_pool.clone()));
        let catalog_repo = Arc::new(PgCatalogRepository::new(db_pool.clone()));
        let user_directory = Arc::new(PgUserDirectory::new(db_pool.clone()));

        let ledger = StockLedger::new(stock_repo.clone());
        let workflow = OrderWorkflow::new(
            order_repo.clone(),
            stock_repo.clone(),
            catalog_repo,
            ledger.clone(),
            events,
        );
        let critical_stock =
            CriticalStockReconciler::new(stock_repo, user_directory, mailer);
        let expired_budget = ExpiredBudgetReconciler::new(order_repo.clone(), ledger);

        Ok(Self {
            db_pool,
            order_repo,
            workflow,
            critical_stock,
            expired_budget,
            jobs_interval,
        })
    }
}
