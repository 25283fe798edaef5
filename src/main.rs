// src/main.rs
//
// Worker da oficina: roda as migrações, consome os eventos de domínio e
// mantém as duas varreduras horárias. O host HTTP consome esta biblioteca
// por fora.

use std::sync::Arc;

use tokio::sync::mpsc;

use oficina::{
    config::AppState,
    events::{ChannelEventBus, EventDispatcher},
    jobs::JobScheduler,
    notifications::LogMailer,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    let (bus, event_rx) = ChannelEventBus::channel();
    let app_state = AppState::new(Arc::new(bus), Arc::new(LogMailer))
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Canal de gatilho: falta de saldo numa reserva adianta a checagem de
    // estoque crítico sem esperar o próximo tique.
    let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();

    let dispatcher = EventDispatcher::new(
        app_state.workflow.clone(),
        app_state.order_repo.clone(),
        trigger_tx,
    );
    tokio::spawn(dispatcher.run(event_rx));

    let scheduler = JobScheduler::new(
        app_state.critical_stock.clone(),
        app_state.expired_budget.clone(),
        app_state.jobs_interval,
    );
    tracing::info!(
        "🚀 Worker iniciado, varreduras a cada {:?}",
        app_state.jobs_interval
    );
    scheduler.run(trigger_rx).await;
}
