// tests/support/mod.rs
//
// Dublês em memória dos colaboradores externos, para exercitar o fluxo sem
// banco. As regras espelham os contratos dos repositórios Postgres:
// escrita sem linha afetada é `PersistenceFailure`, reserva é decremento
// condicional, devolução de insumo desconhecido é `StockItemNotFound`.

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use oficina::{
    common::error::AppError,
    db::{CatalogRepository, OrderRepository, StockRepository, UserDirectory},
    events::{DomainEvent, EventBus},
    models::{
        catalog::{Service, User},
        orders::{OrderStatus, ServiceOrder, StockConsumption},
        stock::{StockAlert, StockItem},
    },
    notifications::Mailer,
    services::{OrderWorkflow, StockLedger},
};

// --- Ordens ---

#[derive(Default)]
pub struct MemOrders {
    orders: Mutex<HashMap<Uuid, ServiceOrder>>,
}

impl MemOrders {
    pub fn get(&self, id: Uuid) -> Option<ServiceOrder> {
        self.orders.lock().unwrap().get(&id).cloned()
    }

    /// Reescreve o instante de envio do orçamento — os testes de expiração
    /// precisam de ordens "antigas".
    pub fn backdate_budget(&self, id: Uuid, submitted_at: DateTime<Utc>) {
        let mut orders = self.orders.lock().unwrap();
        let order = orders.get_mut(&id).expect("ordem inexistente no dublê");
        order.budget_submitted_at = Some(submitted_at);
    }
}

#[async_trait]
impl OrderRepository for MemOrders {
    async fn create(&self, order: &ServiceOrder) -> Result<(), AppError> {
        self.orders.lock().unwrap().insert(order.id, order.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<ServiceOrder>, AppError> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .get(&id)
            .filter(|o| o.active)
            .cloned())
    }

    async fn list_awaiting_approval(
        &self,
        submitted_before: DateTime<Utc>,
    ) -> Result<Vec<ServiceOrder>, AppError> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .values()
            .filter(|o| {
                o.active
                    && o.status == OrderStatus::AguardandoAprovacao
                    && o.budget_submitted_at
                        .map(|at| at < submitted_before)
                        .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn set_budget(
        &self,
        id: Uuid,
        amount: Decimal,
        submitted_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .get_mut(&id)
            .filter(|o| o.active)
            .ok_or(AppError::PersistenceFailure)?;
        order.budget_amount = Some(amount);
        order.budget_submitted_at = Some(submitted_at);
        order.status = OrderStatus::AguardandoAprovacao;
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn transition(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, AppError> {
        let mut orders = self.orders.lock().unwrap();
        match orders.get_mut(&id).filter(|o| o.active && o.status == from) {
            Some(order) => {
                order.status = to;
                order.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_status(&self, id: Uuid, status: OrderStatus) -> Result<(), AppError> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .get_mut(&id)
            .filter(|o| o.active)
            .ok_or(AppError::PersistenceFailure)?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn add_consumptions(&self, lines: &[StockConsumption]) -> Result<(), AppError> {
        let mut orders = self.orders.lock().unwrap();
        for line in lines {
            let order = orders
                .get_mut(&line.service_order_id)
                .ok_or(AppError::PersistenceFailure)?;
            order.consumed_items.push(line.clone());
        }
        Ok(())
    }

    async fn update_description(&self, id: Uuid, description: &str) -> Result<(), AppError> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .get_mut(&id)
            .filter(|o| o.active)
            .ok_or(AppError::PersistenceFailure)?;
        order.description = description.to_string();
        order.updated_at = Utc::now();
        Ok(())
    }
}

// --- Estoque ---

#[derive(Default)]
pub struct MemStock {
    items: Mutex<HashMap<Uuid, StockItem>>,
    alerts: Mutex<Vec<StockAlert>>,
}

impl MemStock {
    pub fn insert(&self, item: StockItem) {
        self.items.lock().unwrap().insert(item.id, item);
    }

    pub fn available(&self, id: Uuid) -> i32 {
        self.items
            .lock()
            .unwrap()
            .get(&id)
            .map(|i| i.quantity_available)
            .expect("insumo inexistente no dublê")
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.lock().unwrap().len()
    }
}

#[async_trait]
impl StockRepository for MemStock {
    async fn find(&self, id: Uuid) -> Result<Option<StockItem>, AppError> {
        Ok(self.items.lock().unwrap().get(&id).cloned())
    }

    async fn reserve(&self, id: Uuid, quantity: i32) -> Result<bool, AppError> {
        let mut items = self.items.lock().unwrap();
        match items.get_mut(&id) {
            Some(item) if item.quantity_available >= quantity => {
                item.quantity_available -= quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release(&self, id: Uuid, quantity: i32) -> Result<(), AppError> {
        let mut items = self.items.lock().unwrap();
        let item = items.get_mut(&id).ok_or(AppError::StockItemNotFound(id))?;
        item.quantity_available += quantity;
        Ok(())
    }

    async fn list_critical(&self) -> Result<Vec<StockItem>, AppError> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|i| i.is_critical())
            .cloned()
            .collect())
    }

    async fn alert_exists_on(&self, stock_item_id: Uuid, date: NaiveDate) -> Result<bool, AppError> {
        Ok(self
            .alerts
            .lock()
            .unwrap()
            .iter()
            .any(|a| a.stock_item_id == stock_item_id && a.created_at.date_naive() == date))
    }

    async fn record_alert(&self, alert: &StockAlert) -> Result<(), AppError> {
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

// --- Catálogo e usuários ---

#[derive(Default)]
pub struct MemCatalog {
    customers: Mutex<HashSet<Uuid>>,
    services: Mutex<HashMap<Uuid, Service>>,
}

impl MemCatalog {
    pub fn add_customer(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.customers.lock().unwrap().insert(id);
        id
    }

    pub fn add_service(&self, price: Decimal) -> Uuid {
        let id = Uuid::new_v4();
        self.services.lock().unwrap().insert(
            id,
            Service {
                id,
                name: "Revisão completa".to_string(),
                price,
            },
        );
        id
    }
}

#[async_trait]
impl CatalogRepository for MemCatalog {
    async fn customer_exists(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.customers.lock().unwrap().contains(&id))
    }

    async fn find_service(&self, id: Uuid) -> Result<Option<Service>, AppError> {
        Ok(self.services.lock().unwrap().get(&id).cloned())
    }
}

#[derive(Default)]
pub struct MemUsers {
    users: Mutex<Vec<User>>,
}

impl MemUsers {
    pub fn add(&self, email: Option<&str>, subscribed: bool) {
        self.users.lock().unwrap().push(User {
            id: Uuid::new_v4(),
            name: "Mecânico".to_string(),
            email: email.map(String::from),
            notify_stock_alerts: subscribed,
        });
    }
}

#[async_trait]
impl UserDirectory for MemUsers {
    async fn list_stock_alert_subscribers(&self) -> Result<Vec<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.notify_stock_alerts)
            .cloned()
            .collect())
    }
}

// --- Notificação e eventos ---

#[derive(Debug, Clone)]
pub struct SentMail {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentMail>>,
    fail: AtomicBool,
}

impl RecordingMailer {
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::NotificationFailure("SMTP indisponível".into()));
        }
        self.sent.lock().unwrap().push(SentMail {
            recipients: recipients.to_vec(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingBus {
    pub events: Mutex<Vec<DomainEvent>>,
}

impl RecordingBus {
    pub fn shortage_count(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, DomainEvent::StockShortage { .. }))
            .count()
    }

    pub fn cancelled_orders(&self) -> Vec<Uuid> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                DomainEvent::OrderCancelled { order_id } => Some(*order_id),
                _ => None,
            })
            .collect()
    }
}

impl EventBus for RecordingBus {
    fn publish(&self, event: DomainEvent) {
        self.events.lock().unwrap().push(event);
    }
}

// --- Montagem ---

pub struct Harness {
    pub orders: Arc<MemOrders>,
    pub stock: Arc<MemStock>,
    pub catalog: Arc<MemCatalog>,
    pub users: Arc<MemUsers>,
    pub mailer: Arc<RecordingMailer>,
    pub bus: Arc<RecordingBus>,
    pub ledger: StockLedger,
    pub workflow: OrderWorkflow,
}

pub fn harness() -> Harness {
    let orders = Arc::new(MemOrders::default());
    let stock = Arc::new(MemStock::default());
    let catalog = Arc::new(MemCatalog::default());
    let users = Arc::new(MemUsers::default());
    let mailer = Arc::new(RecordingMailer::default());
    let bus = Arc::new(RecordingBus::default());

    let ledger = StockLedger::new(stock.clone());
    let workflow = OrderWorkflow::new(
        orders.clone(),
        stock.clone(),
        catalog.clone(),
        ledger.clone(),
        bus.clone(),
    );

    Harness {
        orders,
        stock,
        catalog,
        users,
        mailer,
        bus,
        ledger,
        workflow,
    }
}

pub fn stock_item(name: &str, unit_price: Decimal, available: i32, minimum: i32) -> StockItem {
    let now = Utc::now();
    StockItem {
        id: Uuid::new_v4(),
        name: name.to_string(),
        unit_price,
        quantity_available: available,
        quantity_minimum: minimum,
        created_at: now,
        updated_at: now,
    }
}
