pub mod critical_stock;
pub mod expired_budget;
pub mod scheduler;

pub use critical_stock::CriticalStockReconciler;
pub use expired_budget::ExpiredBudgetReconciler;
pub use scheduler::JobScheduler;
