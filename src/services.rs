pub mod budget;
pub mod order_workflow;
pub mod stock_ledger;

pub use order_workflow::OrderWorkflow;
pub use stock_ledger::StockLedger;
