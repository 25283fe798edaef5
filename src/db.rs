pub mod catalog_repo;
pub mod order_repo;
pub mod stock_repo;
pub mod user_repo;

pub use catalog_repo::{CatalogRepository, PgCatalogRepository};
pub use order_repo::{OrderRepository, PgOrderRepository};
pub use stock_repo::{PgStockRepository, StockRepository};
pub use user_repo::{PgUserDirectory, UserDirectory};
