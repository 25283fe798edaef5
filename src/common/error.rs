use thiserror::Error;
use uuid::Uuid;

use crate::models::stock::StockShortage;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
//
// A taxonomia importa para o host: `NotFound`/`InvalidState` são erros do
// cliente, corrigíveis; `InsufficientStock` carrega as linhas recusadas;
// `PersistenceFailure`/`DatabaseError` são falhas do servidor.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Ordem de serviço não encontrada")]
    OrderNotFound,

    #[error("Cliente não encontrado")]
    CustomerNotFound,

    #[error("Serviço não encontrado")]
    ServiceNotFound,

    #[error("Insumo não encontrado no estoque: {0}")]
    StockItemNotFound(Uuid),

    // Pré-condição do fluxo violada (status errado, orçamento expirado).
    #[error("Estado inválido: {0}")]
    InvalidState(&'static str),

    #[error("Estoque insuficiente para {} insumo(s)", .0.len())]
    InsufficientStock(Vec<StockShortage>),

    // Commit sem linhas afetadas é tratado igual a uma exceção de escrita.
    #[error("Falha ao persistir alterações")]
    PersistenceFailure,

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Falha ao enviar notificação: {0}")]
    NotificationFailure(String),
}

impl AppError {
    /// Linhas recusadas por falta de saldo, quando o erro é `InsufficientStock`.
    pub fn shortages(&self) -> Option<&[StockShortage]> {
        match self {
            AppError::InsufficientStock(lines) => Some(lines),
            _ => None,
        }
    }
}
