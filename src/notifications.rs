// src/notifications.rs

use async_trait::async_trait;

use crate::common::error::AppError;

/// Transporte de e-mail — colaborador externo. Falhas de envio sobem como
/// `NotificationFailure` e quem chamou decide o que fazer.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, recipients: &[String], subject: &str, body: &str)
    -> Result<(), AppError>;
}

/// Implementação de desenvolvimento: só registra no log. O transporte SMTP
/// de verdade vive no host.
#[derive(Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), AppError> {
        tracing::info!(
            destinatarios = recipients.len(),
            assunto = subject,
            "E-mail (log): {}",
            body
        );
        Ok(())
    }
}
