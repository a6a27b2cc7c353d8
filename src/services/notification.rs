// src/services/notification.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::booking::Booking;

// Dados que o aviso precisa (copiados da reserva já gravada)
#[derive(Debug, Clone, PartialEq)]
pub struct BookingNotification {
    pub email: String,
    pub name: String,
    pub service_name: String,
    pub slot_time: DateTime<Utc>,
    pub deposit_paid: Decimal,
}

impl From<&Booking> for BookingNotification {
    fn from(booking: &Booking) -> Self {
        Self {
            email: booking.customer_email.clone(),
            name: booking.customer_name.clone(),
            service_name: booking.service_name.clone(),
            slot_time: booking.slot_time,
            deposit_paid: booking.deposit_paid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Confirmed,
    Cancelled,
}

/// Canal de aviso ao cliente (e-mail, SMS...). Melhor esforço: um erro aqui
/// nunca desfaz nem altera a reserva.
#[async_trait]
pub trait BookingNotifier: Send + Sync {
    async fn booking_confirmed(&self, notification: &BookingNotification) -> anyhow::Result<()>;
    async fn booking_cancelled(&self, notification: &BookingNotification) -> anyhow::Result<()>;
}

// Implementação padrão: só registra no log
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl BookingNotifier for LogNotifier {
    async fn booking_confirmed(&self, n: &BookingNotification) -> anyhow::Result<()> {
        tracing::info!(
            to = %n.email,
            service = %n.service_name,
            slot_time = %n.slot_time.format("%Y-%m-%d %H:%M"),
            deposit = %n.deposit_paid,
            "📧 Confirmação de reserva para {}",
            n.name
        );
        Ok(())
    }

    async fn booking_cancelled(&self, n: &BookingNotification) -> anyhow::Result<()> {
        tracing::info!(
            to = %n.email,
            service = %n.service_name,
            slot_time = %n.slot_time.format("%Y-%m-%d %H:%M"),
            "📧 Cancelamento de reserva para {}",
            n.name
        );
        Ok(())
    }
}

/// Dispara o aviso numa task separada, DEPOIS do commit.
/// Quem chama não espera e não fica sabendo se falhou.
pub fn dispatch(
    notifier: Arc<dyn BookingNotifier>,
    kind: NotificationKind,
    notification: BookingNotification,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let result = match kind {
            NotificationKind::Confirmed => notifier.booking_confirmed(&notification).await,
            NotificationKind::Cancelled => notifier.booking_cancelled(&notification).await,
        };
        if let Err(e) = result {
            tracing::warn!(
                to = %notification.email,
                kind = ?kind,
                "Falha ao enviar aviso de reserva: {:#}",
                e
            );
        }
    })
}
