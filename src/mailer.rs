use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::Mailbox,
    transport::smtp::authentication::Credentials,
};

use crate::{config::MailConfig, models::ItemKind, money::amount_from_cents};

/// Everything the receipt email needs, captured at order time so the send
/// can run detached from the request.
#[derive(Debug, Clone)]
pub struct OrderReceipt {
    pub order_id: i32,
    pub username: String,
    pub email: String,
    pub status: String,
    pub items: Vec<ReceiptLine>,
    pub total_cents: i64,
}

#[derive(Debug, Clone)]
pub struct ReceiptLine {
    pub title: String,
    pub kind: ItemKind,
    pub quantity: i32,
    pub unit_price_cents: i64,
}

/// Best-effort SMTP sink for order receipts. Delivery is never part of the
/// request outcome: misconfiguration disables the mailer and transport
/// errors are swallowed after a debug log.
#[derive(Clone)]
pub struct Mailer {
    inner: Option<Transport>,
}

#[derive(Clone)]
struct Transport {
    smtp: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Mailer {
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn from_config(config: Option<&MailConfig>) -> Self {
        let Some(config) = config else {
            return Self::disabled();
        };

        let from = match config.from_addr.parse::<Mailbox>() {
            Ok(mailbox) => mailbox,
            Err(err) => {
                tracing::warn!(error = %err, "invalid SMTP_FROM address, mailer disabled");
                return Self::disabled();
            }
        };

        let smtp = match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host) {
            Ok(builder) => builder
                .port(config.port)
                .credentials(Credentials::new(
                    config.username.clone(),
                    config.password.clone(),
                ))
                .build(),
            Err(err) => {
                tracing::warn!(error = %err, "invalid SMTP relay, mailer disabled");
                return Self::disabled();
            }
        };

        Self {
            inner: Some(Transport { smtp, from }),
        }
    }

    pub async fn send_receipt(&self, receipt: &OrderReceipt) {
        let Some(transport) = &self.inner else {
            return;
        };

        let to = match receipt.email.parse::<Mailbox>() {
            Ok(mailbox) => mailbox,
            Err(err) => {
                tracing::debug!(error = %err, order_id = receipt.order_id, "bad recipient address");
                return;
            }
        };

        let message = Message::builder()
            .from(transport.from.clone())
            .to(to)
            .subject(format!("Your Bookstore Order #{}", receipt.order_id))
            .body(render_receipt(receipt));
        let message = match message {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(error = %err, order_id = receipt.order_id, "failed to build receipt");
                return;
            }
        };

        if let Err(err) = transport.smtp.send(message).await {
            tracing::debug!(error = %err, order_id = receipt.order_id, "receipt delivery failed");
        }
    }
}

fn render_receipt(receipt: &OrderReceipt) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Order ID: {}", receipt.order_id));
    lines.push(format!(
        "Customer: {} <{}>",
        receipt.username, receipt.email
    ));
    lines.push(format!("Status: {}", receipt.status));
    lines.push(String::new());
    lines.push("Items:".to_string());
    for item in &receipt.items {
        lines.push(format!(
            "- {} ({}) x {} @ {:.2}",
            item.title,
            item.kind,
            item.quantity,
            amount_from_cents(item.unit_price_cents)
        ));
    }
    lines.push(String::new());
    lines.push(format!(
        "Total: {:.2}",
        amount_from_cents(receipt.total_cents)
    ));
    lines.join("\n")
}
