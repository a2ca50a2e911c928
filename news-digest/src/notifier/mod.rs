pub mod dingtalk;
pub mod transport;

pub use dingtalk::DingTalkPayload;
pub use transport::{ReqwestTransport, TransportResponse, WebhookTransport};

use crate::types::{DigestError, DigestMessage, Result};
use serde_json::{json, Value};
use tracing::{error, info, warn};

const BUTTON_TITLE: &str = "Read more";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// Unknown receiver; gets the flattened JSON payload.
    Generic,
    /// DingTalk robot webhook; accepts Markdown and action-card shapes.
    DingTalk,
}

/// A delivery target, classified once when configuration is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub kind: EndpointKind,
    pub url: String,
}

impl Destination {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        match dingtalk::robot_url(raw) {
            Some(url) => Some(Self {
                kind: EndpointKind::DingTalk,
                url,
            }),
            None => Some(Self {
                kind: EndpointKind::Generic,
                url: raw.to_string(),
            }),
        }
    }

    /// URL with query values masked, safe for logs.
    pub fn redacted(&self) -> String {
        match self.url.split_once('?') {
            Some((base, query)) => {
                let masked: Vec<String> = query
                    .split('&')
                    .map(|pair| match pair.split_once('=') {
                        Some((key, _)) => format!("{}=***", key),
                        None => pair.to_string(),
                    })
                    .collect();
                format!("{}?{}", base, masked.join("&"))
            }
            None => self.url.clone(),
        }
    }
}

/// Splits a comma-separated destination list, skipping blanks.
pub fn parse_destinations(raw: &str) -> Vec<Destination> {
    raw.split(',').filter_map(Destination::parse).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// `verified` is false when only the HTTP status vouches for the result,
    /// as with the generic payload sent to a DingTalk robot.
    Delivered { shape: String, verified: bool },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationReport {
    pub destination: String,
    pub outcome: DeliveryOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// True when no destination was configured and the message went to stdout.
    pub printed: bool,
    pub destinations: Vec<DestinationReport>,
}

impl DeliveryReport {
    pub fn delivered(&self) -> usize {
        self.destinations
            .iter()
            .filter(|d| matches!(d.outcome, DeliveryOutcome::Delivered { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.destinations.len() - self.delivered()
    }
}

/// Flattens a message into one plain-text block for unknown receivers.
pub fn flatten_message(message: &DigestMessage) -> String {
    let mut text = format!("{}\n\n{}", message.title, message.text);
    if let Some(image) = &message.image_url {
        text.push_str(&format!("\n\nImage: {}", image));
    }
    if let Some(link) = &message.action_url {
        text.push_str(&format!("\n\nLink: {}", link));
    }
    text
}

/// The same text under every key common receivers look for.
pub fn generic_payload(message: &DigestMessage) -> Value {
    let text = flatten_message(message);
    json!({
        "content": text,
        "text": text,
        "message": text,
    })
}

pub struct Dispatcher {
    destinations: Vec<Destination>,
    transport: Box<dyn WebhookTransport>,
}

impl Dispatcher {
    pub fn new(destinations: Vec<Destination>, transport: Box<dyn WebhookTransport>) -> Self {
        Self {
            destinations,
            transport,
        }
    }

    /// Delivers to every destination. Never fails: outcomes are reported.
    pub async fn send(&self, message: &DigestMessage) -> DeliveryReport {
        if self.destinations.is_empty() {
            warn!("No notifier destination configured, printing digest instead");
            print_to_console(message);
            return DeliveryReport {
                printed: true,
                destinations: Vec::new(),
            };
        }

        let mut report = DeliveryReport::default();
        for destination in &self.destinations {
            let outcome = self.deliver(destination, message).await;
            match &outcome {
                DeliveryOutcome::Delivered { shape, verified: true } => {
                    info!("Delivered digest to {} as {}", destination.redacted(), shape)
                }
                DeliveryOutcome::Delivered { shape, verified: false } => warn!(
                    "Posted {} payload to {}, but the robot reply was not checked and may be a rejection",
                    shape,
                    destination.redacted()
                ),
                DeliveryOutcome::Failed { reason } => {
                    error!("Delivery to {} failed: {}", destination.redacted(), reason)
                }
            }
            report.destinations.push(DestinationReport {
                destination: destination.redacted(),
                outcome,
            });
        }
        report
    }

    async fn deliver(&self, destination: &Destination, message: &DigestMessage) -> DeliveryOutcome {
        if destination.kind == EndpointKind::DingTalk {
            match self.send_dingtalk(destination, message).await {
                Ok(shape) => {
                    return DeliveryOutcome::Delivered {
                        shape: shape.to_string(),
                        verified: true,
                    }
                }
                Err(e) => warn!(
                    "DingTalk delivery to {} failed, falling back to plain payload: {}",
                    destination.redacted(),
                    e
                ),
            }
        }

        match self.send_generic(destination, message).await {
            Ok(()) => DeliveryOutcome::Delivered {
                shape: "generic".to_string(),
                // DingTalk answers 200 with an errcode to payloads it rejects.
                verified: destination.kind == EndpointKind::Generic,
            },
            Err(e) => DeliveryOutcome::Failed { reason: e.to_string() },
        }
    }

    async fn send_dingtalk(&self, destination: &Destination, message: &DigestMessage) -> Result<&'static str> {
        let payload = DingTalkPayload::for_message(message, BUTTON_TITLE);
        let body = serde_json::to_value(&payload)?;
        let response = self.transport.post_json(&destination.url, &body).await?;
        dingtalk::check_reply(response.status, &response.body)?;
        Ok(payload.shape_name())
    }

    async fn send_generic(&self, destination: &Destination, message: &DigestMessage) -> Result<()> {
        let response = self
            .transport
            .post_json(&destination.url, &generic_payload(message))
            .await?;
        if !response.is_success() {
            return Err(DigestError::Webhook(format!(
                "HTTP {}: {}",
                response.status,
                response.body.chars().take(200).collect::<String>()
            )));
        }
        Ok(())
    }
}

fn print_to_console(message: &DigestMessage) {
    println!("{}", "-".repeat(30));
    println!("[{}]", message.title);
    println!("{}", message.text);
    if let Some(image) = &message.image_url {
        println!("Image: {}", image);
    }
    if let Some(link) = &message.action_url {
        println!("Link: {}", link);
    }
    println!("{}", "-".repeat(30));
}
