//! Posting messages to the messaging endpoint
//!
//! The endpoint's status code is split three ways: delivered, rejected (the
//! same request will never succeed) and unavailable (try the invocation again).

use reqwest::StatusCode;
use serde::Serialize;
use tracing::{error, info};

/// Normalized outbound chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub channel: String,
    pub text: String,
    /// Thread to reply under; omitted for a top-level post
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// 4xx: the request itself is at fault
    RejectedByEndpoint(String),
    /// 5xx or no response at all
    EndpointUnavailable(String),
}

impl DeliveryOutcome {
    pub fn from_status(status: StatusCode) -> Self {
        let code = status.as_u16();
        let reason = status.canonical_reason().unwrap_or("Unknown");
        if code < 400 {
            DeliveryOutcome::Delivered
        } else if code < 500 {
            DeliveryOutcome::RejectedByEndpoint(format!(
                "Error posting message to Slack API: {} - {}",
                code, reason
            ))
        } else {
            DeliveryOutcome::EndpointUnavailable(format!(
                "Server error when processing message: {} - {}",
                code, reason
            ))
        }
    }
}

#[derive(Clone)]
pub struct DeliveryClient {
    client: reqwest::Client,
    hook_url: String,
    authorization: Option<String>,
}

impl DeliveryClient {
    pub fn new(client: reqwest::Client, hook_url: String, authorization: Option<String>) -> Self {
        Self {
            client,
            hook_url,
            authorization,
        }
    }

    /// Send `message` once and classify the answer
    pub async fn deliver(&self, message: &OutboundMessage) -> DeliveryOutcome {
        info!(channel = %message.channel, threaded = message.thread_ts.is_some(), "Start post message");
        let mut request = self.client.post(&self.hook_url).json(message);
        if let Some(authorization) = &self.authorization {
            request = request.header(reqwest::header::AUTHORIZATION, authorization.as_str());
        }

        let outcome = match request.send().await {
            Ok(response) => DeliveryOutcome::from_status(response.status()),
            Err(e) => DeliveryOutcome::EndpointUnavailable(format!(
                "Server error when processing message: {}",
                e
            )),
        };

        match &outcome {
            DeliveryOutcome::Delivered => info!("Message posted successfully"),
            DeliveryOutcome::RejectedByEndpoint(reason)
            | DeliveryOutcome::EndpointUnavailable(reason) => error!("{}", reason),
        }
        outcome
    }
}

impl std::fmt::Debug for DeliveryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryClient")
            .field("hook_url", &self.hook_url)
            .field("authorization", &self.authorization.as_ref().map(|_| "***"))
            .finish()
    }
}
