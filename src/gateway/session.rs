//! MQTT session control.
//!
//! Start and stop for one logical session must never be in flight at the
//! same time. The lock lives in [`GatewayClient`] so every handle and every
//! raw `mqtt_start`/`mqtt_stop` call made through the same client (or its
//! clones) waits for the previous transition to come back from the backend.
//! Status polls bypass the lock.

use crate::gateway::client::GatewayClient;
use crate::gateway::error::GatewayError;
use crate::gateway::types::{SessionStatus, Transition};

/// Handle on the backend's MQTT session.
#[derive(Debug, Clone)]
pub struct MqttSession {
    client: GatewayClient,
}

impl MqttSession {
    pub fn new(client: GatewayClient) -> Self {
        Self { client }
    }

    /// Start the session. Returns `AlreadyRunning` rather than failing when
    /// the session is up.
    pub async fn start(&self) -> Result<Transition, GatewayError> {
        let outcome = self.client.mqtt_start().await?;
        tracing::info!(outcome = ?outcome, "MQTT session start");
        Ok(outcome)
    }

    /// Stop the session. Returns `NotRunning` when there is nothing to stop.
    pub async fn stop(&self) -> Result<Transition, GatewayError> {
        let outcome = self.client.mqtt_stop().await?;
        tracing::info!(outcome = ?outcome, "MQTT session stop");
        Ok(outcome)
    }

    /// Current session state. Never waits on a pending transition.
    pub async fn status(&self) -> Result<SessionStatus, GatewayError> {
        self.client.mqtt_status().await
    }
}
