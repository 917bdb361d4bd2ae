// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Remote status/command API client.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ChannelError;
use crate::event::DeviceKey;

use super::SignedHeaders;
use super::status_code;

// ============================================================================
// ApiConfig - Configuration for the remote API
// ============================================================================

/// Configuration for the remote status/command API.
///
/// # Examples
///
/// ```
/// use homesync_lib::channel::ApiConfig;
/// use std::time::Duration;
///
/// let config = ApiConfig::new("https://api.example.com/v1.1", "token", "secret")
///     .with_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct ApiConfig {
    base_url: String,
    token: String,
    secret: String,
    timeout: Duration,
}

impl ApiConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a new API configuration.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the remote API, without a trailing slash
    /// * `token` - The account identity token
    /// * `secret` - The account signing secret
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            token: token.into(),
            secret: secret.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Creates an [`ApiClient`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn into_client(self) -> Result<ApiClient, ChannelError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ChannelError::Http)?;

        Ok(ApiClient {
            base_url: self.base_url,
            token: self.token,
            secret: self.secret,
            client,
        })
    }
}

// ============================================================================
// ApiClient
// ============================================================================

/// HTTP client for the signed remote status/command endpoint.
///
/// Every request carries the signed header tuple
/// (`Authorization`/`sign`/`nonce`/`t`); success requires both an HTTP
/// 2xx and an envelope status code in the documented success set.
///
/// # Examples
///
/// ```no_run
/// use homesync_lib::channel::ApiConfig;
/// use homesync_lib::DeviceKey;
///
/// # async fn example() -> homesync_lib::Result<()> {
/// let client = ApiConfig::new("https://api.example.com/v1.1", "token", "secret")
///     .into_client()?;
/// let envelope = client.fetch_status(&DeviceKey::new("AABBCCDDEEFF")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    token: String,
    secret: String,
    client: Client,
}

impl ApiClient {
    /// Returns the base URL of the remote API.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the current status of a device.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError` on transport failure, HTTP-level rejection,
    /// or an unparseable envelope. An envelope with a non-success status
    /// code is returned as `Ok`; callers classify the code.
    pub async fn fetch_status(&self, key: &DeviceKey) -> Result<ResponseEnvelope, ChannelError> {
        let url = format!(
            "{}/devices/{}/status",
            self.base_url,
            urlencoding::encode(key.as_str())
        );
        tracing::debug!(url = %url, "Fetching device status");

        let headers = SignedHeaders::generate(&self.token, &self.secret);
        let response = self
            .client
            .get(&url)
            .header("Authorization", headers.token.as_str())
            .header("sign", headers.signature.as_str())
            .header("nonce", headers.nonce.as_str())
            .header("t", headers.timestamp.to_string())
            .send()
            .await
            .map_err(ChannelError::Http)?;

        Self::parse_envelope(response).await
    }

    /// Sends a command to a device.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError` on transport failure, HTTP-level rejection,
    /// or an unparseable envelope.
    pub async fn send_command(
        &self,
        key: &DeviceKey,
        command: &RemoteCommand,
    ) -> Result<ResponseEnvelope, ChannelError> {
        let url = format!(
            "{}/devices/{}/commands",
            self.base_url,
            urlencoding::encode(key.as_str())
        );
        tracing::debug!(url = %url, command = %command.command, "Sending device command");

        let headers = SignedHeaders::generate(&self.token, &self.secret);
        let response = self
            .client
            .post(&url)
            .header("Authorization", headers.token.as_str())
            .header("sign", headers.signature.as_str())
            .header("nonce", headers.nonce.as_str())
            .header("t", headers.timestamp.to_string())
            .json(command)
            .send()
            .await
            .map_err(ChannelError::Http)?;

        Self::parse_envelope(response).await
    }

    async fn parse_envelope(response: reqwest::Response) -> Result<ResponseEnvelope, ChannelError> {
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ChannelError::AuthenticationFailed);
        }

        if !response.status().is_success() {
            return Err(ChannelError::ConnectionFailed(format!(
                "HTTP {} - {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        let envelope: ResponseEnvelope = response.json().await.map_err(ChannelError::Http)?;
        tracing::debug!(code = envelope.status_code, "Received response envelope");
        Ok(envelope)
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// An outbound command request body.
///
/// # Examples
///
/// ```
/// use homesync_lib::channel::RemoteCommand;
///
/// let cmd = RemoteCommand::new("setBrightness", "80");
/// assert_eq!(cmd.command, "setBrightness");
/// assert_eq!(cmd.command_type, "command");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCommand {
    /// The command name (e.g. `turnOn`, `setBrightness`).
    pub command: String,
    /// The command parameter, `"default"` when the command takes none.
    pub parameter: String,
    /// The command class; `"command"` for standard device commands.
    #[serde(rename = "commandType")]
    pub command_type: String,
}

impl RemoteCommand {
    /// Creates a standard command with a parameter.
    #[must_use]
    pub fn new(command: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            parameter: parameter.into(),
            command_type: "command".to_string(),
        }
    }

    /// Creates a standard command with no parameter.
    #[must_use]
    pub fn bare(command: impl Into<String>) -> Self {
        Self::new(command, "default")
    }
}

/// The response envelope wrapping every remote-API reply.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseEnvelope {
    /// The envelope-level status code (distinct from the HTTP status).
    #[serde(rename = "statusCode")]
    pub status_code: i64,
    /// The payload body; an empty object when the reply carries none.
    #[serde(default)]
    pub body: serde_json::Value,
    /// Optional human-readable message.
    #[serde(default)]
    pub message: Option<String>,
}

impl ResponseEnvelope {
    /// Returns `true` if the envelope status code is in the success set.
    #[must_use]
    pub fn is_success(&self) -> bool {
        status_code::is_success(self.status_code)
    }

    /// Converts a non-success envelope into a [`ChannelError::Remote`].
    ///
    /// # Errors
    ///
    /// Returns the error form of this envelope if it is not a success.
    pub fn into_result(self) -> Result<Self, ChannelError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ChannelError::Remote {
                code: self.status_code,
                description: status_code::describe(self.status_code),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_strips_trailing_slash() {
        let config = ApiConfig::new("https://api.example.com/v1.1/", "t", "s");
        assert_eq!(config.base_url(), "https://api.example.com/v1.1");
    }

    #[test]
    fn remote_command_serializes_with_camel_case_type() {
        let cmd = RemoteCommand::new("setBrightness", "80");
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "command": "setBrightness",
                "parameter": "80",
                "commandType": "command"
            })
        );
    }

    #[test]
    fn envelope_parses_with_missing_body() {
        let envelope: ResponseEnvelope =
            serde_json::from_str(r#"{"statusCode": 100}"#).unwrap();
        assert!(envelope.is_success());
        assert!(envelope.message.is_none());
    }

    #[test]
    fn envelope_into_result_maps_failure_codes() {
        let envelope: ResponseEnvelope =
            serde_json::from_str(r#"{"statusCode": 152, "message": "no such device"}"#).unwrap();
        let err = envelope.into_result().unwrap_err();
        assert!(matches!(err, ChannelError::Remote { code: 152, .. }));
    }

    #[test]
    fn envelope_success_codes() {
        for code in [100, 200] {
            let envelope = ResponseEnvelope {
                status_code: code,
                body: serde_json::Value::Null,
                message: None,
            };
            assert!(envelope.into_result().is_ok());
        }
    }
}
