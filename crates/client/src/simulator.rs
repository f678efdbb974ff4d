//! Remote simulation runner.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::retry::with_retry;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use topotrace_types::SimulationResult;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// JSON body returned by the simulation service.
#[derive(Debug, Deserialize)]
struct SimulateResponse {
    success: bool,
    #[serde(default)]
    trace: Option<String>,
    /// Hex-encoded animation artifact.
    #[serde(default)]
    animation_hex: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for the remote simulator.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct SimulatorClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl SimulatorClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run a script and fold every failure into the result.
    ///
    /// Never returns an error: a failed run is a `SimulationResult` with
    /// `success == false` and a message.
    pub async fn run(
        &self,
        script_name: &str,
        script: &[u8],
        cancel: &CancellationToken,
    ) -> SimulationResult {
        match self.try_run(script_name, script, cancel).await {
            Ok(result) => result,
            Err(e) => {
                warn!(script = script_name, error = %e, "Simulation request failed");
                SimulationResult::failed(e.to_string())
            }
        }
    }

    /// Upload a script as multipart form data and wait for the outcome.
    pub async fn try_run(
        &self,
        script_name: &str,
        script: &[u8],
        cancel: &CancellationToken,
    ) -> Result<SimulationResult, ClientError> {
        debug!(
            endpoint = %self.config.endpoint,
            script = script_name,
            bytes = script.len(),
            "Submitting simulation"
        );
        let body = with_retry(&self.config.retry, cancel, "simulate", |_| {
            self.post_script(script_name, script)
        })
        .await?;

        let result = decode_response(&body)?;
        info!(
            success = result.success,
            trace_bytes = result.trace_text.as_ref().map_or(0, String::len),
            "Simulation finished"
        );
        Ok(result)
    }

    async fn post_script(&self, script_name: &str, script: &[u8]) -> Result<String, ClientError> {
        let part = Part::bytes(script.to_vec())
            .file_name(script_name.to_string())
            .mime_str("application/octet-stream")?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(&self.config.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

/// Turn a service response body into a result.
fn decode_response(body: &str) -> Result<SimulationResult, ClientError> {
    let response: SimulateResponse =
        serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()))?;

    if !response.success {
        let message = response
            .error
            .unwrap_or_else(|| "simulation reported failure".to_string());
        return Ok(SimulationResult::failed(message));
    }

    let artifact = match response.animation_hex {
        Some(hex_text) => Some(
            hex::decode(hex_text.trim())
                .map_err(|e| ClientError::Decode(format!("animation artifact: {e}")))?,
        ),
        None => None,
    };
    Ok(SimulationResult::succeeded(response.trace, artifact))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_success() {
        let body = r#"{"success": true, "trace": "n -s 0\n", "animation_hex": "6e616d"}"#;
        let result = decode_response(body).unwrap();
        assert!(result.success);
        assert_eq!(result.trace_text.as_deref(), Some("n -s 0\n"));
        assert_eq!(result.animation_artifact.as_deref(), Some(&b"nam"[..]));
        assert!(result.error_message.is_none());
    }

    #[test]
    fn test_decode_reported_failure() {
        let body = r#"{"success": false, "error": "script error at line 3"}"#;
        let result = decode_response(body).unwrap();
        assert!(!result.success);
        assert_eq!(
            result.error_message.as_deref(),
            Some("script error at line 3")
        );
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            decode_response("<html>"),
            Err(ClientError::Decode(_))
        ));
        assert!(matches!(
            decode_response(r#"{"success": true, "animation_hex": "zz"}"#),
            Err(ClientError::Decode(_))
        ));
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        assert!(matches!(
            SimulatorClient::new(ClientConfig::new("ftp://sim")),
            Err(ClientError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_run_reports_failure() {
        let client =
            SimulatorClient::new(ClientConfig::new("http://127.0.0.1:9/simulate")).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = client.run("topology.tcl", b"set ns [new Simulator]", &cancel).await;
        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("request cancelled"));
    }
}
