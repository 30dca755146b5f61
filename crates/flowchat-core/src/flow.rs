use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::config::{Settings, Tweaks};
use crate::error::{FlowError, FlowResult};

#[derive(Serialize, Debug)]
struct FlowRequest<'a> {
    input_value: &'a str,
    output_type: &'static str,
    input_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tweaks: Option<&'a Tweaks>,
}

impl<'a> FlowRequest<'a> {
    fn chat(message: &'a str, tweaks: &'a Tweaks) -> Self {
        Self {
            input_value: message,
            output_type: "chat",
            input_type: "chat",
            tweaks: (!tweaks.is_empty()).then_some(tweaks),
        }
    }
}

/// Client for the flow "run" endpoint.
#[derive(Clone)]
pub struct FlowClient {
    client: Client,
    settings: Settings,
}

impl FlowClient {
    pub fn new(settings: Settings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn run_url(&self, flow_id: &str) -> String {
        format!(
            "{}/lf/{}/api/v1/run/{}",
            self.settings.base_url, self.settings.tenant_id, flow_id
        )
    }

    /// Send one message to a flow and extract the chat reply.
    ///
    /// `endpoint` defaults to the configured flow id and `tweaks` to the
    /// configured tweaks. An explicitly empty tweak map sends none.
    pub async fn run_flow(
        &self,
        message: &str,
        endpoint: Option<&str>,
        tweaks: Option<&Tweaks>,
    ) -> FlowResult {
        let result = self.send(message, endpoint, tweaks).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "Flow request failed");
        }
        result
    }

    async fn send(
        &self,
        message: &str,
        endpoint: Option<&str>,
        tweaks: Option<&Tweaks>,
    ) -> FlowResult {
        let url = self.run_url(endpoint.unwrap_or(&self.settings.flow_id));
        let request = FlowRequest::chat(message, tweaks.unwrap_or(&self.settings.tweaks));
        tracing::debug!(%url, tweaks = request.tweaks.map_or(0, |t| t.len()), "Running flow");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.settings.application_token)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(FlowError::Http { status, body });
        }

        let text = response.text().await?;
        tracing::info!(body = %text, "Raw response");

        let json: Value = serde_json::from_str(&text)?;
        extract_reply(&json)
    }
}

/// Pull `outputs[0].outputs[0].results.message.text` out of a run response.
pub fn extract_reply(json: &Value) -> FlowResult {
    let first_output = json
        .get("outputs")
        .and_then(Value::as_array)
        .and_then(|outputs| outputs.first())
        .ok_or(FlowError::UnexpectedStructure)?;

    let inner = first_output
        .get("outputs")
        .and_then(Value::as_array)
        .and_then(|outputs| outputs.first())
        .ok_or(FlowError::UnexpectedStructure)?;

    let results = inner
        .get("results")
        .ok_or(FlowError::MissingField("results"))?;
    let message = results
        .get("message")
        .ok_or(FlowError::MissingField("results.message"))?;
    message
        .get("text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(FlowError::MissingField("results.message.text"))
}
