pub mod account;
pub mod request;
pub mod truck;

use serde::de::DeserializeOwned;

/// Connection details shared by every command.
pub struct Session {
    endpoint: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl Session {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn get(&self, path: &str) -> anyhow::Result<reqwest::RequestBuilder> {
        Ok(self.client.get(self.url(path)).bearer_auth(self.token()?))
    }

    pub fn post(&self, path: &str) -> anyhow::Result<reqwest::RequestBuilder> {
        Ok(self.client.post(self.url(path)).bearer_auth(self.token()?))
    }

    fn token(&self) -> anyhow::Result<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("no token: run `agrimove login` and set AGRIMOVE_TOKEN"))
    }
}

/// Decodes a success body, or turns the server's `detail` into an error.
pub async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> anyhow::Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let body: serde_json::Value = response.json().await.unwrap_or_default();
    let detail = body["detail"].as_str().unwrap_or("request failed");
    match body["fields"].as_array() {
        Some(fields) => {
            let fields: Vec<String> = fields
                .iter()
                .map(|f| {
                    format!(
                        "{} {}",
                        f["field"].as_str().unwrap_or("?"),
                        f["message"].as_str().unwrap_or("")
                    )
                })
                .collect();
            anyhow::bail!("{} ({}): {}", detail, status, fields.join(", "))
        }
        None => anyhow::bail!("{} ({})", detail, status),
    }
}

pub(crate) fn display_option(o: &Option<String>) -> String {
    o.clone().unwrap_or_else(|| "-".to_string())
}
