use std::time::Duration;

use futures::future::try_join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{TicketError, TicketResult};

use super::state::TokenId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenResource {
    pub uri: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenAttribute {
    pub value: Value,
}

/// Per-ticket metadata document. The first three attributes are the gate,
/// row and seat.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    #[serde(default)]
    pub resources: Vec<TokenResource>,
    #[serde(default)]
    pub attributes: Vec<TokenAttribute>,
}

impl TokenMetadata {
    pub fn image_uri(&self) -> Option<&str> {
        self.resources.first().map(|resource| resource.uri.as_str())
    }

    pub fn gate(&self) -> Option<String> {
        self.attribute(0)
    }

    pub fn row(&self) -> Option<String> {
        self.attribute(1)
    }

    pub fn seat(&self) -> Option<String> {
        self.attribute(2)
    }

    fn attribute(&self, index: usize) -> Option<String> {
        self.attributes.get(index).map(|attr| match &attr.value {
            Value::String(value) => value.clone(),
            other => other.to_string(),
        })
    }
}

#[derive(Clone, Debug)]
pub struct MetadataFetcher {
    client: Client,
}

impl MetadataFetcher {
    pub fn new(timeout: Duration) -> TicketResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TicketError::Config(format!("unable to build http client: {err}")))?;
        Ok(Self { client })
    }

    /// Fetches every document concurrently. The first failure fails the
    /// whole batch; results keep the order of `token_ids`.
    pub async fn fetch_all(
        &self,
        base_uri: &str,
        token_ids: &[TokenId],
    ) -> TicketResult<Vec<TokenMetadata>> {
        if token_ids.is_empty() {
            return Ok(Vec::new());
        }
        let requests = token_ids
            .iter()
            .map(|id| self.fetch_one(format!("{base_uri}{id}")));
        try_join_all(requests).await
    }

    async fn fetch_one(&self, uri: String) -> TicketResult<TokenMetadata> {
        debug!(%uri, "fetching ticket metadata");
        let result = async {
            let response = self.client.get(&uri).send().await?.error_for_status()?;
            response.json::<TokenMetadata>().await
        }
        .await;
        result.map_err(|err| {
            warn!(%uri, error = %err, "ticket metadata fetch failed");
            TicketError::MetadataFetch(format!("{uri}: {err}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_positional_attributes() {
        let metadata: TokenMetadata = serde_json::from_value(json!({
            "name": "Ticket #7",
            "resources": [{ "uri": "https://img.example/7.png" }],
            "attributes": [{ "value": "B" }, { "value": 12 }, { "value": "34" }]
        }))
        .unwrap();
        assert_eq!(metadata.image_uri(), Some("https://img.example/7.png"));
        assert_eq!(metadata.gate().as_deref(), Some("B"));
        assert_eq!(metadata.row().as_deref(), Some("12"));
        assert_eq!(metadata.seat().as_deref(), Some("34"));
    }

    #[test]
    fn missing_attributes_are_none() {
        let metadata: TokenMetadata =
            serde_json::from_value(json!({ "name": "Bare" })).unwrap();
        assert_eq!(metadata.image_uri(), None);
        assert_eq!(metadata.seat(), None);
    }

    #[tokio::test]
    async fn empty_id_list_skips_requests() {
        let fetcher = MetadataFetcher::new(Duration::from_secs(1)).unwrap();
        // Nothing listens on this base; any request would fail.
        let result = fetcher.fetch_all("http://127.0.0.1:1/", &[]).await.unwrap();
        assert!(result.is_empty());
    }
}
