use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::{upstream_error, AccessTokenSource};
use crate::providers::{DocumentStore, ProviderError, ProviderResult};

/// Typed document value in the REST wire format
fn to_firestore_value(value: Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            // 64-bit integers travel as strings
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.into_iter().map(to_firestore_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": fields(map) } }),
    }
}

fn fields(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(key, value)| (key, to_firestore_value(value)))
        .collect()
}

/// Convert a JSON object into a document `fields` map
fn to_firestore_fields(data: Value) -> ProviderResult<Map<String, Value>> {
    match data {
        Value::Object(map) => Ok(fields(map)),
        _ => Err(ProviderError::InvalidDocument),
    }
}

/// Document store backed by the managed document database
pub struct FirestoreDocumentStore {
    http: reqwest::Client,
    documents_url: String,
    tokens: Arc<AccessTokenSource>,
}

impl FirestoreDocumentStore {
    pub fn new(
        http: reqwest::Client,
        endpoint: &str,
        project_id: &str,
        tokens: Arc<AccessTokenSource>,
    ) -> Self {
        Self {
            http,
            documents_url: format!(
                "{}/v1/projects/{}/databases/(default)/documents",
                endpoint.trim_end_matches('/'),
                project_id
            ),
            tokens,
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreDocumentStore {
    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> ProviderResult<()> {
        let fields = to_firestore_fields(data)?;
        let token = self.tokens.token().await?;

        // PATCH without an update mask replaces the whole document
        let response = self
            .http
            .patch(format!("{}/{}/{}", self.documents_url, collection, id))
            .bearer_auth(token)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error(response).await);
        }

        tracing::debug!("Document written: {}/{}", collection, id);
        Ok(())
    }
}
