//! Live adapter for the `DocumentStore` port over the Firestore REST API.
//!
//! Talks to `firestore.googleapis.com` (or a local emulator) using the
//! v1 REST surface: paginated document listing, merge-updates with an
//! update mask, and `runQuery` for equality lookups. Values cross the
//! wire in Firestore's typed-value envelope; the codec at the bottom of
//! this file translates to and from plain JSON so the rest of the crate
//! never sees wire types.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::config::StoreConfig;
use crate::ports::{Document, DocumentStore, Snapshot, StoreError};

/// Live Firestore client.
///
/// Owns a current-thread tokio runtime and blocks on each request, so
/// the reconciliation core stays synchronous while the HTTP stack stays
/// on reqwest's async client.
pub struct FirestoreStore {
    client: Client,
    runtime: tokio::runtime::Runtime,
    config: StoreConfig,
}

impl FirestoreStore {
    /// Creates a client for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the internal runtime cannot be started.
    pub fn connect(config: StoreConfig) -> Result<Self, StoreError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| -> StoreError { format!("failed to start runtime: {e}").into() })?;
        Ok(Self { client: Client::new(), runtime, config })
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/{}/documents/{}",
            self.config.base_url(),
            self.config.database_path(),
            self.config.collection
        )
    }

    fn document_url(&self, key: &str) -> String {
        format!("{}/{}", self.documents_url(), key)
    }

    fn run_query_url(&self) -> String {
        format!("{}/{}/documents:runQuery", self.config.base_url(), self.config.database_path())
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// One document resource as returned by the REST API.
#[derive(Deserialize)]
struct ApiDocument {
    /// Full resource name; the document key is its last path segment.
    name: String,
    /// Typed-value field mapping. Missing for empty documents.
    #[serde(default)]
    fields: Map<String, Value>,
}

/// Response page from the document list endpoint.
#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    documents: Vec<ApiDocument>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

/// One element of a `runQuery` response stream.
#[derive(Deserialize)]
struct QueryResult {
    /// Present for result rows; absent for progress/readTime elements.
    document: Option<ApiDocument>,
}

impl DocumentStore for FirestoreStore {
    fn list(&self) -> Result<Vec<Document>, StoreError> {
        self.runtime.block_on(async {
            let mut documents = Vec::new();
            let mut page_token: Option<String> = None;

            loop {
                let mut request =
                    self.client.get(self.documents_url()).query(&[("pageSize", "300")]);
                if let Some(token) = &page_token {
                    request = request.query(&[("pageToken", token.as_str())]);
                }

                let response = self
                    .authorize(request)
                    .send()
                    .await
                    .map_err(|e| -> StoreError { format!("list request failed: {e}").into() })?;
                let body = read_success_body(response).await?;

                let page: ListResponse = serde_json::from_str(&body)
                    .map_err(|e| -> StoreError { format!("unparseable list response: {e}").into() })?;

                for doc in page.documents {
                    documents.push((document_key(&doc.name), decode_fields(&doc.fields)));
                }

                match page.next_page_token {
                    Some(token) => {
                        log::debug!("fetching next page ({} documents so far)", documents.len());
                        page_token = Some(token);
                    }
                    None => break,
                }
            }

            Ok(documents)
        })
    }

    fn update(&self, key: &str, fields: &Snapshot) -> Result<bool, StoreError> {
        self.runtime.block_on(async {
            let mut request = self
                .client
                .patch(self.document_url(key))
                .query(&[("currentDocument.exists", "true")]);
            for field in fields.keys() {
                request = request.query(&[("updateMask.fieldPaths", field.as_str())]);
            }

            let response = self
                .authorize(request)
                .json(&json!({ "fields": encode_fields(fields) }))
                .send()
                .await
                .map_err(|e| -> StoreError { format!("update request failed: {e}").into() })?;

            // The exists precondition turns a would-be upsert into a 404;
            // the port reports that as a rejection, not an error.
            if response.status() == StatusCode::NOT_FOUND {
                return Ok(false);
            }

            read_success_body(response).await?;
            Ok(true)
        })
    }

    fn query_equals(&self, field: &str, value: &Value) -> Result<Vec<Document>, StoreError> {
        self.runtime.block_on(async {
            let body = json!({
                "structuredQuery": {
                    "from": [{ "collectionId": self.config.collection }],
                    "where": {
                        "fieldFilter": {
                            "field": { "fieldPath": field },
                            "op": "EQUAL",
                            "value": to_typed(value),
                        }
                    }
                }
            });

            let response = self
                .authorize(self.client.post(self.run_query_url()))
                .json(&body)
                .send()
                .await
                .map_err(|e| -> StoreError { format!("query request failed: {e}").into() })?;
            let text = read_success_body(response).await?;

            let results: Vec<QueryResult> = serde_json::from_str(&text)
                .map_err(|e| -> StoreError { format!("unparseable query response: {e}").into() })?;

            Ok(results
                .into_iter()
                .filter_map(|r| r.document)
                .map(|doc| (document_key(&doc.name), decode_fields(&doc.fields)))
                .collect())
        })
    }
}

/// Reads the response body, turning non-2xx statuses into errors that
/// carry the status and whatever Firestore said.
async fn read_success_body(response: reqwest::Response) -> Result<String, StoreError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| -> StoreError { format!("failed to read response: {e}").into() })?;

    if status.is_success() {
        Ok(body)
    } else {
        Err(format!("firestore returned {}: {body}", status.as_u16()).into())
    }
}

/// Extracts the document key from a full resource name.
fn document_key(name: &str) -> String {
    name.rsplit('/').next().unwrap_or(name).to_string()
}

/// Decodes a typed-value field mapping into a plain snapshot.
fn decode_fields(fields: &Map<String, Value>) -> Snapshot {
    fields.iter().map(|(name, value)| (name.clone(), from_typed(value))).collect()
}

/// Encodes a plain snapshot into a typed-value field mapping.
fn encode_fields(fields: &Snapshot) -> Value {
    Value::Object(fields.iter().map(|(name, value)| (name.clone(), to_typed(value))).collect())
}

/// Encodes one plain JSON value into Firestore's typed-value envelope.
fn to_typed(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            // Firestore carries integers as decimal strings.
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            json!({ "arrayValue": { "values": items.iter().map(to_typed).collect::<Vec<_>>() } })
        }
        Value::Object(map) => {
            let fields: Map<String, Value> =
                map.iter().map(|(k, v)| (k.clone(), to_typed(v))).collect();
            json!({ "mapValue": { "fields": fields } })
        }
    }
}

/// Decodes one typed value back into plain JSON. Unknown envelopes decode
/// to null rather than failing the whole document.
fn from_typed(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return Value::Null;
    };

    if let Some(s) = obj.get("stringValue").and_then(Value::as_str) {
        return Value::String(s.to_string());
    }
    if let Some(b) = obj.get("booleanValue").and_then(Value::as_bool) {
        return Value::Bool(b);
    }
    if let Some(i) = obj.get("integerValue") {
        // Served as a decimal string, but tolerate a bare number.
        let parsed = match i {
            Value::String(s) => s.parse::<i64>().ok(),
            Value::Number(n) => n.as_i64(),
            _ => None,
        };
        if let Some(n) = parsed {
            return Value::Number(n.into());
        }
    }
    if let Some(d) = obj.get("doubleValue").and_then(Value::as_f64) {
        return serde_json::Number::from_f64(d).map_or(Value::Null, Value::Number);
    }
    if let Some(ts) = obj.get("timestampValue").and_then(Value::as_str) {
        return Value::String(ts.to_string());
    }
    if let Some(array) = obj.get("arrayValue").and_then(Value::as_object) {
        let values = array
            .get("values")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(from_typed).collect())
            .unwrap_or_default();
        return Value::Array(values);
    }
    if let Some(map) = obj.get("mapValue").and_then(Value::as_object) {
        let fields = map
            .get("fields")
            .and_then(Value::as_object)
            .map(|fields| fields.iter().map(|(k, v)| (k.clone(), from_typed(v))).collect())
            .unwrap_or_default();
        return Value::Object(fields);
    }

    // nullValue, or an envelope this tool has no use for.
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StoreConfig {
        StoreConfig {
            project_id: "fleet-demo".into(),
            database: "(default)".into(),
            collection: "terminals".into(),
            access_token: None,
            emulator_host: Some("localhost:8080".into()),
        }
    }

    #[test]
    fn urls_follow_the_rest_layout() {
        let store = FirestoreStore::connect(config()).unwrap();
        assert_eq!(
            store.documents_url(),
            "http://localhost:8080/v1/projects/fleet-demo/databases/(default)/documents/terminals"
        );
        assert_eq!(
            store.document_url("T1"),
            "http://localhost:8080/v1/projects/fleet-demo/databases/(default)/documents/terminals/T1"
        );
        assert!(store.run_query_url().ends_with("documents:runQuery"));
    }

    #[test]
    fn document_key_is_last_path_segment() {
        let name = "projects/fleet-demo/databases/(default)/documents/terminals/T7";
        assert_eq!(document_key(name), "T7");
        assert_eq!(document_key("bare"), "bare");
    }

    #[test]
    fn typed_codec_round_trips_record_fields() {
        let snapshot: Snapshot = serde_json::json!({
            "terminal_id": "T1",
            "is_active": false,
            "retries": 3,
            "score": 0.5,
            "qr_code": null,
        })
        .as_object()
        .unwrap()
        .clone();

        let encoded = encode_fields(&snapshot);
        let decoded = decode_fields(encoded.as_object().unwrap());
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn integers_travel_as_decimal_strings() {
        let typed = to_typed(&serde_json::json!(42));
        assert_eq!(typed, serde_json::json!({ "integerValue": "42" }));
        assert_eq!(from_typed(&typed), serde_json::json!(42));
    }

    #[test]
    fn timestamps_decode_as_strings() {
        let typed = serde_json::json!({ "timestampValue": "2024-06-15T10:30:00Z" });
        assert_eq!(from_typed(&typed), serde_json::json!("2024-06-15T10:30:00Z"));
    }

    #[test]
    fn nested_maps_and_arrays_decode() {
        let typed = serde_json::json!({
            "mapValue": { "fields": {
                "tags": { "arrayValue": { "values": [
                    { "stringValue": "lobby" },
                    { "stringValue": "east" },
                ] } }
            } }
        });
        assert_eq!(from_typed(&typed), serde_json::json!({ "tags": ["lobby", "east"] }));
    }

    #[test]
    fn unknown_envelopes_decode_to_null() {
        let typed = serde_json::json!({ "geoPointValue": { "latitude": 0, "longitude": 0 } });
        assert_eq!(from_typed(&typed), serde_json::Value::Null);
    }
}
