use crate::error::Error;
use crate::query::ListQuery;
use recordform_core::PatchField;
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Request timeout applied by [`EntityClient::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// CLIENT
// =============================================================================

/// Generic CRUD client for `{base}/api/{entityName}`.
///
/// Every failure is logged here at `warn` before being returned, so
/// callers may drop errors without losing them.
#[derive(Debug, Clone)]
pub struct EntityClient {
    base_url: String,
    client: reqwest::Client,
}

impl EntityClient {
    /// Create a new client for the given base URL.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let client = EntityClient::new("https://clinic.example");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_base(base_url.into()),
            client: reqwest::Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Create a client with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client fails to build.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: trim_base(base_url.into()),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn route(&self, entity_name: &str) -> String {
        format!("{}/api/{}", self.base_url, entity_name)
    }

    fn record_route(&self, entity_name: &str, id: &str) -> String {
        format!("{}/{}", self.route(entity_name), id)
    }

    /// Create a record.
    pub async fn add_record<T: Serialize + ?Sized>(&self, entity_name: &str, data: &T) -> Result<Value, Error> {
        let request = self.client.post(self.route(entity_name)).json(data);
        self.send(request).await
    }

    /// Replace a record.
    pub async fn edit_record_by_id<T: Serialize + ?Sized>(
        &self,
        entity_name: &str,
        id: &str,
        data: &T,
    ) -> Result<Value, Error> {
        let request = self.client.put(self.record_route(entity_name, id)).json(data);
        self.send(request).await
    }

    /// Apply a JSON patch to a record.
    pub async fn patch_record_by_id(
        &self,
        entity_name: &str,
        id: &str,
        fields: &[PatchField],
    ) -> Result<Value, Error> {
        let request = self
            .client
            .request(Method::PATCH, self.record_route(entity_name, id))
            .json(fields);
        self.send(request).await
    }

    pub async fn delete_record_by_id(&self, entity_name: &str, id: &str) -> Result<Value, Error> {
        let request = self.client.delete(self.record_route(entity_name, id));
        self.send(request).await
    }

    /// List records. The body is returned as-is; callers decide whether a
    /// non-array answer is usable.
    pub async fn get_records(&self, entity_name: &str, query: &ListQuery) -> Result<Value, Error> {
        let params = query.to_params()?;
        let request = self.client.get(self.route(entity_name)).query(&params);
        self.send(request).await
    }

    /// Fetch one record, projected to `fields`.
    pub async fn get_record_by_id(
        &self,
        entity_name: &str,
        id: &str,
        fields: &[String],
    ) -> Result<Value, Error> {
        let request = self
            .client
            .get(self.record_route(entity_name, id))
            .query(&[("fields", fields.join(","))]);
        self.send(request).await
    }

    /// Fetch one record into a typed DTO.
    pub async fn get_record_as<T: DeserializeOwned>(
        &self,
        entity_name: &str,
        id: &str,
        fields: &[String],
    ) -> Result<T, Error> {
        let value = self.get_record_by_id(entity_name, id, fields).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, Error> {
        let request = request.build()?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "records request");

        let result = self.execute(request).await;
        if let Err(e) = &result {
            warn!(%method, %url, error = %e, "records request failed");
        }
        result
    }

    async fn execute(&self, request: reqwest::Request) -> Result<Value, Error> {
        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

fn trim_base(base_url: String) -> String {
    base_url.trim_end_matches('/').to_string()
}
