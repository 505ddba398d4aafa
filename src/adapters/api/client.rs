use crate::ports::{StoreError, StoreResult};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Thin HTTP client for a Supabase-hosted PostgREST endpoint. Rows live
/// under `<base>/rest/v1/<table>`; filters travel as query parameters
/// (`id=eq.5`). The service key is sent both as `apikey` and as a
/// bearer token, which is what the hosted backend expects.
pub struct PostgrestClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PostgrestClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("taskdeck/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let base_url = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, &str)],
    ) -> StoreResult<Vec<T>> {
        let response = self
            .client
            .get(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let body = Self::read_ok_body(response).await?;
        tracing::debug!(table, "select response: {body}");

        serde_json::from_str(&body).map_err(|e| {
            StoreError::Decode(format!("bad row list from {table}: {e}. Body was: {body}"))
        })
    }

    /// Insert one row and return it as stored. `Prefer:
    /// return=representation` makes PostgREST echo the row back with
    /// its assigned id, wrapped in a one-element array.
    pub async fn insert<T: DeserializeOwned, B: Serialize>(
        &self,
        table: &str,
        row: &B,
    ) -> StoreResult<T> {
        let response = self
            .client
            .post(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let body = Self::read_ok_body(response).await?;
        tracing::debug!(table, "insert response: {body}");

        let mut rows: Vec<T> = serde_json::from_str(&body).map_err(|e| {
            StoreError::Decode(format!("bad insert echo from {table}: {e}. Body was: {body}"))
        })?;
        rows.pop()
            .ok_or_else(|| StoreError::Decode(format!("insert into {table} returned no rows")))
    }

    pub async fn update<B: Serialize>(
        &self,
        table: &str,
        query: &[(&str, &str)],
        patch: &B,
    ) -> StoreResult<()> {
        let response = self
            .client
            .patch(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(query)
            .json(patch)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Self::read_ok_body(response).await?;
        Ok(())
    }

    pub async fn delete(&self, table: &str, query: &[(&str, &str)]) -> StoreResult<()> {
        let response = self
            .client
            .delete(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Self::read_ok_body(response).await?;
        Ok(())
    }

    async fn read_ok_body(response: Response) -> StoreResult<String> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(StoreError::Api {
                status: status.as_u16(),
                body,
            })
        }
    }
}
