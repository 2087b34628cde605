//! HTTP implementation of [`BoardApi`] with retry and backoff.

use crate::api::{AssignColumn, BoardApi, NewCard, NewColumn, OrderedIds};
use crate::config::ApiConfig;
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use planner_board::{BoardId, Card, CardId, Column, ColumnId};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};
use url::Url;

// Exponential backoff constant
const BACKOFF_MULTIPLIER: u32 = 2;

/// Upper bound for a single retry delay
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// `base * 2^attempt`, saturating at [`MAX_BACKOFF`]
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    BACKOFF_MULTIPLIER
        .checked_pow(attempt)
        .and_then(|factor| base.checked_mul(factor))
        .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
}

/// Board server client over HTTP
#[derive(Debug, Clone)]
pub struct HttpBoardApi {
    client: Client,
    base_url: Url,
    max_retries: u32,
    base_delay: Duration,
}

impl HttpBoardApi {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.base_url()?,
            max_retries: config.max_retries,
            base_delay: config.retry_delay(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::InvalidUrl(url::ParseError::RelativeUrlWithoutBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request, retrying transient failures with exponential backoff
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Response> {
        let mut attempt = 0;
        loop {
            let mut request = self.client.request(method.clone(), url.clone());
            if let Some(body) = body {
                request = request.json(body);
            }

            let error = match request.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => SyncError::Status {
                    status: response.status().as_u16(),
                    url: url.to_string(),
                },
                Err(e) => SyncError::Http(e),
            };

            if !error.is_retryable() || attempt >= self.max_retries {
                return Err(error);
            }
            let delay = backoff_delay(self.base_delay, attempt);
            warn!(%method, %url, attempt, ?delay, error = %error, "retrying request");
            sleep(delay).await;
            attempt += 1;
        }
    }

    async fn send_json<B, T>(&self, method: Method, url: Url, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(method, url, body).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl BoardApi for HttpBoardApi {
    #[instrument(skip(self))]
    async fn assign_column(&self, card: &CardId, column: &ColumnId) -> Result<Card> {
        let url = self.endpoint(&["cards", card.as_str()])?;
        let body = AssignColumn {
            column_id: column.clone(),
        };
        self.send_json(Method::PUT, url, Some(&body)).await
    }

    #[instrument(skip(self))]
    async fn reorder_cards(&self, ordered_ids: &[CardId]) -> Result<()> {
        let url = self.endpoint(&["cards", "reorder"])?;
        let body = OrderedIds {
            ordered_ids: ordered_ids.to_vec(),
        };
        self.send(Method::PUT, url, Some(&body)).await?;
        debug!(count = ordered_ids.len(), "cards reordered");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn reorder_columns(&self, ordered_ids: &[ColumnId]) -> Result<()> {
        let url = self.endpoint(&["lists", "reorder"])?;
        let body = OrderedIds {
            ordered_ids: ordered_ids.to_vec(),
        };
        self.send(Method::PUT, url, Some(&body)).await?;
        debug!(count = ordered_ids.len(), "columns reordered");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_columns(&self, board: &BoardId) -> Result<Vec<Column>> {
        let url = self.endpoint(&["lists", board.as_str()])?;
        self.send_json(Method::GET, url, None::<&()>).await
    }

    #[instrument(skip(self))]
    async fn fetch_cards(&self, board: &BoardId) -> Result<Vec<Card>> {
        let url = self.endpoint(&["cards", board.as_str()])?;
        self.send_json(Method::GET, url, None::<&()>).await
    }

    #[instrument(skip(self))]
    async fn create_column(&self, column: &NewColumn) -> Result<Column> {
        let url = self.endpoint(&["lists"])?;
        self.send_json(Method::POST, url, Some(column)).await
    }

    #[instrument(skip(self))]
    async fn create_card(&self, card: &NewCard) -> Result<Card> {
        let url = self.endpoint(&["cards"])?;
        self.send_json(Method::POST, url, Some(card)).await
    }

    #[instrument(skip(self))]
    async fn delete_column(&self, column: &ColumnId) -> Result<()> {
        let url = self.endpoint(&["lists", column.as_str()])?;
        self.send(Method::DELETE, url, None::<&()>).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_card(&self, card: &CardId) -> Result<()> {
        let url = self.endpoint(&["cards", card.as_str()])?;
        self.send(Method::DELETE, url, None::<&()>).await?;
        Ok(())
    }
}
