//! Transactions service.

use async_trait::async_trait;
use ksmart::checkout::SettlementRequest;
use mockall::automock;
use reqwest::Method;
use serde::Deserialize;
use tracing::info;

use crate::client::{BackendClient, BackendError};

/// What the backend did with a settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
    /// Payment continues at the gateway.
    Redirect { url: String },

    /// Order accepted with no further step.
    Confirmed { message: Option<String> },
}

#[derive(Debug, Deserialize)]
struct TransactionRecord {
    #[serde(default)]
    redirect_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateTransactionResponse {
    #[serde(default)]
    transaction: Option<TransactionRecord>,

    #[serde(default)]
    message: Option<String>,
}

impl From<CreateTransactionResponse> for TransactionOutcome {
    fn from(response: CreateTransactionResponse) -> Self {
        match response.transaction.and_then(|record| record.redirect_url) {
            Some(url) if !url.is_empty() => Self::Redirect { url },
            _ => Self::Confirmed {
                message: response.message,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpTransactionsService {
    client: BackendClient,
}

impl HttpTransactionsService {
    #[must_use]
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TransactionsService for HttpTransactionsService {
    async fn create_transaction(
        &self,
        request: &SettlementRequest,
    ) -> Result<TransactionOutcome, BackendError> {
        let response: CreateTransactionResponse = self
            .client
            .send(Method::POST, &["api", "create-transaction"], request)
            .await?;

        info!(
            user = %request.user_id,
            gross_amount = request.gross_amount,
            "transaction created"
        );

        Ok(response.into())
    }
}

#[automock]
#[async_trait]
pub trait TransactionsService: Send + Sync {
    /// Submit a settlement.
    async fn create_transaction(
        &self,
        request: &SettlementRequest,
    ) -> Result<TransactionOutcome, BackendError>;
}
