//! Vouchers service.

use async_trait::async_trait;
use ksmart::discounts::{AppliedVoucher, DiscountError};
use mockall::automock;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::client::{BackendClient, BackendError, GENERIC_FAILURE};

/// Backend verdict on a voucher code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VoucherCheck {
    pub valid: bool,

    /// Discount in percent points (`10` is 10%)
    #[serde(default)]
    pub discount: Decimal,

    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Error)]
pub enum VoucherError {
    #[error("please enter a voucher code")]
    EmptyCode,

    #[error("voucher {code} is not valid")]
    Invalid {
        code: String,
        message: Option<String>,
    },

    #[error(transparent)]
    Discount(#[from] DiscountError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl VoucherError {
    /// Text to show the member.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyCode => self.to_string(),
            Self::Invalid {
                message: Some(message),
                ..
            } => message.clone(),
            Self::Invalid { message: None, .. } => "This voucher cannot be used.".to_string(),
            Self::Discount(_) => GENERIC_FAILURE.to_string(),
            Self::Backend(error) => error.user_message(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpVouchersService {
    client: BackendClient,
}

impl HttpVouchersService {
    #[must_use]
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VouchersService for HttpVouchersService {
    async fn check_voucher(&self, code: &str) -> Result<VoucherCheck, BackendError> {
        self.client.get(&["api", "vouchers", code], &()).await
    }
}

#[automock]
#[async_trait]
pub trait VouchersService: Send + Sync {
    /// Ask the backend whether a code is valid and what it is worth.
    async fn check_voucher(&self, code: &str) -> Result<VoucherCheck, BackendError>;
}

/// Validate a code and turn it into an applied voucher.
///
/// # Errors
///
/// Returns [`VoucherError::EmptyCode`] without calling the backend for a blank code,
/// [`VoucherError::Invalid`] if the backend refuses it, or an error if the lookup fails.
pub async fn apply_voucher(
    service: &dyn VouchersService,
    code: &str,
) -> Result<AppliedVoucher, VoucherError> {
    let code = code.trim();

    if code.is_empty() {
        return Err(VoucherError::EmptyCode);
    }

    let check = service.check_voucher(code).await?;

    debug!(code, valid = check.valid, discount = %check.discount, "voucher checked");

    if !check.valid {
        return Err(VoucherError::Invalid {
            code: code.to_string(),
            message: check.message,
        });
    }

    Ok(AppliedVoucher::from_points(code, check.discount)?)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn blank_code_never_reaches_backend() {
        let mut service = MockVouchersService::new();
        service.expect_check_voucher().never();

        let result = apply_voucher(&service, "   ").await;

        assert!(matches!(result, Err(VoucherError::EmptyCode)));
    }

    #[tokio::test]
    async fn valid_code_becomes_percentage() -> TestResult {
        let mut service = MockVouchersService::new();

        service
            .expect_check_voucher()
            .once()
            .withf(|code| code == "HEMAT10")
            .return_once(|_| {
                Ok(VoucherCheck {
                    valid: true,
                    discount: Decimal::from(10),
                    message: None,
                })
            });

        let voucher = apply_voucher(&service, " HEMAT10 ").await?;

        assert_eq!(voucher.code, "HEMAT10");
        assert_eq!(voucher.discount * Decimal::from(200), Decimal::from(20));

        Ok(())
    }

    #[tokio::test]
    async fn rejection_message_is_surfaced() -> TestResult {
        let mut service = MockVouchersService::new();

        service.expect_check_voucher().once().return_once(|_| {
            Ok(VoucherCheck {
                valid: false,
                discount: Decimal::ZERO,
                message: Some("Voucher sudah kedaluwarsa".to_string()),
            })
        });

        let error = apply_voucher(&service, "LAMA")
            .await
            .err()
            .ok_or("expected rejection")?;

        assert_eq!(error.user_message(), "Voucher sudah kedaluwarsa");

        Ok(())
    }

    #[tokio::test]
    async fn out_of_range_discount_is_refused() {
        let mut service = MockVouchersService::new();

        service.expect_check_voucher().once().return_once(|_| {
            Ok(VoucherCheck {
                valid: true,
                discount: Decimal::from(150),
                message: None,
            })
        });

        let result = apply_voucher(&service, "RUSAK").await;

        assert!(matches!(
            result,
            Err(VoucherError::Discount(DiscountError::OutOfRange(_)))
        ));
    }
}
