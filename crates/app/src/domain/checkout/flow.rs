//! Checkout flow.
//!
//! Runs a [`CheckoutDraft`] through validation and submission. Only one submission runs at
//! a time; a second attempt while one is pending is refused.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use ksmart::{
    cart::SelectedCartItems,
    checkout::{
        CheckoutDraft, CheckoutError, MemberProfile, PaymentMethod, Settlement, prepare_settlement,
    },
};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    client::{BackendError, GENERIC_FAILURE},
    domain::{
        bv_periods::BvPeriodsService,
        carts::{CartStore, CartStoreError, CartsServiceError, Confirmation},
        checkout::{CheckoutDraftsService, DraftRecord, TransactionOutcome, TransactionsService},
    },
};

#[derive(Debug, Error)]
pub enum CheckoutFlowError {
    #[error("a checkout is already being submitted")]
    SubmissionInProgress,

    #[error("cancelling checkout needs confirmation")]
    ConfirmationRequired,

    #[error("the payment gateway did not return a payment page")]
    MissingRedirect,

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Carts(#[from] CartsServiceError),

    #[error(transparent)]
    Cart(#[from] CartStoreError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl CheckoutFlowError {
    /// Text to show the member.
    pub fn user_message(&self) -> String {
        match self {
            Self::Checkout(error) => error.to_string(),
            Self::Carts(error) => error.user_message(),
            Self::Cart(error) => error.user_message(),
            Self::Backend(error) => error.user_message(),
            Self::MissingRedirect => GENERIC_FAILURE.to_string(),
            Self::SubmissionInProgress | Self::ConfirmationRequired => self.to_string(),
        }
    }
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    /// Continue payment at the gateway.
    Redirect { url: String, settlement: Settlement },

    /// Cash on delivery order placed; the settled lines and the draft are gone.
    Completed {
        message: Option<String>,
        settlement: Settlement,
    },
}

impl CheckoutOutcome {
    /// The settlement that was submitted.
    pub fn settlement(&self) -> &Settlement {
        match self {
            Self::Redirect { settlement, .. } | Self::Completed { settlement, .. } => settlement,
        }
    }
}

/// Resets the submitting flag when a submission ends, however it ends.
struct Submitting<'a>(&'a AtomicBool);

impl<'a> Submitting<'a> {
    fn begin(flag: &'a AtomicBool) -> Result<Self, CheckoutFlowError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CheckoutFlowError::SubmissionInProgress)?;

        Ok(Self(flag))
    }
}

impl Drop for Submitting<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct CheckoutFlow {
    bv_periods: Arc<dyn BvPeriodsService>,
    transactions: Arc<dyn TransactionsService>,
    drafts: Arc<dyn CheckoutDraftsService>,
    submitting: AtomicBool,
}

impl std::fmt::Debug for CheckoutFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutFlow")
            .field("submitting", &self.submitting)
            .finish_non_exhaustive()
    }
}

impl CheckoutFlow {
    pub fn new(
        bv_periods: Arc<dyn BvPeriodsService>,
        transactions: Arc<dyn TransactionsService>,
        drafts: Arc<dyn CheckoutDraftsService>,
    ) -> Self {
        Self {
            bv_periods,
            transactions,
            drafts,
            submitting: AtomicBool::new(false),
        }
    }

    /// Whether a submission is pending.
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Start checkout for the selected lines and store the draft on the backend.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NoItems`] for an empty selection, or an error if the draft
    /// cannot be stored.
    pub async fn begin(
        &self,
        selected: SelectedCartItems,
    ) -> Result<CheckoutDraft, CheckoutFlowError> {
        if selected.is_empty() {
            return Err(CheckoutError::NoItems.into());
        }

        let token = self
            .drafts
            .save_draft(&DraftRecord::new(&selected, None))
            .await?;

        info!(lines = selected.items().len(), %token, "checkout started");

        let mut draft = CheckoutDraft::new(selected);
        draft.set_checkout_token(Some(token));

        Ok(draft)
    }

    /// Reload a stored draft, keeping only lines still in the member's cart with their
    /// live quantities. The cart is refetched into `cart`.
    ///
    /// # Errors
    ///
    /// Returns an error if the draft or cart cannot be loaded.
    pub async fn resume(
        &self,
        token: &str,
        cart: &CartStore,
    ) -> Result<CheckoutDraft, CheckoutFlowError> {
        let record = self.drafts.load_draft(token).await?;
        let stored = record.selection()?;
        let live = cart.refresh().await?;

        let selected = stored.refreshed_from(&live);

        if selected.ids().len() < stored.ids().len() {
            warn!(%token, "some checkout lines are no longer in the cart");
        }

        let mut draft = CheckoutDraft::new(selected);
        draft.set_checkout_token(Some(token.to_string()));

        Ok(draft)
    }

    /// Validate the draft against the live cart and submit it.
    ///
    /// Missing shipping or plan is reported before any backend call. The live cart is
    /// refetched through `cart`. Once the backend accepts a cash on delivery order, its
    /// lines leave the cart, `cart` publishes the refetched cart and the stored draft is
    /// deleted.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutFlowError::SubmissionInProgress`] while another submission runs,
    /// the first failed validation, or the backend failure.
    pub async fn submit(
        &self,
        draft: &CheckoutDraft,
        cart: &CartStore,
        profile: &MemberProfile,
    ) -> Result<CheckoutOutcome, CheckoutFlowError> {
        let _submitting = Submitting::begin(&self.submitting)?;

        draft.check_selections()?;

        let live = cart.refresh().await?;
        let periods = self.bv_periods.active_periods().await?;

        let settlement = prepare_settlement(draft, &live, profile, &periods)?;

        let outcome = self
            .transactions
            .create_transaction(&settlement.request)
            .await
            .map_err(|source| {
                error!(error = %source, transient = source.is_transient(), "transaction rejected");
                source
            })?;

        match (draft.payment_method(), outcome) {
            (PaymentMethod::Online, TransactionOutcome::Redirect { url }) => {
                Ok(CheckoutOutcome::Redirect { url, settlement })
            }
            (PaymentMethod::Online, TransactionOutcome::Confirmed { .. }) => {
                Err(CheckoutFlowError::MissingRedirect)
            }
            (PaymentMethod::Cod, outcome) => {
                let message = match outcome {
                    TransactionOutcome::Confirmed { message } => message,
                    TransactionOutcome::Redirect { .. } => None,
                };

                if let Err(error) = cart.clear_settled(&settlement.item_ids()).await {
                    warn!(%error, "cart refresh after checkout failed");
                }

                self.discard_draft(draft).await;

                Ok(CheckoutOutcome::Completed {
                    message,
                    settlement,
                })
            }
        }
    }

    /// Abandon checkout and delete the stored draft.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutFlowError::ConfirmationRequired`] unless confirmed, or an error
    /// if the draft cannot be deleted.
    pub async fn cancel(
        &self,
        draft: &CheckoutDraft,
        confirmation: Confirmation,
    ) -> Result<(), CheckoutFlowError> {
        if confirmation != Confirmation::Confirmed {
            return Err(CheckoutFlowError::ConfirmationRequired);
        }

        if let Some(token) = draft.checkout_token() {
            self.drafts.delete_draft(token).await?;
        }

        Ok(())
    }

    async fn discard_draft(&self, draft: &CheckoutDraft) {
        let Some(token) = draft.checkout_token() else {
            return;
        };

        // The order is already placed, so a failed delete is only logged.
        if let Err(error) = self.drafts.delete_draft(token).await {
            warn!(%token, %error, "failed to delete checkout draft");
        }
    }
}
