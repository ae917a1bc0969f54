//! # Site Forms
//!
//! The two forms the site ships: newsletter signup and contact request.
//!
//! ## Submission Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   submit() ──► rules re-applied ──► FormValidator::submit               │
//! │                                            │                            │
//! │                         invalid ◄──────────┤                            │
//! │                         (errors shown)     │ valid                      │
//! │                                            ▼                            │
//! │                                   deliver (subscriber / sender)         │
//! │                                            │                            │
//! │                          Err ◄─────────────┤ Ok                         │
//! │                     (values kept)          ▼                            │
//! │                                   reset form                            │
//! │                                   store status (newsletter only)        │
//! │                                   track form_submit                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Resetting a form forgets its rules, so both flows hand the rule set in
//! again on every submit.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use ts_rs::TS;

use crate::analytics::AnalyticsService;
use crate::error::DeliveryError;
use crate::form::{FormValidator, SubmitOutcome};
use crate::storage::StorageService;
use crate::types::NewsletterStatus;
use crate::validation::{FieldRule, FormValues, RuleSet};

pub const NEWSLETTER_FORM: &str = "newsletter";
pub const CONTACT_FORM: &str = "contact";

// =============================================================================
// Rules
// =============================================================================

/// `email`: required, valid address.
pub fn newsletter_rules() -> RuleSet {
    RuleSet::new().field("email", FieldRule::new().required().email())
}

/// Every contact field is required; text fields have minimum lengths.
pub fn contact_rules() -> RuleSet {
    RuleSet::new()
        .field("name", FieldRule::new().required().min_length(2))
        .field("email", FieldRule::new().required().email())
        .field("subject", FieldRule::new().required().min_length(5))
        .field("message", FieldRule::new().required().min_length(10))
}

pub fn newsletter_form() -> FormValidator {
    FormValidator::new([("email", "")])
}

pub fn contact_form() -> FormValidator {
    FormValidator::new([("name", ""), ("email", ""), ("subject", ""), ("message", "")])
}

fn text(values: &FormValues, name: &str) -> String {
    values
        .get(name)
        .map(|v| v.as_text().trim().to_string())
        .unwrap_or_default()
}

// =============================================================================
// Delivery Ports
// =============================================================================

/// Registers an address with the mailing list.
#[async_trait]
pub trait NewsletterSubscriber: Send + Sync {
    async fn subscribe(&self, email: &str) -> Result<(), DeliveryError>;
}

/// A contact request as it is handed to the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactMessage {
    fn from_values(values: &FormValues) -> Self {
        ContactMessage {
            name: text(values, "name"),
            email: text(values, "email"),
            subject: text(values, "subject"),
            message: text(values, "message"),
        }
    }
}

/// Delivers a contact request.
#[async_trait]
pub trait ContactSender: Send + Sync {
    async fn send(&self, message: &ContactMessage) -> Result<(), DeliveryError>;
}

// =============================================================================
// Newsletter Signup
// =============================================================================

/// Newsletter form plus everything that happens after it validates.
pub struct NewsletterSignup {
    form: FormValidator,
    subscriber: Arc<dyn NewsletterSubscriber>,
    storage: StorageService,
    analytics: AnalyticsService,
}

impl NewsletterSignup {
    pub fn new(
        subscriber: Arc<dyn NewsletterSubscriber>,
        storage: StorageService,
        analytics: AnalyticsService,
    ) -> Self {
        NewsletterSignup {
            form: newsletter_form(),
            subscriber,
            storage,
            analytics,
        }
    }

    pub fn form(&self) -> &FormValidator {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormValidator {
        &mut self.form
    }

    /// Validates and subscribes the entered address.
    ///
    /// On success the form is reset, the status is stored as subscribed and
    /// a `form_submit` event is tracked. On a delivery error the entered
    /// values stay so the user can retry.
    pub async fn submit(&mut self) -> Result<SubmitOutcome<String>, DeliveryError> {
        self.form.set_rules(newsletter_rules());
        let subscriber = Arc::clone(&self.subscriber);

        let outcome = self
            .form
            .submit(|values, helpers| async move {
                let email = text(&values, "email");
                subscriber.subscribe(&email).await?;
                helpers.reset_form(None);
                Ok::<_, DeliveryError>(email)
            })
            .await
            .map_err(|e| {
                warn!(error = %e, "Newsletter subscription failed");
                e
            })?;

        if let SubmitOutcome::Submitted(email) = &outcome {
            info!(email = %email, "Newsletter subscription confirmed");
            self.storage
                .set_newsletter_status(NewsletterStatus::Subscribed)
                .await;
            self.analytics.track_form_submission(NEWSLETTER_FORM);
        }

        Ok(outcome)
    }
}

// =============================================================================
// Contact Request
// =============================================================================

/// Contact form plus delivery.
pub struct ContactRequest {
    form: FormValidator,
    sender: Arc<dyn ContactSender>,
    analytics: AnalyticsService,
}

impl ContactRequest {
    pub fn new(sender: Arc<dyn ContactSender>, analytics: AnalyticsService) -> Self {
        ContactRequest {
            form: contact_form(),
            sender,
            analytics,
        }
    }

    pub fn form(&self) -> &FormValidator {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormValidator {
        &mut self.form
    }

    /// Validates and sends the message. Resets the form and tracks a
    /// `form_submit` event once it was delivered.
    pub async fn submit(&mut self) -> Result<SubmitOutcome<ContactMessage>, DeliveryError> {
        self.form.set_rules(contact_rules());
        let sender = Arc::clone(&self.sender);

        let outcome = self
            .form
            .submit(|values, helpers| async move {
                let message = ContactMessage::from_values(&values);
                sender.send(&message).await?;
                helpers.reset_form(None);
                Ok::<_, DeliveryError>(message)
            })
            .await
            .map_err(|e| {
                warn!(error = %e, "Contact message failed");
                e
            })?;

        if outcome.is_submitted() {
            self.analytics.track_form_submission(CONTACT_FORM);
        }

        Ok(outcome)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
