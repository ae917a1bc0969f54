//! # Newsletter Command
//!
//! Runs one email address through the newsletter form.

use foodie_core::forms::{NewsletterSubscriber, NEWSLETTER_FORM};
use foodie_core::{
    AnalyticsService, NewsletterSignup, NewsletterStatus, StorageService, SubmitOutcome,
};
use std::sync::Arc;
use tracing::debug;

use crate::error::{CliError, CliResult};

/// Validates and subscribes `email`.
///
/// A validation failure becomes [`CliError::Rejected`] carrying the field
/// message shown to users.
pub async fn subscribe(
    subscriber: Arc<dyn NewsletterSubscriber>,
    storage: StorageService,
    analytics: AnalyticsService,
    email: &str,
) -> CliResult<String> {
    if storage.newsletter_status().await == NewsletterStatus::Subscribed {
        debug!("Newsletter already marked as subscribed, submitting again");
    }

    let mut signup = NewsletterSignup::new(subscriber, storage, analytics);
    signup.form_mut().set_value("email", email);

    match signup.submit().await? {
        SubmitOutcome::Submitted(email) => Ok(format!("✓ Subscribed {} to the newsletter", email)),
        SubmitOutcome::Invalid { first_error } => {
            let field = first_error.unwrap_or_else(|| "email".to_string());
            let message = signup
                .form()
                .error(&field)
                .unwrap_or("Invalid value")
                .to_string();
            Err(CliError::Rejected(format!("{}: {}", field, message)))
        }
        SubmitOutcome::AlreadySubmitting => Err(CliError::Rejected(format!(
            "{} form is already submitting",
            NEWSLETTER_FORM
        ))),
    }
}
