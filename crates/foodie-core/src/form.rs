//! # Form State
//!
//! Rule-driven form state: values, per-field errors, touched flags and the
//! submission lifecycle.
//!
//! ## Event Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Form Operations                                      │
//! │                                                                         │
//! │  UI Event               Method                  State Change            │
//! │  ────────               ──────                  ────────────            │
//! │                                                                         │
//! │  Type in input ───────► handle_change() ──────► values[name] = v       │
//! │                                                  (+ errors[name] if     │
//! │                                                   touched or submitted) │
//! │                                                                         │
//! │  Leave input ─────────► handle_blur() ────────► touched[name] = true   │
//! │                                                  errors[name] = check   │
//! │                                                                         │
//! │  Press submit ────────► submit() ─────────────► submit_count += 1      │
//! │                                                  touched[*] = true      │
//! │                                                  errors = validate all  │
//! │                                                  is_submitting while    │
//! │                                                  the callback runs      │
//! │                                                                         │
//! │  Press reset ─────────► reset_form() ─────────► back to initial values │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Submission Guard
//! `is_submitting` is true only while the submit callback runs. It is
//! cleared when the callback succeeds, fails, panics, or when the submit
//! future is dropped. A submit attempt while it is set is rejected with
//! [`SubmitOutcome::AlreadySubmitting`].

use indexmap::IndexMap;
use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::validation::{validate_field, FieldRule, FieldValue, FormValues, RuleSet};

// =============================================================================
// Options
// =============================================================================

/// Behaviour switches for a form. All default to `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormOptions {
    /// Re-validate a field on change once it has been touched or submitted.
    pub validate_on_change: bool,
    /// Validate a field when it loses focus.
    pub validate_on_blur: bool,
    /// Allow change-time re-validation after the first error was shown.
    pub revalidate_on_change: bool,
    /// Call the focus hook with the first invalid field after validation.
    pub focus_on_error: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        FormOptions {
            validate_on_change: true,
            validate_on_blur: true,
            revalidate_on_change: true,
            focus_on_error: true,
        }
    }
}

/// Receives the name of the first invalid field so the host UI can move
/// focus to it.
pub type FocusHook = Box<dyn Fn(&str) + Send + Sync>;

// =============================================================================
// Form State
// =============================================================================

/// Snapshot of everything the UI renders from.
///
/// ## Invariants
/// - `errors` only holds fields that currently fail their rule. A missing
///   key means "valid or not validated yet".
/// - `is_submitting` is true only while a submit callback is running.
#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    #[ts(as = "std::collections::HashMap<String, FieldValue>")]
    pub values: FormValues,
    #[ts(as = "std::collections::HashMap<String, String>")]
    pub errors: IndexMap<String, String>,
    #[ts(as = "std::collections::HashMap<String, bool>")]
    pub touched: IndexMap<String, bool>,
    pub is_submitting: bool,
    pub submit_count: u32,
}

/// Attributes an input needs to wire itself to the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FieldProps {
    pub name: String,
    pub value: String,
    pub aria_invalid: bool,
    pub aria_describedby: Option<String>,
}

// =============================================================================
// Submission
// =============================================================================

/// What happened when the form was submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome<T> {
    /// The form was valid and the callback returned this value.
    Submitted(T),
    /// Validation failed; the callback was not called.
    Invalid {
        /// First failing field in rule order.
        first_error: Option<String>,
    },
    /// Another submission on this form is still running.
    AlreadySubmitting,
}

impl<T> SubmitOutcome<T> {
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted(_))
    }

    /// Maps the submitted value, leaving the other outcomes as they are.
    pub fn map<U, F>(self, f: F) -> SubmitOutcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            SubmitOutcome::Submitted(value) => SubmitOutcome::Submitted(f(value)),
            SubmitOutcome::Invalid { first_error } => SubmitOutcome::Invalid { first_error },
            SubmitOutcome::AlreadySubmitting => SubmitOutcome::AlreadySubmitting,
        }
    }
}

#[derive(Debug, Clone)]
enum HelperAction {
    SetFieldError(String, String),
    SetErrors(IndexMap<String, String>),
    ResetForm(Option<FormValues>),
}

/// Handle given to submit callbacks for touching the form they came from.
///
/// Requests are queued and applied, in order, once the callback settles
/// (successfully or not). This is how a callback reports server-side field
/// errors or clears the form after a successful send.
#[derive(Debug, Clone, Default)]
pub struct SubmitHelpers {
    actions: Arc<Mutex<Vec<HelperAction>>>,
}

impl SubmitHelpers {
    fn push(&self, action: HelperAction) {
        self.actions
            .lock()
            .expect("Submit helpers mutex poisoned")
            .push(action);
    }

    fn take(&self) -> Vec<HelperAction> {
        std::mem::take(&mut *self.actions.lock().expect("Submit helpers mutex poisoned"))
    }

    pub fn set_field_error(&self, name: impl Into<String>, error: impl Into<String>) {
        self.push(HelperAction::SetFieldError(name.into(), error.into()));
    }

    pub fn set_errors(&self, errors: IndexMap<String, String>) {
        self.push(HelperAction::SetErrors(errors));
    }

    pub fn reset_form(&self, new_initial_values: Option<FormValues>) {
        self.push(HelperAction::ResetForm(new_initial_values));
    }
}

/// Result of the synchronous half of a submission.
enum SubmitStart {
    Ready(FormValues),
    Invalid(Option<String>),
    Busy,
}

/// Clears a submitting flag when dropped, whatever path the callback took.
struct SubmittingGuard<'a>(&'a mut bool);

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

// =============================================================================
// Form Validator
// =============================================================================

/// A form's state plus the rules it is validated against.
///
/// ## Example
/// ```rust
/// use foodie_core::form::{FormValidator, SubmitOutcome};
/// use foodie_core::validation::{FieldRule, RuleSet};
///
/// # tokio_test_block(async {
/// let mut form = FormValidator::new([("email", "")]);
/// form.set_rules(RuleSet::new().field("email", FieldRule::new().required().email()));
///
/// let outcome = form
///     .submit(|_values, _helpers| async { Ok::<_, String>(()) })
///     .await
///     .unwrap();
/// assert!(matches!(outcome, SubmitOutcome::Invalid { .. }));
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f);
/// # }
/// ```
pub struct FormValidator {
    initial_values: FormValues,
    state: FormState,
    rules: RuleSet,
    options: FormOptions,
    focus_hook: Option<FocusHook>,
}

impl std::fmt::Debug for FormValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormValidator")
            .field("state", &self.state)
            .field("rules", &self.rules)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl FormValidator {
    /// Creates a form with the given initial values.
    pub fn new<I, K, V>(initial_values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let initial_values: FormValues = initial_values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        FormValidator {
            state: FormState {
                values: initial_values.clone(),
                ..FormState::default()
            },
            initial_values,
            rules: RuleSet::new(),
            options: FormOptions::default(),
            focus_hook: None,
        }
    }

    pub fn with_options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    /// Installs the hook called with the first invalid field name.
    pub fn on_focus_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.focus_hook = Some(Box::new(hook));
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn values(&self) -> &FormValues {
        &self.state.values
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.state.values.get(name)
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.state.errors.get(name).map(String::as_str)
    }

    pub fn is_touched(&self, name: &str) -> bool {
        self.state.touched.get(name).copied().unwrap_or(false)
    }

    pub fn is_submitting(&self) -> bool {
        self.state.is_submitting
    }

    pub fn submit_count(&self) -> u32 {
        self.state.submit_count
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// True when no field currently has an error.
    pub fn is_valid(&self) -> bool {
        self.state.errors.is_empty()
    }

    /// True when values differ from the initial values.
    pub fn is_dirty(&self) -> bool {
        self.state.values != self.initial_values
    }

    // =========================================================================
    // Rules
    // =========================================================================

    /// Replaces the stored rule set.
    pub fn set_rules(&mut self, rules: RuleSet) {
        self.rules = rules;
    }

    /// Adds or replaces the stored rule for one field.
    pub fn register_rule(&mut self, name: impl Into<String>, rule: FieldRule) {
        self.rules.insert(name, rule);
    }

    // =========================================================================
    // Setters
    // =========================================================================

    /// Sets one value. Re-validates that field (and only that field) when it
    /// has been touched or the form has been submitted before.
    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        self.state.values.insert(name.clone(), value.into());

        let seen = self.is_touched(&name) || self.state.submit_count > 0;
        if self.options.validate_on_change && self.options.revalidate_on_change && seen {
            let error = self.validate_field(&name);
            self.store_error(&name, error);
        }
    }

    /// Replaces all values. No validation runs.
    pub fn set_values(&mut self, values: FormValues) {
        self.state.values = values;
    }

    /// Edits values in place. No validation runs.
    pub fn update_values<F>(&mut self, update: F)
    where
        F: FnOnce(&mut FormValues),
    {
        update(&mut self.state.values);
    }

    /// Sets (or, with an empty message, clears) one field's error.
    pub fn set_field_error(&mut self, name: impl Into<String>, error: impl Into<String>) {
        let name = name.into();
        let error = error.into();
        self.store_error(&name, (!error.is_empty()).then_some(error));
    }

    /// Replaces all errors. Empty messages are dropped.
    pub fn set_errors(&mut self, errors: IndexMap<String, String>) {
        self.state.errors = errors.into_iter().filter(|(_, e)| !e.is_empty()).collect();
    }

    pub fn set_field_touched(&mut self, name: impl Into<String>, touched: bool) {
        self.state.touched.insert(name.into(), touched);
    }

    pub fn set_touched(&mut self, touched: IndexMap<String, bool>) {
        self.state.touched = touched;
    }

    /// Empties one field and forgets its error and touched flag.
    pub fn clear_field(&mut self, name: &str) {
        self.state
            .values
            .insert(name.to_string(), FieldValue::Text(String::new()));
        self.state.errors.shift_remove(name);
        self.state.touched.shift_remove(name);
    }

    fn store_error(&mut self, name: &str, error: Option<String>) {
        match error {
            Some(error) => {
                self.state.errors.insert(name.to_string(), error);
            }
            None => {
                self.state.errors.shift_remove(name);
            }
        }
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validates one field's current value against its stored rule.
    /// Fields without a rule are always valid.
    pub fn validate_field(&self, name: &str) -> Option<String> {
        let rule = self.rules.get(name)?;
        validate_field(name, self.state.values.get(name), rule, &self.state.values)
    }

    /// Validates every ruled field and replaces `errors` wholesale.
    ///
    /// When `rules` is given it becomes the stored rule set for later
    /// calls. Returns true when no field failed.
    pub fn validate_form(&mut self, rules: Option<RuleSet>) -> bool {
        if let Some(rules) = rules {
            self.rules = rules;
        }

        let errors: IndexMap<String, String> = self
            .rules
            .iter()
            .filter_map(|(name, rule)| {
                validate_field(name, self.state.values.get(name), rule, &self.state.values)
                    .map(|error| (name.to_string(), error))
            })
            .collect();

        let first_error = errors.keys().next().cloned();
        debug!(
            fields = self.rules.len(),
            invalid = errors.len(),
            first_error = ?first_error,
            "Form validated"
        );

        self.state.errors = errors;

        match first_error {
            Some(field) => {
                if self.options.focus_on_error {
                    if let Some(hook) = &self.focus_hook {
                        hook(&field);
                    }
                }
                false
            }
            None => true,
        }
    }

    // =========================================================================
    // Reset
    // =========================================================================

    /// Restores initial (or the given) values and clears errors, touched
    /// flags, the submit count and the stored rules.
    pub fn reset_form(&mut self, new_initial_values: Option<FormValues>) {
        self.state = FormState {
            values: new_initial_values.unwrap_or_else(|| self.initial_values.clone()),
            ..FormState::default()
        };
        self.rules = RuleSet::new();
    }

    // =========================================================================
    // Event Handlers
    // =========================================================================

    /// Input change. Checkbox inputs should pass a [`FieldValue::Bool`].
    pub fn handle_change(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.set_value(name, value);
    }

    /// Input blur: marks the field touched and validates it when enabled.
    pub fn handle_blur(&mut self, name: &str) {
        self.set_field_touched(name, true);

        if self.options.validate_on_blur {
            let error = self.validate_field(name);
            self.store_error(name, error);
        }
    }

    /// Props for an input bound to `name`, optionally registering its rule.
    pub fn get_field_props(&mut self, name: &str, rule: Option<FieldRule>) -> FieldProps {
        if let Some(rule) = rule {
            self.register_rule(name, rule);
        }

        let has_error = self.state.errors.contains_key(name);
        FieldProps {
            name: name.to_string(),
            value: self
                .state
                .values
                .get(name)
                .map(|v| v.as_text().into_owned())
                .unwrap_or_default(),
            aria_invalid: has_error,
            aria_describedby: has_error.then(|| format!("{}-error", name)),
        }
    }

    // =========================================================================
    // Submission
    // =========================================================================

    fn begin_submit(&mut self) -> SubmitStart {
        if self.state.is_submitting {
            warn!("Submission already in progress, ignoring");
            return SubmitStart::Busy;
        }

        self.state.submit_count += 1;
        let names: Vec<String> = self.rules.names().map(str::to_string).collect();
        for name in names {
            self.state.touched.insert(name, true);
        }

        if !self.validate_form(None) {
            let first_error = self.state.errors.keys().next().cloned();
            debug!(first_error = ?first_error, "Submission blocked by validation");
            return SubmitStart::Invalid(first_error);
        }

        self.state.is_submitting = true;
        SubmitStart::Ready(self.state.values.clone())
    }

    fn apply_helpers(&mut self, helpers: &SubmitHelpers) {
        for action in helpers.take() {
            match action {
                HelperAction::SetFieldError(name, error) => self.set_field_error(name, error),
                HelperAction::SetErrors(errors) => self.set_errors(errors),
                HelperAction::ResetForm(values) => self.reset_form(values),
            }
        }
    }

    /// Submits the form through an async callback.
    ///
    /// Increments the submit count, touches every ruled field and validates.
    /// Valid forms call `on_submit` with a snapshot of the values; its error,
    /// if any, is returned unchanged.
    pub async fn submit<F, Fut, T, E>(&mut self, on_submit: F) -> Result<SubmitOutcome<T>, E>
    where
        F: FnOnce(FormValues, SubmitHelpers) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let values = match self.begin_submit() {
            SubmitStart::Ready(values) => values,
            SubmitStart::Invalid(first_error) => {
                return Ok(SubmitOutcome::Invalid { first_error })
            }
            SubmitStart::Busy => return Ok(SubmitOutcome::AlreadySubmitting),
        };

        let helpers = SubmitHelpers::default();
        let result = {
            let _guard = SubmittingGuard(&mut self.state.is_submitting);
            on_submit(values, helpers.clone()).await
        };
        self.apply_helpers(&helpers);

        match result {
            Ok(value) => Ok(SubmitOutcome::Submitted(value)),
            Err(err) => {
                warn!("Form submission callback failed");
                Err(err)
            }
        }
    }

    /// Synchronous form of [`FormValidator::submit`].
    pub fn submit_sync<F, T, E>(&mut self, on_submit: F) -> Result<SubmitOutcome<T>, E>
    where
        F: FnOnce(&FormValues, &SubmitHelpers) -> Result<T, E>,
    {
        let values = match self.begin_submit() {
            SubmitStart::Ready(values) => values,
            SubmitStart::Invalid(first_error) => {
                return Ok(SubmitOutcome::Invalid { first_error })
            }
            SubmitStart::Busy => return Ok(SubmitOutcome::AlreadySubmitting),
        };

        let helpers = SubmitHelpers::default();
        let result = {
            let _guard = SubmittingGuard(&mut self.state.is_submitting);
            on_submit(&values, &helpers)
        };
        self.apply_helpers(&helpers);

        match result {
            Ok(value) => Ok(SubmitOutcome::Submitted(value)),
            Err(err) => {
                warn!("Form submission callback failed");
                Err(err)
            }
        }
    }
}

// =============================================================================
// Shared Form
// =============================================================================

/// A form shared between tasks.
///
/// ## Thread Safety
/// Uses `Arc<Mutex<FormValidator>>`. The lock is held only for the
/// synchronous parts of a submission, never across the callback, so other
/// tasks can read state while a submission runs and a concurrent second
/// submission sees `is_submitting` and is rejected.
#[derive(Debug, Clone)]
pub struct SharedForm {
    form: Arc<Mutex<FormValidator>>,
}

/// Clears the shared form's submitting flag on drop.
///
/// The normal path goes through [`SharedSubmittingGuard::finish`], which
/// applies the callback's helper requests and clears the flag under one
/// lock. A submission that starts after the flag drops can never be reset
/// by a helper request from the one before it.
struct SharedSubmittingGuard<'a> {
    form: &'a Mutex<FormValidator>,
    armed: bool,
}

impl<'a> SharedSubmittingGuard<'a> {
    fn new(form: &'a Mutex<FormValidator>) -> Self {
        SharedSubmittingGuard { form, armed: true }
    }

    fn finish(mut self, helpers: &SubmitHelpers) {
        self.armed = false;
        let mut form = self.form.lock().expect("Form mutex poisoned");
        form.apply_helpers(helpers);
        form.state.is_submitting = false;
    }
}

impl Drop for SharedSubmittingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(mut form) = self.form.lock() {
            form.state.is_submitting = false;
        }
    }
}

impl SharedForm {
    pub fn new(form: FormValidator) -> Self {
        SharedForm {
            form: Arc::new(Mutex::new(form)),
        }
    }

    /// Executes a function with read access to the form.
    pub fn with_form<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&FormValidator) -> R,
    {
        let form = self.form.lock().expect("Form mutex poisoned");
        f(&form)
    }

    /// Executes a function with write access to the form.
    pub fn with_form_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut FormValidator) -> R,
    {
        let mut form = self.form.lock().expect("Form mutex poisoned");
        f(&mut form)
    }

    /// Submits the shared form. See [`FormValidator::submit`].
    pub async fn submit<F, Fut, T, E>(&self, on_submit: F) -> Result<SubmitOutcome<T>, E>
    where
        F: FnOnce(FormValues, SubmitHelpers) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let values = match self.with_form_mut(FormValidator::begin_submit) {
            SubmitStart::Ready(values) => values,
            SubmitStart::Invalid(first_error) => {
                return Ok(SubmitOutcome::Invalid { first_error })
            }
            SubmitStart::Busy => return Ok(SubmitOutcome::AlreadySubmitting),
        };

        let helpers = SubmitHelpers::default();
        let guard = SharedSubmittingGuard::new(&self.form);
        let result = on_submit(values, helpers.clone()).await;
        guard.finish(&helpers);

        match result {
            Ok(value) => Ok(SubmitOutcome::Submitted(value)),
            Err(err) => {
                warn!("Form submission callback failed");
                Err(err)
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::REQUIRED_MESSAGE;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn contact_form() -> FormValidator {
        let mut form = FormValidator::new([("name", ""), ("email", "")]);
        form.set_rules(
            RuleSet::new()
                .field("name", FieldRule::new().required().min_length(2))
                .field("email", FieldRule::new().required().email()),
        );
        form
    }

    fn fill(form: &mut FormValidator) {
        form.set_value("name", "Ana");
        form.set_value("email", "ana@example.com");
    }

    #[test]
    fn test_validate_form_builds_error_map() {
        let mut form = contact_form();
        assert!(!form.validate_form(None));
        assert_eq!(form.error("name"), Some(REQUIRED_MESSAGE));
        assert_eq!(form.error("email"), Some(REQUIRED_MESSAGE));

        fill(&mut form);
        assert!(form.validate_form(None));
        assert!(form.state().errors.is_empty());
        assert!(form.is_valid());
    }

    #[test]
    fn test_validate_form_is_idempotent() {
        let mut form = contact_form();
        form.set_value("name", "A");
        form.validate_form(None);
        let first = form.state().errors.clone();
        form.validate_form(None);
        assert_eq!(form.state().errors, first);
    }

    #[test]
    fn test_validate_form_replaces_stored_rules() {
        let mut form = contact_form();
        let rules = RuleSet::new().field("name", FieldRule::new().required());
        assert!(!form.validate_form(Some(rules)));
        assert_eq!(form.rules().len(), 1);
        assert!(form.error("email").is_none());
    }

    #[test]
    fn test_set_value_untouched_does_not_validate() {
        let mut form = contact_form();
        form.set_value("email", "nope");
        assert!(form.error("email").is_none());
    }

    #[test]
    fn test_set_value_after_blur_revalidates_only_that_field() {
        let mut form = contact_form();
        form.handle_blur("email");
        assert_eq!(form.error("email"), Some(REQUIRED_MESSAGE));
        assert!(form.error("name").is_none());

        form.handle_change("email", "nope");
        assert_eq!(
            form.error("email"),
            Some(crate::validation::EMAIL_MESSAGE)
        );

        form.handle_change("email", "ana@example.com");
        assert!(form.error("email").is_none());
        assert!(form.error("name").is_none());
    }

    #[test]
    fn test_set_value_after_submit_revalidates() {
        let mut form = contact_form();
        let outcome = form.submit_sync(|_, _| Ok::<_, ()>(())).unwrap();
        assert!(matches!(outcome, SubmitOutcome::Invalid { .. }));

        form.set_value("name", "Ana");
        assert!(form.error("name").is_none());
        assert_eq!(form.error("email"), Some(REQUIRED_MESSAGE));
    }

    #[test]
    fn test_blur_validation_can_be_disabled() {
        let mut form = contact_form().with_options(FormOptions {
            validate_on_blur: false,
            ..FormOptions::default()
        });
        form.handle_blur("email");
        assert!(form.is_touched("email"));
        assert!(form.error("email").is_none());
    }

    #[test]
    fn test_focus_hook_gets_first_invalid_field() {
        let focused = Arc::new(Mutex::new(Vec::new()));
        let sink = focused.clone();
        let mut form = contact_form().on_focus_error(move |name| {
            sink.lock().unwrap().push(name.to_string());
        });
        form.set_value("name", "Ana");

        form.validate_form(None);
        assert_eq!(*focused.lock().unwrap(), vec!["email".to_string()]);
    }

    #[test]
    fn test_reset_form() {
        let mut form = contact_form();
        fill(&mut form);
        form.handle_blur("name");
        form.validate_form(None);
        assert!(form.is_dirty());

        form.reset_form(None);
        assert!(!form.is_dirty());
        assert!(form.state().errors.is_empty());
        assert!(form.state().touched.is_empty());
        assert_eq!(form.submit_count(), 0);
        assert!(form.rules().is_empty());

        // Initial values satisfy these rules, so the reset form validates.
        let rules = RuleSet::new().field("name", FieldRule::new().max_length(10));
        assert!(form.validate_form(Some(rules)));
        assert!(form.state().errors.is_empty());
    }

    #[test]
    fn test_reset_form_with_new_values() {
        let mut form = contact_form();
        let mut values = FormValues::new();
        values.insert("name".into(), "Bo".into());
        form.reset_form(Some(values));
        assert_eq!(form.value("name"), Some(&FieldValue::from("Bo")));
        assert!(form.value("email").is_none());
    }

    #[test]
    fn test_clear_field() {
        let mut form = contact_form();
        form.set_value("name", "Ana");
        form.handle_blur("name");
        form.set_field_error("name", "Taken");
        form.clear_field("name");
        assert_eq!(form.value("name"), Some(&FieldValue::from("")));
        assert!(form.error("name").is_none());
        assert!(!form.is_touched("name"));
    }

    #[test]
    fn test_set_field_error_with_empty_message_clears() {
        let mut form = contact_form();
        form.set_field_error("name", "Taken");
        assert_eq!(form.error("name"), Some("Taken"));
        form.set_field_error("name", "");
        assert!(form.error("name").is_none());
    }

    #[test]
    fn test_field_props() {
        let mut form = FormValidator::new([("email", "x")]);
        let props = form.get_field_props("email", Some(FieldRule::new().email()));
        assert_eq!(props.value, "x");
        assert!(!props.aria_invalid);
        assert_eq!(props.aria_describedby, None);

        form.handle_blur("email");
        let props = form.get_field_props("email", None);
        assert!(props.aria_invalid);
        assert_eq!(props.aria_describedby.as_deref(), Some("email-error"));

        let props = form.get_field_props("unknown", None);
        assert_eq!(props.value, "");
    }

    #[test]
    fn test_submit_sync_marks_touched_and_counts() {
        let mut form = contact_form();
        let calls = AtomicUsize::new(0);
        let outcome = form
            .submit_sync(|_, _| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>(())
            })
            .unwrap();

        assert_eq!(
            outcome,
            SubmitOutcome::Invalid {
                first_error: Some("name".to_string())
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(form.submit_count(), 1);
        assert!(form.is_touched("name"));
        assert!(form.is_touched("email"));
    }

    #[tokio::test]
    async fn test_submit_valid_form_calls_back_with_values() {
        let mut form = contact_form();
        fill(&mut form);

        let outcome = form
            .submit(|values, _| async move {
                Ok::<_, String>(values["email"].as_text().into_owned())
            })
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SubmitOutcome::Submitted("ana@example.com".to_string())
        );
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn test_submit_error_propagates_and_clears_flag() {
        let mut form = contact_form();
        fill(&mut form);

        let result: Result<SubmitOutcome<()>, String> = form
            .submit(|_, helpers| async move {
                helpers.set_field_error("email", "Already subscribed");
                Err("server said no".to_string())
            })
            .await;

        assert_eq!(result, Err("server said no".to_string()));
        assert!(!form.is_submitting());
        assert_eq!(form.error("email"), Some("Already subscribed"));
    }

    #[tokio::test]
    async fn test_submit_helpers_reset_form_after_success() {
        let mut form = contact_form();
        fill(&mut form);

        form.submit(|_, helpers| async move {
            helpers.reset_form(None);
            Ok::<_, ()>(())
        })
        .await
        .unwrap();

        assert!(!form.is_dirty());
        assert_eq!(form.submit_count(), 0);
    }

    #[test]
    fn test_submit_sync_panic_clears_flag() {
        let mut form = contact_form();
        fill(&mut form);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = form.submit_sync(|_, _| -> Result<(), ()> { panic!("boom") });
        }));

        assert!(result.is_err());
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn test_shared_form_rejects_reentrant_submit() {
        let mut inner = contact_form();
        fill(&mut inner);
        let form = SharedForm::new(inner);
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let first = {
            let form = form.clone();
            tokio::spawn(async move {
                form.submit(|_, _| async move {
                    let _ = release_rx.await;
                    Ok::<_, ()>(1)
                })
                .await
            })
        };

        // Wait for the first submission to take the flag.
        while !form.with_form(|f| f.is_submitting()) {
            tokio::task::yield_now().await;
        }

        let second = form.submit(|_, _| async { Ok::<_, ()>(2) }).await.unwrap();
        assert_eq!(second, SubmitOutcome::AlreadySubmitting);

        release_tx.send(()).unwrap();
        let first = first.await.unwrap().unwrap();
        assert_eq!(first, SubmitOutcome::Submitted(1));
        assert!(!form.with_form(|f| f.is_submitting()));
        assert_eq!(form.with_form(|f| f.submit_count()), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_form_reset_helper_never_frees_a_running_submit() {
        let mut inner = contact_form();
        fill(&mut inner);
        let initial = inner.values().clone();
        let form = SharedForm::new(inner);

        let in_flight = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));
        let submitted = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let form = form.clone();
                let initial = initial.clone();
                let in_flight = Arc::clone(&in_flight);
                let overlaps = Arc::clone(&overlaps);
                let submitted = Arc::clone(&submitted);
                tokio::spawn(async move {
                    for _ in 0..200 {
                        let outcome = form
                            .submit(|_, helpers| {
                                let initial = initial.clone();
                                let in_flight = Arc::clone(&in_flight);
                                let overlaps = Arc::clone(&overlaps);
                                async move {
                                    if in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
                                        overlaps.fetch_add(1, Ordering::SeqCst);
                                    }
                                    tokio::task::yield_now().await;
                                    in_flight.fetch_sub(1, Ordering::SeqCst);
                                    helpers.reset_form(Some(initial));
                                    Ok::<_, ()>(())
                                }
                            })
                            .await
                            .unwrap();
                        if outcome.is_submitted() {
                            submitted.fetch_add(1, Ordering::SeqCst);
                        }
                        // reset_form also drops the rules; put them back.
                        form.with_form_mut(|f| {
                            if f.rules().names().next().is_none() {
                                f.set_rules(contact_form().rules().clone());
                            }
                        });
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
        assert!(submitted.load(Ordering::SeqCst) > 0);
        assert!(!form.with_form(|f| f.is_submitting()));
    }

    #[tokio::test]
    async fn test_dropped_submit_future_clears_flag() {
        let mut form = contact_form();
        fill(&mut form);

        {
            let pending = form.submit(|_, _| std::future::pending::<Result<(), ()>>());
            let timed_out =
                tokio::time::timeout(std::time::Duration::from_millis(10), pending).await;
            assert!(timed_out.is_err());
        }

        assert!(!form.is_submitting());
    }
}
