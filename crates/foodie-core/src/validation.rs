//! # Validation Module
//!
//! Declarative per-field rules and the single-field validator.
//!
//! ## Rule Precedence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      validate_field(value, rule)                        │
//! │                                                                         │
//! │  disabled? ──────────────────────────────────────► valid (stop)        │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  Required ──► Email ──► Phone ──► MinLength ──► MaxLength               │
//! │      ──► Min ──► Max ──► Pattern ──► Custom                             │
//! │                                                                         │
//! │  The first failing check wins. A field never reports more than one     │
//! │  message per call, so an empty required email field says "required",  │
//! │  not "invalid email".                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use foodie_core::validation::{validate_field, FieldRule, FieldValue, FormValues};
//!
//! let rule = FieldRule::new().required().min_length(2);
//! let values = FormValues::new();
//!
//! let error = validate_field("name", Some(&FieldValue::from("J")), &rule, &values);
//! assert_eq!(error.as_deref(), Some("Minimum 2 characters required"));
//! ```

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::mem;
use std::sync::{Arc, OnceLock};
use tracing::trace;
use ts_rs::TS;

// =============================================================================
// Default Messages
// =============================================================================

pub const REQUIRED_MESSAGE: &str = "This field is required";
pub const EMAIL_MESSAGE: &str = "Please enter a valid email address";
pub const PHONE_MESSAGE: &str = "Please enter a valid phone number";
pub const PATTERN_MESSAGE: &str = "Invalid format";
pub const CUSTOM_MESSAGE: &str = "Invalid value";

// =============================================================================
// Field Value
// =============================================================================

/// A single form value.
///
/// Inputs produce text, checkboxes produce booleans, and numeric widgets
/// may produce numbers. `Null` stands for an explicitly cleared value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Truthiness as the browser sees it: `null`, `false`, `0`, `NaN`
    /// and `""` are falsy. Whitespace-only text is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Bool(b) => *b,
            FieldValue::Number(n) => *n != 0.0 && !n.is_nan(),
            FieldValue::Text(s) => !s.is_empty(),
        }
    }

    /// Empty for the purpose of the `required` check: falsy, or text that
    /// trims to nothing.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            other => !other.is_truthy(),
        }
    }

    /// String form used by the email, phone and pattern checks.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Null => Cow::Borrowed(""),
            FieldValue::Bool(b) => Cow::Owned(b.to_string()),
            FieldValue::Number(n) => Cow::Owned(n.to_string()),
            FieldValue::Text(s) => Cow::Borrowed(s),
        }
    }

    /// Numeric coercion used by the `min`/`max` checks.
    ///
    /// Blank text coerces to `0`, booleans to `0`/`1`. Unparsable text
    /// and `Null` return `None` and are never out of range.
    pub fn numeric(&self) -> Option<f64> {
        match self {
            FieldValue::Null => None,
            FieldValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            FieldValue::Number(n) if n.is_nan() => None,
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) if s.trim().is_empty() => Some(0.0),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| !n.is_nan()),
        }
    }

    /// Character count of a text value. Non-text values have no length.
    fn text_len(&self) -> Option<usize> {
        match self {
            FieldValue::Text(s) => Some(s.chars().count()),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n as f64)
    }
}

/// Current values of a form, in field declaration order.
pub type FormValues = IndexMap<String, FieldValue>;

// =============================================================================
// Custom Validators
// =============================================================================

/// Outcome of a caller-supplied validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Value is acceptable.
    Pass,
    /// Value is rejected with the generic "Invalid value" message.
    Fail,
    /// Value is rejected with this message. An empty message passes.
    FailWith(String),
}

impl From<Option<String>> for Verdict {
    fn from(message: Option<String>) -> Self {
        match message {
            Some(msg) => Verdict::FailWith(msg),
            None => Verdict::Pass,
        }
    }
}

impl From<bool> for Verdict {
    /// `true` means "this value is invalid".
    fn from(failed: bool) -> Self {
        if failed {
            Verdict::Fail
        } else {
            Verdict::Pass
        }
    }
}

/// Caller-supplied check. Receives the field's value and every value in
/// the form, which is what cross-field rules (password confirmation) need.
pub type CustomValidator = Arc<dyn Fn(&FieldValue, &FormValues) -> Verdict + Send + Sync>;

// =============================================================================
// Checks
// =============================================================================

/// One constraint on a field. Variants are declared in evaluation order.
#[derive(Clone)]
pub enum Check {
    Required,
    Email,
    Phone,
    MinLength(usize),
    MaxLength(usize),
    Min(f64),
    Max(f64),
    Pattern(Regex),
    Custom(CustomValidator),
}

impl Check {
    fn precedence(&self) -> u8 {
        match self {
            Check::Required => 0,
            Check::Email => 1,
            Check::Phone => 2,
            Check::MinLength(_) => 3,
            Check::MaxLength(_) => 4,
            Check::Min(_) => 5,
            Check::Max(_) => 6,
            Check::Pattern(_) => 7,
            Check::Custom(_) => 8,
        }
    }

    fn default_message(&self) -> String {
        match self {
            Check::Required => REQUIRED_MESSAGE.to_string(),
            Check::Email => EMAIL_MESSAGE.to_string(),
            Check::Phone => PHONE_MESSAGE.to_string(),
            Check::MinLength(n) => format!("Minimum {} characters required", n),
            Check::MaxLength(n) => format!("Maximum {} characters allowed", n),
            Check::Min(n) => format!("Value must be at least {}", n),
            Check::Max(n) => format!("Value must be at most {}", n),
            Check::Pattern(_) => PATTERN_MESSAGE.to_string(),
            Check::Custom(_) => CUSTOM_MESSAGE.to_string(),
        }
    }

    /// Returns the failure message, or `None` when the value passes.
    fn evaluate(
        &self,
        value: &FieldValue,
        values: &FormValues,
        message: Option<&str>,
    ) -> Option<String> {
        let failed = match self {
            Check::Required => value.is_blank(),
            Check::Email => value.is_truthy() && !is_valid_email(&value.as_text()),
            Check::Phone => value.is_truthy() && !is_valid_phone(&value.as_text()),
            // A zero length limit is treated as unset.
            Check::MinLength(min) => {
                *min > 0 && value.is_truthy() && value.text_len().is_some_and(|len| len < *min)
            }
            Check::MaxLength(max) => {
                *max > 0 && value.is_truthy() && value.text_len().is_some_and(|len| len > *max)
            }
            Check::Min(min) => value.numeric().is_some_and(|n| n < *min),
            Check::Max(max) => value.numeric().is_some_and(|n| n > *max),
            Check::Pattern(re) => value.is_truthy() && !re.is_match(&value.as_text()),
            Check::Custom(validate) => {
                return match validate(value, values) {
                    Verdict::Pass => None,
                    Verdict::Fail => Some(
                        message
                            .map(str::to_string)
                            .unwrap_or_else(|| self.default_message()),
                    ),
                    Verdict::FailWith(msg) if msg.is_empty() => None,
                    Verdict::FailWith(msg) => Some(msg),
                };
            }
        };

        failed.then(|| {
            message
                .map(str::to_string)
                .unwrap_or_else(|| self.default_message())
        })
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Required => write!(f, "Required"),
            Check::Email => write!(f, "Email"),
            Check::Phone => write!(f, "Phone"),
            Check::MinLength(n) => write!(f, "MinLength({})", n),
            Check::MaxLength(n) => write!(f, "MaxLength({})", n),
            Check::Min(n) => write!(f, "Min({})", n),
            Check::Max(n) => write!(f, "Max({})", n),
            Check::Pattern(re) => write!(f, "Pattern({})", re.as_str()),
            Check::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

#[derive(Debug, Clone)]
struct RuleCheck {
    check: Check,
    message: Option<String>,
}

// =============================================================================
// Field Rule
// =============================================================================

/// Declarative constraints for one field.
///
/// Built with chained calls; adding a check of a kind that is already
/// present replaces it. The `*_message` methods override the message of
/// the most recently added check of that kind.
///
/// ## Example
/// ```rust
/// use foodie_core::validation::FieldRule;
///
/// let rule = FieldRule::new()
///     .required()
///     .required_message("Tell us your name")
///     .min_length(2);
/// assert!(rule.is_required());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldRule {
    disabled: bool,
    checks: Vec<RuleCheck>,
}

impl FieldRule {
    /// Creates a rule with no constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a check, keeping evaluation order.
    pub fn check(mut self, check: Check) -> Self {
        let kind = mem::discriminant(&check);
        self.checks.retain(|c| mem::discriminant(&c.check) != kind);
        let pos = self
            .checks
            .iter()
            .position(|c| c.check.precedence() > check.precedence())
            .unwrap_or(self.checks.len());
        self.checks.insert(
            pos,
            RuleCheck {
                check,
                message: None,
            },
        );
        self
    }

    fn with_message(mut self, precedence: u8, message: impl Into<String>) -> Self {
        if let Some(c) = self
            .checks
            .iter_mut()
            .find(|c| c.check.precedence() == precedence)
        {
            c.message = Some(message.into());
        }
        self
    }

    /// Skips every other check; the field is always valid.
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn required(self) -> Self {
        self.check(Check::Required)
    }

    pub fn required_message(self, message: impl Into<String>) -> Self {
        self.with_message(0, message)
    }

    pub fn email(self) -> Self {
        self.check(Check::Email)
    }

    pub fn email_message(self, message: impl Into<String>) -> Self {
        self.with_message(1, message)
    }

    pub fn phone(self) -> Self {
        self.check(Check::Phone)
    }

    pub fn phone_message(self, message: impl Into<String>) -> Self {
        self.with_message(2, message)
    }

    pub fn min_length(self, min: usize) -> Self {
        self.check(Check::MinLength(min))
    }

    pub fn min_length_message(self, message: impl Into<String>) -> Self {
        self.with_message(3, message)
    }

    pub fn max_length(self, max: usize) -> Self {
        self.check(Check::MaxLength(max))
    }

    pub fn max_length_message(self, message: impl Into<String>) -> Self {
        self.with_message(4, message)
    }

    pub fn min(self, min: f64) -> Self {
        self.check(Check::Min(min))
    }

    pub fn min_message(self, message: impl Into<String>) -> Self {
        self.with_message(5, message)
    }

    pub fn max(self, max: f64) -> Self {
        self.check(Check::Max(max))
    }

    pub fn max_message(self, message: impl Into<String>) -> Self {
        self.with_message(6, message)
    }

    pub fn pattern(self, pattern: Regex) -> Self {
        self.check(Check::Pattern(pattern))
    }

    pub fn pattern_message(self, message: impl Into<String>) -> Self {
        self.with_message(7, message)
    }

    /// Adds a custom validator, run after every built-in check.
    pub fn validate<F>(self, validator: F) -> Self
    where
        F: Fn(&FieldValue, &FormValues) -> Verdict + Send + Sync + 'static,
    {
        self.check(Check::Custom(Arc::new(validator)))
    }

    pub fn validate_message(self, message: impl Into<String>) -> Self {
        self.with_message(8, message)
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_required(&self) -> bool {
        self.checks
            .iter()
            .any(|c| matches!(c.check, Check::Required))
    }

    /// Checks in evaluation order.
    pub fn checks(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().map(|c| &c.check)
    }
}

// =============================================================================
// Rule Set
// =============================================================================

/// Rules for a whole form, keyed by field name in declaration order.
///
/// Declaration order matters: it decides which invalid field is reported
/// first (and focused) after a whole-form validation.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: IndexMap<String, FieldRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`RuleSet::insert`].
    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.insert(name, rule);
        self
    }

    /// Adds or replaces the rule for `name`. Replacing keeps the field's
    /// original position.
    pub fn insert(&mut self, name: impl Into<String>, rule: FieldRule) {
        self.rules.insert(name.into(), rule);
    }

    pub fn get(&self, name: &str) -> Option<&FieldRule> {
        self.rules.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldRule)> {
        self.rules.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// =============================================================================
// Validators
// =============================================================================

/// Validates one value against one rule.
///
/// Returns the first failing check's message, or `None` when the value is
/// valid. A missing value (`None`) is treated as [`FieldValue::Null`].
/// Never mutates anything; `values` is the whole form, passed through to
/// custom validators.
pub fn validate_field(
    name: &str,
    value: Option<&FieldValue>,
    rule: &FieldRule,
    values: &FormValues,
) -> Option<String> {
    if rule.disabled {
        return None;
    }

    let null = FieldValue::Null;
    let value = value.unwrap_or(&null);

    let error = rule
        .checks
        .iter()
        .find_map(|c| c.check.evaluate(value, values, c.message.as_deref()));

    trace!(field = %name, error = ?error, "Field validated");
    error
}

/// Email syntax check: `something@something.tld`, no whitespace.
///
/// ## Example
/// ```rust
/// use foodie_core::validation::is_valid_email;
///
/// assert!(is_valid_email("chef@example.com"));
/// assert!(!is_valid_email("chef@example"));
/// ```
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"))
        .is_match(email)
}

/// Phone syntax check: optional `+`, then up to 16 digits not starting with
/// zero. Spaces, dashes and parentheses are ignored.
///
/// ## Example
/// ```rust
/// use foodie_core::validation::is_valid_phone;
///
/// assert!(is_valid_phone("+1 (555) 010-9999"));
/// assert!(!is_valid_phone("0123"));
/// ```
pub fn is_valid_phone(phone: &str) -> bool {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    let stripped: String = phone
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect();
    PHONE
        .get_or_init(|| Regex::new(r"^\+?[1-9][0-9]{0,15}$").expect("phone regex is valid"))
        .is_match(&stripped)
}

// =============================================================================
// Unit Tests
// =============================================================================
