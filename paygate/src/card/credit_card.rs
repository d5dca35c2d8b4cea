//! The credit card entity and its validation rules.

use std::fmt;

use chrono::{DateTime, Datelike, Utc};

use super::{
    brand::{CardBrand, detect_brand},
    errors::{CardField, ValidationErrors},
    expiry::{ExpiryDate, ExpiryPart},
    number::{self, is_valid_number, normalize_number},
    policy::CardPolicy,
};

/// Brand tag that switches off number and brand checks.
pub const BOGUS_BRAND: &str = "bogus";

/// Cardholder and card data for a single transaction.
///
/// Numbers are normalized when set, and month/year values go through
/// [`ExpiryPart`]. The `Debug` output masks the number and hides the
/// verification value.
///
/// # Examples
///
/// ```
/// use chrono::{Datelike, Utc};
/// use paygate::card::{CardPolicy, CreditCard};
///
/// let card = CreditCard::new()
///     .with_number("4242 4242 4242 4242")
///     .with_expiry(12, Utc::now().year() + 1)
///     .with_name("Longbob Longsen")
///     .with_verification_value("123");
///
/// assert_eq!(card.number(), "4242424242424242");
/// assert_eq!(card.brand(), Some("visa"));
/// assert_eq!(card.display_number(), "XXXX-XXXX-XXXX-4242");
/// assert!(card.is_valid(&CardPolicy::default()));
/// ```
#[derive(Clone, Default)]
pub struct CreditCard {
    number: String,
    brand: Option<String>,
    month: Option<i32>,
    year: Option<i32>,
    start_month: Option<i32>,
    start_year: Option<i32>,
    first_name: Option<String>,
    last_name: Option<String>,
    verification_value: Option<String>,
    issue_number: Option<String>,
    track_data: Option<String>,
    icc_data: Option<String>,
    manual_entry: bool,
    read_method: Option<String>,
    require_verification_value: Option<bool>,
    require_name: Option<bool>,
}

impl fmt::Debug for CreditCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreditCard")
            .field("number", &self.display_number())
            .field("brand", &self.brand())
            .field("month", &self.month)
            .field("year", &self.year)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("verification_value", &self.verification_value.as_ref().map(|_| "[FILTERED]"))
            .field("emv", &self.is_emv())
            .finish_non_exhaustive()
    }
}

impl CreditCard {
    /// Creates an empty card.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the card number, dropping characters a number may not contain.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl AsRef<str> is idiomatic for builder methods"
    )]
    pub fn with_number(mut self, number: impl AsRef<str>) -> Self {
        self.set_number(number);
        self
    }

    /// Declares the card brand. Stored lowercase.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl AsRef<str> is idiomatic for builder methods"
    )]
    pub fn with_brand(mut self, brand: impl AsRef<str>) -> Self {
        let brand = brand.as_ref().trim().to_lowercase();
        self.brand = (!brand.is_empty()).then_some(brand);
        self
    }

    /// Sets the expiry month.
    #[must_use]
    pub fn with_month(mut self, month: impl ExpiryPart) -> Self {
        self.month = month.normalize();
        self
    }

    /// Sets the expiry year.
    #[must_use]
    pub fn with_year(mut self, year: impl ExpiryPart) -> Self {
        self.year = year.normalize();
        self
    }

    /// Sets the expiry month and year.
    #[must_use]
    pub fn with_expiry(self, month: impl ExpiryPart, year: impl ExpiryPart) -> Self {
        self.with_month(month).with_year(year)
    }

    /// Sets the start month (some debit cards print one).
    #[must_use]
    pub fn with_start_month(mut self, month: impl ExpiryPart) -> Self {
        self.start_month = month.normalize();
        self
    }

    /// Sets the start year.
    #[must_use]
    pub fn with_start_year(mut self, year: impl ExpiryPart) -> Self {
        self.start_year = year.normalize();
        self
    }

    /// Sets the cardholder first name.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    /// Sets the cardholder last name.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    /// Sets both names from a full name. See [`set_name`](Self::set_name).
    #[must_use]
    pub fn with_name(mut self, full_name: &str) -> Self {
        self.set_name(full_name);
        self
    }

    /// Sets the card verification value.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_verification_value(mut self, value: impl Into<String>) -> Self {
        self.verification_value = Some(value.into());
        self
    }

    /// Sets the issue number (some debit cards print one).
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_issue_number(mut self, issue_number: impl Into<String>) -> Self {
        self.issue_number = Some(issue_number.into());
        self
    }

    /// Attaches raw magnetic stripe data.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_track_data(mut self, track_data: impl Into<String>) -> Self {
        self.track_data = Some(track_data.into());
        self
    }

    /// Attaches raw EMV chip data.
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_icc_data(mut self, icc_data: impl Into<String>) -> Self {
        self.icc_data = Some(icc_data.into());
        self
    }

    /// Marks the card as keyed in by hand.
    #[must_use]
    pub const fn with_manual_entry(mut self, manual_entry: bool) -> Self {
        self.manual_entry = manual_entry;
        self
    }

    /// Records how the card was read (e.g. `"contactless"`).
    #[must_use]
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl Into<String> is idiomatic for builder methods"
    )]
    pub fn with_read_method(mut self, read_method: impl Into<String>) -> Self {
        self.read_method = Some(read_method.into());
        self
    }

    /// Overrides the policy's verification value requirement for this card.
    #[must_use]
    pub const fn with_require_verification_value(mut self, required: bool) -> Self {
        self.require_verification_value = Some(required);
        self
    }

    /// Overrides the policy's name requirement for this card.
    #[must_use]
    pub const fn with_require_name(mut self, required: bool) -> Self {
        self.require_name = Some(required);
        self
    }

    /// Replaces the card number, dropping characters a number may not contain.
    #[allow(
        clippy::impl_trait_in_params,
        reason = "impl AsRef<str> is idiomatic for setters"
    )]
    pub fn set_number(&mut self, number: impl AsRef<str>) {
        self.number = normalize_number(number.as_ref());
    }

    /// Splits a full name into first and last name.
    ///
    /// The last word becomes the last name and the rest the first name.
    ///
    /// # Examples
    ///
    /// ```
    /// use paygate::card::CreditCard;
    ///
    /// let mut card = CreditCard::new();
    /// card.set_name("Mary Ann Smith");
    /// assert_eq!(card.first_name(), Some("Mary Ann"));
    /// assert_eq!(card.last_name(), Some("Smith"));
    /// assert_eq!(card.name(), "Mary Ann Smith");
    /// ```
    pub fn set_name(&mut self, full_name: &str) {
        let mut words: Vec<&str> = full_name.split_whitespace().collect();
        self.last_name = words.pop().map(str::to_owned);
        self.first_name = Some(words.join(" "));
    }

    /// Normalized card number.
    #[must_use]
    pub fn number(&self) -> &str {
        &self.number
    }

    /// Resolved brand tag: the declared brand, else the detected one.
    #[must_use]
    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref().or_else(|| detect_brand(&self.number).map(CardBrand::tag))
    }

    /// Resolved brand, if it is a supported one.
    #[must_use]
    pub fn card_brand(&self) -> Option<CardBrand> {
        self.brand().and_then(CardBrand::from_tag)
    }

    /// Returns true if the card uses the test brand.
    #[must_use]
    pub fn is_bogus(&self) -> bool {
        self.brand() == Some(BOGUS_BRAND)
    }

    /// Expiry month.
    #[must_use]
    pub const fn month(&self) -> Option<i32> {
        self.month
    }

    /// Expiry year.
    #[must_use]
    pub const fn year(&self) -> Option<i32> {
        self.year
    }

    /// Start month.
    #[must_use]
    pub const fn start_month(&self) -> Option<i32> {
        self.start_month
    }

    /// Start year.
    #[must_use]
    pub const fn start_year(&self) -> Option<i32> {
        self.start_year
    }

    /// Cardholder first name.
    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    /// Cardholder last name.
    #[must_use]
    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    /// Full cardholder name.
    #[must_use]
    pub fn name(&self) -> String {
        let first = self.first_name().unwrap_or_default();
        let last = self.last_name().unwrap_or_default();
        format!("{first} {last}").trim().to_owned()
    }

    /// Returns true if either name is present.
    #[must_use]
    pub fn has_name(&self) -> bool {
        !is_blank(self.first_name()) || !is_blank(self.last_name())
    }

    /// Card verification value.
    #[must_use]
    pub fn verification_value(&self) -> Option<&str> {
        self.verification_value.as_deref()
    }

    /// Returns true if a non-blank verification value is present.
    #[must_use]
    pub fn has_verification_value(&self) -> bool {
        !is_blank(self.verification_value())
    }

    /// Issue number.
    #[must_use]
    pub fn issue_number(&self) -> Option<&str> {
        self.issue_number.as_deref()
    }

    /// Raw magnetic stripe data.
    #[must_use]
    pub fn track_data(&self) -> Option<&str> {
        self.track_data.as_deref()
    }

    /// Raw EMV chip data.
    #[must_use]
    pub fn icc_data(&self) -> Option<&str> {
        self.icc_data.as_deref()
    }

    /// Returns true if the card was keyed in by hand.
    #[must_use]
    pub const fn is_manual_entry(&self) -> bool {
        self.manual_entry
    }

    /// How the card was read.
    #[must_use]
    pub fn read_method(&self) -> Option<&str> {
        self.read_method.as_deref()
    }

    /// Returns true if the card carries EMV chip data.
    #[must_use]
    pub fn is_emv(&self) -> bool {
        !is_blank(self.icc_data())
    }

    /// Masked number for display.
    #[must_use]
    pub fn display_number(&self) -> String {
        number::mask(&self.number)
    }

    /// First six digits of the number.
    #[must_use]
    pub fn first_digits(&self) -> &str {
        number::first_digits(&self.number)
    }

    /// Last four digits of the number.
    #[must_use]
    pub fn last_digits(&self) -> &str {
        number::last_digits(&self.number)
    }

    /// Expiry date. Missing parts read as zero, which is always expired.
    #[must_use]
    pub fn expiry_date(&self) -> ExpiryDate {
        ExpiryDate::new(self.month.unwrap_or_default(), self.year.unwrap_or_default())
    }

    /// Returns true if the card has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expiry_date().is_expired()
    }

    /// Whether this card needs a verification value under `policy`.
    #[must_use]
    pub fn requires_verification_value(&self, policy: &CardPolicy) -> bool {
        self.require_verification_value.unwrap_or(policy.require_verification_value)
    }

    /// Whether this card needs a cardholder name under `policy`.
    #[must_use]
    pub fn requires_name(&self, policy: &CardPolicy) -> bool {
        self.require_name.unwrap_or(policy.require_name)
    }

    /// Returns true if [`validate`](Self::validate) reports no errors.
    #[must_use]
    pub fn is_valid(&self, policy: &CardPolicy) -> bool {
        self.validate(policy).is_empty()
    }

    /// Validates the card against `policy` at the current time.
    #[must_use]
    pub fn validate(&self, policy: &CardPolicy) -> ValidationErrors {
        self.validate_at(policy, Utc::now())
    }

    /// Validates the card against `policy` as if the time were `now`.
    ///
    /// Checks run in order: cardholder name, expiry date, then (unless the
    /// card uses the bogus brand) brand and number, then verification value.
    /// A brand mismatch is only reported when the brand and number checks
    /// themselves found nothing.
    #[must_use]
    pub fn validate_at(&self, policy: &CardPolicy, now: DateTime<Utc>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        self.validate_name(policy, &mut errors);
        self.validate_expiry(policy, now, &mut errors);

        if self.is_bogus() {
            return errors;
        }

        errors.extend(self.validate_brand_and_number(policy));
        self.validate_verification_value(policy, &mut errors);

        errors
    }

    fn validate_name(&self, policy: &CardPolicy, errors: &mut ValidationErrors) {
        if !self.requires_name(policy) {
            return;
        }
        if is_blank(self.first_name()) {
            errors.add(CardField::FirstName, "cannot be empty");
        }
        if is_blank(self.last_name()) {
            errors.add(CardField::LastName, "cannot be empty");
        }
    }

    fn validate_expiry(
        &self,
        policy: &CardPolicy,
        now: DateTime<Utc>,
        errors: &mut ValidationErrors,
    ) {
        let (Some(month), Some(year)) = (self.month, self.year) else {
            if self.month.is_none() {
                errors.add(CardField::Month, "is required");
            }
            if self.year.is_none() {
                errors.add(CardField::Year, "is required");
            }
            return;
        };

        if !(1..=12).contains(&month) {
            errors.add(CardField::Month, "is not a valid month");
        }

        if ExpiryDate::new(month, year).is_expired_at(now) {
            errors.add(CardField::Year, "expired");
        } else {
            let this_year = now.year();
            if !(this_year..=this_year.saturating_add(policy.max_years_ahead)).contains(&year) {
                errors.add(CardField::Year, "is not a valid year");
            }
        }
    }

    fn validate_brand_and_number(&self, policy: &CardPolicy) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        if let Some(brand) = self.brand.as_deref()
            && CardBrand::from_tag(brand).is_none()
        {
            errors.add(CardField::Brand, "is invalid");
        }

        if self.number.is_empty() {
            errors.add(CardField::Number, "is required");
        } else if !is_valid_number(&self.number, policy.test_mode) {
            errors.add(CardField::Number, "is not a valid credit card number");
        }

        if errors.is_empty() && detect_brand(&self.number).map(CardBrand::tag) != self.brand() {
            errors.add(CardField::Brand, "does not match the card number");
        }

        errors
    }

    fn validate_verification_value(&self, policy: &CardPolicy, errors: &mut ValidationErrors) {
        let expected = self.card_brand().map_or(3, CardBrand::verification_value_length);

        match self.verification_value().filter(|value| !value.trim().is_empty()) {
            Some(value) => {
                if value.len() != expected || !value.bytes().all(|b| b.is_ascii_digit()) {
                    errors.add(
                        CardField::VerificationValue,
                        format!("should be {expected} digits"),
                    );
                }
            }
            None if self.requires_verification_value(policy) => {
                errors.add(CardField::VerificationValue, "is required");
            }
            None => {}
        }
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn valid_card() -> CreditCard {
        CreditCard::new()
            .with_number("4242424242424242")
            .with_expiry(9, 2027)
            .with_first_name("Longbob")
            .with_last_name("Longsen")
            .with_verification_value("123")
    }

    #[test]
    fn test_valid_card_has_no_errors() {
        let errors = valid_card().validate_at(&CardPolicy::default(), now());
        assert!(errors.is_empty(), "unexpected errors: {errors}");
    }

    #[test]
    fn test_number_is_normalized() {
        let card = CreditCard::new().with_number("4242-4242-4242-4242");
        assert_eq!(card.number(), "4242424242424242");
    }

    #[test]
    fn test_bp_plus_keeps_spaces() {
        let card = CreditCard::new().with_number("70501 234567890 126");
        assert_eq!(card.number(), "70501 234567890 126");
        assert_eq!(card.card_brand(), Some(CardBrand::BpPlus));
    }

    #[test]
    fn test_missing_names() {
        let card = valid_card().with_first_name("  ").with_last_name("");
        let errors = card.validate_at(&CardPolicy::default(), now());
        assert_eq!(errors.get(CardField::FirstName), ["cannot be empty"]);
        assert_eq!(errors.get(CardField::LastName), ["cannot be empty"]);
    }

    #[test]
    fn test_name_not_required_by_policy() {
        let card = CreditCard { first_name: None, last_name: None, ..valid_card() };
        let policy = CardPolicy::default().with_require_name(false);
        assert!(card.validate_at(&policy, now()).is_empty());
    }

    #[test]
    fn test_name_requirement_overridden_per_card() {
        let card = CreditCard { first_name: None, last_name: None, ..valid_card() }
            .with_require_name(false);
        assert!(card.validate_at(&CardPolicy::default(), now()).is_empty());

        let strict = CardPolicy::default().with_require_name(false);
        let card = CreditCard { first_name: None, ..valid_card() }.with_require_name(true);
        assert!(card.validate_at(&strict, now()).contains(CardField::FirstName));
    }

    #[test]
    fn test_missing_month_and_year() {
        let card = CreditCard { month: None, year: None, ..valid_card() };
        let errors = card.validate_at(&CardPolicy::default(), now());
        assert_eq!(errors.get(CardField::Month), ["is required"]);
        assert_eq!(errors.get(CardField::Year), ["is required"]);
    }

    #[test]
    fn test_zero_and_blank_expiry_parts_are_missing() {
        let card = valid_card().with_expiry("", 0);
        let errors = card.validate_at(&CardPolicy::default(), now());
        assert_eq!(errors.get(CardField::Month), ["is required"]);
        assert_eq!(errors.get(CardField::Year), ["is required"]);
    }

    #[test]
    fn test_invalid_month_is_also_expired() {
        let card = valid_card().with_month(13);
        let errors = card.validate_at(&CardPolicy::default(), now());
        assert_eq!(errors.get(CardField::Month), ["is not a valid month"]);
        assert_eq!(errors.get(CardField::Year), ["expired"]);
    }

    #[test]
    fn test_expired_card() {
        let card = valid_card().with_expiry(5, 2025);
        let errors = card.validate_at(&CardPolicy::default(), now());
        assert_eq!(errors.get(CardField::Year), ["expired"]);
        assert!(!errors.contains(CardField::Month));
    }

    #[test]
    fn test_current_month_not_expired() {
        let card = valid_card().with_expiry(6, 2025);
        assert!(card.validate_at(&CardPolicy::default(), now()).is_empty());
    }

    #[test]
    fn test_year_too_far_ahead() {
        let card = valid_card().with_year(2046);
        let errors = card.validate_at(&CardPolicy::default(), now());
        assert_eq!(errors.get(CardField::Year), ["is not a valid year"]);

        let card = valid_card().with_year(2045);
        assert!(card.validate_at(&CardPolicy::default(), now()).is_empty());
    }

    #[test]
    fn test_bogus_card_skips_number_checks() {
        let card = valid_card().with_brand("bogus").with_number("4242424242424241");
        assert!(card.validate_at(&CardPolicy::default(), now()).is_empty());
    }

    #[test]
    fn test_bogus_card_still_checks_dates() {
        let card = valid_card().with_brand("Bogus").with_number("1").with_expiry(1, 2020);
        let errors = card.validate_at(&CardPolicy::default(), now());
        assert_eq!(errors.get(CardField::Year), ["expired"]);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_invalid_number() {
        let card = valid_card().with_number("4242424242424241");
        let errors = card.validate_at(&CardPolicy::default(), now());
        assert_eq!(errors.get(CardField::Number), ["is not a valid credit card number"]);
        assert!(!errors.contains(CardField::Brand));
    }

    #[test]
    fn test_missing_number() {
        let card = CreditCard { number: String::new(), ..valid_card() };
        let errors = card.validate_at(&CardPolicy::default(), now());
        assert_eq!(errors.get(CardField::Number), ["is required"]);
    }

    #[test]
    fn test_unknown_brand_is_invalid() {
        let card = valid_card().with_brand("laser");
        let errors = card.validate_at(&CardPolicy::default(), now());
        assert_eq!(errors.get(CardField::Brand), ["is invalid"]);
    }

    #[test]
    fn test_brand_mismatch() {
        let card = valid_card().with_brand("master");
        let errors = card.validate_at(&CardPolicy::default(), now());
        assert_eq!(errors.get(CardField::Brand), ["does not match the card number"]);
    }

    #[test]
    fn test_brand_mismatch_reported_alongside_date_errors() {
        let card = valid_card().with_brand("master").with_expiry(1, 2020);
        let errors = card.validate_at(&CardPolicy::default(), now());
        assert!(errors.contains(CardField::Year));
        assert_eq!(errors.get(CardField::Brand), ["does not match the card number"]);
    }

    #[test]
    fn test_brand_mismatch_suppressed_by_number_error() {
        let card = valid_card().with_brand("master").with_number("4242424242424241");
        let errors = card.validate_at(&CardPolicy::default(), now());
        assert!(errors.contains(CardField::Number));
        assert!(!errors.contains(CardField::Brand));
    }

    #[test]
    fn test_sentinel_numbers_in_test_mode() {
        let card = CreditCard { number: "success".to_owned(), ..valid_card() };
        let policy = CardPolicy::default().with_test_mode(true);
        assert!(card.validate_at(&policy, now()).is_empty());
        assert!(card.validate_at(&CardPolicy::default(), now()).contains(CardField::Number));
    }

    #[test]
    fn test_verification_value_length() {
        let card = valid_card().with_verification_value("12");
        let errors = card.validate_at(&CardPolicy::default(), now());
        assert_eq!(errors.get(CardField::VerificationValue), ["should be 3 digits"]);

        let amex = valid_card().with_number("378282246310005").with_verification_value("123");
        let errors = amex.validate_at(&CardPolicy::default(), now());
        assert_eq!(errors.get(CardField::VerificationValue), ["should be 4 digits"]);

        let amex = amex.with_verification_value("1234");
        assert!(amex.validate_at(&CardPolicy::default(), now()).is_empty());
    }

    #[test]
    fn test_verification_value_must_be_digits() {
        let card = valid_card().with_verification_value("12a");
        let errors = card.validate_at(&CardPolicy::default(), now());
        assert_eq!(errors.get(CardField::VerificationValue), ["should be 3 digits"]);
    }

    #[test]
    fn test_verification_value_requirement() {
        let card = CreditCard { verification_value: None, ..valid_card() };
        let errors = card.validate_at(&CardPolicy::default(), now());
        assert_eq!(errors.get(CardField::VerificationValue), ["is required"]);

        let relaxed = CardPolicy::default().with_require_verification_value(false);
        assert!(card.validate_at(&relaxed, now()).is_empty());

        let card = card.with_require_verification_value(false);
        assert!(card.validate_at(&CardPolicy::default(), now()).is_empty());
    }

    #[test]
    fn test_name_helpers() {
        let card = CreditCard::new().with_name("Cher");
        assert_eq!(card.first_name(), Some(""));
        assert_eq!(card.last_name(), Some("Cher"));
        assert_eq!(card.name(), "Cher");
        assert!(card.has_name());
        assert!(!CreditCard::new().has_name());
    }

    #[test]
    fn test_digits_helpers() {
        let card = valid_card();
        assert_eq!(card.first_digits(), "424242");
        assert_eq!(card.last_digits(), "4242");
        assert_eq!(card.display_number(), "XXXX-XXXX-XXXX-4242");
    }

    #[test]
    fn test_emv_and_entry_metadata() {
        let card = valid_card()
            .with_icc_data("5F2A020978")
            .with_manual_entry(true)
            .with_read_method("contactless")
            .with_track_data(concat!(
                "%B4242424242424242^LONGSEN/L^",
                "27091010000000000000000000000000000000?"
            ));
        assert!(card.is_emv());
        assert!(card.is_manual_entry());
        assert_eq!(card.read_method(), Some("contactless"));
        assert!(card.track_data().is_some());
        assert!(!valid_card().is_emv());
    }

    #[test]
    fn test_start_date() {
        let card = valid_card().with_start_month("03").with_start_year(2020);
        assert_eq!(card.start_month(), Some(3));
        assert_eq!(card.start_year(), Some(2020));
    }

    #[test]
    fn test_debug_masks_sensitive_data() {
        let debug = format!("{:?}", valid_card());
        assert!(debug.contains("XXXX-XXXX-XXXX-4242"));
        assert!(!debug.contains("4242424242424242"));
        assert!(!debug.contains("\"123\""));
    }
}
