//! Integration tests for card validation through the public API.

use chrono::{DateTime, TimeZone, Utc};
use paygate::card::{CardBrand, CardField, CardPolicy, CreditCard, detect_brand, mask};
use serde_json::json;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

#[test]
fn test_checkout_form_card_is_normalized_and_valid() {
    let card = CreditCard::new()
        .with_number(" 3782-822463-10005 ")
        .with_expiry("07", "2028")
        .with_name("Mary Ann Smith")
        .with_verification_value("1234");

    assert_eq!(card.number(), "378282246310005");
    assert_eq!(card.brand(), Some("american_express"));
    assert_eq!(card.year(), Some(2028));
    assert_eq!(card.first_name(), Some("Mary Ann"));
    assert_eq!(card.display_number(), mask("378282246310005"));
    assert!(card.validate_at(&CardPolicy::default(), now()).is_empty());
}

#[test]
fn test_errors_serialize_by_field() {
    let card = CreditCard::new()
        .with_number("4242424242424241")
        .with_expiry(5, 2025)
        .with_verification_value("12");

    let errors = card.validate_at(&CardPolicy::default(), now());

    assert_eq!(
        serde_json::to_value(&errors).unwrap(),
        json!({
            "first_name": ["cannot be empty"],
            "last_name": ["cannot be empty"],
            "year": ["expired"],
            "number": ["is not a valid credit card number"],
            "verification_value": ["should be 3 digits"]
        })
    );
}

#[test]
fn test_policy_from_toml_relaxes_requirements() {
    let policy = CardPolicy::from_toml(
        r#"
        require_name = false
        require_verification_value = false
        "#,
    )
    .expect("policy should parse");
    let card = CreditCard::new().with_number("5105105105105100").with_expiry(12, 2030);

    assert!(card.validate_at(&policy, now()).is_empty());
    assert!(!card.validate_at(&CardPolicy::default(), now()).is_empty());
}

#[test]
fn test_card_override_beats_policy() {
    let card = CreditCard::new()
        .with_number("4242424242424242")
        .with_expiry(12, 2030)
        .with_require_name(false)
        .with_require_verification_value(false);

    assert!(card.validate_at(&CardPolicy::default(), now()).is_empty());
}

#[test]
fn test_declared_brand_must_match_number() {
    let card = CreditCard::new()
        .with_number("4242424242424242")
        .with_brand("master")
        .with_expiry(12, 2030)
        .with_name("Longbob Longsen")
        .with_verification_value("123");

    let errors = card.validate_at(&CardPolicy::default(), now());
    assert_eq!(errors.get(CardField::Brand), ["does not match the card number"]);
    assert_eq!(detect_brand(card.number()).map(CardBrand::tag), Some("visa"));
}

#[test]
fn test_sentinel_numbers_only_in_test_mode() {
    let card = CreditCard::new()
        .with_number("1")
        .with_expiry(12, 2030)
        .with_name("Longbob Longsen")
        .with_verification_value("123");

    let live = card.validate_at(&CardPolicy::default(), now());
    assert!(live.contains(CardField::Number));

    let test = card.validate_at(&CardPolicy::default().with_test_mode(true), now());
    assert!(!test.contains(CardField::Number));
}

#[test]
fn test_far_future_year_rejected() {
    let card = CreditCard::new()
        .with_number("4242424242424242")
        .with_expiry(1, 2046)
        .with_name("Longbob Longsen")
        .with_verification_value("123");

    let errors = card.validate_at(&CardPolicy::default(), now());
    assert_eq!(errors.get(CardField::Year), ["is not a valid year"]);
    assert_eq!(errors.to_string(), "year is not a valid year");
}
