//! Card number normalization, checksums and masking.

use serde::{Deserialize, Serialize};

use super::brand::{CardBrand, CheckAlgorithm, detect_brand};

/// Minimum number of digits in a real card number.
const MIN_NUMBER_LENGTH: usize = 12;

/// Naranja check-digit weights applied to the first fifteen digits.
const NARANJA_WEIGHTS: [u32; 15] = [4, 3, 2, 7, 6, 5, 4, 3, 2, 7, 6, 5, 4, 3, 2];

/// Outcome requested by a test-mode sentinel number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome {
    /// The test gateway should approve the transaction.
    Success,
    /// The test gateway should decline the transaction.
    Failure,
    /// The test gateway should report a processing error.
    Error,
}

/// Maps a test-mode sentinel number to the outcome it requests.
///
/// `"1"`/`"success"` approve, `"2"`/`"failure"`/`"fail"` decline and
/// `"3"`/`"error"` error. Any other number returns `None`.
///
/// # Examples
///
/// ```
/// use paygate::card::{TestOutcome, test_outcome};
///
/// assert_eq!(test_outcome("1"), Some(TestOutcome::Success));
/// assert_eq!(test_outcome("error"), Some(TestOutcome::Error));
/// assert_eq!(test_outcome("4242424242424242"), None);
/// ```
#[must_use]
pub fn test_outcome(number: &str) -> Option<TestOutcome> {
    match number {
        "1" | "success" => Some(TestOutcome::Success),
        "2" | "failure" | "fail" => Some(TestOutcome::Failure),
        "3" | "error" => Some(TestOutcome::Error),
        _ => None,
    }
}

/// Returns true if `number` is one of the test-mode sentinels.
#[must_use]
pub fn is_test_sentinel(number: &str) -> bool {
    test_outcome(number).is_some()
}

/// Validates a card number.
///
/// In test mode the sentinel values accepted by [`test_outcome`] are always
/// valid. Otherwise the number must have at least twelve digits, contain only
/// digits (spaces are tolerated for brands that print them), and pass the
/// detected brand's check-digit algorithm.
///
/// # Examples
///
/// ```
/// use paygate::card::is_valid_number;
///
/// assert!(is_valid_number("4242424242424242", false));
/// assert!(!is_valid_number("4242424242424241", false));
/// assert!(is_valid_number("success", true));
/// assert!(!is_valid_number("success", false));
/// ```
#[must_use]
pub fn is_valid_number(number: &str, test_mode: bool) -> bool {
    if test_mode && is_test_sentinel(number) {
        return true;
    }

    let brand = detect_brand(number);
    let allows_spaces = brand.is_some_and(CardBrand::allows_spaces);

    let digit_count = number.bytes().filter(u8::is_ascii_digit).count();
    if digit_count < MIN_NUMBER_LENGTH || !has_valid_characters(number, allows_spaces) {
        return false;
    }

    match brand.map_or(CheckAlgorithm::Luhn, CardBrand::check_algorithm) {
        CheckAlgorithm::Luhn => luhn_valid(number),
        CheckAlgorithm::Mod11 => naranja_valid(number),
        CheckAlgorithm::LuhnIgnoringSpaces => luhn_valid(&strip_spaces(number)),
    }
}

fn has_valid_characters(number: &str, allows_spaces: bool) -> bool {
    number.bytes().all(|b| b.is_ascii_digit() || (allows_spaces && b == b' '))
}

fn strip_spaces(number: &str) -> String {
    number.chars().filter(|c| *c != ' ').collect()
}

/// Checks the mod-10 (Luhn) checksum of an all-digit string.
///
/// Starting from the rightmost digit, every second digit is doubled and 9 is
/// subtracted when the doubled value exceeds 9. The number is valid when the
/// total is divisible by 10. Non-digit input is never valid.
///
/// # Examples
///
/// ```
/// use paygate::card::luhn_valid;
///
/// assert!(luhn_valid("4111111111111111"));
/// assert!(!luhn_valid("4111111111111112"));
/// ```
#[must_use]
pub fn luhn_valid(number: &str) -> bool {
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let sum: u32 = number
        .bytes()
        .rev()
        .map(|b| u32::from(b - b'0'))
        .enumerate()
        .map(|(position, digit)| {
            if position % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();

    sum % 10 == 0
}

/// Weighted mod-11 check used by Naranja cards.
fn naranja_valid(number: &str) -> bool {
    let digits: Vec<u32> = number.bytes().map(|b| u32::from(b - b'0')).collect();
    if digits.len() != 16 {
        return false;
    }

    let sum: u32 = digits.iter().zip(NARANJA_WEIGHTS).map(|(digit, weight)| digit * weight).sum();
    let check = match 11 - sum % 11 {
        value if value > 9 => 0,
        value => value,
    };

    digits[15] == check
}

/// Masks a card number for display.
///
/// Every digit except the last four is hidden behind a fixed
/// `XXXX-XXXX-XXXX-` prefix. Empty input masks to an empty string.
///
/// # Examples
///
/// ```
/// use paygate::card::mask;
///
/// assert_eq!(mask("4242424242424242"), "XXXX-XXXX-XXXX-4242");
/// assert_eq!(mask(""), "");
/// ```
#[must_use]
pub fn mask(number: &str) -> String {
    if number.is_empty() {
        return String::new();
    }
    format!("XXXX-XXXX-XXXX-{}", last_digits(number))
}

/// Returns the first six characters of the number (the BIN).
#[must_use]
pub fn first_digits(number: &str) -> &str {
    number.get(..6).unwrap_or(number)
}

/// Returns the last four characters of the number.
#[must_use]
pub fn last_digits(number: &str) -> &str {
    number.len().checked_sub(4).and_then(|start| number.get(start..)).unwrap_or(number)
}

/// Removes characters a card number may not contain.
///
/// Everything except digits is dropped, and spaces are also kept when the
/// number belongs to a brand that prints them.
#[must_use]
pub fn normalize_number(raw: &str) -> String {
    let allows_spaces = detect_brand(raw.trim()).is_some_and(CardBrand::allows_spaces);
    let source = if allows_spaces { raw.trim() } else { raw };
    source.chars().filter(|c| c.is_ascii_digit() || (allows_spaces && *c == ' ')).collect()
}
