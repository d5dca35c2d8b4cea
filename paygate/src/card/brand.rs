//! Card brand detection.
//!
//! Brands are detected with an ordered table of `(brand, predicate)` pairs.
//! The table is evaluated top to bottom and the first predicate that matches
//! wins, so brands whose prefix ranges overlap a broader brand must appear
//! before it:
//!
//! - `elo` is checked before `visa` and `discover`
//! - `dankort` and `sodexo` are checked before `maestro`
//!
//! # Examples
//!
//! ```
//! use paygate::card::{CardBrand, detect_brand};
//!
//! assert_eq!(detect_brand("4242424242424242"), Some(CardBrand::Visa));
//! assert_eq!(detect_brand("5066991111111118"), Some(CardBrand::Elo));
//! assert_eq!(detect_brand(""), None);
//! ```

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Card network or issuer family.
///
/// The serialized form is the lowercase tag used by gateways
/// (`"american_express"`, `"bp_plus"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardBrand {
    /// Visa.
    Visa,
    /// Mastercard.
    Master,
    /// Elo (Brazil).
    Elo,
    /// Cabal (Argentina).
    Cabal,
    /// Naranja (Argentina), validated with a weighted mod-11 check digit.
    Naranja,
    /// American Express.
    AmericanExpress,
    /// Diners Club.
    DinersClub,
    /// JCB.
    Jcb,
    /// Dankort (Denmark).
    Dankort,
    /// Sodexo.
    Sodexo,
    /// VR benefit cards (Brazil).
    Vr,
    /// Forbrugsforeningen (Denmark).
    Forbrugsforeningen,
    /// Maestro.
    Maestro,
    /// Discover.
    Discover,
    /// `UnionPay`.
    UnionPay,
    /// BP Plus fuel cards, whose numbers keep embedded spaces.
    BpPlus,
    /// UATP airline cards.
    Uatp,
}

/// Check-digit algorithm used by a brand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CheckAlgorithm {
    /// Standard mod-10.
    Luhn,
    /// Weighted mod-11 used by Naranja.
    Mod11,
    /// Mod-10 computed over the number with spaces removed.
    LuhnIgnoringSpaces,
}

impl CardBrand {
    /// Every supported brand, in detection order.
    pub const ALL: [Self; 17] = [
        Self::Elo,
        Self::Visa,
        Self::Master,
        Self::Cabal,
        Self::Naranja,
        Self::AmericanExpress,
        Self::DinersClub,
        Self::Jcb,
        Self::Dankort,
        Self::Sodexo,
        Self::Vr,
        Self::Forbrugsforeningen,
        Self::Maestro,
        Self::Discover,
        Self::UnionPay,
        Self::BpPlus,
        Self::Uatp,
    ];

    /// Returns the lowercase tag for this brand.
    ///
    /// # Examples
    ///
    /// ```
    /// use paygate::card::CardBrand;
    ///
    /// assert_eq!(CardBrand::AmericanExpress.tag(), "american_express");
    /// ```
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Visa => "visa",
            Self::Master => "master",
            Self::Elo => "elo",
            Self::Cabal => "cabal",
            Self::Naranja => "naranja",
            Self::AmericanExpress => "american_express",
            Self::DinersClub => "diners_club",
            Self::Jcb => "jcb",
            Self::Dankort => "dankort",
            Self::Sodexo => "sodexo",
            Self::Vr => "vr",
            Self::Forbrugsforeningen => "forbrugsforeningen",
            Self::Maestro => "maestro",
            Self::Discover => "discover",
            Self::UnionPay => "union_pay",
            Self::BpPlus => "bp_plus",
            Self::Uatp => "uatp",
        }
    }

    /// Looks up a brand by its tag, ignoring ASCII case.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|brand| brand.tag().eq_ignore_ascii_case(tag.trim()))
    }

    /// Returns true if numbers of this brand are written with embedded spaces.
    #[must_use]
    pub const fn allows_spaces(self) -> bool {
        matches!(self, Self::BpPlus)
    }

    /// Number of digits in the card verification value.
    ///
    /// American Express uses a four digit code, every other brand three.
    #[must_use]
    pub const fn verification_value_length(self) -> usize {
        match self {
            Self::AmericanExpress => 4,
            _ => 3,
        }
    }

    pub(crate) const fn check_algorithm(self) -> CheckAlgorithm {
        match self {
            Self::Naranja => CheckAlgorithm::Mod11,
            Self::BpPlus => CheckAlgorithm::LuhnIgnoringSpaces,
            _ => CheckAlgorithm::Luhn,
        }
    }
}

impl fmt::Display for CardBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for CardBrand {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s)
            .ok_or_else(|| GatewayError::InvalidInput(format!("unknown card brand: {s}")))
    }
}

type Predicate = fn(&str) -> bool;

/// Ordered detection table. Order resolves overlapping prefix ranges.
static DETECTORS: &[(CardBrand, Predicate)] = &[
    (CardBrand::Elo, is_elo),
    (CardBrand::Visa, is_visa),
    (CardBrand::Master, is_master),
    (CardBrand::Cabal, is_cabal),
    (CardBrand::Naranja, is_naranja),
    (CardBrand::AmericanExpress, is_american_express),
    (CardBrand::DinersClub, is_diners_club),
    (CardBrand::Jcb, is_jcb),
    (CardBrand::Dankort, is_dankort),
    (CardBrand::Sodexo, is_sodexo),
    (CardBrand::Vr, is_vr),
    (CardBrand::Forbrugsforeningen, is_forbrugsforeningen),
    (CardBrand::Maestro, is_maestro),
    (CardBrand::Discover, is_discover),
    (CardBrand::UnionPay, is_union_pay),
    (CardBrand::BpPlus, is_bp_plus),
    (CardBrand::Uatp, is_uatp),
];

/// Detects the brand of a card number.
///
/// Returns `None` for empty input or when no brand pattern matches.
#[must_use]
pub fn detect_brand(number: &str) -> Option<CardBrand> {
    if number.is_empty() {
        return None;
    }
    DETECTORS.iter().find(|(_, matches)| matches(number)).map(|(brand, _)| *brand)
}

/// Returns true if `number` is detected as `brand`.
///
/// # Examples
///
/// ```
/// use paygate::card::{CardBrand, matches_brand};
///
/// assert!(matches_brand("378282246310005", CardBrand::AmericanExpress));
/// assert!(!matches_brand("378282246310005", CardBrand::Visa));
/// ```
#[must_use]
pub fn matches_brand(number: &str, brand: CardBrand) -> bool {
    detect_brand(number) == Some(brand)
}

const ELO_RANGES: &[(u32, u32)] = &[
    (401_178, 401_179),
    (431_274, 431_274),
    (438_935, 438_935),
    (451_416, 451_416),
    (457_393, 457_393),
    (504_175, 504_175),
    (506_699, 506_778),
    (509_000, 509_999),
    (627_780, 627_780),
    (636_297, 636_297),
    (636_368, 636_368),
    (650_031, 650_033),
    (650_035, 650_051),
    (650_405, 650_439),
    (650_485, 650_538),
    (650_541, 650_598),
    (650_700, 650_718),
    (650_720, 650_727),
    (650_901, 650_978),
    (651_652, 651_679),
    (655_000, 655_019),
    (655_021, 655_058),
];

const MASTERCARD_RANGES: &[(u32, u32)] = &[(222_100, 272_099), (510_000, 559_999)];

const MASTERCARD_BINS: &[u32] =
    &[605_272, 606_282, 637_095, 637_568, 637_599, 637_609, 637_612];

const CABAL_RANGES: &[(u32, u32)] = &[
    (60_420_100, 60_440_099),
    (58_965_700, 58_965_799),
    (60_352_200, 60_352_299),
    (65_027_200, 65_027_299),
    (65_008_700, 65_008_700),
];

const SODEXO_BINS: &[u32] =
    &[606_071, 603_389, 606_070, 606_069, 606_068, 600_818, 505_864, 505_865];

const MAESTRO_RANGES: &[(u32, u32)] = &[
    (500_000, 509_999),
    (560_000, 589_999),
    (630_400, 630_499),
    (639_000, 639_099),
    (670_000, 679_999),
];

const UNION_PAY_RANGES: &[(u32, u32)] = &[
    (62_212_600, 62_379_699),
    (62_400_000, 62_699_999),
    (62_820_000, 62_889_999),
    (81_000_000, 81_099_999),
    (81_100_000, 81_319_999),
    (81_320_000, 81_519_999),
    (81_520_000, 81_639_999),
    (81_640_000, 81_719_999),
];

static BP_PLUS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(7050\d\s\d{9}\s\d{3}|705\d\s\d{8}\s\d{5})$")
        .expect("BP Plus pattern is a valid regex")
});

fn all_digits(number: &str) -> bool {
    !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit())
}

/// Parses the first `len` digits of an all-digit number.
fn leading(number: &str, len: usize) -> Option<u32> {
    if !all_digits(number) {
        return None;
    }
    number.get(..len)?.parse().ok()
}

fn in_ranges(value: Option<u32>, ranges: &[(u32, u32)]) -> bool {
    value.is_some_and(|v| ranges.iter().any(|&(low, high)| (low..=high).contains(&v)))
}

fn is_visa(number: &str) -> bool {
    all_digits(number) && number.starts_with('4') && matches!(number.len(), 13 | 16 | 19)
}

fn is_master(number: &str) -> bool {
    let bin = leading(number, 6);
    number.len() == 16
        && (in_ranges(bin, MASTERCARD_RANGES) || bin.is_some_and(|b| MASTERCARD_BINS.contains(&b)))
}

fn is_elo(number: &str) -> bool {
    number.len() == 16 && in_ranges(leading(number, 6), ELO_RANGES)
}

fn is_cabal(number: &str) -> bool {
    number.len() == 16 && in_ranges(leading(number, 8), CABAL_RANGES)
}

fn is_naranja(number: &str) -> bool {
    all_digits(number) && number.len() == 16 && number.starts_with("589562")
}

fn is_american_express(number: &str) -> bool {
    all_digits(number)
        && number.len() == 15
        && (number.starts_with("34") || number.starts_with("37"))
}

fn is_diners_club(number: &str) -> bool {
    all_digits(number)
        && (14..=19).contains(&number.len())
        && (["300", "301", "302", "303", "304", "305", "36", "38"]
            .iter()
            .any(|prefix| number.starts_with(prefix)))
}

fn is_jcb(number: &str) -> bool {
    number.len() == 16 && in_ranges(leading(number, 4), &[(3528, 3589)])
}

fn is_dankort(number: &str) -> bool {
    all_digits(number) && number.len() == 16 && number.starts_with("5019")
}

fn is_sodexo(number: &str) -> bool {
    number.len() == 16 && leading(number, 6).is_some_and(|bin| SODEXO_BINS.contains(&bin))
}

fn is_vr(number: &str) -> bool {
    all_digits(number)
        && number.len() == 16
        && (number.starts_with("627416") || number.starts_with("637036"))
}

fn is_forbrugsforeningen(number: &str) -> bool {
    all_digits(number) && number.len() == 16 && number.starts_with("600722")
}

fn is_maestro(number: &str) -> bool {
    (12..=19).contains(&number.len()) && in_ranges(leading(number, 6), MAESTRO_RANGES)
}

fn is_discover(number: &str) -> bool {
    all_digits(number)
        && (16..=19).contains(&number.len())
        && (number.starts_with("6011")
            || number.starts_with("65")
            || in_ranges(leading(number, 3), &[(644, 649)]))
}

fn is_union_pay(number: &str) -> bool {
    (16..=19).contains(&number.len()) && in_ranges(leading(number, 8), UNION_PAY_RANGES)
}

fn is_bp_plus(number: &str) -> bool {
    BP_PLUS_PATTERN.is_match(number)
}

fn is_uatp(number: &str) -> bool {
    all_digits(number) && number.len() == 15 && number.starts_with('1')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_common_brands() {
        assert_eq!(detect_brand("4242424242424242"), Some(CardBrand::Visa));
        assert_eq!(detect_brand("4111111111111"), Some(CardBrand::Visa));
        assert_eq!(detect_brand("5555555555554444"), Some(CardBrand::Master));
        assert_eq!(detect_brand("2223000048400011"), Some(CardBrand::Master));
        assert_eq!(detect_brand("378282246310005"), Some(CardBrand::AmericanExpress));
        assert_eq!(detect_brand("6011111111111117"), Some(CardBrand::Discover));
        assert_eq!(detect_brand("6440000000000005"), Some(CardBrand::Discover));
        assert_eq!(detect_brand("30569309025904"), Some(CardBrand::DinersClub));
        assert_eq!(detect_brand("3530111333300000"), Some(CardBrand::Jcb));
    }

    #[test]
    fn test_detects_regional_brands() {
        assert_eq!(detect_brand("5019717010103742"), Some(CardBrand::Dankort));
        assert_eq!(detect_brand("6035224400000008"), Some(CardBrand::Cabal));
        assert_eq!(detect_brand("5895627823453005"), Some(CardBrand::Naranja));
        assert_eq!(detect_brand("6274161111111114"), Some(CardBrand::Vr));
        assert_eq!(detect_brand("6007221000000002"), Some(CardBrand::Forbrugsforeningen));
        assert_eq!(detect_brand("6759000000000000"), Some(CardBrand::Maestro));
        assert_eq!(detect_brand("6221261111111116"), Some(CardBrand::UnionPay));
        assert_eq!(detect_brand("8110000000000000"), Some(CardBrand::UnionPay));
        assert_eq!(detect_brand("100000000000009"), Some(CardBrand::Uatp));
        assert_eq!(detect_brand("70501 234567890 126"), Some(CardBrand::BpPlus));
    }

    #[test]
    fn test_elo_wins_over_visa() {
        assert!(is_visa("4011781111111112"));
        assert_eq!(detect_brand("4011781111111112"), Some(CardBrand::Elo));
    }

    #[test]
    fn test_elo_wins_over_discover() {
        assert!(is_discover("6500311111111111"));
        assert_eq!(detect_brand("6500311111111111"), Some(CardBrand::Elo));
    }

    #[test]
    fn test_dankort_wins_over_maestro() {
        assert!(is_maestro("5019717010103742"));
        assert_eq!(detect_brand("5019717010103742"), Some(CardBrand::Dankort));
    }

    #[test]
    fn test_sodexo_wins_over_maestro() {
        assert!(is_maestro("5058641111111119"));
        assert_eq!(detect_brand("5058641111111119"), Some(CardBrand::Sodexo));
    }

    #[test]
    fn test_no_brand_for_unknown_or_empty() {
        assert_eq!(detect_brand(""), None);
        assert_eq!(detect_brand("0000000000000000"), None);
        assert_eq!(detect_brand("not a number"), None);
    }

    #[test]
    fn test_spaces_only_match_bp_plus() {
        assert_eq!(detect_brand("4242 4242 4242 4242"), None);
        assert!(CardBrand::BpPlus.allows_spaces());
        assert!(!CardBrand::Visa.allows_spaces());
    }

    #[test]
    fn test_tag_round_trip() {
        for brand in CardBrand::ALL {
            assert_eq!(CardBrand::from_tag(brand.tag()), Some(brand));
            assert_eq!(brand.to_string(), brand.tag());
        }
        assert_eq!(CardBrand::from_tag("VISA"), Some(CardBrand::Visa));
        assert_eq!(CardBrand::from_tag("bogus"), None);
    }

    #[test]
    fn test_from_str_unknown_brand() {
        let result = "laser".parse::<CardBrand>();
        assert!(matches!(result, Err(GatewayError::InvalidInput(_))));
    }

    #[test]
    fn test_verification_value_length() {
        assert_eq!(CardBrand::AmericanExpress.verification_value_length(), 4);
        assert_eq!(CardBrand::Visa.verification_value_length(), 3);
        assert_eq!(CardBrand::Maestro.verification_value_length(), 3);
    }

    #[test]
    fn test_matches_brand() {
        assert!(matches_brand("4242424242424242", CardBrand::Visa));
        assert!(!matches_brand("4242424242424242", CardBrand::Master));
    }

    #[test]
    fn test_serde_uses_tags() {
        let json = serde_json::to_string(&CardBrand::UnionPay).unwrap();
        assert_eq!(json, "\"union_pay\"");
        let brand: CardBrand = serde_json::from_str("\"bp_plus\"").unwrap();
        assert_eq!(brand, CardBrand::BpPlus);
    }
}
