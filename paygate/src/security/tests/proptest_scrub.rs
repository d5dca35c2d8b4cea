use proptest::prelude::*;

use crate::security::{FILTERED, Scrubber};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn test_scrub_is_idempotent(
        number in "[0-9]{12,19}",
        cvv in "[0-9]{3,4}",
        noise in "[ -~]{0,64}",
    ) {
        let transcript = format!(
            concat!(
                r#"{noise}{{"number":"{number}","cvv":"{cvv}"}}"#,
                "<number>{number}</number><cvn><number>{cvv}</number></cvn>{noise}"
            ),
            noise = noise,
            number = number,
            cvv = cvv,
        );
        let scrubber = Scrubber::standard();
        let once = scrubber.scrub(&transcript);
        prop_assert_eq!(scrubber.scrub(&once), once);
    }

    #[test]
    fn test_json_card_fields_replaced(number in "[0-9]{12,19}", cvv in "[0-9]{3,4}") {
        let body = format!(r#"{{"amount":"1.00","number":"{number}","cvv":"{cvv}"}}"#);
        let scrubbed = Scrubber::json().scrub(&body);
        prop_assert_eq!(
            scrubbed,
            format!(r#"{{"amount":"1.00","number":"{FILTERED}","cvv":"{FILTERED}"}}"#)
        );
    }

    #[test]
    fn test_numeric_card_fields_replaced(number in "[0-9]{12,19}", cvv in "[0-9]{3,4}") {
        let body = format!(r#"{{"amount":1.00,"number":{number},"cvv":{cvv}}}"#);
        let scrubber = Scrubber::json();
        let once = scrubber.scrub(&body);
        prop_assert_eq!(
            &once,
            &format!(r#"{{"amount":1.00,"number":{FILTERED},"cvv":{FILTERED}}}"#)
        );
        prop_assert_eq!(scrubber.scrub(&once), once);
    }

    #[test]
    fn test_authorization_header_replaced(token in "[A-Za-z0-9+/]{8,40}={0,2}") {
        let scrubbed = Scrubber::json().scrub(&format!("Authorization: Basic {token}\r\n"));
        prop_assert_eq!(scrubbed, format!("Authorization: Basic {FILTERED}\r\n"));
    }
}
