// tests/property/sanitize_test.rs

//! Sanitizer invariants: applying twice equals applying once, every sensitive
//! value ends up masked, and non-sensitive attributes are untouched.

use hbreport::core::sanitize::Sanitizer;
use proptest::prelude::*;

fn sanitizer() -> Sanitizer {
    Sanitizer::new(&["passw.*".to_string()]).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_sanitize_is_idempotent(
        secret in "[a-zA-Z0-9]{0,20}",
        benign in "[a-zA-Z0-9]{0,20}",
        name_suffix in "[a-z]{0,6}",
    ) {
        let s = sanitizer();
        let text = format!(
            "<cib>\n  <nvpair name=\"password{name_suffix}\" value=\"{secret}\"/>\n  <nvpair name=\"timeout\" value=\"{benign}\"/>\n</cib>\n"
        );
        let once = s.sanitize_text(&text);
        let twice = s.sanitize_text(&once);
        prop_assert_eq!(&once, &twice);
    }

    #[test]
    fn test_sensitive_values_are_masked(
        secret in "[a-zA-Z0-9]{1,20}",
        benign in "[a-zA-Z0-9]{1,20}",
    ) {
        let s = sanitizer();
        let text = format!(
            "<nvpair name=\"passwd\" value=\"{secret}\"/> <nvpair name=\"port\" value=\"{benign}\"/>"
        );
        let out = s.sanitize_text(&text);
        prop_assert!(out.contains("name=\"passwd\" value=\"******\""));
        let expected_port = format!("name=\"port\" value=\"{}\"", benign);
        prop_assert!(out.contains(&expected_port));
    }

    #[test]
    fn test_lines_without_attributes_pass_through(
        line in "[a-zA-Z0-9 :/.\\-]{0,60}",
    ) {
        let s = sanitizer();
        let text = format!("{line}\n");
        prop_assert_eq!(s.sanitize_text(&text), text);
    }
}
