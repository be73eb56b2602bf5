//! Property-based tests using proptest.
//! Invariants that should hold for all inputs: result-shape laws, website
//! derivation totality, and backoff monotonicity.

use proptest::prelude::*;
use rust_phone_waterfall::models::{WaterfallResult, WaterfallStatus};
use rust_phone_waterfall::providers::derive_company_website;
use rust_phone_waterfall::retry::RetryPolicy;
use std::time::Duration;

proptest! {
    #[test]
    fn website_derivation_never_panics(company in "\\PC*") {
        let _ = derive_company_website(&company);
    }

    #[test]
    fn derived_websites_are_lowercase_alphanumeric(company in ".*") {
        if let Some(website) = derive_company_website(&company) {
            let domain = website.strip_suffix(".com")
                .expect("derived website ends with .com");
            prop_assert!(!domain.is_empty());
            prop_assert!(domain.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()),
                "unexpected characters in {}", website);
        }
    }

    #[test]
    fn ascii_company_names_always_derive(company in "[A-Za-z0-9]{1,30}") {
        let website = derive_company_website(&company).expect("derivable");
        prop_assert_eq!(website, format!("{}.com", company.to_lowercase()));
    }
}

proptest! {
    #[test]
    fn found_results_always_carry_phone_and_provider(
        phone in "\\+[0-9]{6,15}",
        provider in "[a-z_]{1,20}"
    ) {
        let result = WaterfallResult::found(phone.clone(), provider.clone());
        prop_assert_eq!(result.status, WaterfallStatus::Found);
        prop_assert_eq!(result.phone, Some(phone));
        prop_assert_eq!(result.provider, Some(provider));
        prop_assert_eq!(result.error, None);
    }

    #[test]
    fn terminal_misses_never_carry_phone_or_provider(reason in ".{0,80}") {
        let not_found = WaterfallResult::not_found();
        prop_assert!(not_found.phone.is_none() && not_found.provider.is_none());

        let error = WaterfallResult::error(reason);
        prop_assert_eq!(error.status, WaterfallStatus::Error);
        prop_assert!(error.phone.is_none() && error.provider.is_none());
        prop_assert!(error.error.is_some());
    }
}

proptest! {
    #[test]
    fn backoff_is_nondecreasing(
        initial_ms in 1u64..1_000,
        multiplier in 1.0f64..4.0,
        attempt in 1u32..6
    ) {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_interval: Duration::from_millis(initial_ms),
            backoff_multiplier: multiplier,
        };
        prop_assert!(policy.backoff_for(attempt + 1) >= policy.backoff_for(attempt));
    }

    #[test]
    fn first_backoff_equals_initial_interval(
        initial_ms in 1u64..10_000,
        multiplier in 1.0f64..4.0
    ) {
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_interval: Duration::from_millis(initial_ms),
            backoff_multiplier: multiplier,
        };
        prop_assert_eq!(policy.backoff_for(1), Duration::from_millis(initial_ms));
    }
}
