#![no_main]

//! Fuzz target for webhook signature validation.
//!
//! Splits the input into a header value and a body and checks that
//! verification never panics, and that a correct signature for the body
//! always verifies while a signature for a different body never does.

use hookbox_api::crypto::{sign_payload, verify_signature, WebhookSecret};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let split = data.first().map_or(0, |&b| usize::from(b)).min(data.len());
    let (header, body) = data.split_at(split);

    let Ok(secret) = WebhookSecret::new("fuzz-secret") else { return };

    if let Ok(header) = std::str::from_utf8(header) {
        let _ = verify_signature(body, Some(header), &secret);
        let _ = verify_signature(body, Some(&format!("sha256={header}")), &secret);
    }

    if let Ok(signature) = sign_payload(body, &secret) {
        assert!(verify_signature(body, Some(&signature), &secret).is_ok());

        let mut other = body.to_vec();
        other.push(0);
        assert!(verify_signature(&other, Some(&signature), &secret).is_err());
    }

    // Fuzzed bytes as the key
    if let Ok(key) = WebhookSecret::new(header) {
        let _ = sign_payload(body, &key);
    }
});
