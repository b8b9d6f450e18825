#![no_main]

//! Fuzz target for webhook payload parsing and normalization.
//!
//! Arbitrary request bodies must either normalize into a message with a
//! non-empty id or fail with a validation error; they must never panic.

use hookbox_core::{HookboxError, WebhookPayload};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    match WebhookPayload::parse(data).and_then(WebhookPayload::normalize) {
        Ok(message) => {
            assert!(!message.message_id.is_empty());
            let stored = message.stamp("2025-01-01T00:00:00.000000Z");
            assert_eq!(stored.created_at, "2025-01-01T00:00:00.000000Z");
        },
        Err(HookboxError::Validation { reason }) => assert!(!reason.is_empty()),
        Err(other) => panic!("unexpected error kind: {other}"),
    }
});
