//! Fuzz target for answer flattening.
//!
//! Any answer that deserializes must flatten without panicking, and array
//! values must always come out as strings.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ra_archive::flatten_answer;
use ra_common::{AnswerResult, JsonType};

fuzz_target!(|data: &[u8]| {
    let Ok(answer) = serde_json::from_slice::<AnswerResult>(data) else {
        return;
    };
    if let Some(flat) = flatten_answer(&answer) {
        if matches!(answer.value, Some(serde_json::Value::Array(_))) {
            assert_eq!(flat.json_type, JsonType::String);
        }
    }
});
