#![no_main]

use libfuzzer_sys::fuzz_target;
use cxxsr_demangle::demangle_with_tokens;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    if let Some(demangled) = demangle_with_tokens(input) {
        // Every token points at its own length-prefixed field, in order.
        let mut cursor = 0;
        for token in &demangled.tokens {
            let envelope = token.envelope();
            let offset = token.offset.unwrap_or(usize::MAX);
            assert!(offset >= cursor, "token {:?} out of order in {:?}", token.text, input);
            assert!(
                input.get(offset..).is_some_and(|rest| rest.starts_with(&envelope)),
                "token {:?} not at offset {} in {:?}",
                token.text,
                offset,
                input
            );
            cursor = offset + envelope.len();
        }
    }
});
