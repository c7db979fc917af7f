//! Fuzz target for the RESP decoder.
//!
//! Splits the input at an attacker-chosen point and feeds both halves, so
//! fragment-resumption paths get fuzzed along with the parser itself.

#![no_main]

use libfuzzer_sys::fuzz_target;
use wayfarer::RespDecoder;

fuzz_target!(|data: &[u8]| {
    let mut decoder = RespDecoder::new();

    let split = if data.is_empty() {
        0
    } else {
        data[0] as usize % data.len()
    };
    let (a, b) = data.split_at(split);

    decoder.extend(a);
    loop {
        match decoder.decode() {
            Ok(Some(_)) => {}
            Ok(None) => break,
            Err(_) => return,
        }
    }

    decoder.extend(b);
    loop {
        match decoder.decode() {
            Ok(Some(_)) => {}
            Ok(None) | Err(_) => break,
        }
    }
});
