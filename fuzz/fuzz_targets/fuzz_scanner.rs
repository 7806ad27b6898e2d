#![no_main]

use libfuzzer_sys::fuzz_target;
use letfloat_core::parser::scanner::Scanner;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    // Any input either tokenizes or fails with an error; it must never panic
    // or loop.
    let _ = Scanner::tokenize_all(source);
});
