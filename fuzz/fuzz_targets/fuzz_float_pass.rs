#![no_main]

use libfuzzer_sys::fuzz_target;
use letfloat_core::{FloatConfig, float_source};

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let config = FloatConfig::default();
    let Ok(first) = float_source(source, &config) else {
        return;
    };

    // Whatever the pass prints must parse again, and a second run over its
    // own output must not float anything new out of generated code.
    let second = float_source(&first.code, &config)
        .unwrap_or_else(|e| panic!("output failed to re-parse: {e}\n{}", first.code));
    for name in &second.report.hoisted {
        assert!(
            !first.report.hoisted.contains(name),
            "re-run reused a generated name: {name}"
        );
    }
    assert!(
        !(first.report.helper_injected && second.report.helper_injected),
        "helper injected twice"
    );
});
