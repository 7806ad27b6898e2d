use criterion::{Criterion, criterion_group, criterion_main};
use letfloat_core::FloatConfig;
use letfloat_core::codegen::to_source;
use letfloat_core::float::float_program;
use letfloat_core::parser::ast::SourceType;
use letfloat_core::parser::parse::parse_program;
use letfloat_core::parser::scope::analyze;

/// A compiled-looking unit: `n` curried three-argument functions, each of
/// which re-applies a curried helper on every innermost call.
fn curried_unit(n: usize) -> String {
    let mut src = String::from("function add(a) { return function (b) { return a + b; }; }\n");
    for i in 0..n {
        src.push_str(&format!(
            "function f{i}(x) {{ return function (y) {{ return function (z) {{ \
             var s = add(x)(y); return add(s)(z) + add(x)({i}); }}; }}; }}\n"
        ));
    }
    src
}

// ---------------------------------------------------------------------------
// Front end
// ---------------------------------------------------------------------------

fn bench_parse(c: &mut Criterion) {
    let src = curried_unit(200);
    c.bench_function("parse_curried_unit", |b| {
        b.iter(|| parse_program(&src, SourceType::Script));
    });
}

fn bench_analyze(c: &mut Criterion) {
    let src = curried_unit(200);
    let Ok(program) = parse_program(&src, SourceType::Script) else {
        panic!("benchmark source must parse");
    };
    c.bench_function("analyze_curried_unit", |b| {
        b.iter(|| analyze(&program));
    });
}

// ---------------------------------------------------------------------------
// Float pass
// ---------------------------------------------------------------------------

fn bench_float(c: &mut Criterion) {
    let src = curried_unit(200);
    let config = FloatConfig::default();
    let Ok(program) = parse_program(&src, SourceType::Script) else {
        panic!("benchmark source must parse");
    };
    let Ok(scopes) = analyze(&program) else {
        panic!("benchmark source must analyze");
    };
    c.bench_function("float_curried_unit", |b| {
        b.iter(|| {
            let mut copy = program.clone();
            float_program(&mut copy, &scopes, &config)
        });
    });
}

fn bench_end_to_end(c: &mut Criterion) {
    let src = curried_unit(200);
    let config = FloatConfig::default();
    c.bench_function("float_source_curried_unit", |b| {
        b.iter(|| letfloat_core::float_source(&src, &config));
    });
}

fn bench_print(c: &mut Criterion) {
    let src = curried_unit(200);
    let Ok(program) = parse_program(&src, SourceType::Script) else {
        panic!("benchmark source must parse");
    };
    c.bench_function("print_curried_unit", |b| {
        b.iter(|| to_source(&program));
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_analyze,
    bench_float,
    bench_end_to_end,
    bench_print,
);
criterion_main!(benches);
