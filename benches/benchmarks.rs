use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use quinex::{QuantityParser, parse_unit};
use std::hint::black_box;

/// Quantity parsing across expression shapes.
fn bench_quantity_parsing(c: &mut Criterion) {
    let parser = QuantityParser::new();
    let mut group = c.benchmark_group("quantity_parsing");

    let cases = [
        ("plain", "5 km"),
        ("modifier", "about 344 million €"),
        ("range", "$0.07/kWh to $0.16/kWh"),
        ("negative_range", "-0.6 to -1.2 V"),
        ("tolerance", "12.5 ± 3.7%"),
        ("confidence_interval", "2.25 (95% CI 1.92-2.65)"),
        ("multidim", "100 mm x 100 mm x 400 mm"),
        ("list_with_ellipsis", "1, 2, 3, and 4 million km"),
        ("number_words", "one hundred and twenty three"),
        ("power_of_ten", "10^-15 m"),
    ];

    for (name, expression) in &cases {
        group.bench_with_input(BenchmarkId::new("parse", name), expression, |b, &expr| {
            b.iter(|| parser.parse(black_box(expr)))
        });
    }
    group.finish();
}

/// Unit linking from direct matches to compound aggregation.
fn bench_unit_linking(c: &mut Criterion) {
    let mut group = c.benchmark_group("unit_linking");

    let units = ["km", "%", "kWh", "TWh/a", "$2021/kWh", "km / s", "rad m^-2"];
    for unit in &units {
        group.bench_with_input(BenchmarkId::new("link", unit), unit, |b, &unit| {
            b.iter(|| parse_unit(black_box(unit)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_quantity_parsing, bench_unit_linking);
criterion_main!(benches);
