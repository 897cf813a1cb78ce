use criterion::{black_box, criterion_group, criterion_main, Criterion};
use scrubrs::codec::{escape_href, escape_html, unescape_all};

fn bench_escape(c: &mut Criterion) {
    let mut group = c.benchmark_group("escape");

    let test_cases = vec![
        ("plain", "Hello world, nothing to escape here"),
        ("markup", "<script>alert('xss')</script>"),
        ("attribute", r#"" onmouseover="alert(1)" data-x='/y'"#),
        ("unicode", "héllo wörld ☃ <b>"),
    ];

    for (name, input) in test_cases {
        group.bench_function(format!("secure_{}", name), |b| {
            b.iter(|| black_box(escape_html(black_box(input), true)))
        });
        group.bench_function(format!("plain_{}", name), |b| {
            b.iter(|| black_box(escape_html(black_box(input), false)))
        });
    }

    group.bench_function("href", |b| {
        b.iter(|| black_box(escape_href(black_box("https://example.com/a b?q=1&r='2'#frag"))))
    });

    group.finish();
}

fn bench_unescape(c: &mut Criterion) {
    let mut group = c.benchmark_group("unescape");

    let test_cases = vec![
        ("no_entities", "Hello world, nothing to decode here"),
        ("named", "&lt;p&gt;caf&eacute; &amp; cr&egrave;me&lt;/p&gt;"),
        ("numeric", "&#106;&#97;&#118;&#x61;&#x73;&#X63;&#114;&#105;&#112;&#116;"),
        ("malformed", "&ampp &#; &#xZZ; &unknownentity; & &"),
        ("longest_name", "&CounterClockwiseContourIntegral;"),
    ];

    for (name, input) in test_cases {
        group.bench_function(name, |b| b.iter(|| black_box(unescape_all(black_box(input.as_bytes())))));
    }

    group.finish();
}

fn bench_unescape_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("unescape_input_sizes");

    let sizes = vec![100, 1000, 10000];
    for size in sizes {
        let input = "a &amp; b &#x3C; c ".repeat(size / 20 + 1);
        group.bench_function(format!("size_{}", size), |b| {
            b.iter(|| black_box(unescape_all(black_box(input.as_bytes()))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_escape, bench_unescape, bench_unescape_sizes);
criterion_main!(benches);
