use criterion::{black_box, criterion_group, criterion_main, Criterion};
use scrubrs::{sanitize_with, Html, HtmlOptions, Preset, Sanitizer};

const DOCUMENT: &str = r#"<!DOCTYPE html>
<div class="post" onclick="steal()">
  <h1 id="title">Hello <em>world</em></h1>
  <p>Some <a href="https://example.com/?a=1&amp;b=2" target="_blank">link</a> and
     <a href="javascript:alert(1)">another</a>.</p>
  <!-- a comment -->
  <script>alert('xss')</script>
  <img src="/img.png" alt="&quot;quoted&quot;" onerror="alert(1)">
  <table><tr><td colspan="2">cell</td></tr></table>
</div>
"#;

fn bench_presets(c: &mut Criterion) {
    let mut group = c.benchmark_group("sanitize_presets");

    let presets = vec![
        ("default", Preset::Default),
        ("restricted", Preset::Restricted),
        ("basic", Preset::Basic),
        ("relaxed", Preset::Relaxed),
    ];

    for (name, preset) in presets {
        let sanitizer = Sanitizer::from_config(&preset.config()).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| black_box(sanitize_with(black_box(DOCUMENT), &sanitizer).unwrap()))
        });
    }

    group.finish();
}

fn bench_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("sanitize_input_sizes");
    let sanitizer = Sanitizer::from_config(&Preset::Relaxed.config()).unwrap();

    let sizes = vec![1, 10, 100];
    for size in sizes {
        let input = DOCUMENT.repeat(size);
        group.bench_function(format!("documents_{}", size), |b| {
            b.iter(|| black_box(sanitize_with(black_box(&input), &sanitizer).unwrap()))
        });
    }

    group.finish();
}

fn bench_measured_session(c: &mut Criterion) {
    let sanitizer = Sanitizer::from_config(&Preset::Relaxed.config()).unwrap();
    let options = HtmlOptions {
        measure: true,
        escape_text: true,
        ..HtmlOptions::default()
    };
    let mut html = Html::new(Some(sanitizer), Vec::new(), options).unwrap();

    c.bench_function("measured_session", |b| {
        b.iter(|| black_box(html.rewrite(black_box(DOCUMENT)).unwrap()))
    });
}

criterion_group!(benches, bench_presets, bench_sizes, bench_measured_session);
criterion_main!(benches);
