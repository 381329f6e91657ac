use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::io::Write;

use vdom_hunter::hunter::result::ingest;

/// Build a result file with `groups` groups of `items` items each.
fn write_result_file(dir: &tempfile::TempDir, groups: usize, items: usize) -> std::path::PathBuf {
    let path = dir.path().join("page.vdom.res");
    let mut file = std::fs::File::create(&path).unwrap();

    let mut json = String::from("{\"program\":\"findtitles\",\"groups\":[");
    for g in 0..groups {
        if g > 0 {
            json.push(',');
        }
        json.push('[');
        for i in 0..items {
            if i > 0 {
                json.push(',');
            }
            json.push_str(&format!(
                "{{\"x\":{},\"y\":{},\"w\":100,\"h\":30,\"desc\":\"item {}-{}\"}}",
                g * 10,
                i * 40,
                g,
                i
            ));
        }
        json.push(']');
    }
    json.push_str("],\"summary\":\"benchmark\"}");

    file.write_all(json.as_bytes()).unwrap();
    path
}

fn benchmark_ingest(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = write_result_file(&dir, 20, 50);

    c.bench_function("ingest_1000_items", |b| {
        b.iter(|| {
            let result = ingest(black_box(&path));
            assert!(result.is_ok());
        })
    });
}

criterion_group!(benches, benchmark_ingest);
criterion_main!(benches);
