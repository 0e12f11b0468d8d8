use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use implmap::analyzers::{resolve_all, StringHeuristic};
use implmap::{analyze_corpus, AnalysisOptions, AnalysisResult};
use std::hint::black_box;
use std::path::PathBuf;
use tempfile::TempDir;

/// A module with `packages` packages, each declaring a few interfaces and
/// structs that implement some of them.
fn create_test_project(packages: usize) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    std::fs::write(root.join("go.mod"), "module example.com/bench\n\ngo 1.22\n").unwrap();

    for i in 0..packages {
        let dir = root.join(format!("pkg{}", i));
        std::fs::create_dir_all(&dir).unwrap();

        let mut content = format!("package pkg{}\n\n", i);
        for j in 0..4 {
            content.push_str(&format!(
                r#"
type Reader{j} interface {{
    Read{j}(p []byte) (int, error)
}}

type Store{j}[K comparable, V any] interface {{
    Get(key K) (V, bool)
    Put(key K, value V)
}}

type Impl{j} struct {{
    data map[string]int
}}

func (s *Impl{j}) Read{j}(p []byte) (int, error) {{ return len(p), nil }}
func (s *Impl{j}) Get(key string) (int, bool) {{ v, ok := s.data[key]; return v, ok }}
func (s *Impl{j}) Put(key string, value int) {{ s.data[key] = value }}
"#,
                j = j
            ));
        }
        std::fs::write(dir.join("types.go"), content).unwrap();
    }

    let path_buf = root.to_path_buf();
    (temp_dir, path_buf)
}

fn benchmark_analyze_corpus(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_corpus");
    let (_temp_dir, project_path) = create_test_project(20);

    for parallel in [false, true] {
        let options = AnalysisOptions {
            parallel,
            ..AnalysisOptions::default()
        };
        let label = if parallel { "parallel" } else { "sequential" };
        group.bench_with_input(BenchmarkId::from_parameter(label), &options, |b, options| {
            b.iter(|| analyze_corpus(black_box(&project_path), options).unwrap())
        });
    }
    group.finish();
}

fn benchmark_reverify(c: &mut Criterion) {
    let (_temp_dir, project_path) = create_test_project(20);
    let mut baseline = analyze_corpus(&project_path, &AnalysisOptions::default())
        .unwrap()
        .result;
    clear_links(&mut baseline);

    c.bench_function("resolve_string_heuristic", |b| {
        b.iter(|| {
            let mut result = baseline.clone();
            resolve_all(black_box(&mut result), StringHeuristic, true)
        })
    });
}

fn clear_links(result: &mut AnalysisResult) {
    for s in &mut result.structs {
        s.implemented_interfaces.clear();
        for m in &mut s.methods {
            m.implemented_from.clear();
        }
    }
}

criterion_group!(benches, benchmark_analyze_corpus, benchmark_reverify);
criterion_main!(benches);
