use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gitlangs::analysis::{parse_patch, Commit, CommitSequence};

/// A synthetic unified patch: `files` records, each with `lines` added and
/// a few removals.
fn synthetic_patch(files: usize, lines: usize) -> String {
    let mut patch = String::new();
    for f in 0..files {
        patch.push_str(&format!(
            "diff --git a/src/module_{f}.rs b/src/module_{f}.rs\n--- a/src/module_{f}.rs\n+++ b/src/module_{f}.rs\n@@ -1,{lines} +1,{lines} @@\n"
        ));
        for l in 0..lines {
            patch.push_str(&format!("+let value_{l} = compute({l});\n"));
            if l % 10 == 0 {
                patch.push_str(&format!("-let old_{l} = legacy({l});\n"));
            }
        }
    }
    patch
}

fn bench_parse_patch(c: &mut Criterion) {
    let patch = synthetic_patch(50, 200);

    c.bench_function("parse_patch_50_files", |b| {
        b.iter(|| parse_patch("owner/name", black_box(&patch), 2))
    });
}

fn bench_commit_sequence_insert(c: &mut Criterion) {
    // Pseudo-random timestamps so insertion exercises mid-sequence shifts.
    let commits: Vec<Commit> = (0u64..2_000)
        .map(|i| Commit::new(format!("{i:07x}"), i.wrapping_mul(2_654_435_761) % 100_000, false))
        .collect();

    c.bench_function("commit_sequence_insert_2000", |b| {
        b.iter(|| {
            let mut seq = CommitSequence::new();
            for commit in &commits {
                seq.insert(black_box(commit.clone()));
            }
            seq.len()
        })
    });
}

criterion_group!(benches, bench_parse_patch, bench_commit_sequence_insert);
criterion_main!(benches);
