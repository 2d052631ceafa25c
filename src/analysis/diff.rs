//! Unified-patch parsing into per-file diff records.

use tracing::warn;

use crate::types::LineByteCount;

/// Per-file change extracted from patch text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileDiff {
    pub path: String,
    pub added: LineByteCount,
    pub removed: LineByteCount,
}

impl FileDiff {
    fn new(path: String) -> Self {
        Self {
            path,
            ..Self::default()
        }
    }
}

/// Extract the path between the `a/` and `b/` markers of a
/// `diff --git a/<path> b/<path>` header line.
fn header_path(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("diff --git a/")?;
    let b_marker = rest.find(" b/")?;
    Some(&rest[..b_marker])
}

/// Parse unified patch text into per-file [`FileDiff`] records.
///
/// `+`/`-` lines increment the respective (lines, bytes) pair; the byte count
/// is the full line length, with the marker character standing in for the
/// newline the patch stripped, so net-mode byte totals reconcile with on-disk
/// file sizes. `min_line_len` is the minimum-length guard:
/// 1 when whitespace-only changes are counted, else 2, so a bare `+` (an
/// empty added line) only counts in the former case. The `--- a/` and
/// `+++ b/` file header lines (and their `/dev/null` forms) never count, but
/// hunk lines whose content merely begins with `--` or `++` do.
pub fn parse_patch(repo_id: &str, patch: &str, min_line_len: usize) -> Vec<FileDiff> {
    let mut diffs: Vec<FileDiff> = Vec::new();
    let mut current: Option<FileDiff> = None;

    for line in patch.lines() {
        if line.starts_with("diff --git") {
            if let Some(done) = current.take() {
                diffs.push(done);
            }

            match header_path(line) {
                Some(path) => current = Some(FileDiff::new(path.to_string())),
                // Headers without both path markers (exotic quoting) are a
                // diagnostic, not an error; drop any stray hunk lines below
                // them rather than misattributing to the previous file.
                None => warn!(repo = repo_id, line, "patch header missing a/ b/ markers"),
            }
            continue;
        }

        if let Some(target) = line.strip_prefix("rename to ") {
            if let Some(diff) = current.as_mut() {
                diff.path = target.to_string();
            }
            continue;
        }

        // Matched exactly, not by `+++`/`---` prefix: a removed line whose
        // content starts with `--` (an SQL or Lua comment) arrives here as
        // `--- ...` and must still count.
        if line.starts_with("--- a/")
            || line.starts_with("+++ b/")
            || line == "--- /dev/null"
            || line == "+++ /dev/null"
        {
            continue;
        }

        if line.len() < min_line_len {
            continue;
        }

        let Some(diff) = current.as_mut() else {
            continue;
        };

        if line.starts_with('+') {
            diff.added += LineByteCount::new(1, line.len() as i64);
        } else if line.starts_with('-') {
            diff.removed += LineByteCount::new(1, line.len() as i64);
        }
    }

    if let Some(done) = current.take() {
        diffs.push(done);
    }

    diffs
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PATCH: &str = "\
diff --git a/src/main.py b/src/main.py
index e69de29..4b825dc 100644
--- a/src/main.py
+++ b/src/main.py
@@ -1,2 +1,3 @@
+import os
+import sys
-import json
 unchanged context
diff --git a/go/tool.go b/go/tool.go
--- a/go/tool.go
+++ b/go/tool.go
@@ -0,0 +1 @@
+package main
";

    #[test]
    fn test_parse_patch_two_files() {
        let diffs = parse_patch("o/r", PATCH, 2);
        assert_eq!(diffs.len(), 2);

        assert_eq!(diffs[0].path, "src/main.py");
        assert_eq!(diffs[0].added.lines, 2);
        assert_eq!(diffs[0].added.bytes, ("+import os".len() + "+import sys".len()) as i64);
        assert_eq!(diffs[0].removed.lines, 1);
        assert_eq!(diffs[0].removed.bytes, "-import json".len() as i64);

        assert_eq!(diffs[1].path, "go/tool.go");
        assert_eq!(diffs[1].added.lines, 1);
        assert_eq!(diffs[1].removed.lines, 0);
    }

    #[test]
    fn test_file_headers_do_not_count() {
        // `+++ b/...` and `--- a/...` must not be taken for hunk lines.
        let diffs = parse_patch("o/r", "diff --git a/x b/x\n--- a/x\n+++ b/x\n", 2);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].added, LineByteCount::default());
        assert_eq!(diffs[0].removed, LineByteCount::default());
    }

    #[test]
    fn test_dash_comment_hunk_lines_counted() {
        // Removing an SQL comment puts `--- cleanup` in the patch; adding
        // one puts `+-- rebuild`. Neither is a file header.
        let patch = "\
diff --git a/cleanup.sql b/cleanup.sql
--- a/cleanup.sql
+++ b/cleanup.sql
@@ -1,2 +1,2 @@
--- cleanup
+-- rebuild
";
        let diffs = parse_patch("o/r", patch, 2);
        assert_eq!(diffs[0].removed.lines, 1);
        assert_eq!(diffs[0].removed.bytes, "--- cleanup".len() as i64);
        assert_eq!(diffs[0].added.lines, 1);
        assert_eq!(diffs[0].added.bytes, "+-- rebuild".len() as i64);
    }

    #[test]
    fn test_dev_null_headers_do_not_count() {
        let patch = "\
diff --git a/new.rs b/new.rs
--- /dev/null
+++ b/new.rs
@@ -0,0 +1 @@
+fn fresh() {}
";
        let diffs = parse_patch("o/r", patch, 2);
        assert_eq!(diffs[0].added.lines, 1);
        assert_eq!(diffs[0].removed.lines, 0);
    }

    #[test]
    fn test_min_line_length_guard() {
        let patch = "diff --git a/x b/x\n+\n+a\n";

        let strict = parse_patch("o/r", patch, 2);
        assert_eq!(strict[0].added.lines, 1);

        // Counting whitespace-only changes admits the bare `+`.
        let lenient = parse_patch("o/r", patch, 1);
        assert_eq!(lenient[0].added.lines, 2);
        assert_eq!(lenient[0].added.bytes, 3);
    }

    #[test]
    fn test_rename_target_retargets_record() {
        let patch = "\
diff --git a/old_name.rs b/new_name.rs
similarity index 90%
rename from old_name.rs
rename to new_name.rs
--- a/old_name.rs
+++ b/new_name.rs
@@ -1 +1,2 @@
+fn added() {}
";
        let diffs = parse_patch("o/r", patch, 2);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "new_name.rs");
        assert_eq!(diffs[0].added.lines, 1);
    }

    #[test]
    fn test_header_without_markers_is_skipped() {
        let patch = "diff --git \"quoted\" \"quoted\"\n+stray line\n";
        let diffs = parse_patch("o/r", patch, 2);
        assert!(diffs.is_empty());
    }

    #[test]
    fn test_empty_patch() {
        assert!(parse_patch("o/r", "", 2).is_empty());
    }
}
