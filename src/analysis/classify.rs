//! Language detection and file-skip predicates.
//!
//! The original tool leaned on a linguist library for these checks; here the
//! detection is an extension/filename/shebang table and the predicates are
//! pattern checks. The vendor pattern list is a shared read-only value
//! computed once; everything per-repository (the `.gitattributes` filters,
//! the memoized decisions) lives on the `Repo` instead.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// Classification toggles, straight from the `ignore` config block.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct IgnoreRules {
    pub vendor: bool,
    pub dotfiles: bool,
    pub configuration: bool,
    pub image: bool,
    pub test: bool,
    pub binary: bool,
    pub generated: bool,
    pub langs: Vec<String>,
}

/// Conventional third-party/build-output locations, shared by all
/// repositories. Per-repo `linguist-vendored` gitattributes add to these.
static VENDOR_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(^|/)vendor/",
        r"(^|/)vendored/",
        r"(^|/)node_modules/",
        r"(^|/)bower_components/",
        r"(^|/)third[-_]party/",
        r"(^|/)extern(al)?/",
        r"(^|/)Godeps/",
        r"(^|/)deps/",
        r"(^|/)dist/",
        r"\.min\.(js|css)$",
        r"(^|/)gradlew(\.bat)?$",
        r"(^|/)mvnw(\.cmd)?$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static TEST_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|/)(tests?|specs?|testdata|__tests__)/|(_test|_spec)\.[^/.]+$|\.(test|spec)\.[^/.]+$").unwrap()
});

/// Filenames recognized without an extension.
fn language_by_filename(name: &str) -> Option<&'static str> {
    let lang = match name {
        "Makefile" | "GNUmakefile" | "makefile" => "Makefile",
        "Dockerfile" | "Containerfile" => "Dockerfile",
        "CMakeLists.txt" => "CMake",
        "Rakefile" | "Gemfile" => "Ruby",
        "Vagrantfile" => "Ruby",
        "Justfile" | "justfile" => "Just",
        _ => return None,
    };
    Some(lang)
}

/// Extension table. A handful of extensions are genuinely ambiguous and
/// return more than one candidate; callers warn and use the first.
fn languages_by_extension(ext: &str) -> Vec<&'static str> {
    match ext {
        "rs" => vec!["Rust"],
        "py" | "pyi" => vec!["Python"],
        "go" => vec!["Go"],
        "js" | "jsx" | "mjs" | "cjs" => vec!["JavaScript"],
        "ts" | "tsx" => vec!["TypeScript"],
        "java" => vec!["Java"],
        "c" => vec!["C"],
        "h" => vec!["C", "C++"],
        "cc" | "cpp" | "cxx" | "hpp" | "hh" | "hxx" => vec!["C++"],
        "cs" => vec!["C#"],
        "fs" | "fsx" => vec!["F#"],
        "rb" => vec!["Ruby"],
        "php" => vec!["PHP"],
        "swift" => vec!["Swift"],
        "kt" | "kts" => vec!["Kotlin"],
        "scala" => vec!["Scala"],
        "groovy" | "gradle" => vec!["Groovy"],
        "hs" => vec!["Haskell"],
        "ml" | "mli" => vec!["OCaml"],
        "ex" | "exs" => vec!["Elixir"],
        "erl" | "hrl" => vec!["Erlang"],
        "clj" | "cljs" | "cljc" => vec!["Clojure"],
        "lua" => vec!["Lua"],
        "r" => vec!["R"],
        "jl" => vec!["Julia"],
        "zig" => vec!["Zig"],
        "nim" => vec!["Nim"],
        "dart" => vec!["Dart"],
        "vue" => vec!["Vue"],
        "svelte" => vec!["Svelte"],
        "html" | "htm" => vec!["HTML"],
        "css" => vec!["CSS"],
        "scss" | "sass" => vec!["SCSS"],
        "less" => vec!["Less"],
        "sh" | "bash" | "zsh" => vec!["Shell"],
        "fish" => vec!["fish"],
        "ps1" | "psm1" => vec!["PowerShell"],
        "bat" | "cmd" => vec!["Batchfile"],
        "pl" | "pm" => vec!["Perl"],
        "sql" => vec!["SQL"],
        "proto" => vec!["Protocol Buffer"],
        "tex" => vec!["TeX"],
        "m" => vec!["Objective-C", "MATLAB"],
        "mm" => vec!["Objective-C++"],
        "asm" | "s" => vec!["Assembly"],
        "vb" => vec!["Visual Basic"],
        "tf" | "hcl" => vec!["HCL"],
        "json" => vec!["JSON"],
        "yaml" | "yml" => vec!["YAML"],
        "toml" => vec!["TOML"],
        "xml" => vec!["XML"],
        "ini" | "cfg" => vec!["INI"],
        "md" | "markdown" => vec!["Markdown"],
        "txt" => vec!["Text"],
        _ => Vec::new(),
    }
}

fn language_by_shebang(data: &[u8]) -> Option<&'static str> {
    let first_line = data.split(|&b| b == b'\n').next()?;
    let line = std::str::from_utf8(first_line).ok()?;
    let interp = line.strip_prefix("#!")?;

    if interp.contains("python") {
        Some("Python")
    } else if interp.contains("node") {
        Some("JavaScript")
    } else if interp.contains("ruby") {
        Some("Ruby")
    } else if interp.contains("perl") {
        Some("Perl")
    } else if interp.contains("bash") || interp.contains("sh") {
        Some("Shell")
    } else {
        None
    }
}

/// Detect candidate languages for a file from its path and content.
///
/// Returns zero, one, or more names; the caller treats an empty result as
/// "Unknown" and warns on more than one candidate.
pub fn detect_languages(path: &str, data: &[u8]) -> Vec<String> {
    let name = file_name(path);

    if let Some(lang) = language_by_filename(name) {
        return vec![lang.to_string()];
    }

    if let Some(ext) = extension(path) {
        let langs = languages_by_extension(&ext.to_ascii_lowercase());
        if !langs.is_empty() {
            return langs.into_iter().map(str::to_string).collect();
        }
    }

    match language_by_shebang(data) {
        Some(lang) => vec![lang.to_string()],
        None => Vec::new(),
    }
}

pub fn is_vendored(path: &str, repo_filters: &[Regex]) -> bool {
    VENDOR_PATTERNS.iter().any(|re| re.is_match(path))
        || repo_filters.iter().any(|re| re.is_match(path))
}

pub fn is_dotfile(path: &str) -> bool {
    let name = file_name(path);
    name.starts_with('.') && name.len() > 1
}

pub fn is_configuration(path: &str) -> bool {
    matches!(
        extension(path).map(|e| e.to_ascii_lowercase()).as_deref(),
        Some("json" | "yaml" | "yml" | "toml" | "ini" | "cfg" | "conf" | "xml" | "properties")
    )
}

pub fn is_image(path: &str) -> bool {
    matches!(
        extension(path).map(|e| e.to_ascii_lowercase()).as_deref(),
        Some("png" | "jpg" | "jpeg" | "gif" | "svg" | "ico" | "bmp" | "webp" | "tiff" | "avif")
    )
}

pub fn is_test(path: &str) -> bool {
    TEST_PATTERN.is_match(path)
}

/// NUL-byte sniff over the leading window, the usual cheap binary check.
pub fn is_binary(data: &[u8]) -> bool {
    let window = &data[..data.len().min(8000)];
    window.contains(&0)
}

pub fn is_generated(path: &str, data: &[u8]) -> bool {
    let name = file_name(path);
    if matches!(
        name,
        "package-lock.json"
            | "yarn.lock"
            | "pnpm-lock.yaml"
            | "Cargo.lock"
            | "go.sum"
            | "Gemfile.lock"
            | "composer.lock"
            | "poetry.lock"
    ) {
        return true;
    }

    if path.ends_with(".pb.go")
        || path.ends_with("_pb2.py")
        || path.ends_with(".g.dart")
        || path.ends_with(".designer.cs")
    {
        return true;
    }

    // Generated-code markers live in the first few lines by convention.
    let head = &data[..data.len().min(1024)];
    let head = String::from_utf8_lossy(head);
    head.lines().take(5).any(|line| {
        line.contains("Code generated by")
            || line.contains("@generated")
            || line.contains("DO NOT EDIT")
            || line.contains("automatically generated")
    })
}

/// Languages excluded from the touched-files set: prose and unclassifiable
/// content, plus anything the config ignores outright.
pub fn should_skip_lang(lang: &str, ignored: &[String]) -> bool {
    lang == "Unknown"
        || lang == "Text"
        || lang == "Markdown"
        || ignored.iter().any(|l| l == lang)
}

fn file_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

fn extension(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_string)
}
