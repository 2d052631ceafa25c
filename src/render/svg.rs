//! Most-used-languages SVG card rendering.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::analysis::classify;
use crate::config::{Config, CountStyle, Theme};
use crate::error::Result;
use crate::pipeline::AggregateReport;
use crate::types::LineByteCount;

const CARD_WIDTH: i64 = 360;
const HEADER_HEIGHT: i64 = 60;
const ROW_HEIGHT: i64 = 28;
const PADDING: i64 = 20;

/// Bar colors cycled per language row.
const PALETTE: [&str; 8] = [
    "#3572A5", "#00ADD8", "#DEA584", "#F1E05A", "#41B883", "#701516", "#555555", "#C22D40",
];

/// Format an integer with thousands separators.
fn fmt_int(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}

/// Two decimal places with trailing zeros (and a bare point) trimmed.
fn fmt_double(n: f64) -> String {
    let s = format!("{n:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Human-readable byte count with SI (base 1000) or binary (base 1024)
/// prefixes.
fn fmt_bytes(n: i64, base: u32) -> String {
    let prefixes: &[&str] = match base {
        1000 => &["", "k", "M", "G", "T", "P", "E"],
        _ => &["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei"],
    };

    let fbase = f64::from(base);
    let mut scaled = n as f64;
    let mut idx = 0;
    while scaled.abs() > fbase && idx < prefixes.len() - 1 {
        scaled /= fbase;
        idx += 1;
    }

    format!("{} {}", fmt_double(scaled), prefixes[idx])
}

fn fmt_count(count: LineByteCount, config: &Config) -> String {
    match config.style.count {
        CountStyle::Lines => format!("{} lines", fmt_int(count.lines)),
        CountStyle::Bytes => format!("{}B", fmt_bytes(count.bytes, config.style.bytes_base)),
    }
}

fn rank_value(count: &LineByteCount, style: CountStyle) -> i64 {
    match style {
        CountStyle::Lines => count.lines,
        CountStyle::Bytes => count.bytes,
    }
}

/// Render the per-language card as SVG text.
///
/// Unclassifiable buckets (Unknown, Text, Markdown) and the configured
/// `ignore.langs` never reach the card; percentages are computed over the
/// kept languages only.
pub fn render_svg(report: &AggregateReport, config: &Config, theme: &Theme) -> String {
    let mut langs: Vec<(&String, &LineByteCount)> = report
        .totals
        .iter()
        .filter(|(lang, _)| !classify::should_skip_lang(lang.as_str(), &config.ignore.langs))
        .collect();

    let grand_total: i64 = langs
        .iter()
        .map(|(_, c)| rank_value(c, config.style.count).max(0))
        .sum::<i64>()
        .max(1);

    let mut card_total = LineByteCount::default();
    for (_, count) in &langs {
        card_total += **count;
    }

    langs.sort_by(|a, b| {
        rank_value(b.1, config.style.count)
            .cmp(&rank_value(a.1, config.style.count))
            .then_with(|| a.0.cmp(b.0))
    });
    langs.truncate(config.langs_count);

    let total_rows = langs.len() as i64 + i64::from(config.style.show_total);
    let height = HEADER_HEIGHT + total_rows * ROW_HEIGHT + PADDING;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{CARD_WIDTH}" height="{height}" viewBox="0 0 {CARD_WIDTH} {height}" fill="none" role="img">"#
    );
    let _ = writeln!(
        svg,
        r#"  <rect x="0.5" y="0.5" width="{}" height="{}" rx="4.5" fill="{}" stroke="{}"/>"#,
        CARD_WIDTH - 1,
        height - 1,
        theme.card_bg,
        theme.card_stroke,
    );
    let _ = writeln!(
        svg,
        r#"  <text x="{PADDING}" y="30" font-family="monospace" font-size="16" font-weight="bold" fill="{}">Most Used Languages</text>"#,
        theme.header,
    );
    let _ = writeln!(
        svg,
        r#"  <text x="{PADDING}" y="48" font-family="monospace" font-size="11" fill="{}">{} files analyzed</text>"#,
        theme.sub_header,
        fmt_int(report.unique_files as i64),
    );

    let bar_width = CARD_WIDTH - 2 * PADDING;
    for (i, (lang, count)) in langs.iter().enumerate() {
        let y = HEADER_HEIGHT + i as i64 * ROW_HEIGHT;
        let share = rank_value(count, config.style.count).max(0) as f64 / grand_total as f64;
        let fill_width = ((bar_width as f64) * share).round() as i64;
        let color = PALETTE[i % PALETTE.len()];

        let _ = writeln!(
            svg,
            r#"  <text x="{PADDING}" y="{}" font-family="monospace" font-size="12" fill="{}">{}</text>"#,
            y + 11,
            theme.lang_name,
            escape(lang),
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{}" y="{}" text-anchor="end" font-family="monospace" font-size="11" fill="{}">{} ({}%)</text>"#,
            CARD_WIDTH - PADDING,
            y + 11,
            theme.count,
            fmt_count(**count, config),
            fmt_double(share * 100.0),
        );
        let _ = writeln!(
            svg,
            r#"  <rect x="{PADDING}" y="{}" width="{bar_width}" height="6" rx="3" fill="{}"/>"#,
            y + 16,
            theme.rect_bg,
        );
        if fill_width > 0 {
            let _ = writeln!(
                svg,
                r#"  <rect x="{PADDING}" y="{}" width="{fill_width}" height="6" rx="3" fill="{color}"/>"#,
                y + 16,
            );
        }
    }

    if config.style.show_total {
        let y = HEADER_HEIGHT + langs.len() as i64 * ROW_HEIGHT;
        let _ = writeln!(
            svg,
            r#"  <text x="{PADDING}" y="{}" font-family="monospace" font-size="12" font-weight="bold" fill="{}">Total: {}</text>"#,
            y + 14,
            theme.percent,
            fmt_count(card_total, config),
        );
    }

    svg.push_str("</svg>\n");
    svg
}

/// Render and write the card to disk.
pub fn write_svg<P: AsRef<Path>>(
    path: P,
    report: &AggregateReport,
    config: &Config,
    theme: &Theme,
) -> Result<()> {
    fs::write(path, render_svg(report, config, theme))?;
    Ok(())
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
