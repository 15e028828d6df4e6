//! Post-processing: deterministic cleanup of model-generated Markdown.
//!
//! The system instruction already forbids fences, page markers, and broken
//! tables, but models disobey often enough that every run gets a cheap
//! deterministic pass. The proceedings table gets special attention: the
//! model stitches a table that spans several source pages into one, and the
//! stitch points tend to leave duplicate `| --- |` separator rows behind,
//! which split the table in most renderers.
//!
//! Every rule is a pure `&str → String` function applied in a fixed order:
//! line endings are normalised before any line-based rule, fences are
//! stripped before heading spacing, and the final-newline rule runs last.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to raw model output.
pub fn clean_markdown(input: &str) -> String {
    let s = strip_outer_fences(input);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    let s = ensure_table_separators(&s);
    let s = remove_mid_table_separators(&s);
    let s = ensure_blank_before_headings(&s);
    let s = collapse_blank_lines(&s);
    let s = remove_invisible_chars(&s);
    ensure_final_newline(&s)
}

// ── Outer code fences ────────────────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md)?\s*\n(.*)\n```\s*$").unwrap());

fn strip_outer_fences(input: &str) -> String {
    match RE_OUTER_FENCES.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Whitespace normalisation ─────────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

static RE_BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_RUNS.replace_all(input, "\n\n").to_string()
}

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{trimmed}\n")
    }
}

// ── Headings ─────────────────────────────────────────────────────────────

fn ensure_blank_before_headings(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 32);
    let mut prev_blank = true;
    for line in input.lines() {
        let is_heading = line.starts_with('#');
        if is_heading && !prev_blank {
            out.push('\n');
        }
        out.push_str(line);
        out.push('\n');
        prev_blank = line.trim().is_empty();
    }
    out
}

// ── Tables ───────────────────────────────────────────────────────────────

fn is_table_row(line: &str) -> bool {
    let t = line.trim();
    t.len() > 2 && t.starts_with('|') && t.ends_with('|')
}

fn is_separator_row(line: &str) -> bool {
    let t = line.trim();
    t.starts_with('|')
        && t.contains('-')
        && t.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

/// Insert the missing separator row after a table's header row.
fn ensure_table_separators(input: &str) -> String {
    let lines: Vec<&str> = input.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len() + 4);
    let mut in_table = false;

    for (i, line) in lines.iter().enumerate() {
        out.push((*line).to_string());

        if is_table_row(line) && !is_separator_row(line) && !in_table {
            in_table = true;
            let next = lines.get(i + 1).copied().unwrap_or("");
            if is_table_row(next) && !is_separator_row(next) {
                let columns = line.trim().matches('|').count().saturating_sub(1).max(1);
                let mut sep = String::from("|");
                for _ in 0..columns {
                    sep.push_str(" :--- |");
                }
                out.push(sep);
            }
        } else if !is_table_row(line) {
            in_table = false;
        }
    }

    out.join("\n")
}

/// Drop separator rows anywhere but directly after a table's header row.
fn remove_mid_table_separators(input: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut rows_seen = 0usize;

    for line in input.lines() {
        if is_table_row(line) {
            rows_seen += 1;
            if is_separator_row(line) && rows_seen != 2 {
                continue;
            }
        } else {
            rows_seen = 0;
        }
        out.push(line);
    }

    out.join("\n")
}

// ── Invisible Unicode ────────────────────────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_outer_markdown_fence() {
        let input = "```markdown\n# Lesson Plan\n\nBody.\n```";
        let out = clean_markdown(input);
        assert!(out.starts_with("# Lesson Plan"), "got: {out}");
        assert!(!out.contains("```"));
    }

    #[test]
    fn keeps_inner_fences() {
        let input = "# Plan\n\n```python\nprint(1)\n```\n\ndone";
        let out = clean_markdown(input);
        assert!(out.contains("```python"));
    }

    #[test]
    fn normalises_crlf_and_trailing_space() {
        let out = clean_markdown("line one   \r\nline two\r");
        assert_eq!(out, "line one\nline two\n");
    }

    #[test]
    fn collapses_blank_runs() {
        let out = clean_markdown("a\n\n\n\n\nb");
        assert_eq!(out, "a\n\nb\n");
    }

    #[test]
    fn inserts_missing_table_separator() {
        let input = "| Activity | Product |\n| Quiz | Answers |";
        let out = clean_markdown(input);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "| Activity | Product |");
        assert_eq!(lines[1], "| :--- | :--- |");
        assert_eq!(lines[2], "| Quiz | Answers |");
    }

    #[test]
    fn removes_mid_table_separator_from_stitched_pages() {
        let input = "| Activity | Product |\n| :--- | :--- |\n| Quiz | Answers |\n| :--- | :--- |\n| Review | Notes |";
        let out = clean_markdown(input);
        assert_eq!(out.matches(":---").count(), 2, "got: {out}");
        assert!(out.contains("| Review | Notes |"));
    }

    #[test]
    fn keeps_separators_of_two_distinct_tables() {
        let input = "| A | B |\n| :--- | :--- |\n| 1 | 2 |\n\ntext\n\n| C | D |\n| :--- | :--- |\n| 3 | 4 |";
        let out = clean_markdown(input);
        assert_eq!(out.matches(":--- | :---").count(), 2, "got: {out}");
    }

    #[test]
    fn adds_blank_line_before_heading() {
        let out = clean_markdown("intro\n## Objectives\nbody");
        assert!(out.contains("intro\n\n## Objectives"), "got: {out}");
    }

    #[test]
    fn strips_invisible_unicode() {
        let out = clean_markdown("a\u{200B}b\u{FEFF}c");
        assert_eq!(out, "abc\n");
    }

    #[test]
    fn empty_input_is_single_newline() {
        assert_eq!(clean_markdown("   \n  "), "\n");
    }

    #[test]
    fn output_always_ends_with_single_newline() {
        assert_eq!(clean_markdown("x"), "x\n");
        assert_eq!(clean_markdown("x\n\n\n"), "x\n");
    }
}
