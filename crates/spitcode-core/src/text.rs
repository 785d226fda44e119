//! Cleanup of free-text model output.
//!
//! Models asked for "code only" still wrap answers in markdown fences and
//! `<think>` reasoning blocks. Every function here is best effort: it never
//! fails, it only removes what it recognises.

use regex::Regex;
use std::sync::OnceLock;

fn think_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<think>.*?</think>").unwrap())
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

fn python_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```python\n?").unwrap())
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```\n?").unwrap())
}

fn inline_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"`.*?`").unwrap())
}

fn blank_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").unwrap())
}

fn comment_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*#.*$").unwrap())
}

/// Remove `<think>...</think>` blocks, including multi-line ones.
pub fn strip_think_blocks(text: &str) -> String {
    think_re().replace_all(text, "").into_owned()
}

/// Remove think blocks, then any remaining `<...>` tag, and trim.
pub fn strip_markup(text: &str) -> String {
    let without_think = strip_think_blocks(text);
    tag_re().replace_all(&without_think, "").trim().to_string()
}

/// Collapse runs of three or more newlines into a single blank line.
pub fn collapse_blank_lines(text: &str) -> String {
    blank_run_re().replace_all(text, "\n\n").into_owned()
}

/// Final cleanup of a streamed generation: think blocks and every
/// ```` ``` ```` are removed.
pub fn clean_generation(buffer: &str) -> String {
    strip_think_blocks(buffer)
        .replace("```", "")
        .trim()
        .to_string()
}

/// Pull Python source out of a chat answer.
///
/// Falls back to the whole text when there is no fence: the fences are
/// deleted rather than used as delimiters.
pub fn extract_code(llm_output: &str) -> String {
    let clean = strip_markup(llm_output);
    let clean = python_fence_re().replace_all(&clean, "");
    let clean = fence_re().replace_all(&clean, "");
    let clean = inline_code_re().replace_all(&clean, "");
    collapse_blank_lines(clean.trim())
}

/// Pull Python source out of an answer that must survive a syntax check.
///
/// Only think blocks and fence markers are removed. Angle brackets and
/// backticks belong to the code (HTML string literals, comparisons).
pub fn strip_code_fences(llm_output: &str) -> String {
    let clean = strip_think_blocks(llm_output);
    let clean = python_fence_re().replace_all(&clean, "");
    let clean = fence_re().replace_all(&clean, "");
    collapse_blank_lines(clean.trim())
}

/// Blank out whole-line `#` comments, then normalise blank lines and trim.
pub fn strip_comment_lines(code: &str) -> String {
    let without = comment_line_re().replace_all(code, "");
    collapse_blank_lines(&without).trim().to_string()
}

/// Truncate `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn think_blocks_removed_across_lines() {
        let text = "<think>\nplan the app\nstep 2\n</think>\nimport os\n<think>again</think>x";
        assert_eq!(strip_think_blocks(text), "\nimport os\nx");
    }

    #[test]
    fn think_removal_is_lazy() {
        let text = "<think>a</think>keep<think>b</think>";
        assert_eq!(strip_think_blocks(text), "keep");
    }

    #[test]
    fn unterminated_think_block_is_left_alone() {
        let text = "<think>never closed\ncode";
        assert_eq!(strip_think_blocks(text), text);
    }

    #[test]
    fn strip_markup_removes_other_tags() {
        let text = "  <think>x</think><answer>app = FastAPI()</answer>  ";
        assert_eq!(strip_markup(text), "app = FastAPI()");
    }

    #[test]
    fn clean_generation_drops_fences_and_trims() {
        let buffer = "<think>hmm</think>\n```\nfrom fastapi import FastAPI\n```\n";
        assert_eq!(clean_generation(buffer), "from fastapi import FastAPI");
    }

    #[test]
    fn extract_code_from_fenced_answer() {
        let answer = "<think>refactor</think>\n```python\nimport os\n\n\n\napp = 1\n```\n";
        assert_eq!(extract_code(answer), "import os\n\napp = 1");
    }

    #[test]
    fn extract_code_without_fences_keeps_text() {
        assert_eq!(extract_code("x = 1\ny = 2"), "x = 1\ny = 2");
    }

    #[test]
    fn extract_code_drops_inline_spans() {
        assert_eq!(extract_code("Use `bcrypt` here\nx = 1"), "Use  here\nx = 1");
    }

    #[test]
    fn strip_code_fences_keeps_html_literals() {
        let answer = "<think>add escaping</think>\n```python\ndef card(name):\n    return \"<div class='user'>\" + name + \"</div>\"\n```\n";
        assert_eq!(
            strip_code_fences(answer),
            "def card(name):\n    return \"<div class='user'>\" + name + \"</div>\""
        );
    }

    #[test]
    fn strip_code_fences_keeps_comparisons_across_lines() {
        let code = "if n < 0:\n    n = 0\nsecret = load()\nok = n > 1\nvalid = 8 <= len(p) <= 128";
        assert_eq!(strip_code_fences(code), code);
    }

    #[test]
    fn strip_code_fences_keeps_backticks_in_strings() {
        let code = "```\nsql = \"SELECT `id` FROM users\"\n```";
        assert_eq!(strip_code_fences(code), "sql = \"SELECT `id` FROM users\"");
    }

    #[test]
    fn strip_comment_lines_keeps_code() {
        let code = "# header\nimport os\n    # indented comment\nx = 1  # trailing kept\n\n\n\ny = 2\n";
        assert_eq!(strip_comment_lines(code), "import os\n\nx = 1  # trailing kept\n\ny = 2");
    }

    #[test]
    fn collapse_blank_lines_keeps_single_blank() {
        assert_eq!(collapse_blank_lines("a\n\nb\n\n\n\nc"), "a\n\nb\n\nc");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
