//! Structured issue records extracted from a markdown code review.
//!
//! The review model is asked for three fixed sections, each a numbered list
//! of bold issue titles followed by `**Impact**` and `**Fix**` bullets.
//! Parsing is heuristic: anything that does not match is dropped silently.

use crate::error::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// ReviewCategory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewCategory {
    BestPractices,
    Security,
    Modularity,
}

impl ReviewCategory {
    pub fn all() -> &'static [ReviewCategory] {
        &[
            ReviewCategory::BestPractices,
            ReviewCategory::Security,
            ReviewCategory::Modularity,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReviewCategory::BestPractices => "best_practices",
            ReviewCategory::Security => "security",
            ReviewCategory::Modularity => "modularity",
        }
    }

    /// Section heading the review model is told to use.
    pub fn heading(self) -> &'static str {
        match self {
            ReviewCategory::BestPractices => "Best Practice Violations",
            ReviewCategory::Security => "Security and Performance Issues",
            ReviewCategory::Modularity => "Modularity and Structure Improvements",
        }
    }

    pub(crate) fn impact_hint(self) -> &'static str {
        match self {
            ReviewCategory::BestPractices => "Describe the impact of this violation",
            ReviewCategory::Security => "Describe the impact of this issue",
            ReviewCategory::Modularity => "Describe the impact of this improvement",
        }
    }

    pub(crate) fn fix_hint(self) -> &'static str {
        match self {
            ReviewCategory::Modularity => "Provide the recommended changes",
            _ => "Provide the recommended fix",
        }
    }
}

impl fmt::Display for ReviewCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ReviewChunk
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewChunk {
    pub category: ReviewCategory,
    pub issue: String,
    pub impact: Option<String>,
    pub fix: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn section_end_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(?:#{2,6}[ \t]|---)").unwrap())
}

fn issue_title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^[ \t]*\d+\.[ \t]+\*\*(.+?)\*\*").unwrap())
}

fn impact_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^[ \t]*[-*][ \t]*\*\*Impact(?:\*\*:|:\*\*)[ \t]*(.+)$").unwrap())
}

fn fix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^[ \t]*[-*][ \t]*\*\*Fix(?:\*\*:|:\*\*)[ \t]*(.+)$").unwrap())
}

fn heading_re(name: &str) -> Regex {
    let pattern = format!(
        r"(?m)^#{{1,6}}[ \t]*\*{{0,2}}[ \t]*{}[ \t]*\*{{0,2}}[ \t]*:?[ \t]*\r?$",
        regex::escape(name)
    );
    // Built from an escaped literal, so the pattern is always valid.
    Regex::new(&pattern).unwrap()
}

/// Body of the section headed `name`: everything after the heading line up
/// to the next `##`-level heading, a `---` rule, or the end of the text.
fn section_body<'a>(raw: &'a str, name: &str) -> Option<&'a str> {
    let heading = heading_re(name).find(raw)?;
    let rest = &raw[heading.end()..];
    let end = section_end_re()
        .find(rest)
        .map(|m| m.start())
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

fn first_capture(re: &Regex, block: &str) -> Option<String> {
    re.captures(block)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extract every issue from the three review sections, in section order.
pub fn parse_review(raw: &str) -> Vec<ReviewChunk> {
    let mut chunks = Vec::new();

    for &category in ReviewCategory::all() {
        let Some(body) = section_body(raw, category.heading()) else {
            tracing::debug!(section = category.heading(), "review section not found");
            continue;
        };

        let titles: Vec<_> = issue_title_re().captures_iter(body).collect();
        for (i, caps) in titles.iter().enumerate() {
            let whole = caps.get(0).map(|m| m.end()).unwrap_or(0);
            let next = titles
                .get(i + 1)
                .and_then(|c| c.get(0))
                .map(|m| m.start())
                .unwrap_or(body.len());
            let block = &body[whole..next];

            chunks.push(ReviewChunk {
                category,
                issue: caps[1].trim().trim_end_matches(':').trim().to_string(),
                impact: first_capture(impact_re(), block),
                fix: first_capture(fix_re(), block),
            });
        }
    }

    chunks
}

/// `- issue: fix` lines for every chunk that carries a fix.
pub fn fixes_summary(chunks: &[ReviewChunk]) -> String {
    chunks
        .iter()
        .filter_map(|c| c.fix.as_ref().map(|fix| format!("- {}: {}", c.issue, fix)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn save_chunks(path: &Path, chunks: &[ReviewChunk]) -> Result<()> {
    let data = serde_json::to_string_pretty(chunks)?;
    crate::io::atomic_write(path, data.as_bytes())
}

pub fn load_chunks(path: &Path) -> Result<Vec<ReviewChunk>> {
    let data = crate::io::read_input("improve", path)?;
    Ok(serde_json::from_str(&data)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const REVIEW: &str = r#"Here is my review.

### **Best Practice Violations**
1. **Hardcoded Secret Key**
   - **Impact**: Anyone with the source can forge tokens.
   - **Fix**: Load the key with os.getenv("SECRET_KEY").

2. **No Input Validation**
   - **Impact**: Malformed payloads reach the database.
   - **Fix**: Use Pydantic models.

### **Security and Performance Issues**
1. **Plaintext Passwords**
   - **Impact**: A leaked database exposes every password.
   - **Fix**: Hash with bcrypt.

### **Modularity and Structure Improvements**
1. **Single File App**
   - **Impact**: Hard to navigate.
   - **Fix**: Split routers into modules.

---
Let me know if you need more.
"#;

    #[test]
    fn parses_all_sections_in_order() {
        let chunks = parse_review(REVIEW);
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].category, ReviewCategory::BestPractices);
        assert_eq!(chunks[0].issue, "Hardcoded Secret Key");
        assert_eq!(
            chunks[0].fix.as_deref(),
            Some(r#"Load the key with os.getenv("SECRET_KEY")."#)
        );
        assert_eq!(chunks[1].issue, "No Input Validation");
        assert_eq!(chunks[2].category, ReviewCategory::Security);
        assert_eq!(
            chunks[2].impact.as_deref(),
            Some("A leaked database exposes every password.")
        );
        assert_eq!(chunks[3].category, ReviewCategory::Modularity);
        assert_eq!(chunks[3].fix.as_deref(), Some("Split routers into modules."));
    }

    #[test]
    fn sections_do_not_bleed_into_each_other() {
        let chunks = parse_review(REVIEW);
        let best: Vec<_> = chunks
            .iter()
            .filter(|c| c.category == ReviewCategory::BestPractices)
            .collect();
        assert_eq!(best.len(), 2);
    }

    #[test]
    fn missing_section_is_skipped() {
        let raw = "### **Security and Performance Issues**\n1. **SQL Injection**\n   - **Fix**: Use parameters.\n";
        let chunks = parse_review(raw);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].category, ReviewCategory::Security);
        assert_eq!(chunks[0].impact, None);
        assert_eq!(chunks[0].fix.as_deref(), Some("Use parameters."));
    }

    #[test]
    fn no_sections_yields_nothing() {
        assert!(parse_review("The code looks fine to me.").is_empty());
        assert!(parse_review("").is_empty());
    }

    #[test]
    fn tolerates_plain_headings_and_colon_inside_bold() {
        let raw = "## Modularity and Structure Improvements\n\n1. **Routers:**\n- **Impact:** Tangled routes\n- **Fix:** Use APIRouter\n";
        let chunks = parse_review(raw);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].issue, "Routers");
        assert_eq!(chunks[0].impact.as_deref(), Some("Tangled routes"));
        assert_eq!(chunks[0].fix.as_deref(), Some("Use APIRouter"));
    }

    #[test]
    fn fields_come_from_their_own_block() {
        let raw = "### **Best Practice Violations**\n1. **First**\n   - **Impact**: one\n2. **Second**\n   - **Fix**: two\n";
        let chunks = parse_review(raw);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].fix, None);
        assert_eq!(chunks[1].impact, None);
        assert_eq!(chunks[1].fix.as_deref(), Some("two"));
    }

    #[test]
    fn section_ends_at_rule() {
        let raw = "### **Best Practice Violations**\n1. **Kept**\n---\n1. **Dropped**\n";
        let chunks = parse_review(raw);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].issue, "Kept");
    }

    #[test]
    fn chunk_json_shape() {
        let chunk = ReviewChunk {
            category: ReviewCategory::BestPractices,
            issue: "X".into(),
            impact: None,
            fix: Some("Y".into()),
        };
        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"category": "best_practices", "issue": "X", "impact": null, "fix": "Y"})
        );
    }

    #[test]
    fn fixes_summary_skips_chunks_without_fix() {
        let chunks = parse_review(
            "### **Best Practice Violations**\n1. **A**\n   - **Fix**: do a\n2. **B**\n   - **Impact**: bad\n",
        );
        assert_eq!(fixes_summary(&chunks), "- A: do a");
    }

    #[test]
    fn save_and_load_keep_non_ascii() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("outputs/review_chunks.json");
        let chunks = vec![ReviewChunk {
            category: ReviewCategory::Security,
            issue: "Contraseñas en claro".into(),
            impact: Some("Fuga".into()),
            fix: None,
        }];
        save_chunks(&path, &chunks).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("Contraseñas"));
        assert_eq!(load_chunks(&path).unwrap(), chunks);
    }
}
