//! Prompt templates for every model call in the pipeline.

use crate::review::{self, ReviewCategory, ReviewChunk};

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

pub const GENERATOR_SYSTEM: &str =
    "You are a code generator. DO NOT output <think> tags or internal thoughts. Just code.";

const GENERATION_TEMPLATE: &str = r#"
You are a senior full-stack developer creating a SaaS boilerplate using FastAPI and HTMX.

User story:
{{user_story}}

Required modules:
- Authentication
- Billing
- User management

Constraints:
- FastAPI
- Use SQLite
- Use HTMX templates

Respond ONLY with valid Python code.
Do NOT include <think> or any commentary. Output Python code only.
"#;

pub fn generation_prompt(user_story: &str) -> String {
    GENERATION_TEMPLATE.replace("{{user_story}}", user_story.trim())
}

// ---------------------------------------------------------------------------
// analyze
// ---------------------------------------------------------------------------

pub const REVIEWER_SYSTEM: &str =
    "You are a senior Python reviewer. Respond clearly and concisely.";

pub fn review_prompt(context: &str, code: &str) -> String {
    let mut sections = String::new();
    for category in ReviewCategory::all() {
        sections.push_str(&format!(
            "### **{}**\n1. **Issue Title**\n   - **Impact**: {}\n   - **Fix**: {}\n\n",
            category.heading(),
            category.impact_hint(),
            category.fix_hint(),
        ));
    }

    format!(
        r#"
You are a FastAPI best practices and security expert.

Using the documentation below, analyze the given code.

# Documentation
{context}

# Code
{code}

---

Please analyze the code and provide the following sections:

{sections}For each issue, provide a clear title, impact assessment, and specific fix recommendation.
Use bullet points and maintain the exact section names and format shown above.
"#
    )
}

// ---------------------------------------------------------------------------
// improve
// ---------------------------------------------------------------------------

pub const REFACTOR_SYSTEM: &str = "You are a senior Python code refactoring assistant.
Always return clean, runnable Python source code.
NEVER include markdown formatting like ```python or ```.
NEVER output commentary, explanations, or <think> blocks.
Only return the rewritten source code.";

const REFACTOR_IMPROVEMENTS: &[&str] = &[
    "Use bcrypt for password hashing and verification",
    "Use os.getenv() to securely load the JWT secret key",
    "Explicitly set the JWT algorithm (e.g., \"HS256\")",
    "Add a refresh token system (access + refresh token endpoints)",
    "Implement rate limiting using FastAPI middleware (e.g., SlowAPI)",
    "Wrap database operations in try/except and return HTTP 500 errors if they fail",
    "Use FastAPI's Depends() to inject the database connection",
    "Use Pydantic models for input validation (e.g., for user creation)",
    "Use logging for important events and errors",
    "Do not remove or replace existing routes like /users, /billing, /dashboard",
    "Do not mock database logic, keep real sqlite3 queries",
    "Preserve and support existing htmx.render() template endpoints",
    "Do not generate explanations, markdown code blocks, or <think> tags",
];

pub fn refactor_prompt(code: &str, chunks: &[ReviewChunk]) -> String {
    let improvements = REFACTOR_IMPROVEMENTS
        .iter()
        .map(|i| format!("- {i}"))
        .collect::<Vec<_>>()
        .join("\n");

    let summary = review::fixes_summary(chunks);
    let findings = if summary.is_empty() {
        String::new()
    } else {
        format!("\nAlso resolve these findings from the code review:\n\n{summary}\n")
    };

    format!(
        r#"
You are a senior Python code refactoring expert.

Here is the original FastAPI code:
---
{code}
---

Apply the following improvements *without removing or simplifying any functionality*:

{improvements}
{findings}
Return ONLY valid Python source code.
DO NOT explain anything.
DO NOT use markdown syntax like ```python.
DO NOT wrap anything in <think> or other tags.

Output:
"#
    )
}

// ---------------------------------------------------------------------------
// harden
// ---------------------------------------------------------------------------

pub const HARDENING_SYSTEM: &str = r#"
You are a senior Python security engineer.
You will harden this FastAPI code for production use by applying the following:

1. Security:
   - Enforce HTTPS or document enforcement instructions
   - Require secrets like JWT keys via os.getenv with no fallbacks
   - Validate and sanitize user inputs (e.g., password, email)
   - Add secure headers using middleware
   - Set strict CORS policies
   - Disable debug mode

2. Logging:
   - Log critical security and failure events

3. Resilience:
   - Use structured exception handling (try/except with HTTPExceptions)
   - Avoid logging sensitive data
   - Fail gracefully if dependencies like DB or secrets are misconfigured

Return ONLY the final Python source code.
DO NOT include markdown, explanations, or tags.
The code must be clean, executable, and production-hardened.
"#;

pub fn hardening_prompt(code: &str) -> String {
    format!("Here is the FastAPI code:\n\n{code}\n\nPlease return only hardened Python code.")
}

// ---------------------------------------------------------------------------
// readme
// ---------------------------------------------------------------------------

pub fn readme_prompt(code: &str) -> String {
    format!(
        r#"
You are a senior technical writer and Python engineer.

Your task is to create a professional, well-structured `README.md` for the following FastAPI app.

It must include:
1. Project description
2. Features
3. Installation instructions (with all necessary Python packages based on the code)
4. How to run the app with `uvicorn`
5. Environment variables explanation
6. API documentation to complement the auto-generated Swagger UI
7. Example `curl` requests for all routes
8. License section

Here is the full code:
---
{code}
---
"#
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
