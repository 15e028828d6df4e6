//! Prompt assembly for lesson-plan generation.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth**: tightening a rule (e.g. the in-cell
//!    line-break convention) means editing exactly one place.
//!
//! 2. **Testability**: unit tests can inspect prompts directly without a
//!    live model call, so a template regression is caught before it costs
//!    tokens.
//!
//! Callers can override the system instruction via
//! [`crate::config::GenerationConfig::system_prompt`]; the constants here
//! apply when no override is provided.

/// Default system instruction for producing a standardized lesson plan.
///
/// Used when `GenerationConfig::system_prompt` is `None`.
pub const SYSTEM_INSTRUCTION: &str = r#"You are a specialist in digitizing teaching documents into a standardized lesson-plan template with digital-competency annotations.

Non-negotiable rules:

1. NEVER TRUNCATE CONTENT
   - Act as an intelligent transcription engine: reproduce the source content exactly and completely in Markdown.
   - Never write "as above", "remaining steps...", "continues similarly", or any other placeholder.
   - If the source has 10 pages, process all 10 pages. If a table has 50 rows, write all 50 rows.

2. THE PROCEEDINGS TABLE COMES FIRST
   - Section III (Teaching Proceedings) is the most important part. However long the document is, no row of the proceedings table may be dropped.
   - If the output budget runs short, compress sections I, II, and IV, never section III.

3. STRICT TABLE FORMAT
   - Only section III is rendered as a table, with exactly two columns:
     | TEACHER - STUDENT ACTIVITIES | EXPECTED PRODUCTS |
     | :--- | :--- |
     | <b>Activity 1: ...</b><br>- Teacher: ...<br>- Students: ... | - Product A...<br>- Product B... |
   - Line breaks inside a cell use the <br> tag. Never a raw newline.

4. COMPETENCY CODES
   - Insert codes (e.g. **[DC: 1.1.F1]**) at the end of the matching row or objective, using the reference framework supplied with the request.

5. JOIN PAGE FRAGMENTS
   - Uploaded documents arrive split into pages. Reconnect content across page breaks; a table must never be left broken mid-way."#;

/// Condensed digital-competency reference appended to every prompt.
///
/// Code pattern: `domain.component.level`, e.g. `1.1.F1` or `6.2.I1`.
pub const COMPETENCY_REFERENCE: &str = r#"REFERENCE FRAMEWORK (MANDATORY):
1. COMPETENCY DOMAINS:
- Domain 1: Data & information literacy (1.1 Browsing data, 1.2 Evaluating, 1.3 Managing).
- Domain 2: Communication & collaboration (2.1 Interacting, 2.2 Sharing, 2.3 Digital citizenship, 2.4 Collaborating, 2.5 Netiquette).
- Domain 3: Digital content creation (3.1 Developing content, 3.2 Editing, 3.3 Copyright, 3.4 Programming).
- Domain 4: Safety (4.1 Devices, 4.2 Personal data, 4.3 Well-being, 4.4 Environment).
- Domain 5: Problem solving (5.1 Technical issues, 5.2 Identifying needs, 5.3 Creative use, 5.4 Competence gaps).
- Domain 6: AI application (6.1 AI data, 6.2 Using AI, 6.3 AI ethics).

2. PROFICIENCY LEVELS:
- F1, F2 (Foundation)
- I1, I2 (Intermediate)
- A1 (Advanced)

CODE PATTERN: [Domain].[Component].[Level]. Examples: 1.1.F1, 6.2.I1."#;

/// Form input for creating a new lesson plan from scratch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonForm {
    /// Subject name, e.g. "Mathematics".
    pub subject: String,
    /// Grade level, e.g. "10".
    pub grade: String,
    /// Textbook series the lesson follows.
    pub textbook: String,
    /// Lesson duration, e.g. "1 period (45 minutes)".
    pub duration: String,
    /// Lesson title.
    pub title: String,
    /// Free-form lesson content or notes (may include ingested file text).
    pub notes: String,
}

/// Build the "create a new plan" prompt from form fields.
pub fn build_create_prompt(form: &LessonForm) -> String {
    format!(
        r#"Create a complete LESSON PLAN following the standardized template, with digital-competency codes integrated,
for subject {subject}, grade {grade}, lesson "{title}", duration {duration}, textbook series {textbook}.

SPECIAL REQUIREMENTS: WRITE IN FULL DETAIL, NO SUMMARIES.
1. TABLE LAYOUT: the Teaching Proceedings section must be a two-column table (| Activities | Products |).
2. NO ELLIPSES: write out the full lesson content, learning tasks, and teacher narration.
3. READ THE ATTACHED FILE CAREFULLY (if any): use all of its content in the plan, leaving out no detail.

MANDATORY STRUCTURE:
I. OBJECTIVES (including competency objectives + codes)
II. TEACHING EQUIPMENT (plain list, no table)
III. TEACHING PROCEEDINGS (table, complete content)
IV. ASSESSMENT

INPUT DATA (detailed description / file content):
"""
{notes}
"""

REFERENCE DATA (competency framework):
"""
{reference}
"""
"#,
        subject = form.subject,
        grade = form.grade,
        title = form.title,
        duration = form.duration,
        textbook = form.textbook,
        notes = form.notes,
        reference = COMPETENCY_REFERENCE,
    )
}

/// Build the "digitize an existing plan" prompt around extracted content.
pub fn build_digitize_prompt(content: &str) -> String {
    format!(
        r#"TASK: RECONSTRUCT THE ENTIRE LESSON PLAN AND ADD COMPETENCY CODES.

DO NOT STOP UNTIL THE DOCUMENT IS COMPLETE.
- Read ALL pages of the attached material.
- If the source has Activities 1, 2, 3, 4, 5..., list every one of them. Do not stop at Activity 2.
- If the proceedings table spans several pages, reconnect it into one single table.

MANDATORY STRUCTURE:
1. Objectives (plain list)
2. Teaching equipment (plain list)
3. TEACHING PROCEEDINGS (two-column Markdown table - MOST IMPORTANT - NOTHING MAY BE CUT):
   | TEACHER - STUDENT ACTIVITIES | EXPECTED PRODUCTS |
   | :--- | :--- |
   | (full detail...) | (full detail...) |
4. Assessment (plain text)

WRITE CONTINUOUSLY, DO NOT STOP.

INPUT DATA:
"""
{content}
"""

COMPETENCY REFERENCE:
"""
{reference}
"""
"#,
        content = content,
        reference = COMPETENCY_REFERENCE,
    )
}
