use ingest::ExtractedText;
use llm::PromptPair;

use crate::media::MediaDescription;
use crate::rubric::Rubric;

/// Placeholder the judge must overwrite with its computed weighted score.
pub const SCORE_PLACEHOLDER: &str = "[FINAL_CALCULATED_SCORE]";

/// Upper bound on narrative sub-criteria per category.
pub const MAX_SUB_CRITERIA: usize = 5;

const SUMMARY_SYSTEM_PROMPT: &str = r#"You are a highly efficient text processor. Your task is to analyze raw content from technical documentation and presentation material and produce focused summaries.

INSTRUCTIONS:
1. Technical Content Summary: Read the technical documentation text. Summarize its key points on technical architecture, feasibility and impact. If the content is empty or very short, state "No technical content provided for analysis." Label this section exactly "TECHNICAL SUMMARY:".
2. Presentation Summary: Read the description of the demo video. If it is a presentation, summarize its overall quality: clarity, feasibility, whether the technical statements are correct, whether the content looks plagiarised, and whether it is accurate. If it shows the project running, base the summary on whether the project works and whether what it shows is correct. Both kinds of video are equally acceptable. If the description is empty or very short, state "No presentation notes provided for analysis." Label this section exactly "PRESENTATION SUMMARY:".

Combine both sections into a single output. Do not include any other commentary."#;

const JUDGE_SYSTEM_HEADER: &str = r#"You are an experienced and very strict judge for a major hackathon. Analyze the project submission and give a fair, detailed, quantitative score out of 100.
Judge the material for accuracy, detail and completeness. Award no marks for effort; award marks only for results achieved."#;

const JUDGE_SYSTEM_FOOTER: &str = r#"## Judge's Summary
[A final, accurate summary of the project's strengths and one area for improvement.]
[If the project scores 0 in one or more categories, state next to the final score that this project has failed.]"#;

/// Fixed summarization instructions plus the document and video description.
pub fn build_summary_prompt(document: &ExtractedText, media: &MediaDescription) -> PromptPair {
    let user = format!(
        r#"---
TECHNICAL DOCUMENT TEXT (from PDF/Report, length: {pdf_length} characters):
{pdf_text}
---
DEMO VIDEO SUMMARY (from video, length: {video_length} characters):
{video_summary}
---
Generate the summaries based on the system instructions."#,
        pdf_length = document.length,
        pdf_text = document.content,
        video_length = media.length,
        video_summary = media.content,
    );

    PromptPair::new(SUMMARY_SYSTEM_PROMPT, user)
}

/// Judge instructions for one rubric: the weight list and one scoring block
/// per criterion, in rubric order.
pub fn render_judge_system(rubric: &Rubric) -> String {
    let criteria_list = rubric
        .criteria()
        .iter()
        .map(|c| format!("- {}: {:.0}%", c.name, c.percent()))
        .collect::<Vec<_>>()
        .join("\n");

    let category_blocks = rubric
        .criteria()
        .iter()
        .map(|c| {
            format!(
                "### {} (Weight: {:.0}%)\n**Score:** [0-100]/100\n**Justification:** [Your analysis here]",
                c.name,
                c.percent()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"{header}

JUDGING CRITERIA & WEIGHTS:
{criteria_list}

PROCESS:
1. Analyze the Project Description, the pre-generated summaries (technical and presentation) and the demo code snippet.
2. Score the project from 0 to 100 for EACH criterion above.
3. Justify each score with a breakdown into at most {max_sub} sub-criteria describing the technical aspects accurately. Do not score the sub-criteria; use them only to justify the main score.
4. Calculate the final weighted score out of 100 from the individual scores and their weights.
5. CRITICAL: replace the placeholder `{placeholder}` with the exact numeric result of the weighted average (e.g. 85.5, 72.0).

REQUIRED OUTPUT FORMAT (Markdown):

# Hackathon Judge Report

## Final Weighted Score: {placeholder}/100.0

## Detailed Category Scores & Analysis
The presentation summary may describe a slide presentation or a demo video. For a demo video, score on whether the project visibly works; for a presentation, score on the criteria below.
For code quality and correctness: deduct lightly for minor, easily fixed issues and heavily for architectural problems or non-functional code.

{category_blocks}

{footer}"#,
        header = JUDGE_SYSTEM_HEADER,
        criteria_list = criteria_list,
        max_sub = MAX_SUB_CRITERIA,
        placeholder = SCORE_PLACEHOLDER,
        category_blocks = category_blocks,
        footer = JUDGE_SYSTEM_FOOTER,
    )
}

/// Rubric-specific judge prompt carrying the submission text, digest and code.
pub fn build_judge_prompt(
    rubric: &Rubric,
    description: &str,
    digest: &str,
    code_snippet: &str,
) -> PromptPair {
    let user = format!(
        r#"Please judge the following hackathon submission using the summaries generated from the files.

SUBMISSION DETAILS

---
Project Description:
{description}

---
FILE SUMMARIES (generated by the summarization stage):
{digest}
---
Demo Code Text:

{code_snippet}
"#
    );

    PromptPair::new(render_judge_system(rubric), user)
}
