//! Cross-check of the judge's arithmetic.
//!
//! The judge model computes the weighted score inside free text. This module
//! reads the stated score and the per-criterion scores back out of the report
//! and recomputes the weighted average from the rubric. In
//! [`ScoringMode::Trusted`] the result is advisory; in
//! [`ScoringMode::Verified`] a missing or inconsistent score aborts the run.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::judging::JudgeReport;
use crate::rubric::Rubric;

/// Largest accepted gap, in points, between stated and recomputed scores.
pub const SCORE_TOLERANCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    #[default]
    Trusted,
    Verified,
}

impl std::str::FromStr for ScoringMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trusted" => Ok(ScoringMode::Trusted),
            "verified" => Ok(ScoringMode::Verified),
            other => Err(format!("unknown scoring mode '{other}' (expected trusted or verified)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionScore {
    pub name: String,
    pub fraction: f64,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreAudit {
    pub stated: Option<f64>,
    pub criteria: Vec<CriterionScore>,
    /// Present only when every criterion had a readable score.
    pub recomputed: Option<f64>,
    /// Criteria scored 0, which fail the whole project.
    pub failed_categories: Vec<String>,
}

impl ScoreAudit {
    pub fn discrepancy(&self) -> Option<f64> {
        Some((self.stated? - self.recomputed?).abs())
    }

    pub fn verify(&self) -> Result<(), String> {
        let stated = self
            .stated
            .ok_or_else(|| "report has no final weighted score".to_string())?;

        if let Some(missing) = self.criteria.iter().find(|c| c.score.is_none()) {
            return Err(format!("no score found for criterion '{}'", missing.name));
        }

        match self.recomputed {
            Some(recomputed) if (stated - recomputed).abs() > SCORE_TOLERANCE => Err(format!(
                "stated score {stated} does not match weighted criterion scores {recomputed:.1}"
            )),
            Some(_) => Ok(()),
            None => Err("criterion scores could not be combined".to_string()),
        }
    }
}

fn final_score_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)final weighted score[\s:*]*(\d{1,3}(?:\.\d+)?)\s*/\s*100")
            .expect("final score pattern is valid")
    })
}

fn any_final_score_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{1,3}(?:\.\d+)?)\s*/\s*100\.0").expect("score token pattern is valid")
    })
}

/// The template's own `**Score:** N` line.
fn template_score_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\*\*score:?\*\*:?\s*(\d{1,3}(?:\.\d+)?)")
            .expect("template score pattern is valid")
    })
}

fn loose_score_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bscore\b\W{0,4}(\d{1,3}(?:\.\d+)?)")
            .expect("criterion score pattern is valid")
    })
}

fn parse_score(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|s| (0.0..=100.0).contains(s))
}

fn stated_score(report: &str) -> Option<f64> {
    if let Some(caps) = final_score_re().captures(report) {
        return parse_score(&caps[1]);
    }

    // Without the labelled line, only look outside the `###` criterion sections.
    let mut in_criterion = false;
    for line in report.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("###") {
            in_criterion = true;
            continue;
        }
        if trimmed.starts_with('#') {
            in_criterion = false;
        }
        if in_criterion {
            continue;
        }
        if let Some(caps) = any_final_score_re().captures(line) {
            return parse_score(&caps[1]);
        }
    }
    None
}

/// Score found under the `#` heading that names `criterion`, before the next
/// heading. The template's `**Score:**` line wins over any other mention.
fn criterion_score(report: &str, criterion: &str) -> Option<f64> {
    let mut lines = report.lines();

    while let Some(line) = lines.next() {
        let trimmed = line.trim_start();
        if !trimmed.starts_with('#') {
            continue;
        }

        let heading = trimmed.trim_start_matches('#').trim_start();
        let Some(rest) = heading.strip_prefix(criterion) else {
            continue;
        };
        let rest = rest.trim_start();
        if !(rest.is_empty() || rest.starts_with('(') || rest.starts_with(':')) {
            continue;
        }

        let section: Vec<&str> = lines
            .by_ref()
            .take_while(|body| !body.trim_start().starts_with('#'))
            .collect();

        return [template_score_re(), loose_score_re()]
            .into_iter()
            .find_map(|re| section.iter().find_map(|body| re.captures(*body)))
            .and_then(|caps| parse_score(&caps[1]));
    }

    None
}

pub fn audit(report: &JudgeReport, rubric: &Rubric) -> ScoreAudit {
    let text = report.as_str();

    let criteria: Vec<CriterionScore> = rubric
        .criteria()
        .iter()
        .map(|c| CriterionScore {
            name: c.name.clone(),
            fraction: c.fraction,
            score: criterion_score(text, &c.name),
        })
        .collect();

    let recomputed = criteria
        .iter()
        .map(|c| c.score.map(|s| s * c.fraction))
        .sum::<Option<f64>>();

    let failed_categories = criteria
        .iter()
        .filter(|c| c.score == Some(0.0))
        .map(|c| c.name.clone())
        .collect();

    ScoreAudit {
        stated: stated_score(text),
        criteria,
        recomputed,
        failed_categories,
    }
}
