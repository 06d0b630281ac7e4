//! Argument handling for the `hackjudge` binary.

use anyhow::{Context, Result};
use std::path::Path;

use judge::{default_criteria, Criterion, Rubric};

/// Parses `NAME=PCT` (a trailing `%` is accepted) into a criterion.
///
/// The name may itself contain `=`; only the last one separates the weight.
pub fn parse_weight(arg: &str) -> Result<Criterion, String> {
    let (name, weight) = arg
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=PERCENT, got '{arg}'"))?;

    let weight = weight.trim().trim_end_matches('%').trim();
    let weight = weight
        .parse::<u32>()
        .map_err(|_| format!("weight for '{}' is not a whole percentage: '{weight}'", name.trim()))?;

    Ok(Criterion::new(name.trim(), weight))
}

/// Reads a JSON array of criteria. Both `{"name", "weight"}` and the
/// table-style `{"Criterion", "Weight (%)"}` keys are accepted.
pub fn load_criteria(path: &Path) -> Result<Vec<Criterion>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read rubric {}", path.display()))?;
    let criteria: Vec<Criterion> = serde_json::from_str(&raw)
        .with_context(|| format!("Rubric {} is not a JSON list of criteria", path.display()))?;
    Ok(criteria)
}

/// Inline weights win over a rubric file; with neither, the default rubric applies.
pub fn resolve_criteria(rubric: Option<&Path>, weights: &[Criterion]) -> Result<Vec<Criterion>> {
    if !weights.is_empty() {
        return Ok(weights.to_vec());
    }
    match rubric {
        Some(path) => load_criteria(path),
        None => Ok(default_criteria()),
    }
}

pub fn render_rubric(rubric: &Rubric) -> String {
    let mut out = String::new();
    for criterion in rubric.criteria() {
        out.push_str(&format!("{:<30} {:>5.1}%\n", criterion.name, criterion.percent()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_weight() {
        assert_eq!(parse_weight("Impact=20").unwrap(), Criterion::new("Impact", 20));
        assert_eq!(parse_weight(" Impact = 20% ").unwrap(), Criterion::new("Impact", 20));
        assert_eq!(
            parse_weight("Speed=Accuracy=40").unwrap(),
            Criterion::new("Speed=Accuracy", 40)
        );
    }

    #[test]
    fn test_parse_weight_rejects_garbage() {
        assert!(parse_weight("Impact").is_err());
        assert!(parse_weight("Impact=twenty").is_err());
        assert!(parse_weight("Impact=-5").is_err());
        assert!(parse_weight("Impact=12.5").is_err());
    }

    #[test]
    fn test_resolve_prefers_inline_weights() {
        let weights = vec![Criterion::new("Impact", 100)];
        let criteria = resolve_criteria(Some(Path::new("/nonexistent.json")), &weights).unwrap();
        assert_eq!(criteria, weights);
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        assert_eq!(resolve_criteria(None, &[]).unwrap(), default_criteria());
    }

    #[test]
    fn test_render_rubric() {
        let rubric = judge::validate(&[Criterion::new("Impact", 60), Criterion::new("Fun", 40)])
            .unwrap();
        let rendered = render_rubric(&rubric);
        assert!(rendered.contains("Impact"));
        assert!(rendered.contains("60.0%"));
        assert_eq!(rendered.lines().count(), 2);
    }
}
