//! Parsers for oracle responses.
//!
//! Oracle output is free text; every parser here either returns a typed value
//! or signals the caller to fall back to its documented default. None of them
//! panic on garbage input.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+[.)]\s*").unwrap());
static BULLET_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*[-*]\s+").unwrap());
static FIRST_INT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d+").unwrap());
static FIRST_FLOAT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").unwrap());

/// Strip a surrounding markdown code fence, with or without a language tag.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // drop the language tag line if present
    match body.split_once('\n') {
        Some((first, tail)) if !first.trim().is_empty() && !first.contains('[') => tail.trim(),
        _ => body.trim(),
    }
}

/// Normalize a raw action response to a single candidate token: trim, strip
/// wrapping quotes, drop a leading "label:" prefix, take the first
/// whitespace-delimited token, uppercase.
pub fn normalize_token(raw: &str) -> String {
    let mut s = raw.trim();
    s = s
        .trim_start_matches(['"', '\'', '`'])
        .trim_end_matches(['"', '\'', '`'])
        .trim();
    if let Some((label, rest)) = s.split_once(':') {
        if label.split_whitespace().count() <= 2 {
            s = rest.trim();
        }
    }
    s.split_whitespace()
        .next()
        .unwrap_or("")
        .trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_ascii_uppercase()
}

/// Parse a numbered or bulleted list into its item strings, one per line.
/// Lines that are neither numbered nor bulleted but non-empty are kept as-is,
/// so plain line-per-item output also works.
pub fn parse_numbered_list(raw: &str) -> Vec<String> {
    strip_code_fences(raw)
        .lines()
        .filter_map(|line| {
            let stripped = NUMBERED_ITEM.replace(line, "");
            let stripped = BULLET_ITEM.replace(&stripped, "");
            let item = stripped.trim().trim_matches('"').trim();
            (!item.is_empty()).then(|| item.to_string())
        })
        .collect()
}

/// Parse an integer quality score, clamped to `0..=10`. Returns `None` when
/// no integer is present so the caller can apply its neutral default.
pub fn parse_score(raw: &str) -> Option<u8> {
    let m = FIRST_INT.find(raw.trim())?;
    let value: i64 = m.as_str().parse().ok()?;
    Some(value.clamp(0, 10) as u8)
}

/// Parse a clarity score in `0.0..=1.0`. Returns `None` on unparseable
/// output; the caller falls back to treating the query as clear.
pub fn parse_clarity(raw: &str) -> Option<f32> {
    let m = FIRST_FLOAT.find(raw.trim())?;
    let value: f32 = m.as_str().parse().ok()?;
    Some(value.clamp(0.0, 1.0))
}

/// Parse a comma-separated list of 1-based candidate numbers into 0-based
/// indices, dropping out-of-range entries and capping at `n`. Returns `None`
/// when no valid index survives, so the caller can fall back to the first
/// `n` candidates in their original order.
pub fn parse_index_list(raw: &str, n: usize, candidate_count: usize) -> Option<Vec<usize>> {
    let mut indices = Vec::new();
    for part in raw.trim().split(',') {
        let Some(m) = FIRST_INT.find(part) else {
            continue;
        };
        let Ok(one_based) = m.as_str().parse::<usize>() else {
            continue;
        };
        if one_based == 0 || one_based > candidate_count {
            continue;
        }
        let idx = one_based - 1;
        if !indices.contains(&idx) {
            indices.push(idx);
        }
        if indices.len() == n {
            break;
        }
    }
    (!indices.is_empty()).then_some(indices)
}

/// Parse the strict-JSON entity extraction response into a map keyed by the
/// declared entity types. Unknown keys are dropped; declared types missing
/// from the response map to empty lists. Non-string values are stringified.
/// Unparseable output yields empty lists for every declared type.
pub fn parse_entity_map(raw: &str, declared: &[String]) -> HashMap<String, Vec<String>> {
    let mut out: HashMap<String, Vec<String>> =
        declared.iter().map(|t| (t.clone(), Vec::new())).collect();

    let Ok(value) = serde_json::from_str::<serde_json::Value>(strip_code_fences(raw)) else {
        return out;
    };
    let Some(object) = value.as_object() else {
        return out;
    };

    for (key, values) in object {
        let Some(slot) = out.get_mut(key) else {
            continue;
        };
        let Some(array) = values.as_array() else {
            continue;
        };
        for v in array {
            match v {
                serde_json::Value::String(s) => slot.push(s.clone()),
                other => slot.push(other.to_string()),
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== normalize_token ====================

    #[test]
    fn normalize_token_handles_decorated_output() {
        assert_eq!(normalize_token("execute"), "EXECUTE");
        assert_eq!(normalize_token("  \"RETRY\"  "), "RETRY");
        assert_eq!(normalize_token("Action: SKIP"), "SKIP");
        assert_eq!(normalize_token("REPLAN."), "REPLAN");
        assert_eq!(normalize_token("TERMINATE because the plan is done"), "TERMINATE");
    }

    #[test]
    fn normalize_token_empty_input_yields_empty() {
        assert_eq!(normalize_token("   "), "");
    }

    // ==================== lists ====================

    #[test]
    fn parse_numbered_list_strips_prefixes() {
        let raw = "1. first query\n2) second query\n- third query\nfourth query\n\n";
        assert_eq!(
            parse_numbered_list(raw),
            vec!["first query", "second query", "third query", "fourth query"]
        );
    }

    #[test]
    fn parse_numbered_list_ignores_code_fences() {
        let raw = "```\n1. only item\n```";
        assert_eq!(parse_numbered_list(raw), vec!["only item"]);
    }

    // ==================== scores ====================

    #[test]
    fn parse_score_extracts_and_clamps() {
        assert_eq!(parse_score("7"), Some(7));
        assert_eq!(parse_score("Score: 9/10"), Some(9));
        assert_eq!(parse_score("42"), Some(10));
        assert_eq!(parse_score("-3"), Some(0));
        assert_eq!(parse_score("no number here"), None);
    }

    #[test]
    fn parse_clarity_extracts_and_clamps() {
        assert_eq!(parse_clarity("0.8"), Some(0.8));
        assert_eq!(parse_clarity("Clarity is 0.4"), Some(0.4));
        assert_eq!(parse_clarity("3.5"), Some(1.0));
        assert_eq!(parse_clarity("???"), None);
    }

    // ==================== index lists ====================

    #[test]
    fn parse_index_list_converts_one_based_and_caps() {
        assert_eq!(parse_index_list("2,1,5", 2, 5), Some(vec![1, 0]));
        assert_eq!(parse_index_list("3, 1", 3, 5), Some(vec![2, 0]));
    }

    #[test]
    fn parse_index_list_drops_out_of_range_and_duplicates() {
        assert_eq!(parse_index_list("9,2,2,0", 3, 4), Some(vec![1]));
        assert_eq!(parse_index_list("none of these", 3, 4), None);
    }

    // ==================== entity maps ====================

    #[test]
    fn parse_entity_map_fills_declared_types() {
        let declared = vec!["trails".to_string(), "regions".to_string()];
        let raw = r#"{"trails": ["a", "b"], "extra": ["ignored"]}"#;
        let map = parse_entity_map(raw, &declared);
        assert_eq!(map["trails"], vec!["a", "b"]);
        assert!(map["regions"].is_empty());
        assert!(!map.contains_key("extra"));
    }

    #[test]
    fn parse_entity_map_survives_garbage() {
        let declared = vec!["trails".to_string()];
        let map = parse_entity_map("not json at all", &declared);
        assert!(map["trails"].is_empty());
    }

    #[test]
    fn parse_entity_map_strips_fences_and_stringifies() {
        let declared = vec!["counts".to_string()];
        let raw = "```json\n{\"counts\": [1, 2]}\n```";
        let map = parse_entity_map(raw, &declared);
        assert_eq!(map["counts"], vec!["1", "2"]);
    }

    // ==================== fences ====================

    #[test]
    fn strip_code_fences_handles_language_tags() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("[1]"), "[1]");
    }
}
