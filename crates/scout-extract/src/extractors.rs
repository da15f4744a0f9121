use std::sync::OnceLock;

use regex::Regex;
use scout_lens::FieldExtractor;
use serde_json::Value;

use crate::fields::{field_text, field_value};
use crate::primitives::Primitives;

/// Dispatches one of the eight deterministic `FieldExtractor` kinds
/// against a rule's `source_fields` (spec section 4.5). `LlmStructured` is
/// handled separately by the second pass and is never passed here.
pub fn evaluate_extractor(
    extractor: &FieldExtractor,
    source_fields: &[String],
    primitives: &Primitives,
    raw_observations: &serde_json::Map<String, Value>,
) -> Result<Option<Value>, String> {
    match extractor {
        FieldExtractor::NumericParser => Ok(numeric_parser(source_fields, primitives, raw_observations)),
        FieldExtractor::RegexCapture { pattern } => regex_capture(pattern, source_fields, primitives, raw_observations),
        FieldExtractor::JsonPath { path } => Ok(json_path(path, source_fields, raw_observations)),
        FieldExtractor::BooleanCoercion => Ok(boolean_coercion(source_fields, primitives, raw_observations)),
        FieldExtractor::Coalesce | FieldExtractor::Normalize => Ok(coalesce(source_fields, primitives, raw_observations)),
        FieldExtractor::ArrayBuilder { separator } => Ok(array_builder(separator, source_fields, primitives, raw_observations)),
        FieldExtractor::StringTemplate { template } => Ok(string_template(template, primitives, raw_observations)),
        FieldExtractor::LlmStructured { .. } => {
            Err("llm_structured rules are not evaluated by the deterministic pass".to_string())
        }
    }
}

fn number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?\d+(\.\d+)?").unwrap())
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{(\w+)\}").unwrap())
}

fn numeric_parser(source_fields: &[String], primitives: &Primitives, raw_observations: &serde_json::Map<String, Value>) -> Option<Value> {
    source_fields.iter().find_map(|field| {
        let value = field_value(field, primitives, raw_observations)?;
        match value {
            Value::Number(_) => Some(value),
            Value::String(ref s) => number_regex().find(s).and_then(|m| m.as_str().parse::<f64>().ok()).map(|n| serde_json::json!(n)),
            _ => None,
        }
    })
}

fn regex_capture(
    pattern: &str,
    source_fields: &[String],
    primitives: &Primitives,
    raw_observations: &serde_json::Map<String, Value>,
) -> Result<Option<Value>, String> {
    let re = Regex::new(pattern).map_err(|e| e.to_string())?;
    for field in source_fields {
        if let Some(text) = field_text(field, primitives, raw_observations) {
            if let Some(caps) = re.captures(&text) {
                if let Some(m) = caps.get(1).or_else(|| caps.get(0)) {
                    return Ok(Some(Value::String(m.as_str().to_string())));
                }
            }
        }
    }
    Ok(None)
}

fn json_path(path: &str, source_fields: &[String], raw_observations: &serde_json::Map<String, Value>) -> Option<Value> {
    source_fields.iter().find_map(|field| raw_observations.get(field).and_then(|root| walk_json_path(root, path).cloned()))
}

fn walk_json_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cursor = root;
    for segment in path.split('.') {
        if let Some((name, idx)) = parse_index_segment(segment) {
            if !name.is_empty() {
                cursor = cursor.as_object()?.get(name)?;
            }
            cursor = cursor.as_array()?.get(idx)?;
        } else {
            cursor = cursor.as_object()?.get(segment)?;
        }
    }
    Some(cursor)
}

fn parse_index_segment(segment: &str) -> Option<(&str, usize)> {
    let open = segment.find('[')?;
    let close = segment.find(']')?;
    let idx: usize = segment[open + 1..close].parse().ok()?;
    Some((&segment[..open], idx))
}

fn boolean_coercion(source_fields: &[String], primitives: &Primitives, raw_observations: &serde_json::Map<String, Value>) -> Option<Value> {
    source_fields.iter().find_map(|field| {
        let value = field_value(field, primitives, raw_observations)?;
        match value {
            Value::Bool(b) => Some(Value::Bool(b)),
            Value::String(ref s) => coerce_bool_str(s).map(Value::Bool),
            Value::Number(ref n) => n.as_f64().map(|f| Value::Bool(f != 0.0)),
            _ => None,
        }
    })
}

fn coerce_bool_str(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

fn coalesce(source_fields: &[String], primitives: &Primitives, raw_observations: &serde_json::Map<String, Value>) -> Option<Value> {
    source_fields.iter().find_map(|field| {
        let value = field_value(field, primitives, raw_observations)?;
        let non_empty = match &value {
            Value::String(s) => !s.is_empty(),
            Value::Null => false,
            _ => true,
        };
        non_empty.then_some(value)
    })
}

fn array_builder(separator: &str, source_fields: &[String], primitives: &Primitives, raw_observations: &serde_json::Map<String, Value>) -> Option<Value> {
    source_fields.iter().find_map(|field| field_text(field, primitives, raw_observations)).map(|text| {
        Value::Array(
            text.split(separator)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string()))
                .collect(),
        )
    })
}

fn string_template(template: &str, primitives: &Primitives, raw_observations: &serde_json::Map<String, Value>) -> Option<Value> {
    let mut missing = false;
    let rendered = placeholder_regex().replace_all(template, |caps: &regex::Captures| {
        match field_text(&caps[1], primitives, raw_observations) {
            Some(text) => text,
            None => {
                missing = true;
                String::new()
            }
        }
    });
    if missing {
        None
    } else {
        Some(Value::String(rendered.into_owned()))
    }
}
