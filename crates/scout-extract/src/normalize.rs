use scout_lens::Normalizer;

/// Applies a normalizer pipeline left-to-right (spec section 4.5). Each
/// step is a pure string transform; array values are normalized
/// element-wise so `array_builder` output can still be cleaned up
/// afterwards.
pub fn apply_normalizers(value: serde_json::Value, normalizers: &[Normalizer]) -> serde_json::Value {
    normalizers.iter().fold(value, |acc, normalizer| apply_one(acc, *normalizer))
}

fn apply_one(value: serde_json::Value, normalizer: Normalizer) -> serde_json::Value {
    match value {
        serde_json::Value::String(s) => serde_json::Value::String(apply_to_string(&s, normalizer)),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(|item| apply_one(item, normalizer)).collect())
        }
        other => other,
    }
}

fn apply_to_string(s: &str, normalizer: Normalizer) -> String {
    match normalizer {
        Normalizer::Trim => s.trim().to_string(),
        Normalizer::Lowercase => s.to_lowercase(),
        Normalizer::Uppercase => s.to_uppercase(),
        Normalizer::TitleCase => title_case(s),
        Normalizer::CollapseWhitespace => s.split_whitespace().collect::<Vec<_>>().join(" "),
        Normalizer::StripNonDigits => s.chars().filter(|c| c.is_ascii_digit()).collect(),
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pipeline_applies_left_to_right() {
        let value = json!("  hello WORLD  ");
        let result = apply_normalizers(value, &[Normalizer::Trim, Normalizer::TitleCase]);
        assert_eq!(result, json!("Hello World"));
    }

    #[test]
    fn strip_non_digits_on_phone_like_string() {
        let result = apply_normalizers(json!("+44 (0)131 000 0000"), &[Normalizer::StripNonDigits]);
        assert_eq!(result, json!("441310000000"));
    }

    #[test]
    fn array_values_are_normalized_element_wise() {
        let result = apply_normalizers(json!(["Five A Side", "SEVEN A SIDE"]), &[Normalizer::Lowercase]);
        assert_eq!(result, json!(["five a side", "seven a side"]));
    }
}
