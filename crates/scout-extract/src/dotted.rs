/// Writes `value` into `root` at a dotted path (e.g.
/// `football_pitches.five_a_side.total`), creating intermediate JSON
/// objects as needed (spec section 4.5, module field extraction).
pub fn set_dotted(root: &mut serde_json::Value, path: &str, value: serde_json::Value) {
    if !root.is_object() {
        *root = serde_json::Value::Object(serde_json::Map::new());
    }

    let mut cursor = root;
    let segments: Vec<&str> = path.split('.').collect();
    for segment in &segments[..segments.len() - 1] {
        let map = cursor.as_object_mut().expect("cursor is always kept as an object");
        let entry = map
            .entry(segment.to_string())
            .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
        if !entry.is_object() {
            *entry = serde_json::Value::Object(serde_json::Map::new());
        }
        cursor = entry;
    }

    let last = segments[segments.len() - 1];
    cursor
        .as_object_mut()
        .expect("cursor is always kept as an object")
        .insert(last.to_string(), value);
}

/// Reads a value at a dotted path, for rules that want to check whether a
/// field has already been populated by an earlier rule in the same pass.
pub fn get_dotted<'a>(root: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    let mut cursor = root;
    for segment in path.split('.') {
        cursor = cursor.as_object()?.get(segment)?;
    }
    Some(cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn writes_nested_path_creating_intermediates() {
        let mut root = json!({});
        set_dotted(&mut root, "football_pitches.five_a_side.total", json!(4));
        assert_eq!(root, json!({"football_pitches": {"five_a_side": {"total": 4}}}));
    }

    #[test]
    fn second_write_under_same_parent_preserves_sibling() {
        let mut root = json!({});
        set_dotted(&mut root, "a.b", json!(1));
        set_dotted(&mut root, "a.c", json!(2));
        assert_eq!(root, json!({"a": {"b": 1, "c": 2}}));
    }

    #[test]
    fn get_dotted_round_trips_with_set_dotted() {
        let mut root = json!({});
        set_dotted(&mut root, "a.b.c", json!("value"));
        assert_eq!(get_dotted(&root, "a.b.c"), Some(&json!("value")));
        assert_eq!(get_dotted(&root, "a.b.missing"), None);
    }
}
