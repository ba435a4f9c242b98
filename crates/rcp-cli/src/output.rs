/// Pretty-print a JSON value for terminal display, falling back to its
/// compact form if it somehow isn't serializable (it always is).
pub fn render_json(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
