//! Prompt template rendering.
//!
//! Substitutes `{{key}}` placeholders with stringified context values.
//! Placeholders whose key is absent from the context are removed entirely:
//! missing context must never leak template syntax into a live
//! conversation prompt. Substitution is single-pass — a substituted value
//! is never re-scanned for placeholders.

use sitara_core::snapshot::StringMap;

/// Render a template against the stringified context.
pub fn render(template: &str, variables: &StringMap) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        match after_open.find("}}") {
            Some(end) => {
                let key = &after_open[..end];
                // Nested braces inside a token mean it isn't a placeholder
                if key.contains('{') || key.contains('}') {
                    out.push_str("{{");
                    rest = after_open;
                    continue;
                }
                if let Some(value) = variables.get(key.trim()) {
                    out.push_str(value);
                }
                // Absent key: drop the token entirely
                rest = &after_open[end + 2..];
            }
            None => {
                // Unterminated opener: keep the text literally
                out.push_str("{{");
                rest = after_open;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> StringMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_known_placeholders() {
        let context = vars(&[("name", "Mira"), ("sign", "leo")]);
        let out = render("Hello {{name}}, your sun is in {{sign}}.", &context);
        assert_eq!(out, "Hello Mira, your sun is in leo.");
    }

    #[test]
    fn removes_unresolved_placeholders() {
        let context = vars(&[("name", "Mira")]);
        let out = render("Hello {{name}}!{{missing_field}} Welcome.", &context);
        assert_eq!(out, "Hello Mira! Welcome.");
    }

    #[test]
    fn rendering_is_idempotent() {
        let context = vars(&[("focus", "career"), ("moon", "cancer")]);
        let template = "Focus: {{focus}}. Moon: {{moon}}. Unknown: {{nope}}.";
        let first = render(template, &context);
        let second = render(template, &context);
        assert_eq!(first, second);
        assert_eq!(first, "Focus: career. Moon: cancer. Unknown: .");
    }

    #[test]
    fn no_recursive_substitution() {
        let context = vars(&[("a", "{{b}}"), ("b", "resolved")]);
        let out = render("value: {{a}}", &context);
        assert_eq!(out, "value: {{b}}");
    }

    #[test]
    fn unterminated_token_kept_literally() {
        let context = vars(&[("name", "Mira")]);
        let out = render("Hello {{name", &context);
        assert_eq!(out, "Hello {{name");
    }

    #[test]
    fn empty_template_renders_empty() {
        assert_eq!(render("", &StringMap::new()), "");
    }

    #[test]
    fn text_without_placeholders_unchanged() {
        let template = "No placeholders here, just braces: { } and text.";
        assert_eq!(render(template, &StringMap::new()), template);
    }
}
