//! Placeholder substitution engine for templates

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{\{(.+?)\}\}").unwrap();
}

/// Replace `{{path}}` placeholders in `template` with values from `context`.
///
/// The path inside the braces is trimmed and split on `.`; each segment indexes
/// into an object. A placeholder whose path cannot be resolved is left in the
/// output exactly as written. Resolution of one placeholder never affects another.
pub fn render(template: &str, context: &Value) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            match resolve(context, caps[1].trim()) {
                Lookup::Map(map) => Value::Object(map.clone()).to_string(),
                Lookup::Scalar(value) => stringify(value),
                Lookup::Missing => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Result of resolving a path segment
enum Lookup<'a> {
    Map(&'a Map<String, Value>),
    Scalar(&'a Value),
    Missing,
}

impl<'a> Lookup<'a> {
    fn of(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => Lookup::Map(map),
            other => Lookup::Scalar(other),
        }
    }

    fn child(self, segment: &str) -> Self {
        match self {
            Lookup::Map(map) => map.get(segment).map(Lookup::of).unwrap_or(Lookup::Missing),
            // Scalars have no fields
            Lookup::Scalar(_) | Lookup::Missing => Lookup::Missing,
        }
    }
}

fn resolve<'a>(context: &'a Value, path: &str) -> Lookup<'a> {
    path.split('.')
        .fold(Lookup::of(context), |current, segment| current.child(segment))
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        // Numbers, booleans, null, arrays and objects use their compact JSON form
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_basic_substitution() {
        assert_eq!(render("Hello {{name}}", &json!({"name": "World"})), "Hello World");
    }

    #[test]
    fn test_missing_key_unchanged() {
        assert_eq!(render("{{missing}}", &json!({})), "{{missing}}");
    }

    #[test]
    fn test_multiple_variables() {
        let result = render("{{a}} and {{b}}", &json!({"a": "foo", "b": "bar"}));
        assert_eq!(result, "foo and bar");
    }

    #[test]
    fn test_dotted_access() {
        let result = render("{{user.name}}", &json!({"user": {"name": "Alice"}}));
        assert_eq!(result, "Alice");
    }

    #[test]
    fn test_whitespace_inside_braces_is_trimmed() {
        let result = render("Hi {{  user.name }}!", &json!({"user": {"name": "Alice"}}));
        assert_eq!(result, "Hi Alice!");
    }

    #[test]
    fn test_one_missing_does_not_affect_others() {
        let result = render(
            "{{name}} owes {{amount}} by {{due}}",
            &json!({"name": "Bob", "amount": 12.5}),
        );
        assert_eq!(result, "Bob owes 12.5 by {{due}}");
    }

    #[test]
    fn test_indexing_into_scalar_fails_closed() {
        let ctx = json!({"user": "Alice"});
        assert_eq!(render("{{user.name}}", &ctx), "{{user.name}}");
    }

    #[test]
    fn test_missing_intermediate_segment() {
        let ctx = json!({"user": {"name": "Alice"}});
        assert_eq!(render("{{account.user.name}}", &ctx), "{{account.user.name}}");
        assert_eq!(render("{{user.email}}", &ctx), "{{user.email}}");
    }

    #[test]
    fn test_non_object_context_leaves_placeholders() {
        assert_eq!(render("{{name}}", &json!(["name"])), "{{name}}");
        assert_eq!(render("{{name}}", &Value::Null), "{{name}}");
    }

    #[test]
    fn test_value_stringification() {
        let ctx = json!({
            "count": 42,
            "flag": true,
            "nothing": null,
            "items": [1, 2],
            "user": {"id": 7}
        });
        assert_eq!(render("{{count}}", &ctx), "42");
        assert_eq!(render("{{flag}}", &ctx), "true");
        assert_eq!(render("[{{nothing}}]", &ctx), "[null]");
        assert_eq!(render("{{items}}", &ctx), "[1,2]");
        assert_eq!(render("{{user}}", &ctx), r#"{"id":7}"#);
    }

    #[test]
    fn test_null_is_distinct_from_empty_string() {
        let ctx = json!({"empty": "", "nothing": null});
        assert_eq!(render("<{{empty}}>", &ctx), "<>");
        assert_eq!(render("<{{nothing}}>", &ctx), "<null>");
    }

    #[test]
    fn test_text_without_placeholders_unchanged() {
        let text = "No placeholders { here } or {{ }";
        assert_eq!(render(text, &json!({})), text);
    }

    #[test]
    fn test_deterministic() {
        let ctx = json!({"a": {"b": {"c": "deep"}}});
        let first = render("{{a.b.c}} / {{a.b.x}}", &ctx);
        let second = render("{{a.b.c}} / {{a.b.x}}", &ctx);
        assert_eq!(first, second);
        assert_eq!(first, "deep / {{a.b.x}}");
    }
}
