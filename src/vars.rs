use std::collections::BTreeMap;
use std::fmt::Display;

use crate::error::RequestError;

/// Per-build mapping from parameter name to string form of the bound value.
#[derive(Clone, Debug, Default)]
pub struct ParameterBindings {
    values: BTreeMap<String, String>,
}

impl ParameterBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Display) {
        self.values.insert(name.into(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Replaces every `{name}` placeholder in `pattern` with the bound value.
///
/// Substitution is textual and order-independent: each placeholder is
/// resolved on its own, and substituted values are never re-expanded. The
/// engine does not URL-encode; encoding is the caller's concern.
pub(crate) fn substitute(
    pattern: &str,
    bindings: &ParameterBindings,
) -> Result<String, RequestError> {
    let mut output = String::with_capacity(pattern.len());
    let mut rest = pattern;

    while let Some(open) = rest.find('{') {
        output.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        // An unterminated brace reads as a placeholder running to the end.
        let (name, tail) = match after.find('}') {
            Some(close) => (&after[..close], &after[close + 1..]),
            None => (after, ""),
        };
        match bindings.get(name) {
            Some(value) => output.push_str(value),
            None => {
                return Err(RequestError::UnboundVariable {
                    name: name.to_owned(),
                    pattern: pattern.to_owned(),
                });
            }
        }
        rest = tail;
    }

    output.push_str(rest);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::{ParameterBindings, substitute};
    use crate::error::RequestError;

    fn bindings(pairs: &[(&str, &str)]) -> ParameterBindings {
        let mut bindings = ParameterBindings::new();
        for (name, value) in pairs {
            bindings.set(*name, value);
        }
        bindings
    }

    #[test]
    fn replaces_every_placeholder() {
        let result = substitute(
            "/foo/{id}?name={name}",
            &bindings(&[("id", "3"), ("name", "acme")]),
        )
        .expect("all variables are bound");
        assert_eq!(result, "/foo/3?name=acme");
    }

    #[test]
    fn repeated_placeholders_resolve_independently() {
        let result = substitute("/{id}/{id}", &bindings(&[("id", "7")]))
            .expect("bound variable");
        assert_eq!(result, "/7/7");
    }

    #[test]
    fn missing_binding_is_an_unbound_variable_error() {
        let error = substitute("/foo/{id}", &ParameterBindings::new())
            .expect_err("no binding for id");
        match error {
            RequestError::UnboundVariable { name, pattern } => {
                assert_eq!(name, "id");
                assert_eq!(pattern, "/foo/{id}");
            }
            other => panic!("unexpected error variant: {other}"),
        }
    }

    #[test]
    fn substituted_values_are_not_re_expanded() {
        let result = substitute("/{outer}", &bindings(&[("outer", "{inner}")]))
            .expect("outer is bound");
        assert_eq!(result, "/{inner}");
    }

    #[test]
    fn placeholder_free_input_is_a_fixed_point() {
        let first = substitute("/foo/3?name=acme", &bindings(&[("id", "3")]))
            .expect("no placeholders to resolve");
        let second = substitute(&first, &bindings(&[("id", "3")]))
            .expect("still no placeholders");
        assert_eq!(first, "/foo/3?name=acme");
        assert_eq!(first, second);
    }

    #[test]
    fn unterminated_brace_reports_the_malformed_name() {
        let error = substitute("/foo/{id", &bindings(&[("name", "x")]))
            .expect_err("unterminated placeholder cannot be bound");
        match error {
            RequestError::UnboundVariable { name, .. } => assert_eq!(name, "id"),
            other => panic!("unexpected error variant: {other}"),
        }
    }
}
