use serde::{Deserialize, Serialize};

/// A system preamble plus a user message with `{name}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub system: String,
    pub user: String,
}

impl PromptTemplate {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    pub fn render_user(&self, vars: &[(&str, &str)]) -> String {
        render(&self.user, vars)
    }

    pub fn render_system(&self, vars: &[(&str, &str)]) -> String {
        render(&self.system, vars)
    }
}

/// Substitutes `{name}` placeholders in one pass. Unknown placeholders are
/// left as written and substituted values are never rescanned.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };

        let key = &after[..close];
        match vars.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(value),
            None => {
                out.push('{');
                out.push_str(key);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_known_keys() {
        let out = render("Task: {task}\nDraft: {artifact}", &[("task", "haiku"), ("artifact", "A")]);
        assert_eq!(out, "Task: haiku\nDraft: A");
    }

    #[test]
    fn test_render_keeps_unknown_and_literal_braces() {
        let out = render(r#"Return {"critique": null} for {task} {missing"#, &[("task", "x")]);
        assert_eq!(out, r#"Return {"critique": null} for x {missing"#);
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let out = render("{a}", &[("a", "{b}"), ("b", "nope")]);
        assert_eq!(out, "{b}");
    }
}
