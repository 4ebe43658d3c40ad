//! Admin-command placeholder substitution

use crate::generator::options::AdminAccount;
use crate::generator::shell::{escape_double, quote};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    User,
    Pass,
    Email,
}

impl Placeholder {
    pub const ALL: [Placeholder; 3] = [Placeholder::User, Placeholder::Pass, Placeholder::Email];

    pub fn token(&self) -> &'static str {
        match self {
            Placeholder::User => "__USER__",
            Placeholder::Pass => "__PASS__",
            Placeholder::Email => "__EMAIL__",
        }
    }

    fn value<'a>(&self, admin: &'a AdminAccount) -> &'a str {
        match self {
            Placeholder::User => &admin.username,
            Placeholder::Pass => &admin.password,
            Placeholder::Email => &admin.email,
        }
    }
}

/// Shell quoting context at a given point of a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteContext {
    Bare,
    Single,
    Double,
}

impl QuoteContext {
    /// Render a value so the shell reads it back unchanged in this context
    fn render(self, value: &str) -> String {
        match self {
            QuoteContext::Bare => quote(value),
            QuoteContext::Single => value.replace('\'', r"'\''"),
            QuoteContext::Double => escape_double(value),
        }
    }
}

/// Replace every placeholder occurrence in a single left-to-right pass.
/// Values are never rescanned. A token already inside quotes in the
/// template receives the value escaped for those quotes; a bare token gets
/// the value shell-quoted when needed.
pub fn substitute_admin(template: &str, admin: &AdminAccount) -> String {
    let mut out = String::with_capacity(template.len() + 32);
    let mut ctx = QuoteContext::Bare;
    let mut rest = template;

    while !rest.is_empty() {
        if let Some(p) = Placeholder::ALL.iter().find(|p| rest.starts_with(p.token())) {
            out.push_str(&ctx.render(p.value(admin)));
            rest = &rest[p.token().len()..];
            continue;
        }

        let mut chars = rest.chars();
        let Some(c) = chars.next() else { break };
        out.push(c);
        match (ctx, c) {
            (QuoteContext::Bare, '\'') => ctx = QuoteContext::Single,
            (QuoteContext::Bare, '"') => ctx = QuoteContext::Double,
            (QuoteContext::Single, '\'') | (QuoteContext::Double, '"') => ctx = QuoteContext::Bare,
            (QuoteContext::Bare | QuoteContext::Double, '\\') => {
                // Escaped character is copied as is
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            _ => {}
        }
        rest = chars.as_str();
    }
    out
}

pub fn contains_placeholder(text: &str) -> bool {
    Placeholder::ALL.iter().any(|p| text.contains(p.token()))
}

/// Tokens still present in `text`
pub fn leftover_placeholders(text: &str) -> Vec<&'static str> {
    Placeholder::ALL
        .iter()
        .filter(|p| text.contains(p.token()))
        .map(|p| p.token())
        .collect()
}
