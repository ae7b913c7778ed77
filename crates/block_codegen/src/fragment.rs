// Fragments - What a generation rule returns
//
// Expression fragments carry a precedence so the consumer can decide whether
// to parenthesize. Statement fragments are complete lines.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Precedence
// ─────────────────────────────────────────────────────────────────────────────

/// Python operator binding strength, tightest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Precedence {
    /// Literals, names, parenthesized forms
    Atomic,
    /// List/dict/tuple displays
    Collection,
    /// `a.b`, `a[b]`
    Member,
    /// `f(x)`
    FunctionCall,
    /// `await x`
    Await,
    /// `**`
    Exponentiation,
    /// `-x`, `+x`, `~x`
    Unary,
    /// `* / // %`
    Multiplicative,
    /// `+ -`
    Additive,
    /// `<< >>`
    BitwiseShift,
    /// `&`
    BitwiseAnd,
    /// `^`
    BitwiseXor,
    /// `|`
    BitwiseOr,
    /// Comparisons, `in`, `is`
    Relational,
    /// `not x`
    LogicalNot,
    /// `and`
    LogicalAnd,
    /// `or`
    LogicalOr,
    /// `x if c else y`
    Conditional,
    /// `lambda`
    Lambda,
    /// No surrounding context (statement position, call arguments)
    None,
}

impl Precedence {
    /// Whether a fragment of this precedence needs parentheses when placed
    /// where `outer` binding is expected
    pub fn needs_parens(self, outer: Precedence) -> bool {
        if self == outer && matches!(self, Precedence::Atomic | Precedence::None) {
            return false;
        }
        self >= outer
    }

    /// Precedence of a Python operator token
    pub fn of_operator(operator: &str) -> Option<Precedence> {
        let precedence = match operator {
            "==" | "!=" | "<" | "<=" | ">" | ">=" | "in" | "not in" | "is" | "is not" => Precedence::Relational,
            "and" => Precedence::LogicalAnd,
            "or" => Precedence::LogicalOr,
            "not" => Precedence::LogicalNot,
            "+" | "-" => Precedence::Additive,
            "*" | "/" | "//" | "%" => Precedence::Multiplicative,
            "**" => Precedence::Exponentiation,
            "await" => Precedence::Await,
            _ => return None,
        };
        Some(precedence)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fragments
// ─────────────────────────────────────────────────────────────────────────────

/// Expression text tagged with its binding strength
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub code: String,
    pub precedence: Precedence,
}

impl Expression {
    /// The code as it must appear in a context binding at `outer`
    pub fn wrap(&self, outer: Precedence) -> String {
        if !self.code.is_empty() && self.precedence.needs_parens(outer) {
            format!("({})", self.code)
        } else {
            self.code.clone()
        }
    }
}

/// Output of one generation rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Expression(Expression),
    /// Zero or more complete lines
    Statement(String),
}

impl Fragment {
    pub fn expression(code: impl Into<String>, precedence: Precedence) -> Self {
        Fragment::Expression(Expression {
            code: code.into(),
            precedence,
        })
    }

    pub fn statement(code: impl Into<String>) -> Self {
        Fragment::Statement(code.into())
    }

    /// Text for statement position. Expressions become a line of their own
    /// (nothing when empty); statements get a trailing newline if missing.
    pub fn into_lines(self) -> String {
        let mut text = match self {
            Fragment::Expression(e) => e.code,
            Fragment::Statement(s) => s,
        };
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Python Text Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Render a Python string literal
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Strip one pair of surrounding quotes, if present
pub fn unquote(code: &str) -> &str {
    code.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| code.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(code)
}

/// Turn arbitrary text into something usable inside a Python identifier
pub fn identifier_part(text: &str) -> String {
    unquote(text.trim())
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Whether code contains an `await` expression and so must run inside an
/// `async def`
pub fn awaits(code: &str) -> bool {
    code.match_indices("await").any(|(at, keyword)| {
        let before = code[..at].chars().next_back();
        let after = code[at + keyword.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') && matches!(after, Some(' ' | '('))
    })
}

/// `def name(params):` header plus body, `async def` when the body awaits
pub fn function_definition(name: &str, params: &str, body: &str) -> String {
    let keyword = if awaits(body) { "async def" } else { "def" };
    format!("{} {}({}):\n{}", keyword, name, params, body)
}
