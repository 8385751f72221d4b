//! Template expression handling.
//!
//! Template expressions read component state through the render context, so
//! every free identifier is prefixed with `_ctx.`:
//!
//! - `count + 1` → `_ctx.count + 1`
//! - `items.filter(i => i.done)` → `_ctx.items.filter(i => i.done)`
//! - `{ active: isActive }` → `{ active: _ctx.isActive }`
//!
//! Member names, object keys, literals, allowed globals and names bound by
//! the surrounding scope (`v-for` aliases, slot props, arrow parameters,
//! `$event`) are left alone.

use crate::dev::scan::{tokenize, Token, TokenKind};
use std::ops::Range;

/// Globals reachable from template expressions without a `_ctx.` prefix.
const ALLOWED_GLOBALS: &[&str] = &[
    "Infinity",
    "undefined",
    "NaN",
    "isFinite",
    "isNaN",
    "parseFloat",
    "parseInt",
    "decodeURI",
    "decodeURIComponent",
    "encodeURI",
    "encodeURIComponent",
    "Math",
    "Number",
    "Date",
    "Array",
    "Object",
    "Boolean",
    "String",
    "RegExp",
    "Map",
    "Set",
    "JSON",
    "Intl",
    "BigInt",
    "console",
    "Error",
    "Symbol",
];

const KEYWORDS: &[&str] = &[
    "true",
    "false",
    "null",
    "this",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "await",
    "async",
    "function",
    "return",
    "if",
    "else",
    "let",
    "const",
    "var",
    "class",
    "arguments",
];

#[derive(Debug, Clone, Copy)]
struct Frame {
    open: u8,
    ternary: usize,
}

/// Prefix free identifiers in `expr` with `_ctx.`.
///
/// `scope` lists names bound around the expression. Fails on unbalanced
/// brackets or unterminated literals.
pub fn prefix_identifiers(expr: &str, scope: &[String]) -> Result<String, String> {
    let tokens = tokenize(expr);
    validate(expr, &tokens)?;

    let arrows = arrow_scopes(&tokens);
    let params: Vec<usize> = arrows.iter().flat_map(|a| a.params.iter().copied()).collect();

    let mut out = String::with_capacity(expr.len() + 16);
    let mut last = 0;
    let mut frames = vec![Frame {
        open: 0,
        ternary: 0,
    }];

    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Punct(c @ (b'(' | b'[' | b'{')) => frames.push(Frame {
                open: c,
                ternary: 0,
            }),
            TokenKind::Punct(b')' | b']' | b'}') => {
                frames.pop();
            }
            TokenKind::Punct(b'?') => {
                if let Some(frame) = frames.last_mut() {
                    frame.ternary += 1;
                }
            }
            TokenKind::Punct(b':') => {
                if let Some(frame) = frames.last_mut() {
                    frame.ternary = frame.ternary.saturating_sub(1);
                }
            }
            TokenKind::Ident => {
                let name = token.text(expr);
                let prev = i.checked_sub(1).map(|p| tokens[p].kind);
                let next = tokens.get(i + 1).map(|t| t.kind);
                let frame = frames.last().copied().unwrap_or(Frame {
                    open: 0,
                    ternary: 0,
                });
                let in_object = frame.open == b'{';

                if prev == Some(TokenKind::Dot)
                    || params.contains(&i)
                    || KEYWORDS.contains(&name)
                    || ALLOWED_GLOBALS.contains(&name)
                {
                    continue;
                }
                if in_object && frame.ternary == 0 && next == Some(TokenKind::Punct(b':')) {
                    continue;
                }

                let shorthand = in_object
                    && matches!(prev, Some(TokenKind::Punct(b'{' | b',')))
                    && matches!(next, Some(TokenKind::Punct(b',' | b'}')));
                let bound = scope.iter().any(|s| s == name)
                    || arrows.iter().any(|a| a.binds(expr, &tokens, i, name));

                if shorthand && !bound {
                    out.push_str(&expr[last..token.end]);
                    out.push_str(": _ctx.");
                    out.push_str(name);
                    last = token.end;
                } else if !bound {
                    out.push_str(&expr[last..token.start]);
                    out.push_str("_ctx.");
                    last = token.start;
                }
            }
            _ => {}
        }
    }

    out.push_str(&expr[last..]);
    Ok(out)
}

fn validate(expr: &str, tokens: &[Token]) -> Result<(), String> {
    if tokens.is_empty() {
        return Err("empty expression".to_string());
    }

    let mut stack = Vec::new();
    for token in tokens {
        match token.kind {
            TokenKind::Punct(c @ (b'(' | b'[' | b'{')) => stack.push(c),
            TokenKind::Punct(c @ (b')' | b']' | b'}')) => {
                let expected = match c {
                    b')' => b'(',
                    b']' => b'[',
                    _ => b'{',
                };
                if stack.pop() != Some(expected) {
                    return Err(format!("unbalanced `{}` in `{expr}`", c as char));
                }
            }
            TokenKind::Str { .. } if token.string_contents(expr).is_none() => {
                return Err(format!("unterminated string in `{expr}`"));
            }
            TokenKind::TemplateChunk if !token.text(expr).ends_with(&['`', '{'][..]) => {
                return Err(format!("unterminated template literal in `{expr}`"));
            }
            _ => {}
        }
    }

    match stack.last() {
        Some(&open) => Err(format!("unclosed `{}` in `{expr}`", open as char)),
        None => Ok(()),
    }
}

/// Whether tokens `i` and `i + 1` form an adjacent `=>`.
fn is_arrow(tokens: &[Token], i: usize) -> bool {
    match (tokens.get(i), tokens.get(i + 1)) {
        (Some(eq), Some(gt)) => {
            eq.kind == TokenKind::Punct(b'=') && gt.kind == TokenKind::Punct(b'>') && eq.end == gt.start
        }
        _ => false,
    }
}

/// An arrow function: its parameter name tokens and the token range of its body.
#[derive(Debug)]
struct ArrowScope {
    params: Vec<usize>,
    body: Range<usize>,
}

impl ArrowScope {
    /// Whether the identifier `name` at token `i` refers to one of this
    /// arrow's parameters.
    fn binds(&self, expr: &str, tokens: &[Token], i: usize, name: &str) -> bool {
        self.body.contains(&i) && self.params.iter().any(|&p| tokens[p].text(expr) == name)
    }
}

/// Every arrow function in `tokens`.
fn arrow_scopes(tokens: &[Token]) -> Vec<ArrowScope> {
    let mut scopes = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        if !is_arrow(tokens, i + 1) {
            continue;
        }
        let body = arrow_body(tokens, i + 3);
        match token.kind {
            TokenKind::Ident => scopes.push(ArrowScope {
                params: vec![i],
                body,
            }),
            TokenKind::Punct(b')') => {
                let mut depth = 0usize;
                let mut j = i;
                loop {
                    match tokens[j].kind {
                        TokenKind::Punct(b')' | b']' | b'}') => depth += 1,
                        TokenKind::Punct(b'(' | b'[' | b'{') => depth = depth.saturating_sub(1),
                        _ => {}
                    }
                    if depth == 0 || j == 0 {
                        break;
                    }
                    j -= 1;
                }
                scopes.push(ArrowScope {
                    params: binding_names(&tokens[j..i])
                        .into_iter()
                        .map(|k| j + k)
                        .collect(),
                    body,
                });
            }
            _ => {}
        }
    }

    scopes
}

/// Token range of an arrow body starting at `start`: up to the first `,` or
/// `;` at its own nesting level, or the bracket that closes around it.
fn arrow_body(tokens: &[Token], start: usize) -> Range<usize> {
    let mut depth = 0usize;
    for (k, token) in tokens.iter().enumerate().skip(start) {
        match token.kind {
            TokenKind::Punct(b'(' | b'[' | b'{') => depth += 1,
            TokenKind::Punct(b')' | b']' | b'}') => {
                if depth == 0 {
                    return start..k;
                }
                depth -= 1;
            }
            TokenKind::Punct(b',' | b';') if depth == 0 => return start..k,
            _ => {}
        }
    }
    start..tokens.len()
}

/// Token indices (relative to `tokens`) of names bound by a parameter pattern.
fn binding_names(tokens: &[Token]) -> Vec<usize> {
    let mut names = Vec::new();
    let mut in_default = false;
    let mut depth = 0usize;

    for (k, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Punct(b'(' | b'[' | b'{') => depth += 1,
            TokenKind::Punct(b')' | b']' | b'}') => depth = depth.saturating_sub(1),
            TokenKind::Punct(b',') => in_default = false,
            TokenKind::Punct(b'=') => in_default = true,
            TokenKind::Ident if !in_default && depth > 0 => {
                let renamed = tokens.get(k + 1).map(|t| t.kind) == Some(TokenKind::Punct(b':'));
                if !renamed {
                    names.push(k);
                }
            }
            _ => {}
        }
    }

    names
}

/// Names bound by a parameter list such as `item, index` or `{ id, name }`.
#[must_use]
pub fn pattern_names(pattern: &str) -> Vec<String> {
    let wrapped = format!("({pattern})");
    let tokens = tokenize(&wrapped);
    binding_names(&tokens)
        .into_iter()
        .map(|k| tokens[k].text(&wrapped).to_string())
        .collect()
}

/// Whether `expr` is a plain member path such as `onClick`, `handlers.save`
/// or `list[0]`, which can be passed as an event handler as-is.
#[must_use]
pub fn is_member_expression(expr: &str) -> bool {
    let tokens = tokenize(expr);
    let Some(first) = tokens.first() else {
        return false;
    };
    if first.kind != TokenKind::Ident || KEYWORDS.contains(&first.text(expr)) {
        return false;
    }

    let mut i = 1;
    while i < tokens.len() {
        match tokens[i].kind {
            TokenKind::Dot if tokens.get(i + 1).map(|t| t.kind) == Some(TokenKind::Ident) => {
                i += 2;
            }
            TokenKind::Punct(b'[') => {
                let inner = tokens.get(i + 1).map(|t| t.kind);
                let close = tokens.get(i + 2).map(|t| t.kind);
                let simple = matches!(
                    inner,
                    Some(TokenKind::Ident | TokenKind::Number | TokenKind::Str { .. })
                );
                if !simple || close != Some(TokenKind::Punct(b']')) {
                    return false;
                }
                i += 3;
            }
            _ => return false,
        }
    }
    true
}

/// Whether `expr` is a function expression: `x => ...`, `(a, b) => ...`,
/// `async () => ...` or `function () {...}`.
#[must_use]
pub fn is_function_expression(expr: &str) -> bool {
    let tokens = tokenize(expr);
    let mut start = 0;
    if tokens.first().is_some_and(|t| t.is_ident(expr, "async")) {
        start = 1;
    }
    let Some(first) = tokens.get(start) else {
        return false;
    };

    if first.is_ident(expr, "function") {
        return true;
    }
    if first.kind == TokenKind::Ident {
        return is_arrow(&tokens, start + 1);
    }
    if first.kind != TokenKind::Punct(b'(') {
        return false;
    }

    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(start) {
        match token.kind {
            TokenKind::Punct(b'(' | b'[' | b'{') => depth += 1,
            TokenKind::Punct(b')' | b']' | b'}') => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return is_arrow(&tokens, i + 1);
                }
            }
            _ => {}
        }
    }
    false
}

/// Parsed `v-for` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForExpression {
    /// Iterated source, as written.
    pub source: String,
    /// Callback parameter list, as written (`item, index`).
    pub params: String,
    /// Names the aliases bind.
    pub names: Vec<String>,
}

/// Parse `alias in source` / `alias of source`.
pub fn parse_for_expression(expr: &str) -> Result<ForExpression, String> {
    let tokens = tokenize(expr);
    let mut depth = 0usize;
    let mut split = None;

    for token in &tokens {
        match token.kind {
            TokenKind::Punct(b'(' | b'[' | b'{') => depth += 1,
            TokenKind::Punct(b')' | b']' | b'}') => depth = depth.saturating_sub(1),
            TokenKind::Ident
                if depth == 0 && (token.is_ident(expr, "in") || token.is_ident(expr, "of")) =>
            {
                split = Some(*token);
                break;
            }
            _ => {}
        }
    }

    let Some(split) = split else {
        return Err(format!("invalid v-for expression `{expr}`"));
    };
    let alias = expr[..split.start].trim();
    let source = expr[split.end..].trim();
    if alias.is_empty() || source.is_empty() {
        return Err(format!("invalid v-for expression `{expr}`"));
    }

    let params = alias
        .strip_prefix('(')
        .and_then(|a| a.strip_suffix(')'))
        .unwrap_or(alias)
        .trim()
        .to_string();
    let names = pattern_names(&params);
    if names.is_empty() {
        return Err(format!("invalid v-for alias `{alias}`"));
    }

    Ok(ForExpression {
        source: source.to_string(),
        params,
        names,
    })
}
