//! Wildmat pattern matching for offer filters
//!
//! Supports `*` (any run of characters), `?` (exactly one character),
//! `[...]` character classes with ranges and `!`/`^` negation, and `\` to
//! escape the next character.

use std::fmt;

/// A compiled wildmat pattern
#[derive(Clone, PartialEq, Eq)]
pub struct Wildmat {
    pattern: String,
    tokens: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(char),
    Any,
    Star,
    Class { negated: bool, items: Vec<ClassItem> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ClassItem {
    Char(char),
    Range(char, char),
}

impl Wildmat {
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            tokens: compile(pattern),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// True if the whole of `text` matches the pattern
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        let chars: Vec<char> = text.chars().collect();
        match_tokens(&self.tokens, &chars)
    }
}

impl fmt::Debug for Wildmat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Wildmat").field(&self.pattern).finish()
    }
}

impl fmt::Display for Wildmat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

fn compile(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' => {
                // Collapse runs of stars
                if tokens.last() != Some(&Token::Star) {
                    tokens.push(Token::Star);
                }
            }
            '?' => tokens.push(Token::Any),
            '\\' => tokens.push(Token::Literal(chars.next().unwrap_or('\\'))),
            '[' => {
                let mut rest = chars.clone();
                match compile_class(&mut rest) {
                    Some(class) => {
                        tokens.push(class);
                        chars = rest;
                    }
                    // Unterminated class: treat '[' literally
                    None => tokens.push(Token::Literal('[')),
                }
            }
            other => tokens.push(Token::Literal(other)),
        }
    }

    tokens
}

fn compile_class(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<Token> {
    let negated = matches!(chars.peek(), Some('!' | '^'));
    if negated {
        chars.next();
    }

    let mut items = Vec::new();
    let mut first = true;

    loop {
        let c = chars.next()?;
        // A ']' right after the opening bracket is a literal member
        if c == ']' && !first {
            return Some(Token::Class { negated, items });
        }
        first = false;

        let c = if c == '\\' { chars.next()? } else { c };

        if chars.peek() == Some(&'-') {
            let mut lookahead = chars.clone();
            lookahead.next();
            match lookahead.peek() {
                Some(&end) if end != ']' => {
                    chars.next();
                    chars.next();
                    items.push(ClassItem::Range(c, end));
                    continue;
                }
                _ => {}
            }
        }
        items.push(ClassItem::Char(c));
    }
}

fn class_contains(items: &[ClassItem], c: char) -> bool {
    items.iter().any(|item| match *item {
        ClassItem::Char(x) => x == c,
        ClassItem::Range(lo, hi) => lo <= c && c <= hi,
    })
}

fn match_tokens(tokens: &[Token], text: &[char]) -> bool {
    // Iterative matcher with single-star backtracking
    let (mut t, mut s) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while s < text.len() {
        let step = match tokens.get(t) {
            Some(Token::Star) => {
                backtrack = Some((t, s));
                t += 1;
                continue;
            }
            Some(Token::Any) => true,
            Some(Token::Literal(c)) => *c == text[s],
            Some(Token::Class { negated, items }) => class_contains(items, text[s]) != *negated,
            None => false,
        };

        if step {
            t += 1;
            s += 1;
        } else if let Some((star_t, star_s)) = backtrack {
            t = star_t + 1;
            s = star_s + 1;
            backtrack = Some((star_t, star_s + 1));
        } else {
            return false;
        }
    }

    tokens[t..].iter().all(|tok| *tok == Token::Star)
}
