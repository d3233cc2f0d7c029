//! Tokenizer over parenthesized source forms.
//!
//! The lexer understands just enough of the language to find statement
//! boundaries reliably: balanced delimiter groups, string literals (plain and
//! `u"..."`), and `;` line comments. Everything else is an atom.
//!
//! Parsing is tolerant: a missing closer ends its group at end of input and a
//! stray closer is ignored, so a broken unit still yields the declarations
//! that precede the damage.

use std::fmt;

/// A single lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Open(char),
    Close(char),
    Atom(&'a str),
    /// String literal contents, without quotes or escapes resolved
    Str(&'a str),
}

/// A token with its 1-based source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spanned<'a> {
    pub token: Token<'a>,
    pub line: usize,
}

fn is_open(c: char) -> bool {
    matches!(c, '(' | '[' | '{')
}

fn is_close(c: char) -> bool {
    matches!(c, ')' | ']' | '}')
}

fn closer_for(open: char) -> char {
    match open {
        '[' => ']',
        '{' => '}',
        _ => ')',
    }
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ','
}

fn ends_atom(c: char) -> bool {
    is_separator(c) || is_open(c) || is_close(c) || c == '"' || c == ';'
}

/// Split source text into tokens.
pub fn tokenize(text: &str) -> Vec<Spanned<'_>> {
    let mut tokens = Vec::new();
    let bytes = text.as_bytes();
    let mut line = 1;
    let mut i = 0;

    while let Some(c) = text[i..].chars().next() {
        if c == '\n' {
            line += 1;
            i += 1;
        } else if is_separator(c) {
            i += c.len_utf8();
        } else if c == ';' {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
        } else if is_open(c) {
            tokens.push(Spanned {
                token: Token::Open(c),
                line,
            });
            i += 1;
        } else if is_close(c) {
            tokens.push(Spanned {
                token: Token::Close(c),
                line,
            });
            i += 1;
        } else if c == '"' || (c == 'u' && bytes.get(i + 1) == Some(&b'"')) {
            let start_line = line;
            let quote = if c == 'u' { i + 1 } else { i };
            let start = quote + 1;
            let mut j = start;
            while j < bytes.len() && bytes[j] != b'"' {
                if bytes[j] == b'\\' {
                    j += 1;
                }
                if j < bytes.len() && bytes[j] == b'\n' {
                    line += 1;
                }
                j += 1;
            }
            let end = j.min(bytes.len());
            tokens.push(Spanned {
                token: Token::Str(&text[start..end]),
                line: start_line,
            });
            i = (end + 1).min(bytes.len());
        } else {
            let start = i;
            let rest = &text[start..];
            let len = rest
                .char_indices()
                .find(|&(_, ch)| ends_atom(ch))
                .map(|(idx, _)| idx)
                .unwrap_or(rest.len());
            tokens.push(Spanned {
                token: Token::Atom(&rest[..len]),
                line,
            });
            i = start + len.max(c.len_utf8());
        }
    }

    tokens
}

/// A parsed source form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Form<'a> {
    List {
        open: char,
        items: Vec<Form<'a>>,
        line: usize,
    },
    Atom {
        text: &'a str,
        line: usize,
    },
    Str {
        text: &'a str,
        line: usize,
    },
}

impl<'a> Form<'a> {
    pub fn line(&self) -> usize {
        match self {
            Form::List { line, .. } | Form::Atom { line, .. } | Form::Str { line, .. } => *line,
        }
    }

    /// The atom text, if this form is an atom.
    pub fn as_atom(&self) -> Option<&'a str> {
        match self {
            Form::Atom { text, .. } => Some(text),
            _ => None,
        }
    }

    /// The items, if this form is a list.
    pub fn as_list(&self) -> Option<&[Form<'a>]> {
        match self {
            Form::List { items, .. } => Some(items),
            _ => None,
        }
    }

    /// The leading atom of a list form.
    pub fn head(&self) -> Option<&'a str> {
        self.as_list()?.first()?.as_atom()
    }
}

impl fmt::Display for Form<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Form::Atom { text, .. } => f.write_str(text),
            Form::Str { text, .. } => write!(f, "\"{}\"", text),
            Form::List { open, items, .. } => {
                write!(f, "{}", open)?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "{}", closer_for(*open))
            }
        }
    }
}

/// Parse source text into top-level forms.
pub fn parse(text: &str) -> Vec<Form<'_>> {
    // (open delimiter, line, items) for each unclosed group
    let mut stack: Vec<(char, usize, Vec<Form<'_>>)> = Vec::new();
    let mut top = Vec::new();

    fn push<'a>(stack: &mut [(char, usize, Vec<Form<'a>>)], top: &mut Vec<Form<'a>>, form: Form<'a>) {
        match stack.last_mut() {
            Some((_, _, items)) => items.push(form),
            None => top.push(form),
        }
    }

    for Spanned { token, line } in tokenize(text) {
        match token {
            Token::Open(open) => stack.push((open, line, Vec::new())),
            Token::Close(_) => {
                if let Some((open, line, items)) = stack.pop() {
                    push(&mut stack, &mut top, Form::List { open, items, line });
                }
            }
            Token::Atom(text) => push(&mut stack, &mut top, Form::Atom { text, line }),
            Token::Str(text) => push(&mut stack, &mut top, Form::Str { text, line }),
        }
    }

    while let Some((open, line, items)) = stack.pop() {
        push(&mut stack, &mut top, Form::List { open, items, line });
    }

    top
}

/// Visit every list form in appearance order (pre-order).
///
/// Uses an explicit stack so deeply nested input cannot overflow.
pub fn walk_lists<'f, 'a>(forms: &'f [Form<'a>], mut visit: impl FnMut(&'f Form<'a>)) {
    let mut stack: Vec<&'f Form<'a>> = forms.iter().rev().collect();
    while let Some(form) = stack.pop() {
        if let Form::List { items, .. } = form {
            visit(form);
            stack.extend(items.iter().rev());
        }
    }
}
