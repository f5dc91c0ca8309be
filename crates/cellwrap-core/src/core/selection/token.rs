use super::error::SelectionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// `*`: every atom.
    All,
    /// `:` residue selector.
    Residue,
    /// `@` atom selector.
    Atom,
    /// `^` molecule selector.
    Molecule,
    Comma,
    Dash,
    And,
    Or,
    Not,
    LParen,
    RParen,
    Number(usize),
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '\'' | '_' | '+' | '*')
}

/// Splits a mask expression into tokens.
///
/// A run of name characters made only of digits is a number; anything else is
/// a name. A lone `*` is the all-atoms token, while a trailing `*` inside a
/// name is kept as a wildcard.
pub fn tokenize(input: &str) -> Result<Vec<Token>, SelectionError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(position, c)) = chars.peek() {
        let kind = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            ':' => TokenKind::Residue,
            '@' => TokenKind::Atom,
            '^' => TokenKind::Molecule,
            ',' => TokenKind::Comma,
            '-' => TokenKind::Dash,
            '&' => TokenKind::And,
            '|' => TokenKind::Or,
            '!' => TokenKind::Not,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            c if is_name_char(c) => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if !is_name_char(c) {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                let kind = if word == "*" {
                    TokenKind::All
                } else if word.chars().all(|c| c.is_ascii_digit()) {
                    let value = word.parse().map_err(|_| {
                        SelectionError::new(format!("number '{word}' is too large"), input, position)
                    })?;
                    TokenKind::Number(value)
                } else {
                    TokenKind::Name(word)
                };
                tokens.push(Token { kind, position });
                continue;
            }
            other => {
                return Err(SelectionError::new(
                    format!("unexpected character '{other}'"),
                    input,
                    position,
                ));
            }
        };
        chars.next();
        tokens.push(Token { kind, position });
    }

    Ok(tokens)
}
