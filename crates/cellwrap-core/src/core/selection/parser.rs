use super::ast::{Expr, Item, Level};
use super::error::SelectionError;
use super::token::{Token, TokenKind, tokenize};

/// Parses a mask expression. An empty expression selects every atom.
///
/// Grammar, loosest binding first:
///
/// ```text
/// or      := and ('|' and)*
/// and     := not (('&' not) | selector)*   -- `:WAT@O` is an implicit '&'
/// not     := '!' not | primary
/// primary := '*' | selector | '(' or ')'
/// selector:= (':' | '@' | '^') item (',' item)*
/// item    := '*' | NUMBER ['-' NUMBER] | NAME
/// ```
pub fn parse(input: &str) -> Result<Expr, SelectionError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Ok(Expr::All);
    }
    let mut parser = Parser {
        input,
        tokens,
        pos: 0,
    };
    let expr = parser.parse_or()?;
    if let Some(token) = parser.peek() {
        return Err(parser.error_at(token.position, "unexpected trailing input"));
    }
    Ok(expr)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek().is_some_and(|t| &t.kind == kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn end_position(&self) -> usize {
        self.input.len()
    }

    fn error_at(&self, position: usize, message: impl Into<String>) -> SelectionError {
        SelectionError::new(message, self.input, position)
    }

    fn parse_or(&mut self) -> Result<Expr, SelectionError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&TokenKind::Or) {
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, SelectionError> {
        let mut lhs = self.parse_not()?;
        loop {
            let rhs = if self.eat(&TokenKind::And) {
                self.parse_not()?
            } else if self.peek().is_some_and(|t| t.kind == TokenKind::Atom) {
                self.parse_primary()?
            } else {
                break;
            };
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, SelectionError> {
        if self.eat(&TokenKind::Not) {
            Ok(Expr::Not(Box::new(self.parse_not()?)))
        } else {
            self.parse_primary()
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, SelectionError> {
        let Some(token) = self.next() else {
            return Err(self.error_at(self.end_position(), "expected a selector"));
        };
        match token.kind {
            TokenKind::All => Ok(Expr::All),
            TokenKind::Residue => self.parse_selector(Level::Residue),
            TokenKind::Atom => self.parse_selector(Level::Atom),
            TokenKind::Molecule => self.parse_selector(Level::Molecule),
            TokenKind::LParen => {
                let inner = self.parse_or()?;
                if !self.eat(&TokenKind::RParen) {
                    let position = self.peek().map_or(self.end_position(), |t| t.position);
                    return Err(self.error_at(position, "expected ')'"));
                }
                Ok(inner)
            }
            other => Err(self.error_at(
                token.position,
                format!("expected a selector, found {other:?}"),
            )),
        }
    }

    fn parse_selector(&mut self, level: Level) -> Result<Expr, SelectionError> {
        let mut items = vec![self.parse_item(level)?];
        while self.eat(&TokenKind::Comma) {
            items.push(self.parse_item(level)?);
        }
        Ok(Expr::Select { level, items })
    }

    fn parse_item(&mut self, level: Level) -> Result<Item, SelectionError> {
        let Some(token) = self.next() else {
            return Err(self.error_at(self.end_position(), "expected a number or name"));
        };
        match token.kind {
            TokenKind::All => Ok(Item::Any),
            TokenKind::Number(first) => {
                if first == 0 {
                    return Err(self.error_at(token.position, "numbering starts at 1"));
                }
                if !self.eat(&TokenKind::Dash) {
                    return Ok(Item::Index(first));
                }
                match self.next() {
                    Some(Token {
                        kind: TokenKind::Number(last),
                        position,
                    }) => {
                        if last < first {
                            return Err(self.error_at(
                                position,
                                format!("range end {last} is before range start {first}"),
                            ));
                        }
                        Ok(Item::Range(first, last))
                    }
                    Some(t) => Err(self.error_at(t.position, "expected a range end")),
                    None => Err(self.error_at(self.end_position(), "expected a range end")),
                }
            }
            TokenKind::Name(name) => {
                if level == Level::Molecule {
                    return Err(self.error_at(
                        token.position,
                        "molecules can only be selected by number",
                    ));
                }
                Ok(Item::Name(name))
            }
            other => Err(self.error_at(
                token.position,
                format!("expected a number or name, found {other:?}"),
            )),
        }
    }
}
