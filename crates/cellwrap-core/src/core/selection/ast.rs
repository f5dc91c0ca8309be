//! Syntax tree of a parsed mask expression.

/// Which topology level a selector addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Residue,
    Atom,
    Molecule,
}

/// One entry of a comma-separated selector list. Numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Any,
    Index(usize),
    /// Inclusive range.
    Range(usize, usize),
    /// Name pattern; a trailing `*` matches any suffix.
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    All,
    Select { level: Level, items: Vec<Item> },
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Item {
    pub fn matches(&self, number: usize, name: &str) -> bool {
        match self {
            Item::Any => true,
            Item::Index(n) => *n == number,
            Item::Range(first, last) => (*first..=*last).contains(&number),
            Item::Name(pattern) => match pattern.strip_suffix('*') {
                Some(prefix) => name.starts_with(prefix),
                None => pattern == name,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_match_numbers_ranges_and_names() {
        assert!(Item::Any.matches(7, "X"));
        assert!(Item::Index(3).matches(3, "X"));
        assert!(!Item::Index(3).matches(4, "X"));
        assert!(Item::Range(2, 4).matches(4, "X"));
        assert!(!Item::Range(2, 4).matches(5, "X"));
        assert!(Item::Name("WAT".into()).matches(1, "WAT"));
        assert!(!Item::Name("WAT".into()).matches(1, "WA"));
        assert!(Item::Name("H*".into()).matches(1, "H12"));
        assert!(!Item::Name("H*".into()).matches(1, "CA"));
    }
}
