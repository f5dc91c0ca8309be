use thiserror::Error;

/// Error raised while tokenizing or parsing a mask expression.
///
/// The message repeats the input with a caret under the offending position.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error(
    "Invalid mask '{input}' at position {position}: {message}\n  {input}\n  {}^",
    caret_padding(.position)
)]
pub struct SelectionError {
    pub message: String,
    pub input: String,
    /// Byte offset of the offending token in `input`.
    pub position: usize,
}

impl SelectionError {
    pub fn new(message: impl Into<String>, input: &str, position: usize) -> Self {
        Self {
            message: message.into(),
            input: input.to_string(),
            position,
        }
    }
}

fn caret_padding(position: &usize) -> String {
    " ".repeat(*position)
}
