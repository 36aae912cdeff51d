use thiserror::Error;

pub type MjmlResult<T> = Result<T, MjmlError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MjmlError {
    #[error("Parse error at line {line}, column {column}: {message}")]
    ParseError {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Schema violation: <{child}> is not allowed inside <{parent}>")]
    SchemaViolation { parent: String, child: String },

    #[error("Node '{id}' not found")]
    NodeNotFound { id: String },

    #[error("Cannot move node '{id}': {reason}")]
    InvalidMove { id: String, reason: String },

    #[error("Duplicate id '{id}': node ids must be unique within the document")]
    DuplicateId { id: String },

    #[error("Invalid value '{value}' for attribute '{attribute}' on <{component}>: {reason}")]
    InvalidAttribute {
        component: String,
        attribute: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Render error: {0}")]
    RenderError(String),
}

impl MjmlError {
    /// Build a parse error from a byte offset into `source`.
    pub fn parse_at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_column(source, offset);
        MjmlError::ParseError {
            line,
            column,
            message: message.into(),
        }
    }
}

impl From<serde_yaml::Error> for MjmlError {
    fn from(err: serde_yaml::Error) -> Self {
        MjmlError::ConfigError(err.to_string())
    }
}

impl From<std::fmt::Error> for MjmlError {
    fn from(err: std::fmt::Error) -> Self {
        MjmlError::RenderError(err.to_string())
    }
}

/// 1-based line and column (in chars) of a byte offset.
fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let column = match before.rfind('\n') {
        Some(nl) => before[nl + 1..].chars().count() + 1,
        None => before.chars().count() + 1,
    };
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_at_reports_line_and_column() {
        let src = "<mjml>\n  <mj-body>\n    <mj-text";
        let err = MjmlError::parse_at(src, src.len() - 8, "boom");
        assert_eq!(
            err,
            MjmlError::ParseError {
                line: 3,
                column: 5,
                message: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_parse_at_clamps_offset() {
        let err = MjmlError::parse_at("abc", 99, "eof");
        assert!(matches!(err, MjmlError::ParseError { line: 1, column: 4, .. }));
    }
}
