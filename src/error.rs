//! error types
//!
//! structured errors for configuration, loading, and schema/document desync.

use std::path::PathBuf;

/// library result type
pub type Result<T> = std::result::Result<T, Error>;

/// error type for loading, compiling, and emitting
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url error: {0}")]
    Url(#[from] url::ParseError),

    #[error("schema http error: {status}")]
    SchemaHttp {
        /// response status code
        status: u16,
        /// response body
        body: String,
    },

    #[error("failed to parse schema: {0}")]
    SchemaParse(String),

    #[error("failed to parse {source_name}: {message}")]
    DocumentParse {
        /// file name or label of the document
        source_name: String,
        /// parser message
        message: String,
    },

    #[error("field schema not found: {type_name}.{field}")]
    FieldNotFound {
        /// parent type the field was looked up on
        type_name: String,
        /// field name as written in the document
        field: String,
    },

    #[error("type not found in schema: {0}")]
    TypeNotFound(String),

    #[error("fragment not found: {0}")]
    FragmentNotFound(String),

    #[error("fragment spreads form a cycle through {0}")]
    FragmentCycle(String),

    #[error("unexpected {kind} in {context}")]
    UnexpectedSelection {
        /// selection kind that was found
        kind: &'static str,
        /// where it was found
        context: String,
    },

    #[error("plugin \"{plugin}\" requires extension to be \".py\": {}", .path.display())]
    OutputExtension {
        /// configured output file
        path: PathBuf,
        /// plugin bound to the output
        plugin: String,
    },
}

impl Error {
    /// true if the document references something the schema or fragment registry lacks
    pub fn is_desync(&self) -> bool {
        matches!(
            self,
            Error::FieldNotFound { .. }
                | Error::TypeNotFound(_)
                | Error::FragmentNotFound(_)
                | Error::FragmentCycle(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_desync() {
        let err = Error::FieldNotFound {
            type_name: "User".to_string(),
            field: "email".to_string(),
        };
        assert!(err.is_desync());
        assert!(Error::FragmentNotFound("UserFields".to_string()).is_desync());
        assert!(Error::TypeNotFound("Missing".to_string()).is_desync());

        assert!(!Error::Config("bad".to_string()).is_desync());
        let err = Error::UnexpectedSelection {
            kind: "inline fragment",
            context: "operation GetUser".to_string(),
        };
        assert!(!err.is_desync());
    }

    #[test]
    fn test_messages_carry_names() {
        let err = Error::FieldNotFound {
            type_name: "User".to_string(),
            field: "email".to_string(),
        };
        assert_eq!(err.to_string(), "field schema not found: User.email");

        let err = Error::OutputExtension {
            path: PathBuf::from("out/ops.ts"),
            plugin: "python-operations".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "plugin \"python-operations\" requires extension to be \".py\": out/ops.ts"
        );
    }
}
