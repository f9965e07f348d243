use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input is not well-formed XML. Fatal for the whole render.
    #[error("Document syntax error: {0}")]
    Syntax(#[from] roxmltree::Error),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid style sheet: {message}")]
    StyleSheet { message: String },
}

/// Failure to turn a symbol reference into embeddable image data.
///
/// Never fatal: the renderer falls back to a colored shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymbolError {
    #[error("symbol asset `{0}` not found")]
    NotFound(String),

    #[error("symbol asset `{name}` is not valid UTF-8")]
    Encoding { name: String },

    #[error("symbol asset `{name}` is not a well-formed SVG document: {message}")]
    Malformed { name: String, message: String },
}
