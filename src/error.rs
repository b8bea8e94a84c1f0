use thiserror::Error;

/// Main error type for Rusty Trends.
/// Aggregates errors from the standard library, dependencies, and internal modules.
#[derive(Error, Debug)]
pub enum RustyTrendsError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    StringEncodingError(#[from] std::str::Utf8Error),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    #[error("Invalid xlsx document: {0}")]
    XlsxError(#[from] umya_spreadsheet::XlsxError),

    #[error("Invalid configuration: {0}")]
    ConfigError(#[from] toml::de::Error),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    // Table module errors
    #[error("{0}")]
    BoundaryError(#[from] crate::tables::BoundaryError),

    // Summary module errors
    #[error("{0}")]
    SummaryError(#[from] crate::summary::SummaryError),

    /// The document could not be written back; always fatal.
    #[error("Save '{path}' failed: {message}")]
    PersistenceError { path: String, message: String },
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, RustyTrendsError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| RustyTrendsError::WithContextError(format!("{}: {}", message, e)))
    }
}
