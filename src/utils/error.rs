use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelError {
    #[error("Spreadsheet format not recognized; tried {}", describe_attempts(.attempted))]
    FormatNotRecognized { attempted: Vec<SchemaAttempt> },

    #[error("Required column '{column}' not found in spreadsheet")]
    MissingRequiredColumn { column: String },

    #[error("Failed to read spreadsheet '{path}': {message}")]
    SpreadsheetReadFailure { path: String, message: String },

    #[error("Failed to read document '{path}': {message}")]
    DocumentReadFailure { path: String, message: String },

    #[error("Failed to write document '{path}': {source}")]
    DocumentWriteFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("PDF error: {0}")]
    PdfError(#[from] lopdf::Error),

    #[error("Workbook error: {0}")]
    WorkbookError(#[from] calamine::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

/// Columns one schema candidate looked for during format detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaAttempt {
    pub tag: String,
    pub header_row: usize,
    pub required_columns: Vec<String>,
}

fn describe_attempts(attempted: &[SchemaAttempt]) -> String {
    attempted
        .iter()
        .map(|a| {
            format!(
                "{} (header row {}: {})",
                a.tag,
                a.header_row + 1,
                a.required_columns.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit code for a failed run.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low | ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl LabelError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LabelError::ConfigError { .. } | LabelError::InvalidConfigValueError { .. } => {
                ErrorSeverity::Medium
            }
            LabelError::FormatNotRecognized { .. }
            | LabelError::MissingRequiredColumn { .. }
            | LabelError::CsvError(_)
            | LabelError::WorkbookError(_)
            | LabelError::SpreadsheetReadFailure { .. }
            | LabelError::DocumentReadFailure { .. }
            | LabelError::PdfError(_) => ErrorSeverity::High,
            LabelError::DocumentWriteFailure { .. }
            | LabelError::IoError(_)
            | LabelError::SerializationError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            LabelError::FormatNotRecognized { .. } => {
                format!("The spreadsheet layout is not supported. {}", self)
            }
            LabelError::MissingRequiredColumn { column } => {
                format!("Column '{}' is missing, labels cannot be sorted.", column)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            LabelError::FormatNotRecognized { .. } => {
                "Export the orders again from the marketplace, or add a [[schemas]] entry to the config file"
            }
            LabelError::MissingRequiredColumn { .. } => {
                "Check that the spreadsheet is the shipping export, or set [sorting].tracking_column"
            }
            LabelError::SpreadsheetReadFailure { .. }
            | LabelError::WorkbookError(_)
            | LabelError::CsvError(_) => "Open the file in a spreadsheet program and save it again",
            LabelError::DocumentReadFailure { .. } | LabelError::PdfError(_) => {
                "Check that the file is a valid, unencrypted PDF"
            }
            LabelError::DocumentWriteFailure { .. } | LabelError::IoError(_) => {
                "Check that the output directory exists and is writable"
            }
            LabelError::ConfigError { .. } | LabelError::InvalidConfigValueError { .. } => {
                "Fix the reported value in the command line or config file"
            }
            LabelError::SerializationError(_) => "Re-run with --verbose and report the issue",
        }
    }
}

pub type Result<T> = std::result::Result<T, LabelError>;
