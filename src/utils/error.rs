use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("Usage error: {message}")]
    Usage { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Unsupported file format '.{extension}' for {path} (accepted: {accepted})")]
    UnsupportedFormat {
        path: String,
        extension: String,
        accepted: String,
    },

    #[error("Required column '{column}' not found in {path}")]
    MissingColumn { column: String, path: String },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Rendering error: {message}")]
    Render { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

impl SplitError {
    pub fn user_friendly_message(&self) -> String {
        match self {
            SplitError::Usage { message } => message.clone(),
            SplitError::FileNotFound { path } => format!("Input file '{}' does not exist", path),
            SplitError::UnsupportedFormat {
                path, extension, ..
            } => format!("Cannot read '{}': '.{}' files are not supported", path, extension),
            SplitError::MissingColumn { column, path } => {
                format!("'{}' has no '{}' column", path, column)
            }
            SplitError::Parse { path, message } => format!("Could not parse '{}': {}", path, message),
            SplitError::Io(e) => format!("File system error: {}", e),
            SplitError::Csv(e) => format!("Could not write CSV output: {}", e),
            SplitError::Render { message } => format!("Could not draw the chart: {}", message),
            SplitError::ConfigError { message } => format!("Invalid configuration: {}", message),
            SplitError::InvalidConfigValueError { field, value, reason } => {
                format!("Invalid value '{}' for {}: {}", value, field, reason)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            SplitError::Usage { .. } => {
                "Run with --help to see the expected arguments".to_string()
            }
            SplitError::FileNotFound { .. } => {
                "Check the path and the current working directory".to_string()
            }
            SplitError::UnsupportedFormat { accepted, .. } => {
                format!("Convert the file to one of: {}", accepted)
            }
            SplitError::MissingColumn { .. } => {
                "Pass --id-column / --count-column with the header used in the file".to_string()
            }
            SplitError::Parse { .. } => {
                "Make sure the file has a single header row and consistent columns".to_string()
            }
            SplitError::Io(_) | SplitError::Csv(_) => {
                "Check file permissions and free disk space".to_string()
            }
            SplitError::Render { .. } => {
                "Try an .svg output path, or check that a sans-serif font is installed".to_string()
            }
            SplitError::ConfigError { .. } | SplitError::InvalidConfigValueError { .. } => {
                "Fix the value in the TOML file or on the command line".to_string()
            }
        }
    }

    /// Every failure aborts the run with the same status.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

#[cfg(feature = "cli")]
impl From<clap::Error> for SplitError {
    fn from(e: clap::Error) -> Self {
        SplitError::Usage {
            message: e.render().to_string().trim_end().to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SplitError>;
