use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Malformed record in {path} at line {line}: {message}")]
    RecordError {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Unsupported bio file format: {path} (expected .jsonl, .json or .csv)")]
    UnsupportedFormatError { path: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Unknown annotation target: {name}")]
    UnknownTargetError { name: String },

    #[error("Port {port} is already in use on {host}")]
    PortInUseError { host: String, port: u16 },

    #[error("Failed to start '{program}': {source}")]
    SpawnError {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Annotation server exited with status {code:?}")]
    ServerExitedError { code: Option<i32> },

    #[error("Annotation server at {url} was not ready within {seconds}s")]
    ServerNotReadyError { url: String, seconds: u64 },

    #[error("Consistency check found {count} problem(s)")]
    ConsistencyError { count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Data,
    Configuration,
    Network,
    Process,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AnnotateError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AnnotateError::IoError(_) => ErrorCategory::Io,
            AnnotateError::CsvError(_)
            | AnnotateError::SerializationError(_)
            | AnnotateError::RecordError { .. }
            | AnnotateError::UnsupportedFormatError { .. }
            | AnnotateError::ProcessingError { .. } => ErrorCategory::Data,
            AnnotateError::ConfigError { .. }
            | AnnotateError::InvalidConfigValueError { .. }
            | AnnotateError::MissingConfigError { .. }
            | AnnotateError::UnknownTargetError { .. }
            | AnnotateError::ConsistencyError { .. } => ErrorCategory::Configuration,
            AnnotateError::HttpError(_)
            | AnnotateError::PortInUseError { .. }
            | AnnotateError::ServerNotReadyError { .. } => ErrorCategory::Network,
            AnnotateError::SpawnError { .. } | AnnotateError::ServerExitedError { .. } => {
                ErrorCategory::Process
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AnnotateError::ConsistencyError { .. } => ErrorSeverity::High,
            AnnotateError::PortInUseError { .. }
            | AnnotateError::ServerNotReadyError { .. }
            | AnnotateError::HttpError(_) => ErrorSeverity::Medium,
            AnnotateError::IoError(_)
            | AnnotateError::SpawnError { .. }
            | AnnotateError::ServerExitedError { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AnnotateError::IoError(_) => "Check that the file exists and is readable/writable",
            AnnotateError::CsvError(_) => "Make sure the CSV file has a header row",
            AnnotateError::SerializationError(_) | AnnotateError::RecordError { .. } => {
                "Make sure every line of the input is a valid JSON object"
            }
            AnnotateError::UnsupportedFormatError { .. } => {
                "Convert the bio file to .jsonl, .json or .csv"
            }
            AnnotateError::ProcessingError { .. } => "Inspect the input data with --verbose",
            AnnotateError::ConfigError { .. }
            | AnnotateError::InvalidConfigValueError { .. }
            | AnnotateError::MissingConfigError { .. } => {
                "Review annotation.toml or the command line arguments"
            }
            AnnotateError::UnknownTargetError { .. } => {
                "Run `keyword-annotate list` to see the available targets"
            }
            AnnotateError::PortInUseError { .. } => {
                "Stop the process holding the port or pass a different --port"
            }
            AnnotateError::SpawnError { .. } => {
                "Install the annotation server (pip install potato-annotation) and make sure it is on PATH"
            }
            AnnotateError::ServerExitedError { .. } => "Check the server output above for details",
            AnnotateError::ServerNotReadyError { .. } | AnnotateError::HttpError(_) => {
                "Increase ready_timeout_seconds or check the server output"
            }
            AnnotateError::ConsistencyError { .. } => {
                "Fix the reported targets in annotation.toml or add the missing config files"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Io => format!("File system problem: {}", self),
            ErrorCategory::Data => format!("Input data problem: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::Process => format!("Annotation server problem: {}", self),
        }
    }

    /// 對應 CLI 的結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnnotateError>;
