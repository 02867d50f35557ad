/// Coarse classification of [`CdsError`] used by transport layers to choose a status code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad rule tables or settings. Fatal at startup.
    Configuration,
    /// The request cannot be evaluated as sent. Client-correctable.
    Precondition,
    /// The terminology server failed or could not be reached.
    RemoteDependency,
    /// The requested service does not exist.
    NotFound,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum CdsError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read rule file {path}: {source}", path = path.display())]
    RuleFileRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{file} does not have the expected header. Expected: '{expected}', Actual: '{actual}'")]
    RuleHeader {
        file: String,
        expected: String,
        actual: String,
    },
    #[error("{file} row {row}: {message}")]
    RuleRow {
        file: String,
        row: usize,
        message: String,
    },
    #[error("Unable to fix SNOMED CT concept id in column {column}, row {row}, the number is corrupted.")]
    CorruptIdentifier { column: usize, row: usize },

    #[error("{0}")]
    Precondition(String),
    #[error("fhir error: {0}")]
    Fhir(#[from] fhir::FhirError),

    #[error("terminology error: {0}")]
    Terminology(#[from] terminology::TerminologyError),

    #[error("unknown CDS service: {0}")]
    UnknownService(String),

    #[error("cannot add a dose in {right} to a dose in {left}")]
    UnitMismatch { left: String, right: String },
}

impl CdsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CdsError::InvalidConfig(_)
            | CdsError::RuleFileRead { .. }
            | CdsError::RuleHeader { .. }
            | CdsError::RuleRow { .. }
            | CdsError::CorruptIdentifier { .. } => ErrorKind::Configuration,
            CdsError::Precondition(_) | CdsError::Fhir(_) => ErrorKind::Precondition,
            CdsError::Terminology(_) => ErrorKind::RemoteDependency,
            CdsError::UnknownService(_) => ErrorKind::NotFound,
            CdsError::UnitMismatch { .. } => ErrorKind::Internal,
        }
    }
}

pub type CdsResult<T> = std::result::Result<T, CdsError>;
