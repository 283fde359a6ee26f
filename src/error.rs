use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid UTF-8 input: valid up to byte {valid_up_to}")]
    InvalidUtf8 { valid_up_to: usize },

    #[error("Number does not fit in 64 bits: {digits}")]
    NumberOverflow { digits: String },

    #[error("Not a number: {0:?}")]
    NotANumber(String),

    #[error("Query count mismatch: {queries} queries but {batches} candidate batches")]
    QueryCountMismatch { queries: usize, batches: usize },

    #[error("Candidate batch {batch} has {actual} rows, expected {expected}")]
    RowCountMismatch {
        batch: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Null argument: {0}")]
    NullArgument(&'static str),

    #[error("Offset out of range for the C boundary: {0}")]
    OffsetOutOfRange(usize),

    #[error("Output contains an interior NUL byte")]
    InteriorNul,
}

impl Error {
    /// Stable numeric code shared by the C boundary and the HTTP service.
    pub fn code(&self) -> i32 {
        match self {
            Error::NullArgument(_) => 1,
            Error::InvalidUtf8 { .. } => 2,
            Error::QueryCountMismatch { .. } | Error::RowCountMismatch { .. } => 3,
            Error::NumberOverflow { .. } | Error::NotANumber(_) | Error::OffsetOutOfRange(_) => 4,
            Error::InteriorNul => 5,
        }
    }

    pub fn is_shape_error(&self) -> bool {
        self.code() == 3
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error::InvalidUtf8 {
            valid_up_to: err.valid_up_to(),
        }
    }
}
