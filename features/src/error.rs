use thiserror::Error;

/// Errors produced while normalizing client-supplied payloads.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("audio: empty signal")]
    EmptyAudio,

    #[error("audio: too short: need at least {min_samples} samples, got {got_samples}")]
    AudioTooShort {
        min_samples: usize,
        got_samples: usize,
    },

    #[error("audio: undecodable container: {0}")]
    UndecodableAudio(String),

    #[error("audio: sample rate mismatch: expected {expected} Hz, got {got} Hz")]
    SampleRateMismatch { expected: u32, got: u32 },

    #[error("gesture: table is not valid UTF-8")]
    BadEncoding,

    #[error("gesture: required column {0:?} is missing")]
    MissingColumn(&'static str),

    #[error("gesture: table has a header but no data rows")]
    EmptyTable,

    #[error("gesture: row {row}: cell {column:?} is not a number")]
    BadCell { row: usize, column: String },

    #[error("gesture: row {row}: expected {expected} cells, got {got}")]
    RaggedRow {
        row: usize,
        expected: usize,
        got: usize,
    },
}
