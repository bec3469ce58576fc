use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unrecognised {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("Band index {0} is outside 0..=9")]
    BandOutOfRange(i64),
}
