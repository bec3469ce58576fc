use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Symbol '{0}' has no risk observation yet; run a daily update first.")]
    NoObservation(String),
}
