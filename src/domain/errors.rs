use std::fmt::{Display, Formatter, Result as FmtResult};

/// Root error type. Nothing in the derivation or replay path returns it;
/// only ingest, configuration and the outer collaborators do.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    Domain(DomainError),
    Infrastructure(InfrastructureError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    Validation(ValidationError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    InvalidCandle(String),
    InvalidIndicatorConfig(String),
    InvalidChartConfig(String),
    UnknownIndicator(String),
    UnknownChartMode(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InfrastructureError {
    Network(NetworkError),
    TimeScale(TimeScaleError),
    Serialization(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NetworkError {
    HttpRequestFailed(String),
    UnexpectedStatus { status: u16, text: String },
    InvalidPayload(String),
}

/// A chart pane refused an operation, usually because it has no data yet.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeScaleError {
    RangeRejected(String),
    SubscriptionFailed(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AppError::Domain(e) => write!(f, "Domain Error: {}", e),
            AppError::Infrastructure(e) => write!(f, "Infrastructure Error: {}", e),
        }
    }
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DomainError::Validation(e) => write!(f, "Validation: {}", e),
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ValidationError::InvalidCandle(msg) => write!(f, "Invalid candle: {}", msg),
            ValidationError::InvalidIndicatorConfig(msg) => {
                write!(f, "Invalid indicator config: {}", msg)
            }
            ValidationError::InvalidChartConfig(msg) => write!(f, "Invalid chart config: {}", msg),
            ValidationError::UnknownIndicator(name) => write!(f, "Unknown indicator: {}", name),
            ValidationError::UnknownChartMode(name) => write!(f, "Unknown chart mode: {}", name),
        }
    }
}

impl Display for InfrastructureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            InfrastructureError::Network(e) => write!(f, "Network: {}", e),
            InfrastructureError::TimeScale(e) => write!(f, "Time scale: {}", e),
            InfrastructureError::Serialization(msg) => write!(f, "Serialization: {}", msg),
        }
    }
}

impl Display for NetworkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            NetworkError::HttpRequestFailed(msg) => write!(f, "request failed: {}", msg),
            NetworkError::UnexpectedStatus { status, text } => {
                write!(f, "HTTP error: {} - {}", status, text)
            }
            NetworkError::InvalidPayload(msg) => write!(f, "invalid payload: {}", msg),
        }
    }
}

impl Display for TimeScaleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TimeScaleError::RangeRejected(msg) => write!(f, "range rejected: {}", msg),
            TimeScaleError::SubscriptionFailed(msg) => write!(f, "subscription failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for ValidationError {}
impl std::error::Error for InfrastructureError {}

impl From<DomainError> for AppError {
    fn from(error: DomainError) -> Self {
        AppError::Domain(error)
    }
}

impl From<ValidationError> for AppError {
    fn from(error: ValidationError) -> Self {
        AppError::Domain(DomainError::Validation(error))
    }
}

impl From<InfrastructureError> for AppError {
    fn from(error: InfrastructureError) -> Self {
        AppError::Infrastructure(error)
    }
}

impl From<NetworkError> for AppError {
    fn from(error: NetworkError) -> Self {
        AppError::Infrastructure(InfrastructureError::Network(error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::Infrastructure(InfrastructureError::Serialization(error.to_string()))
    }
}

pub type AppResult<T> = Result<T, AppError>;
