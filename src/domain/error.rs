//! Domain error types.

/// Top-level error type for ticksim.
#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    #[error("invalid {component} configuration: {reason}")]
    Configuration { component: String, reason: String },

    #[error("numeric error: {reason}")]
    Numeric { reason: String },

    #[error("unknown strategy: {id}")]
    UnknownStrategy { id: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("tick data error: {reason}")]
    Data { reason: String },

    #[error("no ticks found for {date}")]
    NoTicks { date: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SimulatorError {
    pub fn configuration(component: &str, reason: impl Into<String>) -> Self {
        SimulatorError::Configuration {
            component: component.to_string(),
            reason: reason.into(),
        }
    }

    pub fn numeric(reason: impl Into<String>) -> Self {
        SimulatorError::Numeric {
            reason: reason.into(),
        }
    }
}

impl From<&SimulatorError> for std::process::ExitCode {
    fn from(err: &SimulatorError) -> Self {
        let code: u8 = match err {
            SimulatorError::Io(_) => 1,
            SimulatorError::Configuration { .. } | SimulatorError::ConfigParse { .. } => 2,
            SimulatorError::UnknownStrategy { .. } => 3,
            SimulatorError::Data { .. } | SimulatorError::NoTicks { .. } => 4,
            SimulatorError::Numeric { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
