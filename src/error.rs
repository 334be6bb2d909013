use super::*;

/// Failures raised by the work engine. Application plumbing wraps these in `anyhow`.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PoolError {
    #[snafu(display("encoding error: {message}"))]
    Encoding { message: String },

    #[snafu(display("state error: {message}"))]
    State { message: String },

    #[snafu(display("protocol error: {message}"))]
    Protocol { message: String },

    #[snafu(display("rpc error calling `{method}` on {node}: {message}"))]
    Rpc {
        node: String,
        method: String,
        message: String,
    },

    #[snafu(display("no healthy {chain} nodes"))]
    NoHealthyNodes { chain: String },

    #[snafu(display("validation error: {message}"))]
    Validation { message: String },
}

impl PoolError {
    pub(crate) fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    pub(crate) fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    #[cfg(test)]
    pub(crate) fn is_rpc(&self) -> bool {
        matches!(self, Self::Rpc { .. })
    }
}
