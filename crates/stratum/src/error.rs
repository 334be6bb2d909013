use super::*;

pub type Result<T, E = InternalError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum InternalError {
    #[snafu(display("invalid hex `{input}`: {source}"))]
    InvalidHex {
        input: String,
        source: hex::FromHexError,
    },

    #[snafu(display("expected {expected} hex characters, got {actual}"))]
    InvalidLength { expected: usize, actual: usize },

    #[snafu(display("{message}"))]
    Parse { message: String },
}

/// Reject codes understood by common Stratum v1 miners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StratumError {
    #[display("Other/Unknown")]
    Other,
    #[display("Stale job")]
    Stale,
    #[display("Duplicate share")]
    Duplicate,
    #[display("Low difficulty share")]
    LowDifficulty,
    #[display("Unauthorized")]
    Unauthorized,
    #[display("Not subscribed")]
    NotSubscribed,
}

impl StratumError {
    pub fn code(self) -> i32 {
        match self {
            Self::Other => 20,
            Self::Stale => 21,
            Self::Duplicate => 22,
            Self::LowDifficulty => 23,
            Self::Unauthorized => 24,
            Self::NotSubscribed => 25,
        }
    }

    pub fn with_message(self, message: impl Into<String>) -> JsonRpcError {
        JsonRpcError {
            error_code: self.code(),
            message: message.into(),
            traceback: None,
        }
    }
}

impl From<StratumError> for JsonRpcError {
    fn from(error: StratumError) -> Self {
        error.with_message(error.to_string())
    }
}

/// Wire form is the `[code, message, traceback]` triple.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcError {
    pub error_code: i32,
    pub message: String,
    pub traceback: Option<Value>,
}

impl Serialize for JsonRpcError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (self.error_code, &self.message, &self.traceback).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for JsonRpcError {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (error_code, message, traceback) =
            <(i32, String, Option<Value>)>::deserialize(deserializer)?;

        Ok(Self {
            error_code,
            message,
            traceback,
        })
    }
}

impl Display for JsonRpcError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "stratum error {}: {}", self.error_code, self.message)
    }
}
