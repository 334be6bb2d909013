use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, DeserializeFromStr, SerializeDisplay)]
pub struct JobId(u64);

impl JobId {
    pub fn new(n: u64) -> Self {
        Self(n)
    }

    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl FromStr for JobId {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str_radix(s, 16)
            .map(Self)
            .map_err(|err| InternalError::Parse {
                message: format!("invalid job id `{s}`: {err}"),
            })
    }
}

impl Display for JobId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(n: u64) -> Self {
        Self(n)
    }
}
