use super::*;

/// Outcome of checking one proof-of-work against the pool and network targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ShareStatus {
    Invalid,
    Valid,
    Primary,
    Aux,
    Dual,
}

impl ShareStatus {
    pub fn is_candidate(self) -> bool {
        matches!(self, Self::Primary | Self::Aux | Self::Dual)
    }

    pub fn solves_primary(self) -> bool {
        matches!(self, Self::Primary | Self::Dual)
    }

    pub fn solves_aux(self) -> bool {
        matches!(self, Self::Aux | Self::Dual)
    }

    pub fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Self::Primary, Self::Aux) | (Self::Aux, Self::Primary) => Self::Dual,
            _ => self.max(other),
        }
    }
}

impl Display for ShareStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid => write!(f, "Invalid"),
            Self::Valid => write!(f, "Valid"),
            Self::Primary => write!(f, "Primary"),
            Self::Aux => write!(f, "Aux1"),
            Self::Dual => write!(f, "Dual"),
        }
    }
}

pub fn classify(sum: U256, primary: Target, aux: Option<Target>, pool: Target) -> ShareStatus {
    let primary = sum <= primary.as_u256();
    let aux = aux.is_some_and(|aux| sum <= aux.as_u256());

    match (primary, aux) {
        (true, true) => ShareStatus::Dual,
        (true, false) => ShareStatus::Primary,
        (false, true) => ShareStatus::Aux,
        (false, false) if sum <= pool.as_u256() => ShareStatus::Valid,
        (false, false) => ShareStatus::Invalid,
    }
}

pub fn credited_difficulty(sum: U256, multiplier: f64) -> f64 {
    Target::from(sum).to_difficulty() * multiplier
}

pub fn pool_target(pool_difficulty: f64, multiplier: f64) -> Result<Target, PoolError> {
    Target::from_difficulty(pool_difficulty / multiplier)
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Share {
    pub pool_id: String,
    pub block_height: u64,
    pub miner: String,
    pub worker: String,
    pub user_agent: String,
    pub difficulty: f64,
    pub network_difficulty: f64,
    pub ip_address: String,
    pub created: DateTime<Utc>,
}
