use super::*;

pub use {dogecoin::Dogecoin, litecoin::Litecoin};

mod dogecoin;
mod litecoin;

pub const SCRYPT_SHARE_MULTIPLIER: f64 = 65536.0;
pub const COINBASE_MATURITY: u64 = 102;

#[derive(Debug, Clone, Copy, PartialEq, Eq, DeserializeFromStr, SerializeDisplay)]
pub enum Network {
    Main,
    Test,
}

impl FromStr for Network {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" | "mainnet" => Ok(Self::Main),
            "test" | "testnet" | "regtest" => Ok(Self::Test),
            _ => Err(PoolError::validation(format!("unknown network `{s}`"))),
        }
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => write!(f, "main"),
            Self::Test => write!(f, "test"),
        }
    }
}

/// Everything that differs between the blockchains the pool can mine.
pub trait Chain: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn header_digest(&self, header: &[u8]) -> Result<[u8; 32], PoolError> {
        codec::scrypt_hash(header)
    }

    fn coinbase_digest(&self, coinbase: &[u8]) -> [u8; 32] {
        codec::sha256d(coinbase)
    }

    fn share_multiplier(&self) -> f64 {
        SCRYPT_SHARE_MULTIPLIER
    }

    fn minimum_confirmations(&self) -> u64 {
        COINBASE_MATURITY
    }

    fn valid_mainnet_address(&self, address: &str) -> bool;

    fn valid_testnet_address(&self, address: &str) -> bool;

    fn valid_address(&self, address: &str, network: Network) -> bool {
        match network {
            Network::Main => self.valid_mainnet_address(address),
            Network::Test => self.valid_testnet_address(address),
        }
    }
}

pub fn lookup(name: &str) -> Result<Arc<dyn Chain>, PoolError> {
    match name {
        "dogecoin" => Ok(Arc::new(Dogecoin::new()?)),
        "litecoin" => Ok(Arc::new(Litecoin::new()?)),
        _ => Err(PoolError::validation(format!("unknown blockchain `{name}`"))),
    }
}

fn compile(pattern: &str) -> Result<Regex, PoolError> {
    Regex::new(pattern)
        .map_err(|err| PoolError::validation(format!("invalid address pattern: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_chains() {
        assert_eq!(lookup("dogecoin").unwrap().name(), "dogecoin");
        assert_eq!(lookup("litecoin").unwrap().name(), "litecoin");
    }

    #[test]
    fn lookup_unknown_chain() {
        assert!(matches!(
            lookup("bitcoin"),
            Err(PoolError::Validation { .. })
        ));
    }

    #[test]
    fn scrypt_family_defaults() {
        for name in ["dogecoin", "litecoin"] {
            let chain = lookup(name).unwrap();
            assert_eq!(chain.share_multiplier(), 65536.0);
            assert_eq!(chain.minimum_confirmations(), 102);
            assert_eq!(
                hex::encode(chain.coinbase_digest(b"")),
                "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
            );
        }
    }

    #[test]
    fn network_names() {
        assert_eq!("main".parse::<Network>().unwrap(), Network::Main);
        assert_eq!("test".parse::<Network>().unwrap(), Network::Test);
        assert_eq!("regtest".parse::<Network>().unwrap(), Network::Test);
        assert!("signet".parse::<Network>().is_err());
        assert_eq!(Network::Main.to_string(), "main");
    }
}
