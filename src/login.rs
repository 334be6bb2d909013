use super::*;

/// A miner login of the form `address[-address].rig`, one address per configured chain in
/// configuration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Login {
    addresses: Vec<String>,
    rig: String,
}

impl Login {
    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    pub fn rig(&self) -> &str {
        &self.rig
    }

    /// The address list as it appears in the login, used as the miner key for shares.
    pub fn miner(&self) -> String {
        self.addresses.join("-")
    }

    /// Checks there is exactly one address per chain and that each is valid on its network.
    pub fn validate(&self, chains: &[(Arc<dyn Chain>, Network)]) -> Result<(), PoolError> {
        if self.addresses.len() != chains.len() {
            return Err(PoolError::validation(format!(
                "expected {} miner addresses, got {}",
                chains.len(),
                self.addresses.len()
            )));
        }

        for (address, (chain, network)) in self.addresses.iter().zip(chains) {
            if !chain.valid_address(address, *network) {
                return Err(PoolError::validation(format!(
                    "invalid {} {network}net miner address: {address}",
                    chain.name()
                )));
            }
        }

        Ok(())
    }
}

impl FromStr for Login {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let (addresses, rig) = s.split_once('.').unwrap_or((s, ""));

        if addresses.is_empty() {
            return Err(PoolError::validation("login has no miner address"));
        }

        let addresses = addresses
            .split('-')
            .map(str::to_owned)
            .collect::<Vec<String>>();

        if addresses.iter().any(String::is_empty) {
            return Err(PoolError::validation(format!(
                "login `{s}` has an empty miner address"
            )));
        }

        Ok(Self {
            addresses,
            rig: rig.into(),
        })
    }
}

impl Display for Login {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.miner())?;

        if !self.rig.is_empty() {
            write!(f, ".{}", self.rig)?;
        }

        Ok(())
    }
}
