use super::*;

#[derive(Debug)]
pub struct Dogecoin {
    mainnet: Regex,
    testnet: Regex,
}

impl Dogecoin {
    pub fn new() -> Result<Self, PoolError> {
        Ok(Self {
            mainnet: compile("^[DA9][1-9A-HJ-NP-Za-km-z]{25,34}$")?,
            testnet: compile("^[nm2][1-9A-HJ-NP-Za-km-z]{25,34}$")?,
        })
    }
}

impl Chain for Dogecoin {
    fn name(&self) -> &'static str {
        "dogecoin"
    }

    fn valid_mainnet_address(&self, address: &str) -> bool {
        self.mainnet.is_match(address)
    }

    fn valid_testnet_address(&self, address: &str) -> bool {
        self.testnet.is_match(address)
    }
}
