use super::*;

#[derive(Debug)]
pub struct Litecoin {
    mainnet: Regex,
    testnet: Regex,
}

impl Litecoin {
    pub fn new() -> Result<Self, PoolError> {
        Ok(Self {
            mainnet: compile("^([LM3][1-9A-HJ-NP-Za-km-z]{25,34}|ltc1[02-9ac-hj-np-z]{8,87})$")?,
            testnet: compile(
                "^([mn2Q][1-9A-HJ-NP-Za-km-z]{25,34}|tltc1[02-9ac-hj-np-z]{8,87})$",
            )?,
        })
    }
}

impl Chain for Litecoin {
    fn name(&self) -> &'static str {
        "litecoin"
    }

    fn valid_mainnet_address(&self, address: &str) -> bool {
        self.mainnet.is_match(address)
    }

    fn valid_testnet_address(&self, address: &str) -> bool {
        self.testnet.is_match(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses() {
        let chain = Litecoin::new().unwrap();

        #[track_caller]
        fn case(chain: &Litecoin, address: &str, network: Network, valid: bool) {
            assert_eq!(chain.valid_address(address, network), valid, "{address}");
        }

        case(&chain, "LVg2kJoFNg45Nbpy53h7Fe1wKyeXVRhMH9", Network::Main, true);
        case(&chain, "MGxNPPB7eBoWPUaprtX9v9CXJZoD2465zN", Network::Main, true);
        case(
            &chain,
            "ltc1qg42tkwuuxefutzxezdkdel39gfstuap288mfea",
            Network::Main,
            true,
        );
        case(
            &chain,
            "tltc1qg42tkwuuxefutzxezdkdel39gfstuap2r7qjvx",
            Network::Test,
            true,
        );
        case(&chain, "mkHS9ne12qx9pS9VojpwU5xtRd4T7X7ZUt", Network::Test, true);
        case(&chain, "LVg2kJoFNg45Nbpy53h7Fe1wKyeXVRhMH9", Network::Test, false);
        case(
            &chain,
            "ltc1qg42tkwuuxefutzxezdkdel39gfstuap288mfea",
            Network::Test,
            false,
        );
        case(&chain, "ltc1QG42", Network::Main, false);
        case(&chain, "DH5yaieqoZN36fDVciNyRueRGvGLR3mr7L", Network::Main, false);
    }
}
