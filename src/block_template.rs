use super::*;

const MERGED_MINING_HEADER: &str = "fabe6d6d";
const MERGED_MINING_TRAILER: &str = "010000000000000000002632";

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct BlockTemplate {
    #[serde(deserialize_with = "version_from_int")]
    pub version: u32,
    #[serde(rename = "previousblockhash")]
    pub previous_block_hash: String,
    pub height: u64,
    #[serde(rename = "coinbasevalue")]
    pub coinbase_value: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_witness_commitment: Option<String>,
    pub bits: String,
    pub target: Target,
    #[serde(default)]
    pub transactions: Vec<TemplateTransaction>,
    #[serde(rename = "curtime")]
    pub current_time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mweb: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct TemplateTransaction {
    pub data: String,
    pub txid: String,
    #[serde(default)]
    pub fee: u64,
}

impl BlockTemplate {
    /// Transaction ids in internal byte order, ready for the merkle engine.
    pub fn txids(&self) -> Result<Vec<[u8; 32]>, PoolError> {
        self.transactions
            .iter()
            .map(|transaction| {
                let mut txid: [u8; 32] = codec::decode_hex(&transaction.txid)?
                    .try_into()
                    .map_err(|bytes: Vec<u8>| {
                        PoolError::encoding(format!(
                            "txid `{}` is {} bytes, expected 32",
                            transaction.txid,
                            bytes.len()
                        ))
                    })?;
                txid.reverse();
                Ok(txid)
            })
            .collect()
    }

    pub fn network_difficulty(&self, chain: &dyn Chain) -> f64 {
        self.target.to_difficulty() * chain.share_multiplier()
    }
}

/// Block returned by `createauxblock` on a merge-mined chain.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct AuxBlock {
    pub hash: String,
    #[serde(rename = "chainid")]
    pub chain_id: u32,
    #[serde(rename = "previousblockhash")]
    pub previous_block_hash: String,
    #[serde(rename = "coinbasehash", default)]
    pub coinbase_hash: String,
    #[serde(rename = "coinbasevalue")]
    pub coinbase_value: u64,
    pub bits: String,
    pub height: u64,
    /// Little-endian hex.
    #[serde(rename = "target", alias = "_target")]
    pub target: String,
}

impl AuxBlock {
    pub fn target(&self) -> Result<Target, PoolError> {
        Target::from_le_hex(&self.target)
    }

    /// Coinbase commitment that binds the parent chain proof-of-work to this block.
    pub fn commitment(&self) -> Result<Vec<u8>, PoolError> {
        codec::decode_hex(&format!(
            "{MERGED_MINING_HEADER}{}{MERGED_MINING_TRAILER}",
            self.hash
        ))
    }

    pub fn network_difficulty(&self, chain: &dyn Chain) -> Result<f64, PoolError> {
        Ok(self.target()?.to_difficulty() * chain.share_multiplier())
    }
}

fn version_from_int<'de, D>(d: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let x = i64::deserialize(d)?;
    u32::try_from(x)
        .or_else(|_| i32::try_from(x).map(|x| x as u32))
        .map_err(de::Error::custom)
}
