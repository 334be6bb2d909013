use super::*;

const MERKLE_MASK: &str = "00000000";
const EMPTY_CHAIN_BRANCH: &str = "00";

/// Merged-mining proof that a parent chain block commits to an aux block.
#[derive(Debug, Clone, PartialEq)]
pub struct AuxPow {
    parent_coinbase: Vec<u8>,
    parent_hash: String,
    parent_merkle_branch: Vec<[u8; 32]>,
    parent_header: Vec<u8>,
}

impl AuxPow {
    pub fn new(block: &Block) -> Result<Self, PoolError> {
        let parent_hash = block
            .hash()
            .ok_or_else(|| PoolError::state("parent block sum must be computed first"))?;

        let parent_header = block
            .header()
            .ok_or_else(|| PoolError::state("parent block header must be made first"))?
            .to_vec();

        Ok(Self {
            parent_coinbase: block.coinbase().to_vec(),
            parent_hash,
            parent_merkle_branch: block.work().merkle_steps.clone(),
            parent_header,
        })
    }

    pub fn serialize(&self) -> String {
        let mut out = hex::encode(&self.parent_coinbase);
        out.push_str(&self.parent_hash);

        out.push_str(&codec::varint_hex(self.parent_merkle_branch.len() as u64));
        for step in &self.parent_merkle_branch {
            out.push_str(&hex::encode(step));
        }
        out.push_str(MERKLE_MASK);

        out.push_str(EMPTY_CHAIN_BRANCH);
        out.push_str(MERKLE_MASK);

        out.push_str(&hex::encode(&self.parent_header));
        out
    }
}
