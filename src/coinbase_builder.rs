use super::*;

const COINBASE_VERSION: [u8; 4] = [0x01, 0x00, 0x00, 0x00];
const NULL_OUTPOINT_INDEX: [u8; 4] = [0xff; 4];
const SEQUENCE: [u8; 4] = [0x00; 4];
const LOCK_TIME: [u8; 4] = [0x00; 4];

/// Assembles the two coinbase halves a miner wraps around its extranonce. The first half ends right
/// before the extranonce, the second half starts with the length-prefixed pool signature.
#[derive(Clone, Debug)]
pub struct CoinbaseBuilder<'a> {
    template: &'a BlockTemplate,
    payout_script: Vec<u8>,
    signature: Vec<u8>,
    extranonce_size: usize,
}

impl<'a> CoinbaseBuilder<'a> {
    pub const MAX_COINBASE_SCRIPT_SIG_SIZE: usize = 100;

    pub fn new(template: &'a BlockTemplate, payout_script: Vec<u8>) -> Self {
        Self {
            template,
            payout_script,
            signature: Vec::new(),
            extranonce_size: ENONCE1_SIZE + ENONCE2_SIZE,
        }
    }

    pub fn with_signature(mut self, signature: Vec<u8>) -> Self {
        self.signature = signature;
        self
    }

    pub fn with_extranonce_size(mut self, extranonce_size: usize) -> Self {
        self.extranonce_size = extranonce_size;
        self
    }

    /// `[len(sig)] ‖ sig`
    pub fn arbitrary(&self) -> Result<Vec<u8>, PoolError> {
        let len = u8::try_from(self.signature.len()).map_err(|_| {
            PoolError::encoding(format!(
                "coinbase signature is {} bytes, at most 255 allowed",
                self.signature.len()
            ))
        })?;

        let mut arbitrary = Vec::with_capacity(self.signature.len() + 1);
        arbitrary.push(len);
        arbitrary.extend_from_slice(&self.signature);

        Ok(arbitrary)
    }

    pub fn build(self) -> Result<(Vec<u8>, Vec<u8>), PoolError> {
        let arbitrary = self.arbitrary()?;

        let coinb1 = coinbase_initial(self.template, arbitrary.len() + self.extranonce_size);

        let mut coinb2 = arbitrary;
        coinb2.extend(coinbase_final(self.template, &self.payout_script)?);

        Ok((coinb1, coinb2))
    }
}

/// Everything up to and including the BIP34 height push. `arbitrary_len` counts the bytes of the
/// script that follow the height.
pub fn coinbase_initial(template: &BlockTemplate, arbitrary_len: usize) -> Vec<u8> {
    let height = codec::trim_insignificant_bytes(&template.height.to_le_bytes());

    let script_len = arbitrary_len + height.len() + 1;

    if script_len > CoinbaseBuilder::MAX_COINBASE_SCRIPT_SIG_SIZE {
        warn!(
            "Coinbase script is {script_len} bytes, over the {} byte limit",
            CoinbaseBuilder::MAX_COINBASE_SCRIPT_SIG_SIZE
        );
    }

    let mut buf = Vec::with_capacity(4 + 1 + 32 + 4 + 9 + 1 + height.len());
    buf.extend_from_slice(&COINBASE_VERSION);
    buf.push(1);
    buf.extend_from_slice(&[0u8; 32]);
    buf.extend_from_slice(&NULL_OUTPOINT_INDEX);
    buf.extend(codec::varint(script_len as u64));
    buf.extend(codec::varint(height.len() as u64));
    buf.extend_from_slice(&height);
    buf
}

/// Input sequence, outputs and lock time.
pub fn coinbase_final(template: &BlockTemplate, pool_script: &[u8]) -> Result<Vec<u8>, PoolError> {
    let mut outputs = Vec::new();
    let mut count = 0u64;

    if let Some(commitment) = template
        .default_witness_commitment
        .as_deref()
        .filter(|commitment| !commitment.is_empty())
    {
        let commitment = codec::decode_hex(commitment)?;
        outputs.extend_from_slice(&0u64.to_le_bytes());
        outputs.extend(codec::varint(commitment.len() as u64));
        outputs.extend(commitment);
        count += 1;
    }

    outputs.extend(codec::le_bytes(template.coinbase_value, 8)?);
    outputs.extend(codec::varint(pool_script.len() as u64));
    outputs.extend_from_slice(pool_script);
    count += 1;

    let mut buf = Vec::with_capacity(outputs.len() + 17);
    buf.extend_from_slice(&SEQUENCE);
    buf.extend(codec::varint(count));
    buf.extend(outputs);
    buf.extend_from_slice(&LOCK_TIME);

    Ok(buf)
}

/// Joins the halves around an extranonce and returns the coinbase with its digest.
pub fn finalize_coinbase(
    initial: &[u8],
    extranonce: &[u8],
    r#final: &[u8],
    chain: &dyn Chain,
) -> (Vec<u8>, [u8; 32]) {
    let mut coinbase = Vec::with_capacity(initial.len() + extranonce.len() + r#final.len());
    coinbase.extend_from_slice(initial);
    coinbase.extend_from_slice(extranonce);
    coinbase.extend_from_slice(r#final);

    let digest = chain.coinbase_digest(&coinbase);

    (coinbase, digest)
}
