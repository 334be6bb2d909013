use super::*;

/// Everything needed to rebuild a header from a miner submission. Immutable once published.
#[derive(Debug)]
pub struct WorkContext {
    pub job_id: JobId,
    pub chain: Arc<dyn Chain>,
    pub template: BlockTemplate,
    pub aux_block: Option<AuxBlock>,
    pub prevhash: String,
    pub coinbase_initial: Vec<u8>,
    pub coinbase_final: Vec<u8>,
    pub merkle_steps: Vec<[u8; 32]>,
}

impl WorkContext {
    pub fn notify(&self, clean_jobs: bool) -> Result<Notify, PoolError> {
        let ntime = u32::try_from(self.template.current_time).map_err(|_| {
            PoolError::encoding(format!(
                "template time {} does not fit in 4 bytes",
                self.template.current_time
            ))
        })?;

        Ok(Notify {
            job_id: self.job_id,
            prevhash: self.prevhash.clone(),
            coinb1: hex::encode(&self.coinbase_initial),
            coinb2: hex::encode(&self.coinbase_final),
            merkle_branches: self.merkle_steps.iter().map(hex::encode).collect(),
            version: Version::from(self.template.version),
            nbits: self.template.bits.clone(),
            ntime: Ntime::from(ntime),
            clean_jobs,
        })
    }

    pub fn height(&self) -> u64 {
        self.template.height
    }

    pub fn aux_target(&self) -> Result<Option<Target>, PoolError> {
        self.aux_block.as_ref().map(AuxBlock::target).transpose()
    }
}

/// Builds a job from a fresh template. The coinbase reserves `reserved_len` extranonce bytes
/// between its two halves.
#[allow(clippy::too_many_arguments)]
pub fn generate_work(
    template: Option<BlockTemplate>,
    aux_block: Option<AuxBlock>,
    chain: Arc<dyn Chain>,
    signature: &[u8],
    payout_script: &[u8],
    reserved_len: usize,
    job_id: JobId,
) -> Result<(WorkContext, Notify), PoolError> {
    let template = template.ok_or_else(|| PoolError::state("no block template to build work from"))?;

    let prevhash = codec::reverse_hex_words(&template.previous_block_hash)?;

    let mut signature = signature.to_vec();

    if let Some(aux_block) = &aux_block {
        signature.extend(aux_block.commitment()?);
    }

    let (coinbase_initial, coinbase_final) =
        CoinbaseBuilder::new(&template, payout_script.to_vec())
            .with_signature(signature)
            .with_extranonce_size(reserved_len)
            .build()?;

    let merkle_steps = merkle::merkle_steps(&template.txids()?);

    let work = WorkContext {
        job_id,
        chain,
        template,
        aux_block,
        prevhash,
        coinbase_initial,
        coinbase_final,
        merkle_steps,
    };

    let notify = work.notify(false)?;

    Ok((work, notify))
}

/// A candidate block rebuilt from one submission.
#[derive(Debug)]
pub struct Block {
    work: Arc<WorkContext>,
    coinbase: Vec<u8>,
    header: Option<Vec<u8>>,
    hash: Option<[u8; 32]>,
}

impl Block {
    pub fn new(work: Arc<WorkContext>) -> Self {
        Self {
            work,
            coinbase: Vec::new(),
            header: None,
            hash: None,
        }
    }

    pub fn work(&self) -> &Arc<WorkContext> {
        &self.work
    }

    pub fn make_header(
        &mut self,
        extranonce: &[u8],
        nonce: Nonce,
        ntime: Ntime,
    ) -> Result<&[u8], PoolError> {
        let work = &self.work;
        let template = &work.template;

        let (coinbase, coinbase_digest) = coinbase_builder::finalize_coinbase(
            &work.coinbase_initial,
            extranonce,
            &work.coinbase_final,
            work.chain.as_ref(),
        );

        let root = merkle::fold_merkle_root(coinbase_digest, &work.merkle_steps);

        let prevhash = codec::decode_hex(&template.previous_block_hash)?;
        if prevhash.len() != 32 {
            return Err(PoolError::encoding(format!(
                "previous block hash is {} bytes, expected 32",
                prevhash.len()
            )));
        }

        let bits = codec::decode_hex(&template.bits)?;
        if bits.len() != 4 {
            return Err(PoolError::encoding(format!(
                "bits `{}` must be 4 bytes",
                template.bits
            )));
        }

        let mut header = Vec::with_capacity(80);
        header.extend(codec::le_bytes(template.version.into(), 4)?);
        header.extend(prevhash.iter().rev());
        header.extend_from_slice(&root);
        header.extend(ntime.to_be_bytes().iter().rev());
        header.extend(bits.iter().rev());
        header.extend(nonce.to_be_bytes().iter().rev());

        self.coinbase = coinbase;
        self.hash = None;

        Ok(self.header.insert(header).as_slice())
    }

    /// Proof-of-work digest in display order, as an integer comparable against targets.
    pub fn sum(&mut self) -> Result<U256, PoolError> {
        let header = self
            .header
            .as_ref()
            .ok_or_else(|| PoolError::state("header must be made before it is hashed"))?;

        let mut hash = self.work.chain.header_digest(header)?;
        hash.reverse();

        self.hash = Some(hash);

        Ok(U256::from_big_endian(&hash))
    }

    /// Hex of the last computed sum.
    pub fn hash(&self) -> Option<String> {
        self.hash.map(hex::encode)
    }

    pub fn header(&self) -> Option<&[u8]> {
        self.header.as_deref()
    }

    pub fn coinbase(&self) -> &[u8] {
        &self.coinbase
    }

    pub fn submission(&self) -> Result<String, PoolError> {
        let header = self
            .header
            .as_ref()
            .ok_or_else(|| PoolError::state("header must be made before submission"))?;

        let template = &self.work.template;

        let mut submission = hex::encode(header);
        submission.push_str(&codec::varint_hex(template.transactions.len() as u64 + 1));
        submission.push_str(&hex::encode(&self.coinbase));

        for transaction in &template.transactions {
            submission.push_str(&transaction.data);
        }

        if let Some(mweb) = template.mweb.as_deref().filter(|mweb| !mweb.is_empty()) {
            submission.push_str("01");
            submission.push_str(mweb);
        }

        Ok(submission)
    }

    /// Block hash as explorers display it.
    pub fn header_hash(&self) -> Result<String, PoolError> {
        let header = self
            .header
            .as_ref()
            .ok_or_else(|| PoolError::state("header must be made before it is hashed"))?;

        Ok(hex::encode(codec::reverse_bytes(&codec::sha256d(header))))
    }

    pub fn coinbase_hash(&self) -> Result<String, PoolError> {
        if self.header.is_none() {
            return Err(PoolError::state("coinbase is built with the header"));
        }

        Ok(hex::encode(self.work.chain.coinbase_digest(&self.coinbase)))
    }
}
