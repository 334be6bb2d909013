use super::*;

/// Walks pending found blocks forward as their coinbases mature on chain.
pub(crate) struct Unlocker {
    pool_id: String,
    store: Arc<dyn Store>,
    chains: HashMap<String, (Arc<dyn Chain>, Arc<RpcManager>)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Maturity {
    pub(crate) status: BlockStatus,
    pub(crate) progress: f64,
    pub(crate) reward: f64,
}

pub(crate) fn maturity(transaction: &WalletTransaction, minimum_confirmations: u64) -> Maturity {
    let category = transaction
        .details
        .first()
        .map(|detail| detail.category.as_str())
        .unwrap_or_default();

    match category {
        "immature" => Maturity {
            status: BlockStatus::Pending,
            progress: round3(
                transaction.confirmations.max(0) as f64 / minimum_confirmations.max(1) as f64,
            ),
            reward: transaction.amount,
        },
        "generate" => Maturity {
            status: BlockStatus::Confirmed,
            progress: 1.0,
            reward: transaction.amount,
        },
        _ => Maturity {
            status: BlockStatus::Orphaned,
            progress: 0.0,
            reward: 0.0,
        },
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

impl Unlocker {
    pub(crate) fn new(
        pool_id: impl Into<String>,
        store: Arc<dyn Store>,
        chains: impl IntoIterator<Item = (Arc<dyn Chain>, Arc<RpcManager>)>,
    ) -> Self {
        Self {
            pool_id: pool_id.into(),
            store,
            chains: chains
                .into_iter()
                .map(|(chain, manager)| (chain.name().to_string(), (chain, manager)))
                .collect(),
        }
    }

    /// Reclassifies every pending block and returns how many were written back.
    pub(crate) async fn unlock(&self) -> Result<usize> {
        let pending = self
            .store
            .pending_blocks(&self.pool_id)
            .await
            .context("failed to load pending blocks")?;

        let mut updated = 0;

        for mut block in pending {
            match self.classify(&mut block).await {
                Ok(false) => {}
                Ok(true) => {
                    self.store.update_found_block(&block).await.with_context(|| {
                        format!("failed to update {} block {}", block.chain, block.block_height)
                    })?;
                    updated += 1;
                }
                Err(err) => warn!(
                    "Could not check {} block {} ({}): {err:#}",
                    block.chain, block.block_height, block.hash
                ),
            }
        }

        Ok(updated)
    }

    async fn classify(&self, block: &mut FoundBlock) -> Result<bool> {
        let (chain, manager) = self
            .chains
            .get(&block.chain)
            .ok_or_else(|| anyhow!("no rpc nodes for {}", block.chain))?;

        let hash = block.hash.clone();

        let remote = manager
            .call_with_failover(|node| {
                let hash = hash.clone();
                async move { node.get_block(&hash).await }
            })
            .await?;

        let coinbase_txid = remote
            .tx
            .first()
            .ok_or_else(|| anyhow!("block {hash} has no transactions"))?;

        let remote_confirmation = codec::reverse_hex_pairs(coinbase_txid)?;

        let before = block.clone();

        if block.transaction_confirmation_data.is_empty() {
            block.transaction_confirmation_data = remote_confirmation;
        } else if block.transaction_confirmation_data != remote_confirmation {
            warn!(
                "Coinbase of {} block {} does not match chain: local {} remote {}",
                block.chain, block.block_height, block.transaction_confirmation_data, remote_confirmation
            );
            block.status = BlockStatus::Orphaned;
            block.reward = 0.0;
            return Ok(true);
        }

        let txid = codec::reverse_hex_pairs(&block.transaction_confirmation_data)?;

        let transaction = manager
            .call_with_failover(|node| {
                let txid = txid.clone();
                async move { node.get_transaction(&txid).await }
            })
            .await?;

        let maturity = maturity(&transaction, chain.minimum_confirmations());

        block.status = maturity.status;
        block.confirmation_progress = maturity.progress;
        block.reward = maturity.reward;

        if block.status != BlockStatus::Pending {
            info!(
                "{} block {} is {}",
                block.chain,
                block.block_height,
                block.status.as_str()
            );
        }

        Ok(*block != before)
    }

    pub(crate) fn spawn(self: Arc<Self>, period: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        debug!("Checking block confirmations");
                        match self.unlock().await {
                            Ok(0) => {}
                            Ok(count) => info!("Updated {count} found blocks"),
                            Err(err) => warn!("Unlocker: {err:#}"),
                        }
                    }
                }
            }
        })
    }
}
