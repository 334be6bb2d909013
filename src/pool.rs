use {
    super::*,
    crate::{
        sessions::Sessions,
        stratifier::{Connection, bouncer::Bouncer, state::Session},
    },
};

/// One configured blockchain: its failover manager and the script paying its reward address.
#[derive(Debug)]
pub(crate) struct ChainNode {
    pub(crate) chain: Arc<dyn Chain>,
    pub(crate) network: Network,
    pub(crate) manager: Arc<RpcManager>,
    pub(crate) reward_address: String,
    pub(crate) payout_script: Vec<u8>,
    pub(crate) block_notify_url: Option<String>,
}

impl ChainNode {
    pub(crate) async fn connect(
        config: &ChainConfig,
        primary_check_interval: Duration,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let chain = chain::lookup(&config.name)?;

        let nodes = config
            .nodes
            .iter()
            .map(|node| -> Result<Arc<dyn Rpc>> {
                let url = node
                    .url
                    .parse::<Url>()
                    .with_context(|| format!("invalid rpc url `{}`", node.url))?;

                Ok(Arc::new(RpcClient::new(
                    url,
                    node.username.clone(),
                    node.password.clone(),
                    node.timeout(),
                )?))
            })
            .collect::<Result<Vec<Arc<dyn Rpc>>>>()?;

        let manager = RpcManager::new(chain.name(), nodes, primary_check_interval, cancel)?;

        Self::from_manager(
            chain,
            manager,
            config.reward_address.clone(),
            config.block_notify_url.clone(),
        )
        .await
    }

    pub(crate) async fn from_manager(
        chain: Arc<dyn Chain>,
        manager: Arc<RpcManager>,
        reward_address: String,
        block_notify_url: Option<String>,
    ) -> Result<Self> {
        manager.check_and_recover().await?;

        let info = manager
            .call_with_failover(|node| async move { node.get_blockchain_info().await })
            .await?;

        let network = info.chain.parse::<Network>()?;

        ensure!(
            chain.valid_address(&reward_address, network),
            "invalid {} {network}net reward address `{reward_address}`",
            chain.name()
        );

        let address = reward_address.as_str();

        let address_info = manager
            .call_with_failover(|node| async move { node.validate_address(address).await })
            .await?;

        let payout_script = codec::decode_hex(&address_info.script_pub_key)?;

        info!(
            "Connected to {} {network}net at height {} with difficulty {}",
            chain.name(),
            info.blocks,
            info.difficulty
        );

        Ok(Self {
            chain,
            network,
            manager,
            reward_address,
            payout_script,
            block_notify_url,
        })
    }
}

/// Fetches the primary template and, when an aux chain is configured, an aux block. An aux chain
/// that cannot produce a block leaves the primary mining alone.
pub(crate) async fn fetch_templates(
    chains: &[ChainNode],
) -> Result<(BlockTemplate, Option<AuxBlock>)> {
    let primary = chains
        .first()
        .ok_or_else(|| anyhow!("no primary chain configured"))?;

    let template = primary
        .manager
        .call_with_failover(|node| async move { node.get_block_template().await })
        .await
        .with_context(|| format!("failed to fetch {} block template", primary.chain.name()))?;

    let aux_block = match chains.get(1) {
        Some(aux) => {
            let address = aux.reward_address.as_str();

            match aux
                .manager
                .call_with_failover(|node| async move { node.create_aux_block(address).await })
                .await
            {
                Ok(aux_block) => Some(aux_block),
                Err(err) => {
                    warn!(
                        "No {} aux block, mining {} alone: {err}",
                        aux.chain.name(),
                        primary.chain.name()
                    );
                    None
                }
            }
        }
        None => None,
    };

    Ok((template, aux_block))
}

pub(crate) fn build_work(
    chains: &[ChainNode],
    signature: &[u8],
    template: BlockTemplate,
    aux_block: Option<AuxBlock>,
    job_id: JobId,
) -> Result<(WorkContext, Notify)> {
    let primary = chains
        .first()
        .ok_or_else(|| anyhow!("no primary chain configured"))?;

    Ok(work::generate_work(
        Some(template),
        aux_block,
        primary.chain.clone(),
        signature,
        &primary.payout_script,
        ENONCE1_SIZE + ENONCE2_SIZE,
        job_id,
    )?)
}

pub(crate) struct Pool {
    pub(crate) settings: Settings,
    pub(crate) chains: Vec<ChainNode>,
    pub(crate) store: Arc<dyn Store>,
    pub(crate) work: WorkCache,
    pub(crate) sessions: Sessions,
    pub(crate) extranonces: Extranonces,
    pub(crate) bouncer: Bouncer,
    pub(crate) shares: Arc<ShareBuffer>,
    pub(crate) pool_target: Target,
    pub(crate) login_chains: Vec<(Arc<dyn Chain>, Network)>,
    pub(crate) connections: AtomicUsize,
    pub(crate) cancel: CancellationToken,
}

impl Pool {
    pub(crate) fn new(
        settings: Settings,
        chains: Vec<ChainNode>,
        store: Arc<dyn Store>,
        cancel: CancellationToken,
    ) -> Result<Arc<Self>> {
        let primary = chains
            .first()
            .ok_or_else(|| anyhow!("no primary chain configured"))?;

        let pool_target =
            share::pool_target(settings.pool_difficulty(), primary.chain.share_multiplier())?;

        let login_chains = chains
            .iter()
            .map(|node| (node.chain.clone(), node.network))
            .collect();

        Ok(Arc::new(Self {
            extranonces: Extranonces::new(ENONCE1_SIZE, ENONCE2_SIZE)?,
            bouncer: Bouncer::new(settings.malformed_limit()),
            settings,
            chains,
            store,
            work: WorkCache::new(),
            sessions: Sessions::default(),
            shares: Arc::new(ShareBuffer::default()),
            pool_target,
            login_chains,
            connections: AtomicUsize::new(0),
            cancel,
        }))
    }

    pub(crate) async fn connect(settings: Settings, cancel: CancellationToken) -> Result<Arc<Self>> {
        let mut chains = Vec::new();

        for config in settings.chains() {
            chains.push(
                ChainNode::connect(config, settings.primary_check_interval(), cancel.clone())
                    .await
                    .with_context(|| format!("failed to connect to {}", config.name))?,
            );
        }

        let store = store::open(&settings).await?;

        Self::new(settings, chains, store, cancel)
    }

    fn aux(&self) -> Option<&ChainNode> {
        self.chains.get(1)
    }

    /// Rebuilds work from fresh templates, publishes it and pushes it to every session.
    pub(crate) async fn refresh_work(&self, clean: bool) -> Result<Arc<WorkContext>> {
        let (template, aux_block) = fetch_templates(&self.chains).await?;

        let (work, notify) = build_work(
            &self.chains,
            self.settings.block_signature(),
            template,
            aux_block,
            self.work.next_job_id(),
        )?;

        let work = Arc::new(work);

        let clean = self.work.publish(work.clone(), clean);

        let delivered = self.sessions.broadcast(&Message::notification(
            NOTIFY,
            notify.with_clean_jobs(clean),
        ));

        info!(
            "Job {} at height {}{} sent to {delivered} sessions",
            work.job_id,
            work.height(),
            if clean { " (clean)" } else { "" }
        );

        Ok(work)
    }

    pub(crate) fn record_share(&self, session: &Session, ip: IpAddr, work: &WorkContext, sum: U256) {
        let multiplier = work.chain.share_multiplier();

        self.shares.push(Share {
            pool_id: self.settings.pool_name().into(),
            block_height: work.height(),
            miner: session.login.miner(),
            worker: session.login.rig().into(),
            user_agent: session.user_agent.clone(),
            difficulty: share::credited_difficulty(sum, multiplier),
            network_difficulty: work.template.network_difficulty(work.chain.as_ref()),
            ip_address: ip.to_string(),
            created: Utc::now(),
        });
    }

    /// Submits a winning block to every chain it solves and records what was accepted.
    /// Returns the status of the submissions that succeeded.
    pub(crate) async fn submit_candidate(
        &self,
        block: &Block,
        status: ShareStatus,
        session: &Session,
    ) -> ShareStatus {
        let mut accepted = ShareStatus::Valid;

        if status.solves_aux() {
            match self.submit_aux(block, status, session).await {
                Ok(found) => {
                    info!(
                        "Found {} block {} at height {} for {}",
                        found.chain, found.hash, found.block_height, found.miner
                    );
                    self.record_found_block(found).await;
                    accepted = accepted.combine(ShareStatus::Aux);
                }
                Err(err) => error!("Aux block submission failed: {err:#}"),
            }
        }

        if status.solves_primary() {
            match self.submit_primary(block, status, session).await {
                Ok(found) => {
                    info!(
                        "Found {} block {} at height {} for {}",
                        found.chain, found.hash, found.block_height, found.miner
                    );
                    self.record_found_block(found).await;
                    accepted = accepted.combine(ShareStatus::Primary);
                }
                Err(err) => error!("Primary block submission failed: {err:#}"),
            }
        }

        accepted
    }

    async fn submit_aux(
        &self,
        block: &Block,
        status: ShareStatus,
        session: &Session,
    ) -> Result<FoundBlock> {
        let aux = self
            .aux()
            .ok_or_else(|| anyhow!("no aux chain configured"))?;

        let aux_block = block
            .work()
            .aux_block
            .as_ref()
            .ok_or_else(|| anyhow!("job {} carries no aux block", block.work().job_id))?;

        let auxpow = AuxPow::new(block)?.serialize();

        let (hash, auxpow) = (aux_block.hash.as_str(), auxpow.as_str());

        aux.manager
            .call_with_failover(|node| async move { node.submit_aux_block(hash, auxpow).await })
            .await?;

        Ok(FoundBlock {
            id: 0,
            pool_id: self.settings.pool_name().into(),
            chain: aux.chain.name().into(),
            block_height: aux_block.height,
            network_difficulty: aux_block.network_difficulty(aux.chain.as_ref())?,
            status: BlockStatus::Pending,
            kind: status.to_string(),
            confirmation_progress: 0.0,
            effort: 0.0,
            transaction_confirmation_data: codec::reverse_hex_pairs(&aux_block.coinbase_hash)?,
            miner: session.login.miner(),
            reward: 0.0,
            hash: aux_block.hash.clone(),
            created: Utc::now(),
        })
    }

    async fn submit_primary(
        &self,
        block: &Block,
        status: ShareStatus,
        session: &Session,
    ) -> Result<FoundBlock> {
        let primary = &self.chains[0];
        let work = block.work();

        let submission = block.submission()?;
        let submission = submission.as_str();

        primary
            .manager
            .call_with_failover(|node| async move { node.submit_block(submission).await })
            .await?;

        Ok(FoundBlock {
            id: 0,
            pool_id: self.settings.pool_name().into(),
            chain: primary.chain.name().into(),
            block_height: work.height(),
            network_difficulty: work.template.network_difficulty(primary.chain.as_ref()),
            status: BlockStatus::Pending,
            kind: status.to_string(),
            confirmation_progress: 0.0,
            effort: 0.0,
            transaction_confirmation_data: block.coinbase_hash()?,
            miner: session.login.miner(),
            reward: 0.0,
            hash: block.header_hash()?,
            created: Utc::now(),
        })
    }

    async fn record_found_block(&self, found: FoundBlock) {
        if let Err(err) = self.store.insert_found_block(&found).await {
            error!(
                "Failed to record {} block {}: {err:#}",
                found.chain, found.block_height
            );
        }
    }

    pub(crate) async fn run(self: Arc<Self>, listener: TcpListener) -> Result {
        self.refresh_work(true)
            .await
            .context("failed to build initial work")?;

        let (notifications, receiver) = mpsc::channel(64);

        for node in &self.chains {
            if let Some(endpoint) = &node.block_notify_url {
                zmq::spawn_subscriber(
                    node.chain.name(),
                    endpoint.clone(),
                    notifications.clone(),
                    self.cancel.clone(),
                );
            }
        }

        drop(notifications);

        let generator = generator::spawn_generator(
            self.clone(),
            receiver,
            self.settings.update_interval(),
            self.cancel.clone(),
        );

        let flusher = self.shares.clone().spawn_flusher(
            self.store.clone(),
            self.settings.share_flush_interval(),
            self.cancel.clone(),
        );

        let unlocker = Arc::new(Unlocker::new(
            self.settings.pool_name(),
            self.store.clone(),
            self.chains
                .iter()
                .map(|node| (node.chain.clone(), node.manager.clone())),
        ))
        .spawn(self.settings.unlock_interval(), self.cancel.clone());

        info!("Listening for miners on {}", listener.local_addr()?);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => self.clone().spawn_connection(stream, peer),
                        Err(err) => warn!("Failed to accept connection: {err}"),
                    }
                }
            }
        }

        info!("Shutting down");

        for task in [generator, flusher, unlocker] {
            task.await?;
        }

        Ok(())
    }

    fn spawn_connection(self: Arc<Self>, stream: TcpStream, peer: SocketAddr) {
        let limit = self.settings.max_connections();

        if self.connections.fetch_add(1, Ordering::SeqCst) >= limit {
            self.connections.fetch_sub(1, Ordering::SeqCst);
            warn!("Connection limit of {limit} reached, dropping {peer}");
            return;
        }

        debug!("Accepted connection from {peer}");

        tokio::spawn(async move {
            let (reader, writer) = stream.into_split();

            let mut connection = Connection::new(self.clone(), peer, reader, writer);

            if let Err(err) = connection.serve().await {
                debug!("Connection with {peer} ended: {err:#}");
            }

            self.connections.fetch_sub(1, Ordering::SeqCst);
        });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use {
        super::*, crate::store::tests::MemoryStore, pretty_assertions::assert_eq,
        std::net::Ipv4Addr,
    };

    pub(crate) const DOGE_ADDRESS: &str = "DH5yaieqoZN36fDVciNyRueRGvGLR3mr7L";
    const LTC_ADDRESS: &str = "LVg2kJoFNg45Nbpy53h7Fe1wKyeXVRhMH9";

    /// Daemon answering the calls the pool makes, recording submissions.
    #[derive(Debug)]
    pub(crate) struct Daemon {
        pub(crate) template: Mutex<BlockTemplate>,
        pub(crate) aux_block: Option<AuxBlock>,
        pub(crate) submitted: Mutex<Vec<(String, Value)>>,
        /// Number of upcoming `submitauxblock` calls to answer with `false`.
        pub(crate) aux_rejections: AtomicUsize,
    }

    impl Daemon {
        pub(crate) fn new(template: BlockTemplate) -> Arc<Self> {
            Arc::new(Self {
                template: Mutex::new(template),
                aux_block: None,
                submitted: Mutex::new(Vec::new()),
                aux_rejections: AtomicUsize::new(0),
            })
        }

        pub(crate) fn with_aux_block(template: BlockTemplate, aux_block: AuxBlock) -> Arc<Self> {
            Arc::new(Self {
                template: Mutex::new(template),
                aux_block: Some(aux_block),
                submitted: Mutex::new(Vec::new()),
                aux_rejections: AtomicUsize::new(0),
            })
        }

        pub(crate) fn submissions(&self, method: &str) -> usize {
            self.submitted
                .lock()
                .iter()
                .filter(|(submitted, _)| submitted == method)
                .count()
        }
    }

    #[async_trait]
    impl Rpc for Daemon {
        fn url(&self) -> &str {
            "http://daemon"
        }

        fn sickness(&self) -> u64 {
            0
        }

        async fn call(&self, method: &str, params: Value) -> Result<Value, PoolError> {
            let unsupported = || PoolError::Rpc {
                node: "http://daemon".into(),
                method: method.into(),
                message: "unsupported".into(),
            };

            match method {
                "getconnectioncount" => Ok(json!(8)),
                "getblockchaininfo" => Ok(json!({ "chain": "main", "difficulty": 1.0, "blocks": 1 })),
                "validateaddress" => Ok(json!({
                    "isvalid": true,
                    "scriptPubKey": work::tests::POOL_SCRIPT,
                })),
                "getblocktemplate" => {
                    serde_json::to_value(&*self.template.lock()).map_err(|_| unsupported())
                }
                "createauxblock" => match &self.aux_block {
                    Some(aux_block) => serde_json::to_value(aux_block).map_err(|_| unsupported()),
                    None => Err(unsupported()),
                },
                "submitblock" => {
                    self.submitted.lock().push((method.into(), params));
                    Ok(Value::Null)
                }
                "submitauxblock" => {
                    self.submitted.lock().push((method.into(), params));

                    let rejected = self
                        .aux_rejections
                        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                        .is_ok();

                    Ok(json!(!rejected))
                }
                _ => Err(unsupported()),
            }
        }
    }

    pub(crate) async fn chain_node(name: &str, daemon: Arc<Daemon>, reward_address: &str) -> ChainNode {
        let manager = RpcManager::new(
            name,
            vec![daemon as Arc<dyn Rpc>],
            Duration::from_secs(60),
            CancellationToken::new(),
        )
        .unwrap();

        ChainNode::from_manager(
            chain::lookup(name).unwrap(),
            manager,
            reward_address.into(),
            None,
        )
        .await
        .unwrap()
    }

    pub(crate) fn settings() -> Settings {
        Settings {
            pool_name: Some("doge".into()),
            block_signature: Some("/scryptpool/".into()),
            pool_difficulty: Some(1e-6),
            ..Default::default()
        }
    }

    pub(crate) async fn pool(daemon: Arc<Daemon>) -> (Arc<Pool>, Arc<MemoryStore>) {
        pool_with(daemon, settings()).await
    }

    pub(crate) async fn pool_with(
        daemon: Arc<Daemon>,
        settings: Settings,
    ) -> (Arc<Pool>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());

        let pool = Pool::new(
            settings,
            vec![chain_node("dogecoin", daemon, DOGE_ADDRESS).await],
            store.clone(),
            CancellationToken::new(),
        )
        .unwrap();

        (pool, store)
    }

    pub(crate) fn session() -> Session {
        Session {
            session_id: Uuid::new_v4(),
            enonce1: Extranonce::from(vec![0xde, 0xad, 0xbe, 0xef]),
            user_agent: "cpuminer/2.5.1".into(),
            login: format!("{DOGE_ADDRESS}.rig1").parse().unwrap(),
        }
    }

    fn aux_block() -> AuxBlock {
        let target = Target::from_bits("207fffff").unwrap();

        AuxBlock {
            hash: "11".repeat(32),
            chain_id: 98,
            previous_block_hash: "22".repeat(32),
            coinbase_hash: "33".repeat(32),
            coinbase_value: 1_000_000_000_000,
            bits: "207fffff".into(),
            height: 5_000_000,
            target: hex::encode(codec::reverse_bytes(&target.to_be_bytes())),
        }
    }

    /// Litecoin primary merge-mining a dogecoin aux chain served by `aux`.
    async fn merged_pool(aux: Arc<Daemon>) -> (Arc<Pool>, Arc<Daemon>, Arc<MemoryStore>) {
        let primary = Daemon::new(easy_template());
        let store = Arc::new(MemoryStore::default());

        let pool = Pool::new(
            settings(),
            vec![
                chain_node("litecoin", primary.clone(), LTC_ADDRESS).await,
                chain_node("dogecoin", aux, DOGE_ADDRESS).await,
            ],
            store.clone(),
            CancellationToken::new(),
        )
        .unwrap();

        (pool, primary, store)
    }

    fn merged_session() -> Session {
        Session {
            login: format!("{LTC_ADDRESS}-{DOGE_ADDRESS}.rig1").parse().unwrap(),
            ..session()
        }
    }

    fn easy_template() -> BlockTemplate {
        BlockTemplate {
            bits: "207fffff".into(),
            target: Target::from_bits("207fffff").unwrap(),
            ..work::tests::template()
        }
    }

    /// Rolls nonces until the header meets `target`.
    fn solve(work: Arc<WorkContext>, target: Target) -> Block {
        for nonce in 0..64 {
            let mut block = Block::new(work.clone());
            block
                .make_header(&[0xde, 0xad, 0xbe, 0xef, 0, 0, 0, 0], Nonce::from(nonce), Ntime::from(1_700_000_000))
                .unwrap();

            if block.sum().unwrap() <= target.as_u256() {
                return block;
            }
        }

        panic!("no nonce meets {target}");
    }

    #[tokio::test]
    async fn chain_node_reads_network_and_payout_script() {
        let node = chain_node("dogecoin", Daemon::new(easy_template()), DOGE_ADDRESS).await;

        assert_eq!(node.network, Network::Main);
        assert_eq!(hex::encode(&node.payout_script), work::tests::POOL_SCRIPT);
    }

    #[tokio::test]
    async fn chain_node_rejects_reward_address_for_other_network() {
        let manager = RpcManager::new(
            "dogecoin",
            vec![Daemon::new(easy_template()) as Arc<dyn Rpc>],
            Duration::from_secs(60),
            CancellationToken::new(),
        )
        .unwrap();

        assert!(
            ChainNode::from_manager(
                chain::lookup("dogecoin").unwrap(),
                manager,
                "nZ8bVhcQGkfhTxhGLGECX7NX4yJpT5wz7E".into(),
                None,
            )
            .await
            .is_err()
        );
    }

    #[tokio::test]
    async fn refresh_publishes_and_cleans_on_new_height() {
        let daemon = Daemon::new(easy_template());
        let (pool, _) = pool(daemon.clone()).await;

        let first = pool.refresh_work(false).await.unwrap();
        assert_eq!(pool.work.current().unwrap().job_id, first.job_id);

        let second = pool.refresh_work(false).await.unwrap();
        assert_ne!(first.job_id, second.job_id);
        assert!(pool.work.get(first.job_id).is_some());

        daemon.template.lock().height += 1;

        let third = pool.refresh_work(false).await.unwrap();
        assert!(pool.work.get(first.job_id).is_none());
        assert!(pool.work.get(third.job_id).is_some());
    }

    #[tokio::test]
    async fn missing_aux_block_mines_primary_alone() {
        let store = Arc::new(MemoryStore::default());

        let pool = Pool::new(
            settings(),
            vec![
                chain_node("dogecoin", Daemon::new(easy_template()), DOGE_ADDRESS).await,
                chain_node("dogecoin", Daemon::new(easy_template()), DOGE_ADDRESS).await,
            ],
            store,
            CancellationToken::new(),
        )
        .unwrap();

        let work = pool.refresh_work(true).await.unwrap();
        assert!(work.aux_block.is_none());
    }

    #[tokio::test]
    async fn primary_candidate_is_submitted_and_recorded() {
        let daemon = Daemon::new(easy_template());
        let (pool, store) = pool(daemon.clone()).await;

        let work = pool.refresh_work(true).await.unwrap();
        let block = solve(work.clone(), work.template.target);

        let accepted = pool
            .submit_candidate(&block, ShareStatus::Primary, &session())
            .await;

        assert_eq!(accepted, ShareStatus::Primary);
        assert_eq!(daemon.submissions("submitblock"), 1);
        assert_eq!(
            daemon.submitted.lock()[0].1,
            json!([block.submission().unwrap()])
        );

        let blocks = store.blocks.lock();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].chain, "dogecoin");
        assert_eq!(blocks[0].kind, "Primary");
        assert_eq!(blocks[0].status, BlockStatus::Pending);
        assert_eq!(blocks[0].block_height, work.height());
        assert_eq!(blocks[0].hash, block.header_hash().unwrap());
        assert_eq!(
            blocks[0].transaction_confirmation_data,
            block.coinbase_hash().unwrap()
        );
        assert_eq!(blocks[0].miner, DOGE_ADDRESS);
    }

    #[tokio::test]
    async fn dual_candidate_is_submitted_to_both_chains() {
        let aux = Daemon::with_aux_block(easy_template(), aux_block());
        let (pool, primary, store) = merged_pool(aux.clone()).await;

        let work = pool.refresh_work(true).await.unwrap();
        assert_eq!(work.aux_block, Some(aux_block()));

        let aux_target = work.aux_target().unwrap().unwrap();
        let mut block = solve(work.clone(), work.template.target.min(aux_target));

        let status = share::classify(
            block.sum().unwrap(),
            work.template.target,
            Some(aux_target),
            pool.pool_target,
        );
        assert_eq!(status, ShareStatus::Dual);

        let accepted = pool
            .submit_candidate(&block, status, &merged_session())
            .await;
        assert_eq!(accepted, ShareStatus::Dual);

        assert_eq!(primary.submissions("submitblock"), 1);
        assert_eq!(aux.submissions("submitauxblock"), 1);
        assert_eq!(
            aux.submitted.lock()[0].1,
            json!(["11".repeat(32), AuxPow::new(&block).unwrap().serialize()])
        );

        let blocks = store.blocks.lock();
        assert_eq!(blocks.len(), 2);

        let aux_found = blocks.iter().find(|found| found.chain == "dogecoin").unwrap();
        assert_eq!(aux_found.kind, "Dual");
        assert_eq!(aux_found.block_height, 5_000_000);
        assert_eq!(aux_found.hash, "11".repeat(32));
        assert_eq!(aux_found.transaction_confirmation_data, "33".repeat(32));
        assert_eq!(aux_found.miner, format!("{LTC_ADDRESS}-{DOGE_ADDRESS}"));

        let primary_found = blocks.iter().find(|found| found.chain == "litecoin").unwrap();
        assert_eq!(primary_found.kind, "Dual");
        assert_eq!(primary_found.hash, block.header_hash().unwrap());
        assert_eq!(primary_found.block_height, work.height());
    }

    #[tokio::test]
    async fn rejected_aux_submission_is_retried_once() {
        let aux = Daemon::with_aux_block(easy_template(), aux_block());
        let (pool, primary, store) = merged_pool(aux.clone()).await;

        let work = pool.refresh_work(true).await.unwrap();
        let block = solve(work.clone(), work.aux_target().unwrap().unwrap());

        aux.aux_rejections.store(1, Ordering::SeqCst);

        assert_eq!(
            pool.submit_candidate(&block, ShareStatus::Aux, &merged_session())
                .await,
            ShareStatus::Aux
        );
        assert_eq!(aux.submissions("submitauxblock"), 2);
        assert_eq!(primary.submissions("submitblock"), 0);
        assert_eq!(store.blocks.lock().len(), 1);
        assert_eq!(store.blocks.lock()[0].kind, "Aux1");

        aux.aux_rejections.store(2, Ordering::SeqCst);

        assert_eq!(
            pool.submit_candidate(&block, ShareStatus::Aux, &merged_session())
                .await,
            ShareStatus::Valid
        );
        assert_eq!(aux.submissions("submitauxblock"), 4);
        assert_eq!(store.blocks.lock().len(), 1);
    }

    #[tokio::test]
    async fn shares_are_credited_from_the_sum() {
        let (pool, _) = pool(Daemon::new(easy_template())).await;
        let work = pool.refresh_work(true).await.unwrap();

        pool.record_share(
            &session(),
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            &work,
            HIGHEST_TARGET,
        );

        let store = MemoryStore::default();
        assert_eq!(pool.shares.flush(&store).await.unwrap(), 1);

        let share = store.shares.lock()[0].clone();
        assert_eq!(share.pool_id, "doge");
        assert_eq!(share.miner, DOGE_ADDRESS);
        assert_eq!(share.worker, "rig1");
        assert_eq!(share.difficulty, 65536.0);
        assert_eq!(share.ip_address, "127.0.0.1");
        assert_eq!(share.block_height, work.height());
    }
}
