use super::*;

/// Routes calls for one chain to its active node, failing over in configuration order and drifting
/// back to the first node once it recovers.
#[derive(Debug)]
pub struct RpcManager {
    chain: String,
    nodes: Vec<Arc<dyn Rpc>>,
    active: AtomicUsize,
    recovering: AtomicBool,
    primary_check_interval: Duration,
    cancel: CancellationToken,
}

impl RpcManager {
    pub fn new(
        chain: impl Into<String>,
        nodes: Vec<Arc<dyn Rpc>>,
        primary_check_interval: Duration,
        cancel: CancellationToken,
    ) -> Result<Arc<Self>, PoolError> {
        let chain = chain.into();

        if nodes.is_empty() {
            return Err(PoolError::validation(format!(
                "{chain} needs at least one rpc node"
            )));
        }

        Ok(Arc::new(Self {
            chain,
            nodes,
            active: AtomicUsize::new(0),
            recovering: AtomicBool::new(false),
            primary_check_interval,
            cancel,
        }))
    }

    pub fn chain(&self) -> &str {
        &self.chain
    }

    pub fn active(&self) -> Arc<dyn Rpc> {
        self.nodes[self.active_index()].clone()
    }

    pub fn active_index(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub async fn check_and_recover(self: &Arc<Self>) -> Result<(), PoolError> {
        if self.active().health_check().await {
            return Ok(());
        }

        self.find_healthy_node().await?;

        if self.active_index() != 0 {
            self.spawn_primary_recovery();
        }

        Ok(())
    }

    async fn find_healthy_node(&self) -> Result<(), PoolError> {
        let start = self.active_index();
        let len = self.nodes.len();

        for offset in 1..=len {
            let index = (start + offset) % len;
            let node = &self.nodes[index];

            if node.health_check().await {
                self.active.store(index, Ordering::SeqCst);
                warn!(
                    "Failed over {} rpc from node {start} to node {index} ({})",
                    self.chain,
                    node.url()
                );
                return Ok(());
            }

            debug!(
                "{} node {index} ({}) unhealthy, sickness {}",
                self.chain,
                node.url(),
                node.sickness()
            );
        }

        error!("No healthy {} nodes", self.chain);

        Err(PoolError::NoHealthyNodes {
            chain: self.chain.clone(),
        })
    }

    fn spawn_primary_recovery(self: &Arc<Self>) {
        if self.recovering.swap(true, Ordering::SeqCst) {
            return;
        }

        let manager = self.clone();

        tokio::spawn(async move {
            let mut ticker = interval(manager.primary_check_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = manager.cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if manager.nodes[0].health_check().await {
                            manager.active.store(0, Ordering::SeqCst);
                            info!("Restored {} rpc to primary node {}", manager.chain, manager.nodes[0].url());
                            break;
                        }
                    }
                }
            }

            manager.recovering.store(false, Ordering::SeqCst);
        });
    }

    /// Runs `op` on the active node, failing over and retrying once on error.
    pub async fn call_with_failover<T, F, Fut>(self: &Arc<Self>, op: F) -> Result<T, PoolError>
    where
        F: Fn(Arc<dyn Rpc>) -> Fut,
        Fut: Future<Output = Result<T, PoolError>>,
    {
        match op(self.active()).await {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!("{} rpc call failed, checking nodes: {err}", self.chain);
                self.check_and_recover().await?;
                op(self.active()).await
            }
        }
    }
}
