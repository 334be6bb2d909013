use super::*;

/// Shares waiting to be persisted. Delivery is at-least-once: a failed flush puts the batch
/// back in front of anything recorded since.
#[derive(Debug, Default)]
pub(crate) struct ShareBuffer {
    shares: Mutex<Vec<Share>>,
}

impl ShareBuffer {
    pub(crate) fn push(&self, share: Share) {
        self.shares.lock().push(share);
    }

    pub(crate) fn len(&self) -> usize {
        self.shares.lock().len()
    }

    pub(crate) async fn flush(&self, store: &dyn Store) -> Result<usize> {
        let batch = mem::take(&mut *self.shares.lock());

        if batch.is_empty() {
            return Ok(0);
        }

        match store.insert_shares(&batch).await {
            Ok(()) => Ok(batch.len()),
            Err(err) => {
                let count = batch.len();
                let mut shares = self.shares.lock();
                let newer = mem::replace(&mut *shares, batch);
                shares.extend(newer);
                Err(err.context(format!("failed to flush {count} shares")))
            }
        }
    }

    pub(crate) fn spawn_flusher(
        self: Arc<Self>,
        store: Arc<dyn Store>,
        period: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        if let Err(err) = self.flush(store.as_ref()).await {
                            error!("Final share flush failed: {err:#}");
                        }
                        break;
                    }
                    _ = ticker.tick() => {
                        match self.flush(store.as_ref()).await {
                            Ok(0) => {}
                            Ok(count) => debug!("Flushed {count} shares"),
                            Err(err) => warn!("{err:#}"),
                        }
                    }
                }
            }
        })
    }
}
