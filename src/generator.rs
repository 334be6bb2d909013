use {super::*, zmq::BlockNotification};

/// Refreshes work on every block notification (clean) and every `period` (not clean).
pub(crate) fn spawn_generator(
    pool: Arc<Pool>,
    mut notifications: mpsc::Receiver<BlockNotification>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    info!("Spawning generator task");

    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                Some(notification) = notifications.recv() => {
                    info!(
                        "New {} block {} (sequence {})",
                        notification.chain, notification.hash, notification.sequence
                    );

                    if let Err(err) = pool.refresh_work(true).await {
                        warn!("Failed to refresh work: {err:#}");
                    }
                }
                _ = ticker.tick() => {
                    if let Err(err) = pool.refresh_work(false).await {
                        warn!("Failed to refresh work: {err:#}");
                    }
                }
            }
        }

        info!("Shutting down generator");
    })
}
