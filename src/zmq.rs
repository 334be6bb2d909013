use super::*;

const TOPIC: &[u8] = b"hashblock";
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BlockNotification {
    pub(crate) chain: &'static str,
    /// Display order, as explorers show it.
    pub(crate) hash: String,
    pub(crate) sequence: u32,
}

pub(crate) struct Zmq {
    chain: &'static str,
    socket: SubSocket,
    last_sequence: Option<u32>,
}

impl Zmq {
    pub(crate) async fn connect(chain: &'static str, endpoint: &str) -> Result<Self> {
        info!("Subscribing to {chain} hashblock on ZMQ endpoint {endpoint}");

        let socket = match timeout(Duration::from_secs(1), async {
            let mut socket = SubSocket::new();

            socket
                .connect(endpoint)
                .await
                .with_context(|| format!("failed to connect to ZMQ endpoint `{endpoint}`"))?;

            socket
                .subscribe("hashblock")
                .await
                .with_context(|| format!("failed to subscribe to hashblock on `{endpoint}`"))?;

            Ok::<_, Error>(socket)
        })
        .await
        {
            Ok(Ok(socket)) => socket,
            Ok(Err(err)) => return Err(err),
            Err(_) => bail!(
                "timed out connecting to ZMQ endpoint `{endpoint}`, ensure the {chain} daemon runs with `-zmqpubhashblock={endpoint}`"
            ),
        };

        Ok(Self {
            chain,
            socket,
            last_sequence: None,
        })
    }

    pub(crate) async fn recv(&mut self) -> Result<BlockNotification> {
        let message = self.socket.recv().await?;

        let frames = (0..message.len())
            .filter_map(|i| message.get(i))
            .map(|frame| frame.as_ref())
            .collect::<Vec<&[u8]>>();

        let (hash, sequence) = parse_frames(&frames)?;

        if let Some(missed) = sequence_gap(self.last_sequence, sequence) {
            warn!(
                "Missed {missed} {} block notifications before sequence {sequence}",
                self.chain
            );
        }

        self.last_sequence = Some(sequence);

        Ok(BlockNotification {
            chain: self.chain,
            hash,
            sequence,
        })
    }
}

/// Decodes `[topic, 32-byte hash, 4-byte little-endian sequence]`.
pub(crate) fn parse_frames(frames: &[&[u8]]) -> Result<(String, u32)> {
    ensure!(
        frames.len() == 3,
        "hashblock: expected 3 frames, got {}",
        frames.len()
    );

    ensure!(frames[0] == TOPIC, "hashblock: wrong topic");

    ensure!(
        frames[1].len() == 32,
        "hashblock: body len {}",
        frames[1].len()
    );

    ensure!(
        frames[2].len() == 4,
        "hashblock: seq len {}",
        frames[2].len()
    );

    Ok((
        hex::encode(frames[1]),
        LittleEndian::read_u32(frames[2]),
    ))
}

/// Number of notifications skipped between `previous` and `next`, if any.
pub(crate) fn sequence_gap(previous: Option<u32>, next: u32) -> Option<u32> {
    let expected = previous?.wrapping_add(1);

    if next == expected {
        None
    } else {
        Some(next.wrapping_sub(expected))
    }
}

/// Forwards notifications for `chain` into `sender`, reconnecting on failure.
pub(crate) fn spawn_subscriber(
    chain: &'static str,
    endpoint: String,
    sender: mpsc::Sender<BlockNotification>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        'connect: loop {
            let mut subscription = tokio::select! {
                _ = cancel.cancelled() => break,
                result = Zmq::connect(chain, &endpoint) => match result {
                    Ok(subscription) => subscription,
                    Err(err) => {
                        error!("{err:#}");
                        sleep(RECONNECT_DELAY).await;
                        continue;
                    }
                },
            };

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break 'connect,
                    result = subscription.recv() => match result {
                        Ok(notification) => {
                            debug!("ZMQ {} block {}", notification.chain, notification.hash);
                            if sender.send(notification).await.is_err() {
                                break 'connect;
                            }
                        }
                        Err(err) => {
                            error!("ZMQ {chain} receive error: {err:#}");
                            sleep(RECONNECT_DELAY).await;
                            continue 'connect;
                        }
                    },
                }
            }
        }

        debug!("Stopped {chain} block notifications");
    })
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq};

    #[test]
    fn parses_hashblock_frames() {
        let hash = [0xab; 32];
        let sequence = 7u32.to_le_bytes();

        assert_eq!(
            parse_frames(&[TOPIC, &hash, &sequence]).unwrap(),
            ("ab".repeat(32), 7)
        );
    }

    #[test]
    fn rejects_malformed_frames() {
        let hash = [0; 32];
        let sequence = [0; 4];

        assert!(parse_frames(&[TOPIC, &hash]).is_err());
        assert!(parse_frames(&[b"rawtx", &hash, &sequence]).is_err());
        assert!(parse_frames(&[TOPIC, &hash[..31], &sequence]).is_err());
        assert!(parse_frames(&[TOPIC, &hash, &sequence[..2]]).is_err());
    }

    #[test]
    fn sequence_gaps() {
        #[track_caller]
        fn case(previous: Option<u32>, next: u32, expected: Option<u32>) {
            assert_eq!(sequence_gap(previous, next), expected);
        }

        case(None, 5, None);
        case(Some(4), 5, None);
        case(Some(4), 8, Some(3));
        case(Some(u32::MAX), 0, None);
        case(Some(u32::MAX), 2, Some(2));
    }
}
