use {
    super::*,
    crate::sessions::SessionHandle,
    bouncer::Consequence,
    state::{Session, State, Subscription},
};

pub(crate) mod bouncer;
pub(crate) mod state;

/// Longer lines are a socket flood.
pub(crate) const MAX_LINE_LENGTH: usize = 1024;

const OUTBOUND_CAPACITY: usize = 64;

/// One miner connection. Requests are answered in order; work broadcasts arrive on `outbound`
/// and are written between requests.
pub(crate) struct Connection<R, W> {
    pool: Arc<Pool>,
    peer: SocketAddr,
    reader: FramedRead<R, LinesCodec>,
    writer: FramedWrite<W, LinesCodec>,
    sender: mpsc::Sender<Message>,
    outbound: mpsc::Receiver<Message>,
    state: State,
}

impl<R, W> Connection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub(crate) fn new(pool: Arc<Pool>, peer: SocketAddr, reader: R, writer: W) -> Self {
        let (sender, outbound) = mpsc::channel(OUTBOUND_CAPACITY);

        Self {
            pool,
            peer,
            reader: FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_LENGTH)),
            writer: FramedWrite::new(writer, LinesCodec::new()),
            sender,
            outbound,
            state: State::new(),
        }
    }

    fn ip(&self) -> IpAddr {
        self.peer.ip()
    }

    pub(crate) async fn serve(&mut self) -> Result {
        let result = self.serve_requests().await;

        if let Some(session_id) = self.state.session_id() {
            self.pool.sessions.remove(&session_id);
        }

        self.state.disconnect();

        info!("Miner {} disconnected", self.peer);

        result
    }

    async fn serve_requests(&mut self) -> Result {
        let read_timeout = self.pool.settings.connection_timeout();
        let mut deadline = Instant::now() + read_timeout;

        loop {
            tokio::select! {
                _ = self.pool.cancel.cancelled() => break,
                _ = sleep_until(deadline) => {
                    info!("Miner {} timed out", self.peer);
                    break;
                }
                Some(message) = self.outbound.recv() => self.send(message).await?,
                line = self.reader.next() => {
                    let line = match line {
                        Some(Ok(line)) => line,
                        Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                            warn!("Socket flood from {}", self.peer);
                            self.pool.bouncer.ban(self.ip());
                            break;
                        }
                        Some(Err(LinesCodecError::Io(err))) => {
                            debug!("Read error from {}: {err}", self.peer);
                            break;
                        }
                        None => break,
                    };

                    if line.trim().is_empty() {
                        continue;
                    }

                    let message = match serde_json::from_str::<Message>(&line) {
                        Ok(message) => message,
                        Err(err) => {
                            warn!("Malformed message from {}: {err}", self.peer);
                            if self.pool.bouncer.strike(self.ip()) == Consequence::Ban {
                                warn!("Banned {} after repeated malformed messages", self.ip());
                            }
                            break;
                        }
                    };

                    match message {
                        Message::Request { id, method, params }
                        | Message::Notification { id, method, params } => {
                            if !self.dispatch(id, &method, params).await? {
                                break;
                            }
                            deadline = Instant::now() + read_timeout;
                        }
                        Message::Response { .. } => {
                            debug!("Ignoring response from {}", self.peer);
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Handles one request. Returns false when the connection should close.
    async fn dispatch(&mut self, id: Id, method: &str, params: Value) -> Result<bool> {
        match method {
            SUBSCRIBE => self.subscribe(id, params).await,
            AUTHORIZE => self.authorize(id, params).await,
            SUBMIT => {
                self.submit(id, params).await?;
                Ok(true)
            }
            MULTI_VERSION | EXTRANONCE_SUBSCRIBE => {
                self.send(Message::result(id, true)).await?;
                Ok(true)
            }
            method => {
                warn!("Unknown method {method} from {}", self.peer);
                self.reject(id, StratumError::Other.with_message("Unknown method"))
                    .await?;
                Ok(true)
            }
        }
    }

    async fn refuse_banned(&mut self, id: Id) -> Result<bool> {
        if !self.pool.bouncer.is_banned(self.ip()) {
            return Ok(false);
        }

        debug!("Refusing banned {}", self.ip());

        self.reject(id, StratumError::Other.with_message("Banned"))
            .await?;

        Ok(true)
    }

    async fn subscribe(&mut self, id: Id, params: Value) -> Result<bool> {
        if self.refuse_banned(id.clone()).await? {
            return Ok(false);
        }

        let subscribe = match serde_json::from_value::<Subscribe>(params) {
            Ok(subscribe) => subscribe,
            Err(err) => {
                self.reject(id, StratumError::Other.with_message(format!("Invalid params: {err}")))
                    .await?;
                return Ok(true);
            }
        };

        if !matches!(self.state, State::Connected) {
            self.reject(id, StratumError::Other.with_message("Already subscribed"))
                .await?;
            return Ok(true);
        }

        let enonce1 = match self.pool.extranonces.allocate() {
            Ok(enonce1) => enonce1,
            Err(err) => {
                error!("Cannot subscribe {}: {err}", self.peer);
                self.reject(id, StratumError::Other.with_message("Server full"))
                    .await?;
                return Ok(false);
            }
        };

        let session_id = Uuid::new_v4();

        info!(
            "Subscribed {} ({}) with extranonce1 {enonce1}",
            self.peer, subscribe.user_agent
        );

        self.state.subscribe(Subscription {
            session_id,
            enonce1: enonce1.clone(),
            user_agent: subscribe.user_agent,
        });

        let extranonce2_size = u32::try_from(self.pool.extranonces.enonce2_size())?;

        self.send(Message::result(
            id,
            SubscribeResult::new(&session_id.simple().to_string(), enonce1, extranonce2_size),
        ))
        .await?;

        Ok(true)
    }

    async fn authorize(&mut self, id: Id, params: Value) -> Result<bool> {
        if self.refuse_banned(id.clone()).await? {
            return Ok(false);
        }

        let authorize = match serde_json::from_value::<Authorize>(params) {
            Ok(authorize) => authorize,
            Err(err) => {
                self.reject(id, StratumError::Other.with_message(format!("Invalid params: {err}")))
                    .await?;
                return Ok(true);
            }
        };

        match &self.state {
            State::Subscribed(_) => {}
            State::Authorized(_) => {
                self.reject(id, StratumError::Other.with_message("Already authorized"))
                    .await?;
                return Ok(true);
            }
            State::Connected | State::Disconnected => {
                self.reject(id, StratumError::NotSubscribed).await?;
                return Ok(true);
            }
        }

        let login = match authorize
            .username
            .parse::<Login>()
            .and_then(|login| login.validate(&self.pool.login_chains).map(|()| login))
        {
            Ok(login) => login,
            Err(err) => {
                warn!("Refused login `{}` from {}: {err}", authorize.username, self.peer);
                self.send(Message::Response {
                    id,
                    result: Some(json!(false)),
                    error: Some(StratumError::Unauthorized.with_message(err.to_string())),
                })
                .await?;
                return Ok(true);
            }
        };

        let Some(session) = self.state.authorize(login) else {
            return Ok(true);
        };

        info!(
            "Authorized {} as {} ({})",
            self.peer,
            session.login.miner(),
            session.login.rig()
        );

        self.pool.sessions.insert(SessionHandle {
            session: session.clone(),
            ip: self.ip(),
            sender: self.sender.clone(),
        });

        self.send(Message::result(id, true)).await?;

        self.send(Message::notification(
            SET_DIFFICULTY,
            SetDifficulty(self.pool.settings.pool_difficulty()),
        ))
        .await?;

        if let Some(work) = self.pool.work.current() {
            self.send(Message::notification(NOTIFY, work.notify(false)?))
                .await?;
        }

        Ok(true)
    }

    async fn submit(&mut self, id: Id, params: Value) -> Result {
        let session = match &self.state {
            State::Authorized(session) => session.clone(),
            State::Subscribed(_) => return self.reject(id, StratumError::Unauthorized).await,
            State::Connected | State::Disconnected => {
                return self.reject(id, StratumError::NotSubscribed).await;
            }
        };

        let submit = match serde_json::from_value::<Submit>(params) {
            Ok(submit) => submit,
            Err(err) => {
                return self
                    .reject(id, StratumError::Other.with_message(format!("Invalid params: {err}")))
                    .await;
            }
        };

        let Some(work) = self.pool.work.get(submit.job_id) else {
            debug!("Stale job {} from {}", submit.job_id, self.peer);
            return self.reject(id, StratumError::Stale).await;
        };

        if submit.extranonce2.len() != self.pool.extranonces.enonce2_size() {
            return self
                .reject(
                    id,
                    StratumError::Other.with_message("Incorrect size of extranonce2"),
                )
                .await;
        }

        match self.check_share(&session, work, &submit).await {
            Ok(status) => {
                debug!("{status} share from {} ({})", self.peer, session.login.rig());
                self.send(Message::result(id, true)).await
            }
            Err(error) => self.reject(id, error).await,
        }
    }

    async fn check_share(
        &self,
        session: &Session,
        work: Arc<WorkContext>,
        submit: &Submit,
    ) -> Result<ShareStatus, JsonRpcError> {
        let internal = |err: PoolError| {
            error!("Failed to rebuild header for job {}: {err}", work.job_id);
            StratumError::Other.with_message("Internal error")
        };

        let extranonce = [session.enonce1.as_bytes(), submit.extranonce2.as_bytes()].concat();

        let mut block = Block::new(work.clone());

        let header = block
            .make_header(&extranonce, submit.nonce, submit.ntime)
            .map_err(internal)?;

        if self.pool.work.is_duplicate(codec::sha256d(header)) {
            return Err(StratumError::Duplicate.into());
        }

        let sum = block.sum().map_err(internal)?;

        let status = share::classify(
            sum,
            work.template.target,
            work.aux_target().map_err(internal)?,
            self.pool.pool_target,
        );

        if status == ShareStatus::Invalid {
            return Err(StratumError::LowDifficulty.into());
        }

        self.pool.record_share(session, self.ip(), &work, sum);

        if status.is_candidate() {
            info!(
                "{status} block candidate at height {} from {} ({})",
                work.height(),
                self.peer,
                session.login.rig()
            );

            let accepted = self.pool.submit_candidate(&block, status, session).await;

            if accepted != status {
                warn!("Only {accepted} of {status} candidate was accepted");
            }
        }

        Ok(status)
    }

    async fn reject(&mut self, id: Id, error: impl Into<JsonRpcError>) -> Result {
        self.send(Message::error(id, error)).await
    }

    async fn send(&mut self, message: Message) -> Result {
        let frame = serde_json::to_string(&message)?;
        self.writer.send(frame).await?;
        Ok(())
    }
}
