use {super::*, crate::stratifier::state::Session};

#[derive(Debug, Clone)]
pub(crate) struct SessionHandle {
    pub(crate) session: Arc<Session>,
    pub(crate) ip: IpAddr,
    pub(crate) sender: mpsc::Sender<Message>,
}

/// Authorized sessions that receive work broadcasts.
#[derive(Debug, Default)]
pub(crate) struct Sessions {
    handles: RwLock<HashMap<Uuid, SessionHandle>>,
}

impl Sessions {
    pub(crate) fn insert(&self, handle: SessionHandle) {
        self.handles
            .write()
            .insert(handle.session.session_id, handle);
    }

    pub(crate) fn remove(&self, session_id: &Uuid) -> Option<SessionHandle> {
        self.handles.write().remove(session_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.handles.read().len()
    }

    /// Queues `message` for every session without waiting on slow readers. Sessions whose
    /// channel has closed are dropped from the registry.
    pub(crate) fn broadcast(&self, message: &Message) -> usize {
        let senders = self
            .handles
            .read()
            .iter()
            .map(|(session_id, handle)| (*session_id, handle.ip, handle.sender.clone()))
            .collect::<Vec<(Uuid, IpAddr, mpsc::Sender<Message>)>>();

        let mut delivered = 0;

        for (session_id, ip, sender) in senders {
            match sender.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("Outbound queue full for session {session_id} ({ip}), skipping broadcast");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!("Session {session_id} ({ip}) closed, removing");
                    self.remove(&session_id);
                }
            }
        }

        delivered
    }
}
