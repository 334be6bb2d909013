use super::*;

#[derive(Debug, Clone)]
pub(crate) struct Subscription {
    pub(crate) session_id: Uuid,
    pub(crate) enonce1: Extranonce,
    pub(crate) user_agent: String,
}

#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub(crate) session_id: Uuid,
    pub(crate) enonce1: Extranonce,
    pub(crate) user_agent: String,
    pub(crate) login: Login,
}

#[derive(Debug, Clone)]
pub(crate) enum State {
    Connected,
    Subscribed(Subscription),
    Authorized(Arc<Session>),
    Disconnected,
}

impl State {
    pub(crate) fn new() -> Self {
        State::Connected
    }

    pub(crate) fn disconnect(&mut self) {
        *self = State::Disconnected;
    }

    pub(crate) fn subscribe(&mut self, subscription: Subscription) -> bool {
        match self {
            State::Connected => {
                *self = State::Subscribed(subscription);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn authorize(&mut self, login: Login) -> Option<Arc<Session>> {
        match self {
            State::Subscribed(subscription) => {
                let session = Arc::new(Session {
                    session_id: subscription.session_id,
                    enonce1: subscription.enonce1.clone(),
                    user_agent: subscription.user_agent.clone(),
                    login,
                });
                *self = State::Authorized(session.clone());
                Some(session)
            }
            _ => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn subscription(&self) -> Option<&Subscription> {
        match self {
            State::Subscribed(subscription) => Some(subscription),
            _ => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn session(&self) -> Option<Arc<Session>> {
        match self {
            State::Authorized(session) => Some(session.clone()),
            _ => None,
        }
    }

    pub(crate) fn session_id(&self) -> Option<Uuid> {
        match self {
            State::Subscribed(subscription) => Some(subscription.session_id),
            State::Authorized(session) => Some(session.session_id),
            State::Connected | State::Disconnected => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_subscribed(&self) -> bool {
        matches!(self, State::Subscribed(_) | State::Authorized(_))
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            State::Connected => write!(f, "Connected"),
            State::Subscribed(_) => write!(f, "Subscribed"),
            State::Authorized(_) => write!(f, "Authorized"),
            State::Disconnected => write!(f, "Disconnected"),
        }
    }
}
