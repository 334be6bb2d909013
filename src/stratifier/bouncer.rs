use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub(crate) enum Consequence {
    #[default]
    None,
    Warn,
    Ban,
}

#[derive(Debug, Default)]
struct Ledger {
    banned: HashSet<IpAddr>,
    strikes: HashMap<IpAddr, u32>,
}

/// Process-wide ban list. Malformed requests earn strikes, floods ban outright.
#[derive(Debug)]
pub(crate) struct Bouncer {
    malformed_limit: u32,
    ledger: Mutex<Ledger>,
}

impl Bouncer {
    pub(crate) fn new(malformed_limit: u32) -> Self {
        Self {
            malformed_limit: malformed_limit.max(1),
            ledger: Mutex::new(Ledger::default()),
        }
    }

    pub(crate) fn is_banned(&self, ip: IpAddr) -> bool {
        self.ledger.lock().banned.contains(&ip)
    }

    pub(crate) fn ban(&self, ip: IpAddr) {
        if self.ledger.lock().banned.insert(ip) {
            warn!("Banned {ip}");
        }
    }

    pub(crate) fn strike(&self, ip: IpAddr) -> Consequence {
        let mut ledger = self.ledger.lock();

        if ledger.banned.contains(&ip) {
            return Consequence::Ban;
        }

        let strikes = ledger.strikes.entry(ip).or_default();
        *strikes += 1;

        if *strikes < self.malformed_limit {
            return Consequence::Warn;
        }

        let strikes = *strikes;
        ledger.strikes.remove(&ip);
        ledger.banned.insert(ip);

        warn!("Banned {ip} after {strikes} malformed requests");

        Consequence::Ban
    }

    #[cfg(test)]
    pub(crate) fn strikes(&self, ip: IpAddr) -> u32 {
        self.ledger.lock().strikes.get(&ip).copied().unwrap_or_default()
    }
}
