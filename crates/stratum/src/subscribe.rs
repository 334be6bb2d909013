use super::*;

/// `mining.subscribe` params. Some miners send an empty array, others add a session id after
/// the user agent, so everything past the first element is ignored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Subscribe {
    pub user_agent: String,
}

impl Serialize for Subscribe {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(1))?;
        seq.serialize_element(&self.user_agent)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Subscribe {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let params = Vec::<Value>::deserialize(deserializer)?;

        let user_agent = match params.first() {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(agent)) => agent.clone(),
            Some(other) => {
                return Err(de::Error::custom(format!(
                    "user agent must be a string, got {other}"
                )));
            }
        };

        Ok(Subscribe { user_agent })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscribeResult {
    pub subscriptions: Vec<(String, String)>,
    pub extranonce1: Extranonce,
    pub extranonce2_size: u32,
}

impl SubscribeResult {
    pub fn new(session_id: &str, extranonce1: Extranonce, extranonce2_size: u32) -> Self {
        Self {
            subscriptions: vec![
                (SET_DIFFICULTY.into(), session_id.into()),
                (NOTIFY.into(), session_id.into()),
            ],
            extranonce1,
            extranonce2_size,
        }
    }
}

impl Serialize for SubscribeResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (&self.subscriptions, &self.extranonce1, self.extranonce2_size).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SubscribeResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (subscriptions, extranonce1, extranonce2_size) =
            <(Vec<(String, String)>, Extranonce, u32)>::deserialize(deserializer)?;

        Ok(SubscribeResult {
            subscriptions,
            extranonce1,
            extranonce2_size,
        })
    }
}
