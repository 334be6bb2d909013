use super::*;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Display)]
#[serde(untagged)]
pub enum Id {
    #[display("null")]
    Null,
    Number(u64),
    String(String),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Message {
    Request {
        id: Id,
        method: String,
        params: Value,
    },
    Response {
        id: Id,
        result: Option<Value>,
        error: Option<JsonRpcError>,
    },
    Notification {
        id: Id,
        method: String,
        params: Value,
    },
}

impl Message {
    pub fn result(id: Id, result: impl Serialize) -> Self {
        Self::Response {
            id,
            result: Some(serde_json::to_value(result).unwrap_or(Value::Null)),
            error: None,
        }
    }

    pub fn error(id: Id, error: impl Into<JsonRpcError>) -> Self {
        Self::Response {
            id,
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn notification(method: &str, params: impl Serialize) -> Self {
        Self::Notification {
            id: Id::Null,
            method: method.into(),
            params: serde_json::to_value(params).unwrap_or(Value::Null),
        }
    }
}

/// Pools send notifications with `"id": null` and miners frequently omit the id on requests,
/// so the shape is decided by which keys are present rather than by serde's untagged matching.
impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default)]
            id: Option<Id>,
            method: Option<String>,
            #[serde(default)]
            params: Option<Value>,
            #[serde(default)]
            result: Option<Value>,
            #[serde(default)]
            error: Option<JsonRpcError>,
        }

        let raw = Raw::deserialize(deserializer)?;
        let id = raw.id.unwrap_or(Id::Null);

        match raw.method {
            Some(method) => {
                let params = raw.params.unwrap_or_else(|| Value::Array(Vec::new()));

                if id == Id::Null {
                    Ok(Message::Notification { id, method, params })
                } else {
                    Ok(Message::Request { id, method, params })
                }
            }
            None if raw.result.is_some() || raw.error.is_some() => Ok(Message::Response {
                id,
                result: raw.result,
                error: raw.error,
            }),
            None => Err(de::Error::custom("message has neither method nor result")),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq, serde_json::json};

    #[track_caller]
    fn case(s: &str, expected: Message) {
        let actual = serde_json::from_str::<Message>(s).unwrap();
        assert_eq!(actual, expected, "deserialize");

        let lhs: Value = serde_json::from_str(s).unwrap();
        let rhs = serde_json::to_value(&actual).unwrap();
        assert_eq!(lhs, rhs, "semantic equality");
    }

    #[test]
    fn subscribe_request() {
        case(
            r#"{"id":1,"method":"mining.subscribe","params":["cgminer/4.10.0"]}"#,
            Message::Request {
                id: Id::Number(1),
                method: SUBSCRIBE.into(),
                params: json!(["cgminer/4.10.0"]),
            },
        );
    }

    #[test]
    fn notification_with_null_id() {
        case(
            r#"{"id":null,"method":"mining.set_difficulty","params":[16]}"#,
            Message::Notification {
                id: Id::Null,
                method: SET_DIFFICULTY.into(),
                params: json!([16]),
            },
        );
    }

    #[test]
    fn notification_without_id() {
        assert_eq!(
            serde_json::from_str::<Message>(r#"{"method":"mining.notify","params":[]}"#).unwrap(),
            Message::Notification {
                id: Id::Null,
                method: NOTIFY.into(),
                params: json!([]),
            }
        );
    }

    #[test]
    fn string_id_request() {
        case(
            r#"{"id":"a1","method":"mining.authorize","params":["D8x.rig",""]}"#,
            Message::Request {
                id: Id::String("a1".into()),
                method: AUTHORIZE.into(),
                params: json!(["D8x.rig", ""]),
            },
        );
    }

    #[test]
    fn result_response() {
        case(
            r#"{"id":4,"result":true,"error":null}"#,
            Message::Response {
                id: Id::Number(4),
                result: Some(json!(true)),
                error: None,
            },
        );
    }

    #[test]
    fn error_response() {
        case(
            r#"{"id":4,"result":null,"error":[23,"Low difficulty share",null]}"#,
            Message::Response {
                id: Id::Number(4),
                result: None,
                error: Some(StratumError::LowDifficulty.into()),
            },
        );
    }

    #[test]
    fn helpers_build_expected_shapes() {
        assert_eq!(
            serde_json::to_value(Message::result(Id::Number(2), true)).unwrap(),
            json!({"id": 2, "result": true, "error": null})
        );

        assert_eq!(
            serde_json::to_value(Message::error(Id::Number(3), StratumError::Stale)).unwrap(),
            json!({"id": 3, "result": null, "error": [21, "Stale job", null]})
        );

        assert_eq!(
            serde_json::to_value(Message::notification(SET_DIFFICULTY, [32.0])).unwrap(),
            json!({"id": null, "method": "mining.set_difficulty", "params": [32.0]})
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(serde_json::from_str::<Message>(r#"{"id":1}"#).is_err());
        assert!(serde_json::from_str::<Message>("[1,2,3]").is_err());
        assert!(serde_json::from_str::<Message>("not json").is_err());
    }
}
