use {
    derive_more::Display,
    rand::RngCore,
    serde::{
        Deserialize, Serialize, Serializer,
        de::{self, Deserializer},
        ser::SerializeSeq,
    },
    serde_json::Value,
    serde_with::{DeserializeFromStr, SerializeDisplay},
    snafu::Snafu,
    std::{
        fmt::{self, Display, Formatter},
        str::FromStr,
    },
};

pub use {
    authorize::Authorize,
    error::{InternalError, JsonRpcError, Result, StratumError},
    extranonce::Extranonce,
    hex_word::{Nonce, Ntime, Version},
    job_id::JobId,
    message::{Id, Message},
    notify::Notify,
    set_difficulty::SetDifficulty,
    submit::Submit,
    subscribe::{Subscribe, SubscribeResult},
};

mod authorize;
mod error;
mod extranonce;
mod hex_word;
mod job_id;
mod message;
mod notify;
mod set_difficulty;
mod submit;
mod subscribe;

pub const SUBSCRIBE: &str = "mining.subscribe";
pub const AUTHORIZE: &str = "mining.authorize";
pub const SUBMIT: &str = "mining.submit";
pub const NOTIFY: &str = "mining.notify";
pub const SET_DIFFICULTY: &str = "mining.set_difficulty";
pub const MULTI_VERSION: &str = "mining.multi_version";
pub const EXTRANONCE_SUBSCRIBE: &str = "mining.extranonce.subscribe";
