use {
    anyhow::{Context, Error, anyhow, bail, ensure},
    arguments::Arguments,
    async_trait::async_trait,
    auxpow::AuxPow,
    bitcoin::hashes::{Hash, sha256d},
    block_template::{AuxBlock, BlockTemplate, TemplateTransaction},
    byteorder::{ByteOrder, LittleEndian},
    chain::{Chain, Network},
    chrono::{DateTime, Utc},
    clap::Parser,
    coinbase_builder::CoinbaseBuilder,
    error::PoolError,
    extranonces::Extranonces,
    futures::{sink::SinkExt, stream::StreamExt},
    login::Login,
    lru::LruCache,
    options::Options,
    parking_lot::{Mutex, RwLock},
    pool::Pool,
    primitive_types::{U256, U512},
    regex::Regex,
    reqwest::{Client, Url},
    rpc::{Rpc, RpcClient, WalletTransaction},
    rpc_manager::RpcManager,
    serde::{
        Deserialize, Serialize,
        de::{self, DeserializeOwned, Deserializer},
    },
    serde_json::{Value, json},
    serde_with::{DeserializeFromStr, SerializeDisplay},
    settings::{ChainConfig, Settings},
    share::{Share, ShareStatus},
    share_buffer::ShareBuffer,
    snafu::Snafu,
    std::{
        collections::{BTreeMap, HashMap, HashSet},
        env,
        fmt::{self, Display, Formatter},
        fs, io, mem,
        net::{IpAddr, SocketAddr},
        num::NonZeroUsize,
        path::{Path, PathBuf},
        process,
        str::FromStr,
        sync::{
            Arc, LazyLock,
            atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering},
        },
        time::Duration,
    },
    store::{BlockStatus, FoundBlock, Store},
    stratum::{
        AUTHORIZE, Authorize, EXTRANONCE_SUBSCRIBE, Extranonce, Id, JobId, JsonRpcError,
        MULTI_VERSION, Message, NOTIFY, Nonce, Notify, Ntime, SET_DIFFICULTY, SUBMIT, SUBSCRIBE,
        SetDifficulty, StratumError, Submit, Subscribe, SubscribeResult, Version,
    },
    target::{HIGHEST_TARGET, Target},
    tokio::{
        io::{AsyncRead, AsyncWrite},
        net::{TcpListener, TcpStream},
        runtime::Runtime,
        sync::mpsc,
        task::JoinHandle,
        time::{Instant, MissedTickBehavior, interval, sleep, sleep_until, timeout},
    },
    tokio_util::{
        codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError},
        sync::CancellationToken,
    },
    tracing::{debug, error, info, warn},
    tracing_appender::non_blocking,
    tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt},
    unlocker::Unlocker,
    uuid::Uuid,
    work::{Block, WorkContext},
    work_cache::WorkCache,
    zeromq::{Socket, SocketRecv, SubSocket},
};

mod arguments;
mod auxpow;
mod block_template;
mod chain;
pub mod codec;
mod coinbase_builder;
mod error;
mod extranonces;
mod generator;
mod login;
mod logs;
mod merkle;
mod options;
mod pool;
mod rpc;
mod rpc_manager;
mod sessions;
pub mod settings;
mod share;
mod share_buffer;
mod signal;
mod store;
mod stratifier;
mod subcommand;
mod target;
mod unlocker;
mod work;
mod work_cache;
mod zmq;

pub const MIN_ENONCE_SIZE: usize = 2;
pub const MAX_ENONCE_SIZE: usize = 8;
pub const ENONCE1_SIZE: usize = 4;
pub const ENONCE2_SIZE: usize = 4;

type Result<T = (), E = Error> = std::result::Result<T, E>;

pub fn main() {
    let _guard = logs::init();

    let args = Arguments::parse();

    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: failed to create tokio runtime: {err}");
            process::exit(1);
        }
    };

    runtime.block_on(async {
        let cancel = signal::setup_signal_handler();

        match args.run(cancel).await {
            Err(err) => {
                eprintln!("error: {err}");

                for (i, cause) in err.chain().skip(1).enumerate() {
                    if i == 0 {
                        eprintln!();
                        eprintln!("because:");
                    }
                    eprintln!("- {cause}");
                }

                if env::var_os("RUST_BACKTRACE")
                    .map(|val| val == "1")
                    .unwrap_or_default()
                {
                    eprintln!();
                    eprintln!("{}", err.backtrace());
                }

                process::exit(1);
            }
            Ok(()) => process::exit(0),
        }
    });
}
