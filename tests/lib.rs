use {
    axum::{Json, Router, extract::State, routing::post},
    command_builder::CommandBuilder,
    daemon::Daemon,
    miner::Miner,
    ntest::timeout,
    pretty_assertions::assert_eq as pretty_assert_eq,
    serde_json::{Value, json},
    std::{
        fs,
        io::{self, BufRead, BufReader, Read, Write},
        net::{TcpListener, TcpStream},
        process::{Child, Command, Stdio},
        sync::{Arc, Mutex},
        thread,
        time::{Duration, Instant},
    },
    tempfile::TempDir,
    test_pool::TestPool,
    to_args::ToArgs,
};

mod command_builder;
mod test_pool;

pub(crate) const REWARD_ADDRESS: &str = "nZ8bVhcQGkfhTxhGLGECX7NX4yJpT5wz7E";

pub(crate) fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}
