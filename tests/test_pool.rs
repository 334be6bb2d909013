use super::*;

pub(crate) struct TestPool {
    pub(crate) daemon: Daemon,
    pub(crate) port: u16,
    handle: Child,
    tempdir: Arc<TempDir>,
}

impl TestPool {
    pub(crate) fn spawn() -> Self {
        let daemon = Daemon::spawn();
        let tempdir = Arc::new(TempDir::new().unwrap());
        let port = free_port();

        let config = tempdir.path().join("scryptpool.toml");

        fs::write(
            &config,
            format!(
                r#"
pool_name = "regtest"
block_signature = "/scryptpool/"
address = "127.0.0.1"
port = {port}
pool_difficulty = 0.000001
share_flush_interval = 1

[store]
path = "{}"

[[chains]]
name = "dogecoin"
reward_address = "{REWARD_ADDRESS}"

[[chains.nodes]]
url = "{}"
username = "user"
password = "pass"
"#,
                tempdir.path().join("store.jsonl").display(),
                daemon.url(),
            ),
        )
        .unwrap();

        let handle = CommandBuilder::new(format!("--config {} pool", config.display()))
            .env("RUST_LOG", "info")
            .tempdir(tempdir.clone())
            .spawn();

        for attempt in 0.. {
            match TcpStream::connect(("127.0.0.1", port)) {
                Ok(_) => break,
                Err(_) if attempt < 100 => thread::sleep(Duration::from_millis(50)),
                Err(err) => panic!("pool never listened on {port}: {err}"),
            }
        }

        Self {
            daemon,
            port,
            handle,
            tempdir,
        }
    }

    pub(crate) fn miner(&self) -> Miner {
        Miner::connect(self.port)
    }

    /// Store records, waiting up to a few seconds for one to satisfy `predicate`.
    pub(crate) fn wait_for_record(&self, predicate: impl Fn(&Value) -> bool) -> Vec<Value> {
        let path = self.tempdir.path().join("store.jsonl");
        let deadline = Instant::now() + Duration::from_secs(10);

        loop {
            let records = fs::read_to_string(&path)
                .unwrap_or_default()
                .lines()
                .filter_map(|line| serde_json::from_str::<Value>(line).ok())
                .collect::<Vec<Value>>();

            if records.iter().any(&predicate) || Instant::now() > deadline {
                return records;
            }

            thread::sleep(Duration::from_millis(100));
        }
    }

    pub(crate) fn terminate(mut self) -> i32 {
        nix::sys::signal::kill(
            nix::unistd::Pid::from_raw(self.handle.id().try_into().unwrap()),
            nix::sys::signal::Signal::SIGTERM,
        )
        .unwrap();

        self.handle.wait().unwrap().code().unwrap()
    }
}

impl Drop for TestPool {
    fn drop(&mut self) {
        self.handle.kill().ok();
        self.handle.wait().ok();
    }
}
