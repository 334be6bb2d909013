use super::*;

/// TOML config file structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub pool_name: Option<String>,
    pub block_signature: Option<String>,
    pub address: Option<String>,
    pub port: Option<u16>,
    pub max_connections: Option<usize>,
    pub connection_timeout: Option<u64>,
    pub pool_difficulty: Option<f64>,
    pub share_flush_interval: Option<u64>,
    pub update_interval: Option<u64>,
    pub primary_check_interval: Option<u64>,
    pub unlock_interval: Option<u64>,
    pub malformed_limit: Option<u32>,
    pub chains: Vec<ChainConfig>,
    pub store: Option<StoreSection>,
}

/// One blockchain. The first configured chain is mined directly, the second is merge-mined.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    pub name: String,
    pub reward_address: String,
    #[serde(default)]
    pub block_notify_url: Option<String>,
    pub nodes: Vec<NodeConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "NodeConfig::default_timeout")]
    pub timeout: u64,
}

impl NodeConfig {
    fn default_timeout() -> u64 {
        10
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSection {
    pub database_url: Option<String>,
    pub path: Option<PathBuf>,
}

/// Unified settings struct with all resolved configuration
#[derive(Debug, Clone, Default, Serialize)]
pub struct Settings {
    pub config: Option<PathBuf>,
    pub config_dir: Option<PathBuf>,

    pub pool_name: Option<String>,
    pub block_signature: Option<String>,
    pub address: Option<String>,
    pub port: Option<u16>,
    pub max_connections: Option<usize>,
    pub connection_timeout: Option<u64>,
    pub pool_difficulty: Option<f64>,
    pub share_flush_interval: Option<u64>,
    pub update_interval: Option<u64>,
    pub primary_check_interval: Option<u64>,
    pub unlock_interval: Option<u64>,
    pub malformed_limit: Option<u32>,
    pub chains: Vec<ChainConfig>,

    pub database_url: Option<String>,
    pub store_path: Option<PathBuf>,
}

impl Settings {
    /// Load settings from all sources with proper priority
    pub fn load(options: Options) -> Result<Self> {
        let mut env = BTreeMap::<String, String>::new();

        for (var, value) in std::env::vars_os() {
            let Some(var) = var.to_str() else {
                continue;
            };

            let Some(key) = var.strip_prefix("SCRYPTPOOL_") else {
                continue;
            };

            env.insert(
                key.into(),
                value.into_string().map_err(|value| {
                    anyhow!(
                        "environment variable `{var}` not valid unicode: `{}`",
                        value.to_string_lossy()
                    )
                })?,
            );
        }

        Self::merge(options, env)
    }

    /// CLI beats environment beats config file beats defaults.
    pub fn merge(options: Options, env: BTreeMap<String, String>) -> Result<Self> {
        let settings = Self::from_options(&options).or(Self::from_env(&env)?);

        let config = match Self::find_config_path(&settings) {
            Some(config_path) => toml::from_str(&fs::read_to_string(&config_path).with_context(
                || format!("failed to open config file `{}`", config_path.display()),
            )?)
            .with_context(|| {
                format!(
                    "failed to deserialize config file `{}`",
                    config_path.display()
                )
            })?,
            None => Config::default(),
        };

        let settings = settings.or(Self::from_config(&config)).or_defaults()?;

        settings.validate()?;

        Ok(settings)
    }

    fn find_config_path(settings: &Self) -> Option<PathBuf> {
        if let Some(path) = &settings.config {
            return Some(path.clone());
        }

        if let Some(dir) = &settings.config_dir {
            let path = dir.join("scryptpool.toml");
            if path.exists() {
                return Some(path);
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("scryptpool").join("scryptpool.toml");
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    pub fn from_options(options: &Options) -> Self {
        Self {
            config: options.config.clone(),
            config_dir: options.config_dir.clone(),
            address: options.address.clone(),
            port: options.port,
            max_connections: options.max_connections,
            pool_difficulty: options.pool_difficulty,
            database_url: options.database_url.clone(),
            store_path: options.store_path.clone(),
            ..Default::default()
        }
    }

    pub fn from_env(env: &BTreeMap<String, String>) -> Result<Self> {
        fn parse<T>(env: &BTreeMap<String, String>, key: &str) -> Result<Option<T>>
        where
            T: FromStr,
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            env.get(key)
                .map(|value| value.parse::<T>())
                .transpose()
                .with_context(|| {
                    format!(
                        "failed to parse environment variable SCRYPTPOOL_{key} as {}",
                        std::any::type_name::<T>()
                    )
                })
        }

        let get_string = |key: &str| env.get(key).cloned();

        let get_path = |key: &str| env.get(key).map(PathBuf::from);

        Ok(Self {
            config: get_path("CONFIG"),
            config_dir: get_path("CONFIG_DIR"),
            pool_name: get_string("POOL_NAME"),
            block_signature: get_string("BLOCK_SIGNATURE"),
            address: get_string("ADDRESS"),
            port: parse(env, "PORT")?,
            max_connections: parse(env, "MAX_CONNECTIONS")?,
            connection_timeout: parse(env, "CONNECTION_TIMEOUT")?,
            pool_difficulty: parse(env, "POOL_DIFFICULTY")?,
            share_flush_interval: parse(env, "SHARE_FLUSH_INTERVAL")?,
            update_interval: parse(env, "UPDATE_INTERVAL")?,
            primary_check_interval: parse(env, "PRIMARY_CHECK_INTERVAL")?,
            unlock_interval: parse(env, "UNLOCK_INTERVAL")?,
            malformed_limit: parse(env, "MALFORMED_LIMIT")?,
            chains: Vec::new(),
            database_url: get_string("DATABASE_URL"),
            store_path: get_path("STORE_PATH"),
        })
    }

    pub fn from_config(config: &Config) -> Self {
        let store = config.store.as_ref();

        Self {
            config: None,
            config_dir: None,
            pool_name: config.pool_name.clone(),
            block_signature: config.block_signature.clone(),
            address: config.address.clone(),
            port: config.port,
            max_connections: config.max_connections,
            connection_timeout: config.connection_timeout,
            pool_difficulty: config.pool_difficulty,
            share_flush_interval: config.share_flush_interval,
            update_interval: config.update_interval,
            primary_check_interval: config.primary_check_interval,
            unlock_interval: config.unlock_interval,
            malformed_limit: config.malformed_limit,
            chains: config.chains.clone(),
            database_url: store.and_then(|store| store.database_url.clone()),
            store_path: store.and_then(|store| store.path.clone()),
        }
    }

    pub fn or(self, other: Self) -> Self {
        Self {
            config: self.config.or(other.config),
            config_dir: self.config_dir.or(other.config_dir),
            pool_name: self.pool_name.or(other.pool_name),
            block_signature: self.block_signature.or(other.block_signature),
            address: self.address.or(other.address),
            port: self.port.or(other.port),
            max_connections: self.max_connections.or(other.max_connections),
            connection_timeout: self.connection_timeout.or(other.connection_timeout),
            pool_difficulty: self.pool_difficulty.or(other.pool_difficulty),
            share_flush_interval: self.share_flush_interval.or(other.share_flush_interval),
            update_interval: self.update_interval.or(other.update_interval),
            primary_check_interval: self
                .primary_check_interval
                .or(other.primary_check_interval),
            unlock_interval: self.unlock_interval.or(other.unlock_interval),
            malformed_limit: self.malformed_limit.or(other.malformed_limit),
            chains: if self.chains.is_empty() {
                other.chains
            } else {
                self.chains
            },
            database_url: self.database_url.or(other.database_url),
            store_path: self.store_path.or(other.store_path),
        }
    }

    fn or_defaults(self) -> Result<Self> {
        let store_path = match self.store_path {
            Some(path) => path,
            None => dirs::data_dir()
                .ok_or_else(|| anyhow!("could not get data dir"))?
                .join("scryptpool")
                .join("store.jsonl"),
        };

        Ok(Self {
            config: self.config,
            config_dir: self.config_dir,
            pool_name: Some(self.pool_name.unwrap_or_else(|| "scryptpool".into())),
            block_signature: Some(
                self.block_signature
                    .unwrap_or_else(|| "/scryptpool/".into()),
            ),
            address: Some(self.address.unwrap_or_else(|| "0.0.0.0".into())),
            port: Some(self.port.unwrap_or(3333)),
            max_connections: Some(self.max_connections.unwrap_or(10_000)),
            connection_timeout: Some(self.connection_timeout.unwrap_or(600)),
            pool_difficulty: Some(self.pool_difficulty.unwrap_or(16.0)),
            share_flush_interval: Some(self.share_flush_interval.unwrap_or(5)),
            update_interval: Some(self.update_interval.unwrap_or(30)),
            primary_check_interval: Some(self.primary_check_interval.unwrap_or(60)),
            unlock_interval: Some(self.unlock_interval.unwrap_or(600)),
            malformed_limit: Some(self.malformed_limit.unwrap_or(3)),
            chains: self.chains,
            database_url: self.database_url,
            store_path: Some(store_path),
        })
    }

    fn validate(&self) -> Result {
        ensure!(!self.chains.is_empty(), "no chains configured");

        ensure!(
            self.chains.len() <= 2,
            "at most one primary and one aux chain are supported, got {} chains",
            self.chains.len()
        );

        let mut names = HashSet::new();

        for chain in &self.chains {
            chain::lookup(&chain.name)
                .with_context(|| format!("unsupported chain `{}`", chain.name))?;

            ensure!(
                names.insert(chain.name.as_str()),
                "chain `{}` configured twice",
                chain.name
            );

            ensure!(
                !chain.reward_address.is_empty(),
                "chain `{}` has no reward address",
                chain.name
            );

            ensure!(
                !chain.nodes.is_empty(),
                "chain `{}` has no rpc nodes",
                chain.name
            );

            for node in &chain.nodes {
                Url::parse(&node.url).with_context(|| {
                    format!("invalid rpc url `{}` for chain `{}`", node.url, chain.name)
                })?;

                ensure!(
                    node.timeout > 0,
                    "rpc timeout for `{}` must be positive",
                    node.url
                );
            }
        }

        let difficulty = self.pool_difficulty();

        ensure!(
            difficulty.is_finite() && difficulty > 0.0,
            "pool difficulty must be positive, got {difficulty}"
        );

        ensure!(self.max_connections() > 0, "max connections must be positive");

        for (name, value) in [
            ("connection timeout", self.connection_timeout),
            ("share flush interval", self.share_flush_interval),
            ("update interval", self.update_interval),
            ("primary check interval", self.primary_check_interval),
            ("unlock interval", self.unlock_interval),
        ] {
            ensure!(value != Some(0), "{name} must be positive");
        }

        Ok(())
    }

    pub fn pool_name(&self) -> &str {
        self.pool_name.as_deref().unwrap_or("scryptpool")
    }

    pub fn block_signature(&self) -> &[u8] {
        self.block_signature.as_deref().unwrap_or_default().as_bytes()
    }

    pub fn address(&self) -> &str {
        self.address.as_deref().unwrap_or("0.0.0.0")
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(3333)
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections.unwrap_or(10_000)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout.unwrap_or(600))
    }

    pub fn pool_difficulty(&self) -> f64 {
        self.pool_difficulty.unwrap_or(16.0)
    }

    pub fn share_flush_interval(&self) -> Duration {
        Duration::from_secs(self.share_flush_interval.unwrap_or(5))
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval.unwrap_or(30))
    }

    pub fn primary_check_interval(&self) -> Duration {
        Duration::from_secs(self.primary_check_interval.unwrap_or(60))
    }

    pub fn unlock_interval(&self) -> Duration {
        Duration::from_secs(self.unlock_interval.unwrap_or(600))
    }

    pub fn malformed_limit(&self) -> u32 {
        self.malformed_limit.unwrap_or(3)
    }

    pub fn chains(&self) -> &[ChainConfig] {
        &self.chains
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    pub fn store_path(&self) -> PathBuf {
        self.store_path.clone().unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use {super::*, pretty_assertions::assert_eq};

    pub(crate) const CONFIG: &str = r#"
        pool_name = "doge"
        port = 3334
        pool_difficulty = 0.5

        [[chains]]
        name = "litecoin"
        reward_address = "LM2WMpR1Rp6j3Sa59cMXMs1SPzj9eXpGc1"
        block_notify_url = "tcp://127.0.0.1:28332"

        [[chains.nodes]]
        url = "http://127.0.0.1:9332"
        username = "user"
        password = "pass"

        [[chains.nodes]]
        url = "http://10.0.0.2:9332"
        timeout = 3

        [[chains]]
        name = "dogecoin"
        reward_address = "DH5yaieqoZN36fDVciNyRueRGvGLR3mr7L"

        [[chains.nodes]]
        url = "http://127.0.0.1:22555"

        [store]
        path = "/tmp/scryptpool/store.jsonl"
    "#;

    fn config() -> Config {
        toml::from_str(CONFIG).unwrap()
    }

    #[test]
    fn settings_from_empty_env() {
        let settings = Settings::from_env(&BTreeMap::new()).unwrap();
        assert!(settings.port.is_none());
        assert!(settings.chains.is_empty());
    }

    #[test]
    fn settings_from_env() {
        let mut env = BTreeMap::new();
        env.insert("PORT".into(), "4444".into());
        env.insert("POOL_DIFFICULTY".into(), "0.25".into());
        env.insert("DATABASE_URL".into(), "postgres://pool@localhost/pool".into());

        let settings = Settings::from_env(&env).unwrap();
        assert_eq!(settings.port, Some(4444));
        assert_eq!(settings.pool_difficulty, Some(0.25));
        assert_eq!(
            settings.database_url(),
            Some("postgres://pool@localhost/pool")
        );
    }

    #[test]
    fn settings_from_env_rejects_garbage() {
        let mut env = BTreeMap::new();
        env.insert("PORT".into(), "lots".into());
        assert!(Settings::from_env(&env).is_err());
    }

    #[test]
    fn config_file_parsing() {
        let config = config();

        assert_eq!(config.pool_name.as_deref(), Some("doge"));
        assert_eq!(config.chains.len(), 2);
        assert_eq!(config.chains[0].name, "litecoin");
        assert_eq!(config.chains[0].nodes.len(), 2);
        assert_eq!(config.chains[0].nodes[0].username, "user");
        assert_eq!(config.chains[0].nodes[0].timeout, 10);
        assert_eq!(config.chains[0].nodes[1].timeout, 3);
        assert_eq!(config.chains[1].block_notify_url, None);
        assert_eq!(
            config.store.unwrap().path,
            Some("/tmp/scryptpool/store.jsonl".into())
        );
    }

    #[test]
    fn config_rejects_unknown_fields() {
        assert!(toml::from_str::<Config>("colour = \"blue\"").is_err());
        assert!(
            toml::from_str::<Config>(
                r#"
                [[chains]]
                name = "dogecoin"
                reward_address = "D"
                nodes = []
                shoe_size = 9
                "#
            )
            .is_err()
        );
    }

    #[test]
    fn settings_merge_priority() {
        let cli = Settings {
            port: Some(1),
            ..Default::default()
        };

        let env = Settings {
            port: Some(2),
            pool_difficulty: Some(2.0),
            ..Default::default()
        };

        let file = Settings::from_config(&config());

        let merged = cli.or(env).or(file).or_defaults().unwrap();
        assert_eq!(merged.port(), 1);
        assert_eq!(merged.pool_difficulty(), 2.0);
        assert_eq!(merged.pool_name(), "doge");
        assert_eq!(merged.chains().len(), 2);
        assert_eq!(merged.update_interval(), Duration::from_secs(30));
        assert_eq!(merged.block_signature(), b"/scryptpool/");
    }

    #[test]
    fn merge_reads_explicit_config_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("pool.toml");
        fs::write(&path, CONFIG).unwrap();

        let settings = Settings::merge(
            Options {
                config: Some(path),
                port: Some(5555),
                ..Default::default()
            },
            BTreeMap::new(),
        )
        .unwrap();

        assert_eq!(settings.port(), 5555);
        assert_eq!(settings.pool_difficulty(), 0.5);
        assert_eq!(settings.store_path(), PathBuf::from("/tmp/scryptpool/store.jsonl"));
        assert!(settings.database_url().is_none());
    }

    #[test]
    fn merge_reads_config_dir() {
        let tempdir = tempfile::tempdir().unwrap();
        fs::write(tempdir.path().join("scryptpool.toml"), CONFIG).unwrap();

        let settings = Settings::merge(
            Options {
                config_dir: Some(tempdir.path().into()),
                ..Default::default()
            },
            BTreeMap::new(),
        )
        .unwrap();

        assert_eq!(settings.port(), 3334);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(
            Settings::merge(
                Options {
                    config: Some("/nonexistent/scryptpool.toml".into()),
                    ..Default::default()
                },
                BTreeMap::new(),
            )
            .is_err()
        );
    }

    #[test]
    fn validate() {
        #[track_caller]
        fn case(settings: Settings, ok: bool) {
            assert_eq!(settings.validate().is_ok(), ok);
        }

        let good = Settings::from_config(&config()).or_defaults().unwrap();
        case(good.clone(), true);

        case(
            Settings {
                chains: Vec::new(),
                ..good.clone()
            },
            false,
        );

        let mut three = good.clone();
        three.chains.push(three.chains[0].clone());
        case(three, false);

        let mut duplicate = good.clone();
        duplicate.chains[1] = duplicate.chains[0].clone();
        case(duplicate, false);

        let mut unknown = good.clone();
        unknown.chains[0].name = "bitcoin".into();
        case(unknown, false);

        let mut no_nodes = good.clone();
        no_nodes.chains[1].nodes.clear();
        case(no_nodes, false);

        let mut bad_url = good.clone();
        bad_url.chains[1].nodes[0].url = "not a url".into();
        case(bad_url, false);

        case(
            Settings {
                pool_difficulty: Some(0.0),
                ..good.clone()
            },
            false,
        );

        case(
            Settings {
                update_interval: Some(0),
                ..good
            },
            false,
        );
    }
}
