use super::*;

#[derive(Clone, Default, Debug, Parser)]
pub struct Options {
    #[arg(long, help = "Load configuration from <CONFIG>.")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Load configuration from <CONFIG_DIR>/scryptpool.toml.")]
    pub config_dir: Option<PathBuf>,

    #[arg(long, help = "Listen for miners on <ADDRESS>.")]
    pub address: Option<String>,

    #[arg(long, help = "Listen for miners on <PORT>.")]
    pub port: Option<u16>,

    #[arg(long, help = "Drop connections beyond <MAX_CONNECTIONS>.")]
    pub max_connections: Option<usize>,

    #[arg(long, help = "Require shares of at least <POOL_DIFFICULTY>.")]
    pub pool_difficulty: Option<f64>,

    #[arg(long, help = "Store shares and blocks in the Postgres database at <DATABASE_URL>.")]
    pub database_url: Option<String>,

    #[arg(long, help = "Store shares and blocks as JSON lines in <STORE_PATH>.")]
    pub store_path: Option<PathBuf>,
}
