use super::*;

mod database;
mod file;

pub use {database::DatabaseStore, file::FileStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockStatus {
    Pending,
    Confirmed,
    Orphaned,
}

impl BlockStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Orphaned => "orphaned",
        }
    }
}

impl FromStr for BlockStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "orphaned" => Ok(Self::Orphaned),
            _ => bail!("unknown block status `{s}`"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FoundBlock {
    #[serde(default)]
    pub id: i64,
    pub pool_id: String,
    pub chain: String,
    pub block_height: u64,
    pub network_difficulty: f64,
    pub status: BlockStatus,
    #[serde(rename = "type")]
    pub kind: String,
    pub confirmation_progress: f64,
    pub effort: f64,
    pub transaction_confirmation_data: String,
    pub miner: String,
    pub reward: f64,
    pub hash: String,
    pub created: DateTime<Utc>,
}

/// Where shares and found blocks are persisted.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_shares(&self, shares: &[Share]) -> Result;

    /// Returns the id assigned to the block.
    async fn insert_found_block(&self, block: &FoundBlock) -> Result<i64>;

    async fn update_found_block(&self, block: &FoundBlock) -> Result;

    async fn pending_blocks(&self, pool_id: &str) -> Result<Vec<FoundBlock>>;
}

pub async fn open(settings: &Settings) -> Result<Arc<dyn Store>> {
    if let Some(database_url) = settings.database_url() {
        let store = DatabaseStore::connect(database_url)
            .await
            .with_context(|| format!("failed to connect to database at {database_url}"))?;
        info!("Storing shares and blocks in database");
        return Ok(Arc::new(store));
    }

    let path = settings.store_path();
    let store = FileStore::open(&path)
        .await
        .with_context(|| format!("failed to open store file {}", path.display()))?;
    info!("Storing shares and blocks in {}", path.display());
    Ok(Arc::new(store))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// In-memory store whose next `failures` share inserts fail.
    #[derive(Debug, Default)]
    pub(crate) struct MemoryStore {
        pub(crate) shares: Mutex<Vec<Share>>,
        pub(crate) blocks: Mutex<Vec<FoundBlock>>,
        pub(crate) failures: AtomicU64,
    }

    #[async_trait]
    impl Store for MemoryStore {
        async fn insert_shares(&self, shares: &[Share]) -> Result {
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                bail!("store unavailable");
            }

            self.shares.lock().extend_from_slice(shares);
            Ok(())
        }

        async fn insert_found_block(&self, block: &FoundBlock) -> Result<i64> {
            let mut blocks = self.blocks.lock();
            let id = blocks.len() as i64 + 1;
            blocks.push(FoundBlock {
                id,
                ..block.clone()
            });
            Ok(id)
        }

        async fn update_found_block(&self, block: &FoundBlock) -> Result {
            let mut blocks = self.blocks.lock();
            let existing = blocks
                .iter_mut()
                .find(|existing| existing.id == block.id)
                .ok_or_else(|| anyhow!("no block with id {}", block.id))?;
            *existing = block.clone();
            Ok(())
        }

        async fn pending_blocks(&self, pool_id: &str) -> Result<Vec<FoundBlock>> {
            Ok(self
                .blocks
                .lock()
                .iter()
                .filter(|block| block.pool_id == pool_id && block.status == BlockStatus::Pending)
                .cloned()
                .collect())
        }
    }

    #[test]
    fn block_status_strings() {
        for status in [
            BlockStatus::Pending,
            BlockStatus::Confirmed,
            BlockStatus::Orphaned,
        ] {
            assert_eq!(status.as_str().parse::<BlockStatus>().unwrap(), status);
        }

        assert!("immature".parse::<BlockStatus>().is_err());
    }
}
