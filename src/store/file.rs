use {
    super::*,
    tokio::{
        fs::{self, File, OpenOptions},
        io::{AsyncWriteExt, BufWriter},
        sync::Mutex as AsyncMutex,
    },
};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "record", rename_all = "snake_case")]
enum Record {
    Share(Share),
    FoundBlock(FoundBlock),
    BlockUpdate(FoundBlock),
}

/// Append-only JSON lines. Block updates are written as new records and folded on read.
pub struct FileStore {
    path: PathBuf,
    writer: AsyncMutex<BufWriter<File>>,
    next_id: AtomicI64,
}

impl FileStore {
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        let last_id = Self::read_records(path)
            .await?
            .iter()
            .filter_map(|record| match record {
                Record::FoundBlock(block) => Some(block.id),
                _ => None,
            })
            .max()
            .unwrap_or(0);

        Ok(Self {
            path: path.into(),
            writer: AsyncMutex::new(BufWriter::new(file)),
            next_id: AtomicI64::new(last_id + 1),
        })
    }

    async fn read_records(path: &Path) -> Result<Vec<Record>> {
        let contents = match fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line)
                    .with_context(|| format!("malformed record on line {}", i + 1))
            })
            .collect()
    }

    async fn append(&self, records: &[Record]) -> Result {
        let mut writer = self.writer.lock().await;

        for record in records {
            let json = serde_json::to_string(record)?;
            writer.write_all(json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
        }

        writer.flush().await?;

        Ok(())
    }
}

#[async_trait]
impl Store for FileStore {
    async fn insert_shares(&self, shares: &[Share]) -> Result {
        let records = shares.iter().cloned().map(Record::Share).collect::<Vec<_>>();
        self.append(&records).await
    }

    async fn insert_found_block(&self, block: &FoundBlock) -> Result<i64> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let mut block = block.clone();
        block.id = id;

        self.append(&[Record::FoundBlock(block)]).await?;

        Ok(id)
    }

    async fn update_found_block(&self, block: &FoundBlock) -> Result {
        ensure!(
            block.id > 0 && block.id < self.next_id.load(Ordering::SeqCst),
            "no block with id {} to update",
            block.id
        );

        self.append(&[Record::BlockUpdate(block.clone())]).await
    }

    async fn pending_blocks(&self, pool_id: &str) -> Result<Vec<FoundBlock>> {
        let _writer = self.writer.lock().await;

        let mut blocks = BTreeMap::new();

        for record in Self::read_records(&self.path).await? {
            match record {
                Record::FoundBlock(block) | Record::BlockUpdate(block) => {
                    blocks.insert(block.id, block);
                }
                Record::Share(_) => {}
            }
        }

        Ok(blocks
            .into_values()
            .filter(|block| block.pool_id == pool_id && block.status == BlockStatus::Pending)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq};

    fn found_block(pool_id: &str) -> FoundBlock {
        FoundBlock {
            id: 0,
            pool_id: pool_id.into(),
            chain: "litecoin".into(),
            block_height: 2_500_000,
            network_difficulty: 12_345_678.0,
            status: BlockStatus::Pending,
            kind: "Primary".into(),
            confirmation_progress: 0.0,
            effort: 0.0,
            transaction_confirmation_data: "ab".repeat(32),
            miner: "LVg2kJoFNg45Nbpy53h7Fe1wKyeXVRhMH9".into(),
            reward: 0.0,
            hash: "cd".repeat(32),
            created: Utc::now(),
        }
    }

    fn share() -> Share {
        Share {
            pool_id: "scrypt".into(),
            block_height: 2_500_000,
            miner: "LVg2kJoFNg45Nbpy53h7Fe1wKyeXVRhMH9".into(),
            worker: "rig1".into(),
            user_agent: "cgminer/4.10".into(),
            difficulty: 65536.0,
            network_difficulty: 1e7,
            ip_address: "127.0.0.1".into(),
            created: Utc::now(),
        }
    }

    #[tokio::test]
    async fn found_blocks_fold_updates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.jsonl");

        let store = FileStore::open(&path).await.unwrap();

        store.insert_shares(&[share(), share()]).await.unwrap();

        let first = store.insert_found_block(&found_block("scrypt")).await.unwrap();
        let second = store.insert_found_block(&found_block("scrypt")).await.unwrap();
        store.insert_found_block(&found_block("other")).await.unwrap();

        assert_eq!((first, second), (1, 2));

        let mut confirmed = found_block("scrypt");
        confirmed.id = first;
        confirmed.status = BlockStatus::Confirmed;
        confirmed.confirmation_progress = 1.0;
        store.update_found_block(&confirmed).await.unwrap();

        let pending = store.pending_blocks("scrypt").await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, second);

        drop(store);

        let reopened = FileStore::open(&path).await.unwrap();
        assert_eq!(
            reopened.insert_found_block(&found_block("scrypt")).await.unwrap(),
            4
        );
        assert_eq!(reopened.pending_blocks("scrypt").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_unknown_block_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(&dir.path().join("nested/store.jsonl"))
            .await
            .unwrap();

        let mut block = found_block("scrypt");
        block.id = 7;

        assert!(store.update_found_block(&block).await.is_err());
    }

    #[tokio::test]
    async fn shares_are_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.jsonl");
        let store = FileStore::open(&path).await.unwrap();

        store.insert_shares(&[share()]).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let line = serde_json::from_str::<Value>(contents.trim()).unwrap();

        assert_eq!(line["record"], "share");
        assert_eq!(line["worker"], "rig1");
        assert_eq!(line["difficulty"], 65536.0);
    }
}
