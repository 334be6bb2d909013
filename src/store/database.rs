use {
    super::*,
    sqlx::{Pool, Postgres, Row, postgres::PgPoolOptions},
};

pub struct DatabaseStore {
    pool: Pool<Postgres>,
}

impl DatabaseStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }
}

fn to_i64(n: u64) -> Result<i64> {
    i64::try_from(n).context("value out of range for bigint")
}

#[async_trait]
impl Store for DatabaseStore {
    async fn insert_shares(&self, shares: &[Share]) -> Result {
        let mut tx = self.pool.begin().await?;

        for share in shares {
            sqlx::query(
                "INSERT INTO shares (
                    poolid, blockheight, miner, worker, useragent,
                    difficulty, networkdifficulty, ipaddress, created
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(&share.pool_id)
            .bind(to_i64(share.block_height)?)
            .bind(&share.miner)
            .bind(&share.worker)
            .bind(&share.user_agent)
            .bind(share.difficulty)
            .bind(share.network_difficulty)
            .bind(&share.ip_address)
            .bind(share.created)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn insert_found_block(&self, block: &FoundBlock) -> Result<i64> {
        let row = sqlx::query(
            "INSERT INTO blocks (
                poolid, chain, blockheight, networkdifficulty, status, type,
                transactionconfirmationdata, miner, reward, effort,
                confirmationprogress, hash, created
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id",
        )
        .bind(&block.pool_id)
        .bind(&block.chain)
        .bind(to_i64(block.block_height)?)
        .bind(block.network_difficulty)
        .bind(block.status.as_str())
        .bind(&block.kind)
        .bind(&block.transaction_confirmation_data)
        .bind(&block.miner)
        .bind(block.reward)
        .bind(block.effort)
        .bind(block.confirmation_progress)
        .bind(&block.hash)
        .bind(block.created)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("id")?)
    }

    async fn update_found_block(&self, block: &FoundBlock) -> Result {
        let rows = sqlx::query(
            "UPDATE blocks SET
                blockheight = $1, status = $2, type = $3, reward = $4,
                effort = $5, confirmationprogress = $6, hash = $7
            WHERE id = $8",
        )
        .bind(to_i64(block.block_height)?)
        .bind(block.status.as_str())
        .bind(&block.kind)
        .bind(block.reward)
        .bind(block.effort)
        .bind(block.confirmation_progress)
        .bind(&block.hash)
        .bind(block.id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        ensure!(rows == 1, "no block with id {} to update", block.id);

        Ok(())
    }

    async fn pending_blocks(&self, pool_id: &str) -> Result<Vec<FoundBlock>> {
        let rows = sqlx::query(
            "SELECT id, poolid, chain, blockheight, networkdifficulty, status, type,
                transactionconfirmationdata, miner, reward, effort,
                confirmationprogress, hash, created
            FROM blocks
            WHERE poolid = $1 AND status = 'pending'
            ORDER BY created",
        )
        .bind(pool_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(FoundBlock {
                    id: row.try_get("id")?,
                    pool_id: row.try_get("poolid")?,
                    chain: row.try_get("chain")?,
                    block_height: u64::try_from(row.try_get::<i64, _>("blockheight")?)?,
                    network_difficulty: row.try_get("networkdifficulty")?,
                    status: row.try_get::<String, _>("status")?.parse()?,
                    kind: row.try_get("type")?,
                    transaction_confirmation_data: row.try_get("transactionconfirmationdata")?,
                    miner: row.try_get("miner")?,
                    reward: row.try_get("reward")?,
                    effort: row.try_get("effort")?,
                    confirmation_progress: row.try_get("confirmationprogress")?,
                    hash: row.try_get("hash")?,
                    created: row.try_get("created")?,
                })
            })
            .collect()
    }
}
