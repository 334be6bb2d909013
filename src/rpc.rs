use super::*;

pub const RPC_REQUEST_ID: u64 = 1219;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AddressInfo {
    #[serde(rename = "isvalid", default)]
    pub is_valid: bool,
    #[serde(rename = "scriptPubKey", default)]
    pub script_pub_key: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BlockchainInfo {
    pub chain: String,
    pub difficulty: f64,
    #[serde(default)]
    pub blocks: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BlockInfo {
    pub hash: String,
    #[serde(default)]
    pub confirmations: i64,
    #[serde(default)]
    pub height: u64,
    #[serde(default)]
    pub tx: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WalletTransaction {
    #[serde(default)]
    pub confirmations: i64,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub details: Vec<TransactionDetail>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TransactionDetail {
    pub category: String,
    #[serde(default)]
    pub amount: f64,
}

/// A blockchain daemon reachable over JSON-RPC.
#[async_trait]
pub trait Rpc: Send + Sync + fmt::Debug {
    fn url(&self) -> &str;

    /// Transport failures seen so far.
    fn sickness(&self) -> u64;

    async fn call(&self, method: &str, params: Value) -> Result<Value, PoolError>;

    async fn get_block_template(&self) -> Result<BlockTemplate, PoolError> {
        let method = "getblocktemplate";
        let result = self
            .call(method, json!([{ "rules": ["mweb", "segwit"] }]))
            .await?;
        decode(self.url(), method, result)
    }

    async fn create_aux_block(&self, address: &str) -> Result<AuxBlock, PoolError> {
        let method = "createauxblock";
        let result = self.call(method, json!([address])).await?;
        decode(self.url(), method, result)
    }

    async fn submit_block(&self, submission: &str) -> Result<(), PoolError> {
        let method = "submitblock";
        match self.call(method, json!([submission])).await? {
            Value::Null => Ok(()),
            rejection => Err(rejected(self.url(), method, &rejection)),
        }
    }

    async fn submit_aux_block(&self, hash: &str, auxpow: &str) -> Result<(), PoolError> {
        let method = "submitauxblock";
        match self.call(method, json!([hash, auxpow])).await? {
            Value::Bool(true) => Ok(()),
            rejection => Err(rejected(self.url(), method, &rejection)),
        }
    }

    async fn validate_address(&self, address: &str) -> Result<AddressInfo, PoolError> {
        let method = "validateaddress";
        let result = self.call(method, json!([address])).await?;
        let info: AddressInfo = decode(self.url(), method, result)?;

        if !info.is_valid || info.script_pub_key.is_empty() {
            return Err(PoolError::validation(format!(
                "{} rejected reward address `{address}`",
                self.url()
            )));
        }

        Ok(info)
    }

    async fn get_blockchain_info(&self) -> Result<BlockchainInfo, PoolError> {
        let method = "getblockchaininfo";
        let result = self.call(method, json!([])).await?;
        decode(self.url(), method, result)
    }

    async fn get_block(&self, hash: &str) -> Result<BlockInfo, PoolError> {
        let method = "getblock";
        let result = self.call(method, json!([hash])).await?;
        decode(self.url(), method, result)
    }

    async fn get_transaction(&self, txid: &str) -> Result<WalletTransaction, PoolError> {
        let method = "gettransaction";
        let result = self.call(method, json!([txid])).await?;
        decode(self.url(), method, result)
    }

    async fn get_connection_count(&self) -> Result<u64, PoolError> {
        let method = "getconnectioncount";
        let result = self.call(method, json!([])).await?;
        decode(self.url(), method, result)
    }

    async fn health_check(&self) -> bool {
        match self.get_connection_count().await {
            Ok(_) => true,
            Err(err) => {
                debug!("Health check failed: {err}");
                false
            }
        }
    }
}

fn decode<T: DeserializeOwned>(node: &str, method: &str, result: Value) -> Result<T, PoolError> {
    serde_json::from_value(result).map_err(|err| PoolError::Rpc {
        node: node.into(),
        method: method.into(),
        message: format!("unexpected result: {err}"),
    })
}

fn rejected(node: &str, method: &str, result: &Value) -> PoolError {
    PoolError::Rpc {
        node: node.into(),
        method: method.into(),
        message: format!("rejected: {result}"),
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug)]
pub struct RpcClient {
    url: Url,
    username: String,
    password: String,
    client: Client,
    sickness: AtomicU64,
}

impl RpcClient {
    pub fn new(
        url: Url,
        username: String,
        password: String,
        timeout: Duration,
    ) -> Result<Self, PoolError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|err| PoolError::Rpc {
                node: url.to_string(),
                method: String::new(),
                message: format!("failed to build http client: {err}"),
            })?;

        Ok(Self {
            url,
            username,
            password,
            client,
            sickness: AtomicU64::new(0),
        })
    }

    fn error(&self, method: &str, message: impl Into<String>) -> PoolError {
        PoolError::Rpc {
            node: self.url.to_string(),
            method: method.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl Rpc for RpcClient {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    fn sickness(&self) -> u64 {
        self.sickness.load(Ordering::Relaxed)
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, PoolError> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": RPC_REQUEST_ID,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(self.url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                self.sickness.fetch_add(1, Ordering::Relaxed);
                self.error(method, err.to_string())
            })?;

        let status = response.status();

        let body = response.text().await.map_err(|err| {
            self.sickness.fetch_add(1, Ordering::Relaxed);
            self.error(method, err.to_string())
        })?;

        let response = match serde_json::from_str::<RpcResponse>(&body) {
            Ok(response) => response,
            Err(err) if status.is_success() => {
                return Err(self.error(method, format!("malformed response: {err}")));
            }
            Err(_) => return Err(self.error(method, format!("http status {status}"))),
        };

        if let Some(error) = response.error {
            return Err(self.error(method, format!("{} (code {})", error.message, error.code)));
        }

        if !status.is_success() {
            return Err(self.error(method, format!("http status {status}")));
        }

        Ok(response.result.unwrap_or(Value::Null))
    }
}
