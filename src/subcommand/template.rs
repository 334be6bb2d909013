use {
    super::*,
    crate::pool::{ChainNode, build_work, fetch_templates},
};

#[derive(Debug, Parser)]
pub(crate) struct Template {
    #[arg(long, help = "Print only the raw mining.notify params.")]
    pub(crate) raw: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct Output {
    pub(crate) chain: String,
    pub(crate) height: u64,
    pub(crate) network_difficulty: f64,
    pub(crate) transactions: usize,
    pub(crate) coinbase_value: u64,
    pub(crate) aux: Option<AuxOutput>,
    pub(crate) notify: Notify,
}

#[derive(Debug, Serialize)]
pub(crate) struct AuxOutput {
    pub(crate) chain: String,
    pub(crate) height: u64,
    pub(crate) hash: String,
    pub(crate) network_difficulty: f64,
}

impl Template {
    pub(crate) async fn run(self, settings: Settings, cancel: CancellationToken) -> Result {
        let mut chains = Vec::new();

        for config in settings.chains() {
            chains.push(
                ChainNode::connect(config, settings.primary_check_interval(), cancel.clone())
                    .await
                    .with_context(|| format!("failed to connect to {}", config.name))?,
            );
        }

        let (template, aux_block) = fetch_templates(&chains).await?;

        let (work, notify) = build_work(
            &chains,
            settings.block_signature(),
            template,
            aux_block,
            JobId::new(0),
        )?;

        if self.raw {
            println!("{}", serde_json::to_string(&notify)?);
            return Ok(());
        }

        let aux = match (&work.aux_block, chains.get(1)) {
            (Some(aux_block), Some(node)) => Some(AuxOutput {
                chain: node.chain.name().into(),
                height: aux_block.height,
                hash: aux_block.hash.clone(),
                network_difficulty: aux_block.network_difficulty(node.chain.as_ref())?,
            }),
            _ => None,
        };

        let output = Output {
            chain: work.chain.name().into(),
            height: work.height(),
            network_difficulty: work.template.network_difficulty(work.chain.as_ref()),
            transactions: work.template.transactions.len(),
            coinbase_value: work.template.coinbase_value,
            aux,
            notify,
        };

        println!("{}", serde_json::to_string_pretty(&output)?);

        Ok(())
    }
}
