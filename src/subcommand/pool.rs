use super::*;

#[derive(Debug, Parser)]
pub(crate) struct PoolCommand {}

impl PoolCommand {
    pub(crate) async fn run(self, settings: Settings, cancel: CancellationToken) -> Result {
        let address = settings.address().to_string();
        let port = settings.port();

        let listener = TcpListener::bind((address.as_str(), port))
            .await
            .with_context(|| format!("failed to listen on {address}:{port}"))?;

        let pool = Pool::connect(settings, cancel).await?;

        pool.run(listener).await
    }
}
