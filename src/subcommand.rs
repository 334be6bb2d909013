use super::*;

pub(crate) mod difficulty;
pub(crate) mod pool;
pub(crate) mod template;

#[derive(Debug, Parser)]
pub(crate) enum Subcommand {
    #[command(about = "Run the merged-mining Stratum pool")]
    Pool(pool::PoolCommand),
    #[command(about = "Build one job from the configured daemons and print it")]
    Template(template::Template),
    #[command(about = "Convert between compact bits, targets and difficulty")]
    Difficulty(difficulty::Difficulty),
}

impl Subcommand {
    pub(crate) async fn run(self, options: Options, cancel: CancellationToken) -> Result {
        match self {
            Self::Pool(pool) => pool.run(Settings::load(options)?, cancel).await,
            Self::Template(template) => template.run(Settings::load(options)?, cancel).await,
            Self::Difficulty(difficulty) => difficulty.run(),
        }
    }
}
