use super::*;

/// Prints every representation of a target. `VALUE` is read as compact bits when it is eight hex
/// characters, as a full target when it is sixty-four, and as a difficulty otherwise.
#[derive(Debug, Parser)]
pub(crate) struct Difficulty {
    #[arg(help = "Compact bits, hex target or difficulty.")]
    pub(crate) value: String,
    #[arg(long, default_value = "dogecoin", help = "Scale share difficulty for <CHAIN>.")]
    pub(crate) chain: String,
}

#[derive(Debug, PartialEq, Serialize)]
pub(crate) struct Output {
    pub(crate) bits: String,
    pub(crate) target: Target,
    pub(crate) difficulty: f64,
    pub(crate) share_difficulty: f64,
}

impl Difficulty {
    pub(crate) fn run(self) -> Result {
        let chain = chain::lookup(&self.chain)?;
        println!(
            "{}",
            serde_json::to_string_pretty(&convert(&self.value, chain.as_ref())?)?
        );
        Ok(())
    }
}

pub(crate) fn convert(value: &str, chain: &dyn Chain) -> Result<Output> {
    let is_hex = |s: &str| s.chars().all(|c| c.is_ascii_hexdigit());

    let target = match value.len() {
        8 if is_hex(value) => Target::from_bits(value)?,
        64 if is_hex(value) => value.parse::<Target>()?,
        _ => {
            let difficulty = value
                .parse::<f64>()
                .with_context(|| format!("`{value}` is neither bits, a target nor a difficulty"))?;
            Target::from_difficulty(difficulty)?
        }
    };

    let difficulty = target.to_difficulty();

    Ok(Output {
        bits: format!("{:08x}", target.to_compact()),
        target,
        difficulty,
        share_difficulty: difficulty * chain.share_multiplier(),
    })
}
