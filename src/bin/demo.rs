use padding_oracle::{AttackConfig, OracleService, PaddingOracle, PaddingOracleAttack, RemoteOracle};

use clap::Parser;

use std::error::Error;

const DEFAULT_MESSAGE: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. \
    Quisque faucibus ex sapien vitae pellentesque sem placerat. In id cursus mi pretium \
    tellus duis convallis. Tempus leo eu aenean sed diam urna tempor.";

#[derive(Parser)]
#[command(
    name = "demo",
    about = "Encrypt a message, then recover it with a CBC padding oracle attack"
)]
struct Cli {
    /// Message to encrypt; a paragraph of lorem ipsum if omitted
    message: Vec<String>,

    /// Base URL of a remote padding oracle; a local oracle is used if unset
    #[arg(long, env = "PADDING_ORACLE_URL")]
    url: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();
    let config = AttackConfig::from_env()?;

    let message = if cli.message.is_empty() {
        DEFAULT_MESSAGE.to_string()
    } else {
        cli.message.join(" ")
    };

    let cracked = match cli.url {
        Some(url) => {
            let oracle = RemoteOracle::new(url)?;
            let ciphertext = oracle.encrypt(message.as_bytes())?;
            crack(&oracle, &ciphertext, config)?
        }
        None => {
            let oracle = OracleService::from_entropy();
            let ciphertext = oracle.encrypt(message.as_bytes());
            crack(&oracle, &ciphertext, config)?
        }
    };

    if cracked != message.as_bytes() {
        return Err(format!(
            "cracked plaintext ({} bytes) does not match message ({} bytes)",
            cracked.len(),
            message.len()
        )
        .into());
    }
    println!("Message:\n{message}\n");
    println!("Cracked ciphertext:\n{}", String::from_utf8_lossy(&cracked));
    Ok(())
}

fn crack<O: PaddingOracle>(
    oracle: &O,
    ciphertext: &[u8],
    config: AttackConfig,
) -> Result<Vec<u8>, Box<dyn Error>> {
    Ok(PaddingOracleAttack::new(oracle, config).attack(ciphertext)?)
}
