//! dogecoin-signer - offline Dogecoin transaction tool

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;

use dogecoin_signer::utils::logging;
use dogecoin_signer::{api, EngineConfig, Network, SpendType};

#[derive(Parser, Debug)]
#[command(
    name = "dogecoin-signer",
    version,
    about = "Build, hash, sign and finalize Dogecoin transactions offline"
)]
struct Cli {
    /// JSON engine configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Network, overriding the configuration
    #[arg(long, global = true)]
    network: Option<Network>,

    /// Debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SpendArg {
    P2pkh,
    P2sh,
}

impl From<SpendArg> for SpendType {
    fn from(arg: SpendArg) -> Self {
        match arg {
            SpendArg::P2pkh => SpendType::P2pkh,
            SpendArg::P2sh => SpendType::P2sh,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Derive a private key from a BIP39 phrase
    Privkey {
        #[arg(long)]
        phrase: String,
        #[arg(long, default_value = "")]
        passphrase: String,
        /// Derive along the configured BIP44 path instead of returning the root key
        #[arg(long)]
        account: bool,
        /// Print as WIF instead of hex
        #[arg(long)]
        wif: bool,
    },
    /// Compressed public key of a private key
    Pubkey { private_key: String },
    /// P2PKH address of a public key
    Address { public_key: String },
    /// m-of-n redeem script over ordered public keys
    RedeemScript {
        #[arg(long)]
        threshold: i64,
        #[arg(required = true)]
        public_keys: Vec<String>,
    },
    /// P2SH address of a redeem script
    MultisigAddress { redeem_script: String },
    /// Compose an unsigned transaction
    RawTx {
        /// Input as TXID:VOUT, repeatable
        #[arg(long = "input", required = true)]
        inputs: Vec<String>,
        /// Output as ADDRESS:KOINU, repeatable
        #[arg(long = "output")]
        outputs: Vec<String>,
    },
    /// Append an input to a transaction
    AddInput { tx: String, txid: String, vout: u32 },
    /// Append an output to a transaction
    AddOutput { tx: String, address: String, amount: u64 },
    /// Sighash of one input
    Sighash {
        tx: String,
        txid: String,
        vout: u32,
        #[arg(long, value_enum)]
        spend_type: SpendArg,
        /// Public key (p2pkh) or redeem script (p2sh)
        script: String,
    },
    /// Sign a sighash digest
    Sign { digest: String, private_key: String },
    /// Splice a signature into an input
    Finalize {
        tx: String,
        signature: String,
        txid: String,
        vout: u32,
        #[arg(long, value_enum)]
        spend_type: SpendArg,
        /// Public key (p2pkh) or redeem script (p2sh)
        script: String,
    },
    /// Print a transaction as JSON
    Decode { tx: String },
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            EngineConfig::from_json(&text)?
        }
        None => EngineConfig::default(),
    };
    if let Some(network) = cli.network {
        config.network = network;
    }
    Ok(config)
}

fn split_pair<'a>(text: &'a str, what: &str) -> Result<(&'a str, &'a str)> {
    match text.rsplit_once(':') {
        Some(pair) => Ok(pair),
        None => bail!("{} must look like A:B, got {:?}", what, text),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        logging::enable_debug();
    }
    let config = load_config(&cli)?;
    let network = config.network.as_str();

    let output = match cli.command {
        Commands::Privkey {
            phrase,
            passphrase,
            account,
            wif,
        } => {
            let key = if account {
                api::derive_account_key(&phrase, &passphrase, &config.derivation_path)?
            } else {
                api::derive_root_key(&phrase, &passphrase)?
            };
            if wif {
                api::private_key_to_wif(&key, network)?
            } else {
                key
            }
        }
        Commands::Pubkey { private_key } => api::derive_public_key(&private_key)?,
        Commands::Address { public_key } => api::encode_address(&public_key, network)?,
        Commands::RedeemScript {
            threshold,
            public_keys,
        } => {
            let keys: Vec<&str> = public_keys.iter().map(String::as_str).collect();
            api::build_redeem_script(&keys, threshold)?
        }
        Commands::MultisigAddress { redeem_script } => {
            api::encode_multisig_address(&redeem_script, network)?
        }
        Commands::RawTx { inputs, outputs } => {
            let mut txids = Vec::new();
            let mut vouts = Vec::new();
            for input in &inputs {
                let (txid, vout) = split_pair(input, "input")?;
                txids.push(txid);
                vouts.push(vout.parse::<u32>().with_context(|| format!("vout in {:?}", input))?);
            }
            let mut addresses = Vec::new();
            let mut amounts = Vec::new();
            for output in &outputs {
                let (address, amount) = split_pair(output, "output")?;
                addresses.push(address);
                amounts.push(amount.parse::<u64>().with_context(|| format!("amount in {:?}", output))?);
            }
            api::generate_raw_tx(&txids, &vouts, &addresses, &amounts, &config)?
        }
        Commands::AddInput { tx, txid, vout } => api::add_input(&tx, &txid, vout)?,
        Commands::AddOutput {
            tx,
            address,
            amount,
        } => api::add_output(&tx, &address, amount)?,
        Commands::Sighash {
            tx,
            txid,
            vout,
            spend_type,
            script,
        } => api::compute_sighash(&tx, &txid, vout, SpendType::from(spend_type).code(), &script)?,
        Commands::Sign {
            digest,
            private_key,
        } => api::sign(&digest, &private_key)?,
        Commands::Finalize {
            tx,
            signature,
            txid,
            vout,
            spend_type,
            script,
        } => api::finalize_input(
            &tx,
            &signature,
            &txid,
            vout,
            SpendType::from(spend_type).code(),
            &script,
        )?,
        Commands::Decode { tx } => {
            serde_json::to_string_pretty(&api::decode_transaction(&tx, network)?)?
        }
    };

    println!("{}", output);
    Ok(())
}
