use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use stark_core::field::{self, Felt};
use stark_core::{
    verify_xy, CurveParameters, KeyPair, PublicKey, Signature, TypedData, VerifyResult,
};
use stark_signer::payload_builder;

#[derive(Parser, Debug)]
#[command(name = "stark-signer", about = "Hash, sign and verify StarkNet typed data")]
struct Args {
    /// pedersen_params.json to load instead of the built-in parameters
    #[arg(long, value_name = "FILE", global = true)]
    params: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::SetTrue, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the message hash of a typed-data document
    Hash {
        #[arg(long, value_name = "FILE")]
        typed_data: PathBuf,

        #[arg(long, value_name = "FELT")]
        account: Option<String>,
    },

    /// Sign a typed-data document and export the signing payload
    Sign {
        #[arg(long, value_name = "FILE")]
        typed_data: PathBuf,

        #[arg(long, value_name = "FELT")]
        account: Option<String>,

        /// Generated from the OS entropy source when omitted
        #[arg(long, value_name = "SCALAR", env = "STARK_PRIVATE_KEY")]
        private_key: Option<String>,

        #[arg(short, long, value_name = "FILE", default_value = "build/payload.json")]
        output: PathBuf,
    },

    /// Verify (r, s) over a hash against a public key
    Verify {
        #[arg(long, value_name = "FELT", required_unless_present = "payload")]
        hash: Option<String>,

        #[arg(long, value_name = "FELT", requires = "hash")]
        r: Option<String>,

        #[arg(long, value_name = "FELT", requires = "hash")]
        s: Option<String>,

        #[arg(long, value_name = "FELT", requires = "hash")]
        x: Option<String>,

        /// Recovered from x when omitted; either root is accepted
        #[arg(long, value_name = "FELT")]
        y: Option<String>,

        /// A payload written by `sign`
        #[arg(long, value_name = "FILE", conflicts_with = "hash")]
        payload: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let curve = match &args.params {
        Some(path) => {
            log::info!("loading curve parameters from {}", path.display());
            CurveParameters::from_json_file(path)
                .with_context(|| format!("Failed to load curve parameters: {}", path.display()))?
        }
        None => CurveParameters::stark(),
    };

    match args.command {
        Command::Hash {
            typed_data,
            account,
        } => {
            let typed = read_typed_data(&typed_data)?;
            let account = parse_optional_felt(account.as_deref(), "account")?;
            let hash = typed.message_hash(&curve, account.as_ref())?;
            println!("{}", field::to_hex(&hash));
        }

        Command::Sign {
            typed_data,
            account,
            private_key,
            output,
        } => sign(
            &curve,
            &typed_data,
            account.as_deref(),
            private_key.as_deref(),
            &output,
        )?,

        Command::Verify {
            hash,
            r,
            s,
            x,
            y,
            payload,
        } => {
            let valid = match payload {
                Some(path) => {
                    let payload = payload_builder::read_payload_json(&path)
                        .with_context(|| format!("Failed to read payload: {}", path.display()))?;
                    payload.verify(&curve)?.is_valid()
                }
                None => {
                    let hash = required_felt(hash.as_deref(), "hash")?;
                    let r = required_felt(r.as_deref(), "r")?;
                    let s = required_felt(s.as_deref(), "s")?;
                    let x = required_felt(x.as_deref(), "x")?;
                    let y = match parse_optional_felt(y.as_deref(), "y")? {
                        Some(y) => y,
                        None => PublicKey::from_x(x, &curve)?.coords().1,
                    };
                    verify_xy(&curve, &hash, &r, &s, &x, &y)?
                }
            };

            if valid {
                println!("valid");
            } else {
                println!("invalid");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn sign(
    curve: &CurveParameters,
    typed_data: &Path,
    account: Option<&str>,
    private_key: Option<&str>,
    output: &Path,
) -> Result<()> {
    eprintln!("[1/4] Loading key...");
    let keypair = match private_key {
        Some(text) => KeyPair::from_hex(text, curve).context("Invalid private key")?,
        None => {
            let kp = KeyPair::generate(curve)?;
            eprintln!("  generated private key {}", kp.private_key_hex());
            kp
        }
    };
    let (pk_x, pk_y) = keypair.pk.to_hex();
    eprintln!("  PK.x = {pk_x}");
    eprintln!("  PK.y = {pk_y}");

    eprintln!("[2/4] Hashing typed data {}...", typed_data.display());
    let typed = read_typed_data(typed_data)?;
    let account = parse_optional_felt(account, "account")?;
    let hash = typed.message_hash(curve, account.as_ref())?;
    eprintln!("  hash = {}", field::to_hex(&hash));

    let sig = Signature::sign(curve, &keypair, &hash)?;
    let (r, s) = sig.to_hex();
    eprintln!("  r = {r}");
    eprintln!("  s = {s}");

    eprintln!("[3/4] Verifying signature...");
    if stark_core::verify(curve, &hash, &sig, &keypair.pk)? != VerifyResult::Valid {
        bail!("freshly produced signature does not verify");
    }
    eprintln!("  signature valid");

    eprintln!("[4/4] Exporting payload JSON to {}...", output.display());
    let payload =
        payload_builder::build_signing_payload(curve, &typed, account.as_ref(), &sig, &keypair.pk)?;
    payload_builder::export_payload_json(&payload, output)
        .with_context(|| format!("Failed to write payload: {}", output.display()))?;

    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn read_typed_data(path: &Path) -> Result<TypedData> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read typed data: {}", path.display()))?;
    TypedData::from_json_str(&text)
        .with_context(|| format!("Invalid typed data in {}", path.display()))
}

fn parse_optional_felt(text: Option<&str>, what: &str) -> Result<Option<Felt>> {
    text.map(|t| field::parse_felt(t).with_context(|| format!("Invalid {what}: {t}")))
        .transpose()
}

fn required_felt(text: Option<&str>, what: &str) -> Result<Felt> {
    match parse_optional_felt(text, what)? {
        Some(value) => Ok(value),
        None => bail!("--{what} is required"),
    }
}
