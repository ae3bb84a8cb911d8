//! Generates a signing key pair for one of the supported algorithms.
use std::{
    path::PathBuf,
    process::ExitCode,
};

use clap::Parser;
use oxigate::{
    Algorithm,
    crypto::keygen::KeypairGenerator,
};
use secrecy::ExposeSecret;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "oxigate-keygen", version)]
#[command(about = "Create private/public key pairs for JWT signing")]
struct Cli {
    /// Signing algorithm: RS256, ES256, ES256K or EdDSA
    #[arg(long)]
    algorithm: Algorithm,

    /// Directory the private key is written to
    #[arg(long, default_value = "./")]
    secret_key_path: PathBuf,

    /// Directory the public key is written to
    #[arg(long, default_value = "./")]
    public_key_path: PathBuf,

    /// Print both keys instead of writing them to files
    #[arg(long)]
    print_keys: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    println!("oxigate-keygen {}", env!("CARGO_PKG_VERSION"));
    println!("Algorithm: {}", cli.algorithm);

    let pair = match KeypairGenerator::generate(cli.algorithm) {
        Ok(pair) => pair,
        Err(err) => {
            error!(error = %err, algorithm = %cli.algorithm, "key generation failed");
            return ExitCode::FAILURE;
        }
    };

    if cli.print_keys {
        println!("\nPrivate Key:\n{}", pair.private_pem().expose_secret());
        println!("\nPublic Key:\n{}", pair.public_pem());
        return ExitCode::SUCCESS;
    }

    match pair.write(&cli.secret_key_path, &cli.public_key_path) {
        Ok((private_path, public_path)) => {
            println!("Secret Key Path: {}", private_path.display());
            println!("Public Key Path: {}", public_path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "writing key pair failed");
            ExitCode::FAILURE
        }
    }
}
