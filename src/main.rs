//! Contact discovery demo
//!
//! Sets up the threshold servers, signs up a few built-in users and then runs
//! discovery for the identifier and contacts given on the command line.

use anyhow::{Context, Result};
use blsdisco::{
    roster, G2Hashing, MeetingPlatform, Parameters, ThresholdServer, TrustedDealer, TrustedSetup,
    User,
};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Users already on the platform, waiting for one special guest.
const BUILT_IN_USERS: [(&str, [&str; 2]); 2] = [
    ("electra", ["arke", "thaumas"]),
    ("thaumas", ["arke", "electra"]),
];

/// Privacy preserving contact discovery
#[derive(Parser)]
#[command(name = "discovery")]
#[command(about = "Find which of your contacts already use the service")]
#[command(version)]
struct Cli {
    /// Your discovery identifier (username, mobile number, etc.)
    #[arg(short, long)]
    identifier: String,

    /// Discovery identifiers of your contacts
    #[arg(short, long, num_args = 0.., value_delimiter = ',')]
    contacts: Vec<String>,

    /// JSON file with the public parameters
    #[arg(long, env = "DISCOVERY_CONFIG")]
    config: Option<PathBuf>,

    /// Number of threshold servers
    #[arg(short = 'n', long, env = "DISCOVERY_SERVERS")]
    servers: Option<usize>,

    /// Signature shares needed to recover a key (t-of-n)
    #[arg(short, long, env = "DISCOVERY_THRESHOLD")]
    threshold: Option<usize>,

    /// Per-server request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Use the hash-to-curve suite for G2 instead of the seeded point picker
    #[arg(long)]
    hash_to_curve: bool,
}

impl Cli {
    fn parameters(&self) -> Result<Parameters> {
        let mut params = match &self.config {
            Some(path) => Parameters::from_json_file(path)
                .with_context(|| format!("loading parameters from {}", path.display()))?,
            None => Parameters::default(),
        };
        if let Some(n) = self.servers {
            params.total_servers = n;
        }
        if let Some(t) = self.threshold {
            params.threshold = t;
        }
        if let Some(ms) = self.timeout_ms {
            params = params.with_request_timeout(Duration::from_millis(ms));
        }
        if self.hash_to_curve {
            params = params.with_g2_hashing(G2Hashing::HashToCurve);
        }
        params.validate()?;
        Ok(params)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let params = cli.parameters()?;

    // 1) threshold servers, each on its own task
    let setup = TrustedDealer::random().run(&params)?;
    let servers = roster(
        setup
            .server_keys
            .into_iter()
            .map(|keys| ThresholdServer::new(keys).spawn()),
    );

    // 2) meeting points
    let platform = MeetingPlatform::new();

    // 3) built-in users
    for (identifier, contacts) in BUILT_IN_USERS {
        let mut user = User::new(identifier, contacts, &params)?;
        user.request_constraining_keys(&servers, &setup.commitments, &params)
            .await?;
        user.compute_shared_keys()?;
        user.meet_all(&platform)?;
    }
    info!(meeting_points = platform.len(), "built-in users signed up");

    // 4) discovery
    let mut user = User::new(&cli.identifier, cli.contacts.iter().cloned(), &params)?;
    println!("\nWelcome {}!\n", user.identifier());

    user.request_constraining_keys(&servers, &setup.commitments, &params)
        .await
        .context("fetching constraining keys")?;
    println!(
        "Successfully fetched your constraining keys from {} out of {} servers",
        params.threshold, params.total_servers
    );

    user.compute_shared_keys()?;
    println!(
        "Your constraining keys were used locally to derive shared secrets with your contacts. Checking meeting points..."
    );

    let found = user.meet_all(&platform)?;
    for contact in user.present_contacts() {
        println!("Your friend {} has already signed up and searched for you", contact);
    }
    println!("\nFound {} contacts", found);

    Ok(())
}
