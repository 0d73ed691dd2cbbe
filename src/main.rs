use anyhow::{Result, bail};
use clap::Parser;
use dotenv::dotenv;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use xforms_server::{Config, FormServer, config::parse_allowed_types};

#[derive(Debug, Parser)]
#[command(
    name = "xforms-server",
    about = "Serves xform definitions and stores submitted form data",
    version
)]
struct Args {
    /// Directory where submitted xforms data is stored.
    #[arg(
        short = 'd',
        long = "data_dir",
        value_name = "DIR",
        default_value = "data",
        env = "XFORMS_DATA_DIR"
    )]
    data_dir: PathBuf,

    /// Directory where broadcasted xforms are stored.
    #[arg(
        short = 'f',
        long = "forms_dir",
        value_name = "DIR",
        default_value = "forms",
        env = "XFORMS_FORMS_DIR"
    )]
    forms_dir: PathBuf,

    /// Comma-separated list of allowed file types.
    #[arg(
        short = 'x',
        long = "allowed_file_types",
        value_name = "LIST",
        default_value = "xml,jpg,png",
        env = "XFORMS_ALLOWED_FILE_TYPES"
    )]
    allowed_file_types: String,

    /// Port on which the server should listen.
    #[arg(short = 'p', long, value_name = "INT", default_value_t = 80, env = "XFORMS_PORT")]
    port: u16,

    /// Number of worker threads serving requests.
    #[arg(long, value_name = "N", default_value_t = 4, env = "XFORMS_THREADS")]
    threads: usize,
}

impl Args {
    fn into_config(self) -> Result<Config> {
        let allowed_types = parse_allowed_types(&self.allowed_file_types);

        if allowed_types.is_empty() {
            bail!("No usable entries in allowed file types {:?}", self.allowed_file_types);
        }

        if self.threads == 0 {
            bail!("Thread count must be at least 1");
        }

        Ok(Config {
            data_dir: self.data_dir,
            forms_dir: self.forms_dir,
            allowed_types,
            port: self.port,
            threads: self.threads,
        })
    }
}

fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Args::parse().into_config()?;
    config.ensure_dirs()?;

    FormServer::bind(config)?.run()
}
