use std::{path::PathBuf, time::Duration};

use clap::{ArgAction, Parser};

use crate::source::scopus::ClientConfig;

pub const DEFAULT_BASE_URL: &str = "https://api.elsevier.com";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Scopus author identifiers (comma-separated)
    #[arg(long, env = "SCOPUS_AUTHOR_IDS", value_delimiter = ',', value_name = "AU-ID")]
    pub author_ids: Vec<String>,

    /// ORCID iDs, used to find author identifiers when none are given (comma-separated)
    #[arg(long, env = "ORCID_IDS", value_delimiter = ',', value_name = "ORCID")]
    pub orcids: Vec<String>,

    /// Elsevier API key
    #[arg(long, env = "SCOPUS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Elsevier institutional token
    #[arg(long, env = "SCOPUS_INST_TOKEN", hide_env_values = true)]
    pub inst_token: Option<String>,

    /// Root of the Elsevier REST API
    #[arg(long, env = "SCOPUS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Where to write the bibliography
    #[arg(short, long, env = "SCOPUS_BIB_OUTPUT", default_value = "publications.bib")]
    pub output: PathBuf,

    /// Per-request timeout, in seconds
    #[arg(long, env = "SCOPUS_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout: u64,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_key: non_blank(self.api_key.as_deref()),
            inst_token: non_blank(self.inst_token.as_deref()),
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout),
        }
    }

    /// Default filter directive for the logger, before `RUST_LOG` is considered.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
