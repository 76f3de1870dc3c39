use clap::crate_authors;
use clap::crate_description;
use clap::crate_version;
pub use clap::Parser;

const CLATTER_AUTHOR: &str = crate_authors!();
const CLATTER_VERSION: &str = crate_version!();
const CLATTER_ABOUT: &str = crate_description!();
const CLATTER_FLAG_D_SHORT: char = 'd';
const CLATTER_FLAG_D_HELP: &str = "Enable Debug logging";

#[derive(Parser, Debug)]
#[command(author = CLATTER_AUTHOR, version = CLATTER_VERSION, about = CLATTER_ABOUT)]
pub struct Args {
    #[arg(short = CLATTER_FLAG_D_SHORT, long, help = CLATTER_FLAG_D_HELP, action)]
    pub debug: bool,
    /// Roll system used when a line does not pick one
    #[arg(short, long, env = "CLATTER_SYSTEM", default_value = clatter_lib::command::DEFAULT_SYSTEM)]
    pub system: String,
    /// Seed the dice for reproducible sessions
    #[arg(long, env = "CLATTER_SEED")]
    pub seed: Option<u64>,
    /// Draw dice from random.org with this API key
    #[arg(long, env = "RANDOM_ORG_API_KEY", hide_env_values = true)]
    pub random_org_key: Option<String>,
    /// Print results as JSON
    #[arg(short, long, action)]
    pub json: bool,
}
