use std::path::PathBuf;
use std::process;

use clap::Parser;

use cfssl_newcert_lib::{RunOptions, ca::CaConfig, ca::IssueError, csr::ValidationError, run};

#[derive(Parser, Debug)]
#[command(version, about = "Request a new certificate from a CFSSL CA")]
struct Args {
    /// The json file containing the csr.
    #[arg(short, long)]
    csr: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let Some(csr_path) = args.csr else {
        eprintln!("You must specify the csr file to use for this new certificate.");
        process::exit(1);
    };

    let options = RunOptions::new(csr_path, CaConfig::from_env());
    match run(&options) {
        Ok(written) => {
            for path in written.paths() {
                println!("{}", path.display());
            }
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            process::exit(exit_code(&err));
        }
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<ValidationError>().is_some() {
        return 2;
    }
    match err.downcast_ref::<IssueError>() {
        Some(IssueError::Transport(_)) => 3,
        Some(IssueError::Service { .. }) => 4,
        Some(IssueError::Client(_)) | None => 1,
    }
}
