use clap::Parser;
use ledger_alamgu::cli::{self, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    cli::init_logging(args.verbose());

    match args.command {
        Commands::GetAddress(args) => {
            let stdout = std::io::stdout();
            cli::get_address::run(&args, &mut stdout.lock())?
        }
    }
    Ok(())
}
