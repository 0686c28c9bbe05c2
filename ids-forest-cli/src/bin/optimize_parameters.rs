use std::io;

use clap::Parser;
use ids_forest_cli::{config::OptimizeArgs, logging, optimize};

fn main() -> anyhow::Result<()> {
    let args = OptimizeArgs::parse();
    logging::init(args.verbose);

    let method = match args.method {
        Some(method) => method,
        None => match optimize::select_method(io::stdin().lock(), &mut io::stdout())? {
            Some(method) => method,
            None => {
                println!("Invalid choice, please select 1 or 2.");
                return Ok(());
            }
        },
    };

    optimize::run(&args, method)?;
    Ok(())
}
