use clap::Parser;
use ids_forest_cli::{config::EvaluateArgs, evaluate, logging};

fn main() -> anyhow::Result<()> {
    let args = EvaluateArgs::parse();
    logging::init(args.verbose);

    evaluate::run(&args)?;
    Ok(())
}
