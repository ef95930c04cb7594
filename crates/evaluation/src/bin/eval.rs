use clap::Parser;
use evaluation::run::{format_summary, run_cli, EvalArgs};

fn main() -> anyhow::Result<()> {
    cli_support::init_tracing();
    let args = EvalArgs::parse();
    let report = run_cli(args)?;
    println!("{}", format_summary(&report));
    Ok(())
}
