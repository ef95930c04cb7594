use clap::Parser;
use evaluation::predict::{run_predict, PredictArgs};

fn main() -> anyhow::Result<()> {
    cli_support::init_tracing();
    let args = PredictArgs::parse();
    let out = run_predict(args)?;
    println!(
        "wrote {} and {} (mean entropy {:.4})",
        out.pred_overlay.display(),
        out.entropy.display(),
        out.mean_entropy
    );
    Ok(())
}
