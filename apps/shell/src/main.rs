use anyhow::Context;
use clap::Parser;
use mstone::Platform;
use mstone::domain::config::AppConfig;
use mstone::kernel::config::load_config_or_default;
use mstone_shell::{BackStack, Cli, StepReport, init_logger, run};

#[mstone_runtime::main(ui_affine)]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config: AppConfig = load_config_or_default(cli.config.as_deref())
        .context("Critical: Configuration is malformed")?;
    let _log = init_logger(&config.logging, cli.log_level.as_deref())?;

    let platform = Platform::builder().config(config).build()?;
    let (stack, reports) = run(&platform, &cli.steps).await?;
    platform.shutdown().await;

    print_summary(&stack, &reports);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_summary(stack: &BackStack, reports: &[StepReport]) {
    for report in reports {
        println!("{report}");
    }
    let trail: Vec<String> = stack.routes().iter().map(ToString::to_string).collect();
    println!("back stack: {}", trail.join(" > "));
}
