use std::sync::Arc;

use clap::Parser;

use ratefire::args::CliArgs;
use ratefire::config::{LoadPlan, apply_overrides, load_config};
use ratefire::error::{AppError, AppResult};
use ratefire::generator::GeneratorRegistry;
use ratefire::http::RequestExecutor;
use ratefire::report;
use ratefire::scheduler::LoadScheduler;
use ratefire::selector::TargetSelector;

pub(crate) fn run() -> AppResult<()> {
    let args = CliArgs::parse();

    crate::logger::init_logging(args.verbose, args.no_color);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(&args))
}

async fn run_async(args: &CliArgs) -> AppResult<()> {
    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, args.overrides());

    let plan = LoadPlan::from_config(&config).map_err(AppError::config)?;
    let registry =
        GeneratorRegistry::from_definitions(&config.parameter_generators).map_err(AppError::config)?;
    tracing::debug!(
        generators = registry.len(),
        endpoints = plan.endpoints.len(),
        "Prepared load plan"
    );

    let selector = TargetSelector::new(
        plan.selection,
        plan.endpoint_names(),
        plan.base_urls.clone(),
        &plan.weights,
    )?;
    let executor =
        RequestExecutor::new(Arc::new(registry), plan.request_timeout).map_err(AppError::http)?;

    let mut scheduler = LoadScheduler::new(plan, selector, executor);
    let summary = scheduler.run().await?;

    let rendered = report::render(&summary, args.format, !args.no_color)?;
    println!("{}", rendered);
    Ok(())
}
