use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use recycler_finder::{
    classification::Taxonomies,
    cli::Cli,
    config::Config,
    observability,
    pipeline::{FinderPipeline, JsonExporter, report},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    std::panic::set_hook(Box::new(|panic_info| {
        let thread = std::thread::current();
        let thread_name = thread.name().unwrap_or("unnamed");
        let message = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| {
                panic_info
                    .payload()
                    .downcast_ref::<String>()
                    .map(String::as_str)
            })
            .unwrap_or("unknown panic payload");

        if let Some(location) = panic_info.location() {
            error!(
                thread = thread_name,
                file = location.file(),
                line = location.line(),
                message,
                "panic occurred"
            );
        } else {
            error!(thread = thread_name, message, "panic occurred");
        }
    }));

    let cli = Cli::parse();
    observability::init(cli.log_format, cli.default_log_level())
        .context("failed to initialize tracing")?;

    let config = cli.apply(Config::from_env().context("failed to load configuration")?);
    let locations = cli.resolve_locations()?;

    let taxonomies = match config.taxonomy_path() {
        Some(path) => Taxonomies::from_yaml_file(path)
            .with_context(|| format!("failed to load taxonomy from {}", path.display()))?,
        None => Taxonomies::builtin(),
    };

    let pipeline =
        FinderPipeline::from_config(&config, taxonomies).context("failed to build pipeline")?;
    info!(
        locations = locations.len(),
        keyword = config.search_keyword(),
        radius_meters = config.search_radius_meters().get(),
        website_scan = config.website_scan_enabled(),
        "starting run"
    );

    let summary = pipeline.run(&locations).await;

    let exporter = JsonExporter::new(config.output_dir().clone());
    let path = exporter
        .export(
            &summary.records,
            &locations,
            chrono::Local::now().naive_local(),
        )
        .await?;

    if !cli.quiet {
        print!("{}", report::render(&summary));
        println!("\nResults have been saved to {}", path.display());
    }

    Ok(())
}
