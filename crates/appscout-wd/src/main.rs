use anyhow::{Context, bail};
use appscout_engine::catalog::DescriptorCatalog;
use appscout_engine::config::ConfigLoader;
use appscout_engine::{ElementDescriptor, Resolver};
use appscout_wd::WebDriverSession;
use clap::Parser as ClapParser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file. Defaults to ./appscout.yaml, then ~/.appscout/config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// WebDriver endpoint, overriding the configured one
    #[arg(short = 'u', long)]
    driver_url: Option<String>,

    /// Descriptor catalog (YAML)
    #[arg(long)]
    catalog: PathBuf,

    /// Page in the catalog to resolve
    #[arg(short, long)]
    page: String,

    /// Resolve all descriptors concurrently as one batch
    #[arg(long)]
    parallel: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Descriptor names to resolve (default: every descriptor on the page)
    names: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_from(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => ConfigLoader::load_default().await?,
    };
    if let Some(url) = args.driver_url {
        config.webdriver.url = url;
    }

    let catalog = DescriptorCatalog::load_from(&args.catalog)
        .await
        .with_context(|| format!("loading {}", args.catalog.display()))?;
    let targets: Vec<(String, ElementDescriptor)> = if args.names.is_empty() {
        catalog
            .descriptors(&args.page)?
            .into_iter()
            .map(|(name, d)| (name.to_string(), d.clone()))
            .collect()
    } else {
        args.names
            .iter()
            .map(|name| -> anyhow::Result<(String, ElementDescriptor)> {
                Ok((name.clone(), catalog.descriptor(&args.page, name)?.clone()))
            })
            .collect::<anyhow::Result<_>>()?
    };

    let session = Arc::new(WebDriverSession::connect(&config.webdriver).await?);
    info!("Session ready.");
    let resolver = Resolver::from_config(session.clone(), &config);

    let failures = if args.parallel {
        let descriptors: Vec<ElementDescriptor> =
            targets.iter().map(|(_, d)| d.clone()).collect();
        match resolver.resolve_parallel(&descriptors).await {
            Ok(handles) => {
                for ((name, _), handle) in targets.iter().zip(handles) {
                    println!("ok   {} -> {}", name, handle);
                }
                0
            }
            Err(e) => {
                error!("Batch failed: {}", e);
                println!("FAIL batch: {}", e);
                1
            }
        }
    } else {
        let mut failures = 0;
        for (name, descriptor) in &targets {
            match resolver.resolve(descriptor, None).await {
                Ok(handle) => println!("ok   {} -> {}", name, handle),
                Err(e) => {
                    failures += 1;
                    println!("FAIL {}: {}", name, e);
                }
            }
        }
        failures
    };

    let report = serde_json::to_string_pretty(&resolver.counters());
    let closed = session.close().await;
    println!("{}", report?);
    closed?;

    if failures > 0 {
        bail!("{} descriptor(s) failed to resolve", failures);
    }
    Ok(())
}
