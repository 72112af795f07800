use anyhow::{Context, Result};
use log::LevelFilter;
use std::fs;
use std::io::{self, Write};
use tracdown::{Config, Converter, GiteaTarget, LookupTables, TracEnvironment};

/// Loads lookup tables, or empty tables when none were given.
fn load_tables(config: &Config) -> Result<LookupTables> {
    match &config.lookup {
        Some(path) => LookupTables::load(path),
        None => {
            log::info!("no lookup tables given, ticket and milestone links stay unresolved");
            Ok(LookupTables::default())
        }
    }
}

fn main() -> Result<()> {
    let config = Config::parse();

    // RUST_LOG overrides the Info default; --verbose overrides both
    let mut logger = env_logger::Builder::new();
    logger.filter_level(LevelFilter::Info).parse_default_env();
    if config.verbose {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    config.validate().context("Invalid configuration")?;
    let context = config.context()?;

    let text = fs::read_to_string(&config.input)
        .with_context(|| format!("Failed to read {}", config.input.display()))?;

    let tables = load_tables(&config)?;
    let source = TracEnvironment::new(&config.trac_root, &tables);
    log::debug!("reading Trac files from {}", source.root().display());
    let destination = GiteaTarget::new(
        config.root_url.as_str(),
        config.owner.as_str(),
        config.repo.as_str(),
        &config.wiki_dir,
        tables,
    );

    let converter = Converter::new(&source, &destination);
    let markdown = converter.convert(&context, &text)?;

    match &config.output {
        Some(path) => {
            fs::write(path, &markdown)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("converted {} to {}", context, path.display());
        }
        None => {
            io::stdout()
                .write_all(markdown.as_bytes())
                .context("Failed to write standard output")?;
        }
    }

    Ok(())
}
