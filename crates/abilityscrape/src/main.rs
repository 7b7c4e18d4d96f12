use std::fs;
use std::path::{Path, PathBuf};

use abilityscrape_core::config::{DEFAULT_CONFIG_FILENAME, ScrapeConfig, load_config};
use abilityscrape_core::driver::{pause, scrape_fight, scrape_single_page};
use abilityscrape_core::matcher::extract_abilities_from_html;
use abilityscrape_core::model::{FightScrapeResult, PageScrapeResult};
use abilityscrape_core::observer::TracingObserver;
use abilityscrape_core::output::{
    full_output_path, read_fight_result, single_output_path, write_json_pretty,
};
use abilityscrape_core::report_url::{PageType, ReportTarget};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use tracing_subscriber::filter::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "abilityscrape",
    version,
    about = "Scrape ability ids and names from combat-log report pages"
)]
struct Cli {
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(short, long, global = true, help = "Log debug events")]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Scrape every page type of a fight and write both JSON artifacts")]
    Scrape(ScrapeArgs),
    #[command(about = "Scrape a single report page URL")]
    Page(PageArgs),
    #[command(about = "Run the ability matcher over a local HTML file")]
    Extract(ExtractArgs),
    #[command(about = "Print the report page URLs for a fight")]
    Url(UrlArgs),
    #[command(about = "Summarize a saved full-fight artifact")]
    Show(ShowArgs),
}

#[derive(Debug, Args)]
struct TargetArgs {
    report_code: String,
    fight_id: u32,
    #[arg(long, value_name = "ID")]
    source: Option<u32>,
}

impl TargetArgs {
    fn target(&self) -> Result<ReportTarget> {
        ReportTarget::new(&self.report_code, self.fight_id, self.source)
            .context("invalid report target")
    }
}

#[derive(Debug, Args)]
struct ScrapeArgs {
    #[command(flatten)]
    target: TargetArgs,
    #[arg(long, value_name = "DIR", help = "Directory for the JSON artifacts")]
    out: Option<PathBuf>,
    #[arg(long, help = "Skip the single summary page artifact")]
    skip_single: bool,
}

#[derive(Debug, Args)]
struct PageArgs {
    url: String,
    #[arg(long, value_name = "FILE", help = "Write the ability list here instead of stdout")]
    out: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    path: PathBuf,
}

#[derive(Debug, Args)]
struct UrlArgs {
    #[command(flatten)]
    target: TargetArgs,
    #[arg(long = "type", value_name = "PAGE_TYPE")]
    page_type: Option<String>,
}

#[derive(Debug, Args)]
struct ShowArgs {
    path: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Scrape(args)) => run_scrape(&load_runtime_config(&cli.config)?, args),
        Some(Commands::Page(args)) => run_page(&load_runtime_config(&cli.config)?, args),
        Some(Commands::Extract(args)) => run_extract(args),
        Some(Commands::Url(args)) => run_url(&load_runtime_config(&cli.config)?, args),
        Some(Commands::Show(args)) => run_show(args),
        None => {
            let mut command = Cli::command();
            command.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn load_runtime_config(path: &Option<PathBuf>) -> Result<ScrapeConfig> {
    let path = path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME));
    Ok(load_config(&path)?)
}

fn run_scrape(config: &ScrapeConfig, args: ScrapeArgs) -> Result<()> {
    let target = args.target.target()?;
    let output_dir = args.out.unwrap_or_else(|| config.output_dir());
    let mut observer = TracingObserver;

    println!("ability scrape");
    println!("report_code: {}", target.report_code);
    println!("fight_id: {}", target.fight_id);
    println!("source_id: {}", format_source(target.source_id));
    println!("host: {}", config.host());

    if !args.skip_single {
        let url = target.page_url(&config.host(), PageType::Summary)?;
        let page = scrape_single_page(config, &url, &mut observer)?;
        let path = single_output_path(&output_dir, &target);
        write_json_pretty(&path, &page.abilities)
            .with_context(|| format!("failed to save single page results for {url}"))?;
        println!("single.count: {}", page.count);
        println!("single.path: {}", normalize_path(&path));
        pause(config.delay());
    }

    let result = scrape_fight(config, &target, &mut observer)?;
    let path = full_output_path(&output_dir, &target);
    write_json_pretty(&path, &result).context("failed to save full fight results")?;
    println!("full.path: {}", normalize_path(&path));
    print_fight_summary(&result);
    Ok(())
}

fn run_page(config: &ScrapeConfig, args: PageArgs) -> Result<()> {
    let mut observer = TracingObserver;
    let page = scrape_single_page(config, &args.url, &mut observer)?;
    match args.out {
        Some(path) => {
            write_json_pretty(&path, &page.abilities)?;
            print_page_summary("page", &page);
            println!("page.path: {}", normalize_path(&path));
        }
        None => println!("{}", serde_json::to_string_pretty(&page)?),
    }
    Ok(())
}

fn run_extract(args: ExtractArgs) -> Result<()> {
    let html = fs::read_to_string(&args.path)
        .with_context(|| format!("failed to read {}", normalize_path(&args.path)))?;
    let abilities = extract_abilities_from_html(&html, &mut TracingObserver);
    println!("{}", serde_json::to_string_pretty(&abilities)?);
    Ok(())
}

fn run_url(config: &ScrapeConfig, args: UrlArgs) -> Result<()> {
    let target = args.target.target()?;
    let page_types = match args.page_type.as_deref() {
        Some(value) => vec![PageType::parse(value)?],
        None => config.page_types(),
    };
    for page_type in page_types {
        println!("{page_type}: {}", target.page_url(&config.host(), page_type)?);
    }
    Ok(())
}

fn run_show(args: ShowArgs) -> Result<()> {
    let result = read_fight_result(&args.path)?;
    println!("report_code: {}", result.report_code);
    println!("fight_id: {}", result.fight_id);
    println!("source_id: {}", format_source(result.source_id));
    println!("timestamp: {}", result.timestamp);
    print_fight_summary(&result);
    Ok(())
}

fn print_fight_summary(result: &FightScrapeResult) {
    println!("total_unique_abilities: {}", result.total_unique_abilities);
    for (page_type, page) in &result.pages {
        print_page_summary(page_type.as_str(), page);
    }
    if result.all_abilities.is_empty() {
        println!("abilities: <none>");
        return;
    }
    for ability in result.all_abilities.iter() {
        let pages = ability
            .found_on_pages
            .iter()
            .map(|page_type| page_type.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "ability.{}: {} (found on: {pages})",
            ability.ability_id, ability.ability_name
        );
    }
}

fn print_page_summary(prefix: &str, page: &PageScrapeResult) {
    println!("{prefix}.count: {}", page.count);
    if let Some(error) = &page.error {
        println!("{prefix}.error: {error}");
    }
    for ability in &page.abilities {
        println!(
            "{prefix}.ability: {} (ID: {})",
            ability.ability_name, ability.ability_id
        );
    }
}

fn format_source(source_id: Option<u32>) -> String {
    source_id
        .map(|value| value.to_string())
        .unwrap_or_else(|| "<none>".to_string())
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
