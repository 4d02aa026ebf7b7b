use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use apidocs_plugin::{
    ActionContext, Plugin, PluginError, PluginInitContext, Query, SettingPanel, SettingProvider,
    SpecialKeyState,
};
use apidocs_plugin_revit::RevitApiSearch;
use apidocs_plugin_revit::client::SearchClient;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use xdg::BaseDirectories;

#[derive(Parser, Debug)]
#[command(version, about = "Search the Revit API documentation", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Directory holding settings.json
    #[arg(long, env = "APIDOCS_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Browser executable used to open results
    #[arg(long, env = "BROWSER", global = true)]
    browser: Option<PathBuf>,

    /// Documentation site to query
    #[arg(long, env = "APIDOCS_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search the documentation
    Search {
        /// The search terms
        #[arg(required = true)]
        terms: Vec<String>,

        /// Open the Nth result (1-based)
        #[arg(long, value_name = "N")]
        open: Option<usize>,

        /// Open in a new window instead of a new tab, as if Ctrl were held
        #[arg(long, requires = "open")]
        ctrl: bool,
    },
    /// Show or change the default documentation version
    Settings {
        /// Label ("R2025"), version ("2025") or 1-based position to select
        #[arg(long, value_name = "CHOICE")]
        select: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut plugin = match &args.base_url {
        Some(url) => RevitApiSearch::with_client(
            SearchClient::with_base_url(url).with_context(|| format!("Invalid base URL {url}"))?,
        ),
        None => RevitApiSearch::new().context("Failed to create HTTP client")?,
    };

    let data_directory = match args.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    debug!("Using data directory {:?}", data_directory);

    plugin
        .init(PluginInitContext {
            plugin_directory: plugin_directory(),
            data_directory,
            browser: args.browser,
        })
        .await?;

    match args.command {
        Command::Search { terms, open, ctrl } => search(&plugin, &terms, open, ctrl).await,
        Command::Settings { select } => settings(&plugin, select.as_deref()),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "apidocs_plugin={level},apidocs_plugin_revit={level},{}={level}",
            env!("CARGO_CRATE_NAME")
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn default_data_dir() -> Result<PathBuf> {
    let dirs = BaseDirectories::with_prefix("apidocs")
        .context("Failed to resolve XDG base directories")?;
    Ok(dirs.get_data_home().join("revit"))
}

fn plugin_directory() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_default()
}

async fn search(
    plugin: &RevitApiSearch,
    terms: &[String],
    open: Option<usize>,
    ctrl: bool,
) -> Result<()> {
    let query = Query::new(&terms.join(" "), None);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let results = match plugin.query(&query, cancel).await {
        Ok(results) => results,
        Err(PluginError::Cancelled) => {
            eprintln!("Search cancelled");
            return Ok(());
        }
        Err(e) => return Err(e).context("Search failed"),
    };

    if results.is_empty() {
        println!("No results found for '{}'", query.search());
        return Ok(());
    }

    println!("Results for '{}' (Revit {}):", query.search(), plugin.version());
    for (i, item) in results.iter().enumerate() {
        println!("{:>3}. {}", i + 1, item.title);
        println!("     {}", item.subtitle);
        println!("     [{}]", item.autocomplete_text);
    }

    if let Some(n) = open {
        let item = n
            .checked_sub(1)
            .and_then(|i| results.get(i))
            .ok_or_else(|| anyhow!("There is no result #{n}"))?;
        let context = ActionContext {
            special_keys: SpecialKeyState {
                ctrl,
                ..Default::default()
            },
        };
        item.activate(&context);
    }

    Ok(())
}

fn settings(plugin: &RevitApiSearch, select: Option<&str>) -> Result<()> {
    let mut panel = plugin.create_setting_panel();

    if let Some(choice) = select {
        let index = resolve_choice(&panel.choices(), choice)
            .ok_or_else(|| anyhow!("Unknown choice '{choice}'"))?;
        panel.select(index)?;
    }

    print_panel(panel.as_ref());
    Ok(())
}

/// Matches a label exactly, a label without its non-numeric prefix, or a
/// 1-based position.
fn resolve_choice(choices: &[String], choice: &str) -> Option<usize> {
    let choice = choice.trim();
    choices
        .iter()
        .position(|label| {
            label == choice || label.trim_start_matches(|c: char| !c.is_ascii_digit()) == choice
        })
        .or_else(|| {
            choice
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .filter(|i| *i < choices.len())
        })
}

fn print_panel(panel: &dyn SettingPanel) {
    println!("{}:", panel.title());
    let selected = panel.selected_index();
    for (i, label) in panel.choices().iter().enumerate() {
        let marker = if i == selected { '*' } else { ' ' };
        println!(" {marker} {}. {label}", i + 1);
    }
}
