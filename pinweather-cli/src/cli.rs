use std::{fmt, sync::Arc, time::Duration};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use inquire::{Confirm, Password, PasswordDisplayMode, Select};
use parking_lot::Mutex;
use pinweather_core::{
    Config, Dashboard, FileStore, ForecastMode, LayoutMode, Location, LocationSearch,
    Preferences, RefreshSummary, Store, TemperatureUnit, Theme, WeatherProvider,
    config::is_valid_api_key, dashboard::SELECTION_ERROR, pinned::PinnedLocations,
    preferences::CardStates, provider_from_config, spawn_auto_refresh,
};
use tokio_util::sync::CancellationToken;

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "pinweather", version, about = "Weather for the places you care about")]
pub struct Cli {
    /// More log output on stderr (-v info, -vv debug). `RUST_LOG` wins when set.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store a WeatherAPI.com key in the config file.
    Configure,

    /// Search for locations matching a query.
    Search {
        query: String,
    },

    /// Show current weather and forecast for a location.
    Show {
        query: String,

        /// Take the first match instead of asking.
        #[arg(long)]
        first: bool,

        /// Print the snapshot as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Pin a location to the dashboard.
    Pin {
        query: String,

        #[arg(long)]
        first: bool,
    },

    /// Unpin a location by key ("Paris, France") or position.
    Unpin {
        target: String,
    },

    /// List pinned locations.
    Pins,

    /// Move a pinned location from one position to another (1-based).
    Move {
        from: usize,
        to: usize,
    },

    /// Remove all pinned locations.
    Clear {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Fetch and show weather for every pinned location.
    Refresh {
        #[arg(long)]
        json: bool,
    },

    /// Keep refreshing pinned locations until interrupted.
    Watch {
        /// Seconds between refreshes; defaults to the configured interval.
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Show or change display preferences.
    Prefs {
        /// Temperature unit: C or F.
        #[arg(long)]
        unit: Option<TemperatureUnit>,

        #[arg(long, value_enum)]
        theme: Option<ThemeArg>,

        #[arg(long, value_enum)]
        layout: Option<LayoutArg>,
    },

    /// Change how a pinned card is shown.
    Card {
        /// Location key or position.
        target: String,

        #[arg(long, conflicts_with = "expand")]
        collapse: bool,

        #[arg(long)]
        expand: bool,

        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    Light,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LayoutArg {
    Stacked,
    SideBySide,
}

impl From<LayoutArg> for LayoutMode {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Stacked => LayoutMode::Stacked,
            LayoutArg::SideBySide => LayoutMode::SideBySide,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Hourly,
    Daily,
}

impl From<ModeArg> for ForecastMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Hourly => ForecastMode::Hourly,
            ModeArg::Daily => ForecastMode::Daily,
        }
    }
}

/// Wrapper so `inquire::Select` can show a location label.
struct Choice(Location);

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2}, {:.2})", self.0.label(), self.0.lat, self.0.lon)
    }
}

impl Cli {
    pub fn default_log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }

    pub async fn run(self) -> Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure => configure(config)?,

            Command::Search { query } => {
                let provider = provider_from_config(&config)?;
                let search = LocationSearch::new(provider, config.search_debounce());
                search.set_query(query.as_str());
                let state = search.settled().await;

                if state.results.is_empty() {
                    println!("No locations found for '{query}'.");
                }
                for (i, location) in state.results.iter().enumerate() {
                    println!("{}", render::location_line(i, location));
                }
            }

            Command::Show { query, first, json } => {
                let mut dashboard = open_dashboard(&config)?;
                let location = pick_location(dashboard.provider(), &config, &query, first).await?;

                let snapshot = match dashboard.select(location).await.cloned() {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        tracing::warn!(error = %e, "selection failed");
                        bail!("{}", dashboard.error().unwrap_or(SELECTION_ERROR));
                    }
                };

                if json {
                    println!("{}", serde_json::to_string_pretty(&snapshot)?);
                } else {
                    let cards = dashboard.cards();
                    print!("{}", render::card(&snapshot, &dashboard.preferences(), Some(cards)));
                    if dashboard.is_pinned(&snapshot.key()) {
                        println!("(pinned)");
                    }
                }
            }

            Command::Pin { query, first } => {
                let mut dashboard = open_dashboard(&config)?;
                let location = pick_location(dashboard.provider(), &config, &query, first).await?;
                let key = location.key();

                if dashboard.pin(location)? {
                    println!("Pinned {key}.");
                } else {
                    println!("{key} is already pinned.");
                }
            }

            Command::Unpin { target } => {
                let store = open_store(&config)?;
                let mut pinned = PinnedLocations::load(Arc::clone(&store));
                let key = resolve_target(&pinned, &target)?;

                if !pinned.unpin(&key)? {
                    bail!("{key} is not pinned.");
                }
                CardStates::load(store).forget(&key)?;
                println!("Unpinned {key}.");
            }

            Command::Pins => {
                let pinned = PinnedLocations::load(open_store(&config)?);
                if pinned.is_empty() {
                    println!("No pinned locations. Add one with `pinweather pin <query>`.");
                }
                for (i, location) in pinned.iter().enumerate() {
                    println!("{}", render::location_line(i, location));
                }
            }

            Command::Move { from, to } => {
                let mut pinned = PinnedLocations::load(open_store(&config)?);
                pinned.reorder(position(from)?, position(to)?)?;
                for (i, location) in pinned.iter().enumerate() {
                    println!("{}", render::location_line(i, location));
                }
            }

            Command::Clear { yes } => {
                let store = open_store(&config)?;
                let mut pinned = PinnedLocations::load(Arc::clone(&store));
                if pinned.is_empty() {
                    println!("Nothing to clear.");
                    return Ok(());
                }

                let confirmed = yes
                    || Confirm::new(&format!("Unpin all {} locations?", pinned.len()))
                        .with_default(false)
                        .prompt()?;
                if !confirmed {
                    return Ok(());
                }
                pinned.clear()?;
                CardStates::load(store).clear()?;
                println!("Cleared pinned locations.");
            }

            Command::Refresh { json } => {
                let mut dashboard = open_dashboard(&config)?;
                if dashboard.pinned().is_empty() {
                    bail!("No pinned locations. Add one with `pinweather pin <query>`.");
                }
                let summary = dashboard.refresh_all().await;

                if json {
                    let snapshots: Vec<_> =
                        dashboard.pinned_cards().filter_map(|(_, snap)| snap).collect();
                    println!("{}", serde_json::to_string_pretty(&snapshots)?);
                } else {
                    print_pinned(&dashboard, &summary);
                }
            }

            Command::Watch { interval } => {
                let period = interval
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| config.refresh_interval());
                if period.is_zero() {
                    bail!("Refresh interval must be at least one second.");
                }

                let mut dashboard = open_dashboard(&config)?;
                if dashboard.pinned().is_empty() {
                    bail!("No pinned locations. Add one with `pinweather pin <query>`.");
                }
                let summary = dashboard.refresh_all().await;
                print_pinned(&dashboard, &summary);

                let dashboard = Arc::new(Mutex::new(dashboard));
                let mut auto =
                    spawn_auto_refresh(Arc::clone(&dashboard), period, CancellationToken::new());
                tracing::info!(period_secs = period.as_secs(), "watching pinned locations");

                loop {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => break,
                        summary = auto.next_summary() => match summary {
                            Some(summary) => print_pinned(&dashboard.lock(), &summary),
                            None => break,
                        },
                    }
                }
                auto.stop().await;
            }

            Command::Prefs { unit, theme, layout } => {
                let store = open_store(&config)?;
                let mut prefs = Preferences::load(store.as_ref());
                let changed = unit.is_some() || theme.is_some() || layout.is_some();

                if let Some(unit) = unit {
                    prefs.temperature_unit = unit;
                }
                if let Some(theme) = theme {
                    prefs.theme = theme.into();
                }
                if let Some(layout) = layout {
                    prefs.layout = layout.into();
                }
                if changed {
                    prefs.save(store.as_ref())?;
                }

                println!("unit:   {}", prefs.temperature_unit.symbol());
                println!("theme:  {:?}", prefs.theme);
                println!("layout: {:?}", prefs.layout);
            }

            Command::Card { target, collapse, expand, mode } => {
                let store = open_store(&config)?;
                let pinned = PinnedLocations::load(Arc::clone(&store));
                let key = resolve_target(&pinned, &target)?;
                if !pinned.is_pinned(&key) {
                    tracing::warn!(location = %key, "changing card state of an unpinned location");
                }

                let mut cards = CardStates::load(store);
                if collapse || expand {
                    cards.set_collapsed(&key, collapse)?;
                }
                if let Some(mode) = mode {
                    cards.set_forecast_mode(&key, mode.into())?;
                }

                let state = if cards.is_collapsed(&key) { "collapsed" } else { "expanded" };
                println!("{key}: {state}, {:?} forecast", cards.forecast_mode(&key));
            }
        }

        Ok(())
    }
}

fn configure(mut config: Config) -> Result<()> {
    let key = Password::new("WeatherAPI.com key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;
    let key = key.trim().to_string();

    if key.is_empty() {
        bail!("API key cannot be empty.");
    }
    if !is_valid_api_key(&key) {
        eprintln!("Warning: this does not look like a WeatherAPI.com key.");
    }

    config.api_key = Some(key);
    config.save()?;
    println!("Saved to {}", Config::config_file_path()?.display());
    Ok(())
}

fn open_store(config: &Config) -> Result<Arc<dyn Store>> {
    Ok(Arc::new(FileStore::new(config.data_dir()?)))
}

fn open_dashboard(config: &Config) -> Result<Dashboard> {
    let provider = provider_from_config(config)?;
    Ok(Dashboard::load(provider, open_store(config)?))
}

/// Search for `query` and let the user pick when there is more than one hit.
async fn pick_location(
    provider: Arc<dyn WeatherProvider>,
    config: &Config,
    query: &str,
    first: bool,
) -> Result<Location> {
    let search = LocationSearch::new(provider, config.search_debounce());
    search.set_query(query);
    let mut results = search.settled().await.results;

    match results.len() {
        0 => bail!("No locations found for '{query}'."),
        1 => Ok(results.remove(0)),
        _ if first => Ok(results.remove(0)),
        _ => {
            let choices = results.into_iter().map(Choice).collect();
            let Choice(location) = Select::new("Select a location:", choices).prompt()?;
            Ok(location)
        }
    }
}

/// 1-based position from the command line to a list index.
fn position(n: usize) -> Result<usize> {
    n.checked_sub(1).context("Positions start at 1.")
}

/// Accept either a location key or a 1-based position in the pinned list.
fn resolve_target(pinned: &PinnedLocations, target: &str) -> Result<String> {
    match target.trim().parse::<usize>() {
        Ok(n) => {
            let index = position(n)?;
            pinned
                .locations()
                .get(index)
                .map(Location::key)
                .with_context(|| format!("No pinned location at position {n}."))
        }
        Err(_) => Ok(target.trim().to_string()),
    }
}

fn print_pinned(dashboard: &Dashboard, summary: &RefreshSummary) {
    let prefs = dashboard.preferences();
    let mut cards = Vec::new();

    for (location, snapshot) in dashboard.pinned_cards() {
        match snapshot {
            Some(snapshot) => cards.push(render::card(snapshot, &prefs, Some(dashboard.cards()))),
            None => cards.push(format!("{}\n   Weather unavailable.\n", location.key())),
        }
    }

    match prefs.layout {
        LayoutMode::Stacked => {
            for card in &cards {
                println!("{card}");
            }
        }
        LayoutMode::SideBySide => {
            for pair in cards.chunks(2) {
                let right = pair.get(1).map(String::as_str).unwrap_or("");
                println!("{}", render::side_by_side(&pair[0], right));
            }
        }
    }

    if !summary.failed.is_empty() {
        eprintln!("Could not refresh: {}", summary.failed.join("; "));
    }
    println!("{}", render::last_refresh(dashboard.last_refresh()));
}
