use clap::Parser;
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod controller;
mod inputter;
mod message;
mod model;
mod ui;

use controller::Controller;
use datatable::domain::{TableError, ViewerConfig};
use datatable::export::FileSink;
use datatable::sort::Direction;
use datatable::{ViewController, loader};
use model::{Model, Status};
use ratatui::DefaultTerminal;
use ui::TableUI;

/// Browse, filter, sort and export a table of records.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// CSV, Parquet or Arrow file to open
    path: String,

    /// Rows per page
    #[arg(long, default_value_t = 10)]
    page_size: usize,

    /// Column the global filter is mirrored into
    #[arg(long)]
    search_column: Option<String>,

    /// Table title, also used as the export file name
    #[arg(long)]
    title: Option<String>,

    /// Initial global filter
    #[arg(long)]
    filter: Option<String>,

    /// Sort key as column[:asc|desc], repeat for lower priority keys
    #[arg(long = "sort", value_parser = parse_sort_key)]
    sort: Vec<(String, Direction)>,

    /// Export the filtered and sorted rows and exit
    #[arg(long)]
    export: bool,

    /// Directory exports are written to
    #[arg(long, default_value = ".")]
    export_dir: String,

    /// Log file
    #[arg(long, default_value = "datatable.log")]
    log_file: String,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_sort_key(s: &str) -> Result<(String, Direction), String> {
    // Only a trailing asc/desc is a direction, so ids may contain ':'
    let (id, direction) = match s.rsplit_once(':') {
        Some((id, dir)) if dir.eq_ignore_ascii_case("asc") => (id, Direction::Ascending),
        Some((id, dir)) if dir.eq_ignore_ascii_case("desc") => (id, Direction::Descending),
        _ => (s, Direction::Ascending),
    };
    if id.is_empty() {
        return Err(format!("missing column id in sort key {s:?}"));
    }
    Ok((id.to_string(), direction))
}

fn expand(path: &str) -> Result<PathBuf, TableError> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| TableError::LoadingFailed(e.to_string()))
}

fn init_tracing(cli: &Cli) -> Result<(), TableError> {
    let log_file = File::create(expand(&cli.log_file)?)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Arc::new(log_file)).with_ansi(false))
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run(cli: Cli) -> Result<(), TableError> {
    init_tracing(&cli)?;

    let dataset = loader::load(expand(&cli.path)?)?;
    let config = ViewerConfig::default()
        .page_size(cli.page_size)
        .searchable_column(cli.search_column.clone())
        .title(cli.title.clone().unwrap_or_else(|| dataset.name.clone()))
        .export_dir(expand(&cli.export_dir)?);
    info!("Starting with {:?}", config);

    let mut table = ViewController::new(dataset.records, dataset.columns).with_page_size(config.page_size);
    if let Some(column) = &config.searchable_column {
        table = table.with_mirror_column(column);
    }
    if let Some(query) = &cli.filter {
        table.set_global_filter(query);
    }
    for (column, direction) in &cli.sort {
        table.append_sort(column, *direction);
    }

    if cli.export {
        let mut sink = FileSink::new(config.export_dir.clone());
        return match table.export_current_view(&config.title, &mut sink)? {
            Some(outcome) => {
                println!("Exported {} rows to {}", outcome.rows, outcome.filename);
                Ok(())
            }
            None => {
                println!("Nothing to export");
                Ok(())
            }
        };
    }

    browse(&config, table)
}

fn browse(config: &ViewerConfig, table: ViewController) -> Result<(), TableError> {
    let mut model = Model::init(config, table);
    model.refresh();
    let mut ui = TableUI::new();
    let controller = Controller::new(config);

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &mut model, &mut ui, &controller);
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    model: &mut Model,
    ui: &mut TableUI,
    controller: &Controller,
) -> Result<(), TableError> {
    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(model, f))?;

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(model)? {
            model.update(message)?;
        }
    }
    Ok(())
}
