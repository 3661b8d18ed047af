use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use glam::Vec2;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

use ifc_picker::config::ViewerConfig;
use ifc_picker::export::{export_types_csv, export_types_json, properties_json, ModelSummary};
use ifc_picker::parser::StepEngine;
use ifc_picker::pick::Viewport;
use ifc_picker::session::Session;
use ifc_picker::ui::App;

#[derive(Parser, Debug)]
#[command(name = "ifc-picker")]
#[command(about = "IFC Picker - point at building elements and inspect their properties")]
#[command(version)]
struct Args {
    /// IFC files to load
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// JSON viewer configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Resolve one pointer position and print the inspector JSON
    #[arg(long, value_name = "X,Y", value_parser = parse_pair::<','>)]
    pick: Option<(f32, f32)>,

    /// Viewport size for --pick (defaults to the config value)
    #[arg(long, value_name = "WxH", value_parser = parse_pair::<'x'>)]
    viewport: Option<(f32, f32)>,

    /// Export the type summary to CSV
    #[arg(long, value_name = "FILE")]
    types_csv: Option<PathBuf>,

    /// Export the type summary to JSON
    #[arg(long, value_name = "FILE")]
    types_json: Option<PathBuf>,

    /// Write logs to this file while the terminal viewer is running
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn is_headless(&self) -> bool {
        self.pick.is_some() || self.types_csv.is_some() || self.types_json.is_some()
    }
}

fn parse_pair<const SEP: char>(s: &str) -> Result<(f32, f32), String> {
    let (a, b) = s
        .split_once(SEP)
        .ok_or_else(|| format!("expected two numbers separated by '{SEP}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f32>()
            .map_err(|e| format!("'{v}': {e}"))
    };
    Ok((parse(a)?, parse(b)?))
}

fn init_logging(args: &Args) -> Result<()> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if args.is_headless() {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    } else if let Some(path) = &args.log_file {
        // The terminal owns stdout and stderr, so logs only go to a file
        let file = File::create(path)
            .wrap_err_with(|| format!("cannot create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
    Ok(())
}

fn load_session(args: &Args, config: &ViewerConfig) -> Result<Session<StepEngine>> {
    let mut session = Session::with_config(Arc::new(StepEngine::new()), config);
    for path in &args.files {
        let bytes =
            std::fs::read(path).wrap_err_with(|| format!("cannot read {}", path.display()))?;
        session
            .load_model(&bytes, &display_name(path))
            .wrap_err_with(|| format!("cannot load {}", path.display()))?;
    }
    Ok(session)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    init_logging(&args)?;

    let config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    let runtime = tokio::runtime::Runtime::new()?;
    let mut session = load_session(&args, &config)?;

    let summaries: Vec<ModelSummary> = session
        .models()
        .map(|(_, model)| ModelSummary::new(model.name.clone(), &model.index))
        .collect();

    if let Some(csv_path) = &args.types_csv {
        export_types_csv(&summaries, csv_path)?;
        println!("Exported to CSV: {}", csv_path.display());
    }

    if let Some(json_path) = &args.types_json {
        export_types_json(&summaries, json_path)?;
        println!("Exported to JSON: {}", json_path.display());
    }

    if let Some((x, y)) = args.pick {
        let (width, height) = args
            .viewport
            .unwrap_or((config.viewport.width, config.viewport.height));
        session.set_viewport(Viewport::sized(width, height));

        let Some(request) = session.clicked(Vec2::new(x, y)) else {
            return Err(eyre!("no element at {x},{y}"));
        };
        let outcome = runtime.block_on(request.run());
        let properties = outcome.result?;
        println!("{}", properties_json(&properties)?);
        return Ok(());
    }

    if args.is_headless() {
        return Ok(());
    }

    let mut terminal = ratatui::init();
    execute!(terminal.backend_mut(), EnableMouseCapture)?;
    let result = App::new(session, runtime.handle().clone()).run(terminal);
    execute!(std::io::stdout(), DisableMouseCapture)?;
    ratatui::restore();
    result
}
