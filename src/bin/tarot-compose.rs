use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tarot_compose::{
    ArcanaCatalog, CardPipeline, ElementConfig, FitMode, FontBook, FrameJob, Prompter, Rgba8,
    Workspace, load_label_mapping, run_configure,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tarot-compose", version)]
struct Cli {
    /// Workspace root holding `images/`, `elements/` and `config/`.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Element configuration JSON (defaults to `<root>/config/elements_config.json`).
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite border, nameplate, numeral and text onto card images.
    Elements(ElementsArgs),
    /// Fit card art inside a decorative frame image.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct ElementsArgs {
    /// Process a single card from the cards directory.
    #[arg(long, conflicts_with = "all")]
    file: Option<String>,

    /// Process every card in the cards directory (the default).
    #[arg(long)]
    all: bool,

    /// Edit the element configuration interactively before processing.
    #[arg(long)]
    configure: bool,

    /// Extra directories to search for fonts.
    #[arg(long = "font-dir")]
    font_dir: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[arg(long)]
    input_dir: PathBuf,

    /// Frame image; its size becomes the output size.
    #[arg(long)]
    border: PathBuf,

    #[arg(long)]
    output_dir: PathBuf,

    /// JSON mapping of file stem to `{"name": .., "number": ..}`.
    #[arg(long)]
    mapping: Option<PathBuf>,

    /// Font name or path for the labels.
    #[arg(long)]
    font: Option<String>,

    #[arg(long, value_enum, default_value_t = ResizeChoice::Fit)]
    resize: ResizeChoice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ResizeChoice {
    Fit,
    Fill,
}

impl From<ResizeChoice> for FitMode {
    fn from(choice: ResizeChoice) -> Self {
        match choice {
            ResizeChoice::Fit => FitMode::Fit,
            ResizeChoice::Fill => FitMode::Fill,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut workspace = Workspace::at(&cli.root);
    if let Some(path) = cli.config {
        workspace = workspace.with_config_path(path);
    }
    match cli.cmd {
        Command::Elements(args) => cmd_elements(workspace, args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn cmd_elements(workspace: Workspace, args: ElementsArgs) -> anyhow::Result<()> {
    workspace.ensure_directories()?;
    let mut config = ElementConfig::load_or_default(&workspace.config_path)
        .with_context(|| format!("load config '{}'", workspace.config_path.display()))?;

    if args.configure {
        let stdin = std::io::stdin();
        let mut prompter = Prompter::new(stdin.lock(), std::io::stdout());
        if !run_configure(&mut prompter, &workspace, &mut config)? {
            return Ok(());
        }
    }

    let files = match args.file {
        Some(name) => {
            let path = workspace.cards_dir.join(&name);
            anyhow::ensure!(path.is_file(), "card '{}' not found", path.display());
            vec![name]
        }
        None => {
            let files = workspace.card_files()?;
            anyhow::ensure!(
                !files.is_empty(),
                "no card images in '{}'",
                workspace.cards_dir.display()
            );
            files
        }
    };

    let fonts = FontBook::with_dirs(&args.font_dir);
    let mut pipeline = CardPipeline::new(workspace, config, ArcanaCatalog::default(), &fonts);
    let report = pipeline.run_batch(&files);

    for failure in &report.failures {
        eprintln!("failed {}: {}", failure.filename, failure.error);
    }
    println!(
        "processed {} of {} cards",
        report.succeeded(),
        report.total()
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let labels = match &args.mapping {
        Some(path) => load_label_mapping(path)?,
        None => Default::default(),
    };
    let job = FrameJob {
        input_dir: args.input_dir,
        frame_path: args.border,
        output_dir: args.output_dir,
        labels,
        font: args.font,
        fit: args.resize.into(),
        color: Rgba8::GOLD,
    };

    let report = job.run(&FontBook::system())?;
    for failure in &report.failures {
        eprintln!("failed {}: {}", failure.filename, failure.error);
    }
    println!(
        "framed {} of {} images",
        report.written.len(),
        report.written.len() + report.failures.len()
    );
    Ok(())
}
