//! SheetPlot 命令行入口
//!
//! - `detect`：识别图纸中的图框并写入缓存
//! - `list`：显示缓存中的图框
//! - `devices`：列出打印设备和纸张
//! - `plot`：把选中的图框逐个输出为PDF

mod config;
mod selection;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use sheetplot_core::prelude::*;
use sheetplot_file::{DxfDocument, FrameCache};
use sheetplot_plot::{LayoutConfig, PdfPlotter, PlotDevice, PlotOrchestrator, RunHooks, RunReport};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::{Config, PlotConfig};
use crate::selection::{parse_sheets, select_frames};

/// 日志过滤环境变量
const LOG_ENV: &str = "SHEETPLOT_LOG";

#[derive(Parser, Debug)]
#[command(name = "sheetplot", version, about = "Detect drawing frames and plot them to PDF")]
struct Cli {
    /// 配置文件（默认读取当前目录的 sheetplot.toml）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 识别图框并写入缓存
    Detect {
        drawing: PathBuf,
        #[arg(long)]
        cache: Option<PathBuf>,
    },
    /// 显示缓存中的图框
    List {
        #[arg(long)]
        cache: Option<PathBuf>,
    },
    /// 列出打印设备和纸张
    Devices,
    /// 输出选中的图框
    Plot(PlotArgs),
}

#[derive(Args, Debug)]
struct PlotArgs {
    drawing: PathBuf,
    /// 图框序号，例如 1,3-5
    #[arg(long, conflicts_with = "all")]
    sheets: Option<String>,
    /// 输出全部图框（默认）
    #[arg(long)]
    all: bool,
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long)]
    device: Option<String>,
    #[arg(long)]
    cache: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    // 初始化日志
    let level = if cli.verbose { "debug" } else { config.logging.level.as_str() };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish(),
    )?;

    info!("Starting SheetPlot...");

    match cli.command {
        Command::Detect { drawing, cache } => {
            let cache = cache.unwrap_or_else(|| config.detect.cache_file.clone());
            detect(&drawing, &cache)
        }
        Command::List { cache } => {
            let cache = cache.unwrap_or_else(|| config.detect.cache_file.clone());
            list(&cache)
        }
        Command::Devices => devices(&config),
        Command::Plot(args) => plot(args, config),
    }
}

/// 识别图框，写缓存并打印列表
fn detect(drawing: &Path, cache_path: &Path) -> Result<()> {
    let cache = detect_into_cache(&DxfDocument::open(drawing)?, drawing, cache_path)?;
    print_frames(&cache.frames);
    Ok(())
}

fn detect_into_cache(document: &DxfDocument, drawing: &Path, cache_path: &Path) -> Result<FrameCache> {
    let (frames, report) = FrameAnalyzer::new(document).detect_with_report()?;
    info!(
        "Scanned {} entities: {} candidates, {} frames, {} unreadable, {} unclassified, {} without sheet number",
        report.entities_scanned,
        report.candidates,
        frames.len(),
        report.unreadable,
        report.unclassified,
        report.unresolved_sheet_numbers
    );

    let cache = FrameCache::new(frames, Some(drawing.display().to_string()));
    cache
        .save(cache_path)
        .with_context(|| format!("writing cache {}", cache_path.display()))?;
    Ok(cache)
}

fn list(cache_path: &Path) -> Result<()> {
    let cache = FrameCache::load(cache_path)
        .with_context(|| format!("reading cache {}", cache_path.display()))?;
    print_frames(&cache.frames);
    Ok(())
}

fn print_frames(frames: &[Frame]) {
    for frame in frames {
        println!("{}", frame.display_line());
    }
    println!("total: {}", frames.len());
}

fn devices(config: &Config) -> Result<()> {
    let mut plotter = PdfPlotter::new(Vec::new()).with_units_per_mm(config.plot.units_per_mm);

    for name in plotter.device_names()? {
        let marker = if name == config.plot.device { "*" } else { " " };
        println!("{} {}", marker, name);
        plotter.configure(&LayoutConfig::window_to_fit(name.clone(), config.plot.style_sheet.clone()))?;
        for media in plotter.media_names()? {
            let (w, h) = plotter.paper_size(&media)?;
            println!("  {:<44} {:.0}x{:.0}", media, w, h);
        }
    }
    Ok(())
}

fn plot(args: PlotArgs, mut config: Config) -> Result<()> {
    if let Some(output) = args.output {
        config.plot.output_dir = output;
    }
    if let Some(device) = args.device {
        config.plot.device = device;
    }
    let cache_path = args.cache.unwrap_or_else(|| config.detect.cache_file.clone());

    let document = DxfDocument::open(&args.drawing)?;

    let cache = if cache_path.exists() {
        let cache = FrameCache::load(&cache_path)
            .with_context(|| format!("reading cache {}", cache_path.display()))?;
        let drawing = args.drawing.display().to_string();
        if cache.source.as_deref().is_some_and(|source| source != drawing) {
            warn!("Cache {} was created from another drawing", cache_path.display());
        }
        cache
    } else {
        info!("No cache at {}, detecting frames", cache_path.display());
        detect_into_cache(&document, &args.drawing, &cache_path)?
    };

    let frames = match args.sheets.as_deref() {
        Some(spec) if !args.all => {
            let last_index = cache.frames.iter().map(Frame::sheet_index).max().unwrap_or(0);
            select_frames(&cache.frames, &parse_sheets(spec, last_index)?)?
        }
        _ => cache.frames.clone(),
    };

    let report = plot_frames(&document, &frames, &config.plot)?;
    println!("done: {}/{}", report.succeeded, report.total());
    Ok(())
}

/// 用虚拟PDF设备输出图框，每个图框打印一行日志
fn plot_frames(document: &DxfDocument, frames: &[Frame], plot: &PlotConfig) -> Result<RunReport> {
    let plotter = PdfPlotter::new(document.segments()).with_units_per_mm(plot.units_per_mm);
    let mut orchestrator = PlotOrchestrator::new(plotter, plot.settings())?;

    let mut hooks = RunHooks::new().on_log(|line| println!("{}", line));
    Ok(orchestrator.run(frames, &mut hooks))
}
