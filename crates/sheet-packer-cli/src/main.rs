use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use image::{ImageReader, RgbaImage};
use serde::Deserialize;
use sheet_packer_core::compositing::{render_sheet, save_sheet};
use sheet_packer_core::{
    PackProgress, Packager, PackerOptions, Placement, Sheet, SpriteRect, to_json_array,
    to_json_hash,
};
use tracing::{error, info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "sheet-packer",
    about = "Pack a folder of images into one minimal sprite sheet",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack images into a sheet (PNG + metadata)
    Pack(PackArgs),
    /// Layout-only export (no PNG): compute placements and write metadata
    Layout(PackArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    // Input/Output
    /// Input file or directory
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Sheet base name (files will be name.png/.json)
    #[arg(short, long, default_value = "sheet", help_heading = "Input/Output")]
    name: String,
    /// YAML config file path (overrides packing options)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    // Layout
    /// Max sheet width and height
    #[arg(long, default_value_t = 4096, help_heading = "Layout")]
    max_side: u32,
    /// Allow rotation (90deg)
    #[arg(long, default_value_t = true, action=ArgAction::Set, help_heading = "Layout")]
    allow_rotation: bool,
    /// Width step of the shrink sweep; smaller is slower but tighter
    #[arg(long, default_value_t = 6, help_heading = "Layout")]
    max_width_increment: u32,

    // Search
    /// Wall-clock budget for the search (ms); the best sheet found so far is kept
    #[arg(long, help_heading = "Search")]
    time_budget: Option<u64>,
    /// Run heuristics in parallel
    #[arg(long, default_value_t = true, action=ArgAction::Set, help_heading = "Search")]
    parallel: bool,

    // Export
    /// Metadata format: json-array | json (alias) | json-hash
    #[arg(long, default_value = "json-array", help_heading = "Export")]
    metadata: String,
    /// Layout-only: compute placements and export metadata (no PNG)
    #[arg(long, default_value_t = false, help_heading = "Export")]
    layout_only: bool,
    /// Print the merged options (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
}

/// A decoded input image and the key it is exported under.
struct LoadedSprite {
    key: String,
    image: RgbaImage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    let show_progress = cli.progress && !cli.quiet;
    match &cli.command {
        Commands::Pack(args) => run_pack(args, show_progress),
        Commands::Layout(args) => {
            let mut a = args.clone();
            a.layout_only = true;
            run_pack(&a, show_progress)
        }
    }
}

fn run_pack(cli: &PackArgs, show_progress: bool) -> anyhow::Result<()> {
    let mut opts = PackerOptions {
        max_side: cli.max_side,
        allow_rotation: cli.allow_rotation,
        max_width_increment: cli.max_width_increment,
        parallel: cli.parallel,
        time_budget_ms: cli.time_budget,
        ..Default::default()
    };
    if let Some(path) = &cli.config {
        let file =
            fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        opts = y.into_options(opts);
    }
    opts.validate()?;

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&opts)?),
            _ => println!("{}", serde_json::to_string_pretty(&opts)?),
        }
        return Ok(());
    }
    // fail on a bad format before spending time on the search
    check_metadata_format(&cli.metadata)?;

    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;

    let t = Instant::now();
    let paths = gather_paths(&cli.input, &cli.include, &cli.exclude)?;
    info!(count = paths.len(), elapsed = %fmt_dur(t.elapsed()), "found images");
    if paths.is_empty() {
        warn!(input = ?cli.input, "no images found, writing an empty sheet");
    }

    let t = Instant::now();
    let loaded = load_images_with_progress(&paths, &cli.input, show_progress)?;
    info!(count = loaded.len(), elapsed = %fmt_dur(t.elapsed()), "loaded input images");

    let t = Instant::now();
    let sprites: Vec<SpriteRect<usize>> = loaded
        .iter()
        .enumerate()
        .map(|(i, s)| SpriteRect::new(i, s.image.width(), s.image.height()))
        .collect();
    let sheet = pack_with_progress(sprites, opts.clone(), show_progress)?;
    let stats = sheet.stats();
    info!(
        width = sheet.width,
        height = sheet.height,
        heuristic = ?sheet.heuristic,
        occupancy = format!("{:.2}%", stats.occupancy * 100.0),
        rotated = stats.num_rotated,
        elapsed = %fmt_dur(t.elapsed()),
        "packed"
    );

    write_outputs(cli, sheet, &loaded, &opts)?;
    Ok(())
}

/// Writes `<name>.png` (unless layout-only or the sheet is empty) and `<name>.json`.
fn write_outputs(
    cli: &PackArgs,
    sheet: Sheet<usize>,
    loaded: &[LoadedSprite],
    opts: &PackerOptions,
) -> anyhow::Result<()> {
    if !cli.layout_only {
        let png_path = cli.out_dir.join(format!("{}.png", cli.name));
        if sheet.area() == 0 {
            // a 0x0 image can't be encoded
            warn!(?png_path, "sheet is empty, skipping image");
        } else {
            let t = Instant::now();
            let canvas = render_sheet(&sheet, |&i| loaded.get(i).map(|s| &s.image));
            save_sheet(&canvas, &png_path)
                .with_context(|| format!("write {}", png_path.display()))?;
            info!(?png_path, elapsed = %fmt_dur(t.elapsed()), "wrote sheet");
        }
    }

    let sheet = with_names(sheet, loaded);
    let json_value = export_metadata(&cli.metadata, &sheet, opts)?;
    let json_path = cli.out_dir.join(format!("{}.json", cli.name));
    let json = serde_json::to_string_pretty(&json_value)?;
    fs::write(&json_path, json).with_context(|| format!("write {}", json_path.display()))?;
    info!(?json_path, sprites = sheet.placements.len(), "metadata written");
    Ok(())
}

/// Runs the search on a worker thread while the caller thread polls its progress.
fn pack_with_progress(
    sprites: Vec<SpriteRect<usize>>,
    opts: PackerOptions,
    show_progress: bool,
) -> anyhow::Result<Sheet<usize>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let progress = Arc::new(PackProgress::new());
    let packager = Packager::new(opts).with_progress(progress.clone());
    if !show_progress {
        return Ok(packager.pack(sprites)?);
    }

    let bar = ProgressBar::new(1000);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner:.green} packing [{bar:40}] {percent}% [{elapsed_precise}]")
    {
        bar.set_style(style);
    }
    let result = thread::scope(|s| {
        let worker = s.spawn(move || packager.pack(sprites));
        while !worker.is_finished() {
            bar.set_position((progress.fraction() * 1000.0) as u64);
            thread::sleep(Duration::from_millis(50));
        }
        worker.join()
    });
    bar.finish_and_clear();
    let sheet = result.map_err(|_| anyhow::anyhow!("packing thread panicked"))??;
    Ok(sheet)
}

fn check_metadata_format(format: &str) -> anyhow::Result<()> {
    match format {
        "json-array" | "json" | "json-hash" => Ok(()),
        other => anyhow::bail!("unknown metadata format: {}", other),
    }
}

fn export_metadata(
    format: &str,
    sheet: &Sheet,
    opts: &PackerOptions,
) -> anyhow::Result<serde_json::Value> {
    check_metadata_format(format)?;
    Ok(match format {
        "json-hash" => to_json_hash(sheet, opts),
        _ => to_json_array(sheet, opts),
    })
}

/// Swaps index keys for the sprites' names.
fn with_names(sheet: Sheet<usize>, loaded: &[LoadedSprite]) -> Sheet {
    let placements = sheet
        .placements
        .into_iter()
        .map(|p| Placement {
            key: loaded
                .get(p.key)
                .map(|s| s.key.clone())
                .unwrap_or_else(|| p.key.to_string()),
            x: p.x,
            y: p.y,
            width: p.width,
            height: p.height,
            rotated: p.rotated,
            sheet: p.sheet,
        })
        .collect();
    Sheet {
        width: sheet.width,
        height: sheet.height,
        heuristic: sheet.heuristic,
        placements,
    }
}

fn fmt_dur(d: Duration) -> String {
    let ms = d.as_secs_f64() * 1000.0;
    if ms >= 1.0 {
        format!("{:.1}ms", ms)
    } else {
        format!("{}us", d.as_micros())
    }
}

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("bad glob {pat:?}"))?);
    }
    Ok(Some(b.build()?))
}

fn gather_paths(
    path: &Path,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
    let inc_set = build_globset(include)?;
    let exc_set = build_globset(exclude)?;
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if !should_skip(path, inc_set.as_ref(), exc_set.as_ref()) && is_image(path) {
            list.push(path.to_path_buf());
        }
    } else {
        if !path.exists() {
            anyhow::bail!("input {} does not exist", path.display());
        }
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let p = entry.path();
            if p.is_file() && !should_skip(p, inc_set.as_ref(), exc_set.as_ref()) && is_image(p) {
                list.push(p.to_path_buf());
            }
        }
    }
    Ok(list)
}

fn should_skip(p: &Path, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if exclude.is_some_and(|ex| ex.is_match(&s)) {
        return true;
    }
    include.is_some_and(|inc| !inc.is_match(&s))
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "bmp" | "tga" | "gif")
    )
}

/// Key for `p`: its path relative to `root` with `/` separators, or the file name when
/// `root` is the file itself.
fn sprite_key(root: &Path, p: &Path) -> String {
    let rel = match p.strip_prefix(root) {
        Ok(r) if !r.as_os_str().is_empty() => r,
        _ => p.file_name().map(Path::new).unwrap_or(p),
    };
    rel.to_string_lossy().replace('\\', "/")
}

fn load_images_with_progress(
    paths: &[PathBuf],
    root: &Path,
    progress: bool,
) -> anyhow::Result<Vec<LoadedSprite>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        match load_image(p) {
            Ok(image) if image.width() == 0 || image.height() == 0 => {
                warn!(?p, "skip empty image");
            }
            Ok(image) => list.push(LoadedSprite {
                key: sprite_key(root, p),
                image,
            }),
            Err(e) => {
                error!(?p, error = %e, "skip image");
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(list)
}

fn load_image(p: &Path) -> anyhow::Result<RgbaImage> {
    let img = ImageReader::open(p)?.with_guessed_format()?.decode()?;
    Ok(img.to_rgba8())
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    max_side: Option<u32>,
    allow_rotation: Option<bool>,
    max_width_increment: Option<u32>,
    parallel: Option<bool>,
    uniform_ratio: Option<f32>,
    contact_point_budget: Option<u64>,
    time_budget_ms: Option<u64>,
}

impl YamlConfig {
    fn into_options(self, mut opts: PackerOptions) -> PackerOptions {
        if let Some(v) = self.max_side {
            opts.max_side = v;
        }
        if let Some(v) = self.allow_rotation {
            opts.allow_rotation = v;
        }
        if let Some(v) = self.max_width_increment {
            opts.max_width_increment = v;
        }
        if let Some(v) = self.parallel {
            opts.parallel = v;
        }
        if let Some(v) = self.uniform_ratio {
            opts.uniform_ratio = v;
        }
        if let Some(v) = self.contact_point_budget {
            opts.contact_point_budget = v;
        }
        if let Some(v) = self.time_budget_ms {
            opts.time_budget_ms = Some(v);
        }
        opts
    }
}
