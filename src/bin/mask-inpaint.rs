use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use mask_inpaint::mask::{circle_mask, rect_mask, save_mask, Circle, Rect};
use mask_inpaint::{CompositeMethod, MaskPipeline, PipelineOptions, PrepareResult, Workflow};

#[derive(Parser)]
#[command(
    name = "mask-inpaint",
    about = "Prepare masks and composites for mask-driven image editing",
    version,
    after_help = "Mask convention: single 8-bit channel, 255 = edit, 0 = keep.\n\
                  Set RUST_LOG for finer log control."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Build an RGBA image and alpha mask for native inpainting
    AlphaMask(PrepareArgs),
    /// Build a grayscale-zone composite for models without mask support
    Composite {
        #[command(flatten)]
        args: PrepareArgs,

        /// How to mark the masked zone
        #[arg(short, long, value_enum, default_value_t = MethodArg::Bordered)]
        method: MethodArg,

        /// Edge detector threshold (0-255)
        #[arg(short, long, default_value_t = 50)]
        threshold: u8,

        /// Border color as R,G,B
        #[arg(long, default_value = "255,0,0", value_parser = parse_color)]
        color: [u8; 3],
    },
    /// Write a rectangular mask
    RectMask {
        /// Mask width
        width: u32,
        /// Mask height
        height: u32,
        /// Rectangle left edge
        x: u32,
        /// Rectangle top edge
        y: u32,
        /// Rectangle width
        rect_width: u32,
        /// Rectangle height
        rect_height: u32,
        /// Output mask file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Write a circular mask
    CircleMask {
        /// Mask width
        width: u32,
        /// Mask height
        height: u32,
        /// Circle center column
        cx: u32,
        /// Circle center row
        cy: u32,
        /// Circle radius
        radius: u32,
        /// Output mask file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Args)]
struct PrepareArgs {
    /// Input image file or directory
    input: PathBuf,

    /// Mask image (255 = edit, 0 = keep)
    mask: PathBuf,

    /// Output directory for prepared artifacts
    #[arg(short, long, default_value = "output")]
    output: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    /// Grayscale the masked zone
    Grayscale,
    /// Grayscale the masked zone and outline it
    Bordered,
}

impl From<MethodArg> for CompositeMethod {
    fn from(m: MethodArg) -> Self {
        match m {
            MethodArg::Grayscale => CompositeMethod::Grayscale,
            MethodArg::Bordered => CompositeMethod::Bordered,
        }
    }
}

fn parse_color(s: &str) -> Result<[u8; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected R,G,B, got '{s}'"));
    }
    let mut color = [0u8; 3];
    for (c, part) in color.iter_mut().zip(&parts) {
        *c = part
            .parse()
            .map_err(|e| format!("invalid color component '{part}': {e}"))?;
    }
    Ok(color)
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        LevelFilter::Error
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match cli.command {
        Command::AlphaMask(args) => {
            let pipeline = MaskPipeline::new(PipelineOptions::default());
            run_prepare(&pipeline, &args, Workflow::Native, cli.quiet);
        }
        Command::Composite {
            args,
            method,
            threshold,
            color,
        } => {
            let pipeline = MaskPipeline::new(PipelineOptions {
                edge_threshold: threshold,
                edge_color: color,
                method: method.into(),
                ..PipelineOptions::default()
            });
            run_prepare(&pipeline, &args, Workflow::Composite, cli.quiet);
        }
        Command::RectMask {
            width,
            height,
            x,
            y,
            rect_width,
            rect_height,
            output,
        } => {
            let rect = Rect {
                x,
                y,
                width: rect_width,
                height: rect_height,
            };
            let mask = rect_mask(width, height, rect).and_then(|m| save_mask(&m, &output));
            finish_mask(mask, &output, cli.quiet);
        }
        Command::CircleMask {
            width,
            height,
            cx,
            cy,
            radius,
            output,
        } => {
            let circle = Circle { cx, cy, radius };
            let mask = circle_mask(width, height, circle).and_then(|m| save_mask(&m, &output));
            finish_mask(mask, &output, cli.quiet);
        }
    }
}

fn finish_mask(result: mask_inpaint::Result<()>, output: &Path, quiet: bool) {
    match result {
        Ok(()) => {
            if !quiet {
                eprintln!("[OK] {}", output.display());
            }
        }
        Err(e) => {
            eprintln!("[FAIL] {}: {e}", output.display());
            process::exit(1);
        }
    }
}

fn run_prepare(pipeline: &MaskPipeline, args: &PrepareArgs, workflow: Workflow, quiet: bool) {
    if !args.input.exists() {
        eprintln!("Error: Input path does not exist: {}", args.input.display());
        process::exit(1);
    }
    if !args.mask.is_file() {
        eprintln!("Error: Mask file does not exist: {}", args.mask.display());
        process::exit(1);
    }

    let results = if args.input.is_dir() {
        pipeline.process_directory(&args.input, &args.mask, &args.output, workflow)
    } else {
        vec![pipeline.process_file(&args.input, &args.mask, &args.output, workflow)]
    };

    let mut success_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, quiet);
        if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !quiet {
        eprintln!();
        eprint!("[Summary] Prepared: {success_count}");
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_result(result: &PrepareResult, quiet: bool) {
    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.success {
        if !quiet {
            eprintln!("[OK] {filename}: {}", result.message);
            for artifact in &result.artifacts {
                eprintln!("  -> {}", artifact.display());
            }
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }
}
