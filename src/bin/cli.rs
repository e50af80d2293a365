use clap::Parser;
use sheetplot::chart::{ChartKind, build_figure};
use sheetplot::downloader;
use sheetplot::graph::{GraphOptions, render_png};
use sheetplot::loader;
use std::path::PathBuf;
use std::process::ExitCode;

/// Decode a spreadsheet the way the page does and print what it would chart
#[derive(Parser, Debug)]
#[command(name = "sheetplot-cli", version)]
struct Args {
    /// Spreadsheet to read (xlsx, xls, xlsb, ods or csv)
    file: PathBuf,

    /// Chart to build: line, scatter, bar, pie, histogram or 3d
    #[arg(short, long)]
    chart: Option<ChartKind>,

    /// Write the chart as a PNG image (requires --chart)
    #[arg(long, requires = "chart")]
    png: Option<PathBuf>,

    /// Leave captions, axis labels and legends out of the PNG
    #[arg(long, requires = "png")]
    no_labels: bool,

    /// Write the cleaned rows as CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write the cleaned rows as XLSX
    #[arg(long)]
    xlsx: Option<PathBuf>,
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = loader::from_path(&args.file)?;
    println!("{}", serde_json::to_string_pretty(&dataset.summary())?);

    if let Some(kind) = args.chart {
        let figure = build_figure(&dataset, kind);
        println!("{}", serde_json::to_string_pretty(&figure)?);

        if let Some(path) = &args.png {
            let options = GraphOptions {
                labels: !args.no_labels,
                ..GraphOptions::default()
            };
            std::fs::write(path, render_png(&figure, &options)?)?;
            log::info!("wrote {}", path.display());
        }
    }

    if let Some(path) = &args.csv {
        std::fs::write(path, downloader::to_csv(&dataset)?)?;
        log::info!("wrote {}", path.display());
    }
    if let Some(path) = &args.xlsx {
        std::fs::write(path, downloader::to_xlsx(&dataset)?)?;
        log::info!("wrote {}", path.display());
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
