use clap::{Parser, Subcommand};
use rust_barcode::models::CandidateGeometry;
use rust_barcode::synth::{self, raster};
use rust_barcode::{
    BarcodeReader, DecodeOptions, LuminanceGrid, Status, Symbology, SymbologySet, pipeline, source,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "barcodetool", version, about = "rust_barcode CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode the first barcode in an image file
    Decode {
        file: PathBuf,
        /// The file holds base64 text (data URI prefix allowed)
        #[arg(long)]
        base64: bool,
        /// Comma separated symbologies, e.g. `qr,code128`
        #[arg(long, value_delimiter = ',')]
        formats: Vec<Symbology>,
        #[arg(long)]
        try_harder: bool,
        /// Sweep 0/90/180/270 degrees without the other try-harder passes
        #[arg(long)]
        auto_rotate: bool,
    },
    /// Draw a clean symbol into a PNG file
    Render {
        symbology: Symbology,
        text: String,
        out: PathBuf,
        /// Pixels per module
        #[arg(long, default_value_t = 4)]
        scale: usize,
    },
    /// List every located candidate and what it decoded to
    Inspect {
        file: PathBuf,
        #[arg(long, value_delimiter = ',')]
        formats: Vec<Symbology>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Decode {
            file,
            base64,
            formats,
            try_harder,
            auto_rotate,
        } => {
            let options = DecodeOptions::default()
                .with_formats(format_set(&formats))
                .with_try_harder(try_harder)
                .with_auto_rotate(auto_rotate);
            decode_cmd(&file, base64, options)
        }
        Command::Render {
            symbology,
            text,
            out,
            scale,
        } => render_cmd(symbology, &text, &out, scale),
        Command::Inspect { file, formats } => inspect_cmd(&file, &formats),
    }
}

fn format_set(formats: &[Symbology]) -> SymbologySet {
    formats.iter().copied().collect()
}

fn decode_cmd(file: &Path, base64: bool, options: DecodeOptions) -> ExitCode {
    let reader = BarcodeReader::with_options(options);

    let start = Instant::now();
    let result = if base64 {
        match std::fs::read_to_string(file) {
            Ok(text) => reader.decode_base64(&text),
            Err(err) => {
                eprintln!("Failed to read {}: {}", file.display(), err);
                return ExitCode::from(2);
            }
        }
    } else {
        match std::fs::read(file) {
            Ok(bytes) => reader.decode_bytes(&bytes),
            Err(err) => {
                eprintln!("Failed to read {}: {}", file.display(), err);
                return ExitCode::from(2);
            }
        }
    };
    let elapsed = start.elapsed();

    match result.status() {
        Status::Found => {
            println!("{result}");
            eprintln!("decoded in {:.2} ms", elapsed.as_secs_f64() * 1000.0);
            ExitCode::SUCCESS
        }
        Status::NotFound => {
            eprintln!("{}", result.message());
            ExitCode::from(1)
        }
        Status::Error => {
            eprintln!("error: {}", result.message());
            ExitCode::from(2)
        }
    }
}

fn render_cmd(symbology: Symbology, text: &str, out: &Path, scale: usize) -> ExitCode {
    let Some(grid) = synth::render(symbology, text, scale.max(1)) else {
        eprintln!("{symbology} cannot encode {text:?}");
        return ExitCode::from(2);
    };
    match raster::encode_png(&grid.to_image()) {
        Ok(png) => match std::fs::write(out, png) {
            Ok(()) => {
                println!(
                    "wrote {} ({}x{})",
                    out.display(),
                    grid.width(),
                    grid.height()
                );
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("Failed to write {}: {}", out.display(), err);
                ExitCode::from(2)
            }
        },
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

fn inspect_cmd(file: &Path, formats: &[Symbology]) -> ExitCode {
    let grid = match std::fs::read(file)
        .map_err(|err| err.to_string())
        .and_then(|bytes| source::load_image(&bytes).map_err(|err| err.to_string()))
        .and_then(|image| LuminanceGrid::from_image(&image).map_err(|err| err.to_string()))
    {
        Ok(grid) => grid,
        Err(err) => {
            eprintln!("Failed to load {}: {}", file.display(), err);
            return ExitCode::from(2);
        }
    };

    println!("Image: {} ({}x{})", file.display(), grid.width(), grid.height());
    let options = DecodeOptions::default().with_formats(format_set(formats));
    let candidates = pipeline::inspect(&grid, &options);
    println!("Found {} candidates", candidates.len());
    for (i, (candidate, decoded)) in candidates.iter().enumerate() {
        let place = match candidate.geometry {
            CandidateGeometry::Matrix { dimension, .. } => format!("{dimension}x{dimension} modules"),
            CandidateGeometry::Line { start, end } => format!(
                "line ({:.1}, {:.1}) -> ({:.1}, {:.1})",
                start.x, start.y, end.x, end.y
            ),
        };
        let outcome = decoded
            .as_ref()
            .map_or_else(|| "-".to_string(), |barcode| barcode.text.clone());
        println!(
            "  {:>3} {:<8} {} module_size={:.2} -> {}",
            i, candidate.symbology.to_string(), place, candidate.module_size, outcome
        );
    }
    if candidates.iter().any(|(_, decoded)| decoded.is_some()) {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_decode_flags() {
        let cli = Cli::try_parse_from([
            "barcodetool",
            "decode",
            "label.png",
            "--formats",
            "qr,code128",
            "--auto-rotate",
        ])
        .unwrap();
        match cli.command {
            Command::Decode {
                formats,
                try_harder,
                auto_rotate,
                ..
            } => {
                assert_eq!(formats, vec![Symbology::QrCode, Symbology::Code128]);
                assert!(auto_rotate);
                assert!(!try_harder);
            }
            _ => panic!("expected decode"),
        }
    }
}
