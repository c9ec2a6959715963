use std::io::IsTerminal;
use std::path::Path;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;
use vidlink_media::VideoMetadata;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MetadataOutput<'a> {
    schema_id: &'static str,
    file: String,
    metadata: &'a VideoMetadata,
}

pub fn print_metadata(file: &Path, metadata: &VideoMetadata, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = MetadataOutput {
                schema_id: "https://schemas.3leaps.dev/vidlink/cli/v1/video-metadata.schema.json",
                file: file.display().to_string(),
                metadata,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec![
                    "duration".to_string(),
                    format!("{:.2}s", metadata.duration),
                ])
                .add_row(vec!["rotation".to_string(), metadata.rotation.to_string()])
                .add_row(vec![
                    "dimensions".to_string(),
                    format!("{}x{}", metadata.vid_width, metadata.vid_height),
                ])
                .add_row(vec!["frames".to_string(), metadata.num_frames.to_string()])
                .add_row(vec![
                    "avg frame rate".to_string(),
                    format!("{:.2}", metadata.avg_frame_rate),
                ])
                .add_row(vec![
                    "real frame rate".to_string(),
                    format!("{:.2}", metadata.real_frame_rate),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("Video metadata ({}):", file.display());
            println!("  Duration:        {:.2}s", metadata.duration);
            println!("  Rotation:        {}", metadata.rotation);
            println!(
                "  Dimensions:      {}x{}",
                metadata.vid_width, metadata.vid_height
            );
            println!("  Frames:          {}", metadata.num_frames);
            println!("  Avg frame rate:  {:.2}", metadata.avg_frame_rate);
            println!("  Real frame rate: {:.2}", metadata.real_frame_rate);
        }
        OutputFormat::Raw => {
            println!(
                "{}",
                serde_json::to_string(metadata).unwrap_or_else(|_| "{}".to_string())
            );
        }
    }
}

#[derive(Serialize)]
struct TransformOutput<'a> {
    schema_id: &'static str,
    operation: &'a str,
    src: String,
    dst: String,
    bytes: usize,
}

pub fn print_transform(operation: &str, src: &Path, dst: &Path, bytes: usize, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = TransformOutput {
                schema_id: "https://schemas.3leaps.dev/vidlink/cli/v1/transform-result.schema.json",
                operation,
                src: src.display().to_string(),
                dst: dst.display().to_string(),
                bytes,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("{operation}: wrote {} ({bytes} bytes)", dst.display());
        }
        OutputFormat::Raw => {
            println!("{}", dst.display());
        }
    }
}

/// Print a raw call result. `raw` unwraps top-level strings so shell
/// pipelines see the bare text.
pub fn print_value(value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{value}"),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!(
                "{}",
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            );
        }
        OutputFormat::Raw => match value {
            Value::String(text) => println!("{text}"),
            other => println!("{other}"),
        },
    }
}
