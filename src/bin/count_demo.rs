use serde::{Deserialize, Serialize};
use stack_counter::image::io::{load_color_image, save_gray_u8, save_rgb8, write_json_file};
use stack_counter::{CountResult, DetectParams, PipelineTrace, StackDetector};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct CountToolConfig {
    #[serde(rename = "input")]
    pub input: PathBuf,
    #[serde(default)]
    pub params: DetectParams,
    pub output: CountOutputConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CountOutputConfig {
    pub annotated: Option<PathBuf>,
    pub mask: Option<PathBuf>,
    pub report_json: Option<PathBuf>,
}

#[derive(Serialize)]
struct ReportJson<'a> {
    result: &'a CountResult,
    trace: &'a PipelineTrace,
}

pub fn load_config(path: &Path) -> Result<CountToolConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;

    let color = load_color_image(&config.input)?;
    let detector = StackDetector::new(config.params);
    let report = detector.process(&color).map_err(|e| e.to_string())?;

    println!(
        "count={} threshold={} latency_ms={:.3}",
        report.result.count, report.result.threshold, report.result.latency_ms
    );
    if let Some(stage) = report.trace.short_circuit {
        println!("short-circuited at stage: {stage}");
    }

    if let Some(path) = &config.output.annotated {
        save_rgb8(&report.annotated, path)?;
    }
    if let Some(path) = &config.output.mask {
        save_gray_u8(&report.processed_mask, path)?;
    }
    if let Some(path) = &config.output.report_json {
        write_json_file(
            path,
            &ReportJson {
                result: &report.result,
                trace: &report.trace,
            },
        )?;
    }

    Ok(())
}

fn usage() -> String {
    "Usage: count_demo <config.json>".to_string()
}
