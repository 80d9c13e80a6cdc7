//! Dumps every intermediate image of the pipeline for parameter tuning.

use serde::Deserialize;
use stack_counter::image::io::{
    load_color_image, save_f32_normalized, save_gray_u8, save_rgb8,
};
use stack_counter::image::{ImageRgb8, ImageU8};
use stack_counter::stages;
use stack_counter::{draw, gradient, DetectParams};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct StagesToolConfig {
    #[serde(rename = "input")]
    pub input: PathBuf,
    #[serde(default)]
    pub params: DetectParams,
    pub output_dir: PathBuf,
}

pub fn load_config(path: &Path) -> Result<StagesToolConfig, String> {
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
    let dir = &config.output_dir;

    let color = load_color_image(&config.input)?;
    let params = &config.params;
    params.validate().map_err(|e| e.to_string())?;

    let pre = stages::preprocess(&color, &params.preprocess).map_err(|e| e.to_string())?;
    save_rgb8(&pre.color, &dir.join("01_working.png"))?;
    save_gray_u8(&pre.gray, &dir.join("02_gray_blurred.png"))?;

    // Optional ROI: crop the working grayscale like the pipeline does.
    let work_gray: ImageU8 = if params.use_roi_selection {
        match stages::select_roi(&pre.color, &params.roi) {
            Some(sel) => {
                save_gray_u8(&sel.saturation_mask, &dir.join("03_saturation_mask.png"))?;
                let r = sel.rect;
                println!("roi: x={} y={} w={} h={}", r.x, r.y, r.w, r.h);
                pre.gray
                    .crop(r.x as usize, r.y as usize, r.w as usize, r.h as usize)
            }
            None => {
                println!("roi: no saturated region found, stopping");
                return Ok(());
            }
        }
    } else {
        pre.gray.clone()
    };

    let (binary, threshold) = stages::binarize(&work_gray, params.binarize);
    println!("otsu threshold: {threshold}");
    save_gray_u8(&binary, &dir.join("04_binary.png"))?;

    let opened = stages::refine_mask(&binary, &params.morphology);
    save_gray_u8(&opened, &dir.join("05_opened.png"))?;

    let Some(maps) = stages::generate_markers(&opened, &params.markers) else {
        println!("no confident seeds, stopping");
        return Ok(());
    };
    save_f32_normalized(&maps.distance, &dir.join("06_distance.png"))?;
    save_gray_u8(&maps.sure_fg, &dir.join("07_sure_fg.png"))?;
    save_gray_u8(&maps.sure_bg, &dir.join("08_sure_bg.png"))?;
    save_gray_u8(&maps.unknown, &dir.join("09_unknown.png"))?;
    println!("seed blobs: {}", maps.seed_count);

    let relief = gradient::quantize_priority(&gradient::sobel_magnitude(&work_gray));
    save_gray_u8(&relief, &dir.join("10_relief.png"))?;

    let segmented = stages::watershed(&maps.markers, &relief);
    let mut ridges: ImageRgb8 = gray_to_rgb(&work_gray);
    draw::paint_ridges(&mut ridges, &segmented, 0, 0, draw::RIDGE_COLOR);
    save_rgb8(&ridges, &dir.join("11_ridges.png"))?;

    let outcome = stages::filter_regions(&segmented, &params.filter);
    println!(
        "regions: {} candidate(s), {} accepted, {} area-rejected, {} box-rejected, {} degenerate",
        outcome.candidates,
        outcome.accepted.len(),
        outcome.rejected_area,
        outcome.rejected_box,
        outcome.degenerate
    );

    let mut boxed = ridges.clone();
    for region in &outcome.accepted {
        draw::draw_rect(&mut boxed, region.bbox, draw::BOX_COLOR, 2);
    }
    save_rgb8(&boxed, &dir.join("12_boxes.png"))?;

    Ok(())
}

fn gray_to_rgb(gray: &ImageU8) -> ImageRgb8 {
    let mut out = ImageRgb8::new(gray.w, gray.h);
    for y in 0..gray.h {
        for x in 0..gray.w {
            let v = gray.get(x, y);
            out.set(x, y, [v, v, v]);
        }
    }
    out
}

fn usage() -> String {
    "Usage: stages_demo <config.json>".to_string()
}
