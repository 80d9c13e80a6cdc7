use stack_counter::image::ImageRgb8;
use stack_counter::{DetectParams, StackDetector};

fn main() {
    // Demo stub: renders two synthetic dark squares on a light background
    // and counts them.
    let w = 640usize;
    let h = 480usize;
    let mut color = ImageRgb8::new(w, h);
    for y in 0..h {
        for x in 0..w {
            color.set(x, y, [235, 235, 235]);
        }
    }
    for (cx, cy) in [(180usize, 240usize), (460usize, 240usize)] {
        for y in cy - 60..cy + 60 {
            for x in cx - 60..cx + 60 {
                color.set(x, y, [40, 40, 40]);
            }
        }
    }

    let detector = StackDetector::new(DetectParams::default());
    match detector.process(&color) {
        Ok(report) => println!(
            "count={} latency_ms={:.3}",
            report.result.count, report.result.latency_ms
        ),
        Err(err) => eprintln!("Error: {err}"),
    }
}
