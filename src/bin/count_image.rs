use parts_counter::config::load_tool_config;
use parts_counter::image::io::{load_grayscale_image, save_mask_png, write_json_file};
use parts_counter::pipeline::PartsCounter;
use parts_counter::render::{render_cycle, CanvasRenderer};
use std::env;
use std::path::Path;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_tool_config(Path::new(&config_path))?;

    let gray = load_grayscale_image(&config.input)?;
    let params = config.processing.pipeline_params();
    let display = params.display;
    let mut settings = config.settings.clone();
    settings.clamp(display);

    let mut counter = PartsCounter::new(params);
    let frame = gray.as_view();
    let output = counter
        .process(&frame, &settings, config.mode)
        .map_err(|e| format!("Cycle failed: {e}"))?;

    save_mask_png(&output.roi_mask, &config.output.roi_mask_image)?;
    write_json_file(&config.output.report_json, &output.report)?;
    if let Some(view_path) = &config.output.view_image {
        let mut canvas = CanvasRenderer::new(display.width as u32, display.height as u32);
        render_cycle(&mut canvas, config.mode, &frame, &output);
        canvas.save_png(view_path)?;
        println!("Saved {} view to {}", config.mode, view_path.display());
    }

    println!("{}", output.report.status_line());
    println!(
        "Saved ROI mask ({}x{}) to {}",
        output.roi_mask.w,
        output.roi_mask.h,
        config.output.roi_mask_image.display()
    );
    println!("Saved report to {}", config.output.report_json.display());
    Ok(())
}

fn usage() -> String {
    "Usage: count_image <config.json>".to_string()
}
