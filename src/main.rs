use anyhow::{Context, Result, anyhow};
use caption_annotator::app::CaptionApp;
use caption_annotator::config::{Config, USAGE};
use caption_annotator::loader::ImageLoader;
use caption_annotator::pairing::pair_directories;
use caption_annotator::{Collection, FsCaptionStore};
use eframe::egui;
use log::info;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        print!("{USAGE}");
        return Ok(());
    }
    let config = Config::from_args(args)?;
    config.validate()?;

    let pairing = pair_directories(
        &config.image_dir,
        &config.caption_dir,
        &config.caption_extension,
        config.pairing,
    )
    .context("failed to read the image and caption directories")?;
    if config.strict_pairing {
        pairing.ensure_consistent()?;
    }
    // an empty side is fatal before any window opens
    let collection = Collection::new(pairing.images, pairing.captions)?;
    info!(
        "{} pair(s) from {} and {}",
        collection.size(),
        config.image_dir.display(),
        config.caption_dir.display()
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Caption Annotator")
            .with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    let max_preview = config.max_preview;
    eframe::run_native(
        "Caption Annotator",
        native_options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            let ctx = cc.egui_ctx.clone();
            let loader = ImageLoader::new(max_preview).with_waker(move || ctx.request_repaint());
            Box::new(CaptionApp::new(collection, FsCaptionStore, loader))
        }),
    )
    .map_err(|e| anyhow!("window closed with an error: {e}"))
}
