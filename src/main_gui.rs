use hillscape::renderer::RetainedRenderer;
use hillscape::scene::{Scene, SceneConfig};
use log::{error, info};
use slint::{Image, Rgb8Pixel, SharedPixelBuffer, Timer, TimerMode};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, SystemTime};

slint::include_modules!();

const FRAME_INTERVAL: Duration = Duration::from_millis(33);

fn render_frame(renderer: &RetainedRenderer) -> Image {
    let img = renderer.rasterize(1);
    let (width, height) = img.dimensions();
    let mut buffer = SharedPixelBuffer::<Rgb8Pixel>::new(width, height);
    buffer.make_mut_bytes().copy_from_slice(img.as_raw());
    Image::from_rgb8(buffer)
}

fn apply_accents(ui: &HillscapeWindow, accents: &hillscape::color_palette::UiAccents) {
    ui.set_accent(slint::Color::from_rgb_u8(
        accents.light.r,
        accents.light.g,
        accents.light.b,
    ));
}

fn main() -> Result<(), slint::PlatformError> {
    env_logger::init();
    let ui = HillscapeWindow::new()?;

    let config = SceneConfig::default();
    let rng_seed = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let renderer = Rc::new(RefCell::new(RetainedRenderer::new(
        config.width,
        config.height,
    )));
    let scene = Rc::new(RefCell::new(Scene::new(config, rng_seed)));

    // Build the neutral scene, then ease straight into a colored variant.
    scene.borrow_mut().init(&mut *renderer.borrow_mut());
    let accents = scene.borrow_mut().update(&mut *renderer.borrow_mut(), None);
    apply_accents(&ui, &accents);
    ui.set_scene_image(render_frame(&renderer.borrow()));

    {
        let renderer = renderer.clone();
        let scene = scene.clone();
        let ui_handle = ui.as_weak();
        ui.on_regenerate(move || {
            let ui = ui_handle.unwrap();
            let accents = scene.borrow_mut().update(&mut *renderer.borrow_mut(), None);
            apply_accents(&ui, &accents);
        });
    }

    {
        let renderer = renderer.clone();
        ui.on_save_snapshot(move || {
            // Export at double resolution, matching the CLI default.
            match renderer.borrow().rasterize(2).save("hillscape.png") {
                Ok(()) => info!("saved hillscape.png"),
                Err(e) => error!("snapshot failed: {}", e),
            }
        });
    }

    // The renderer has no clock of its own; a repeating timer steps the
    // in-flight transitions and refreshes the shown frame.
    let timer = Timer::default();
    {
        let renderer = renderer.clone();
        let ui_handle = ui.as_weak();
        timer.start(TimerMode::Repeated, FRAME_INTERVAL, move || {
            let ui = match ui_handle.upgrade() {
                Some(ui) => ui,
                None => return,
            };
            let mut renderer = renderer.borrow_mut();
            if renderer.animating() {
                renderer.advance(FRAME_INTERVAL);
                ui.set_scene_image(render_frame(&renderer));
            }
        });
    }

    ui.run()
}
