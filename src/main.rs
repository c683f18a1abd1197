use anyhow::{bail, Context, Result};
use hillscape::color_palette::{Color, Palette, UiAccents};
use hillscape::renderer::RetainedRenderer;
use hillscape::scene::{Scene, SceneConfig, SeedStrategy};
use log::info;
use std::env;
use std::time::SystemTime;

fn print_usage() {
    println!("hillscape-cli - procedural misty hill landscapes\n");
    println!("Usage: hillscape-cli [options]\n");
    println!("Options:");
    println!("  --seed <color>       seed color (hex, e.g. 86233d); default: curated pick");
    println!("  --strategy <name>    seed strategy: curated | random | bright");
    println!("  --out <file>         PNG output file (default hillscape.png)");
    println!("  --svg <file>         also write the scene as an SVG document");
    println!("  --scale <n>          PNG scale factor (default 2)");
    println!("  --json               print the palette as JSON instead of a report");
    println!("  -h, --help           show this help");
}

fn swatch(color: Color) -> String {
    format!("\x1b[48;2;{};{};{}m  \x1b[0m", color.r, color.g, color.b)
}

fn print_report(palette: &Palette, accents: &UiAccents, scene: &Scene) {
    println!("\n\x1b[1mPalette\x1b[0m (seed {})", palette.base.to_hex());
    print!("  ramp:          ");
    for color in &palette.analogous {
        print!("{} {}  ", swatch(*color), color.to_hex());
    }
    println!();
    println!(
        "  complementary: {} {}",
        swatch(palette.complementary),
        palette.complementary.to_hex()
    );
    println!(
        "  accents:       dark {}  light {}",
        accents.dark.to_hex(),
        accents.light.to_hex()
    );

    println!("\n\x1b[1mLayers\x1b[0m (back to front)");
    for (i, hill) in scene.hills().iter().enumerate() {
        let p = hill.params();
        println!(
            "  {}: y {:>6.1}  points {:>3}  amplitude {:>5.1}  mist {:.2}  {} {}",
            i,
            p.vertical_offset,
            p.point_count,
            p.amplitude,
            p.mist_density,
            swatch(p.color),
            p.color.to_hex()
        );
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut seed: Option<String> = None;
    let mut strategy = SeedStrategy::CuratedList;
    let mut out = String::from("hillscape.png");
    let mut svg_out: Option<String> = None;
    let mut scale: u32 = 2;
    let mut json = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seed" => seed = Some(args.next().context("--seed needs a color value")?),
            "--strategy" => {
                strategy = match args.next().context("--strategy needs a name")?.as_str() {
                    "curated" => SeedStrategy::CuratedList,
                    "random" => SeedStrategy::RandomColor,
                    "bright" => SeedStrategy::BrightRandomColor,
                    other => bail!("unknown strategy {:?} (curated, random, bright)", other),
                }
            }
            "--out" => out = args.next().context("--out needs a file name")?,
            "--svg" => svg_out = Some(args.next().context("--svg needs a file name")?),
            "--scale" => {
                scale = args
                    .next()
                    .context("--scale needs a number")?
                    .parse()
                    .context("--scale needs a number")?
            }
            "--json" => json = true,
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            other => bail!("unknown argument {:?} (try --help)", other),
        }
    }

    let rng_seed = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .context("system clock before unix epoch")?
        .as_secs();

    let config = SceneConfig::default();
    let mut renderer = RetainedRenderer::new(config.width, config.height);
    let mut scene = Scene::new(config, rng_seed).with_strategy(strategy);

    scene.init(&mut renderer);
    let accents = scene.update(&mut renderer, seed.as_deref());
    // Snapshots want the settled scene, not the first transition frame.
    renderer.advance(config.transition());

    if json {
        println!("{}", serde_json::to_string_pretty(scene.palette())?);
    } else {
        print_report(scene.palette(), &accents, &scene);
    }

    renderer
        .rasterize(scale)
        .save(&out)
        .with_context(|| format!("failed to write {}", out))?;
    info!("wrote {} at {}x scale", out, scale);
    println!("\nSaved {}", out);

    if let Some(path) = svg_out {
        std::fs::write(&path, renderer.to_svg())
            .with_context(|| format!("failed to write {}", path))?;
        println!("Saved {}", path);
    }

    Ok(())
}
