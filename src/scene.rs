use crate::color_palette::{derive_palette, Color, Palette, UiAccents};
use crate::hills::{Hill, HillParams, HillPatch};
use crate::renderer::{Fill, GradientSpec, GradientStop, RectId, RectShape, SceneRenderer};
use log::info;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Render surface geometry and transition timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    pub width: f64,
    pub height: f64,
    /// Duration of every animated update, in milliseconds.
    pub transition_ms: u64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig {
            width: 920.0,
            height: 600.0,
            transition_ms: 800,
        }
    }
}

impl SceneConfig {
    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }
}

/// Seeds that are known to produce pleasant ramps.
pub const CURATED_SEEDS: [&str; 18] = [
    "d08635", "5638a4", "626866", "1e6686", "86233d", "4182d9", "3b6e9e", "3669a2", "793961",
    "ca78c6", "306dbd", "464d32", "ab4a5b", "5a28c2", "623373", "9a4743", "64bfbd", "20391b",
];

/// How the next seed color is chosen when an update is not given one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedStrategy {
    /// Draw from [`CURATED_SEEDS`]. The default.
    CuratedList,
    /// Any RGB color.
    RandomColor,
    /// Random color re-rolled until its luminance sits in a readable band,
    /// avoiding near-black and near-white ramps.
    BrightRandomColor,
}

impl SeedStrategy {
    pub fn next_seed(&self, rng: &mut ChaCha8Rng) -> String {
        match self {
            SeedStrategy::CuratedList => {
                CURATED_SEEDS[rng.gen_range(0..CURATED_SEEDS.len())].to_string()
            }
            SeedStrategy::RandomColor => Color::new(rng.gen(), rng.gen(), rng.gen()).to_hex(),
            SeedStrategy::BrightRandomColor => loop {
                let color = Color::new(rng.gen(), rng.gen(), rng.gen());
                if (0.15..=0.6).contains(&color.luminance()) {
                    return color.to_hex();
                }
            },
        }
    }
}

/// The whole landscape: palette, terrain layers and backdrop.
///
/// Owns its RNG and all entity state; nothing here is global. Rendering
/// goes through the [`SceneRenderer`] collaborator passed into each call.
pub struct Scene {
    config: SceneConfig,
    palette: Palette,
    hills: Vec<Hill>,
    background: Option<RectId>,
    strategy: SeedStrategy,
    rng: ChaCha8Rng,
}

impl Scene {
    pub fn new(config: SceneConfig, rng_seed: u64) -> Self {
        Scene {
            config,
            palette: derive_palette("fff"),
            hills: Vec::new(),
            background: None,
            strategy: SeedStrategy::CuratedList,
            rng: ChaCha8Rng::seed_from_u64(rng_seed),
        }
    }

    pub fn with_strategy(mut self, strategy: SeedStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn hills(&self) -> &[Hill] {
        &self.hills
    }

    pub fn ui_accents(&self) -> UiAccents {
        self.palette.ui_accents()
    }

    /// Builds the backdrop and the six terrain layers, then draws them.
    ///
    /// One-shot: later calls are ignored, all redrawing goes through
    /// [`Scene::update`]. Layer parameters follow fixed curves over the
    /// layer index: back rows sit high with busy, fast-stepping ridges and
    /// thick mist; toward the front the baseline drops and everything
    /// calms down.
    pub fn init(&mut self, renderer: &mut dyn SceneRenderer) {
        if !self.hills.is_empty() {
            return;
        }
        self.palette = derive_palette("fff");
        self.draw_background(renderer);

        let layers = self.palette.analogous.len();
        for i in 0..layers {
            let i_f = i as f64;
            let mut mist = 1.0 - (i_f + 1.0) / layers as f64;
            mist = (mist * 100.0).floor() / 100.0;
            if mist - 0.1 > 0.0 {
                mist -= 0.1;
            }

            self.hills.push(Hill::new(HillParams {
                vertical_offset: 200.0 + i_f * 50.0,
                point_count: 150 - i as u32 * 5,
                amplitude: 120.0 - i_f * 10.0,
                noise_increment: (10.0 - i_f * 1.2) / 100.0,
                color: self.palette.base,
                mist_density: mist,
            }));
        }

        for hill in &mut self.hills {
            hill.draw_path(renderer, &self.config, &HillPatch::default());
        }
        info!("scene initialized with {} hill layers", self.hills.len());
    }

    /// Re-colors and re-shapes the landscape from a new palette.
    ///
    /// `seed` overrides the configured seed strategy when given. Every hill
    /// keeps its identity and animates toward its new offset and color;
    /// the vertical layout is re-rolled each time.
    pub fn update(&mut self, renderer: &mut dyn SceneRenderer, seed: Option<&str>) -> UiAccents {
        let seed = match seed {
            Some(s) => s.to_string(),
            None => self.strategy.next_seed(&mut self.rng),
        };
        self.palette = derive_palette(&seed);
        info!("updating scene around {}", self.palette.base.to_hex());
        self.draw_background(renderer);

        // New vertical layout: random baseline, row spacing and a growth
        // factor that stretches the spacing toward the front.
        let y_start = self
            .rng
            .gen_range(self.config.height as i64 / 4..=self.config.height as i64 / 3)
            as f64;
        let y_spacing = self.rng.gen_range(20..=30) as f64;
        let y_growth = self.rng.gen_range(15..=35) as f64 / 100.0;

        for (i, hill) in self.hills.iter_mut().enumerate() {
            let i_f = i as f64;
            let y = y_start + (y_spacing * i_f) * (y_growth * i_f);
            hill.draw_path(
                renderer,
                &self.config,
                &HillPatch {
                    vertical_offset: Some(y),
                    color: Some(self.palette.analogous[i]),
                    ..HillPatch::default()
                },
            );
        }
        self.palette.ui_accents()
    }

    // Backdrop: solid complementary fill, a foggy floor and a sun glow.
    // Created once; later calls only animate the base fill to the new
    // complementary color.
    fn draw_background(&mut self, renderer: &mut dyn SceneRenderer) {
        match self.background {
            Some(id) => {
                renderer.animate_rect_fill(id, self.palette.complementary, self.config.transition())
            }
            None => {
                let full = RectShape {
                    x: 0.0,
                    y: 0.0,
                    width: self.config.width,
                    height: self.config.height,
                };
                self.background = Some(renderer.create_rect(
                    full,
                    Fill::Solid(self.palette.complementary),
                    1.0,
                ));

                let fog = renderer.create_gradient(GradientSpec::vertical(vec![
                    GradientStop::new(0.0, Color::WHITE, 0.0),
                    GradientStop::new(0.65, Color::WHITE, 0.8),
                    GradientStop::new(1.0, Color::WHITE, 0.8),
                ]));
                let _ = renderer.create_rect(full, Fill::Gradient(fog), 1.0);

                let size = self.config.width.min(self.config.height);
                let sun = renderer.create_gradient(GradientSpec::radial(
                    0.45,
                    vec![
                        GradientStop::new(0.0, Color::WHITE, 0.5),
                        GradientStop::new(1.0, Color::WHITE, 0.0),
                    ],
                ));
                let _ = renderer.create_rect(
                    RectShape {
                        x: ((self.config.width - size) / 2.0).round(),
                        y: ((self.config.height - size) / 2.0).round(),
                        width: size,
                        height: size,
                    },
                    Fill::Gradient(sun),
                    1.0,
                );
            }
        }
    }
}
