use crate::color_palette::Color;
use crate::noise_field::NoiseField;
use crate::renderer::{
    Fill, GradientId, GradientSpec, GradientStop, PathId, PointF, RectId, RectShape, SceneRenderer,
};
use crate::scene::SceneConfig;
use log::debug;
use serde::{Deserialize, Serialize};

/// Shape parameters for one terrain layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HillParams {
    /// Baseline y of the silhouette.
    pub vertical_offset: f64,
    /// Polygon resolution; one noise sample per point.
    pub point_count: u32,
    /// Maximum height variation around the baseline.
    pub amplitude: f64,
    /// Step through the noise sequence per point; smaller is smoother.
    pub noise_increment: f64,
    pub color: Color,
    /// Opacity of the fog band at the layer's base; 0 disables it.
    pub mist_density: f64,
}

/// Partial update for [`HillParams`]. Unspecified fields keep their value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HillPatch {
    pub vertical_offset: Option<f64>,
    pub point_count: Option<u32>,
    pub amplitude: Option<f64>,
    pub noise_increment: Option<f64>,
    pub color: Option<Color>,
    pub mist_density: Option<f64>,
}

impl HillParams {
    pub fn apply(&mut self, patch: &HillPatch) {
        if let Some(v) = patch.vertical_offset {
            self.vertical_offset = v;
        }
        if let Some(v) = patch.point_count {
            self.point_count = v;
        }
        if let Some(v) = patch.amplitude {
            self.amplitude = v;
        }
        if let Some(v) = patch.noise_increment {
            self.noise_increment = v;
        }
        if let Some(v) = patch.color {
            self.color = v;
        }
        if let Some(v) = patch.mist_density {
            self.mist_density = v;
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct MistHandles {
    gradient: GradientId,
    rect: RectId,
}

// Keeping the mist handles inside the Rendered variant makes a mist without
// a path unrepresentable.
#[derive(Debug, Clone, Copy)]
enum HillState {
    Unrendered,
    Rendered {
        path: PathId,
        mist: Option<MistHandles>,
    },
}

/// One terrain layer. Created once at scene init; every later draw animates
/// the same rendered elements in place instead of rebuilding them.
pub struct Hill {
    params: HillParams,
    state: HillState,
}

impl Hill {
    pub fn new(params: HillParams) -> Self {
        Hill {
            params,
            state: HillState::Unrendered,
        }
    }

    pub fn params(&self) -> &HillParams {
        &self.params
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self.state, HillState::Rendered { .. })
    }

    /// Merges `patch` into the parameters, recomputes the silhouette and
    /// creates or animates the rendered elements.
    ///
    /// The first call creates the path (and the mist band when enabled);
    /// every later call reuses the stored handles. A hill never goes back
    /// to the unrendered state.
    pub fn draw_path(
        &mut self,
        renderer: &mut dyn SceneRenderer,
        config: &SceneConfig,
        patch: &HillPatch,
    ) {
        self.params.apply(patch);
        let points = create_points(&self.params, config);

        match &mut self.state {
            HillState::Unrendered => {
                let path = renderer.create_path(&points, self.params.color);
                debug!(
                    "hill layer created at y {} with {} points",
                    self.params.vertical_offset,
                    points.len()
                );
                let mist = if self.params.mist_density > 0.0 {
                    Some(create_mist(renderer, &self.params, config))
                } else {
                    None
                };
                self.state = HillState::Rendered { path, mist };
            }
            HillState::Rendered { path, mist } => {
                renderer.animate_path(*path, &points, self.params.color, config.transition());
                if self.params.mist_density > 0.0 {
                    match mist {
                        Some(handles) => update_mist(renderer, handles, &self.params, config),
                        // Mist turned on after creation; build it now.
                        None => *mist = Some(create_mist(renderer, &self.params, config)),
                    }
                }
            }
        }
    }
}

/// Computes the closed silhouette for the given parameters.
///
/// A fresh noise sequence is constructed on every call, so each draw yields
/// a new ridge line; only the parameters persist between draws.
pub fn create_points(params: &HillParams, config: &SceneConfig) -> Vec<PointF> {
    create_points_with(&NoiseField::new(), params, config)
}

pub fn create_points_with(
    noise: &NoiseField,
    params: &HillParams,
    config: &SceneConfig,
) -> Vec<PointF> {
    let spacing = config.width / params.point_count as f64;
    let half_amplitude = params.amplitude / 2.0;
    let mut points = Vec::with_capacity(params.point_count as usize + 3);

    for i in 0..=params.point_count {
        let x = (spacing * i as f64).round();
        let sample = noise.sample(i as f64 * params.noise_increment);
        let y = params.vertical_offset + (sample * params.amplitude - half_amplitude).floor();
        points.push(PointF::new(x, y));
    }

    // Close the silhouette against the scene floor.
    points.push(PointF::new(config.width, config.height));
    points.push(PointF::new(0.0, config.height));
    points
}

/// Serializes a point list as path commands: move to the first point, line
/// to every following point, close. Byte-stable for a given point list.
pub fn path_commands(points: &[PointF]) -> String {
    let mut d = String::new();
    for (i, p) in points.iter().enumerate() {
        if i == 0 {
            d.push_str(&format!("M {} {}", p.x, p.y));
        } else {
            d.push_str(&format!(" L {} {}", p.x, p.y));
        }
    }
    d.push_str(" Z");
    d
}

// Fog band under the ridge line: a rectangle from the baseline down to the
// scene floor, filled with a transparent-to-white vertical gradient that
// turns fully opaque below the peaks.
fn mist_band(params: &HillParams, config: &SceneConfig) -> (RectShape, f64) {
    let band = RectShape {
        x: 0.0,
        y: params.vertical_offset,
        width: config.width,
        height: (config.height - params.vertical_offset).max(0.0),
    };
    // An amplitude taller than the band saturates the ramp instead of
    // producing an out-of-range stop.
    let stop = if band.height > 0.0 {
        (params.amplitude / band.height).clamp(0.0, 1.0)
    } else {
        1.0
    };
    (band, stop)
}

fn mist_gradient(stop: f64) -> GradientSpec {
    GradientSpec::vertical(vec![
        GradientStop::new(0.0, Color::WHITE, 0.0),
        GradientStop::new(stop, Color::WHITE, 1.0),
        GradientStop::new(1.0, Color::WHITE, 1.0),
    ])
}

fn create_mist(
    renderer: &mut dyn SceneRenderer,
    params: &HillParams,
    config: &SceneConfig,
) -> MistHandles {
    let (band, stop) = mist_band(params, config);
    let gradient = renderer.create_gradient(mist_gradient(stop));
    let rect = renderer.create_rect(band, Fill::Gradient(gradient), params.mist_density);
    MistHandles { gradient, rect }
}

fn update_mist(
    renderer: &mut dyn SceneRenderer,
    handles: &MistHandles,
    params: &HillParams,
    config: &SceneConfig,
) {
    let (band, stop) = mist_band(params, config);
    renderer.update_gradient(handles.gradient, mist_gradient(stop));
    renderer.animate_rect_frame(handles.rect, band.y, band.height, config.transition());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RetainedRenderer;

    fn params() -> HillParams {
        HillParams {
            vertical_offset: 300.0,
            point_count: 120,
            amplitude: 80.0,
            noise_increment: 0.05,
            color: Color::new(0x30, 0x60, 0x9f),
            mist_density: 0.0,
        }
    }

    fn config() -> SceneConfig {
        SceneConfig::default()
    }

    #[test]
    fn test_point_count_is_n_plus_three() {
        let points = create_points(&params(), &config());
        assert_eq!(points.len(), 123);

        let small = HillParams {
            point_count: 1,
            ..params()
        };
        assert_eq!(create_points(&small, &config()).len(), 4);
    }

    #[test]
    fn test_silhouette_closes_against_scene_floor() {
        let config = config();
        let points = create_points(&params(), &config);
        let n = points.len();
        assert_eq!(points[n - 2], PointF::new(config.width, config.height));
        assert_eq!(points[n - 1], PointF::new(0.0, config.height));
        // The ridge spans the full scene width.
        assert_eq!(points[0].x, 0.0);
        assert_eq!(points[n - 3].x, config.width);
    }

    #[test]
    fn test_ridge_stays_inside_amplitude_window() {
        let params = params();
        let points = create_points_with(&NoiseField::with_seed(5), &params, &config());
        for p in &points[..points.len() - 2] {
            assert!(p.y >= params.vertical_offset - params.amplitude / 2.0 - 1.0);
            assert!(p.y <= params.vertical_offset + params.amplitude / 2.0);
        }
    }

    #[test]
    fn test_path_commands_exact_output() {
        let points = [PointF::new(0.0, 0.0), PointF::new(10.0, 5.0)];
        assert_eq!(path_commands(&points), "M 0 0 L 10 5 Z");
    }

    #[test]
    fn test_patch_merge_keeps_unspecified_fields() {
        let mut merged = params();
        merged.apply(&HillPatch {
            vertical_offset: Some(412.5),
            color: Some(Color::new(1, 2, 3)),
            ..HillPatch::default()
        });
        assert_eq!(merged.vertical_offset, 412.5);
        assert_eq!(merged.color, Color::new(1, 2, 3));
        assert_eq!(merged.point_count, 120);
        assert_eq!(merged.amplitude, 80.0);
        assert_eq!(merged.noise_increment, 0.05);
        assert_eq!(merged.mist_density, 0.0);
    }

    #[test]
    fn test_first_draw_creates_then_reuses_handles() {
        let config = config();
        let mut renderer = RetainedRenderer::new(config.width, config.height);
        let mut hill = Hill::new(params());
        assert!(!hill.is_rendered());

        hill.draw_path(&mut renderer, &config, &HillPatch::default());
        assert!(hill.is_rendered());
        assert_eq!(renderer.element_count(), 1);

        for _ in 0..5 {
            hill.draw_path(&mut renderer, &config, &HillPatch::default());
        }
        assert_eq!(renderer.element_count(), 1, "redraw must reuse the handle");
        assert!(hill.is_rendered());
    }

    #[test]
    fn test_mist_disabled_never_creates_overlay() {
        let config = config();
        let mut renderer = RetainedRenderer::new(config.width, config.height);
        let mut hill = Hill::new(params());
        for _ in 0..4 {
            hill.draw_path(&mut renderer, &config, &HillPatch::default());
        }
        assert_eq!(renderer.element_count(), 1);
        assert_eq!(renderer.gradient_count(), 0);
    }

    #[test]
    fn test_mist_enabled_creates_gradient_and_rect_once() {
        let config = config();
        let mut renderer = RetainedRenderer::new(config.width, config.height);
        let mut hill = Hill::new(HillParams {
            mist_density: 0.5,
            ..params()
        });
        hill.draw_path(&mut renderer, &config, &HillPatch::default());
        assert_eq!(renderer.element_count(), 2);
        assert_eq!(renderer.gradient_count(), 1);

        hill.draw_path(&mut renderer, &config, &HillPatch::default());
        assert_eq!(renderer.element_count(), 2);
        assert_eq!(renderer.gradient_count(), 1);
    }

    #[test]
    fn test_mist_created_lazily_when_enabled_later() {
        let config = config();
        let mut renderer = RetainedRenderer::new(config.width, config.height);
        let mut hill = Hill::new(params());
        hill.draw_path(&mut renderer, &config, &HillPatch::default());
        assert_eq!(renderer.gradient_count(), 0);

        hill.draw_path(
            &mut renderer,
            &config,
            &HillPatch {
                mist_density: Some(0.3),
                ..HillPatch::default()
            },
        );
        assert_eq!(renderer.element_count(), 2);
        assert_eq!(renderer.gradient_count(), 1);
    }

    #[test]
    fn test_mist_stop_fraction_clamps() {
        let config = config();
        let (band, stop) = mist_band(
            &HillParams {
                vertical_offset: 550.0,
                amplitude: 200.0,
                ..params()
            },
            &config,
        );
        assert_eq!(band.height, 50.0);
        assert_eq!(stop, 1.0);

        let (_, partial) = mist_band(
            &HillParams {
                vertical_offset: 400.0,
                amplitude: 100.0,
                ..params()
            },
            &config,
        );
        assert!((partial - 0.5).abs() < 1e-9);
    }
}
