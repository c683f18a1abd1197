//! Procedural misty hill landscapes.
//!
//! A single seed color is expanded into a muted six-step analogous ramp plus
//! a complementary accent; each ramp color drives one noise-generated hill
//! silhouette, stacked back to front with fog bands between the layers. The
//! scene re-renders in place with animated transitions instead of being
//! rebuilt, so repeated updates morph one landscape into the next.

pub mod color_palette;
pub mod hills;
pub mod noise_field;
pub mod renderer;
pub mod scene;
