//! # cira-viz: Bump-map rendering
//!
//! Turns a loaded bump table into an SVG image: one styled shape per bump,
//! optional name labels, a type legend, µm axes, and an optional fault
//! overlay coloring 2-bump shorts by their resolved repair tag.
//!
//! Colors and shapes come from an aspect table (`Type → (Color, Shape)`),
//! loaded from CSV.

pub mod aspect;
pub mod svg;

pub use aspect::{load_aspect, AspectStyle, AspectTable, Shape};
pub use svg::{render_bump_map, FaultOverlay, SvgOptions};
