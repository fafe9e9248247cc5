//! String-built SVG rendering of a bump map.

use std::collections::HashSet;

use cira_core::{BumpTable, BumpType, CiraResult, Diagnostics, RepairTag};

use crate::aspect::{AspectTable, Shape};

/// Rendering options; defaults match the usual 25 µm pitch interfaces.
#[derive(Debug, Clone)]
pub struct SvgOptions {
    /// Bump size factor
    pub bump_diameter: f64,
    /// Interface pitch in µm; 0 derives it from the layout with a warning
    pub pitch: f64,
    /// Margin around the map, as a multiple of the pitch
    pub margin: f64,
    /// Draw the type legend (and tag legend when an overlay is shown)
    pub legend: bool,
    /// Label bumps with their names (`_phy` stripped; POWER/GND skipped)
    pub bump_names: bool,
    pub stroke_color: String,
    pub font: String,
    /// Font scale factor
    pub font_size: f64,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            bump_diameter: 1.0,
            pitch: 25.0,
            margin: 1.0,
            legend: false,
            bump_names: false,
            stroke_color: "black".to_string(),
            font: "Arial".to_string(),
            font_size: 1.0,
        }
    }
}

/// One fault to draw on top of the map: the affected bumps and the
/// resolved tag that picks its color.
#[derive(Debug, Clone)]
pub struct FaultOverlay {
    pub bumps: Vec<String>,
    pub tag: RepairTag,
}

struct Canvas {
    body: String,
}

impl Canvas {
    fn new() -> Self {
        Self {
            body: String::new(),
        }
    }

    fn shape(&mut self, shape: Shape, x: f64, y: f64, s: f64, color: &str, stroke: &str, a: f64) {
        let element = match shape {
            Shape::Circle => format!(
                r#"  <circle cx="0" cy="0" r="{s:.3}" fill="{color}" stroke="{stroke}" stroke-width="{sw:.3}" fill-opacity="{a}" stroke-opacity="{a}" transform="translate({x:.3},{y:.3})" />"#,
                sw = s / 10.0
            ),
            Shape::Triangle => format!(
                r#"  <polygon points="{ns:.3},{s:.3} {s:.3},{s:.3} 0,{ns:.3}" fill="{color}" stroke="{stroke}" stroke-width="{sw:.3}" fill-opacity="{a}" stroke-opacity="{a}" transform="translate({x:.3},{y:.3})" />"#,
                ns = -s,
                sw = s / 10.0
            ),
            Shape::Square => format!(
                r#"  <rect x="{ns:.3}" y="{ns:.3}" width="{w:.3}" height="{w:.3}" fill="{color}" stroke="{stroke}" stroke-width="{sw:.3}" fill-opacity="{a}" stroke-opacity="{a}" transform="translate({x:.3},{y:.3})" />"#,
                ns = -s,
                w = 1.7 * s,
                sw = s / 10.0
            ),
            // Legend-only glyph: a short diagonal stroke
            Shape::Line => format!(
                r#"  <line x1="{x1:.3}" y1="{y1:.3}" x2="{x2:.3}" y2="{y2:.3}" stroke="{color}" stroke-width="{sw:.3}" />"#,
                x1 = x - s,
                y1 = y + s,
                x2 = x + s,
                y2 = y - s,
                sw = s / 6.0
            ),
        };
        self.body.push_str(&element);
        self.body.push('\n');
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: &str, width: f64, dashed: bool) {
        let dash = if dashed { r#" stroke-dasharray="2,2""# } else { "" };
        self.body.push_str(&format!(
            "  <line x1=\"{x1:.3}\" y1=\"{y1:.3}\" x2=\"{x2:.3}\" y2=\"{y2:.3}\" stroke=\"{color}\" stroke-width=\"{width:.3}\"{dash} />\n"
        ));
    }

    fn text(&mut self, x: f64, y: f64, content: &str, size: f64, font: &str, anchor: &str, angle: f64) {
        let escaped = content.replace('&', "&amp;").replace('<', "&lt;");
        self.body.push_str(&format!(
            "  <text x=\"{x:.3}\" y=\"{y:.3}\" font-size=\"{size:.3}\" font-family=\"{font}\" dominant-baseline=\"middle\" text-anchor=\"{anchor}\" transform=\"rotate({angle:.1},{x:.3},{y:.3})\">{escaped}</text>\n"
        ));
    }
}

fn distinct_count(values: impl Iterator<Item = f64>) -> usize {
    let set: HashSet<u64> = values.map(f64::to_bits).collect();
    set.len().max(1)
}

/// Render the bump map as an SVG document.
///
/// `overlay` draws one line per fault colored by its tag; only the 2-bump
/// short model is drawable — anything else produces a warning in `diag`
/// and no overlay.
pub fn render_bump_map(
    bumps: &BumpTable,
    aspect: &AspectTable,
    options: &SvgOptions,
    overlay: &[FaultOverlay],
    diag: &mut Diagnostics,
) -> CiraResult<String> {
    let bounds = bumps
        .bounds()
        .ok_or_else(|| cira_core::CiraError::InvalidParameter("empty bump map".into()))?;

    let n_columns = distinct_count(bumps.iter().map(|b| b.x));
    let n_rows = distinct_count(bumps.iter().map(|b| b.y));

    let mut pitch = options.pitch;
    if pitch == 0.0 {
        let x_pitch = bounds.width() / (n_columns as f64 / 2.0);
        let y_pitch = bounds.height() / (n_rows as f64 / 2.0);
        pitch = (x_pitch + y_pitch) / 2.0;
        diag.add_warning(
            "layout",
            format!("pitch not set, derived {pitch:.2} um from the layout"),
        );
    }

    let mut margin = options.margin * 0.7 * pitch;
    let width = bounds.width() + 2.0 * margin;
    let height = bounds.height() + 2.0 * margin;
    let s = 0.2 * options.bump_diameter * pitch;
    margin *= options.bump_diameter;

    let drawable_overlay = !overlay.is_empty() && overlay.iter().all(|f| f.bumps.len() == 2);
    if !overlay.is_empty() && !drawable_overlay {
        diag.add_warning(
            "render",
            "the repair overlay only supports the 2-bump short fault model",
        );
    }

    // Legend entries: bump types in table order, SPARE always present, then
    // the overlay's repair tags.
    let mut legend_entries: Vec<String> = Vec::new();
    if options.legend {
        for bump in bumps.iter() {
            let key = bump.kind.as_str().to_string();
            if !legend_entries.contains(&key) {
                legend_entries.push(key);
            }
        }
        if !legend_entries.iter().any(|k| k == "SPARE") {
            legend_entries.push("SPARE".to_string());
        }
        if drawable_overlay {
            for fault in overlay {
                let key = fault.tag.as_str().to_string();
                if !legend_entries.contains(&key) {
                    legend_entries.push(key);
                }
            }
        }
    }
    let legend_margin = if options.legend { 2.5 * margin } else { 0.0 };

    let alpha = if options.bump_names { 0.7 } else { 1.0 };

    let origin_x = bounds.min_x - 2.5 * margin;
    let origin_y = bounds.min_y - 2.5 * margin;
    let total_width = width + legend_margin + 2.0 * margin;
    let total_height = height + 2.0 * margin;

    let mut canvas = Canvas::new();

    // Fault overlay sits under the bumps so the shapes stay readable.
    if drawable_overlay {
        for fault in overlay {
            let style = aspect.style_for(fault.tag.as_str())?;
            let a = bumps.get(&fault.bumps[0]).ok_or_else(|| {
                cira_core::CiraError::MissingReference(format!(
                    "overlay fault names unknown bump '{}'",
                    fault.bumps[0]
                ))
            })?;
            let b = bumps.get(&fault.bumps[1]).ok_or_else(|| {
                cira_core::CiraError::MissingReference(format!(
                    "overlay fault names unknown bump '{}'",
                    fault.bumps[1]
                ))
            })?;
            match fault.tag {
                RepairTag::Catastrophic => {
                    canvas.line(a.x, a.y, b.x, b.y, &style.color, 2.0 * s / 6.0, false)
                }
                RepairTag::Benign => canvas.line(a.x, a.y, b.x, b.y, &style.color, s / 6.0, true),
                _ => canvas.line(a.x, a.y, b.x, b.y, &style.color, s / 6.0, false),
            }
        }
    }

    // One white underlay plus one styled glyph per bump
    for bump in bumps.iter() {
        let style = aspect.style_for(bump.kind.as_str())?;
        let shape = if bump.spare {
            aspect.style_for("SPARE")?.shape
        } else {
            style.shape
        };
        canvas.shape(shape, bump.x, bump.y, s, "white", &options.stroke_color, 1.0);
        canvas.shape(shape, bump.x, bump.y, s, &style.color, &options.stroke_color, alpha);

        if options.bump_names && bump.kind != BumpType::Gnd && bump.kind != BumpType::Power {
            let label = bump.name.replace("_phy", "");
            canvas.text(
                bump.x,
                bump.y,
                &label,
                options.font_size * 0.8 * 1.2 * s,
                &options.font,
                "start",
                -15.0,
            );
        }
    }

    // Legend box on the right edge
    if options.legend {
        let x_edge = width + legend_margin - margin;
        for (index, key) in legend_entries.iter().enumerate() {
            let style = aspect.style_for(key)?;
            let x_shape = x_edge - 0.65 * legend_margin;
            let y_shape = index as f64 * pitch + bounds.min_y;

            match (style.shape, key.as_str()) {
                (Shape::Line, "Catastrophic") => canvas.line(
                    x_shape - s,
                    y_shape + s,
                    x_shape + s,
                    y_shape - s,
                    &style.color,
                    2.0 * s / 6.0,
                    false,
                ),
                (Shape::Line, "Benign") => canvas.line(
                    x_shape - s,
                    y_shape + s,
                    x_shape + s,
                    y_shape - s,
                    &style.color,
                    s / 6.0,
                    true,
                ),
                (shape, _) => canvas.shape(
                    shape,
                    x_shape,
                    y_shape,
                    s,
                    &style.color,
                    &options.stroke_color,
                    1.0,
                ),
            }
            canvas.text(
                x_edge - 0.53 * legend_margin,
                y_shape,
                key,
                options.font_size * 0.8 * s,
                &options.font,
                "start",
                0.0,
            );
        }
    }

    // Axes with µm tick labels
    let axis_x = bounds.min_x - 0.75 * margin;
    canvas.line(
        axis_x,
        bounds.min_y - margin,
        axis_x,
        bounds.max_y + 0.5 * margin,
        "black",
        s / 6.0,
        false,
    );
    for i in 0..n_rows {
        let y = if n_rows > 1 {
            bounds.height() * i as f64 / (n_rows - 1) as f64
        } else {
            0.0
        };
        let y = (y * 100.0).round() / 100.0;
        canvas.text(
            axis_x - 0.2 * margin,
            y + bounds.min_y,
            &format!("{y} um"),
            options.font_size * 0.8 * 1.2 * s,
            &options.font,
            "end",
            0.0,
        );
        canvas.line(
            axis_x - 0.1 * margin,
            y + bounds.min_y,
            axis_x + 0.1 * margin,
            y + bounds.min_y,
            "black",
            s / 6.0,
            false,
        );
    }

    let axis_y = bounds.min_y - 0.75 * margin;
    canvas.line(
        bounds.min_x - margin,
        axis_y,
        bounds.max_x + 0.5 * margin,
        axis_y,
        "black",
        s / 6.0,
        false,
    );
    for i in 0..n_columns {
        let x = if n_columns > 1 {
            bounds.width() * i as f64 / (n_columns - 1) as f64
        } else {
            0.0
        };
        let x = (x * 100.0).round() / 100.0;
        canvas.text(
            x + bounds.min_x,
            axis_y - 0.2 * margin,
            &format!("{x} um"),
            options.font_size * 0.8 * 1.2 * s,
            &options.font,
            "end",
            35.0,
        );
        canvas.line(
            x + bounds.min_x,
            axis_y - 0.1 * margin,
            x + bounds.min_x,
            axis_y + 0.1 * margin,
            "black",
            s / 6.0,
            false,
        );
    }

    Ok(format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{origin_x:.3} {origin_y:.3} {total_width:.3} {total_height:.3}\">\n{}</svg>\n",
        canvas.body
    ))
}
