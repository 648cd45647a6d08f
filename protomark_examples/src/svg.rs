// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal SVG output for rendered scenes.

use std::fmt::Write as _;

use kurbo::Point;
use peniko::Color;
use protomark_core::{Instance, Renderer, Scene, Value};

/// A renderer that keeps the last scene as an SVG document.
#[derive(Debug, Default)]
pub(crate) struct SvgRenderer {
    svg: String,
    frames: usize,
}

impl SvgRenderer {
    pub(crate) fn svg(&self) -> &str {
        &self.svg
    }

    pub(crate) fn frames(&self) -> usize {
        self.frames
    }
}

impl Renderer for SvgRenderer {
    fn update(&mut self, scene: &Scene) {
        self.svg = to_svg_string(scene);
        self.frames += 1;
    }
}

/// Renders the root scene into a standalone SVG document.
pub(crate) fn to_svg_string(root: &Scene) -> String {
    let (w, h) = root
        .get(0)
        .map(|s| (s.number("width").unwrap_or(100.0), s.number("height").unwrap_or(100.0)))
        .unwrap_or((100.0, 100.0));
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}">"#
    );
    write_scene(&mut out, root);
    out.push_str("</svg>\n");
    out
}

fn write_scene(out: &mut String, scene: &Scene) {
    match scene.kind {
        "line" => write_line(out, scene),
        "area" => write_area(out, scene),
        _ => {
            for s in scene.instances.iter().filter(|s| s.visible) {
                write_instance(out, scene.kind, s);
            }
        }
    }
}

fn write_instance(out: &mut String, kind: &str, s: &Instance) {
    let left = s.number("left").unwrap_or(0.0);
    let top = s.number("top").unwrap_or(0.0);
    match kind {
        "panel" | "bar" => {
            let (w, h) = (s.number("width").unwrap_or(0.0), s.number("height").unwrap_or(0.0));
            // SVG rejects negative sizes.
            let (x, y) = (left.min(left + w), top.min(top + h));
            let _ = write!(
                out,
                r#"<rect x="{x}" y="{y}" width="{}" height="{}""#,
                w.abs(),
                h.abs()
            );
            write_paint(out, s);
            out.push_str("/>\n");
            if kind == "panel" {
                let t = s.get("transform").as_transform().unwrap_or_default();
                let _ = writeln!(
                    out,
                    r#"<g transform="translate({} {}) translate({} {}) scale({})">"#,
                    left, top, t.x, t.y, t.k
                );
                for child in &s.children {
                    write_scene(out, child);
                }
                out.push_str("</g>\n");
            }
        }
        "dot" => {
            let r = s.number("shapeRadius").unwrap_or(0.0);
            let _ = write!(out, r#"<circle cx="{left}" cy="{top}" r="{r}""#);
            write_paint(out, s);
            out.push_str("/>\n");
        }
        "rule" => {
            let (w, h) = (s.number("width").unwrap_or(0.0), s.number("height").unwrap_or(0.0));
            let _ = write!(
                out,
                r#"<line x1="{left}" y1="{top}" x2="{}" y2="{}""#,
                left + w,
                top + h
            );
            write_paint(out, s);
            out.push_str("/>\n");
        }
        "wedge" => write_wedge(out, s, left, top),
        "label" => write_label(out, s, left, top),
        _ => {}
    }
}

fn write_line(out: &mut String, scene: &Scene) {
    let points: Vec<Point> = scene
        .instances
        .iter()
        .filter(|s| s.visible)
        .filter_map(|s| Some(Point::new(s.number("left")?, s.number("top")?)))
        .collect();
    let Some(first) = scene.instances.iter().find(|s| s.visible) else {
        return;
    };
    out.push_str(r#"<polyline points=""#);
    write_points(out, &points);
    out.push('"');
    out.push_str(r#" fill="none""#);
    write_stroke(out, first);
    out.push_str("/>\n");
}

fn write_area(out: &mut String, scene: &Scene) {
    let visible: Vec<&Instance> = scene.instances.iter().filter(|s| s.visible).collect();
    let Some(first) = visible.first() else {
        return;
    };
    let mut points = Vec::with_capacity(visible.len() * 2);
    for s in &visible {
        points.push(Point::new(
            s.number("left").unwrap_or(0.0),
            s.number("top").unwrap_or(0.0),
        ));
    }
    for s in visible.iter().rev() {
        points.push(Point::new(
            s.number("left").unwrap_or(0.0) + s.number("width").unwrap_or(0.0),
            s.number("top").unwrap_or(0.0) + s.number("height").unwrap_or(0.0),
        ));
    }
    out.push_str(r#"<polygon points=""#);
    write_points(out, &points);
    out.push('"');
    write_paint(out, first);
    out.push_str("/>\n");
}

fn write_wedge(out: &mut String, s: &Instance, cx: f64, cy: f64) {
    let a0 = s.number("startAngle").unwrap_or(0.0);
    let a1 = s.number("endAngle").unwrap_or(a0);
    let r0 = s.number("innerRadius").unwrap_or(0.0);
    let r1 = s.number("outerRadius").unwrap_or(0.0);
    let at = |r: f64, a: f64| (cx + r * a.cos(), cy + r * a.sin());
    let large = u8::from((a1 - a0).abs() > std::f64::consts::PI);
    let sweep = u8::from(a1 >= a0);
    let (p0, p1) = (at(r1, a0), at(r1, a1));
    let mut d = format!(
        "M{} {} A{r1} {r1} 0 {large} {sweep} {} {}",
        p0.0, p0.1, p1.0, p1.1
    );
    if r0 > 0.0 {
        let (q1, q0) = (at(r0, a1), at(r0, a0));
        let _ = write!(
            d,
            " L{} {} A{r0} {r0} 0 {large} {} {} {}",
            q1.0,
            q1.1,
            1 - sweep,
            q0.0,
            q0.1
        );
    } else {
        let _ = write!(d, " L{cx} {cy}");
    }
    d.push('Z');
    let _ = write!(out, r#"<path d="{d}""#);
    write_paint(out, s);
    out.push_str("/>\n");
}

fn write_label(out: &mut String, s: &Instance, x: f64, y: f64) {
    let anchor = match s.get("textAlign").as_str() {
        Some("center") => "middle",
        Some("right") => "end",
        _ => "start",
    };
    let baseline = match s.get("textBaseline").as_str() {
        Some("top") => "hanging",
        Some("middle") => "middle",
        _ => "alphabetic",
    };
    let margin = s.number("textMargin").unwrap_or(0.0);
    let dy = match baseline {
        "hanging" => margin,
        "alphabetic" => -margin,
        _ => 0.0,
    };
    let _ = write!(
        out,
        r#"<text x="{x}" y="{}" text-anchor="{anchor}" dominant-baseline="{baseline}""#,
        y + dy
    );
    if let Some(font) = s.get("font").as_str() {
        let _ = write!(out, r#" style="font: {}""#, escape_xml(font));
    }
    let angle = s.number("textAngle").unwrap_or(0.0);
    if angle != 0.0 {
        let _ = write!(
            out,
            r#" transform="rotate({} {x} {y})""#,
            angle.to_degrees()
        );
    }
    write_color_attr(out, "fill", s.get("textStyle").as_color());
    out.push('>');
    let text = match s.get("text") {
        Value::Null => String::new(),
        v => v.to_string(),
    };
    out.push_str(&escape_xml(&text));
    out.push_str("</text>\n");
}

fn write_points(out: &mut String, points: &[Point]) {
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{},{}", p.x, p.y);
    }
}

fn write_paint(out: &mut String, s: &Instance) {
    write_color_attr(out, "fill", s.get("fillStyle").as_color());
    write_stroke(out, s);
}

fn write_stroke(out: &mut String, s: &Instance) {
    let stroke = s.get("strokeStyle").as_color();
    write_color_attr(out, "stroke", stroke);
    if stroke.is_some_and(|c| c.components[3] > 0.0) {
        if let Some(w) = s.number("lineWidth") {
            let _ = write!(out, r#" stroke-width="{w}""#);
        }
    }
}

fn write_color_attr(out: &mut String, name: &str, color: Option<Color>) {
    let Some(color) = color else {
        let _ = write!(out, r#" {name}="none""#);
        return;
    };
    let rgba = color.to_rgba8();
    if rgba.a == 0 {
        let _ = write!(out, r#" {name}="none""#);
        return;
    }
    let _ = write!(out, r##" {name}="#{:02x}{:02x}{:02x}""##, rgba.r, rgba.g, rgba.b);
    if rgba.a != 255 {
        let _ = write!(out, r#" {name}-opacity="{}""#, f64::from(rgba.a) / 255.0);
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
