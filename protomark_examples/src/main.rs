// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Demos for `protomark_core`: a bar chart with anchored labels, a click handler driving a def,
//! a transition between two renders and a pie chart in a transformed panel.

mod svg;

use std::error::Error;
use std::f64::consts::TAU;

use kurbo::Point;
use peniko::Color;
use protomark_core::geom::Weight;
use protomark_core::transition::cubic_in_out;
use protomark_core::{
    Anchor, Event, InstancePath, MarkId, PropertyError, RawEvent, Transition, Value, Vis,
    mark_type,
};

const DATA: [f64; 6] = [3.0, 7.0, 4.0, 9.0, 2.0, 5.0];
const SELECTED: Color = Color::from_rgb8(0xd6, 0x27, 0x28);

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut renderer = svg::SvgRenderer::default();
    let (mut vis, bar) = bar_chart();
    vis.render(&mut renderer)?;
    std::fs::write("protomark_bars.svg", renderer.svg())?;

    click_nearest_bar(&mut vis, bar, Point::new(47.0, 100.0), &mut renderer)?;
    std::fs::write("protomark_bars_selected.svg", renderer.svg())?;

    transition_frames(&mut vis, bar)?;

    let mut pie = pie_chart();
    pie.render(&mut renderer)?;
    std::fs::write("protomark_pie.svg", renderer.svg())?;

    tracing::info!(frames = renderer.frames(), "wrote protomark_*.svg");
    Ok(())
}

fn bar_chart() -> (Vis, MarkId) {
    let mut vis = Vis::new();
    let root = vis.root();
    vis.edit(root)
        .expect("root exists")
        .set("width", 200.0)
        .set("height", 120.0)
        .set("fillStyle", Color::WHITE);
    let bar = vis
        .add(root, mark_type::bar())
        .expect("root is a panel")
        .data(DATA.to_vec())
        .def("active", Value::Null)
        .set_fn("id", |ctx| ctx.index())
        .set("bottom", 0.0)
        .set("width", 20.0)
        .set_fn("left", |ctx| ctx.index() as f64 * 30.0 + 10.0)
        .set_fn("height", |ctx| ctx.datum().as_f64().unwrap_or(0.0) * 10.0)
        .set_fn("fillStyle", |ctx| -> Result<Value, PropertyError> {
            if ctx.get("active").as_f64() == Some(ctx.index() as f64) {
                Ok(SELECTED.into())
            } else {
                ctx.delegate()
            }
        })
        .on(Event::Click, |ev| {
            ev.set_def("active", ev.cursor().index());
            Ok(Some(ev.cursor().mark()))
        })
        .id();

    let top = vis.anchor(bar, Anchor::Top).expect("bar exists");
    vis.add(root, mark_type::label())
        .expect("root is a panel")
        .extend(top)
        .expect("anchors are detached")
        .set("textBaseline", "bottom");
    (vis, bar)
}

/// Picks the bar nearest to `canvas` (bars sit directly in the root panel) and clicks it.
fn click_nearest_bar(
    vis: &mut Vis,
    bar: MarkId,
    canvas: Point,
    renderer: &mut svg::SvgRenderer,
) -> Result<(), Box<dyn Error>> {
    let paths = vis.instances(bar)?;
    let Some(path) = paths.first() else {
        return Ok(());
    };
    let local = vis.context(path, |c| c.mouse(canvas))?;
    let nearest = vis
        .context(path, |c| c.scene().nearest(local, Weight::collapse_y()))?
        .map(|(index, _)| index);
    let Some(index) = nearest else {
        return Ok(());
    };
    let target = InstancePath::root(vis, 0).child(bar, index);
    let handled = vis.dispatch(Event::Click, &target, RawEvent::at(canvas), renderer)?;
    tracing::info!(index, handled, "clicked bar");
    Ok(())
}

/// Renders new data and writes the halfway frame of the transition to it.
fn transition_frames(vis: &mut Vis, bar: MarkId) -> Result<(), Box<dyn Error>> {
    let before = vis.scene().ok_or("nothing rendered")?.clone();
    let mut next: Vec<f64> = DATA.iter().map(|d| 10.0 - d).collect();
    next.truncate(4);
    vis.edit(bar)?.data(next);
    let mut noop = |_: &protomark_core::Scene| {};
    vis.render(&mut noop)?;
    let after = vis.scene().ok_or("nothing rendered")?;

    let slot = vis.mark(bar)?.child_index();
    let old = &before.instances[0].children[slot];
    let mut frame = after.clone();
    let bars = &mut frame.instances[0].children[slot];
    let mut transition = Transition::new(old, bars, 0.5, cubic_in_out);
    transition.step(0.25, bars);
    tracing::info!(
        progress = transition.progress(),
        exiting = transition.exiting().len(),
        "transition frame"
    );
    std::fs::write("protomark_transition.svg", svg::to_svg_string(&frame))?;
    Ok(())
}

fn pie_chart() -> Vis {
    let mut vis = Vis::new();
    let root = vis.root();
    let panel = vis
        .edit(root)
        .expect("root exists")
        .set("width", 200.0)
        .set("height", 200.0)
        .add(mark_type::panel())
        .expect("root is a panel")
        .set("left", 100.0)
        .set("top", 100.0)
        .set("width", 0.0)
        .set("height", 0.0)
        .set("transform", 0.8)
        .id();
    let total: f64 = DATA.iter().sum();
    vis.add(panel, mark_type::wedge())
        .expect("panel is a panel")
        .data(DATA.to_vec())
        .set("left", 0.0)
        .set("top", 0.0)
        .set("innerRadius", 30.0)
        .set("outerRadius", 90.0)
        .set_fn("angle", move |ctx| {
            ctx.datum().as_f64().unwrap_or(0.0) / total * TAU
        })
        .set("strokeStyle", Color::WHITE);
    vis
}
