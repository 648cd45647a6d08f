// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

extern crate std;

use alloc::vec;
use alloc::vec::Vec;

use kurbo::Point;
use protomark_geom::Weight;

use crate::*;

#[derive(Debug, Default)]
struct Count(usize);

impl Renderer for Count {
    fn update(&mut self, _: &Scene) {
        self.0 += 1;
    }
}

fn sized_vis(w: f64, h: f64) -> Vis {
    let mut vis = Vis::new();
    let root = vis.root();
    vis.edit(root).unwrap().set("width", w).set("height", h);
    vis
}

fn child_scene(vis: &Vis, k: usize) -> &Scene {
    &vis.scene().expect("rendered").instances[0].children[k]
}

fn widths(scene: &Scene) -> Vec<Option<f64>> {
    scene.instances.iter().map(|s| s.number("width")).collect()
}

fn bar_chart(vis: &mut Vis) -> MarkId {
    let root = vis.root();
    vis.add(root, mark_type::bar())
        .unwrap()
        .data(vec![1.0, 2.0, 3.0])
        .set("bottom", 0.0)
        .set_fn("width", |ctx| ctx.datum().as_f64().unwrap_or(0.0) * 10.0)
        .set_fn("left", |ctx| ctx.index() as f64 * 20.0)
        .set("height", 10.0)
        .id()
}

#[test]
fn panel_and_bars_resolve_positions() {
    let mut vis = sized_vis(150.0, 150.0);
    let bar = bar_chart(&mut vis);
    let mut count = Count::default();
    vis.render(&mut count).unwrap();
    assert_eq!(count.0, 1);

    let scene = child_scene(&vis, 0);
    assert_eq!(scene.mark, bar);
    assert_eq!(scene.kind, "bar");
    assert_eq!(scene.len(), 3);
    assert_eq!(widths(scene), [Some(10.0), Some(20.0), Some(30.0)]);
    let lefts: Vec<_> = scene.instances.iter().map(|s| s.number("left")).collect();
    assert_eq!(lefts, [Some(0.0), Some(20.0), Some(40.0)]);
    // Completed by the box model.
    assert_eq!(scene.instances[0].number("top"), Some(140.0));
    assert_eq!(scene.instances[2].number("right"), Some(80.0));
}

#[test]
fn bars_inherit_the_panel_datum() {
    let mut vis = sized_vis(150.0, 150.0);
    let root = vis.root();
    let panel = vis
        .add(root, mark_type::panel())
        .unwrap()
        .data(vec![1.0, 2.0, 3.0])
        .id();
    let bar = vis
        .add(panel, mark_type::bar())
        .unwrap()
        .set_fn("width", |ctx| ctx.datum().as_f64().unwrap_or(0.0) * 10.0)
        .set_fn("left", |ctx| ctx.parent_index() as f64 * 20.0)
        .id();
    vis.render(&mut Count::default()).unwrap();

    let panels = child_scene(&vis, 0);
    assert_eq!(panels.len(), 3);
    let bars: Vec<(Value, Option<f64>, Option<f64>)> = panels
        .instances
        .iter()
        .map(|p| {
            let scene = &p.children[0];
            assert_eq!(scene.mark, bar);
            assert_eq!(scene.len(), 1, "one bar per panel instance");
            let s = &scene.instances[0];
            (s.data.clone(), s.number("width"), s.number("left"))
        })
        .collect();
    assert_eq!(
        bars,
        [
            (Value::from(1.0), Some(10.0), Some(0.0)),
            (Value::from(2.0), Some(20.0), Some(20.0)),
            (Value::from(3.0), Some(30.0), Some(40.0)),
        ]
    );
}

#[test]
fn mark_debug_lists_handler_count() {
    let mut vis = Vis::new();
    let root = vis.root();
    let bar = vis
        .add(root, mark_type::bar())
        .unwrap()
        .on(Event::Click, |ev| {
            let _ = ev.mouse();
            Ok(None)
        })
        .id();
    let dump = alloc::format!("{:?}", vis.mark(bar).unwrap());
    assert!(dump.contains("handlers: 1"), "{dump}");
    assert!(dump.contains("\"bar\""), "{dump}");
}

#[test]
fn handlers_see_the_raw_event() {
    use alloc::rc::Rc;
    use core::cell::Cell;

    let mut vis = sized_vis(150.0, 150.0);
    let bar = bar_chart(&mut vis);
    let seen = Rc::new(Cell::new(Point::ZERO));
    let sink = seen.clone();
    vis.on(bar, Event::MouseMove, move |ev| {
        sink.set(ev.mouse());
        assert_eq!(ev.event(), Event::MouseMove);
        Ok(None)
    })
    .unwrap();
    vis.render(&mut Count::default()).unwrap();

    let path = InstancePath::root(&vis, 0).child(bar, 0);
    let raw = RawEvent::at((12.0, 34.0));
    assert!(vis.dispatch(Event::MouseMove, &path, raw, &mut Count::default()).unwrap());
    assert_eq!(seen.get(), Point::new(12.0, 34.0));
}

#[test]
fn required_properties_see_earlier_required_values() {
    let mut vis = sized_vis(100.0, 100.0);
    let root = vis.root();
    vis.add(root, mark_type::bar())
        .unwrap()
        .data(vec![Value::record([("name", "a"), ("kind", "x")]), Value::record([("name", "b"), ("kind", "y")])])
        .set_fn("id", |ctx| ctx.datum().field("name").cloned().unwrap_or_default())
        .set_fn("datum", |ctx| ctx.datum().field("kind").cloned().unwrap_or_default())
        .set_fn("visible", |ctx| ctx.get("id") == Value::from("b") && ctx.get("datum") == Value::from("y"));
    vis.render(&mut Count::default()).unwrap();

    let scene = child_scene(&vis, 0);
    assert!(!scene.instances[0].visible);
    assert!(scene.instances[1].visible);
    assert_eq!(scene.instances[1].data, Value::from("y"));
    assert_eq!(scene.instances[1].id, Value::from("b"));
}

#[test]
fn null_bypasses_casts() {
    let mut vis = sized_vis(100.0, 100.0);
    let root = vis.root();
    let bar = vis
        .add(root, mark_type::bar())
        .unwrap()
        .set_fn("lineWidth", |ctx| if ctx.index() == 0 { Value::Null } else { Value::from("3") })
        .set("title", 12.0)
        .id();
    vis.render(&mut Count::default()).unwrap();
    let s = &child_scene(&vis, 0).instances[0];
    assert_eq!(s.get("lineWidth"), Value::Null, "null must not become NaN");
    assert_eq!(s.get("title"), Value::from("12"));

    vis.edit(bar).unwrap().data(vec![0.0, 1.0]);
    vis.render(&mut Count::default()).unwrap();
    assert_eq!(child_scene(&vis, 0).instances[1].number("lineWidth"), Some(3.0));
}

#[test]
fn delegate_extends_the_prototype_value() {
    let mut vis = sized_vis(100.0, 100.0);
    let root = vis.root();
    let proto = vis
        .create(mark_type::bar())
        .set_fn("top", |ctx| ctx.index() as f64 * 5.0)
        .id();
    vis.add(root, mark_type::bar())
        .unwrap()
        .data(vec![0.0, 1.0, 2.0])
        .extend(proto)
        .unwrap()
        .set_fn("top", |ctx| -> Result<Value, PropertyError> {
            Ok((ctx.delegate()?.as_f64().unwrap_or(0.0) + 10.0).into())
        });
    vis.render(&mut Count::default()).unwrap();
    let tops: Vec<_> = child_scene(&vis, 0)
        .instances
        .iter()
        .map(|s| s.number("top"))
        .collect();
    assert_eq!(tops, [Some(10.0), Some(15.0), Some(20.0)]);
}

#[test]
fn delegating_past_the_chain_gives_null() {
    let mut vis = sized_vis(100.0, 100.0);
    let root = vis.root();
    vis.add(root, mark_type::bar())
        .unwrap()
        .set_fn("title", |ctx| -> Result<Value, PropertyError> { ctx.delegate() })
        .set_fn("fillStyle", |ctx| -> Result<Value, PropertyError> { ctx.delegate() });
    vis.render(&mut Count::default()).unwrap();
    let s = &child_scene(&vis, 0).instances[0];
    assert!(s.get("title").is_null());
    // The type default supplies a category color.
    assert_eq!(s.get("fillStyle"), Value::Color(mark_type::CATEGORY10[0]));
}

#[test]
fn scene_length_follows_data_and_invisible_panels_have_no_children() {
    let mut vis = sized_vis(100.0, 100.0);
    let root = vis.root();
    let panel = vis
        .add(root, mark_type::panel())
        .unwrap()
        .data(vec!["a", "b", "c"])
        .set_fn("visible", |ctx| ctx.index() != 1)
        .id();
    vis.add(panel, mark_type::bar()).unwrap().data(vec![1.0, 2.0]);
    vis.render(&mut Count::default()).unwrap();

    let panels = child_scene(&vis, 0);
    assert_eq!(panels.len(), 3);
    for s in &panels.instances {
        if s.visible {
            assert_eq!(s.children.len(), 1);
            assert_eq!(s.children[0].len(), 2);
        } else {
            assert!(s.children.is_empty());
        }
    }
}

#[test]
fn data_shapes_are_normalized() {
    let mut vis = sized_vis(100.0, 100.0);
    let root = vis.root();
    let single = vis.add(root, mark_type::dot()).unwrap().data(7.0).id();
    let none = vis.add(root, mark_type::dot()).unwrap().data(Value::Null).id();
    vis.render(&mut Count::default()).unwrap();
    assert_eq!(child_scene(&vis, 0).mark, single);
    assert_eq!(child_scene(&vis, 0).instances[0].data, Value::from(7.0));
    assert_eq!(child_scene(&vis, 1).mark, none);
    assert!(child_scene(&vis, 1).is_empty());
}

#[test]
fn nested_data_stack() {
    let mut vis = sized_vis(100.0, 100.0);
    let root = vis.root();
    let panel = vis
        .add(root, mark_type::panel())
        .unwrap()
        .data(vec![Value::list([1.0, 2.0]), Value::list([3.0])])
        .id();
    vis.add(panel, mark_type::bar())
        .unwrap()
        .data_fn(|ctx| ctx.data(0))
        .set_fn("title", |ctx| {
            let outer = ctx.data(1).as_list().map_or(0, <[Value]>::len);
            alloc::format!("{}/{}", ctx.datum(), outer)
        });
    vis.render(&mut Count::default()).unwrap();

    let panels = child_scene(&vis, 0);
    assert_eq!(panels.instances[0].children[0].len(), 2);
    assert_eq!(panels.instances[1].children[0].len(), 1);
    assert_eq!(
        panels.instances[1].children[0].instances[0].get("title"),
        Value::from("3/1")
    );
}

#[test]
fn out_of_order_reads_are_reordered() {
    let mut vis = sized_vis(100.0, 100.0);
    let root = vis.root();
    vis.add(root, mark_type::bar())
        .unwrap()
        .data(vec![1.0, 2.0])
        // `width` is evaluated before `left` in authoring order.
        .set_fn("width", |ctx| ctx.number("left").unwrap_or(-100.0) + 1.0)
        .set_fn("left", |ctx| ctx.datum().as_f64().unwrap_or(0.0) * 10.0);
    vis.render(&mut Count::default()).unwrap();
    assert_eq!(widths(child_scene(&vis, 0)), [Some(11.0), Some(21.0)]);
}

#[test]
fn stale_reads_without_tracking() {
    let mut vis = sized_vis(100.0, 100.0);
    vis.set_options(BuildOptions {
        track_dependencies: false,
    });
    let root = vis.root();
    vis.add(root, mark_type::bar())
        .unwrap()
        .set_fn("width", |ctx| ctx.number("left").unwrap_or(-100.0) + 1.0)
        .set_fn("left", |_| 5.0);
    vis.render(&mut Count::default()).unwrap();
    assert_eq!(widths(child_scene(&vis, 0)), [Some(-99.0)]);
    // The next render carries the previous value forward.
    vis.render(&mut Count::default()).unwrap();
    assert_eq!(widths(child_scene(&vis, 0)), [Some(6.0)]);
}

#[test]
fn mutual_reads_are_a_dependency_cycle() {
    let mut vis = sized_vis(100.0, 100.0);
    let root = vis.root();
    vis.add(root, mark_type::bar())
        .unwrap()
        .set_fn("left", |ctx| ctx.number("top").unwrap_or(0.0))
        .set_fn("top", |ctx| ctx.number("left").unwrap_or(0.0));
    let err = vis.render(&mut Count::default()).unwrap_err();
    assert!(matches!(err, Error::DependencyCycle { .. }), "{err:?}");
}

#[test]
fn failed_render_keeps_previous_scene() {
    let mut vis = sized_vis(150.0, 150.0);
    let bar = bar_chart(&mut vis);
    let mut count = Count::default();
    vis.render(&mut count).unwrap();

    vis.set_fn(bar, "width", |ctx| -> Result<Value, PropertyError> {
        if ctx.index() == 2 {
            Err(PropertyError::msg("no width for you"))
        } else {
            Ok(1.0.into())
        }
    })
    .unwrap();
    let err = vis.render(&mut count).unwrap_err();
    assert!(
        matches!(err, Error::Property { name: "width", .. }),
        "unexpected error: {err:?}"
    );
    assert_eq!(count.0, 1, "the renderer must not see a partial scene");
    assert_eq!(widths(child_scene(&vis, 0)), [Some(10.0), Some(20.0), Some(30.0)]);
}

#[test]
fn instances_are_reconciled_by_id() {
    let mut vis = sized_vis(100.0, 100.0);
    let root = vis.root();
    let bar = vis
        .add(root, mark_type::bar())
        .unwrap()
        .data(vec!["a", "b"])
        .set_fn("id", |ctx| ctx.datum())
        .id();
    vis.render(&mut Count::default()).unwrap();
    assert!(child_scene(&vis, 0).instances.iter().all(|s| s.phase == Phase::Enter));

    vis.edit(bar).unwrap().data(vec!["c", "b"]);
    vis.render(&mut Count::default()).unwrap();
    let scene = child_scene(&vis, 0);
    assert_eq!(scene.len(), 2);
    assert_eq!(scene.instances[0].phase, Phase::Enter);
    assert_eq!(scene.instances[1].phase, Phase::Update);
    assert_eq!(scene.instances[1].index, 1);
}

#[test]
fn defs_persist_and_handlers_write_them() {
    let mut vis = sized_vis(150.0, 150.0);
    let bar = bar_chart(&mut vis);
    let red = Color::from_rgb8(255, 0, 0);
    vis.edit(bar)
        .unwrap()
        .def("active", -1.0)
        .set_fn("fillStyle", move |ctx| {
            if ctx.get("active").as_f64() == Some(ctx.index() as f64) {
                Value::Color(red)
            } else {
                Value::Null
            }
        })
        .on(Event::Click, |ev| {
            let i = ev.cursor().index();
            ev.set_def("active", i);
            Ok(Some(ev.cursor().mark()))
        });
    let mut count = Count::default();
    vis.render(&mut count).unwrap();
    let fills = |vis: &Vis| -> Vec<Value> {
        child_scene(vis, 0).instances.iter().map(|s| s.get("fillStyle")).collect()
    };
    assert!(fills(&vis).iter().all(|f| *f == Value::Color(Color::TRANSPARENT)));

    let path = InstancePath::root(&vis, 0).child(bar, 1);
    assert!(vis.dispatch(Event::Click, &path, RawEvent::default(), &mut count).unwrap());
    assert_eq!(count.0, 2, "the returned mark is re-rendered once");
    assert_eq!(child_scene(&vis, 0).def("active"), Some(&Value::from(1_usize)));
    assert_eq!(fills(&vis)[1], Value::Color(red));
    assert_eq!(fills(&vis)[0], Value::Color(Color::TRANSPARENT));

    // Later renders keep the written value.
    vis.render(&mut count).unwrap();
    assert_eq!(fills(&vis)[1], Value::Color(red));
}

#[test]
fn events_bubble_to_enclosing_panels() {
    use alloc::rc::Rc;
    use core::cell::RefCell;

    let mut vis = sized_vis(150.0, 150.0);
    let bar = bar_chart(&mut vis);
    let seen: Rc<RefCell<Vec<(MarkId, &'static str)>>> = Rc::default();
    let (a, b) = (seen.clone(), seen.clone());
    let root = vis.root();
    vis.edit(root)
        .unwrap()
        .on(Event::MouseDown, move |ev| {
            a.borrow_mut().push((ev.cursor().mark(), "first"));
            Ok(None)
        })
        .on(Event::MouseDown, move |ev| {
            b.borrow_mut().push((ev.cursor().mark(), "second"));
            Ok(None)
        });
    let mut count = Count::default();
    vis.render(&mut count).unwrap();

    let path = InstancePath::root(&vis, 0).child(bar, 2);
    assert!(vis.dispatch(Event::MouseDown, &path, RawEvent::default(), &mut count).unwrap());
    assert_eq!(*seen.borrow(), [(root, "first"), (root, "second")]);
    assert!(!vis.dispatch(Event::Click, &path, RawEvent::default(), &mut count).unwrap());
    assert_eq!(count.0, 1, "no mark was returned");
}

#[test]
fn handler_failures_are_reported() {
    let mut vis = sized_vis(150.0, 150.0);
    let bar = bar_chart(&mut vis);
    vis.on(bar, Event::Custom("boom"), |_| Err(PropertyError::msg("boom")))
        .unwrap();
    vis.render(&mut Count::default()).unwrap();
    let path = InstancePath::root(&vis, 0).child(bar, 0);
    let err = vis
        .dispatch(Event::from_name("boom"), &path, RawEvent::default(), &mut Count::default())
        .unwrap_err();
    assert!(matches!(err, Error::Handler { event: "boom", .. }));
}

#[test]
fn property_writes_from_handlers_apply_before_rerender() {
    let mut vis = sized_vis(150.0, 150.0);
    let bar = bar_chart(&mut vis);
    vis.on(bar, Event::Click, |ev| {
        ev.set("height", 50.0);
        Ok(Some(ev.cursor().mark()))
    })
    .unwrap();
    let mut count = Count::default();
    vis.render(&mut count).unwrap();
    let path = InstancePath::root(&vis, 0).child(bar, 0);
    vis.dispatch(Event::Click, &path, RawEvent::default(), &mut count).unwrap();
    assert_eq!(vis.get(&path, "height").unwrap(), Value::from(50.0));
    assert_eq!(vis.get(&path, "top").unwrap(), Value::from(100.0));
}

#[test]
fn render_mark_rebuilds_only_that_mark() {
    let mut vis = sized_vis(150.0, 150.0);
    let bar = bar_chart(&mut vis);
    let root = vis.root();
    let other = vis.add(root, mark_type::dot()).unwrap().set("title", "before").id();
    let mut count = Count::default();
    vis.render(&mut count).unwrap();

    vis.set(bar, "height", 20.0).unwrap();
    vis.set(other, "title", "after").unwrap();
    vis.render_mark(bar, &mut count).unwrap();
    assert_eq!(count.0, 2);
    assert_eq!(child_scene(&vis, 0).instances[0].number("height"), Some(20.0));
    assert_eq!(child_scene(&vis, 1).instances[0].get("title"), Value::from("before"));
}

#[test]
fn paths_address_instances() {
    let mut vis = sized_vis(150.0, 150.0);
    let bar = bar_chart(&mut vis);
    vis.render(&mut Count::default()).unwrap();

    let paths = vis.instances(bar).unwrap();
    assert_eq!(paths.len(), 3);
    assert_eq!(vis.get(&paths[1], "width").unwrap(), Value::from(20.0));
    vis.context(&paths[2], |c| {
        assert_eq!(c.datum(), &Value::from(3.0));
        assert_eq!(c.parent("width"), Value::from(150.0));
        assert_eq!(c.path(), paths[2]);
    })
    .unwrap();

    let missing = InstancePath::root(&vis, 0).child(bar, 9);
    assert!(matches!(
        vis.get(&missing, "width"),
        Err(Error::MissingInstance { index: 9, .. })
    ));
    let wrong = InstancePath::default().child(bar, 0);
    assert!(matches!(vis.get(&wrong, "width"), Err(Error::InvalidPath)));
}

#[test]
fn mouse_inverts_panel_offsets_and_transforms() {
    let mut vis = sized_vis(200.0, 200.0);
    let root = vis.root();
    let panel = vis
        .add(root, mark_type::panel())
        .unwrap()
        .set("left", 10.0)
        .set("top", 20.0)
        .set("width", 100.0)
        .set("height", 100.0)
        .set("transform", Transform { k: 2.0, x: 0.0, y: 0.0 })
        .id();
    let dot = vis.add(panel, mark_type::dot()).unwrap().id();
    vis.render(&mut Count::default()).unwrap();

    let path = InstancePath::root(&vis, 0).child(panel, 0).child(dot, 0);
    let (local, scale) = vis
        .context(&path, |c| (c.mouse(Point::new(30.0, 40.0)), c.scale()))
        .unwrap();
    assert_eq!(local, Point::new(10.0, 10.0));
    assert_eq!(scale, 2.0);
}

#[test]
fn adding_to_a_non_panel_fails() {
    let mut vis = Vis::new();
    let root = vis.root();
    let bar = vis.add(root, mark_type::bar()).unwrap().id();
    assert!(matches!(
        vis.add(bar, mark_type::dot()),
        Err(Error::NotAPanel { .. })
    ));
    let proto = vis.create(mark_type::bar()).extend(bar).unwrap().id();
    assert!(matches!(vis.extend(bar, proto), Err(Error::ProtoCycle { .. })));
}

#[test]
fn anchors_follow_their_target() {
    let mut vis = sized_vis(150.0, 150.0);
    let bar = bar_chart(&mut vis);
    let top = vis.anchor(bar, Anchor::Top).unwrap();
    let root = vis.root();
    let label = vis
        .add(root, mark_type::label())
        .unwrap()
        .extend(top)
        .unwrap()
        .id();
    vis.render(&mut Count::default()).unwrap();

    let bars = child_scene(&vis, 0);
    let labels = child_scene(&vis, 1);
    assert_eq!(labels.mark, label);
    assert_eq!(labels.len(), bars.len());
    for (b, l) in bars.instances.iter().zip(&labels.instances) {
        let (bl, bw) = (b.number("left").unwrap(), b.number("width").unwrap());
        assert_eq!(l.number("left"), Some(bl + bw / 2.0));
        assert_eq!(l.number("bottom"), Some(10.0));
        assert_eq!(l.get("textAlign"), Value::from("center"));
        assert_eq!(l.get("textBaseline"), Value::from("top"));
        assert_eq!(l.data, b.data);
    }
}

#[test]
fn anchors_need_an_earlier_target() {
    let mut vis = sized_vis(150.0, 150.0);
    let root = vis.root();
    let label = vis.add(root, mark_type::label()).unwrap().id();
    let bar = bar_chart(&mut vis);
    let anchor = vis.anchor(bar, Anchor::Center).unwrap();
    vis.extend(label, anchor).unwrap();
    let err = vis.render(&mut Count::default()).unwrap_err();
    assert!(matches!(err, Error::Property { name: "data", .. }), "{err:?}");
}

#[test]
fn nearest_bar_is_hit_tested() {
    let mut vis = sized_vis(150.0, 150.0);
    bar_chart(&mut vis);
    vis.render(&mut Count::default()).unwrap();
    let scene = child_scene(&vis, 0);
    // Bar 1 spans x in [20, 40] and y in [140, 150].
    let (index, d) = scene.nearest(Point::new(25.0, 145.0), Weight::UNIT).unwrap();
    assert_eq!(index, 1);
    assert!(d.is_zero());
    let (index, d) = scene.nearest(Point::new(45.0, 100.0), Weight::UNIT).unwrap();
    assert_eq!(index, 2);
    assert!(!d.is_zero());
    assert_eq!(scene.hits(Point::new(5.0, 145.0)), [0]);
}

#[test]
fn transitions_run_between_renders() {
    let mut vis = sized_vis(150.0, 150.0);
    let bar = bar_chart(&mut vis);
    vis.render(&mut Count::default()).unwrap();
    let before = child_scene(&vis, 0).clone();

    vis.set(bar, "height", 30.0).unwrap();
    vis.render(&mut Count::default()).unwrap();
    let mut after = child_scene(&vis, 0).clone();
    let mut tr = Transition::new(&before, &after, 1.0, transition::linear);
    assert_eq!(
        tr.interpolation(0, "height"),
        Some(&Interpolation::Number { from: 10.0, to: 30.0 })
    );
    tr.step(0.5, &mut after);
    assert_eq!(after.instances[0].number("height"), Some(20.0));
    tr.stop(&mut after);
    assert_eq!(after.instances[0].number("height"), Some(30.0));
}
