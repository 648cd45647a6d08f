// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interpolating between two builds of the same scene.

use alloc::vec::Vec;

use hashbrown::HashMap;
use peniko::Color;

use crate::scene::{Instance, Phase, Scene};
use crate::value::{IdKey, Value};

/// An easing curve over `[0, 1]`.
pub type Ease = fn(f64) -> f64;

/// Identity easing.
pub fn linear(t: f64) -> f64 {
    t
}

/// Cubic ease-in-out.
pub fn cubic_in_out(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = 2.0 * t - 2.0;
        0.5 * u * u * u + 1.0
    }
}

/// How one property moves from its start to its end value.
#[derive(Clone, Debug, PartialEq)]
pub enum Interpolation {
    /// Linear interpolation of numbers.
    Number {
        /// Start value.
        from: f64,
        /// End value.
        to: f64,
    },
    /// Component-wise interpolation of colors.
    Color {
        /// Start value.
        from: Color,
        /// End value.
        to: Color,
    },
    /// Anything else switches from `from` to `to` halfway through.
    Discrete {
        /// Start value.
        from: Value,
        /// End value.
        to: Value,
    },
}

impl Interpolation {
    /// Picks the strategy for a pair of values.
    pub fn between(from: &Value, to: &Value) -> Self {
        match (from, to) {
            (Value::Number(a), Value::Number(b)) if a.is_finite() && b.is_finite() => {
                Self::Number { from: *a, to: *b }
            }
            (Value::Color(a), Value::Color(b)) => Self::Color { from: *a, to: *b },
            _ => Self::Discrete {
                from: from.clone(),
                to: to.clone(),
            },
        }
    }

    /// The value at progress `t` (already eased).
    pub fn at(&self, t: f64) -> Value {
        match self {
            Self::Number { from, to } => Value::Number(from + (to - from) * t),
            Self::Color { from, to } => {
                let (a, b) = (from.components, to.components);
                #[expect(clippy::cast_possible_truncation, reason = "color channels are f32")]
                let t = t as f32;
                Value::Color(Color::new([
                    a[0] + (b[0] - a[0]) * t,
                    a[1] + (b[1] - a[1]) * t,
                    a[2] + (b[2] - a[2]) * t,
                    a[3] + (b[3] - a[3]) * t,
                ]))
            }
            Self::Discrete { from, to } => {
                if t < 0.5 {
                    from.clone()
                } else {
                    to.clone()
                }
            }
        }
    }

    /// The terminal value.
    pub fn end(&self) -> Value {
        self.at(1.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Scene(usize),
    Exiting(usize),
}

#[derive(Clone, Debug)]
struct Track {
    slot: Slot,
    name: &'static str,
    interpolation: Interpolation,
}

const STYLES: [&str; 3] = ["fillStyle", "strokeStyle", "textStyle"];

fn faded(v: &Value) -> Option<Value> {
    let c = v.as_color()?;
    let [r, g, b, _] = c.components;
    Some(Value::Color(Color::new([r, g, b, 0.0])))
}

/// An animation from one build of a scene to the next.
///
/// The interpolation table is computed once. Instances of the new scene matched in the old one
/// (by `id`, else by index) interpolate every changed property; entering instances fade their
/// styles in; exiting instances are held here (not in the scene) while their styles fade out.
#[derive(Clone, Debug)]
pub struct Transition {
    duration: f64,
    ease: Ease,
    elapsed: f64,
    tracks: Vec<Track>,
    exiting: Vec<Instance>,
}

impl Transition {
    /// Computes the interpolation table from `before` to `after`.
    pub fn new(before: &Scene, after: &Scene, duration: f64, ease: Ease) -> Self {
        let by_id: HashMap<IdKey, usize> = before
            .instances
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.id.id_key().map(|k| (k, i)))
            .collect();
        let mut matched = alloc::vec![false; before.instances.len()];
        let mut tracks = Vec::new();

        for (i, new) in after.instances.iter().enumerate() {
            let old = match new.id.id_key() {
                Some(k) => by_id.get(&k).copied(),
                None => (i < before.instances.len()).then_some(i),
            };
            match old.map(|o| (o, &before.instances[o])) {
                Some((o, old)) if old.visible && new.visible => {
                    matched[o] = true;
                    for (&name, to) in &new.values {
                        let from = old.values.get(name).cloned().unwrap_or_default();
                        if &from != to {
                            tracks.push(Track {
                                slot: Slot::Scene(i),
                                name,
                                interpolation: Interpolation::between(&from, to),
                            });
                        }
                    }
                }
                other => {
                    // A record that was visible and is now hidden fades out as an exiting copy.
                    if let Some((o, old)) = other {
                        matched[o] = !old.visible;
                    }
                    if !new.visible {
                        continue;
                    }
                    for name in STYLES {
                        if let Some(to) = new.values.get(name) {
                            if let Some(from) = faded(to) {
                                tracks.push(Track {
                                    slot: Slot::Scene(i),
                                    name,
                                    interpolation: Interpolation::between(&from, to),
                                });
                            }
                        }
                    }
                }
            }
        }

        let mut exiting = Vec::new();
        for (o, old) in before.instances.iter().enumerate() {
            if matched[o] || !old.visible {
                continue;
            }
            let slot = Slot::Exiting(exiting.len());
            for name in STYLES {
                if let Some(from) = old.values.get(name) {
                    if let Some(to) = faded(from) {
                        tracks.push(Track {
                            slot,
                            name,
                            interpolation: Interpolation::between(from, &to),
                        });
                    }
                }
            }
            exiting.push(old.clone());
        }

        tracing::debug!(
            mark = ?after.mark,
            tracks = tracks.len(),
            exiting = exiting.len(),
            "transition planned",
        );
        Self {
            duration,
            ease,
            elapsed: 0.0,
            tracks,
            exiting,
        }
    }

    /// Number of interpolated `(instance, property)` pairs.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether nothing changes.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty() && self.exiting.is_empty()
    }

    /// The interpolation planned for a property of an instance of the new scene.
    pub fn interpolation(&self, index: usize, name: &str) -> Option<&Interpolation> {
        self.tracks
            .iter()
            .find(|t| t.slot == Slot::Scene(index) && t.name == name)
            .map(|t| &t.interpolation)
    }

    /// Instances that left the scene and are still fading out.
    pub fn exiting(&self) -> &[Instance] {
        &self.exiting
    }

    /// Eased progress in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.ease)((self.elapsed / self.duration).clamp(0.0, 1.0))
    }

    /// Whether the transition reached its end.
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Advances by `dt` and writes interpolated values into `scene` (the new build).
    ///
    /// Returns `true` once finished; the scene then holds its terminal values.
    pub fn step(&mut self, dt: f64, scene: &mut Scene) -> bool {
        self.elapsed += dt.max(0.0);
        if self.is_finished() {
            self.stop(scene);
            return true;
        }
        let t = self.progress();
        self.apply(scene, |i| i.at(t));
        false
    }

    /// Finishes immediately: terminal values are written and exiting instances dropped.
    pub fn stop(&mut self, scene: &mut Scene) {
        self.elapsed = self.duration;
        self.apply(scene, Interpolation::end);
        self.exiting.clear();
        for instance in &mut scene.instances {
            instance.phase = Phase::Update;
        }
    }

    fn apply(&mut self, scene: &mut Scene, value: impl Fn(&Interpolation) -> Value) {
        for track in &self.tracks {
            let target = match track.slot {
                Slot::Scene(i) => scene.instances.get_mut(i),
                Slot::Exiting(i) => self.exiting.get_mut(i),
            };
            if let Some(instance) = target {
                instance.set(track.name, value(&track.interpolation));
            }
        }
    }
}
