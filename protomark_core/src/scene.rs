// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Built scenes and instances.

use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::Point;
use protomark_geom::{Distance, Shape, Weight};

use crate::mark::MarkId;
use crate::value::Value;

/// Computes the hit-test shape of instance `index` of a scene.
///
/// Scene-level (rather than instance-level) so connected marks such as lines can use their
/// neighbors.
pub type ShapeFn = fn(&Scene, usize) -> Option<Shape>;

/// Current value of a def (state variable) in a scene.
#[derive(Clone, Debug, PartialEq)]
pub struct DefState {
    /// Id of the declaration or write that produced `value`; `0` once evaluated from a
    /// declaration.
    pub id: usize,
    /// The current value.
    pub value: Value,
}

/// Lifecycle of an instance relative to the previous render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// No instance matched in the previous scene.
    #[default]
    Enter,
    /// Carried forward from the previous scene.
    Update,
}

/// One datum's worth of computed properties.
#[derive(Clone, Debug, Default)]
pub struct Instance {
    /// Position in the scene.
    pub index: usize,
    /// Stable id (`Null` when reconciled by index).
    pub id: Value,
    /// The datum.
    pub data: Value,
    /// Whether the instance is drawn. Invisible instances have no children.
    pub visible: bool,
    /// Computed properties.
    pub values: HashMap<&'static str, Value>,
    /// Child scenes, one per child mark (panels only).
    pub children: Vec<Scene>,
    /// Whether the instance entered in this render or was carried forward.
    pub phase: Phase,
}

impl Instance {
    /// Creates an empty instance for `data` at `index`.
    pub fn new(index: usize, data: Value) -> Self {
        Self {
            index,
            data,
            ..Self::default()
        }
    }

    /// The computed value of a property (`Null` if absent).
    ///
    /// `id`, `datum` and `visible` read the dedicated fields.
    pub fn get(&self, name: &str) -> Value {
        match name {
            "id" => self.id.clone(),
            "datum" => self.data.clone(),
            "visible" => Value::Bool(self.visible),
            _ => self.values.get(name).cloned().unwrap_or_default(),
        }
    }

    /// The computed value of a numeric property.
    pub fn number(&self, name: &str) -> Option<f64> {
        match name {
            "id" | "datum" | "visible" => self.get(name).as_f64(),
            _ => self.values.get(name).and_then(Value::as_f64),
        }
    }

    /// Stores a computed value, routing `id`, `datum` and `visible` to their fields.
    pub fn set(&mut self, name: &'static str, value: Value) {
        match name {
            "id" => self.id = value,
            "datum" => self.data = value,
            "visible" => self.visible = value.truthy(),
            _ => {
                self.values.insert(name, value);
            }
        }
    }

    /// Copies computed values of a previous instance, without its children.
    pub(crate) fn carry(old: &Self, index: usize, data: Value) -> Self {
        Self {
            index,
            id: old.id.clone(),
            data,
            visible: old.visible,
            values: old.values.clone(),
            children: Vec::new(),
            phase: Phase::Update,
        }
    }
}

/// The instances of one mark under one parent instance.
#[derive(Clone, Debug)]
pub struct Scene {
    /// The mark that produced the scene.
    pub mark: MarkId,
    /// Name of the mark's type, for renderers.
    pub kind: &'static str,
    /// One instance per datum.
    pub instances: Vec<Instance>,
    /// Def (state variable) values.
    pub defs: HashMap<&'static str, DefState>,
    /// Accumulated panel scale at which the scene was built.
    pub scale: f64,
    /// Hit-test shape hook of the mark's type.
    pub shape: Option<ShapeFn>,
}

impl Scene {
    /// Creates an empty scene.
    pub fn new(mark: MarkId, kind: &'static str) -> Self {
        Self {
            mark,
            kind,
            instances: Vec::new(),
            defs: HashMap::new(),
            scale: 1.0,
            shape: None,
        }
    }

    /// Number of instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether the scene has no instances.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// The instance at `index`.
    pub fn get(&self, index: usize) -> Option<&Instance> {
        self.instances.get(index)
    }

    /// The current value of a def.
    pub fn def(&self, name: &str) -> Option<&Value> {
        self.defs.get(name).map(|d| &d.value)
    }

    /// Hit-test shape of instance `index`, in the scene's local coordinates.
    pub fn shape_of(&self, index: usize) -> Option<Shape> {
        let shape = self.shape?;
        if !self.instances.get(index)?.visible {
            return None;
        }
        shape(self, index)
    }

    /// The visible instance closest to `p` (local coordinates), ranked by weighted cost.
    pub fn nearest(&self, p: Point, weight: Weight) -> Option<(usize, Distance)> {
        let mut best: Option<(usize, Distance)> = None;
        for index in 0..self.instances.len() {
            let Some(shape) = self.shape_of(index) else {
                continue;
            };
            let d = shape.distance2(p, weight);
            if best.is_none_or(|(_, b)| d.min(b) != b) {
                best = Some((index, d));
            }
        }
        best
    }

    /// Visible instances whose shape contains `p`, topmost (last drawn) first.
    pub fn hits(&self, p: Point) -> Vec<usize> {
        (0..self.instances.len())
            .rev()
            .filter(|&i| self.shape_of(i).is_some_and(|s| s.contains_point(p)))
            .collect()
    }
}
