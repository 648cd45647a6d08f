// Copyright 2025 the Protomark Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binding: resolving which property records apply to a mark.

use alloc::rc::Rc;
use alloc::vec::Vec;

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use smallvec::{SmallVec, smallvec};

use crate::error::Error;
use crate::mark::{MarkId, Vis};
use crate::property::{Property, PropertyKind};
use crate::value::Value;

/// Names evaluated before everything else, in this order.
pub const REQUIRED: [&str; 3] = ["id", "datum", "visible"];

/// The winning record for a name, followed by the records it overrides.
#[derive(Clone, Debug)]
pub struct Bound {
    chain: SmallVec<[Rc<Property>; 2]>,
}

impl Bound {
    /// The property name.
    pub fn name(&self) -> &'static str {
        self.chain[0].name
    }

    /// The winning record.
    pub fn head(&self) -> &Rc<Property> {
        &self.chain[0]
    }

    /// Evaluation bucket of the winning record.
    pub fn kind(&self) -> PropertyKind {
        self.chain[0].kind
    }

    /// The winning record and the records it delegates to, nearest first.
    pub fn chain(&self) -> &[Rc<Property>] {
        &self.chain
    }
}

/// Resolved properties of one mark, computed once per render.
#[derive(Clone, Debug)]
pub struct Binds {
    /// The bound mark.
    pub mark: MarkId,
    /// The `data` property.
    pub data: Option<Bound>,
    /// `id`, `datum` and `visible` (those that are bound), in that order.
    pub required: SmallVec<[Bound; 3]>,
    /// Defs, then constants, then functions; functions in authoring order.
    pub optional: Vec<Bound>,
    /// The defs, in the same order as in `optional`.
    pub defs: Vec<Bound>,
    /// Evaluation rank of each optional property.
    pub net: HashMap<&'static str, usize>,
    /// Every bound name.
    pub properties: HashMap<&'static str, Bound>,
    pub(crate) tracked: bool,
}

impl Binds {
    /// Whether `name` is an optional property.
    pub fn is_optional(&self, name: &str) -> bool {
        self.net.contains_key(name)
    }

    /// Whether `name` is a def.
    pub fn is_def(&self, name: &str) -> bool {
        self.properties.get(name).is_some_and(|b| b.kind().is_def())
    }

    /// Raises `reader` above `dependency` and re-sorts `optional` by rank (stably).
    ///
    /// Ranks are bounded by the longest dependency chain, so reaching the number of optional
    /// properties means the reads form a cycle.
    pub(crate) fn update_net(
        &mut self,
        edges: &[(&'static str, &'static str)],
    ) -> Result<(), Error> {
        let limit = self.optional.len();
        for &(reader, dependency) in edges {
            let floor = self.net.get(dependency).copied().unwrap_or(0) + 1;
            let rank = self.net.entry(reader).or_insert(0);
            if *rank < floor {
                *rank = floor;
            }
            if *rank >= limit {
                return Err(Error::DependencyCycle {
                    mark: self.mark,
                    name: reader,
                });
            }
        }
        let net = &self.net;
        self.optional
            .sort_by_key(|b| net.get(b.name()).copied().unwrap_or(0));
        tracing::trace!(
            mark = ?self.mark,
            order = ?self.optional.iter().map(Bound::name).collect::<Vec<_>>(),
            "re-sorted optional properties",
        );
        Ok(())
    }
}

/// Resolves the property records of `mark`.
///
/// Own records come first, then each prototype's, then the type defaults (type before base). Per
/// mark, records are visited newest first. The first record seen for a name wins and later ones
/// form its delegation chain. Declared properties that nothing sets are bound to an explicit
/// `Null` constant so that implied values get computed for them.
pub fn bind(vis: &Vis, mark: MarkId) -> Result<Binds, Error> {
    let m = vis.mark(mark)?;
    let mut order: Vec<&'static str> = Vec::new();
    let mut chains: HashMap<&'static str, SmallVec<[Rc<Property>; 2]>> = HashMap::new();
    let mut visit = |p: &Rc<Property>| match chains.entry(p.name) {
        Entry::Occupied(mut e) => e.get_mut().push(p.clone()),
        Entry::Vacant(e) => {
            order.push(p.name);
            e.insert(smallvec![p.clone()]);
        }
    };

    let protos: SmallVec<[_; 4]> = vis.proto_chain(mark).collect();
    for (_, pm) in &protos {
        for p in pm.properties().iter().rev() {
            visit(p);
        }
    }
    for ty in m.ty().chain() {
        for p in ty.defaults().iter().rev() {
            visit(p);
        }
    }

    for (_, pm) in &protos {
        for name in pm.ty().declared() {
            if !chains.contains_key(name) {
                order.push(name);
                let placeholder = Property::constant(name, Value::Null, None, false).with_tag("unset");
                chains.insert(name, smallvec![Rc::new(placeholder)]);
            }
        }
    }

    let mut data = None;
    let mut required: [Option<Bound>; 3] = [None, None, None];
    let mut buckets: [Vec<Bound>; 4] = core::array::from_fn(|_| Vec::new());
    let mut properties = HashMap::with_capacity(order.len());
    for name in order {
        let Some(chain) = chains.remove(name) else {
            continue;
        };
        let bound = Bound { chain };
        properties.insert(name, bound.clone());
        if name == "data" {
            data = Some(bound);
        } else if let Some(slot) = REQUIRED.iter().position(|r| *r == name) {
            required[slot] = Some(bound);
        } else {
            buckets[bound.kind().bucket()].push(bound);
        }
    }
    buckets[PropertyKind::DefFn.bucket()].reverse();
    buckets[PropertyKind::Fn.bucket()].reverse();

    let defs: Vec<Bound> = buckets[..2].iter().flatten().cloned().collect();
    let optional: Vec<Bound> = buckets.into_iter().flatten().collect();
    let net = optional.iter().map(|b| (b.name(), 0)).collect();
    let required: SmallVec<[Bound; 3]> = required.into_iter().flatten().collect();

    tracing::debug!(
        ?mark,
        ty = m.ty().name(),
        required = required.len(),
        optional = optional.len(),
        defs = defs.len(),
        "bound mark",
    );

    Ok(Binds {
        mark,
        data,
        required,
        optional,
        defs,
        net,
        properties,
        tracked: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mark_type;

    fn names(bounds: &[Bound]) -> Vec<&'static str> {
        bounds.iter().map(Bound::name).collect()
    }

    #[test]
    fn required_properties_are_in_fixed_order() {
        let mut vis = Vis::new();
        let bar = vis
            .add(vis.root(), mark_type::bar())
            .unwrap()
            .set_fn("visible", |_| true)
            .set("id", "a")
            .id();
        let binds = bind(&vis, bar).unwrap();
        assert_eq!(names(&binds.required), ["id", "datum", "visible"]);
        assert!(binds.data.is_some());
    }

    #[test]
    fn functions_keep_authoring_order_across_prototypes() {
        let mut vis = Vis::new();
        let proto = vis
            .create(mark_type::bar())
            .set_fn("left", |_| 1.0)
            .set_fn("top", |_| 2.0)
            .id();
        let bar = vis
            .add(vis.root(), mark_type::bar())
            .unwrap()
            .extend(proto)
            .unwrap()
            .set_fn("width", |_| 3.0)
            .set_fn("height", |_| 4.0)
            .id();
        let binds = bind(&vis, bar).unwrap();
        let fns: Vec<_> = binds
            .optional
            .iter()
            .filter(|b| b.kind() == PropertyKind::Fn)
            .map(Bound::name)
            .collect();
        // Defaults are visited after every mark, so the reversed function bucket puts them first.
        assert_eq!(fns, ["fillStyle", "left", "top", "width", "height"]);
    }

    #[test]
    fn overridden_records_form_a_delegation_chain() {
        let mut vis = Vis::new();
        let proto = vis.create(mark_type::bar()).set("lineWidth", 4.0).id();
        let bar = vis
            .add(vis.root(), mark_type::bar())
            .unwrap()
            .extend(proto)
            .unwrap()
            .set("lineWidth", 2.0)
            .id();
        let binds = bind(&vis, bar).unwrap();
        let chain = binds.properties["lineWidth"].chain();
        // Own, prototype, then the type default.
        assert_eq!(chain.len(), 3);
        assert!(chain.windows(2).all(|w| w[0].id > w[1].id || w[1].tag == Some("default")));
    }

    #[test]
    fn unset_declared_properties_get_null_placeholders() {
        let mut vis = Vis::new();
        let bar = vis.add(vis.root(), mark_type::bar()).unwrap().id();
        let binds = bind(&vis, bar).unwrap();
        for name in ["left", "right", "top", "bottom", "width", "height", "strokeStyle"] {
            let b = &binds.properties[name];
            assert_eq!(b.head().tag, Some("unset"), "{name} should be a placeholder");
            assert!(binds.is_optional(name));
        }
        assert!(binds.net.values().all(|&n| n == 0));
    }

    #[test]
    fn defs_precede_properties() {
        let mut vis = Vis::new();
        let bar = vis
            .add(vis.root(), mark_type::bar())
            .unwrap()
            .set("left", 1.0)
            .def("active", -1.0)
            .def_fn("hover", |_| Value::Null)
            .id();
        let binds = bind(&vis, bar).unwrap();
        assert_eq!(names(&binds.defs), ["active", "hover"]);
        assert_eq!(names(&binds.optional[..2]), ["active", "hover"]);
        assert!(binds.is_def("active"));
        assert!(!binds.is_def("left"));
    }

    #[test]
    fn cycles_exhaust_the_rank_bound() {
        let mut vis = Vis::new();
        let bar = vis.add(vis.root(), mark_type::bar()).unwrap().id();
        let mut binds = bind(&vis, bar).unwrap();
        let mut result = Ok(());
        for _ in 0..binds.optional.len() {
            result = binds.update_net(&[("left", "top"), ("top", "left")]);
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(Error::DependencyCycle { .. })));
    }
}
