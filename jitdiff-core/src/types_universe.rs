//! TypeUniverse: builds the finite set of types a program may refer
//! to, as a per-seed generated nominal-type hierarchy rather than a fixed
//! one.

use crate::config::GenConfig;
use crate::random::Random;
use crate::tree::{AggregateDef, AggregateId, FuzzType, InterfaceDef, InterfaceId, PrimitiveKind, TypeDecl};
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct TypeUniverse {
    pub aggregates: Vec<AggregateDef>,
    pub interfaces: Vec<InterfaceDef>,
    /// Print order established at generation time: each aggregate
    /// preceded by the interfaces it implements that have not yet appeared.
    pub type_order: Vec<TypeDecl>,
}

impl TypeUniverse {
    /// Produce `cfg.num_aggregates` aggregates and `cfg.num_interfaces`
    /// interfaces. Aggregate field types are drawn only from primitives,
    /// arrays of those, or aggregates already generated, so the
    /// implementation graph is acyclic by forward-reference construction
    ///.
    pub fn generate_types(cfg: &GenConfig, rng: &mut Random) -> Self {
        let mut aggregates: Vec<AggregateDef> = Vec::with_capacity(cfg.num_aggregates as usize);
        let mut type_order = Vec::new();

        for id in 0..cfg.num_aggregates as usize {
            let is_class = rng.flip_coin(cfg.class_probability);
            let field_count = *rng.sample_weighted(&cfg.field_count_distribution);
            let mut fields = Vec::with_capacity(field_count as usize);
            for f in 0..field_count {
                let ty = Self::pick_field_type(&aggregates, rng);
                fields.push((format!("f{f}"), ty));
            }
            aggregates.push(AggregateDef {
                id,
                name: format!("T{id}"),
                is_class,
                fields,
                implements: BTreeSet::new(),
            });
            type_order.push(TypeDecl::Aggregate(id));
        }

        let mut interfaces: Vec<InterfaceDef> = Vec::with_capacity(cfg.num_interfaces as usize);
        for id in 0..cfg.num_interfaces as usize {
            let mut implementers = BTreeSet::new();
            for agg in &aggregates {
                // Each aggregate independently has even odds of implementing
                // each interface; at least one implementer is forced so the
                // interface is always inhabited.
                if rng.flip_coin(0.5) {
                    implementers.insert(agg.id);
                }
            }
            if implementers.is_empty() && !aggregates.is_empty() {
                implementers.insert(rng.pick_index(aggregates.len()));
            }
            interfaces.push(InterfaceDef { id, name: format!("I{id}"), implementers });
        }

        // Back-fill each implementing aggregate's `implements` set and
        // insert the interface into print order immediately before the
        // first implementer that references it.
        for iface in &interfaces {
            let mut inserted = false;
            for &agg_id in &iface.implementers {
                aggregates[agg_id].implements.insert(iface.id);
                if !inserted {
                    let pos = type_order
                        .iter()
                        .position(|d| matches!(d, TypeDecl::Aggregate(a) if *a == agg_id))
                        .unwrap_or(type_order.len());
                    type_order.insert(pos, TypeDecl::Interface(iface.id));
                    inserted = true;
                }
            }
            if !inserted {
                type_order.insert(0, TypeDecl::Interface(iface.id));
            }
        }

        TypeUniverse { aggregates, interfaces, type_order }
    }

    fn pick_field_type(existing: &[AggregateDef], rng: &mut Random) -> FuzzType {
        let roll = rng.next_in_range(0, 9);
        match roll {
            0..=5 => FuzzType::Primitive(*rng.pick_element(&PrimitiveKind::ALL)),
            6..=7 if !existing.is_empty() => {
                let id = rng.pick_index(existing.len());
                FuzzType::Aggregate(id)
            }
            _ => {
                let elem = FuzzType::Primitive(*rng.pick_element(&PrimitiveKind::ALL));
                FuzzType::Array { element: Box::new(elem), rank: 1 }
            }
        }
    }

    /// Pick any type in the universe, independently deciding (with
    /// `by_ref_prob`) whether to wrap it in `Ref`.
    pub fn pick_type(&self, by_ref_prob: f64, rng: &mut Random) -> FuzzType {
        let base = self.pick_type_no_ref(rng);
        if rng.flip_coin(by_ref_prob) {
            base.make_ref()
        } else {
            base
        }
    }

    pub fn pick_type_no_ref(&self, rng: &mut Random) -> FuzzType {
        let roll = rng.next_in_range(0, 9);
        match roll {
            0..=5 => FuzzType::Primitive(*rng.pick_element(&PrimitiveKind::ALL)),
            6..=7 if !self.aggregates.is_empty() => {
                FuzzType::Aggregate(rng.pick_index(self.aggregates.len()))
            }
            8 if !self.interfaces.is_empty() => {
                FuzzType::Interface(rng.pick_index(self.interfaces.len()))
            }
            _ => {
                let elem = FuzzType::Primitive(*rng.pick_element(&PrimitiveKind::ALL));
                FuzzType::Array { element: Box::new(elem), rank: 1 }
            }
        }
    }

    pub fn pick_primitive(&self, predicate: impl Fn(PrimitiveKind) -> bool, rng: &mut Random) -> PrimitiveKind {
        let candidates: Vec<PrimitiveKind> = PrimitiveKind::ALL.into_iter().filter(|k| predicate(*k)).collect();
        if candidates.is_empty() {
            PrimitiveKind::Int
        } else {
            *rng.pick_element(&candidates)
        }
    }

    pub fn get_primitive(&self, kind: PrimitiveKind) -> PrimitiveKind {
        kind
    }

    pub fn get_implementers(&self, interface: InterfaceId) -> &BTreeSet<AggregateId> {
        &self.interfaces[interface].implementers
    }

    pub fn aggregate(&self, id: AggregateId) -> &AggregateDef {
        &self.aggregates[id]
    }

    pub fn interface(&self, id: InterfaceId) -> &InterfaceDef {
        &self.interfaces[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_fields_only_reference_earlier_aggregates() {
        let cfg = GenConfig::default();
        let mut rng = Random::new(5);
        let universe = TypeUniverse::generate_types(&cfg, &mut rng);
        for agg in &universe.aggregates {
            for (_, ty) in &agg.fields {
                if let FuzzType::Aggregate(other) = ty {
                    assert!(*other < agg.id, "forward reference only");
                }
                assert!(!ty.is_ref(), "aggregate field types never reference Ref");
            }
        }
    }

    #[test]
    fn every_interface_has_an_implementer() {
        let cfg = GenConfig::default();
        let mut rng = Random::new(9);
        let universe = TypeUniverse::generate_types(&cfg, &mut rng);
        for iface in &universe.interfaces {
            assert!(!iface.implementers.is_empty());
        }
    }

    #[test]
    fn determinism() {
        let cfg = GenConfig::default();
        let mut a = Random::new(123);
        let mut b = Random::new(123);
        let ua = TypeUniverse::generate_types(&cfg, &mut a);
        let ub = TypeUniverse::generate_types(&cfg, &mut b);
        assert_eq!(ua.aggregates.len(), ub.aggregates.len());
        assert_eq!(
            format!("{:?}", ua.aggregates),
            format!("{:?}", ub.aggregates)
        );
    }
}
