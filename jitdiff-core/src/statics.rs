//! StaticsPool: a pool of process-global variables generated on
//! demand, each with a seeded literal initializer and a name minted from a
//! monotonically increasing counter.

use crate::literal::LiteralGen;
use crate::random::Random;
use crate::tree::{Expr, FuzzType, StaticField, VariableIdentifier, ESCAPE_STATIC};
use crate::types_universe::TypeUniverse;

#[derive(Debug, Default)]
pub struct StaticsPool {
    fields: Vec<StaticField>,
    counter: u32,
}

impl StaticsPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &[StaticField] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<StaticField> {
        self.fields
    }

    /// Return a random existing static matching `ty`, or generate one.
    pub fn pick_static(
        &mut self,
        ty: Option<&FuzzType>,
        universe: &TypeUniverse,
        literal_bias: f64,
        rng: &mut Random,
    ) -> &VariableIdentifier {
        let matching: Vec<usize> = match ty {
            Some(t) => self
                .fields
                .iter()
                .enumerate()
                .filter(|(_, f)| &f.var.ty == t)
                .map(|(i, _)| i)
                .collect(),
            None => (0..self.fields.len()).collect(),
        };
        let idx = if matching.is_empty() {
            self.generate_new_field(ty, universe, literal_bias, rng)
        } else {
            *rng.pick_element(&matching)
        };
        &self.fields[idx].var
    }

    /// Generate and register a new static field, returning its index.
    pub fn generate_new_field(
        &mut self,
        ty: Option<&FuzzType>,
        universe: &TypeUniverse,
        literal_bias: f64,
        rng: &mut Random,
    ) -> usize {
        let ty = match ty {
            Some(t) => t.clone(),
            None => universe.pick_type(0.0, rng),
        };
        let name = format!("s_{}", self.counter);
        self.counter += 1;
        let gen = LiteralGen::new(universe, literal_bias);
        let init_literal = gen.generate(&ty, rng);
        let init = Expr::Literal(init_literal);
        let var = VariableIdentifier { ty, name, ref_escape_scope: ESCAPE_STATIC, read_only: false };
        self.fields.push(StaticField { var, init });
        self.fields.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenConfig;

    #[test]
    fn pick_static_reuses_matching_field() {
        let cfg = GenConfig::default();
        let mut rng = Random::new(4);
        let universe = TypeUniverse::generate_types(&cfg, &mut rng);
        let mut pool = StaticsPool::new();
        let ty = FuzzType::Primitive(crate::tree::PrimitiveKind::Int);
        pool.generate_new_field(Some(&ty), &universe, cfg.literal_bias_probability, &mut rng);
        let before = pool.fields().len();
        let picked = pool.pick_static(Some(&ty), &universe, cfg.literal_bias_probability, &mut rng).name.clone();
        assert_eq!(pool.fields().len(), before, "reused rather than regenerated");
        assert!(pool.fields().iter().any(|f| f.var.name == picked));
    }

    #[test]
    fn generated_names_are_monotonic_and_unique() {
        let cfg = GenConfig::default();
        let mut rng = Random::new(5);
        let universe = TypeUniverse::generate_types(&cfg, &mut rng);
        let mut pool = StaticsPool::new();
        for _ in 0..5 {
            pool.generate_new_field(None, &universe, cfg.literal_bias_probability, &mut rng);
        }
        let names: Vec<&str> = pool.fields().iter().map(|f| f.var.name.as_str()).collect();
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(names.len(), unique.len());
    }
}
