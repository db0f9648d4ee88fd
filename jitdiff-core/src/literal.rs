//! LiteralGen: produces a random literal for any type.

use crate::random::Random;
use crate::tree::{FuzzType, Literal, PrimitiveKind};
use crate::types_universe::TypeUniverse;

/// Generates literals, biasing toward 0/1/-1/min/max.
#[derive(Debug)]
pub struct LiteralGen<'a> {
    universe: &'a TypeUniverse,
    bias_probability: f64,
}

impl<'a> LiteralGen<'a> {
    pub fn new(universe: &'a TypeUniverse, bias_probability: f64) -> Self {
        Self { universe, bias_probability }
    }

    /// Generate a literal of exactly `ty` (never `Ref` — callers needing a
    /// `Ref`-typed initializer take the `Expr::Ref(..)` path in the
    /// Synthesizer instead). The division-by-zero exclusion only applies to
    /// raw primitive literals placed directly in a divisor position, which
    /// this never does on its own.
    pub fn generate(&self, ty: &FuzzType, rng: &mut Random) -> Literal {
        match ty.strip_ref() {
            FuzzType::Primitive(kind) => self.primitive(*kind, rng),
            FuzzType::Array { element, .. } => Literal::ZeroArray { element: element.clone() },
            FuzzType::Aggregate(id) => {
                let def = self.universe.aggregate(*id);
                let fields = def
                    .fields
                    .iter()
                    .map(|(_, fty)| self.generate(fty, rng))
                    .collect();
                Literal::Aggregate { id: *id, fields }
            }
            FuzzType::Interface(_) => {
                // An interface has no literal form of its own; fall back to
                // a literal of one of its implementers so callers that need
                // *some* value (e.g. a default field initializer) get one.
                let iface = match ty.strip_ref() {
                    FuzzType::Interface(id) => *id,
                    _ => unreachable!(),
                };
                let implementers = self.universe.get_implementers(iface);
                match implementers.iter().next() {
                    Some(agg_id) => self.generate(&FuzzType::Aggregate(*agg_id), rng),
                    None => Literal::Int(0),
                }
            }
            FuzzType::Ref(_) => unreachable!("strip_ref removes Ref"),
        }
    }

    fn primitive(&self, kind: PrimitiveKind, rng: &mut Random) -> Literal {
        if rng.flip_coin(self.bias_probability) {
            return self.biased_primitive(kind, rng);
        }
        self.uniform_primitive(kind, rng)
    }

    fn biased_primitive(&self, kind: PrimitiveKind, rng: &mut Random) -> Literal {
        use PrimitiveKind::*;
        // Pick among {0, 1, -1 (signed only), min, max}, uniformly.
        let choices: u32 = if kind.signed() || kind.is_floating() { 5 } else { 4 };
        let pick = rng.next_in_range(0, choices as i64 - 1);
        match kind {
            Bool => Literal::Bool(pick % 2 == 0),
            SByte => Literal::SByte(match pick { 0 => 0, 1 => 1, 2 => -1, 3 => i8::MIN, _ => i8::MAX }),
            Byte => Literal::Byte(match pick { 0 => 0, 1 => 1, 2 => u8::MAX / 2, _ => u8::MAX }),
            Short => Literal::Short(match pick { 0 => 0, 1 => 1, 2 => -1, 3 => i16::MIN, _ => i16::MAX }),
            UShort => Literal::UShort(match pick { 0 => 0, 1 => 1, 2 => u16::MAX / 2, _ => u16::MAX }),
            Int => Literal::Int(match pick { 0 => 0, 1 => 1, 2 => -1, 3 => i32::MIN, _ => i32::MAX }),
            UInt => Literal::UInt(match pick { 0 => 0, 1 => 1, 2 => u32::MAX / 2, _ => u32::MAX }),
            Long => Literal::Long(match pick { 0 => 0, 1 => 1, 2 => -1, 3 => i64::MIN, _ => i64::MAX }),
            ULong => Literal::ULong(match pick { 0 => 0, 1 => 1, 2 => u64::MAX / 2, _ => u64::MAX }),
            Char => Literal::Char(if pick == 0 { '\0' } else { 'a' }),
            Float => Literal::Float(match pick { 0 => 0.0, 1 => 1.0, 2 => -1.0, 3 => f32::MIN, _ => f32::MAX }),
            Double => Literal::Double(match pick { 0 => 0.0, 1 => 1.0, 2 => -1.0, 3 => f64::MIN, _ => f64::MAX }),
        }
    }

    fn uniform_primitive(&self, kind: PrimitiveKind, rng: &mut Random) -> Literal {
        use PrimitiveKind::*;
        match kind {
            Bool => Literal::Bool(rng.flip_coin(0.5)),
            SByte => Literal::SByte(rng.next_in_range(i8::MIN as i64, i8::MAX as i64) as i8),
            Byte => Literal::Byte(rng.next_in_range(0, u8::MAX as i64) as u8),
            Short => Literal::Short(rng.next_in_range(i16::MIN as i64, i16::MAX as i64) as i16),
            UShort => Literal::UShort(rng.next_in_range(0, u16::MAX as i64) as u16),
            Int => Literal::Int(rng.next_in_range(i32::MIN as i64, i32::MAX as i64) as i32),
            UInt => Literal::UInt(rng.next_in_range(0, u32::MAX as i64) as u32),
            Long => {
                let hi = rng.next_u64() as i64;
                Literal::Long(hi)
            }
            ULong => Literal::ULong(rng.next_u64()),
            Char => Literal::Char(char::from_u32(rng.next_in_range(32, 126) as u32).unwrap_or('a')),
            Float => Literal::Float(rng.next_in_range(-1_000_000, 1_000_000) as f32 / 1000.0),
            Double => Literal::Double(rng.next_in_range(-1_000_000, 1_000_000) as f64 / 1000.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenConfig;

    #[test]
    fn zero_length_array_literal_is_length_one() {
        let cfg = GenConfig::default();
        let mut rng = Random::new(1);
        let universe = TypeUniverse::generate_types(&cfg, &mut rng);
        let gen = LiteralGen::new(&universe, cfg.literal_bias_probability);
        let arr_ty = FuzzType::Array { element: Box::new(FuzzType::Primitive(PrimitiveKind::Int)), rank: 1 };
        let lit = gen.generate(&arr_ty, &mut rng);
        assert!(matches!(lit, Literal::ZeroArray { .. }));
    }

    #[test]
    fn aggregate_literal_has_one_field_value_per_field() {
        let cfg = GenConfig::default();
        let mut rng = Random::new(2);
        let universe = TypeUniverse::generate_types(&cfg, &mut rng);
        let gen = LiteralGen::new(&universe, cfg.literal_bias_probability);
        let id = 0;
        let lit = gen.generate(&FuzzType::Aggregate(id), &mut rng);
        if let Literal::Aggregate { fields, .. } = lit {
            assert_eq!(fields.len(), universe.aggregate(id).fields.len());
        } else {
            panic!("expected aggregate literal");
        }
    }

    #[test]
    fn primitive_literal_matches_requested_kind() {
        let cfg = GenConfig::default();
        let mut rng = Random::new(3);
        let universe = TypeUniverse::generate_types(&cfg, &mut rng);
        let gen = LiteralGen::new(&universe, cfg.literal_bias_probability);
        for kind in PrimitiveKind::ALL {
            let lit = gen.generate(&FuzzType::Primitive(kind), &mut rng);
            assert_eq!(lit.ty(), FuzzType::Primitive(kind));
        }
    }
}
