//! Random value generation for type nodes.
//!
//! Produces values that conform to a schema, honoring numeric bounds,
//! length constraints, and required/optional fields. Used by the fuzzing
//! properties in the test suite; seedable for reproducibility.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde_json::{Map, Number, Value};

use crate::schema::NumFormat;
use crate::type_def::TypeNode;

const MAX_DEPTH: usize = 32;

pub struct Random {
    rng: Xoshiro256PlusPlus,
    depth: usize,
}

impl Default for Random {
    fn default() -> Self {
        Self::new()
    }
}

impl Random {
    pub fn new() -> Self {
        Self::with_seed(rand::thread_rng().gen())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            depth: 0,
        }
    }

    /// Generates a random value conforming to the given type.
    pub fn gen(&mut self, node: &TypeNode) -> Value {
        match node {
            TypeNode::Any(_) => self.gen_any(),
            TypeNode::Con(t) => t.value.clone(),
            TypeNode::Bool(_) => Value::Bool(self.rng.gen_bool(0.5)),
            TypeNode::Num(t) => self.gen_num(t.format, t.gt, t.gte, t.lt, t.lte),
            TypeNode::Str(t) => self.gen_str(t.min, t.max, t.ascii),
            TypeNode::Bin(t) => self.gen_bin(t.min, t.max),
            TypeNode::Arr(t) => {
                let min = t.min.unwrap_or(0) as usize;
                let max = (t.max.unwrap_or(t.min.unwrap_or(0) + 3) as usize).max(min);
                let len = self.rng.gen_range(min..=max);
                Value::Array((0..len).map(|_| self.gen(&t.type_)).collect())
            }
            TypeNode::Tup(t) => Value::Array(t.types.iter().map(|ty| self.gen(ty)).collect()),
            TypeNode::Obj(t) => {
                let mut map = Map::new();
                for field in &t.fields {
                    if field.optional && self.rng.gen_bool(0.5) {
                        continue;
                    }
                    let value = self.gen(&field.ty);
                    map.insert(field.key.clone(), value);
                }
                Value::Object(map)
            }
            TypeNode::Map(t) => {
                let len = self.rng.gen_range(0..=3usize);
                let mut map = Map::new();
                for _ in 0..len {
                    let key = self.gen_key();
                    let value = self.gen(&t.value);
                    map.insert(key, value);
                }
                Value::Object(map)
            }
            TypeNode::Or(t) => {
                if t.types.is_empty() {
                    return Value::Null;
                }
                let index = self.rng.gen_range(0..t.types.len());
                self.gen(&t.types[index])
            }
            TypeNode::Ref(t) => {
                if self.depth >= MAX_DEPTH {
                    return Value::Null;
                }
                let Some(system) = &t.base.system else {
                    return Value::Null;
                };
                let Ok(alias) = system.resolve(&t.ref_) else {
                    return Value::Null;
                };
                self.depth += 1;
                let value = self.gen(&alias.ty);
                self.depth -= 1;
                value
            }
            TypeNode::Fn(_) | TypeNode::FnRx(_) => Value::Null,
        }
    }

    fn gen_any(&mut self) -> Value {
        match self.rng.gen_range(0..6u8) {
            0 => Value::Null,
            1 => Value::Bool(self.rng.gen_bool(0.5)),
            2 => Value::Number(self.rng.gen_range(-1000i64..1000).into()),
            3 => Value::String(self.gen_key()),
            4 => Value::Array(
                (0..self.rng.gen_range(0..3usize))
                    .map(|_| Value::Number(self.rng.gen_range(0i64..100).into()))
                    .collect(),
            ),
            _ => {
                let mut map = Map::new();
                for _ in 0..self.rng.gen_range(0..3usize) {
                    let key = self.gen_key();
                    map.insert(key, Value::Bool(self.rng.gen_bool(0.5)));
                }
                Value::Object(map)
            }
        }
    }

    fn gen_num(
        &mut self,
        format: Option<NumFormat>,
        gt: Option<f64>,
        gte: Option<f64>,
        lt: Option<f64>,
        lte: Option<f64>,
    ) -> Value {
        let (fmt_lo, fmt_hi) = format.map(format_range).unwrap_or((-1e6, 1e6));
        let lo = gt.map(|v| v + 1.0).or(gte).unwrap_or(fmt_lo).max(fmt_lo);
        let hi = lt.map(|v| v - 1.0).or(lte).unwrap_or(fmt_hi).min(fmt_hi);
        let (lo, hi) = if lo > hi { (hi, lo) } else { (lo, hi) };
        let v = lo + self.rng.gen::<f64>() * (hi - lo);
        let is_int = format.map(|f| f.is_integer()).unwrap_or(self.rng.gen_bool(0.5));
        if is_int {
            let v = v.round();
            if v >= 0.0 {
                Value::Number((v as u64).into())
            } else {
                Value::Number((v as i64).into())
            }
        } else {
            Number::from_f64(v)
                .map(Value::Number)
                .unwrap_or_else(|| Value::Number(0.into()))
        }
    }

    fn gen_str(&mut self, min: Option<u64>, max: Option<u64>, ascii: bool) -> Value {
        let min = min.unwrap_or(0) as usize;
        let max = (max.unwrap_or(min as u64 + 12) as usize).max(min);
        let len = self.rng.gen_range(min..=max);
        let s: String = (0..len)
            .map(|_| {
                if ascii || self.rng.gen_bool(0.9) {
                    self.rng.gen_range(b' '..=b'~') as char
                } else {
                    ['é', 'π', '✓', '🙂'][self.rng.gen_range(0..4usize)]
                }
            })
            .collect();
        Value::String(s)
    }

    fn gen_bin(&mut self, min: Option<u64>, max: Option<u64>) -> Value {
        let min = min.unwrap_or(0) as usize;
        let max = (max.unwrap_or(min as u64 + 8) as usize).max(min);
        let len = self.rng.gen_range(min..=max);
        Value::Array(
            (0..len)
                .map(|_| Value::Number(self.rng.gen_range(0u64..=255).into()))
                .collect(),
        )
    }

    fn gen_key(&mut self) -> String {
        let len = self.rng.gen_range(1..=8usize);
        (0..len)
            .map(|_| self.rng.gen_range(b'a'..=b'z') as char)
            .collect()
    }
}

fn format_range(format: NumFormat) -> (f64, f64) {
    // 2^53 bounds where the exact width exceeds f64's integer precision.
    const SAFE: f64 = 9_007_199_254_740_992.0;
    match format {
        NumFormat::I8 => (-128.0, 127.0),
        NumFormat::I16 => (-32_768.0, 32_767.0),
        NumFormat::I32 => (-2_147_483_648.0, 2_147_483_647.0),
        NumFormat::I | NumFormat::I64 => (-SAFE, SAFE),
        NumFormat::U8 => (0.0, 255.0),
        NumFormat::U16 => (0.0, 65_535.0),
        NumFormat::U32 => (0.0, 4_294_967_295.0),
        NumFormat::U | NumFormat::U64 => (0.0, SAFE),
        NumFormat::F | NumFormat::F32 | NumFormat::F64 => (-1e9, 1e9),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::validator::ErrorMode;
    use crate::type_def::{NumType, TypeBuilder};

    #[test]
    fn generated_values_validate_against_their_own_schema() {
        let t = TypeBuilder::new();
        let ty = t.obj(vec![
            t.field("id", t.str()),
            t.field("count", t.num()),
            t.field_opt("tags", t.arr(t.str())),
        ]);
        let validator = ty.validator(ErrorMode::Boolean).unwrap();
        let mut random = Random::with_seed(1);
        for _ in 0..50 {
            let value = random.gen(&ty);
            assert!(validator(&value).is_ok(), "invalid random value: {value}");
        }
    }

    #[test]
    fn bounds_are_honored() {
        let ty = TypeNode::Num(NumType::new().gte(10.0).lte(20.0));
        let mut random = Random::with_seed(42);
        for _ in 0..100 {
            let v = random.gen(&ty);
            let n = v.as_f64().unwrap();
            assert!((10.0..=20.0).contains(&n), "out of bounds: {n}");
        }
        let validator = ty.validator(ErrorMode::Boolean).unwrap();
        let mut random = Random::with_seed(7);
        for _ in 0..100 {
            assert!(validator(&random.gen(&ty)).is_ok());
        }
    }
}
