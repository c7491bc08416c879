//! The type lattice used by signatures, restrictions, and statement checks.
//!
//! The lattice is deliberately small: `⊤` at the top (the required type of
//! every top-level statement), `⊥` at the bottom, primitives, bounded
//! integer ranges (singletons for literals), tuple types with a size range,
//! function types, and phrase types for macro results.

use std::fmt;

/// Inclusive integer bounds; `None` is unbounded on that side.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct IntegerRange {
    pub low: Option<i64>,
    pub high: Option<i64>,
}

impl IntegerRange {
    pub const UNBOUNDED: Self = Self {
        low: None,
        high: None,
    };

    pub fn singleton(n: i64) -> Self {
        Self {
            low: Some(n),
            high: Some(n),
        }
    }

    pub fn at_least(n: i64) -> Self {
        Self {
            low: Some(n),
            high: None,
        }
    }

    pub fn inclusive(low: i64, high: i64) -> Self {
        Self {
            low: Some(low),
            high: Some(high),
        }
    }

    pub fn contains(&self, other: &Self) -> bool {
        let low_ok = match (self.low, other.low) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => a <= b,
        };
        let high_ok = match (self.high, other.high) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => a >= b,
        };
        low_ok && high_ok
    }

    pub fn is_empty(&self) -> bool {
        matches!((self.low, self.high), (Some(a), Some(b)) if a > b)
    }

    fn intersect(&self, other: &Self) -> Self {
        Self {
            low: max_bound(self.low, other.low),
            high: min_bound(self.high, other.high),
        }
    }

    fn join(&self, other: &Self) -> Self {
        Self {
            low: match (self.low, other.low) {
                (Some(a), Some(b)) => Some(a.min(b)),
                _ => None,
            },
            high: match (self.high, other.high) {
                (Some(a), Some(b)) => Some(a.max(b)),
                _ => None,
            },
        }
    }
}

fn max_bound(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (x, None) | (None, x) => x,
    }
}

fn min_bound(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (x, None) | (None, x) => x,
    }
}

/// Allowed tuple sizes; `max: None` is unbounded.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SizeRange {
    pub min: u32,
    pub max: Option<u32>,
}

impl SizeRange {
    pub const ANY: Self = Self { min: 0, max: None };

    pub fn exact(n: u32) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    pub fn at_least(n: u32) -> Self {
        Self { min: n, max: None }
    }

    pub fn inclusive(min: u32, max: u32) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    pub fn contains(&self, other: &Self) -> bool {
        let high_ok = match (self.max, other.max) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => a >= b,
        };
        self.min <= other.min && high_ok
    }

    pub fn permits(&self, n: u32) -> bool {
        n >= self.min && self.max.is_none_or(|max| n <= max)
    }

    pub fn is_empty(&self) -> bool {
        self.max.is_some_and(|max| max < self.min)
    }

    fn intersect(&self, other: &Self) -> Self {
        Self {
            min: self.min.max(other.min),
            max: match (self.max, other.max) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (x, None) | (None, x) => x,
            },
        }
    }
}

/// A tuple type: explicit leading element types, a default type for the
/// remaining positions, and a size range.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct TupleType {
    pub leading: Vec<Type>,
    pub rest: Box<Type>,
    pub sizes: SizeRange,
}

impl TupleType {
    /// A fixed-size tuple with one type per position.
    pub fn fixed(elements: Vec<Type>) -> Self {
        let size = elements.len() as u32;
        Self {
            leading: elements,
            rest: Box::new(Type::Bottom),
            sizes: SizeRange::exact(size),
        }
    }

    /// Zero or more elements of a single type.
    pub fn zero_or_more(element: Type) -> Self {
        Self {
            leading: Vec::new(),
            rest: Box::new(element),
            sizes: SizeRange::ANY,
        }
    }

    /// Elements of a single type with a constrained count.
    pub fn counted(element: Type, sizes: SizeRange) -> Self {
        Self {
            leading: Vec::new(),
            rest: Box::new(element),
            sizes,
        }
    }

    /// The type at a zero-based position.
    pub fn type_at(&self, index: usize) -> &Type {
        self.leading.get(index).unwrap_or(&self.rest)
    }

    fn is_subtype_of(&self, other: &Self) -> bool {
        if !other.sizes.contains(&self.sizes) {
            return false;
        }
        let span = self.leading.len().max(other.leading.len()) + 1;
        (0..span).all(|i| {
            // Positions outside our own size range never hold a value.
            if let Some(max) = self.sizes.max
                && i as u32 >= max
            {
                return true;
            }
            self.type_at(i).is_subtype_of(other.type_at(i))
        })
    }

    fn intersect(&self, other: &Self) -> Type {
        let sizes = self.sizes.intersect(&other.sizes);
        if sizes.is_empty() {
            return Type::Bottom;
        }
        let span = self.leading.len().max(other.leading.len());
        let leading = (0..span)
            .map(|i| self.type_at(i).intersection(other.type_at(i)))
            .collect();
        Type::Tuple(TupleType {
            leading,
            rest: Box::new(self.rest.intersection(&other.rest)),
            sizes,
        })
    }
}

/// A function type with contravariant parameters.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct FunctionType {
    pub params: Vec<Type>,
    pub result: Box<Type>,
}

impl FunctionType {
    pub fn new(params: Vec<Type>, result: Type) -> Self {
        Self {
            params,
            result: Box::new(result),
        }
    }
}

/// A type in the lattice.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Type {
    /// ⊤ - every value inhabits it; the only legal statement type.
    Top,
    /// ⊥ - no value inhabits it.
    Bottom,
    /// Every value; the widest type a message argument may take.
    Any,
    Boolean,
    Character,
    Str,
    Atom,
    Integer(IntegerRange),
    Tuple(TupleType),
    Function(FunctionType),
    /// A parse phrase yielding the given type; macro bodies return these.
    Phrase(Box<Type>),
    /// The type of types; semantic restrictions and type expressions
    /// produce values of this type.
    Meta,
}

impl Type {
    /// The unbounded integer type.
    pub fn integer() -> Self {
        Type::Integer(IntegerRange::UNBOUNDED)
    }

    /// The singleton type of one integer.
    pub fn exact_integer(n: i64) -> Self {
        Type::Integer(IntegerRange::singleton(n))
    }

    /// Integers `0..`, the type produced by counting groups.
    pub fn whole_number() -> Self {
        Type::Integer(IntegerRange::at_least(0))
    }

    pub fn tuple_of(elements: Vec<Type>) -> Self {
        Type::Tuple(TupleType::fixed(elements))
    }

    pub fn list_of(element: Type) -> Self {
        Type::Tuple(TupleType::zero_or_more(element))
    }

    pub fn function(params: Vec<Type>, result: Type) -> Self {
        Type::Function(FunctionType::new(params, result))
    }

    pub fn phrase_yielding(yields: Type) -> Self {
        Type::Phrase(Box::new(yields))
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Type::Top)
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, Type::Bottom)
    }

    /// Subtype test. Reflexive and transitive; `⊥ ≤ t ≤ ⊤` for every `t`.
    pub fn is_subtype_of(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Bottom, _) | (_, Type::Top) => true,
            (_, Type::Bottom) | (Type::Top, _) => false,
            (_, Type::Any) => true,
            (Type::Any, _) => false,
            (Type::Boolean, Type::Boolean)
            | (Type::Character, Type::Character)
            | (Type::Str, Type::Str)
            | (Type::Atom, Type::Atom)
            | (Type::Meta, Type::Meta) => true,
            (Type::Integer(a), Type::Integer(b)) => b.contains(a),
            (Type::Tuple(a), Type::Tuple(b)) => a.is_subtype_of(b),
            (Type::Function(a), Type::Function(b)) => {
                a.params.len() == b.params.len()
                    && b.params
                        .iter()
                        .zip(&a.params)
                        .all(|(bp, ap)| bp.is_subtype_of(ap))
                    && a.result.is_subtype_of(&b.result)
            }
            (Type::Phrase(a), Type::Phrase(b)) => a.is_subtype_of(b),
            _ => false,
        }
    }

    /// Greatest lower bound, approximated from above for function types.
    pub fn intersection(&self, other: &Type) -> Type {
        if self.is_subtype_of(other) {
            return self.clone();
        }
        if other.is_subtype_of(self) {
            return other.clone();
        }
        match (self, other) {
            (Type::Integer(a), Type::Integer(b)) => {
                let range = a.intersect(b);
                if range.is_empty() {
                    Type::Bottom
                } else {
                    Type::Integer(range)
                }
            }
            (Type::Tuple(a), Type::Tuple(b)) => a.intersect(b),
            (Type::Phrase(a), Type::Phrase(b)) => {
                Type::phrase_yielding(a.intersection(b))
            }
            // Distinct primitives, mismatched kinds, or incomparable
            // function types share no values.
            _ => Type::Bottom,
        }
    }

    /// Least upper bound, approximated toward ⊤.
    pub fn union(&self, other: &Type) -> Type {
        if self.is_subtype_of(other) {
            return other.clone();
        }
        if other.is_subtype_of(self) {
            return self.clone();
        }
        match (self, other) {
            (Type::Integer(a), Type::Integer(b)) => Type::Integer(a.join(b)),
            (Type::Phrase(a), Type::Phrase(b)) => Type::phrase_yielding(a.union(b)),
            _ => Type::Top,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Top => write!(f, "⊤"),
            Type::Bottom => write!(f, "⊥"),
            Type::Any => write!(f, "any"),
            Type::Boolean => write!(f, "boolean"),
            Type::Character => write!(f, "character"),
            Type::Str => write!(f, "string"),
            Type::Atom => write!(f, "atom"),
            Type::Integer(range) => match (range.low, range.high) {
                (None, None) => write!(f, "integer"),
                (Some(a), Some(b)) if a == b => write!(f, "{a}'s type"),
                (low, high) => {
                    match low {
                        Some(a) => write!(f, "[{a}")?,
                        None => write!(f, "(-∞")?,
                    }
                    write!(f, "..")?;
                    match high {
                        Some(b) => write!(f, "{b}]"),
                        None => write!(f, "∞)"),
                    }
                }
            },
            Type::Tuple(t) => {
                write!(f, "<")?;
                for (i, element) in t.leading.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                if !t.rest.is_bottom() {
                    if !t.leading.is_empty() {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}…", t.rest)?;
                }
                write!(f, "|")?;
                match t.sizes.max {
                    Some(max) if max == t.sizes.min => write!(f, "{}", t.sizes.min)?,
                    Some(max) => write!(f, "{}..{}", t.sizes.min, max)?,
                    None => write!(f, "{}..", t.sizes.min)?,
                }
                write!(f, ">")
            }
            Type::Function(t) => {
                write!(f, "[")?;
                for (i, param) in t.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, "]→{}", t.result)
            }
            Type::Phrase(yields) => write!(f, "phrase⇒{yields}"),
            Type::Meta => write!(f, "type"),
        }
    }
}
