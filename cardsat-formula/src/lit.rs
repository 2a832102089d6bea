//! Packed literals and variables.
use std::{fmt, ops};

/// Integer type backing [`Var`] and [`Lit`].
pub type LitIdx = u32;

/// A propositional variable, identified by a 0-based index.
///
/// External text formats count variables from 1 so that a negative number can denote a negated
/// variable. The `dimacs` conversions use that convention.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Var {
    index: LitIdx,
}

impl Var {
    /// The variable with the given 0-based index.
    #[inline]
    pub fn from_index(index: usize) -> Var {
        debug_assert!(index < Var::max_count());
        Var {
            index: index as LitIdx,
        }
    }

    /// The variable with the given 1-based number.
    #[inline]
    pub fn from_dimacs(number: isize) -> Var {
        debug_assert!(number > 0);
        Var::from_index((number - 1) as usize)
    }

    /// 0-based index of this variable.
    #[inline]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// 1-based number of this variable.
    #[inline]
    pub fn to_dimacs(self) -> isize {
        self.index as isize + 1
    }

    /// Number of distinct variables that can be represented.
    ///
    /// The top bits of [`LitIdx`] stay free so a literal code (index and sign bit) always fits.
    pub const fn max_count() -> usize {
        (LitIdx::max_value() >> 2) as usize
    }

    /// The literal of this variable with the given polarity (`true` is positive).
    #[inline]
    pub fn lit(self, polarity: bool) -> Lit {
        Lit::from_var(self, polarity)
    }

    /// The positive literal of this variable.
    #[inline]
    pub fn positive(self) -> Lit {
        self.lit(true)
    }

    /// The negative literal of this variable.
    #[inline]
    pub fn negative(self) -> Lit {
        self.lit(false)
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A variable or its negation, packed into a single integer.
///
/// The integer, called the literal's `code`, is `index << 1 | negated`. The variable is recovered
/// by a shift, the sign by masking the lowest bit and negation is a xor with 1. Sorting literals by
/// code therefore places the two literals of a variable next to each other.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Lit {
    code: LitIdx,
}

impl Lit {
    /// The literal of `var` with the given polarity (`true` is positive).
    #[inline]
    pub fn from_var(var: Var, polarity: bool) -> Lit {
        Lit {
            code: (var.index << 1) | (!polarity as LitIdx),
        }
    }

    /// The literal of the variable with the given 0-based index.
    #[inline]
    pub fn from_index(index: usize, polarity: bool) -> Lit {
        Lit::from_var(Var::from_index(index), polarity)
    }

    /// The literal with the given code.
    #[inline]
    pub fn from_code(code: usize) -> Lit {
        debug_assert!(code < Var::max_count() * 2);
        Lit {
            code: code as LitIdx,
        }
    }

    /// The literal for a non-zero signed 1-based number.
    #[inline]
    pub fn from_dimacs(number: isize) -> Lit {
        Lit::from_var(Var::from_dimacs(number.abs()), number > 0)
    }

    /// Signed 1-based number of this literal.
    #[inline]
    pub fn to_dimacs(self) -> isize {
        let number = self.var().to_dimacs();
        if self.is_negative() {
            -number
        } else {
            number
        }
    }

    /// The literal's variable.
    #[inline]
    pub fn var(self) -> Var {
        Var {
            index: self.code >> 1,
        }
    }

    /// 0-based index of the literal's variable.
    #[inline]
    pub fn index(self) -> usize {
        (self.code >> 1) as usize
    }

    /// Whether this is a negated variable.
    #[inline]
    pub fn is_negative(self) -> bool {
        self.code & 1 == 1
    }

    /// Whether this is a non-negated variable.
    #[inline]
    pub fn is_positive(self) -> bool {
        self.code & 1 == 0
    }

    /// The packed representation, usable as an index into per-literal tables.
    #[inline]
    pub fn code(self) -> usize {
        self.code as usize
    }
}

impl ops::Not for Lit {
    type Output = Lit;

    #[inline]
    fn not(self) -> Lit {
        Lit {
            code: self.code ^ 1,
        }
    }
}

/// Negates the literal when the right hand side is `true`.
impl ops::BitXor<bool> for Lit {
    type Output = Lit;

    #[inline]
    fn bitxor(self, negate: bool) -> Lit {
        Lit {
            code: self.code ^ negate as LitIdx,
        }
    }
}

impl From<Var> for Lit {
    #[inline]
    fn from(var: Var) -> Lit {
        var.positive()
    }
}

impl fmt::Debug for Lit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(any(test, feature = "proptest-strategies"))]
#[doc(hidden)]
pub mod strategy {
    use super::*;
    use proptest::{prelude::*, *};

    pub fn var(index: impl Strategy<Value = usize>) -> impl Strategy<Value = Var> {
        index.prop_map(Var::from_index)
    }

    pub fn lit(index: impl Strategy<Value = usize>) -> impl Strategy<Value = Lit> {
        (var(index), bool::ANY).prop_map(|(var, polarity)| var.lit(polarity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn packed_encoding() {
        let var = Var::from_index(5);
        assert_eq!(var.positive().code(), 10);
        assert_eq!(var.negative().code(), 11);
        assert_eq!(Lit::from_code(11).var(), var);
        assert_eq!(!var.positive(), var.negative());
        assert_eq!(var.positive() ^ true, var.negative());
        assert_eq!(var.positive() ^ false, var.positive());
    }

    #[test]
    fn sorting_groups_variables() {
        let mut lits = vec![lit!(3), lit!(-1), lit!(-3), lit!(1)];
        lits.sort();
        assert_eq!(lits, lits![1, -1, 3, -3]);
    }

    proptest! {
        #[test]
        fn dimacs_numbers(number in 1..1000isize, negated in proptest::bool::ANY) {
            let number = if negated { -number } else { number };
            let lit = Lit::from_dimacs(number);
            prop_assert_eq!(lit.to_dimacs(), number);
            prop_assert_eq!(lit.is_negative(), negated);
            prop_assert_eq!(lit.var().to_dimacs(), number.abs());
        }

        #[test]
        fn double_negation(lit in strategy::lit(0..100usize)) {
            prop_assert_eq!(!!lit, lit);
            prop_assert_ne!(!lit, lit);
            prop_assert_eq!((!lit).var(), lit.var());
        }
    }
}
