//! Variables and literals.
use std::{fmt, ops};

/// Integer type backing [`Var`] and [`Lit`].
///
/// Also used for clause indices and per-clause counters, which never exceed the number of
/// literals that fit into memory in practice.
pub type LitIdx = u32;

/// A propositional variable.
///
/// Stored as a 0-based index. The DIMACS CNF format and all user facing output number variables
/// starting at 1, so that the sign of an integer can denote negation.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Var {
    index: LitIdx,
}

impl Var {
    /// The variable with DIMACS number `number`, which must be positive.
    #[inline]
    pub fn from_dimacs(number: isize) -> Var {
        debug_assert!(number > 0);
        Var::from_index((number - 1) as usize)
    }

    /// The variable with 0-based index `index`.
    #[inline]
    pub fn from_index(index: usize) -> Var {
        debug_assert!(index < Var::max_count());
        Var {
            index: index as LitIdx,
        }
    }

    /// DIMACS number of this variable.
    #[inline]
    pub fn to_dimacs(self) -> isize {
        self.index as isize + 1
    }

    /// 0-based index of this variable.
    #[inline]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Number of distinct variables that can be represented.
    ///
    /// Kept well below `LitIdx::max_value()` so a literal code (index and sign bit) always fits.
    pub const fn max_count() -> usize {
        (LitIdx::max_value() >> 4) as usize + 1
    }

    /// All variables with an index below `count`, in ascending order.
    pub fn all(count: usize) -> impl Iterator<Item = Var> + Clone {
        (0..count).map(Var::from_index)
    }

    /// The literal of this variable with the given polarity (`true` is positive).
    #[inline]
    pub fn lit(self, polarity: bool) -> Lit {
        Lit::from_var(self, polarity)
    }

    #[inline]
    pub fn positive(self) -> Lit {
        Lit::from_var(self, true)
    }

    #[inline]
    pub fn negative(self) -> Lit {
        Lit::from_var(self, false)
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

/// A variable or its negation.
///
/// Encoded as `2 * var.index() + sign` where the sign bit is set for negative literals. The
/// encoding, exposed as [`code`](Lit::code), is dense and can index per-literal tables directly;
/// the two literals of a variable are neighbours.
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

    /// The literal of the variable with 0-based index `index`.
    #[inline]
    pub fn from_index(index: usize, polarity: bool) -> Lit {
        Lit::from_var(Var::from_index(index), polarity)
    }

    /// The literal with the given dense code.
    #[inline]
    pub fn from_code(code: usize) -> Lit {
        debug_assert!(code < Var::max_count() * 2);
        Lit {
            code: code as LitIdx,
        }
    }

    /// The literal for a nonzero DIMACS integer.
    #[inline]
    pub fn from_dimacs(number: isize) -> Lit {
        Lit::from_var(Var::from_dimacs(number.abs()), number > 0)
    }

    /// Signed DIMACS integer of this literal.
    #[inline]
    pub fn to_dimacs(self) -> isize {
        let number = self.var().to_dimacs();
        if self.is_negative() {
            -number
        } else {
            number
        }
    }

    /// 0-based index of the literal's variable.
    #[inline]
    pub fn index(self) -> usize {
        (self.code >> 1) as usize
    }

    #[inline]
    pub fn var(self) -> Var {
        Var {
            index: self.code >> 1,
        }
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.code & 1 == 1
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        self.code & 1 == 0
    }

    /// Dense encoding of the literal, see the type level documentation.
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
    fn bitxor(self, rhs: bool) -> Lit {
        Lit {
            code: self.code ^ rhs as LitIdx,
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

    #[test]
    fn dimacs_numbering() {
        let lit = Lit::from_dimacs(-3);
        assert_eq!(lit.var(), Var::from_index(2));
        assert!(lit.is_negative());
        assert_eq!(lit.to_dimacs(), -3);
        assert_eq!((!lit).to_dimacs(), 3);
        assert_eq!(lit ^ true, !lit);
        assert_eq!(lit ^ false, lit);
    }

    #[test]
    fn codes_are_dense() {
        let codes: Vec<usize> = Var::all(3)
            .flat_map(|var| vec![var.positive().code(), var.negative().code()])
            .collect();
        assert_eq!(codes, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(Lit::from_code(5), Lit::from_dimacs(-3));
    }
}
