// Weight semiring arithmetic: probability, log and tropical.

use crate::automaton::Weight;

/// The algebraic structure transition weights are combined under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Semiring {
    /// Weights are probabilities: add is `+`, multiply is `*`.
    Probability,
    /// Weights are negative log probabilities: add is log-sum, multiply is `+`.
    Log,
    /// Weights are costs: add is `min`, multiply is `+`.
    Tropical,
}

impl Semiring {
    pub fn name(self) -> &'static str {
        match self {
            Semiring::Probability => "probability",
            Semiring::Log => "logarithmic",
            Semiring::Tropical => "tropical",
        }
    }
}

/// Weight operations bound to one semiring and one comparison tolerance.
///
/// An unweighted automaton uses `semiring: None`; every arithmetic operation
/// then yields `0.0`, which keeps all weights of such an automaton at zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightOps {
    pub semiring: Option<Semiring>,
    /// Relative tolerance used by [`WeightOps::equal`].
    pub tolerance: f64,
}

impl WeightOps {
    pub fn new(semiring: Option<Semiring>, tolerance: f64) -> Self {
        Self {
            semiring,
            tolerance,
        }
    }

    /// Semiring addition.
    pub fn add(&self, a: Weight, b: Weight) -> Weight {
        match self.semiring {
            Some(Semiring::Probability) => a + b,
            Some(Semiring::Log) => log_add(a, b),
            Some(Semiring::Tropical) => {
                if a < b {
                    a
                } else {
                    b
                }
            }
            None => 0.0,
        }
    }

    /// Semiring multiplication.
    pub fn multiply(&self, a: Weight, b: Weight) -> Weight {
        match self.semiring {
            Some(Semiring::Probability) => a * b,
            Some(Semiring::Log | Semiring::Tropical) => a + b,
            None => 0.0,
        }
    }

    /// Multiplicative residual: the `c` with `b * c == a`.
    pub fn divide(&self, a: Weight, b: Weight) -> Weight {
        match self.semiring {
            Some(Semiring::Probability) => a / b,
            Some(Semiring::Log | Semiring::Tropical) => a - b,
            None => 0.0,
        }
    }

    /// Neutral element of addition.
    pub fn zero(&self) -> Weight {
        match self.semiring {
            Some(Semiring::Probability) | None => 0.0,
            Some(Semiring::Log | Semiring::Tropical) => f64::INFINITY,
        }
    }

    /// Neutral element of multiplication.
    pub fn one(&self) -> Weight {
        match self.semiring {
            Some(Semiring::Probability) => 1.0,
            Some(Semiring::Log | Semiring::Tropical) | None => 0.0,
        }
    }

    /// Float comparison with relative tolerance.
    ///
    /// Values whose magnitude is below the tolerance are treated as zero, and
    /// a zero only equals another zero.
    pub fn equal(&self, a: Weight, b: Weight) -> bool {
        if a == b {
            return true;
        }
        if a.abs() < self.tolerance || b.abs() < self.tolerance {
            return a.abs() < self.tolerance && b.abs() < self.tolerance;
        }
        ((a - b) / a).abs() < self.tolerance
    }

    #[inline]
    pub fn is_one(&self, w: Weight) -> bool {
        self.equal(w, self.one())
    }
}

/// `-ln(exp(-a) + exp(-b))`, stable for large operands and infinities.
fn log_add(a: Weight, b: Weight) -> Weight {
    if a == f64::INFINITY {
        return b;
    }
    if b == f64::INFINITY {
        return a;
    }
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    lo - (-(hi - lo)).exp().ln_1p()
}
