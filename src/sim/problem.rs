//! Falling arithmetic problems ("asteroids")
//!
//! Operands are drawn so every answer is a non-negative integer: subtraction
//! never goes below zero and division is generated answer-first.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Arithmetic operator of a problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    pub const ALL: [Operator; 4] = [
        Operator::Add,
        Operator::Subtract,
        Operator::Multiply,
        Operator::Divide,
    ];

    /// Symbol shown on the asteroid
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "×",
            Operator::Divide => "÷",
        }
    }

    /// Sprite category the renderer styles the asteroid with
    pub fn category(&self) -> &'static str {
        match self {
            Operator::Add => "plus",
            Operator::Subtract => "minus",
            Operator::Multiply => "multi",
            Operator::Divide => "divi",
        }
    }

    /// Exact result, `None` if it is not a non-negative integer
    pub fn apply(&self, a: u32, b: u32) -> Option<u32> {
        match self {
            Operator::Add => a.checked_add(b),
            Operator::Subtract => a.checked_sub(b),
            Operator::Multiply => a.checked_mul(b),
            Operator::Divide => {
                if b != 0 && a % b == 0 {
                    Some(a / b)
                } else {
                    None
                }
            }
        }
    }

    /// Draw operands for this operator, returned with their answer
    pub fn random_terms<R: Rng + ?Sized>(&self, rng: &mut R) -> ([u32; 2], u32) {
        match self {
            Operator::Add => {
                let (a, b) = (rng.random_range(1..=10), rng.random_range(1..=10));
                ([a, b], a + b)
            }
            Operator::Subtract => {
                let minuend = rng.random_range(5..=19);
                let subtrahend = rng.random_range(0..minuend);
                ([minuend, subtrahend], minuend - subtrahend)
            }
            Operator::Multiply => {
                let (a, b) = (rng.random_range(1..=6), rng.random_range(1..=5));
                ([a, b], a * b)
            }
            Operator::Divide => {
                let quotient = rng.random_range(2..=6);
                let divisor = rng.random_range(2..=5);
                ([quotient * divisor, divisor], quotient)
            }
        }
    }
}

/// A falling problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub id: u32,
    pub operator: Operator,
    pub operands: [u32; 2],
    pub expected_answer: u32,
    /// Top-left corner in play-area pixels (x fixed, y grows downward)
    pub pos: Vec2,
}

impl Problem {
    /// Build a problem from explicit operands, `None` if they don't divide/subtract cleanly
    pub fn new(id: u32, operator: Operator, operands: [u32; 2], pos: Vec2) -> Option<Self> {
        let expected_answer = operator.apply(operands[0], operands[1])?;
        Some(Self {
            id,
            operator,
            operands,
            expected_answer,
            pos,
        })
    }

    /// Generate a random problem spawning at `spawn_y`
    ///
    /// `max_left` is the play-area width minus the asteroid width; x is drawn
    /// uniformly from `[0, max_left)` so the asteroid never hangs off the edge.
    pub fn random<R: Rng + ?Sized>(id: u32, rng: &mut R, max_left: f32, spawn_y: f32) -> Self {
        let operator = Operator::ALL[rng.random_range(0..Operator::ALL.len())];
        let (operands, expected_answer) = operator.random_terms(rng);
        let x = if max_left > 1.0 {
            rng.random_range(0.0..max_left).floor()
        } else {
            0.0
        };
        Self {
            id,
            operator,
            operands,
            expected_answer,
            pos: Vec2::new(x, spawn_y),
        }
    }

    /// Display text, e.g. `"12 ÷ 3"`
    pub fn label(&self) -> String {
        format!(
            "{} {} {}",
            self.operands[0],
            self.operator.symbol(),
            self.operands[1]
        )
    }

    /// Whether a submitted value answers this problem
    pub fn is_answered_by(&self, value: i64) -> bool {
        i64::from(self.expected_answer) == value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_apply_rejects_inexact() {
        assert_eq!(Operator::Subtract.apply(3, 5), None);
        assert_eq!(Operator::Divide.apply(7, 2), None);
        assert_eq!(Operator::Divide.apply(7, 0), None);
        assert_eq!(Operator::Divide.apply(12, 3), Some(4));
    }

    #[test]
    fn test_operand_ranges() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..2000 {
            let ([a, b], _) = Operator::Add.random_terms(&mut rng);
            assert!((1..=10).contains(&a) && (1..=10).contains(&b));

            let ([m, s], _) = Operator::Subtract.random_terms(&mut rng);
            assert!((5..=19).contains(&m));
            assert!(s < m);

            let ([a, b], _) = Operator::Multiply.random_terms(&mut rng);
            assert!((1..=6).contains(&a) && (1..=5).contains(&b));

            let ([dividend, divisor], quotient) = Operator::Divide.random_terms(&mut rng);
            assert!((2..=5).contains(&divisor));
            assert!((2..=6).contains(&quotient));
            assert_eq!(dividend, quotient * divisor);
        }
    }

    #[test]
    fn test_all_operators_appear() {
        let mut rng = Pcg32::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for id in 0..200 {
            seen.insert(Problem::random(id, &mut rng, 490.0, -110.0).operator);
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_label() {
        let p = Problem::new(1, Operator::Divide, [12, 3], Vec2::ZERO).unwrap();
        assert_eq!(p.label(), "12 ÷ 3");
        assert_eq!(p.expected_answer, 4);
        assert!(p.is_answered_by(4));
        assert!(!p.is_answered_by(-4));
    }

    #[test]
    fn test_spawn_stays_in_bounds() {
        let mut rng = Pcg32::seed_from_u64(3);
        for id in 0..500 {
            let p = Problem::random(id, &mut rng, 490.0, -110.0);
            assert!(p.pos.x >= 0.0 && p.pos.x < 490.0);
            assert_eq!(p.pos.y, -110.0);
        }
        // Narrower than an asteroid: pinned to the left edge
        let p = Problem::random(0, &mut rng, -20.0, -110.0);
        assert_eq!(p.pos.x, 0.0);
    }
}
