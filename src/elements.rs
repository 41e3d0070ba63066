//! Five-element model: constitutions and the two directed cycles that
//! drive toxicity amplification and satisfaction bonuses.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    Wood,
    Fire,
    Earth,
    Metal,
    Water,
}

impl Element {
    pub const ALL: [Element; 5] = [
        Element::Wood,
        Element::Fire,
        Element::Earth,
        Element::Metal,
        Element::Water,
    ];

    /// Returns the element that weakens this one (the 剋 cycle):
    /// Metal weakens Wood, Wood weakens Earth, Earth weakens Water,
    /// Water weakens Fire, Fire weakens Metal.
    ///
    /// A remedy whose affinity matches `constitution.weakened_by()` has its
    /// toxicity amplified.
    pub fn weakened_by(self) -> Element {
        match self {
            Element::Wood => Element::Metal,
            Element::Earth => Element::Wood,
            Element::Water => Element::Earth,
            Element::Fire => Element::Water,
            Element::Metal => Element::Fire,
        }
    }

    /// Returns the element that benefits this one (the 生 cycle):
    /// Wood benefits Fire, Fire benefits Earth, Earth benefits Metal,
    /// Metal benefits Water, Water benefits Wood.
    ///
    /// A remedy whose affinity matches `constitution.benefited_by()` earns
    /// the satisfaction bonus.
    pub fn benefited_by(self) -> Element {
        match self {
            Element::Fire => Element::Wood,
            Element::Earth => Element::Fire,
            Element::Metal => Element::Earth,
            Element::Water => Element::Metal,
            Element::Wood => Element::Water,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Element::Wood => "Wood",
            Element::Fire => "Fire",
            Element::Earth => "Earth",
            Element::Metal => "Metal",
            Element::Water => "Water",
        }
    }

    /// Draws a constitution uniformly at random.
    pub fn random(rng: &mut impl Rng) -> Element {
        Element::ALL[rng.gen_range(0..Element::ALL.len())]
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
