use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// MaxRects free-rectangle choice heuristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Heuristic {
    /// -BSSF: fit against the short side of the tightest free rect.
    #[serde(rename = "bssf", alias = "bestshortsidefit")]
    BestShortSideFit,
    /// -BLSF: fit against the long side of the tightest free rect.
    #[serde(rename = "blsf", alias = "bestlongsidefit")]
    BestLongSideFit,
    /// -BAF: smallest free rect that holds the sprite.
    #[serde(rename = "baf", alias = "bestareafit")]
    BestAreaFit,
    /// -BL: Tetris-style placement.
    #[serde(rename = "bl", alias = "bottomleft")]
    BottomLeft,
    /// -CP: touch bin borders and placed sprites as much as possible.
    #[serde(rename = "cp", alias = "contactpoint")]
    ContactPoint,
}

impl Heuristic {
    /// Every heuristic, in the order the search evaluates and tie-breaks them.
    pub const ALL: [Heuristic; 5] = [
        Heuristic::BestShortSideFit,
        Heuristic::BestLongSideFit,
        Heuristic::BestAreaFit,
        Heuristic::BottomLeft,
        Heuristic::ContactPoint,
    ];

    /// Position in [`Heuristic::ALL`].
    pub fn index(self) -> usize {
        match self {
            Self::BestShortSideFit => 0,
            Self::BestLongSideFit => 1,
            Self::BestAreaFit => 2,
            Self::BottomLeft => 3,
            Self::ContactPoint => 4,
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Self::BestShortSideFit => "bssf",
            Self::BestLongSideFit => "blsf",
            Self::BestAreaFit => "baf",
            Self::BottomLeft => "bl",
            Self::ContactPoint => "cp",
        }
    }
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for Heuristic {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bssf" | "bestshortsidefit" => Ok(Self::BestShortSideFit),
            "blsf" | "bestlongsidefit" => Ok(Self::BestLongSideFit),
            "baf" | "bestareafit" => Ok(Self::BestAreaFit),
            "bl" | "bottomleft" => Ok(Self::BottomLeft),
            "cp" | "contactpoint" => Ok(Self::ContactPoint),
            _ => Err(()),
        }
    }
}

/// Search options.
/// Key notes:
///   - `max_side` caps both sheet dimensions
///   - `max_width_increment` trades search granularity for speed
///   - `uniform_ratio` and `contact_point_budget` tune the search, they never affect validity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackerOptions {
    /// Maximum sheet width and height in pixels.
    pub max_side: u32,
    /// Allow 90° rotations where they score better.
    pub allow_rotation: bool,
    /// Width sweep step of the shrink phase; also the initial height shrink step.
    #[serde(default = "default_max_width_increment")]
    pub max_width_increment: u32,

    /// Run heuristics in parallel when feature "parallel" is on.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Fraction of sprites sharing one size above which the input is treated as a
    /// uniform grid sheet and the width sweep steps by that sprite width.
    #[serde(default = "default_uniform_ratio")]
    pub uniform_ratio: f32,
    /// Modelled work (sprites cubed) above which ContactPoint is skipped.
    #[serde(default = "default_contact_point_budget")]
    pub contact_point_budget: u64,
    /// Optional wall-clock budget (milliseconds). None or 0 disables.
    #[serde(default)]
    pub time_budget_ms: Option<u64>,
}

impl Default for PackerOptions {
    fn default() -> Self {
        Self {
            max_side: 4096,
            allow_rotation: true,
            max_width_increment: default_max_width_increment(),
            parallel: default_parallel(),
            uniform_ratio: default_uniform_ratio(),
            contact_point_budget: default_contact_point_budget(),
            time_budget_ms: None,
        }
    }
}

impl PackerOptions {
    /// Validates the options.
    ///
    /// Returns an error if:
    /// - `max_side` or `max_width_increment` is zero
    /// - `uniform_ratio` is outside `(0, 1]`
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SheetPackerError;

        if self.max_side == 0 {
            return Err(SheetPackerError::InvalidOption(
                "max_side must be positive".into(),
            ));
        }
        if self.max_width_increment == 0 {
            return Err(SheetPackerError::InvalidOption(
                "max_width_increment must be positive".into(),
            ));
        }
        if !(self.uniform_ratio > 0.0 && self.uniform_ratio <= 1.0) {
            return Err(SheetPackerError::InvalidOption(format!(
                "uniform_ratio ({}) must be in (0, 1]",
                self.uniform_ratio
            )));
        }
        Ok(())
    }

    /// Create a fluent builder for `PackerOptions`.
    pub fn builder() -> PackerOptionsBuilder {
        PackerOptionsBuilder::new()
    }
}

fn default_max_width_increment() -> u32 {
    6
}
fn default_parallel() -> bool {
    true
}
fn default_uniform_ratio() -> f32 {
    0.9
}
fn default_contact_point_budget() -> u64 {
    2_000_000
}

/// Builder for `PackerOptions` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct PackerOptionsBuilder {
    opts: PackerOptions,
}

impl PackerOptionsBuilder {
    pub fn new() -> Self {
        Self {
            opts: PackerOptions::default(),
        }
    }
    pub fn max_side(mut self, v: u32) -> Self {
        self.opts.max_side = v;
        self
    }
    pub fn allow_rotation(mut self, v: bool) -> Self {
        self.opts.allow_rotation = v;
        self
    }
    pub fn max_width_increment(mut self, v: u32) -> Self {
        self.opts.max_width_increment = v;
        self
    }
    pub fn parallel(mut self, v: bool) -> Self {
        self.opts.parallel = v;
        self
    }
    pub fn uniform_ratio(mut self, v: f32) -> Self {
        self.opts.uniform_ratio = v;
        self
    }
    pub fn contact_point_budget(mut self, v: u64) -> Self {
        self.opts.contact_point_budget = v;
        self
    }
    pub fn time_budget_ms(mut self, v: Option<u64>) -> Self {
        self.opts.time_budget_ms = v;
        self
    }
    pub fn build(self) -> PackerOptions {
        self.opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_names() {
        assert_eq!("bssf".parse(), Ok(Heuristic::BestShortSideFit));
        assert_eq!("BestLongSideFit".parse(), Ok(Heuristic::BestLongSideFit));
        assert_eq!("BAF".parse(), Ok(Heuristic::BestAreaFit));
        assert_eq!("bottomleft".parse(), Ok(Heuristic::BottomLeft));
        assert_eq!("cp".parse(), Ok(Heuristic::ContactPoint));
        assert_eq!("skyline".parse::<Heuristic>(), Err(()));
    }

    #[test]
    fn index_matches_all_order() {
        for (i, h) in Heuristic::ALL.iter().enumerate() {
            assert_eq!(h.index(), i);
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(PackerOptions::default().validate().is_ok());
    }
}
