//! Built-in rule tables.
//!
//! Each preset is ordinary [`RuleTable`] data. New schemes should be added
//! as presets or TOML files, never as classifier branches.

use std::fmt;
use std::str::FromStr;

use crate::condition::Axis::{self, X, Y, Z};
use crate::condition::Condition;
use crate::error::RegionError;
use crate::rules::{RegionSpec, Rule, RuleTable};

/// A named built-in rule table.
///
/// # Example
///
/// ```
/// use mesh_region::Preset;
///
/// let preset: Preset = "coarse".parse().unwrap();
/// let table = preset.table();
/// assert_eq!(table.name(), "coarse");
/// assert_eq!(table.region_count(), 6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Preset {
    /// Six broad regions: limbs, helmet, chest, hands and skull, trim, accents.
    #[default]
    Coarse,
    /// Eight-region armor scheme with separate optics, frame, and joints.
    Fine,
    /// Eight-region scheme following the proportions of a standing figure.
    Triangle,
}

impl Preset {
    /// Every preset, in listing order.
    pub const ALL: [Self; 3] = [Self::Coarse, Self::Fine, Self::Triangle];

    /// Name used on the command line and as the table name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Coarse => "coarse",
            Self::Fine => "fine",
            Self::Triangle => "triangle",
        }
    }

    /// One-line description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Coarse => "6 regions: limbs, helmet, chest, hands/skull, trim, accents",
            Self::Fine => "8-region armor: plates, optics, frame, joints, metal edges",
            Self::Triangle => "8-region figure: head, optics, torso, arms, waist, legs, feet",
        }
    }

    /// Build the preset's rule table.
    #[must_use]
    pub fn table(self) -> RuleTable {
        let (regions, rules) = match self {
            Self::Coarse => (coarse_regions(), coarse_rules()),
            Self::Fine => (armor_regions(), fine_rules()),
            Self::Triangle => (armor_regions(), triangle_rules()),
        };
        RuleTable::from_trusted(self.name(), regions, rules)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = RegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RegionError::UnknownPreset {
                name: s.to_string(),
                expected: Self::ALL.map(Self::name).join(", "),
            })
    }
}

fn between(axis: Axis, low: f64, high: f64) -> Condition {
    Condition::between(axis, low, high)
}

/// Outside the inner `[low, high]` band on `axis`.
fn outside(axis: Axis, low: f64, high: f64) -> Condition {
    Condition::lt(axis, low).or(Condition::gt(axis, high))
}

fn coarse_regions() -> Vec<RegionSpec> {
    vec![
        RegionSpec::new("limbs", "#7B4E2D", "Brown", "Arms and legs"),
        RegionSpec::new("helmet", "#7B4E2D", "Brown", "Helmet"),
        RegionSpec::new("chest_body", "#5C5C5C", "Dark Gray", "Chest and torso"),
        RegionSpec::new("hands_skull", "#A6A6A6", "Light Gray", "Hands and skull"),
        RegionSpec::new("detail", "#1B1B1B", "Black", "Trim and details"),
        RegionSpec::new("accent", "#C78B2A", "Gold", "Gold accents"),
    ]
}

fn coarse_rules() -> Vec<Rule> {
    vec![
        Rule::new("hands_skull", Condition::gt(Z, 0.8).and(Condition::gt(Y, 0.5))),
        Rule::new("helmet", Condition::gt(Z, 0.8)),
        Rule::new("hands_skull", Condition::gt(Z, 0.75).and(outside(X, 0.15, 0.85))),
        Rule::new("chest_body", between(Z, 0.3, 0.7).and(between(X, 0.25, 0.75))),
        Rule::new("limbs", outside(X, 0.25, 0.75)),
        Rule::new("limbs", Condition::lt(Z, 0.3)),
        Rule::new(
            "detail",
            Condition::lt(X, 0.05)
                .or(Condition::gt(X, 0.95))
                .or(Condition::lt(Z, 0.05))
                .or(Condition::gt(Z, 0.95)),
        ),
        Rule::catch_all("accent"),
    ]
}

fn armor_regions() -> Vec<RegionSpec> {
    vec![
        RegionSpec::new("armor_primary", "#2E3A4B", "Slate Blue", "Main armor plates"),
        RegionSpec::new("armor_highlight", "#7B4E2D", "Brown", "Limb armor and panels"),
        RegionSpec::new("frame", "#5C5C5C", "Dark Gray", "Inner frame"),
        RegionSpec::new("joint_shadow", "#1B1B1B", "Black", "Joints and recesses"),
        RegionSpec::new("optics", "#C8102E", "Red", "Eyes and sensors"),
        RegionSpec::new("metal_light", "#A6A6A6", "Light Gray", "Exposed metal edges"),
        RegionSpec::new("metal_dark", "#3A3A3A", "Gunmetal", "Dark metal parts"),
        RegionSpec::new("accent", "#C78B2A", "Gold", "Trim accents"),
    ]
}

fn fine_rules() -> Vec<Rule> {
    vec![
        Rule::new("armor_primary", Condition::gt(Z, 0.85)),
        Rule::new("optics", Condition::gt(Z, 0.75).and(Condition::gt(Y, 0.6))),
        Rule::new("armor_highlight", Condition::gt(Z, 0.6).and(outside(X, 0.2, 0.8))),
        Rule::new("armor_primary", between(Z, 0.45, 0.75).and(between(X, 0.25, 0.75))),
        Rule::new("frame", between(Z, 0.3, 0.6).and(between(X, 0.15, 0.85))),
        Rule::new("joint_shadow", between(Z, 0.25, 0.45)),
        Rule::new(
            "metal_light",
            Condition::lt(X, 0.1)
                .or(Condition::gt(X, 0.9))
                .or(Condition::lt(Z, 0.1))
                .or(Condition::gt(Z, 0.9)),
        ),
        Rule::new("armor_highlight", Condition::lt(Z, 0.25)),
        Rule::catch_all("accent"),
    ]
}

fn triangle_rules() -> Vec<Rule> {
    // Height bands are half-open: (low, high]
    let band = |low: f64, high: f64| Condition::gt(Z, low).and(Condition::le(Z, high));
    vec![
        Rule::new("optics", Condition::gt(Z, 0.8).and(Condition::gt(Y, 0.6))),
        Rule::new("armor_primary", Condition::gt(Z, 0.8)),
        Rule::new("armor_primary", band(0.6, 0.8).and(between(X, 0.25, 0.75))),
        Rule::new(
            "armor_highlight",
            band(0.5, 0.8).and(Condition::le(X, 0.25).or(Condition::ge(X, 0.75))),
        ),
        Rule::new("frame", band(0.4, 0.6).and(between(X, 0.2, 0.8))),
        Rule::new("armor_highlight", band(0.4, 0.6)),
        Rule::new("joint_shadow", band(0.25, 0.4)),
        Rule::new("armor_highlight", band(0.15, 0.25)),
        Rule::new("accent", Condition::lt(Z, 0.05)),
        Rule::new("armor_primary", Condition::le(Z, 0.15)),
        Rule::new(
            "metal_light",
            outside(X, 0.05, 0.95).or(Condition::lt(Y, 0.05)).or(Condition::gt(Y, 0.95)),
        ),
        Rule::catch_all("accent"),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn region_of(preset: Preset, x: f64, y: f64, z: f64) -> String {
        let table = preset.table();
        let index = table.classify_normalized(&Point3::new(x, y, z));
        table.region(index).map(|r| r.id.clone()).unwrap_or_default()
    }

    #[test]
    fn test_presets_validate() {
        for preset in Preset::ALL {
            let built = preset.table();
            let checked = RuleTable::new(
                preset.name(),
                built.regions().to_vec(),
                built.rules().to_vec(),
            )
            .unwrap();
            assert_eq!(built, checked, "{preset}");
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("fine".parse::<Preset>().unwrap(), Preset::Fine);
        assert_eq!(" Triangle ".parse::<Preset>().unwrap(), Preset::Triangle);

        let err = "dense".parse::<Preset>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown preset 'dense' (expected one of: coarse, fine, triangle)"
        );
    }

    #[test]
    fn test_coarse_regions() {
        assert_eq!(region_of(Preset::Coarse, 0.5, 0.9, 0.9), "hands_skull");
        assert_eq!(region_of(Preset::Coarse, 0.5, 0.1, 0.9), "helmet");
        assert_eq!(region_of(Preset::Coarse, 0.1, 0.1, 0.78), "hands_skull");
        assert_eq!(region_of(Preset::Coarse, 0.5, 0.5, 0.5), "chest_body");
        assert_eq!(region_of(Preset::Coarse, 0.1, 0.5, 0.5), "limbs");
        assert_eq!(region_of(Preset::Coarse, 0.5, 0.5, 0.1), "limbs");
        assert_eq!(region_of(Preset::Coarse, 0.5, 0.5, 0.72), "accent");
    }

    #[test]
    fn test_fine_regions() {
        assert_eq!(region_of(Preset::Fine, 0.5, 0.5, 0.9), "armor_primary");
        assert_eq!(region_of(Preset::Fine, 0.5, 0.8, 0.8), "optics");
        assert_eq!(region_of(Preset::Fine, 0.1, 0.2, 0.7), "armor_highlight");
        assert_eq!(region_of(Preset::Fine, 0.5, 0.5, 0.5), "armor_primary");
        assert_eq!(region_of(Preset::Fine, 0.2, 0.5, 0.4), "frame");
        assert_eq!(region_of(Preset::Fine, 0.05, 0.5, 0.3), "joint_shadow");
        assert_eq!(region_of(Preset::Fine, 0.05, 0.5, 0.5), "metal_light");
        assert_eq!(region_of(Preset::Fine, 0.5, 0.5, 0.2), "armor_highlight");
    }

    #[test]
    fn test_triangle_regions() {
        assert_eq!(region_of(Preset::Triangle, 0.5, 0.7, 0.9), "optics");
        assert_eq!(region_of(Preset::Triangle, 0.5, 0.5, 0.7), "armor_primary");
        assert_eq!(region_of(Preset::Triangle, 0.1, 0.5, 0.7), "armor_highlight");
        assert_eq!(region_of(Preset::Triangle, 0.5, 0.5, 0.5), "frame");
        assert_eq!(region_of(Preset::Triangle, 0.5, 0.5, 0.3), "joint_shadow");
        assert_eq!(region_of(Preset::Triangle, 0.5, 0.5, 0.2), "armor_highlight");
        assert_eq!(region_of(Preset::Triangle, 0.5, 0.5, 0.1), "armor_primary");
        assert_eq!(region_of(Preset::Triangle, 0.5, 0.5, 0.01), "accent");
    }

    #[test]
    fn test_tables_are_independent_data() {
        let coarse = Preset::Coarse.table();
        let fine = Preset::Fine.table();
        assert_eq!(coarse.region_count(), 6);
        assert_eq!(fine.region_count(), 8);
        assert_eq!(Preset::Triangle.table().regions(), fine.regions());
    }
}
