//! Ordered rule tables mapping normalized positions to regions.
//!
//! A [`RuleTable`] declares a list of regions (id, color, label, usage note)
//! and an ordered list of [`Rule`]s. Classification walks the rules in order
//! and returns the region of the first one whose condition matches, so the
//! table must end with an unconditional `always` rule.
//!
//! Tables are plain data. They can be built in code, taken from a
//! [`Preset`](crate::Preset), or loaded from TOML:
//!
//! ```toml
//! name = "two-tone"
//!
//! [[region]]
//! id = "top"
//! hex = "#C8102E"
//! label = "Red"
//! use = "Upper fifth"
//!
//! [[region]]
//! id = "body"
//! hex = "#5C5C5C"
//! label = "Dark Gray"
//!
//! [[rule]]
//! region = "top"
//! when = "z > 0.8"
//!
//! [[rule]]
//! region = "body"
//! when = "always"
//! ```

use std::path::{Path, PathBuf};

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use mesh_types::{Aabb, VertexColor};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::condition::Condition;
use crate::error::{RegionError, RegionResult};
use crate::metadata::filename_stem;

/// Placeholder path used for tables parsed from memory.
const IN_MEMORY: &str = "<string>";

/// One region a rule table can assign triangles to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSpec {
    /// Identifier used by rules and output filenames.
    pub id: String,
    /// Display color as `#RRGGBB`.
    pub hex: String,
    /// Material or color name shown to the user.
    pub label: String,
    /// Free-text note on what the region covers.
    #[serde(rename = "use", default)]
    pub usage: String,
}

impl RegionSpec {
    /// Create a region description.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        hex: impl Into<String>,
        label: impl Into<String>,
        usage: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            hex: hex.into(),
            label: label.into(),
            usage: usage.into(),
        }
    }

    /// Parsed display color, if `hex` is valid.
    #[must_use]
    pub fn color(&self) -> Option<VertexColor> {
        VertexColor::from_hex(&self.hex).ok()
    }
}

/// A condition paired with the region it selects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Region id assigned when the condition matches.
    pub region: String,
    /// Condition over the normalized centroid.
    pub when: Condition,
}

impl Rule {
    /// Create a rule.
    #[must_use]
    pub fn new(region: impl Into<String>, when: Condition) -> Self {
        Self {
            region: region.into(),
            when,
        }
    }

    /// Create the unconditional rule that ends every table.
    #[must_use]
    pub fn catch_all(region: impl Into<String>) -> Self {
        Self::new(region, Condition::Always)
    }
}

/// A validated, ordered rule table.
///
/// Construction checks every invariant classification relies on, so a
/// `RuleTable` always assigns every position to exactly one declared region.
///
/// # Example
///
/// ```
/// use mesh_region::{Axis, Condition, RegionSpec, Rule, RuleTable};
/// use mesh_types::Point3;
///
/// let table = RuleTable::new(
///     "two-tone",
///     vec![
///         RegionSpec::new("top", "#C8102E", "Red", "Upper fifth"),
///         RegionSpec::new("body", "#5C5C5C", "Dark Gray", "Everything else"),
///     ],
///     vec![
///         Rule::new("top", Condition::gt(Axis::Z, 0.8)),
///         Rule::catch_all("body"),
///     ],
/// )
/// .unwrap();
///
/// assert_eq!(table.classify_normalized(&Point3::new(0.5, 0.5, 0.9)), 0);
/// assert_eq!(table.classify_normalized(&Point3::new(0.5, 0.5, 0.1)), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleTable {
    name: String,
    #[serde(rename = "region")]
    regions: Vec<RegionSpec>,
    #[serde(rename = "rule")]
    rules: Vec<Rule>,
    /// Region index selected by each rule.
    #[serde(skip)]
    targets: Vec<u32>,
    /// Region index of the terminal rule.
    #[serde(skip)]
    catch_all: u32,
}

impl RuleTable {
    /// Build and validate a rule table.
    ///
    /// # Errors
    ///
    /// - [`RegionError::MissingField`] if a region has an empty id or label
    /// - [`RegionError::DuplicateRegion`] if two regions share an id
    /// - [`RegionError::FilenameCollision`] if two ids sanitize to the same filename
    /// - [`RegionError::InvalidColor`] if a region's `hex` is not `#RRGGBB`
    /// - [`RegionError::UnknownRegion`] if a rule names an undeclared region
    /// - [`RegionError::InvalidCondition`] if a threshold is NaN or infinite
    /// - [`RegionError::UnreachableRule`] if an `always` rule is not last
    /// - [`RegionError::MissingCatchAll`] if the last rule is conditional
    pub fn new(
        name: impl Into<String>,
        regions: Vec<RegionSpec>,
        rules: Vec<Rule>,
    ) -> RegionResult<Self> {
        validate_regions(&regions)?;
        let targets = resolve_targets(&regions, &rules)?;

        match rules.iter().position(|r| r.when.is_always()) {
            Some(k) if k + 1 < rules.len() => {
                return Err(RegionError::UnreachableRule { rule_index: k + 1 })
            }
            Some(_) => {}
            None => return Err(RegionError::MissingCatchAll),
        }

        let catch_all = targets.last().copied().unwrap_or_default();
        Ok(Self {
            name: name.into(),
            regions,
            rules,
            targets,
            catch_all,
        })
    }

    /// Assemble a table from data known to be valid.
    ///
    /// Unknown rule regions fall back to the first region; callers cover
    /// the data with a test that runs it through [`RuleTable::new`].
    pub(crate) fn from_trusted(name: &str, regions: Vec<RegionSpec>, rules: Vec<Rule>) -> Self {
        let targets: Vec<u32> = rules
            .iter()
            .map(|rule| {
                regions
                    .iter()
                    .zip(0u32..)
                    .find(|(r, _)| r.id == rule.region)
                    .map_or(0, |(_, i)| i)
            })
            .collect();
        let catch_all = targets.last().copied().unwrap_or_default();
        Self {
            name: name.to_string(),
            regions,
            rules,
            targets,
            catch_all,
        }
    }

    /// Table name (preset name or file stem).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared regions, in declaration order.
    #[must_use]
    pub fn regions(&self) -> &[RegionSpec] {
        &self.regions
    }

    /// Rules, in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of declared regions.
    #[must_use]
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Region at a classification index.
    #[must_use]
    pub fn region(&self, index: u32) -> Option<&RegionSpec> {
        self.regions.get(index as usize)
    }

    /// Classification index of a region id.
    #[must_use]
    pub fn region_index(&self, id: &str) -> Option<u32> {
        self.regions
            .iter()
            .zip(0u32..)
            .find_map(|(r, i)| (r.id == id).then_some(i))
    }

    /// Region index for a position already normalized to the bounding box.
    #[must_use]
    pub fn classify_normalized(&self, position: &Point3<f64>) -> u32 {
        self.rules
            .iter()
            .zip(&self.targets)
            .find_map(|(rule, &target)| rule.when.matches(position).then_some(target))
            .unwrap_or(self.catch_all)
    }

    /// Region index for a raw centroid, normalizing against `bounds`.
    ///
    /// Axes with zero extent normalize to 0.
    #[inline]
    #[must_use]
    pub fn classify(&self, centroid: &Point3<f64>, bounds: &Aabb) -> u32 {
        self.classify_normalized(&bounds.normalize(centroid))
    }

    /// Replace colors, labels, and usage notes with those of a palette.
    ///
    /// Entries are matched by id. Regions missing from the palette keep
    /// their values; palette entries for unknown ids are ignored. An empty
    /// usage note in the palette keeps the existing one.
    #[must_use]
    pub fn with_palette(mut self, palette: &[RegionSpec]) -> Self {
        for entry in palette {
            let Some(region) = self.regions.iter_mut().find(|r| r.id == entry.id) else {
                debug!(region = %entry.id, table = %self.name, "palette entry has no matching region");
                continue;
            };
            region.hex.clone_from(&entry.hex);
            region.label.clone_from(&entry.label);
            if !entry.usage.is_empty() {
                region.usage.clone_from(&entry.usage);
            }
        }
        self
    }

    /// Parse a table from TOML text.
    ///
    /// The table is named by its `name` key, or `"custom"` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::Config`] for TOML syntax errors,
    /// [`RegionError::MissingField`] for incomplete entries,
    /// [`RegionError::InvalidCondition`] for unparsable `when` expressions,
    /// and any error from [`RuleTable::new`].
    pub fn from_toml_str(text: &str) -> RegionResult<Self> {
        Self::parse(text, Path::new(IN_MEMORY), "custom")
    }

    /// Load a table from a TOML file.
    ///
    /// Without a `name` key the file stem is used.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::Io`] if the file cannot be read, otherwise
    /// as [`RuleTable::from_toml_str`].
    pub fn load<P: AsRef<Path>>(path: P) -> RegionResult<Self> {
        let path = path.as_ref();
        let text = read_config(path)?;
        let stem = path
            .file_stem()
            .map_or_else(|| "custom".into(), |s| s.to_string_lossy());
        let table = Self::parse(&text, path, &stem)?;
        debug!(
            path = %path.display(),
            regions = table.regions.len(),
            rules = table.rules.len(),
            "loaded rule table"
        );
        Ok(table)
    }

    /// Serialize to the TOML form read by [`RuleTable::from_toml_str`].
    ///
    /// # Errors
    ///
    /// Returns the serializer's error if the table cannot be represented.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    fn parse(text: &str, path: &Path, default_name: &str) -> RegionResult<Self> {
        let raw: RawTable = toml::from_str(text).map_err(|source| RegionError::Config {
            path: path.to_path_buf(),
            source,
        })?;

        let regions = raw
            .region
            .into_iter()
            .enumerate()
            .map(|(i, r)| r.into_spec(i))
            .collect::<RegionResult<Vec<_>>>()?;

        let rules = raw
            .rule
            .into_iter()
            .enumerate()
            .map(|(i, r)| r.into_rule(i))
            .collect::<RegionResult<Vec<_>>>()?;

        Self::new(
            raw.name.unwrap_or_else(|| default_name.to_string()),
            regions,
            rules,
        )
    }
}

/// Parse a palette: a TOML list of `[[region]]` entries without rules.
///
/// # Errors
///
/// Returns [`RegionError::Config`] for TOML syntax errors,
/// [`RegionError::MissingField`] for entries lacking `id`, `hex`, or
/// `label`, and [`RegionError::InvalidColor`] for malformed colors.
pub fn parse_palette(text: &str) -> RegionResult<Vec<RegionSpec>> {
    palette_from(text, Path::new(IN_MEMORY))
}

/// Load a palette file.
///
/// # Errors
///
/// Returns [`RegionError::Io`] if the file cannot be read, otherwise as
/// [`parse_palette`].
pub fn load_palette<P: AsRef<Path>>(path: P) -> RegionResult<Vec<RegionSpec>> {
    let path = path.as_ref();
    let text = read_config(path)?;
    palette_from(&text, path)
}

fn palette_from(text: &str, path: &Path) -> RegionResult<Vec<RegionSpec>> {
    let raw: RawTable = toml::from_str(text).map_err(|source| RegionError::Config {
        path: path.to_path_buf(),
        source,
    })?;
    raw.region
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            let spec = r.into_spec(i)?;
            if spec.color().is_none() {
                return Err(RegionError::InvalidColor {
                    region: spec.id,
                    value: spec.hex,
                });
            }
            Ok(spec)
        })
        .collect()
}

fn validate_regions(regions: &[RegionSpec]) -> RegionResult<()> {
    // Ids that sanitize to the same stem would share an output file
    let mut stems: HashMap<String, &str> = HashMap::with_capacity(regions.len());
    for (i, region) in regions.iter().enumerate() {
        if region.id.trim().is_empty() {
            return Err(RegionError::missing(format!("region {i}"), "id"));
        }
        if region.label.trim().is_empty() {
            return Err(RegionError::missing(format!("region {i}"), "label"));
        }
        match stems.entry(filename_stem(&region.id)) {
            Entry::Occupied(e) if *e.get() == region.id => {
                return Err(RegionError::DuplicateRegion {
                    name: region.id.clone(),
                });
            }
            Entry::Occupied(e) => {
                return Err(RegionError::FilenameCollision {
                    first: (*e.get()).to_string(),
                    second: region.id.clone(),
                    stem: e.key().clone(),
                });
            }
            Entry::Vacant(e) => {
                e.insert(region.id.as_str());
            }
        }
        if region.color().is_none() {
            return Err(RegionError::InvalidColor {
                region: region.id.clone(),
                value: region.hex.clone(),
            });
        }
    }
    Ok(())
}

/// Region index selected by each rule.
fn resolve_targets(regions: &[RegionSpec], rules: &[Rule]) -> RegionResult<Vec<u32>> {
    let index: HashMap<&str, u32> = regions
        .iter()
        .zip(0u32..)
        .map(|(r, i)| (r.id.as_str(), i))
        .collect();

    let mut targets = Vec::with_capacity(rules.len());
    for (i, rule) in rules.iter().enumerate() {
        let Some(&target) = index.get(rule.region.as_str()) else {
            return Err(RegionError::UnknownRegion {
                rule_index: i,
                region: rule.region.clone(),
            });
        };
        if let Some(value) = rule.when.non_finite_threshold() {
            return Err(RegionError::InvalidCondition {
                rule_index: i,
                message: format!("threshold {value} is not finite"),
            });
        }
        targets.push(target);
    }
    Ok(targets)
}

fn read_config(path: &Path) -> RegionResult<String> {
    std::fs::read_to_string(path).map_err(|source| RegionError::Io {
        path: PathBuf::from(path),
        source,
    })
}

/// On-disk shape of a rule table, before required fields are checked.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTable {
    name: Option<String>,
    #[serde(default)]
    region: Vec<RawRegion>,
    #[serde(default)]
    rule: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRegion {
    id: Option<String>,
    hex: Option<String>,
    label: Option<String>,
    #[serde(rename = "use")]
    usage: Option<String>,
}

impl RawRegion {
    fn into_spec(self, index: usize) -> RegionResult<RegionSpec> {
        let location = || format!("region {index}");
        Ok(RegionSpec {
            id: self.id.ok_or_else(|| RegionError::missing(location(), "id"))?,
            hex: self.hex.ok_or_else(|| RegionError::missing(location(), "hex"))?,
            label: self
                .label
                .ok_or_else(|| RegionError::missing(location(), "label"))?,
            usage: self.usage.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRule {
    region: Option<String>,
    when: Option<String>,
}

impl RawRule {
    fn into_rule(self, index: usize) -> RegionResult<Rule> {
        let location = || format!("rule {index}");
        let region = self
            .region
            .ok_or_else(|| RegionError::missing(location(), "region"))?;
        let text = self
            .when
            .ok_or_else(|| RegionError::missing(location(), "when"))?;
        let when = text
            .parse::<Condition>()
            .map_err(|err| RegionError::InvalidCondition {
                rule_index: index,
                message: format!("'{text}' {err}"),
            })?;
        Ok(Rule { region, when })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::condition::Axis;

    fn two_tone() -> RuleTable {
        RuleTable::new(
            "two-tone",
            vec![
                RegionSpec::new("top", "#C8102E", "Red", "Upper fifth"),
                RegionSpec::new("body", "#5C5C5C", "Dark Gray", ""),
            ],
            vec![
                Rule::new("top", Condition::gt(Axis::Z, 0.8)),
                Rule::catch_all("body"),
            ],
        )
        .unwrap()
    }

    const TWO_TONE_TOML: &str = r##"
name = "two-tone"

[[region]]
id = "top"
hex = "#C8102E"
label = "Red"
use = "Upper fifth"

[[region]]
id = "body"
hex = "#5C5C5C"
label = "Dark Gray"

[[rule]]
region = "top"
when = "z > 0.8"

[[rule]]
region = "body"
when = "always"
"##;

    #[test]
    fn test_first_match_wins() {
        let table = RuleTable::new(
            "overlap",
            vec![
                RegionSpec::new("a", "#000000", "A", ""),
                RegionSpec::new("b", "#FFFFFF", "B", ""),
            ],
            vec![
                Rule::new("a", Condition::gt(Axis::Z, 0.5)),
                Rule::new("b", Condition::gt(Axis::Z, 0.2)),
                Rule::catch_all("b"),
            ],
        )
        .unwrap();

        assert_eq!(table.classify_normalized(&Point3::new(0.0, 0.0, 0.9)), 0);
        assert_eq!(table.classify_normalized(&Point3::new(0.0, 0.0, 0.3)), 1);
        assert_eq!(table.classify_normalized(&Point3::new(0.0, 0.0, 0.0)), 1);
    }

    #[test]
    fn test_classify_normalizes() {
        let table = two_tone();
        let bounds = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 10.0, 100.0));

        assert_eq!(table.classify(&Point3::new(5.0, 5.0, 90.0), &bounds), 0);
        assert_eq!(table.classify(&Point3::new(5.0, 5.0, 10.0), &bounds), 1);
    }

    #[test]
    fn test_flat_axis_normalizes_to_zero() {
        let table = two_tone();
        let flat = Aabb::new(Point3::new(0.0, 0.0, 5.0), Point3::new(10.0, 10.0, 5.0));
        assert_eq!(table.classify(&Point3::new(1.0, 1.0, 5.0), &flat), 1);
    }

    #[test]
    fn test_missing_catch_all() {
        let err = RuleTable::new(
            "open",
            vec![RegionSpec::new("top", "#C8102E", "Red", "")],
            vec![Rule::new("top", Condition::gt(Axis::Z, 0.8))],
        )
        .unwrap_err();
        assert!(matches!(err, RegionError::MissingCatchAll));

        let err = RuleTable::new("empty", vec![], vec![]).unwrap_err();
        assert!(matches!(err, RegionError::MissingCatchAll));
    }

    #[test]
    fn test_unreachable_rule() {
        let err = RuleTable::new(
            "shadowed",
            vec![RegionSpec::new("a", "#000000", "A", "")],
            vec![
                Rule::catch_all("a"),
                Rule::new("a", Condition::gt(Axis::X, 0.5)),
                Rule::catch_all("a"),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, RegionError::UnreachableRule { rule_index: 1 }));
    }

    #[test]
    fn test_unknown_region() {
        let err = RuleTable::new(
            "typo",
            vec![RegionSpec::new("body", "#5C5C5C", "Gray", "")],
            vec![
                Rule::new("bdy", Condition::gt(Axis::Z, 0.8)),
                Rule::catch_all("body"),
            ],
        )
        .unwrap_err();
        match err {
            RegionError::UnknownRegion { rule_index, region } => {
                assert_eq!(rule_index, 0);
                assert_eq!(region, "bdy");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_region_validation() {
        let dup = RuleTable::new(
            "dup",
            vec![
                RegionSpec::new("a", "#000000", "A", ""),
                RegionSpec::new("a", "#FFFFFF", "B", ""),
            ],
            vec![Rule::catch_all("a")],
        );
        assert!(matches!(dup, Err(RegionError::DuplicateRegion { .. })));

        let bad_color = RuleTable::new(
            "color",
            vec![RegionSpec::new("a", "brown", "A", "")],
            vec![Rule::catch_all("a")],
        );
        assert!(matches!(bad_color, Err(RegionError::InvalidColor { .. })));

        let no_label = RuleTable::new(
            "label",
            vec![RegionSpec::new("a", "#000000", " ", "")],
            vec![Rule::catch_all("a")],
        );
        assert!(matches!(
            no_label,
            Err(RegionError::MissingField { field: "label", .. })
        ));
    }

    #[test]
    fn test_ids_sharing_a_filename_rejected() {
        let err = RuleTable::new(
            "slash",
            vec![
                RegionSpec::new("a/b", "#000000", "A", ""),
                RegionSpec::new("a_b", "#FFFFFF", "B", ""),
            ],
            vec![
                Rule::new("a/b", Condition::gt(Axis::Z, 0.5)),
                Rule::catch_all("a_b"),
            ],
        )
        .unwrap_err();
        assert!(err.is_config_error());
        match err {
            RegionError::FilenameCollision {
                first,
                second,
                stem,
            } => {
                assert_eq!(first, "a/b");
                assert_eq!(second, "a_b");
                assert_eq!(stem, "a_b");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_finite_threshold_rejected() {
        let err = RuleTable::new(
            "nan",
            vec![RegionSpec::new("a", "#000000", "A", "")],
            vec![
                Rule::new("a", Condition::gt(Axis::Y, f64::NAN)),
                Rule::catch_all("a"),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, RegionError::InvalidCondition { rule_index: 0, .. }));
    }

    #[test]
    fn test_from_toml() {
        let table = RuleTable::from_toml_str(TWO_TONE_TOML).unwrap();
        assert_eq!(table, two_tone());
        assert_eq!(table.name(), "two-tone");
        assert_eq!(table.regions()[0].usage, "Upper fifth");
        assert_eq!(table.region_index("body"), Some(1));
    }

    #[test]
    fn test_toml_roundtrip() {
        let table = two_tone();
        let text = table.to_toml_string().unwrap();
        assert_eq!(RuleTable::from_toml_str(&text).unwrap(), table);
    }

    #[test]
    fn test_toml_missing_field_names_entry() {
        let text = r##"
[[region]]
id = "a"
hex = "#000000"
label = "A"

[[rule]]
region = "a"
"##;
        match RuleTable::from_toml_str(text).unwrap_err() {
            RegionError::MissingField { location, field } => {
                assert_eq!(location, "rule 0");
                assert_eq!(field, "when");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_toml_bad_condition_names_rule() {
        let text = r##"
[[region]]
id = "a"
hex = "#000000"
label = "A"

[[rule]]
region = "a"
when = "z >> 0.5"

[[rule]]
region = "a"
when = "always"
"##;
        let err = RuleTable::from_toml_str(text).unwrap_err();
        assert!(matches!(err, RegionError::InvalidCondition { rule_index: 0, .. }));
        assert!(err.is_config_error());

        let deep = text.replace("z >> 0.5", &format!("{}always", "!".repeat(200_000)));
        let err = RuleTable::from_toml_str(&deep).unwrap_err();
        assert!(matches!(err, RegionError::InvalidCondition { rule_index: 0, .. }));
    }

    #[test]
    fn test_toml_syntax_error() {
        let err = RuleTable::from_toml_str("[[region]\nid = ").unwrap_err();
        assert!(matches!(err, RegionError::Config { .. }));
    }

    #[test]
    fn test_load_uses_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("robot.toml");
        std::fs::write(&path, TWO_TONE_TOML.replace("name = \"two-tone\"", "")).unwrap();

        let table = RuleTable::load(&path).unwrap();
        assert_eq!(table.name(), "robot");

        let missing = RuleTable::load(dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(RegionError::Io { .. })));
    }

    #[test]
    fn test_palette_overrides_by_id() {
        let palette = parse_palette(
            r##"
[[region]]
id = "top"
hex = "#FFD700"
label = "Gold"

[[region]]
id = "wings"
hex = "#000000"
label = "Black"
"##,
        )
        .unwrap();

        let table = two_tone().with_palette(&palette);
        let top = table.region(0).unwrap();
        assert_eq!(top.hex, "#FFD700");
        assert_eq!(top.label, "Gold");
        assert_eq!(top.usage, "Upper fifth");
        assert_eq!(table.region(1).unwrap().label, "Dark Gray");
    }

    #[test]
    fn test_palette_rejects_bad_color() {
        let err = parse_palette("[[region]]\nid = \"a\"\nhex = \"#12\"\nlabel = \"A\"\n").unwrap_err();
        assert!(matches!(err, RegionError::InvalidColor { .. }));
    }
}
