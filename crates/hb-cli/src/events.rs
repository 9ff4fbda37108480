//! Fill instructions replayed by `histbook run`.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use hb_core::ContainerKind;
use hb_registry::{KeySpec, Registry};
use serde::Deserialize;

fn unit_weight() -> f64 {
    1.0
}

/// One fill call, tagged by container kind. Unknown fields are rejected.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum FillInstruction {
    H1 {
        name: String,
        #[serde(default)]
        index: Option<usize>,
        #[serde(default)]
        particle: Option<String>,
        /// Address an unchanged-name histogram by its literal key.
        #[serde(default)]
        verbatim: bool,
        value: f64,
        #[serde(default = "unit_weight")]
        weight: f64,
    },
    H2 {
        name: String,
        #[serde(default)]
        index: Option<usize>,
        x: f64,
        y: f64,
        #[serde(default = "unit_weight")]
        weight: f64,
    },
    Eff {
        name: String,
        x: f64,
        passed: bool,
        #[serde(default = "unit_weight")]
        weight: f64,
    },
    Sparse {
        name: String,
        values: Vec<f64>,
        #[serde(default = "unit_weight")]
        weight: f64,
    },
    Tuple {
        name: String,
        values: Vec<f64>,
    },
    Tree {
        name: String,
        #[serde(default)]
        fields: BTreeMap<String, f64>,
    },
}

pub fn read_instructions(path: &Path) -> Result<Vec<FillInstruction>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read events file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("invalid fill instructions in {}", path.display()))
}

fn spec<'a>(name: &'a str, index: Option<usize>, particle: Option<&'a str>) -> KeySpec<'a> {
    let mut spec = KeySpec::new(name);
    if let Some(i) = index {
        spec = spec.index(i);
    }
    if let Some(p) = particle {
        spec = spec.particle(p);
    }
    spec
}

impl FillInstruction {
    /// Forward to the registry. Misses are reported by the registry and
    /// yield `Ok(false)`; arity violations are errors.
    pub fn apply(&self, reg: &mut Registry) -> Result<bool> {
        let hit = match self {
            FillInstruction::H1 { name, index, particle, verbatim, value, weight } => {
                let target = if *verbatim {
                    KeySpec::verbatim(name)
                } else {
                    spec(name, *index, particle.as_deref())
                };
                reg.fill_1d(target, *value, *weight)
            }
            FillInstruction::H2 { name, index, x, y, weight } => {
                reg.fill_2d(spec(name, *index, None), *x, *y, *weight)
            }
            FillInstruction::Eff { name, x, passed, weight } => {
                reg.fill_eff_weighted(name, *x, *passed, *weight)
            }
            FillInstruction::Sparse { name, values, weight } => {
                reg.fill_sparse(name, values, *weight)?
            }
            FillInstruction::Tuple { name, values } => reg.fill_tuple(name, values)?,
            FillInstruction::Tree { name, fields } => {
                // An unbooked tree counts as a single miss, not one per field.
                if !reg.contains(ContainerKind::TreeRecord, name) {
                    return Ok(reg.fill_tree(name));
                }
                for (field, value) in fields {
                    reg.set_field(name, field, *value);
                }
                reg.fill_tree(name)
            }
        };
        Ok(hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hb_core::{AxisSpec, BinnedAccumulator};

    #[test]
    fn parses_tagged_instructions() {
        let text = r#"[
            {"kind": "h1", "name": "pt", "index": 1, "particle": "Muon", "value": 3.0},
            {"kind": "eff", "name": "trig", "x": 10.0, "passed": true},
            {"kind": "tree", "name": "events", "fields": {"pt": 2.0}}
        ]"#;
        let parsed: Vec<FillInstruction> = serde_json::from_str(text).unwrap();
        assert_eq!(parsed.len(), 3);
        match &parsed[0] {
            FillInstruction::H1 { weight, index, .. } => {
                assert_eq!(*weight, 1.0);
                assert_eq!(*index, Some(1));
            }
            other => panic!("unexpected instruction: {other:?}"),
        }
    }

    #[test]
    fn apply_routes_by_kind() {
        let mut reg = Registry::new();
        reg.create_hist1d_family(2, "pt", Some("Muon"), &AxisSpec::new(4, 0.0, 4.0)).unwrap();
        let ins = FillInstruction::H1 {
            name: "pt".into(),
            index: Some(1),
            particle: Some("Muon".into()),
            verbatim: false,
            value: 2.5,
            weight: 0.5,
        };
        assert!(ins.apply(&mut reg).unwrap());
        let h = reg.hist1d(KeySpec::new("pt").index(1).particle("Muon")).unwrap();
        assert_eq!(h.bin_content(3), 0.5);

        let miss = FillInstruction::Sparse { name: "met".into(), values: vec![1.0], weight: 1.0 };
        assert!(!miss.apply(&mut reg).unwrap());
    }

    #[test]
    fn verbatim_reaches_unchanged_name() {
        let mut reg = Registry::new();
        reg.create_hist1d_unchanged("raw", "Raw", &AxisSpec::new(2, 0.0, 2.0)).unwrap();
        let ins: FillInstruction =
            serde_json::from_str(r#"{"kind": "h1", "name": "raw", "verbatim": true, "value": 1.0}"#)
                .unwrap();
        assert!(ins.apply(&mut reg).unwrap());
        assert_eq!(reg.hist1d(KeySpec::verbatim("raw")).unwrap().bin_content(2), 1.0);
        assert_eq!(reg.stats().misses, 0);
    }

    #[test]
    fn unknown_instruction_field_rejected() {
        let text = r#"{"kind": "h1", "name": "raw", "verbatm": true, "value": 1.0}"#;
        assert!(serde_json::from_str::<FillInstruction>(text).is_err());
    }

    #[test]
    fn unbooked_tree_is_one_miss() {
        let mut reg = Registry::new();
        let ins: FillInstruction = serde_json::from_str(
            r#"{"kind": "tree", "name": "events", "fields": {"a": 1.0, "b": 2.0, "c": 3.0}}"#,
        )
        .unwrap();
        assert!(!ins.apply(&mut reg).unwrap());
        assert_eq!(reg.stats().misses, 1);
    }

    #[test]
    fn unknown_tree_field_does_not_block_fill() {
        let mut reg = Registry::new();
        let mut fields = BTreeMap::new();
        fields.insert("a".to_string(), 0.0);
        reg.create_tree(&fields, "events").unwrap();
        let ins: FillInstruction =
            serde_json::from_str(r#"{"kind": "tree", "name": "events", "fields": {"a": 4.0, "zz": 1.0}}"#)
                .unwrap();
        assert!(ins.apply(&mut reg).unwrap());
        assert_eq!(reg.record("events").unwrap().rows(), [vec![4.0]]);
        assert_eq!(reg.stats().misses, 0);
    }
}
