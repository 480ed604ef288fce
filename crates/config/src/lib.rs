// MarchC - Extended March C- Memory Test
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Test plans: which region to march over in simulation, what the memory held
//! beforehand and which faults to inject.
//!
//! ```yaml
//! schema_version: "1.0"
//! name: sram-bank0
//! region:
//!   begin: 0x20000000
//!   size: "4KiB"          # or `end: 0x20000FFF`
//! memory:
//!   fill: 0xA5
//! faults:
//!   - stuck_at: { address: 0x20000010, bit: 3, level: true }
//! ```

use anyhow::{Context, Result};
use marchc_core::memory::InjectedFault;
use marchc_core::{Region, RegionError};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SCHEMA_VERSION: &str = "1.0";

/// Default schema version for YAML plans
fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

fn default_name() -> String {
    "march".to_string()
}

/// Erased flash and floating SRAM both tend to read high.
fn default_fill() -> u8 {
    0xFF
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unsupported schema_version '{0}' (expected \"1.0\")")]
    UnsupportedSchema(String),
    #[error("Region needs exactly one of `end` or `size`")]
    RegionBounds,
    #[error("Invalid size '{size}': {reason}")]
    InvalidSize { size: String, reason: String },
    #[error(transparent)]
    Region(#[from] RegionError),
    #[error("Fault #{index} names bit {bit}; bits are 0..=7")]
    BitOutOfRange { index: usize, bit: u8 },
    #[error("Fault #{index} touches {address:#x}, outside region {region}")]
    FaultOutsideRegion {
        index: usize,
        address: u64,
        region: Region,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RegionSpec {
    pub begin: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>, // e.g. "4KiB"
}

impl RegionSpec {
    pub fn resolve(&self) -> Result<Region, ConfigError> {
        match (self.end, &self.size) {
            (Some(end), None) => Ok(Region::new(self.begin, end)?),
            (None, Some(size)) => Ok(Region::with_len(self.begin, parse_size(size)?)?),
            _ => Err(ConfigError::RegionBounds),
        }
    }
}

impl From<Region> for RegionSpec {
    fn from(region: Region) -> Self {
        Self {
            begin: region.begin(),
            end: Some(region.end()),
            size: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct MemorySpec {
    /// Content of every cell before the march starts.
    #[serde(default = "default_fill")]
    pub fill: u8,
}

impl Default for MemorySpec {
    fn default() -> Self {
        Self {
            fill: default_fill(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct StuckAtSpec {
    pub address: u64,
    pub bit: u8,
    pub level: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct TransitionSpec {
    pub address: u64,
    pub bit: u8,
    /// `true`: the bit cannot rise 0 -> 1. `false`: it cannot fall 1 -> 0.
    pub rising: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct CouplingSpec {
    pub aggressor: u64,
    pub aggressor_bit: u8,
    pub victim: u64,
    pub victim_bit: u8,
    #[serde(default = "default_rising")]
    pub rising: bool,
}

fn default_rising() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct CorruptSpec {
    pub address: u64,
    #[serde(default)]
    pub after_writes: u64,
    pub value: u8,
}

/// One fault injection entry, keyed by its kind.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(untagged)]
pub enum FaultSpec {
    StuckAt { stuck_at: StuckAtSpec },
    Transition { transition: TransitionSpec },
    Coupling { coupling: CouplingSpec },
    Corrupt { corrupt: CorruptSpec },
}

impl From<FaultSpec> for InjectedFault {
    fn from(spec: FaultSpec) -> Self {
        match spec {
            FaultSpec::StuckAt { stuck_at: s } => InjectedFault::StuckAt {
                address: s.address,
                bit: s.bit,
                level: s.level,
            },
            FaultSpec::Transition { transition: t } => InjectedFault::Transition {
                address: t.address,
                bit: t.bit,
                rising: t.rising,
            },
            FaultSpec::Coupling { coupling: c } => InjectedFault::Coupling {
                aggressor: c.aggressor,
                aggressor_bit: c.aggressor_bit,
                victim: c.victim,
                victim_bit: c.victim_bit,
                rising: c.rising,
            },
            FaultSpec::Corrupt { corrupt: c } => InjectedFault::Corrupt {
                address: c.address,
                after_writes: c.after_writes,
                value: c.value,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TestPlan {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default = "default_name")]
    pub name: String,
    pub region: RegionSpec,
    #[serde(default)]
    pub memory: MemorySpec,
    #[serde(default)]
    pub faults: Vec<FaultSpec>,
}

impl TestPlan {
    /// Plan for a fault-free run over `region`.
    pub fn for_region(region: Region, fill: u8) -> Self {
        Self {
            schema_version: default_schema_version(),
            name: default_name(),
            region: region.into(),
            memory: MemorySpec { fill },
            faults: Vec::new(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read test plan at {:?}", path))?;
        Self::from_yaml(&contents).with_context(|| format!("Invalid test plan {:?}", path))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let plan: TestPlan =
            serde_yaml::from_str(yaml).context("Failed to parse test plan YAML")?;
        plan.validate()?;
        tracing::debug!(
            name = %plan.name,
            faults = plan.faults.len(),
            "Loaded test plan"
        );
        Ok(plan)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ConfigError::UnsupportedSchema(self.schema_version.clone()));
        }
        let region = self.region()?;
        for (index, fault) in self.injected_faults().iter().enumerate() {
            if let Some(&bit) = fault.bits().iter().find(|&&bit| bit > 7) {
                return Err(ConfigError::BitOutOfRange { index, bit });
            }
            if let Some(&address) = fault.addresses().iter().find(|&&a| !region.contains(a)) {
                return Err(ConfigError::FaultOutsideRegion {
                    index,
                    address,
                    region,
                });
            }
        }
        Ok(())
    }

    pub fn region(&self) -> Result<Region, ConfigError> {
        self.region.resolve()
    }

    pub fn injected_faults(&self) -> Vec<InjectedFault> {
        self.faults.iter().copied().map(InjectedFault::from).collect()
    }
}

/// Byte count from a plain integer or a human-readable size such as `4KiB`.
pub fn parse_size(size_str: &str) -> Result<u64, ConfigError> {
    use human_size::{Byte, Size, SpecificSize};

    let trimmed = size_str.trim();
    if let Ok(bytes) = trimmed.parse::<u64>() {
        return Ok(bytes);
    }
    let s: Size = trimmed.parse().map_err(|e| ConfigError::InvalidSize {
        size: size_str.to_string(),
        reason: format!("{}", e),
    })?;
    let bytes: SpecificSize<Byte> = s.into();
    let value = bytes.value();
    // 2^64 is exactly representable; anything at or above it does not fit.
    if value.fract() != 0.0 || !(0.0..18_446_744_073_709_551_616.0).contains(&value) {
        return Err(ConfigError::InvalidSize {
            size: size_str.to_string(),
            reason: format!("{} is not a whole number of bytes", value),
        });
    }
    Ok(value as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_plan_defaults() {
        let yaml = r#"
region:
  begin: 0x20000000
  end: 0x200000FF
"#;
        let plan = TestPlan::from_yaml(yaml).unwrap();
        assert_eq!(plan.schema_version, "1.0");
        assert_eq!(plan.name, "march");
        assert_eq!(plan.memory.fill, 0xFF);
        assert!(plan.faults.is_empty());
        assert_eq!(
            plan.region().unwrap(),
            Region::new(0x2000_0000, 0x2000_00FF).unwrap()
        );
    }

    #[test]
    fn test_size_instead_of_end() {
        let yaml = r#"
region:
  begin: 0x1000
  size: "4KiB"
"#;
        let plan = TestPlan::from_yaml(yaml).unwrap();
        let region = plan.region().unwrap();
        assert_eq!(region.len(), 4096);
        assert_eq!(region.end(), 0x1FFF);
    }

    #[test]
    fn test_end_and_size_together_rejected() {
        let spec = RegionSpec {
            begin: 0,
            end: Some(3),
            size: Some("4".to_string()),
        };
        assert_eq!(spec.resolve(), Err(ConfigError::RegionBounds));
        let spec = RegionSpec {
            begin: 0,
            end: None,
            size: None,
        };
        assert_eq!(spec.resolve(), Err(ConfigError::RegionBounds));
    }

    #[test]
    fn test_invalid_version() {
        let yaml = r#"
schema_version: "2.0"
region:
  begin: 0
  end: 3
"#;
        let err = TestPlan::from_yaml(yaml).unwrap_err();
        assert!(format!("{:#}", err).contains("Unsupported schema_version"));
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("16"), Ok(16));
        assert_eq!(parse_size(" 64 "), Ok(64));
        assert_eq!(parse_size("4KiB"), Ok(4096));
        assert_eq!(parse_size("1MiB"), Ok(1024 * 1024));
        assert!(matches!(
            parse_size("lots"),
            Err(ConfigError::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_parse_size_rejects_fractional_bytes() {
        for size in ["1.5B", "0.4B"] {
            assert!(
                matches!(parse_size(size), Err(ConfigError::InvalidSize { .. })),
                "{size}"
            );
        }
        // Fractions of a larger unit are fine when they land on a whole byte.
        assert_eq!(parse_size("1.5KiB"), Ok(1536));
    }

    #[test]
    fn test_parse_size_rejects_sizes_beyond_u64() {
        assert!(matches!(
            parse_size("32EiB"),
            Err(ConfigError::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_zero_size_rejected() {
        let spec = RegionSpec {
            begin: 0x10,
            end: None,
            size: Some("0".to_string()),
        };
        assert_eq!(
            spec.resolve(),
            Err(ConfigError::Region(RegionError::Empty { begin: 0x10 }))
        );
    }

    #[test]
    fn test_for_region_round_trips_through_yaml() {
        let region = Region::new(0x40, 0x7F).unwrap();
        let plan = TestPlan::for_region(region, 0x00);
        let yaml = serde_yaml::to_string(&plan).unwrap();
        let parsed = TestPlan::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, plan);
        assert_eq!(parsed.region().unwrap(), region);
    }
}
