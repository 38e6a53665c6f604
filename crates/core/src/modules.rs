//! Optimization module adapters.
//!
//! Every calculation module shares one task lifecycle. What differs per
//! module is captured by a [`ModuleAdapter`]: which reference records feed
//! the payload, which composition fields each parameter block carries,
//! which result fields hold reference identifiers, and where the compute
//! service exposes the start/progress/stop calls.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Reference kinds
// ---------------------------------------------------------------------------

/// Category of reference record a module draws its inputs from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Material,
    Fuel,
    Coal,
    Coke,
}

impl ReferenceKind {
    /// Value stored in `reference_records.kind`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Material => "material",
            Self::Fuel => "fuel",
            Self::Coal => "coal",
            Self::Coke => "coke",
        }
    }
}

// ---------------------------------------------------------------------------
// Adapter descriptor
// ---------------------------------------------------------------------------

/// Paths of the three compute-service calls for one module.
///
/// The stop path is a prefix: the correlation id is appended to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Endpoints {
    pub start: &'static str,
    pub progress: &'static str,
    pub stop: &'static str,
}

/// How a resolvable field stores its identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// A JSON object whose keys are identifiers (e.g. a blend-ratio map).
    MapKeys,
    /// A scalar identifier (number or string).
    Value,
}

/// A result field holding reference identifiers, addressed by dot path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvableField {
    pub path: &'static str,
    pub kind: FieldKind,
}

impl ResolvableField {
    pub const fn map_keys(path: &'static str) -> Self {
        Self {
            path,
            kind: FieldKind::MapKeys,
        }
    }

    pub const fn value(path: &'static str) -> Self {
        Self {
            path,
            kind: FieldKind::Value,
        }
    }
}

/// Everything the generic engine needs to know about one module.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModuleAdapter {
    pub module: OptimizationModule,
    pub reference_kind: ReferenceKind,
    /// Payload key under which the parameter blocks are sent.
    pub payload_key: &'static str,
    /// Numeric composition fields copied into every parameter block.
    pub composition_fields: &'static [&'static str],
    pub resolvable_fields: &'static [ResolvableField],
    pub endpoints: Endpoints,
}

// ---------------------------------------------------------------------------
// Modules
// ---------------------------------------------------------------------------

/// The calculation modules served by the compute service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationModule {
    /// Ore blending for sintering.
    SinterBlend,
    /// Solid fuel mix for sintering.
    SinterFuel,
    /// Coal blending for cokemaking.
    CoalBlend,
    /// Coke blending for the blast furnace.
    CokeBlend,
    /// Blast-furnace burden (sinter, pellet, lump ore) mix.
    BurdenMix,
}

impl OptimizationModule {
    pub const ALL: [OptimizationModule; 5] = [
        Self::SinterBlend,
        Self::SinterFuel,
        Self::CoalBlend,
        Self::CokeBlend,
        Self::BurdenMix,
    ];

    /// Name used in requests and stored in `optimization_tasks.module`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SinterBlend => "sinter_blend",
            Self::SinterFuel => "sinter_fuel",
            Self::CoalBlend => "coal_blend",
            Self::CokeBlend => "coke_blend",
            Self::BurdenMix => "burden_mix",
        }
    }

    pub fn adapter(self) -> &'static ModuleAdapter {
        match self {
            Self::SinterBlend => &SINTER_BLEND,
            Self::SinterFuel => &SINTER_FUEL,
            Self::CoalBlend => &COAL_BLEND,
            Self::CokeBlend => &COKE_BLEND,
            Self::BurdenMix => &BURDEN_MIX,
        }
    }
}

impl fmt::Display for OptimizationModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptimizationModule {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| CoreError::Validation(format!("Unknown optimization module '{s}'")))
    }
}

static SINTER_BLEND: ModuleAdapter = ModuleAdapter {
    module: OptimizationModule::SinterBlend,
    reference_kind: ReferenceKind::Material,
    payload_key: "materials",
    composition_fields: &["TFe", "SiO2", "CaO", "MgO", "Al2O3", "S", "P", "LOI", "H2O"],
    resolvable_fields: &[
        ResolvableField::map_keys("ratios"),
        ResolvableField::map_keys("costBreakdown"),
    ],
    endpoints: Endpoints {
        start: "/sinter/blend/start",
        progress: "/sinter/blend/progress",
        stop: "/sinter/blend/stop/",
    },
};

static SINTER_FUEL: ModuleAdapter = ModuleAdapter {
    module: OptimizationModule::SinterFuel,
    reference_kind: ReferenceKind::Fuel,
    payload_key: "fuels",
    composition_fields: &["FCad", "Ad", "Vdaf", "S", "H2O", "Qnet"],
    resolvable_fields: &[
        ResolvableField::map_keys("ratios"),
        ResolvableField::value("primaryFuelId"),
    ],
    endpoints: Endpoints {
        start: "/sinter/fuel/start",
        progress: "/sinter/fuel/progress",
        stop: "/sinter/fuel/stop/",
    },
};

static COAL_BLEND: ModuleAdapter = ModuleAdapter {
    module: OptimizationModule::CoalBlend,
    reference_kind: ReferenceKind::Coal,
    payload_key: "coals",
    composition_fields: &["Ad", "Vdaf", "St", "G", "Y", "X", "Mt"],
    resolvable_fields: &[ResolvableField::map_keys("ratios")],
    endpoints: Endpoints {
        start: "/coal/blend/start",
        progress: "/coal/blend/progress",
        stop: "/coal/blend/stop/",
    },
};

static COKE_BLEND: ModuleAdapter = ModuleAdapter {
    module: OptimizationModule::CokeBlend,
    reference_kind: ReferenceKind::Coke,
    payload_key: "cokes",
    composition_fields: &["Ad", "Vdaf", "St", "M40", "M10", "CRI", "CSR"],
    resolvable_fields: &[ResolvableField::map_keys("ratios")],
    endpoints: Endpoints {
        start: "/coke/blend/start",
        progress: "/coke/blend/progress",
        stop: "/coke/blend/stop/",
    },
};

static BURDEN_MIX: ModuleAdapter = ModuleAdapter {
    module: OptimizationModule::BurdenMix,
    reference_kind: ReferenceKind::Material,
    payload_key: "burden",
    composition_fields: &[
        "TFe", "SiO2", "CaO", "MgO", "Al2O3", "S", "P", "Zn", "K2O", "Na2O",
    ],
    resolvable_fields: &[
        ResolvableField::map_keys("ratios"),
        ResolvableField::map_keys("slag.sources"),
    ],
    endpoints: Endpoints {
        start: "/ironmaking/burden/start",
        progress: "/ironmaking/burden/progress",
        stop: "/ironmaking/burden/stop/",
    },
};
