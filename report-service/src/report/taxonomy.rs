use std::{collections::HashMap, fmt, str::FromStr};

use facility_client::domain::MeterType;

/// Built-in unit for a meter type. Unknown types have no unit.
pub fn unit_for(meter_type: &MeterType) -> &'static str {
    match meter_type {
        MeterType::Electricity | MeterType::AirConditioning => "kWh",
        MeterType::ColdWater | MeterType::HotWater => "m³",
        MeterType::Heat => "GJ",
        MeterType::Other(_) => "",
    }
}

/// Meter grouping a report is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Electricity,
    AirConditioning,
    Water,
    Heat,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown report category '{0}'")]
pub struct UnknownCategory(pub String);

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Electricity,
        Category::AirConditioning,
        Category::Water,
        Category::Heat,
    ];

    /// Label used in report filenames.
    pub fn label(self) -> &'static str {
        match self {
            Self::Electricity => "Energia_elektryczna",
            Self::AirConditioning => "Energia_klimatyzacja",
            Self::Water => "Woda",
            Self::Heat => "Cieplo",
        }
    }

    /// Short token used in URLs and on the command line.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Electricity => "electricity",
            Self::AirConditioning => "ac",
            Self::Water => "water",
            Self::Heat => "heat",
        }
    }

    /// Meter types making up this category. Water is the only union.
    pub fn meter_types(self) -> Vec<MeterType> {
        match self {
            Self::Electricity => vec![MeterType::Electricity],
            Self::AirConditioning => vec![MeterType::AirConditioning],
            Self::Water => vec![MeterType::ColdWater, MeterType::HotWater],
            Self::Heat => vec![MeterType::Heat],
        }
    }

    pub fn includes(self, meter_type: &MeterType) -> bool {
        matches!(
            (self, meter_type),
            (Self::Electricity, MeterType::Electricity)
                | (Self::AirConditioning, MeterType::AirConditioning)
                | (Self::Water, MeterType::ColdWater | MeterType::HotWater)
                | (Self::Heat, MeterType::Heat)
        )
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.slug().eq_ignore_ascii_case(needle) || c.label().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownCategory(needle.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unit lookup table handed to the row builder.
///
/// Starts from [`unit_for`] and may be overridden per meter type from config.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    overrides: HashMap<MeterType, String>,
}

impl Taxonomy {
    /// Keys are meter type tokens or labels, values the unit to display.
    pub fn with_overrides(units: &HashMap<String, String>) -> Self {
        let overrides = units
            .iter()
            .map(|(k, v)| (MeterType::from(k.clone()), v.clone()))
            .collect();
        Self { overrides }
    }

    pub fn unit_for(&self, meter_type: &MeterType) -> &str {
        match self.overrides.get(meter_type) {
            Some(unit) => unit,
            None => unit_for(meter_type),
        }
    }

    /// Unit used when neither the meter nor its type specify one.
    pub fn default_unit(&self, category: Category) -> &str {
        category.meter_types().first().map_or("", |t| self.unit_for(t))
    }
}
