use std::{convert::Infallible, fmt, str::FromStr};

/// Kind of physical meter installed in a facility.
///
/// The dashboard stores the Polish labels (`Energia elektryczna`, ...) while
/// API clients tend to send the short tokens (`ELECTRICITY`, `AC`, ...). Both
/// parse to the same variant; anything unknown is preserved as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "String", into = "String")
)]
pub enum MeterType {
    Electricity,
    AirConditioning,
    ColdWater,
    HotWater,
    Heat,
    Other(String),
}

impl MeterType {
    /// Label used by the dashboard and the database.
    pub fn label(&self) -> &str {
        match self {
            Self::Electricity => "Energia elektryczna",
            Self::AirConditioning => "Energia klimatyzacja",
            Self::ColdWater => "Woda zimna",
            Self::HotWater => "Woda ciepła",
            Self::Heat => "Licznik ciepła",
            Self::Other(s) => s,
        }
    }
}

impl FromStr for MeterType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = match trimmed.to_uppercase().as_str() {
            "ELECTRICITY" | "ENERGIA ELEKTRYCZNA" => Self::Electricity,
            "AC" | "ENERGIA KLIMATYZACJA" => Self::AirConditioning,
            "COLD_WATER" | "WODA ZIMNA" => Self::ColdWater,
            "HOT_WATER" | "WODA CIEPŁA" => Self::HotWater,
            "HEAT" | "LICZNIK CIEPŁA" => Self::Heat,
            _ => Self::Other(trimmed.to_string()),
        };
        Ok(parsed)
    }
}

impl From<String> for MeterType {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(t) => t,
            Err(never) => match never {},
        }
    }
}

impl From<MeterType> for String {
    fn from(t: MeterType) -> Self {
        t.label().to_string()
    }
}

impl fmt::Display for MeterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Meter {
    pub serial_number: String,
    pub meter_type: MeterType,
    pub facility_name: String,
    pub ppe: Option<String>,
    pub unit: Option<String>,
    pub multiply_factor: Option<f64>,
}
