use serde::{Deserialize, Deserializer, Serialize};

#[cfg(feature = "ts")]
use ts_rs::TS;

/// pH window considered healthy for most hydroponic crops
const PH_MIN: f64 = 5.5;
const PH_MAX: f64 = 6.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum PlantStatus {
    Healthy,
    Monitoring,
    Unknown,
}

impl PlantStatus {
    pub fn from_str(s: Option<&str>) -> Self {
        match s.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("healthy") => PlantStatus::Healthy,
            Some("monitoring") => PlantStatus::Monitoring,
            _ => PlantStatus::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlantStatus::Healthy => "Healthy",
            PlantStatus::Monitoring => "Monitoring",
            PlantStatus::Unknown => "Unknown",
        }
    }
}

impl<'de> Deserialize<'de> for PlantStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(PlantStatus::from_str(raw.as_deref()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct PlantItem {
    pub id: i64,
    pub name: String,
    #[serde(default = "unknown_status")]
    pub status: PlantStatus,
    pub ph: Option<f64>,
}

fn unknown_status() -> PlantStatus {
    PlantStatus::Unknown
}

impl PlantItem {
    pub fn ph_display(&self) -> String {
        match self.ph {
            Some(ph) => format!("pH {:.1}", ph),
            None => "pH --".to_string(),
        }
    }

    pub fn ph_in_range(&self) -> bool {
        self.ph.map(|ph| (PH_MIN..=PH_MAX).contains(&ph)).unwrap_or(false)
    }
}

/// Response of `GET /api/items`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct ItemsResponse {
    #[serde(default)]
    pub items: Vec<PlantItem>,
    pub user: Option<String>,
}
