//! Scale-bar hierarchy payload.
//!
//! The host serializes each bar and each point-pair distance as positional
//! tuples keyed `tuple_element0..N`; the field renames below pin that wire
//! layout.
use serde::Deserialize;

use crate::error::LinkError;

/// One measured point-pair distance on a bar.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScaleDistance {
    #[serde(rename = "tuple_element0")]
    pub from: String,
    #[serde(rename = "tuple_element1")]
    pub to: String,
    #[serde(rename = "tuple_element2")]
    pub is_active: bool,
    #[serde(rename = "tuple_element3")]
    pub is_rejected: bool,
    #[serde(rename = "tuple_element4")]
    pub distance: f64,
    /// Measured minus nominal.
    #[serde(rename = "tuple_element5")]
    pub difference: f64,
}

/// A named scale bar and its distances.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScaleBar {
    #[serde(rename = "tuple_element0")]
    pub name: String,
    #[serde(rename = "tuple_element1")]
    pub is_active: bool,
    #[serde(rename = "tuple_element2")]
    pub units: String,
    #[serde(rename = "tuple_element3")]
    pub distances: Vec<ScaleDistance>,
}

/// Every scale bar in the project.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScaleBars {
    pub scalebars: Vec<ScaleBar>,
}

impl ScaleBars {
    /// Decode a `{"scalebars": [...]}` payload.
    pub fn from_payload(json: &str) -> Result<Self, LinkError> {
        let bars: ScaleBars = serde_json::from_str(json)?;
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "scalebars": [
            {
                "tuple_element0": "Bar A",
                "tuple_element1": true,
                "tuple_element2": "mm",
                "tuple_element3": [
                    {
                        "tuple_element0": "CODE1",
                        "tuple_element1": "CODE2",
                        "tuple_element2": true,
                        "tuple_element3": false,
                        "tuple_element4": 750.012,
                        "tuple_element5": 0.012
                    }
                ]
            },
            {
                "tuple_element0": "Bar B",
                "tuple_element1": false,
                "tuple_element2": "mm",
                "tuple_element3": []
            }
        ]
    }"#;

    #[test]
    fn decodes_bars_and_distances() {
        let bars = ScaleBars::from_payload(SAMPLE).unwrap();
        assert_eq!(bars.scalebars.len(), 2);

        let bar = &bars.scalebars[0];
        assert_eq!(bar.name, "Bar A");
        assert!(bar.is_active);
        assert_eq!(bar.distances.len(), 1);

        let dist = &bar.distances[0];
        assert_eq!(dist.from, "CODE1");
        assert_eq!(dist.to, "CODE2");
        assert!(!dist.is_rejected);
        assert_eq!(dist.difference, 0.012);
    }

    #[test]
    fn decodes_empty_list() {
        let bars = ScaleBars::from_payload(r#"{"scalebars": []}"#).unwrap();
        assert!(bars.scalebars.is_empty());
    }
}
