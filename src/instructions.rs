//! Instruction synthesis pass.
//!
//! Decodes the routing backend's JSON body, extracts each step with a
//! ladder of optional lookups, and builds fresh typed steps carrying
//! banner and voice cues. A step whose fields are missing or malformed
//! simply ends up without cues; only a body that is not a route response
//! at all fails to decode.

use std::sync::Arc;

use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::banner;
use crate::maneuver::{
    colloquialize, EnglishFormatter, InstructionFormatter, LegContext, ManeuverModifier,
    ManeuverType,
};
use crate::polyline;
use crate::route::{Leg, Route, RouteResponseSet, Step};
use crate::voice::{self, CueStrategy, CueThresholds};

/// Maneuver fields of a raw step.
#[derive(Debug, Clone, PartialEq)]
pub struct RawManeuver {
    pub maneuver_type: ManeuverType,
    pub modifier: Option<ManeuverModifier>,
    pub bearing_after: Option<f64>,
    pub exit: Option<u32>,
}

impl RawManeuver {
    fn from_value(value: &Value) -> Option<Self> {
        let maneuver_type = value.get("type")?.as_str().map(ManeuverType::parse)?;
        Some(Self {
            maneuver_type,
            modifier: value
                .get("modifier")
                .and_then(Value::as_str)
                .and_then(ManeuverModifier::parse),
            bearing_after: value.get("bearing_after").and_then(Value::as_f64),
            exit: value
                .get("exit")
                .and_then(Value::as_u64)
                .and_then(|exit| u32::try_from(exit).ok()),
        })
    }
}

/// A step as the backend sent it, every field optional.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawStep {
    pub distance: Option<f64>,
    pub duration: Option<f64>,
    pub name: Option<String>,
    pub geometry: Option<String>,
    pub maneuver: Option<RawManeuver>,
}

impl RawStep {
    pub fn from_value(value: &Value) -> Self {
        Self {
            distance: value.get("distance").and_then(Value::as_f64),
            duration: value.get("duration").and_then(Value::as_f64),
            name: value.get("name").and_then(Value::as_str).map(str::to_string),
            geometry: value
                .get("geometry")
                .and_then(Value::as_str)
                .map(str::to_string),
            maneuver: value.get("maneuver").and_then(RawManeuver::from_value),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<RawRoute>,
}

#[derive(Debug, Deserialize)]
struct RawRoute {
    #[serde(default)]
    legs: Vec<RawLeg>,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    geometry: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLeg {
    #[serde(default)]
    steps: Vec<Value>,
    #[serde(default)]
    distance: f64,
}

/// Turns raw backend responses into annotated routes.
#[derive(Clone)]
pub struct InstructionSynthesizer {
    formatter: Arc<dyn InstructionFormatter>,
    thresholds: CueThresholds,
}

impl Default for InstructionSynthesizer {
    fn default() -> Self {
        Self::new(Arc::new(EnglishFormatter))
    }
}

impl InstructionSynthesizer {
    pub fn new(formatter: Arc<dyn InstructionFormatter>) -> Self {
        Self {
            formatter,
            thresholds: CueThresholds::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: CueThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Decode a response body and attach cues to every step.
    pub fn decode(&self, body: &[u8]) -> Result<RouteResponseSet, serde_json::Error> {
        let raw: RawResponse = serde_json::from_slice(body)?;

        if raw.routes.is_empty() {
            debug!(
                "backend returned no routes (code={:?}, message={:?})",
                raw.code, raw.message
            );
        }

        let routes = raw
            .routes
            .iter()
            .map(|route| self.annotate_route(route))
            .collect();

        Ok(RouteResponseSet::new(routes))
    }

    /// Decode, annotate and serialize back to JSON.
    pub fn annotate_to_json(&self, body: &[u8]) -> Result<String, serde_json::Error> {
        let routes = self.decode(body)?;
        serde_json::to_string(&routes)
    }

    fn annotate_route(&self, raw: &RawRoute) -> Route {
        let leg_count = raw.legs.len();
        let legs = raw
            .legs
            .iter()
            .enumerate()
            .map(|(index, leg)| {
                self.annotate_leg(
                    leg,
                    LegContext {
                        index,
                        count: leg_count,
                    },
                )
            })
            .collect();

        let geometry = match raw.geometry.as_deref().map(polyline::decode) {
            Some(Some(points)) => points,
            Some(None) => {
                warn!("route geometry is not a valid polyline; dropping it");
                Vec::new()
            }
            None => Vec::new(),
        };

        Route {
            legs,
            distance: raw.distance,
            expected_travel_time: raw.duration,
            geometry,
        }
    }

    fn annotate_leg(&self, raw: &RawLeg, leg: LegContext) -> Leg {
        let raw_steps: Vec<RawStep> = raw.steps.iter().map(RawStep::from_value).collect();
        let mut steps: Vec<Step> = raw_steps
            .iter()
            .enumerate()
            .map(|(index, step)| self.base_step(step, leg, index))
            .collect();

        let cues: Vec<_> = (0..steps.len())
            .map(|i| {
                let current = &steps[i];
                let next = steps.get(i + 1);
                let next_next = steps.get(i + 2);
                let strategy = CueStrategy::for_step(leg.index == 0 && i == 0);
                (
                    banner::synthesize(current, next, next_next),
                    voice::synthesize(strategy, &self.thresholds, current, next, next_next),
                )
            })
            .collect();

        for (step, (banners, voices)) in steps.iter_mut().zip(cues) {
            step.banner_instructions = banners;
            step.voice_instructions = voices;
        }

        Leg {
            steps,
            distance: raw.distance,
        }
    }

    fn base_step(&self, raw: &RawStep, leg: LegContext, index: usize) -> Step {
        if raw.maneuver.is_none() {
            warn!(
                "step {index} of leg {} has no usable maneuver; its instructions are omitted",
                leg.index
            );
        }

        let instruction = self
            .formatter
            .instruction(raw, leg)
            .map(|text| colloquialize(&text));

        Step {
            maneuver_type: raw.maneuver.as_ref().map(|m| m.maneuver_type.clone()),
            modifier: raw.maneuver.as_ref().and_then(|m| m.modifier),
            name: raw.name.clone().unwrap_or_default(),
            distance: raw.distance.unwrap_or(0.0),
            duration: raw.duration.unwrap_or(0.0),
            instruction,
            geometry: raw
                .geometry
                .as_deref()
                .and_then(polyline::decode)
                .unwrap_or_default(),
            banner_instructions: Vec::new(),
            voice_instructions: Vec::new(),
        }
    }
}
