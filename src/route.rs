//! Normalized route model.
//!
//! A route request names an origin and a destination; the backend answers
//! with one or more candidate routes, each split into legs and steps. Steps
//! carry the synthesized banner and voice cues once the instruction pass has
//! run. All types here are plain values: replacing a route replaces the
//! whole snapshot.

use serde::{Deserialize, Serialize};

use crate::maneuver::{ManeuverModifier, ManeuverType};
use crate::nav::Coordinate;

/// Either end of a route request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Location {
    /// The rider's live position at the time of the request.
    CurrentLocation { coordinate: Coordinate },
    /// A place picked from search or recents.
    NamedPlace { coordinate: Coordinate, name: String },
}

impl Location {
    pub fn coordinate(&self) -> Coordinate {
        match self {
            Location::CurrentLocation { coordinate } => *coordinate,
            Location::NamedPlace { coordinate, .. } => *coordinate,
        }
    }

    /// Name to show in the search fields.
    pub fn display_name(&self) -> &str {
        match self {
            Location::CurrentLocation { .. } => "Current Location",
            Location::NamedPlace { name, .. } => name,
        }
    }
}

/// What the rider asked to be routed between.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub origin: Location,
    pub destination: Location,
    /// Direction of travel in degrees, set for reroute requests only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearing: Option<f64>,
}

impl RouteRequest {
    pub fn new(origin: Location, destination: Location) -> Self {
        Self {
            origin,
            destination,
            bearing: None,
        }
    }

    /// A bearing-constrained request from the rider's live position to the
    /// destination of an existing request.
    pub fn reroute_from(position: Coordinate, bearing: f64, destination: Location) -> Self {
        Self {
            origin: Location::CurrentLocation {
                coordinate: position,
            },
            destination,
            bearing: Some(bearing.rem_euclid(360.0)),
        }
    }

    pub fn is_reroute(&self) -> bool {
        self.bearing.is_some()
    }
}

/// Text fragment of a banner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BannerTextComponent {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// The primary or sub line of a banner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BannerComponent {
    pub text: String,
    pub components: Vec<BannerTextComponent>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub maneuver_type: Option<ManeuverType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier: Option<ManeuverModifier>,
}

impl BannerComponent {
    pub fn new(
        text: String,
        maneuver_type: Option<ManeuverType>,
        modifier: Option<ManeuverModifier>,
    ) -> Self {
        Self {
            components: vec![BannerTextComponent {
                text: text.clone(),
                kind: "text".to_string(),
            }],
            text,
            maneuver_type,
            modifier,
        }
    }
}

/// On-screen cue shown once the rider is `distance_along_geometry` meters
/// from the end of the step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerInstruction {
    pub distance_along_geometry: f64,
    pub primary: BannerComponent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<BannerComponent>,
    pub driving_side: String,
}

/// Spoken cue triggered `distance_along_geometry` meters from the end of
/// the step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceInstruction {
    pub distance_along_geometry: f64,
    pub announcement: String,
    pub ssml_announcement: String,
}

/// One maneuver-to-maneuver segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub maneuver_type: Option<ManeuverType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier: Option<ManeuverModifier>,
    pub name: String,
    /// Meters from this step's maneuver to the next one.
    pub distance: f64,
    /// Expected seconds to ride the step.
    pub duration: f64,
    /// Base instruction after informal-path substitution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    #[serde(skip)]
    pub geometry: Vec<Coordinate>,
    pub banner_instructions: Vec<BannerInstruction>,
    pub voice_instructions: Vec<VoiceInstruction>,
}

impl Step {
    pub fn is_arrival(&self) -> bool {
        self.maneuver_type == Some(ManeuverType::Arrive)
    }
}

/// One origin-to-destination segment with no intermediate stop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leg {
    pub steps: Vec<Step>,
    pub distance: f64,
}

/// A candidate route.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub legs: Vec<Leg>,
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub expected_travel_time: f64,
    #[serde(skip)]
    pub geometry: Vec<Coordinate>,
}

impl Route {
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.legs.iter().flat_map(|leg| leg.steps.iter())
    }
}

/// Every route returned for a request, best first.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RouteResponseSet {
    pub routes: Vec<Route>,
}

impl RouteResponseSet {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// The backend found no route between the two points.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn get(&self, index: usize) -> Option<&Route> {
        self.routes.get(index)
    }
}
