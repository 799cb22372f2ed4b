//! Maneuver vocabulary and base instruction text.
//!
//! Types the backend's `maneuver.type`/`maneuver.modifier` strings, defines
//! the [`InstructionFormatter`] seam that turns a step into a sentence such
//! as "Turn right onto Main St", and rewrites formal way names into the
//! colloquial phrasing riders expect ("on the sidewalk", "in the alley").

use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::instructions::RawStep;

/// Fixed phrasing for a reached destination.
pub const ARRIVED: &str = "You have arrived";
/// Fixed phrasing for an upcoming destination.
pub const WILL_ARRIVE: &str = "You will arrive";

/// Maneuver categories reported by the routing backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManeuverType {
    Depart,
    Arrive,
    Turn,
    NewName,
    Continue,
    Merge,
    OnRamp,
    OffRamp,
    Fork,
    EndOfRoad,
    Roundabout,
    Rotary,
    RoundaboutTurn,
    ExitRoundabout,
    ExitRotary,
    Notification,
    UseLane,
    Other(String),
}

impl ManeuverType {
    pub fn parse(value: &str) -> Self {
        match value {
            "depart" => ManeuverType::Depart,
            "arrive" => ManeuverType::Arrive,
            "turn" => ManeuverType::Turn,
            "new name" => ManeuverType::NewName,
            "continue" => ManeuverType::Continue,
            "merge" => ManeuverType::Merge,
            "on ramp" => ManeuverType::OnRamp,
            "off ramp" => ManeuverType::OffRamp,
            "fork" => ManeuverType::Fork,
            "end of road" => ManeuverType::EndOfRoad,
            "roundabout" => ManeuverType::Roundabout,
            "rotary" => ManeuverType::Rotary,
            "roundabout turn" => ManeuverType::RoundaboutTurn,
            "exit roundabout" => ManeuverType::ExitRoundabout,
            "exit rotary" => ManeuverType::ExitRotary,
            "notification" => ManeuverType::Notification,
            "use lane" => ManeuverType::UseLane,
            other => ManeuverType::Other(other.to_string()),
        }
    }

    /// The backend's wire spelling.
    pub fn as_str(&self) -> &str {
        match self {
            ManeuverType::Depart => "depart",
            ManeuverType::Arrive => "arrive",
            ManeuverType::Turn => "turn",
            ManeuverType::NewName => "new name",
            ManeuverType::Continue => "continue",
            ManeuverType::Merge => "merge",
            ManeuverType::OnRamp => "on ramp",
            ManeuverType::OffRamp => "off ramp",
            ManeuverType::Fork => "fork",
            ManeuverType::EndOfRoad => "end of road",
            ManeuverType::Roundabout => "roundabout",
            ManeuverType::Rotary => "rotary",
            ManeuverType::RoundaboutTurn => "roundabout turn",
            ManeuverType::ExitRoundabout => "exit roundabout",
            ManeuverType::ExitRotary => "exit rotary",
            ManeuverType::Notification => "notification",
            ManeuverType::UseLane => "use lane",
            ManeuverType::Other(other) => other,
        }
    }
}

impl Serialize for ManeuverType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Direction qualifier of a maneuver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManeuverModifier {
    Uturn,
    SharpRight,
    Right,
    SlightRight,
    Straight,
    SlightLeft,
    Left,
    SharpLeft,
}

impl ManeuverModifier {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "uturn" => Some(ManeuverModifier::Uturn),
            "sharp right" => Some(ManeuverModifier::SharpRight),
            "right" => Some(ManeuverModifier::Right),
            "slight right" => Some(ManeuverModifier::SlightRight),
            "straight" => Some(ManeuverModifier::Straight),
            "slight left" => Some(ManeuverModifier::SlightLeft),
            "left" => Some(ManeuverModifier::Left),
            "sharp left" => Some(ManeuverModifier::SharpLeft),
            _ => None,
        }
    }

    /// The backend's wire spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            ManeuverModifier::Uturn => "uturn",
            ManeuverModifier::SharpRight => "sharp right",
            ManeuverModifier::Right => "right",
            ManeuverModifier::SlightRight => "slight right",
            ManeuverModifier::Straight => "straight",
            ManeuverModifier::SlightLeft => "slight left",
            ManeuverModifier::Left => "left",
            ManeuverModifier::SharpLeft => "sharp left",
        }
    }

    fn spoken(self) -> &'static str {
        match self {
            ManeuverModifier::Uturn => "U-turn",
            other => other.as_str(),
        }
    }

    /// Left/right without the slight/sharp qualifier.
    fn side(self) -> &'static str {
        match self {
            ManeuverModifier::SharpRight
            | ManeuverModifier::Right
            | ManeuverModifier::SlightRight => "right",
            ManeuverModifier::SharpLeft | ManeuverModifier::Left | ManeuverModifier::SlightLeft => {
                "left"
            }
            ManeuverModifier::Uturn | ManeuverModifier::Straight => "straight",
        }
    }
}

impl Serialize for ManeuverModifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Which leg of a multi-leg trip a step belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegContext {
    pub index: usize,
    pub count: usize,
}

impl LegContext {
    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.count
    }
}

/// Produces the base sentence for a step.
///
/// The synthesizer treats the output as opaque text; it only applies the
/// informal-path substitutions before assembling banner and voice cues.
pub trait InstructionFormatter: Send + Sync {
    fn instruction(&self, step: &RawStep, leg: LegContext) -> Option<String>;
}

/// English phrasing for the backend's maneuver types.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishFormatter;

impl InstructionFormatter for EnglishFormatter {
    fn instruction(&self, step: &RawStep, leg: LegContext) -> Option<String> {
        let maneuver = step.maneuver.as_ref()?;
        let name = step.name.as_deref().filter(|n| !n.trim().is_empty());
        let modifier = maneuver.modifier;

        let text = match &maneuver.maneuver_type {
            ManeuverType::Depart => {
                let heading = maneuver
                    .bearing_after
                    .map(compass_direction)
                    .unwrap_or("out");
                with_name(format!("Head {heading}"), " on ", name)
            }
            ManeuverType::Arrive => {
                if leg.is_last() {
                    format!("{ARRIVED} at your destination")
                } else {
                    format!("{ARRIVED} at your {} destination", ordinal(leg.index + 1))
                }
            }
            ManeuverType::Turn => match modifier {
                Some(ManeuverModifier::Uturn) => with_name("Make a U-turn".into(), " onto ", name),
                Some(ManeuverModifier::Straight) => with_name("Go straight".into(), " onto ", name),
                Some(m) => with_name(format!("Turn {}", m.spoken()), " onto ", name),
                None => with_name("Turn".into(), " onto ", name),
            },
            ManeuverType::Continue | ManeuverType::NewName => match (modifier, name) {
                (Some(ManeuverModifier::Uturn), _) => {
                    with_name("Make a U-turn".into(), " onto ", name)
                }
                (_, Some(n)) if maneuver.maneuver_type == ManeuverType::NewName => {
                    format!("Continue onto {n}")
                }
                (Some(ManeuverModifier::Straight) | None, Some(n)) => format!("Continue onto {n}"),
                (Some(ManeuverModifier::Straight) | None, None) => "Continue straight".into(),
                (Some(m), _) => with_name(format!("Continue {}", m.spoken()), " onto ", name),
            },
            ManeuverType::EndOfRoad => match name {
                Some(n) => format!("Turn {} onto {n}", side_or_straight(modifier)),
                None => format!("Turn {} at the end of the road", side_or_straight(modifier)),
            },
            ManeuverType::Fork => match name {
                Some(n) => format!("Keep {} onto {n}", side_or_straight(modifier)),
                None => format!("Keep {} at the fork", side_or_straight(modifier)),
            },
            ManeuverType::Merge => match modifier {
                Some(m) => with_name(format!("Merge {}", m.side()), " onto ", name),
                None => with_name("Merge".into(), " onto ", name),
            },
            ManeuverType::OnRamp => match (modifier, name) {
                (_, Some(n)) => format!("Take the ramp onto {n}"),
                (Some(m), None) => format!("Take the ramp on the {}", m.side()),
                (None, None) => "Take the ramp".into(),
            },
            ManeuverType::OffRamp => with_name("Take the exit".into(), " onto ", name),
            ManeuverType::Roundabout | ManeuverType::Rotary => {
                let kind = if maneuver.maneuver_type == ManeuverType::Rotary {
                    "rotary"
                } else {
                    "roundabout"
                };
                match (maneuver.exit, name) {
                    (Some(exit), Some(n)) => format!(
                        "Enter the {kind} and take the {} exit onto {n}",
                        ordinal(exit as usize)
                    ),
                    (Some(exit), None) => {
                        format!("Enter the {kind} and take the {} exit", ordinal(exit as usize))
                    }
                    (None, Some(n)) => format!("Enter the {kind} and exit onto {n}"),
                    (None, None) => format!("Enter the {kind}"),
                }
            }
            ManeuverType::RoundaboutTurn => with_name(
                format!("At the roundabout, turn {}", side_or_straight(modifier)),
                " onto ",
                name,
            ),
            ManeuverType::ExitRoundabout => with_name("Exit the roundabout".into(), " onto ", name),
            ManeuverType::ExitRotary => with_name("Exit the rotary".into(), " onto ", name),
            ManeuverType::Notification | ManeuverType::UseLane | ManeuverType::Other(_) => {
                with_name("Continue".into(), " onto ", name)
            }
        };

        Some(text)
    }
}

fn with_name(base: String, joiner: &str, name: Option<&str>) -> String {
    match name {
        Some(n) => format!("{base}{joiner}{n}"),
        None => base,
    }
}

fn side_or_straight(modifier: Option<ManeuverModifier>) -> &'static str {
    modifier.map(ManeuverModifier::side).unwrap_or("straight")
}

/// Eight-point compass name for a bearing in degrees.
pub fn compass_direction(bearing: f64) -> &'static str {
    const NAMES: [&str; 8] = [
        "north",
        "northeast",
        "east",
        "southeast",
        "south",
        "southwest",
        "west",
        "northwest",
    ];
    let normalized = bearing.rem_euclid(360.0);
    let index = ((normalized + 22.5) / 45.0) as usize % 8;
    NAMES[index]
}

fn ordinal(n: usize) -> String {
    match n {
        1 => "first".into(),
        2 => "second".into(),
        3 => "third".into(),
        4 => "fourth".into(),
        5 => "fifth".into(),
        6 => "sixth".into(),
        7 => "seventh".into(),
        8 => "eighth".into(),
        9 => "ninth".into(),
        10 => "tenth".into(),
        n => {
            let suffix = match (n % 10, n % 100) {
                (_, 11..=13) => "th",
                (1, _) => "st",
                (2, _) => "nd",
                (3, _) => "rd",
                _ => "th",
            };
            format!("{n}{suffix}")
        }
    }
}

/// Formal way phrases and their colloquial replacements.
static INFORMAL_PATHS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)\bonto sidewalk\b", "on the sidewalk"),
        (r"(?i)\bonto alley\b", "in the alley"),
        (r"(?i)\bonto cycleway\b", "onto the bike path"),
        (r"(?i)\bonto footway\b", "onto the footpath"),
        (r"(?i)\bonto crossing\b", "across the crosswalk"),
        (r"(?i)\bonto path\b", "onto the path"),
        (r"(?i)\bonto driveway\b", "onto the driveway"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (Regex::new(pattern).expect("Invalid informal path regex"), replacement)
    })
    .collect()
});

/// Rewrite formal way names in a base instruction into colloquial phrasing.
pub fn colloquialize(instruction: &str) -> String {
    INFORMAL_PATHS
        .iter()
        .fold(instruction.to_string(), |text, (pattern, replacement)| {
            pattern.replace_all(&text, *replacement).into_owned()
        })
}

/// Uppercase the first character.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lowercase the first character, for embedding a sentence mid-phrase.
pub fn decapitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::RawManeuver;

    fn step(kind: &str, modifier: Option<&str>, name: &str) -> RawStep {
        RawStep {
            distance: Some(100.0),
            duration: None,
            name: Some(name.to_string()),
            geometry: None,
            maneuver: Some(RawManeuver {
                maneuver_type: ManeuverType::parse(kind),
                modifier: modifier.and_then(ManeuverModifier::parse),
                bearing_after: Some(92.0),
                exit: None,
            }),
        }
    }

    fn format(step: &RawStep) -> String {
        EnglishFormatter
            .instruction(step, LegContext { index: 0, count: 1 })
            .unwrap()
    }

    #[test]
    fn parse_round_trips_wire_names() {
        for name in ["depart", "new name", "end of road", "roundabout turn", "use lane"] {
            assert_eq!(ManeuverType::parse(name).as_str(), name);
        }
        assert_eq!(ManeuverType::parse("ferry"), ManeuverType::Other("ferry".into()));
        assert_eq!(ManeuverModifier::parse("slight left"), Some(ManeuverModifier::SlightLeft));
        assert_eq!(ManeuverModifier::parse("sideways"), None);
    }

    #[test]
    fn english_turns() {
        assert_eq!(format(&step("turn", Some("right"), "Main St")), "Turn right onto Main St");
        assert_eq!(format(&step("turn", Some("uturn"), "")), "Make a U-turn");
        assert_eq!(format(&step("turn", Some("straight"), "Oak Ave")), "Go straight onto Oak Ave");
        assert_eq!(format(&step("fork", Some("slight left"), "")), "Keep left at the fork");
        assert_eq!(
            format(&step("end of road", Some("left"), "")),
            "Turn left at the end of the road"
        );
    }

    #[test]
    fn english_depart_uses_compass_heading() {
        assert_eq!(format(&step("depart", None, "Valencia St")), "Head east on Valencia St");
        assert_eq!(compass_direction(350.0), "north");
        assert_eq!(compass_direction(-90.0), "west");
        assert_eq!(compass_direction(225.0), "southwest");
    }

    #[test]
    fn english_arrival_names_waypoint_on_intermediate_legs() {
        let arrive = step("arrive", None, "");
        assert_eq!(
            EnglishFormatter.instruction(&arrive, LegContext { index: 0, count: 2 }).unwrap(),
            "You have arrived at your first destination"
        );
        assert_eq!(
            EnglishFormatter.instruction(&arrive, LegContext { index: 1, count: 2 }).unwrap(),
            "You have arrived at your destination"
        );
    }

    #[test]
    fn english_roundabout_exit() {
        let mut s = step("roundabout", None, "Market St");
        if let Some(m) = s.maneuver.as_mut() {
            m.exit = Some(2);
        }
        assert_eq!(format(&s), "Enter the roundabout and take the second exit onto Market St");
    }

    #[test]
    fn missing_maneuver_yields_no_text() {
        let mut s = step("turn", Some("left"), "Main St");
        s.maneuver = None;
        assert!(EnglishFormatter.instruction(&s, LegContext { index: 0, count: 1 }).is_none());
    }

    #[test]
    fn colloquial_substitutions() {
        assert_eq!(colloquialize("Turn right onto sidewalk"), "Turn right on the sidewalk");
        assert_eq!(colloquialize("Turn left onto Alley"), "Turn left in the alley");
        assert_eq!(colloquialize("Continue onto cycleway"), "Continue onto the bike path");
        // Word boundary: longer names are left alone
        assert_eq!(colloquialize("Turn right onto Sidewalkway"), "Turn right onto Sidewalkway");
        assert_eq!(colloquialize("Turn right onto Pathfinder Rd"), "Turn right onto Pathfinder Rd");
    }

    #[test]
    fn ordinal_words_and_suffixes() {
        assert_eq!(ordinal(3), "third");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(22), "22nd");
    }

    #[test]
    fn capitalization_helpers() {
        assert_eq!(capitalize("market st"), "Market st");
        assert_eq!(decapitalize("Turn right"), "turn right");
        assert_eq!(capitalize(""), "");
    }
}
