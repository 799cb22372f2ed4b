//! Voice (spoken) instruction synthesis.
//!
//! A step's cues announce the maneuver at the end of that step. The first
//! step of a trip uses [`CueStrategy::DepartStep`], which opens with the
//! departure sentence; every later step uses [`CueStrategy::StandardStep`].
//! Both emit up to two advance cues followed by one primary cue near the
//! maneuver.

use crate::distance::phrase_for_meters;
use crate::maneuver::{decapitalize, ARRIVED, WILL_ARRIVE};
use crate::route::{Step, VoiceInstruction};

/// Distance thresholds that place the cues of one strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CueThresholds {
    /// Steps longer than this get a "continue for" cue and a fixed advance cue.
    pub long_step_m: f64,
    /// Steps longer than this get one advance cue.
    pub advance_m: f64,
    /// A following step shorter than this is chained into the primary cue.
    pub short_step_m: f64,
    /// How far past the maneuver the first cue of a step is spoken.
    pub speaking_lead_m: f64,
    /// Trigger point of the advance cue on long steps.
    pub long_step_advance_m: f64,
}

impl Default for CueThresholds {
    fn default() -> Self {
        Self {
            long_step_m: 500.0,
            advance_m: 150.0,
            short_step_m: 100.0,
            speaking_lead_m: 20.0,
            long_step_advance_m: 283.0,
        }
    }
}

/// Departures at most this long are spoken as a single chained cue.
pub const SHORT_DEPARTURE_M: f64 = 70.0;
/// Minimum spacing between the departure cue and the advance cue.
pub const MIN_DEPARTURE_GAP_M: f64 = 60.0;
/// Latest trigger point of the primary cue.
pub const PRIMARY_CUE_M: f64 = 50.0;
/// Latest trigger point of the primary cue before an arrival.
pub const ARRIVAL_PRIMARY_CUE_M: f64 = 5.0;

/// How the cues of a step are placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CueStrategy {
    DepartStep,
    StandardStep,
}

impl CueStrategy {
    pub fn for_step(is_first_step_of_trip: bool) -> Self {
        if is_first_step_of_trip {
            CueStrategy::DepartStep
        } else {
            CueStrategy::StandardStep
        }
    }
}

/// Build the spoken cues for riding `current` towards the maneuver of `next`.
pub fn synthesize(
    strategy: CueStrategy,
    thresholds: &CueThresholds,
    current: &Step,
    next: Option<&Step>,
    next_next: Option<&Step>,
) -> Vec<VoiceInstruction> {
    let Some(next) = next else {
        return Vec::new();
    };
    if current.distance <= 0.0 {
        return Vec::new();
    }
    let Some(primary) = primary_text(thresholds, next, next_next) else {
        return Vec::new();
    };

    let primary_at = if next.is_arrival() {
        current.distance.min(ARRIVAL_PRIMARY_CUE_M)
    } else {
        current.distance.min(PRIMARY_CUE_M)
    };

    let mut cues = match (strategy, current.instruction.as_deref()) {
        (CueStrategy::DepartStep, Some(depart)) => {
            if current.distance <= SHORT_DEPARTURE_M {
                // Too short to separate the departure from the first maneuver
                return vec![cue(
                    primary_at,
                    format!("{depart}, then {}", decapitalize(&primary)),
                )];
            }
            departure_cues(thresholds, current, depart, next)
        }
        _ => standard_cues(thresholds, current, next),
    };

    cues.push(cue(primary_at, primary));
    cues
}

fn standard_cues(thresholds: &CueThresholds, current: &Step, next: &Step) -> Vec<VoiceInstruction> {
    let distance = current.distance;
    let mut cues = Vec::with_capacity(3);

    if distance > thresholds.long_step_m {
        let at = distance - thresholds.speaking_lead_m;
        cues.push(cue(at, continue_text(current, at)));
        cues.extend(advance(next, thresholds.long_step_advance_m));
    } else if distance > thresholds.advance_m {
        cues.extend(advance(next, distance - thresholds.speaking_lead_m));
    }

    cues
}

fn departure_cues(
    thresholds: &CueThresholds,
    current: &Step,
    depart: &str,
    next: &Step,
) -> Vec<VoiceInstruction> {
    let distance = current.distance;
    let mut cues = Vec::with_capacity(3);

    if distance > thresholds.long_step_m {
        cues.push(cue(
            distance,
            format!("{depart} for {}", phrase_for_meters(distance)),
        ));
        cues.extend(advance(next, thresholds.long_step_advance_m));
    } else {
        cues.push(cue(distance, depart.to_string()));
        if distance - thresholds.advance_m >= MIN_DEPARTURE_GAP_M {
            cues.extend(advance(next, thresholds.advance_m));
        }
    }

    cues
}

/// "In <distance>, <maneuver>" spoken `at` meters before the maneuver.
fn advance(next: &Step, at: f64) -> Option<VoiceInstruction> {
    let text = spoken(next, true)?;
    Some(cue(
        at,
        format!("In {}, {}", phrase_for_meters(at), decapitalize(&text)),
    ))
}

fn continue_text(current: &Step, remaining: f64) -> String {
    let name = current.name.trim();
    if name.is_empty() {
        format!("Continue for {}", phrase_for_meters(remaining))
    } else {
        format!("Continue on {name} for {}", phrase_for_meters(remaining))
    }
}

/// The maneuver sentence, chained with the one after it when the rider
/// will barely have time between the two.
fn primary_text(
    thresholds: &CueThresholds,
    next: &Step,
    next_next: Option<&Step>,
) -> Option<String> {
    let text = spoken(next, false)?;

    let chained = next_next
        .filter(|_| !next.is_arrival() && next.distance < thresholds.short_step_m)
        .and_then(|after| spoken(after, true));

    Some(match chained {
        Some(then) => format!("{text}, then {}", decapitalize(&then)),
        None => text,
    })
}

fn spoken(step: &Step, future: bool) -> Option<String> {
    if step.is_arrival() {
        let text = if future { WILL_ARRIVE } else { ARRIVED };
        return Some(text.to_string());
    }
    step.instruction.clone()
}

fn cue(distance_along_geometry: f64, announcement: String) -> VoiceInstruction {
    VoiceInstruction {
        distance_along_geometry,
        ssml_announcement: ssml(&announcement),
        announcement,
    }
}

/// Wrap plain text for the speech synthesizer.
pub fn ssml(text: &str) -> String {
    let escaped = text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;");
    format!("<speak>{escaped}</speak>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maneuver::ManeuverType;

    fn step(kind: &str, distance: f64, name: &str, instruction: &str) -> Step {
        Step {
            maneuver_type: Some(ManeuverType::parse(kind)),
            modifier: None,
            name: name.to_string(),
            distance,
            duration: distance / 4.0,
            instruction: Some(instruction.to_string()),
            geometry: Vec::new(),
            banner_instructions: Vec::new(),
            voice_instructions: Vec::new(),
        }
    }

    fn turn_17th(distance: f64) -> Step {
        step("turn", distance, "17th St", "Turn right onto 17th St")
    }

    fn standard(
        current: &Step,
        next: Option<&Step>,
        next_next: Option<&Step>,
    ) -> Vec<VoiceInstruction> {
        synthesize(CueStrategy::StandardStep, &CueThresholds::default(), current, next, next_next)
    }

    fn depart(current: &Step, next: Option<&Step>) -> Vec<VoiceInstruction> {
        synthesize(CueStrategy::DepartStep, &CueThresholds::default(), current, next, None)
    }

    fn valencia(distance: f64) -> Step {
        step("depart", distance, "Valencia St", "Head south on Valencia St")
    }

    #[test]
    fn long_standard_step_gets_continue_advance_and_primary() {
        let current = step("turn", 600.0, "Valencia St", "Turn left onto Valencia St");
        let next = turn_17th(300.0);

        let cues = standard(&current, Some(&next), None);

        assert_eq!(cues.len(), 3);
        assert_eq!(cues[0].distance_along_geometry, 580.0);
        assert_eq!(cues[0].announcement, "Continue on Valencia St for a quarter mile");
        assert_eq!(cues[1].distance_along_geometry, 283.0);
        assert_eq!(cues[1].announcement, "In 1000 feet, turn right onto 17th St");
        assert_eq!(cues[2].distance_along_geometry, 50.0);
        assert_eq!(cues[2].announcement, "Turn right onto 17th St");
    }

    #[test]
    fn medium_standard_step_gets_one_advance() {
        let current = step("turn", 200.0, "Valencia St", "Turn left onto Valencia St");
        let next = turn_17th(300.0);

        let cues = standard(&current, Some(&next), None);

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].distance_along_geometry, 180.0);
        assert_eq!(cues[0].announcement, "In 600 feet, turn right onto 17th St");
        assert_eq!(cues[1].distance_along_geometry, 50.0);
    }

    #[test]
    fn short_standard_step_gets_only_primary() {
        let current = step("turn", 120.0, "", "Turn left");
        let next = turn_17th(300.0);
        let cues = standard(&current, Some(&next), None);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].distance_along_geometry, 50.0);

        let tiny = step("turn", 30.0, "", "Turn left");
        let cues = standard(&tiny, Some(&next), None);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].distance_along_geometry, 30.0);
    }

    #[test]
    fn unnamed_long_step_continues_without_name() {
        let current = step("turn", 700.0, "", "Turn left");
        let next = turn_17th(300.0);
        let cues = standard(&current, Some(&next), None);
        assert!(cues[0].announcement.starts_with("Continue for "));
    }

    #[test]
    fn primary_chains_short_following_step() {
        let current = step("turn", 120.0, "", "Turn left");
        let next = turn_17th(60.0);
        let after = step("turn", 400.0, "Guerrero St", "Turn left onto Guerrero St");

        let cues = standard(&current, Some(&next), Some(&after));
        assert_eq!(
            cues.last().unwrap().announcement,
            "Turn right onto 17th St, then turn left onto Guerrero St"
        );

        let long_next = turn_17th(400.0);
        let cues = standard(&current, Some(&long_next), Some(&after));
        assert_eq!(cues.last().unwrap().announcement, "Turn right onto 17th St");
    }

    #[test]
    fn arrival_primary_is_close_to_destination() {
        let current = step("turn", 300.0, "Valencia St", "Turn left onto Valencia St");
        let arrive = step("arrive", 0.0, "", "You have arrived at your destination");

        let cues = standard(&current, Some(&arrive), None);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].announcement, "In 1000 feet, you will arrive");
        assert_eq!(cues[1].distance_along_geometry, 5.0);
        assert_eq!(cues[1].announcement, ARRIVED);
    }

    #[test]
    fn short_departure_is_one_chained_cue() {
        let current = valencia(50.0);
        let next = turn_17th(300.0);

        let cues = depart(&current, Some(&next));
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].distance_along_geometry, 50.0);
        assert_eq!(
            cues[0].announcement,
            "Head south on Valencia St, then turn right onto 17th St"
        );
    }

    #[test]
    fn short_departure_cue_sits_at_primary_distance() {
        let cues = depart(&valencia(65.0), Some(&turn_17th(300.0)));
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].distance_along_geometry, 50.0);
        assert!(cues[0].announcement.starts_with("Head south on Valencia St, then"));
    }

    #[test]
    fn long_departure_names_distance() {
        let current = valencia(800.0);
        let next = turn_17th(300.0);

        let cues = depart(&current, Some(&next));
        assert_eq!(cues.len(), 3);
        assert_eq!(cues[0].distance_along_geometry, 800.0);
        assert_eq!(cues[0].announcement, "Head south on Valencia St for a half mile");
        assert_eq!(cues[1].distance_along_geometry, 283.0);
        assert_eq!(cues[2].distance_along_geometry, 50.0);
    }

    #[test]
    fn departure_advance_respects_minimum_gap() {
        let next = turn_17th(300.0);

        let cues = depart(&valencia(180.0), Some(&next));
        assert_eq!(cues.len(), 2, "180 m leaves no room for an advance cue");

        let cues = depart(&valencia(300.0), Some(&next));
        assert_eq!(cues.len(), 3);
        assert_eq!(cues[1].distance_along_geometry, 150.0);
        assert_eq!(cues[1].announcement, "In 500 feet, turn right onto 17th St");
    }

    #[test]
    fn cues_are_ordered_towards_the_maneuver() {
        let next = turn_17th(300.0);
        for distance in [40.0, 90.0, 160.0, 260.0, 480.0, 520.0, 2000.0] {
            for strategy in [CueStrategy::DepartStep, CueStrategy::StandardStep] {
                let current = valencia(distance);
                let cues =
                    synthesize(strategy, &CueThresholds::default(), &current, Some(&next), None);
                assert!(!cues.is_empty());
                for pair in cues.windows(2) {
                    assert!(
                        pair[0].distance_along_geometry > pair[1].distance_along_geometry,
                        "{strategy:?} at {distance} m: {:?}",
                        cues
                    );
                }
            }
        }
    }

    #[test]
    fn no_cues_without_next_step() {
        assert!(standard(&valencia(300.0), None, None).is_empty());
    }

    #[test]
    fn ssml_wraps_and_escapes() {
        assert_eq!(ssml("Turn onto A & B"), "<speak>Turn onto A &amp; B</speak>");
        let cues = standard(&valencia(30.0), Some(&turn_17th(300.0)), None);
        assert_eq!(cues[0].ssml_announcement, "<speak>Turn right onto 17th St</speak>");
    }
}
