//! Banner (on-screen) instruction synthesis.
//!
//! Each step gets zero to two banners describing the upcoming maneuver,
//! optionally with a sub line for the maneuver after it when the two are
//! close together.

use crate::maneuver::{capitalize, ARRIVED, WILL_ARRIVE};
use crate::route::{BannerComponent, BannerInstruction, Step};

/// Steps longer than this get a second, closer banner.
pub const TWO_INSTRUCTION_THRESHOLD_M: f64 = 45.0;
/// A next step shorter than this is previewed in a sub line.
pub const LOOK_AHEAD_THRESHOLD_M: f64 = 100.0;
/// Trigger point of the second banner on long steps.
pub const SECOND_BANNER_M: f64 = 45.0;
/// Trigger point of the final banner before an arrival.
pub const ARRIVAL_BANNER_M: f64 = 5.0;

const DRIVING_SIDE: &str = "right";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Tense {
    Present,
    Future,
}

/// Build the banners shown while riding `current`.
///
/// `next` is the maneuver the banners announce; `next_next` feeds the
/// optional sub line.
pub fn synthesize(
    current: &Step,
    next: Option<&Step>,
    next_next: Option<&Step>,
) -> Vec<BannerInstruction> {
    let Some(next) = next else {
        return Vec::new();
    };
    if current.distance <= 0.0 {
        return Vec::new();
    }

    let use_two_instructions = current.distance > TWO_INSTRUCTION_THRESHOLD_M;
    let use_look_ahead = next.distance < LOOK_AHEAD_THRESHOLD_M;
    let sub = || next_next.and_then(|s| component(s, Tense::Future));

    let mut banners = Vec::with_capacity(2);

    if next.is_arrival() {
        if use_two_instructions {
            banners.extend(banner(current.distance, component(next, Tense::Future), None));
        }
        banners.extend(banner(ARRIVAL_BANNER_M, component(next, Tense::Present), sub()));
    } else if use_two_instructions {
        banners.extend(banner(current.distance, component(next, Tense::Present), None));
        if use_look_ahead {
            banners.extend(banner(SECOND_BANNER_M, component(next, Tense::Present), sub()));
        }
    } else if use_look_ahead {
        banners.extend(banner(current.distance, component(next, Tense::Present), sub()));
    } else {
        banners.extend(banner(current.distance, component(next, Tense::Present), None));
    }

    banners
}

fn banner(
    distance_along_geometry: f64,
    primary: Option<BannerComponent>,
    sub: Option<BannerComponent>,
) -> Option<BannerInstruction> {
    Some(BannerInstruction {
        distance_along_geometry,
        primary: primary?,
        sub,
        driving_side: DRIVING_SIDE.to_string(),
    })
}

/// Banner line for a step: its name when it has one, otherwise its
/// phrased instruction. None when the step carries neither.
fn component(step: &Step, tense: Tense) -> Option<BannerComponent> {
    let text = if step.is_arrival() {
        match tense {
            Tense::Present => ARRIVED.to_string(),
            Tense::Future => WILL_ARRIVE.to_string(),
        }
    } else if !step.name.trim().is_empty() {
        capitalize(step.name.trim())
    } else {
        step.instruction.clone()?
    };

    Some(BannerComponent::new(
        text,
        step.maneuver_type.clone(),
        step.modifier,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maneuver::{ManeuverModifier, ManeuverType};

    fn step(kind: &str, distance: f64, name: &str) -> Step {
        Step {
            maneuver_type: Some(ManeuverType::parse(kind)),
            modifier: Some(ManeuverModifier::Right),
            name: name.to_string(),
            distance,
            duration: distance / 4.0,
            instruction: Some(format!("Turn right onto {name}")),
            geometry: Vec::new(),
            banner_instructions: Vec::new(),
            voice_instructions: Vec::new(),
        }
    }

    #[test]
    fn long_step_with_short_next_emits_two_banners() {
        let current = step("depart", 600.0, "valencia st");
        let next = step("turn", 80.0, "17th St");
        let next_next = step("turn", 300.0, "Guerrero St");

        let banners = synthesize(&current, Some(&next), Some(&next_next));

        assert_eq!(banners.len(), 2);
        assert_eq!(banners[0].distance_along_geometry, 600.0);
        assert!(banners[0].sub.is_none());
        assert_eq!(banners[1].distance_along_geometry, 45.0);
        let sub = banners[1].sub.as_ref().unwrap();
        assert_eq!(sub.text, "Guerrero St");
        assert_eq!(banners[1].primary.text, "17th St");
    }

    #[test]
    fn long_step_with_long_next_emits_one_banner() {
        let current = step("turn", 600.0, "A St");
        let next = step("turn", 400.0, "B St");
        let next_next = step("turn", 300.0, "C St");

        let banners = synthesize(&current, Some(&next), Some(&next_next));
        assert_eq!(banners.len(), 1);
        assert_eq!(banners[0].distance_along_geometry, 600.0);
        assert!(banners[0].sub.is_none());
    }

    #[test]
    fn arrival_after_long_step() {
        let current = step("turn", 200.0, "Mission St");
        let arrive = step("arrive", 0.0, "Mission St");

        let banners = synthesize(&current, Some(&arrive), None);

        assert_eq!(banners.len(), 2);
        assert_eq!(banners[0].distance_along_geometry, 200.0);
        assert_eq!(banners[0].primary.text, WILL_ARRIVE);
        assert_eq!(banners[1].distance_along_geometry, 5.0);
        assert_eq!(banners[1].primary.text, ARRIVED);
        assert_eq!(banners[1].primary.maneuver_type, Some(ManeuverType::Arrive));
    }

    #[test]
    fn arrival_after_short_step_keeps_only_final_banner() {
        let current = step("turn", 30.0, "Mission St");
        let arrive = step("arrive", 0.0, "");

        let banners = synthesize(&current, Some(&arrive), None);
        assert_eq!(banners.len(), 1);
        assert_eq!(banners[0].distance_along_geometry, 5.0);
    }

    #[test]
    fn short_step_combines_when_next_is_short() {
        let current = step("turn", 30.0, "A St");
        let next = step("turn", 60.0, "B St");
        let next_next = step("turn", 500.0, "C St");

        let banners = synthesize(&current, Some(&next), Some(&next_next));
        assert_eq!(banners.len(), 1);
        assert_eq!(banners[0].distance_along_geometry, 30.0);
        assert_eq!(banners[0].sub.as_ref().unwrap().text, "C St");

        let far = step("turn", 300.0, "B St");
        let banners = synthesize(&current, Some(&far), Some(&next_next));
        assert_eq!(banners.len(), 1);
        assert!(banners[0].sub.is_none());
    }

    #[test]
    fn no_banner_without_next_or_distance() {
        let current = step("turn", 300.0, "A St");
        assert!(synthesize(&current, None, None).is_empty());

        let zero = step("turn", 0.0, "A St");
        let next = step("turn", 300.0, "B St");
        assert!(synthesize(&zero, Some(&next), None).is_empty());
    }

    #[test]
    fn unnamed_step_falls_back_to_instruction() {
        let current = step("depart", 300.0, "Main St");
        let mut next = step("turn", 300.0, "");
        next.instruction = Some("Turn right on the sidewalk".into());

        let banners = synthesize(&current, Some(&next), None);
        assert_eq!(banners[0].primary.text, "Turn right on the sidewalk");
        assert_eq!(banners[0].driving_side, "right");
    }

    #[test]
    fn step_without_any_text_is_omitted() {
        let current = step("depart", 300.0, "Main St");
        let mut next = step("turn", 300.0, "");
        next.instruction = None;

        assert!(synthesize(&current, Some(&next), None).is_empty());
    }

    #[test]
    fn names_are_capitalized() {
        let current = step("depart", 300.0, "Main St");
        let next = step("turn", 300.0, "the wiggle");
        let banners = synthesize(&current, Some(&next), None);
        assert_eq!(banners[0].primary.text, "The wiggle");
    }
}
