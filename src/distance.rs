//! Spoken distance phrases.
//!
//! Converts distances into the rounded imperial phrases used in voice
//! cues ("300 feet", "a quarter mile", "2 and a half miles").

pub const FEET_PER_METER: f64 = 3.280_84;
pub const FEET_PER_MILE: f64 = 5280.0;

/// Fraction words appended to whole miles.
#[derive(Debug, Clone, Copy, PartialEq)]
enum MileFraction {
    None,
    Quarter,
    Half,
    ThreeQuarters,
}

impl MileFraction {
    fn from_remainder(remainder: f64) -> Self {
        if remainder >= 0.70 {
            MileFraction::ThreeQuarters
        } else if remainder >= 0.375 {
            MileFraction::Half
        } else if remainder >= 0.125 {
            MileFraction::Quarter
        } else {
            MileFraction::None
        }
    }
}

/// Phrase a distance given in feet.
///
/// - below 200 ft: exact whole feet
/// - 200 to 600 ft: nearest 100 ft
/// - 600 to 1000 ft: nearest 200 ft
/// - from 1000 ft: miles with quarter/half/three-quarter words
pub fn phrase_for_distance(feet: f64) -> String {
    let feet = if feet.is_finite() { feet.max(0.0) } else { 0.0 };

    if feet < 200.0 {
        feet_phrase(feet.round() as u64)
    } else if feet < 600.0 {
        feet_phrase(round_to(feet, 100.0))
    } else if feet < 1000.0 {
        feet_phrase(round_to(feet, 200.0))
    } else {
        miles_phrase(feet / FEET_PER_MILE)
    }
}

/// Phrase a distance given in meters.
pub fn phrase_for_meters(meters: f64) -> String {
    phrase_for_distance(meters * FEET_PER_METER)
}

fn round_to(value: f64, step: f64) -> u64 {
    ((value / step).round() * step) as u64
}

fn feet_phrase(feet: u64) -> String {
    if feet == 1 {
        "1 foot".to_string()
    } else {
        format!("{feet} feet")
    }
}

fn miles_phrase(miles: f64) -> String {
    let whole = miles.floor();
    let fraction = MileFraction::from_remainder(miles - whole);
    let whole = whole as u64;

    if whole == 0 {
        // No whole miles: the fraction alone takes the singular
        return match fraction {
            MileFraction::ThreeQuarters => "three quarters of a mile".to_string(),
            MileFraction::Half => "a half mile".to_string(),
            MileFraction::Quarter | MileFraction::None => "a quarter mile".to_string(),
        };
    }

    match fraction {
        MileFraction::None if whole == 1 => "1 mile".to_string(),
        MileFraction::None => format!("{whole} miles"),
        MileFraction::Quarter => format!("{whole} and a quarter miles"),
        MileFraction::Half => format!("{whole} and a half miles"),
        MileFraction::ThreeQuarters => format!("{whole} and three quarters miles"),
    }
}
