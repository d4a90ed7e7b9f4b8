/// Target joint-angle ranges per discipline and goal
///
/// Torso ranges are leans from vertical (0° upright), so lower, more
/// aggressive goals carry higher torso values.

use crate::models::preset::{AngleRange, Discipline, Goal, Preset};

const fn preset(knee: (f64, f64), elbow: (f64, f64), torso: (f64, f64)) -> Preset {
    Preset {
        knee: AngleRange::new(knee.0, knee.1),
        elbow: AngleRange::new(elbow.0, elbow.1),
        torso: AngleRange::new(torso.0, torso.1),
    }
}

/// Resolve the preset for a discipline and goal
pub fn resolve(discipline: Discipline, goal: Goal) -> Preset {
    use Discipline::*;
    use Goal::*;

    match (discipline, goal) {
        (Road, Comfort) => preset((140.0, 150.0), (85.0, 105.0), (35.0, 50.0)),
        (Road, Neutral) => preset((142.0, 152.0), (80.0, 100.0), (40.0, 55.0)),
        (Road, Aero) => preset((145.0, 155.0), (70.0, 90.0), (50.0, 65.0)),

        (Gravel, Comfort) => preset((140.0, 150.0), (90.0, 110.0), (35.0, 50.0)),
        (Gravel, Neutral) => preset((142.0, 152.0), (85.0, 105.0), (40.0, 55.0)),
        (Gravel, Aero) => preset((145.0, 155.0), (75.0, 95.0), (50.0, 65.0)),

        (Mtb, Comfort) => preset((140.0, 150.0), (95.0, 115.0), (30.0, 50.0)),
        (Mtb, Neutral) => preset((142.0, 152.0), (90.0, 110.0), (35.0, 55.0)),
        (Mtb, Aero) => preset((145.0, 155.0), (80.0, 100.0), (45.0, 65.0)),
    }
}

/// Resolve from raw form values; unknown values fall back to road / neutral
pub fn resolve_str(discipline: &str, goal: &str) -> Preset {
    resolve(Discipline::from(discipline), Goal::from(goal))
}

/// Every preset in display order
pub fn all_presets() -> Vec<(Discipline, Goal, Preset)> {
    Discipline::ALL
        .iter()
        .flat_map(|&discipline| {
            Goal::ALL
                .iter()
                .map(move |&goal| (discipline, goal, resolve(discipline, goal)))
        })
        .collect()
}
