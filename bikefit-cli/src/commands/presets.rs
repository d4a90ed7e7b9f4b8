use bikefit::services::preset_resolver::all_presets;
use colored::Colorize;

use crate::ui::print_preset;

pub fn list_presets() {
    println!("{}", "Target ranges".bold());
    println!("Knee at bottom dead center, elbow, torso lean from vertical.");
    println!();

    for (discipline, goal, preset) in all_presets() {
        print_preset(&format!("{} / {}", discipline.label(), goal.label()), &preset);
    }
}
