//! Text views of the race: the track, the selected player's checklist and
//! the leaderboard. Everything is a pure function of the cache.

use race_utils::{Player, Store, TOTAL_UNITS, race::leaderboard, syllabus};

use crate::cache::LocalCache;

/// Characters in a lane, whatever the size of the syllabus.
pub const LANE_WIDTH: usize = 40;

fn name_width(store: &Store) -> usize {
    store.names().map(|name| name.chars().count()).max().unwrap_or(0)
}

/// Where the car sits on a lane, in `0..=LANE_WIDTH`.
pub fn car_position(player: &Player) -> usize {
    let position = (player.race_position() * LANE_WIDTH as f64).round() as usize;
    position.min(LANE_WIDTH)
}

/// Human name of a flattened unit index, e.g. `COA unit 3`.
pub fn unit_label(index: usize) -> Option<String> {
    let (subject, unit) = syllabus::locate_unit(index)?;
    Some(format!("{} unit {unit}", subject.name))
}

/// One lane per player with the car placed by race position.
pub fn render_track(cache: &LocalCache) -> String {
    let store = cache.store();
    let width = name_width(store);
    let mut out = String::new();

    for (name, player) in store.iter() {
        let completed = player.completed_count();
        let marker = if cache.selected() == Some(name) { '*' } else { ' ' };

        let car = car_position(player);
        let mut lane: String = "=".repeat(car);
        lane.push('>');
        lane.push_str(&".".repeat(LANE_WIDTH - car));

        out.push_str(&format!(
            "{marker} {name:<width$} |{lane}| {name} \u{2014} {completed}/{TOTAL_UNITS}\n"
        ));
    }
    out
}

/// The selected player's units grouped by subject, with the flattened index
/// to pass to `toggle`.
pub fn render_sidebar(cache: &LocalCache) -> String {
    let Some((name, player)) = cache.selected_player() else {
        return "No player selected.\n".to_string();
    };

    let mut out = format!("{name}\n");
    let mut current_subject = None;
    for (index, done) in player.units.iter().enumerate() {
        let Some((subject, unit)) = syllabus::locate_unit(index) else {
            continue;
        };
        if current_subject != Some(subject.name) {
            out.push_str(&format!("  {}\n", subject.name));
            current_subject = Some(subject.name);
        }
        let check = if *done { 'x' } else { ' ' };
        out.push_str(&format!("    [{check}] Unit {unit} (#{index})\n"));
    }
    out
}

pub fn render_leaderboard(store: &Store) -> String {
    let width = name_width(store);
    let mut out = String::from("Leaderboard\n");
    for (rank, standing) in leaderboard(store).iter().enumerate() {
        let percent = (standing.fraction() * 100.0).round() as u32;
        out.push_str(&format!(
            "{:>2}. {:<width$}  {}/{TOTAL_UNITS} {percent:>3}%\n",
            rank + 1,
            standing.name,
            standing.completed
        ));
    }
    out
}

pub fn render(cache: &LocalCache) -> String {
    format!(
        "{}\n{}\n{}",
        render_track(cache),
        render_sidebar(cache),
        render_leaderboard(cache.store())
    )
}
