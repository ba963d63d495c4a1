//! Ambient message accrual and environmental line pools.
//!
//! Nothing here runs on a timer. Elapsed world minutes since a "paid to"
//! marker are converted into a capped number of due ambient actions whenever
//! a player polls or acts, so a returning player gets a short burst of
//! catch-up flavor rather than a flood. The paid-to marker advances by
//! exactly the minutes paid out (count times the step), never snapped to an
//! interval boundary, so leftover elapsed time keeps accruing toward the
//! next line.

use rand::seq::SliceRandom;
use rand::Rng;

use super::types::{RoomDef, Season, TimeOfDay, WeatherState, WeatherType};

/// Minimum elapsed world minutes before any ambient line is due.
pub const GATE_MINUTES: u64 = 15;
/// World minutes credited per ambient line shown.
pub const STEP_MINUTES: u64 = 20;
/// Upper bound on catch-up lines released by a single poll.
pub const MAX_CATCHUP: u64 = 5;
/// Floor for the per-action idle interval in crowded rooms.
pub const MIN_IDLE_INTERVAL_MINUTES: u64 = 5;

/// Convert elapsed world minutes into `(due_count, new_paid_to)`.
///
/// A zero `paid_to` marks first contact: one line is due immediately and the
/// marker aligns to now. Otherwise nothing is due until `gate` minutes have
/// elapsed, then one line per `step` minutes up to [`MAX_CATCHUP`], and the
/// marker advances by exactly `count * step`.
pub fn accrue(paid_to: u64, now: u64, gate: u64, step: u64) -> (u64, u64) {
    if paid_to == 0 {
        return (1, now.max(1));
    }
    let elapsed = now.saturating_sub(paid_to);
    if elapsed < gate {
        return (0, paid_to);
    }
    let count = (elapsed / step).min(MAX_CATCHUP);
    (count, paid_to + count * step)
}

/// Accrual with the standard ambient cadence.
pub fn ambient_accrual(paid_to: u64, now: u64) -> (u64, u64) {
    accrue(paid_to, now, GATE_MINUTES, STEP_MINUTES)
}

/// Per-action interval for NPC idle chatter in a room. More NPCs mean more
/// frequent chatter, floored so a crowd cannot flood the log.
pub fn idle_interval_for(npc_count: usize) -> u64 {
    if npc_count == 0 {
        return STEP_MINUTES;
    }
    (STEP_MINUTES / npc_count as u64).max(MIN_IDLE_INTERVAL_MINUTES)
}

// ============================================================================
// Environmental line pools
// ============================================================================

/// Pick an ambient line for a room. Room-specific pools win when the room
/// defines one for plain day or night; dawn, dusk, and rooms without pools
/// fall through to the generic indoor/outdoor tables, keyed by weather with
/// a weather-agnostic default.
pub fn room_line(
    room: &RoomDef,
    time: TimeOfDay,
    weather: &WeatherState,
    rng: &mut impl Rng,
) -> Option<String> {
    let specific: &[String] = match time {
        TimeOfDay::Day => room.ambiance_day.as_slice(),
        TimeOfDay::Night => room.ambiance_night.as_slice(),
        _ => &[],
    };
    if let Some(line) = specific.choose(rng) {
        return Some(line.clone());
    }

    let mut pool = generic_pool(room.outdoor, time, weather.weather);
    if pool.is_empty() {
        pool = default_pool(room.outdoor, time);
    }
    pool.choose(rng).map(|s| (*s).to_string())
}

fn generic_pool(outdoor: bool, time: TimeOfDay, weather: WeatherType) -> &'static [&'static str] {
    use TimeOfDay::*;
    use WeatherType::*;
    match (outdoor, time, weather) {
        // Indoors, the weather is something heard through walls and windows.
        (false, Dawn, Clear) => &[
            "Early light slips in through the shutters, laying pale stripes across the floor.",
            "The first of the morning sun finds its way inside, touch by touch.",
        ],
        (false, Dawn, Rain) => &[
            "Rain taps at the windows while the morning struggles to brighten.",
            "The grey dawn light comes in wet and dim, rain whispering outside.",
        ],
        (false, Dawn, Storm) => &[
            "Thunder mutters somewhere beyond the walls as dawn comes on.",
            "The building shifts and creaks under the early storm.",
        ],
        (false, Dawn, Windy) => &[
            "Wind worries at the shutters in the early morning quiet.",
            "A gust moans along the eaves as the light comes up.",
        ],
        (false, Day, Clear) => &[
            "Sunlight pools on the floor, drifting slowly as the day wears on.",
            "Dust hangs and turns in a shaft of daylight.",
        ],
        (false, Day, Rain) => &[
            "Rain keeps up a steady patter against the glass.",
            "Water threads its way down the windowpanes.",
        ],
        (false, Day, Storm) => &[
            "Thunder rolls through, close enough to feel in the floorboards.",
            "A flash outside whitens the windows for a heartbeat.",
        ],
        (false, Day, Windy) => &[
            "The wind leans on the building and something upstairs creaks.",
            "A hard gust rattles the door in its frame.",
        ],
        (false, Dusk, Clear) => &[
            "The light through the windows turns long and amber.",
            "Shadows stretch across the floor as the day lets go.",
        ],
        (false, Dusk, Rain) => &[
            "Evening rain streaks the darkening windows.",
            "The patter of rain grows louder as the room dims.",
        ],
        (false, Dusk, Storm) => &[
            "The storm leans in as the light fails, thunder rolling nearer.",
            "Lightning stutters against the dusk outside.",
        ],
        (false, Dusk, Windy) => &[
            "The evening wind picks up, setting the shutters knocking.",
            "A long gust drags along the roof as the light goes.",
        ],
        (false, Night, Clear) => &[
            "Moonlight lies in silver bars across the floor.",
            "The room sits dark and still, starlight thin at the windows.",
        ],
        (false, Night, Rain) => &[
            "Night rain drums softly, the only sound for a while.",
            "Rain blurs the dark windows, streaking the view of nothing.",
        ],
        (false, Night, Storm) => &[
            "Thunder cracks close by and the windows shudder in their frames.",
            "Lightning floods the room white for an instant, then the dark comes back.",
        ],
        (false, Night, Windy) => &[
            "Wind moans around the building, out there in the dark.",
            "The structure creaks and settles under the night wind.",
        ],

        // Outdoors, the weather is on you.
        (true, Dawn, Clear) => &[
            "Dew-smell rides the first stirrings of morning air.",
            "Mist lifts off the ground into the strengthening light.",
            "Birdsong starts up as the sky pales overhead.",
        ],
        (true, Dawn, Rain) => &[
            "Morning rain falls soft and steady, beading on everything.",
            "A cool wet breeze carries the smell of soaked earth.",
        ],
        (true, Dawn, Storm) => &[
            "Thunder rolls across the brightening sky.",
            "The dawn storm drives wind and rain through in gusts.",
        ],
        (true, Dawn, Windy) => &[
            "An early wind sweeps through, setting everything swaying.",
            "Gusts comb patterns through the grass in the half-light.",
        ],
        (true, Day, Clear) => &[
            "A soft breeze drifts past, carrying scents from somewhere else.",
            "Cloud shadows slide slowly over the ground.",
            "Somewhere in the distance, birds go about their day.",
        ],
        (true, Day, Rain) => &[
            "Rain falls in an even rhythm, dripping from every edge.",
            "The rain leaves the air washed and clean.",
        ],
        (true, Day, Storm) => &[
            "Lightning flashes, and thunder comes stamping after it.",
            "Wind and rain tangle together in a fierce gust.",
        ],
        (true, Day, Windy) => &[
            "The wind keeps everything around you in restless motion.",
            "Loose leaves and grit ride each passing gust.",
        ],
        (true, Day, Heatwave) => &[
            "Heat shimmers above the ground, bending the distance.",
            "Even the breeze comes through warm, offering no relief.",
        ],
        (true, Dusk, Clear) => &[
            "Shadows lengthen and pool as the light turns gold.",
            "A cooling breeze arrives with the end of the day.",
            "The first birds settle as twilight comes down.",
        ],
        (true, Dusk, Rain) => &[
            "Evening rain catches the last light as it falls.",
            "Wet surfaces glimmer in the fading light.",
        ],
        (true, Dusk, Storm) => &[
            "The storm shows no sign of easing as darkness gathers.",
            "Lightning veins the darkening sky.",
        ],
        (true, Dusk, Windy) => &[
            "The evening wind carries the first chill of night.",
            "Gusts come more often now, pushing the day out.",
        ],
        (true, Night, Clear) => &[
            "A cool night breeze slides past, and shadows shift with it.",
            "The dark is full of small sounds: leaves, wings, wind.",
            "Moonlight moves as clouds cross the sky.",
            "Something shifts at the edge of sight, or seems to.",
        ],
        (true, Night, Rain) => &[
            "Night rain falls steadily, loud in the surrounding quiet.",
            "The rain keeps its rhythm somewhere out in the dark.",
        ],
        (true, Night, Storm) => &[
            "Lightning rips the dark open, and thunder slams it shut.",
            "The night storm feels wilder for being unseen.",
        ],
        (true, Night, Windy) => &[
            "Wind howls through the dark, restless and searching.",
            "The night wind carries sounds from a long way off.",
        ],

        _ => &[],
    }
}

/// Seasonal flavor sentence for a room, keyed by its feature tags. The first
/// tag with lines for the current season wins; untagged rooms and unknown
/// tags yield nothing.
pub fn seasonal_flavor(room: &RoomDef, season: Season, rng: &mut impl Rng) -> Option<String> {
    for feature in &room.features {
        let pool = feature_pool(feature, season);
        if let Some(line) = pool.choose(rng) {
            return Some((*line).to_string());
        }
    }
    None
}

fn feature_pool(feature: &str, season: Season) -> &'static [&'static str] {
    use Season::*;
    match (feature, season) {
        ("trees", Spring) => &[
            "New leaves unfurl on every branch, impossibly green.",
            "Blossom drifts loose from the trees with each breeze.",
        ],
        ("trees", Summer) => &[
            "The trees stand in full, heavy leaf, their shade deep and cool.",
        ],
        ("trees", Autumn) => &[
            "The leaves have turned, and every gust brings a few more down.",
            "Fallen leaves rustle and drift in red and gold heaps.",
        ],
        ("trees", Winter) => &[
            "The trees stand bare, their branches stark against the sky.",
        ],
        ("water", Spring) => &[
            "The water runs high and quick with the spring melt.",
        ],
        ("water", Summer) => &["The water glitters invitingly in the warmth."],
        ("water", Autumn) => &["Fallen leaves turn slow circles on the water."],
        ("water", Winter) => &[
            "A skin of ice creeps in from the water's edges.",
        ],
        ("grass", Spring) => &["The grass is thick with early wildflowers."],
        ("grass", Summer) => &["The grass has gone tall and dry at the edges."],
        ("grass", Autumn) => &["The grass is browning, beaten down by rain and wind."],
        ("grass", Winter) => &["Frost stiffens what little grass remains."],
        ("stone", Winter) => &["Frost traces pale lines along the old stonework."],
        ("stone", Summer) => &["The stone holds the day's warmth long into the evening."],
        _ => &[],
    }
}

fn default_pool(outdoor: bool, time: TimeOfDay) -> &'static [&'static str] {
    use TimeOfDay::*;
    match (outdoor, time) {
        (false, Dawn) => &[
            "The room sits quiet in the early hours.",
            "Morning light fills the space by slow degrees.",
        ],
        (false, Day) => &[
            "The room is calm; time moves at its own pace here.",
            "Small settling sounds mark the passing of the day.",
        ],
        (false, Dusk) => &[
            "Evening settles in, and the room grows dim.",
            "The last daylight drains slowly from the room.",
        ],
        (false, Night) => &[
            "The room is dark and quiet.",
            "Shadows gather thick in the corners.",
        ],
        (true, Dawn) => &[
            "The world wakes by inches around you.",
            "Morning light spreads slowly over everything.",
        ],
        (true, Day) => &[
            "The day goes on around you, unhurried.",
            "The area feels quietly alive.",
        ],
        (true, Dusk) => &[
            "Day gives way to evening without ceremony.",
            "The world begins to quiet as the light goes.",
        ],
        (true, Night) => &[
            "The night is dark and full of small movements.",
            "Shadows keep their own counsel in the darkness.",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn first_contact_pays_one_line_and_aligns() {
        let (count, paid) = ambient_accrual(0, 500);
        assert_eq!(count, 1);
        assert_eq!(paid, 500);
    }

    #[test]
    fn below_the_gate_nothing_is_due() {
        let (count, paid) = ambient_accrual(100, 110);
        assert_eq!(count, 0);
        assert_eq!(paid, 100);
    }

    #[test]
    fn catch_up_is_capped() {
        // A day away would owe 72 lines; only five are released.
        let (count, paid) = ambient_accrual(100, 100 + 1440);
        assert_eq!(count, MAX_CATCHUP);
        assert_eq!(paid, 100 + MAX_CATCHUP * STEP_MINUTES);
    }

    #[test]
    fn paid_to_advances_by_exactly_what_was_shown() {
        let (count, paid) = ambient_accrual(100, 145);
        assert_eq!(count, 2);
        assert_eq!(paid, 140);
        // The five leftover minutes still count toward the next line.
        let (count, paid) = ambient_accrual(paid, 160);
        assert_eq!(count, 1);
        assert_eq!(paid, 160);
    }

    #[test]
    fn idle_interval_shrinks_with_crowding_but_floors() {
        assert_eq!(idle_interval_for(0), STEP_MINUTES);
        assert_eq!(idle_interval_for(1), 20);
        assert_eq!(idle_interval_for(2), 10);
        assert_eq!(idle_interval_for(4), MIN_IDLE_INTERVAL_MINUTES);
        assert_eq!(idle_interval_for(40), MIN_IDLE_INTERVAL_MINUTES);
    }

    #[test]
    fn specific_pool_wins_for_day_but_not_dawn() {
        let room = RoomDef::new("hall", "Great Hall", "A hall.")
            .with_ambiance(&["The hearth pops and settles."], &[]);
        let weather = WeatherState::default();
        let mut rng = StdRng::seed_from_u64(3);
        let line = room_line(&room, TimeOfDay::Day, &weather, &mut rng);
        assert_eq!(line.as_deref(), Some("The hearth pops and settles."));
        // Dawn has no specific pool, so a generic indoor line appears.
        let line = room_line(&room, TimeOfDay::Dawn, &weather, &mut rng);
        assert!(line.is_some());
        assert_ne!(line.as_deref(), Some("The hearth pops and settles."));
    }

    #[test]
    fn unlisted_weather_falls_back_to_default_pool() {
        let room = RoomDef::new("field", "Open Field", "A field.").outdoor();
        let weather = WeatherState {
            weather: WeatherType::Sleet,
            ..WeatherState::default()
        };
        let mut rng = StdRng::seed_from_u64(9);
        assert!(room_line(&room, TimeOfDay::Day, &weather, &mut rng).is_some());
    }

    #[test]
    fn seasonal_flavor_keys_off_feature_tags() {
        let mut rng = StdRng::seed_from_u64(4);
        let grove = RoomDef::new("grove", "Grove", "Trees.").with_features(&["trees"]);
        let line = seasonal_flavor(&grove, Season::Autumn, &mut rng).unwrap();
        assert!(line.contains("leaves") || line.contains("Fallen"));
        let bare = RoomDef::new("cell", "Cell", "A cell.");
        assert!(seasonal_flavor(&bare, Season::Autumn, &mut rng).is_none());
    }
}
