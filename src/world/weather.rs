//! Probabilistic weather transition engine.
//!
//! Weather changes in two stages. First the intensity may drift one band
//! along a weighted adjacency table (heavy never jumps straight to none).
//! Second, independently and with a probability that rises as intensity
//! falls, the weather type itself may shift along a season-weighted
//! adjacency graph, picking a plausible starting intensity for the new type.
//! Each applied shift may carry a transition sentence chosen from a lookup
//! keyed by the old and new state plus time of day; keys without an entry
//! stay silent.
//!
//! All randomness flows through a caller-supplied [`rand::Rng`], so tests
//! drive the engine with seeded generators.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use super::types::{
    Exposure, MoonPhase, Season, TemperatureBand, TimeOfDay, WeatherIntensity, WeatherState,
    WeatherType,
};

/// Chance per re-roll that the intensity stage runs before the type stage.
const INTENSITY_STAGE_CHANCE: f64 = 0.7;

/// Minimum wall seconds between exposure accumulator updates for one actor.
pub const EXPOSURE_THROTTLE_SECONDS: i64 = 5;

/// Result of a successful weather re-roll, not yet applied to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherShift {
    pub weather: WeatherType,
    pub intensity: WeatherIntensity,
    pub temperature: TemperatureBand,
    /// Transition sentence for broadcast, when the lookup has one.
    pub message: Option<String>,
}

// ============================================================================
// Adjacency tables
// ============================================================================

/// Intensity drift per band. Self-entries absorb probability mass so a roll
/// can leave the intensity untouched; bands only ever move one step.
fn intensity_paths(current: WeatherIntensity) -> &'static [(WeatherIntensity, f64)] {
    use WeatherIntensity::*;
    match current {
        Heavy => &[(Moderate, 0.5), (Heavy, 0.5)],
        Moderate => &[(Heavy, 0.2), (Light, 0.4), (Moderate, 0.4)],
        Light => &[(Moderate, 0.2), (None, 0.5), (Light, 0.3)],
        None => &[(Light, 0.4), (None, 0.6)],
    }
}

/// Base type adjacency before seasonal weighting. Snow and sleet only trade
/// with each other, so wintry precipitation has to be seeded externally.
fn type_paths(current: WeatherType) -> &'static [(WeatherType, f64)] {
    use WeatherType::*;
    match current {
        Clear => &[(Overcast, 0.3), (Windy, 0.2), (Rain, 0.05), (Clear, 0.45)],
        Overcast => &[(Clear, 0.3), (Rain, 0.4), (Windy, 0.1), (Overcast, 0.2)],
        Rain => &[(Overcast, 0.3), (Storm, 0.2), (Clear, 0.1), (Rain, 0.4)],
        Storm => &[(Rain, 0.5), (Overcast, 0.3), (Storm, 0.2)],
        Windy => &[(Clear, 0.4), (Overcast, 0.3), (Rain, 0.2), (Windy, 0.1)],
        Snow => &[(Sleet, 0.2), (Overcast, 0.3), (Clear, 0.1), (Snow, 0.4)],
        Sleet => &[(Snow, 0.2), (Rain, 0.3), (Overcast, 0.3), (Sleet, 0.2)],
        Heatwave => &[(Clear, 0.5), (Windy, 0.3), (Heatwave, 0.2)],
    }
}

/// Apply seasonal multipliers to the base paths and renormalize to sum 1.
pub fn season_weighted_paths(current: WeatherType, season: Season) -> Vec<(WeatherType, f64)> {
    let mut adjusted: Vec<(WeatherType, f64)> = type_paths(current)
        .iter()
        .map(|&(target, base)| {
            let mut weight = base;
            match season {
                Season::Winter => {
                    if matches!(target, WeatherType::Snow | WeatherType::Sleet) {
                        weight *= 1.5;
                    } else if target == WeatherType::Heatwave {
                        weight *= 0.1;
                    }
                }
                Season::Summer => {
                    if matches!(target, WeatherType::Heatwave | WeatherType::Clear) {
                        weight *= 1.3;
                    } else if matches!(target, WeatherType::Snow | WeatherType::Sleet) {
                        weight *= 0.1;
                    }
                }
                Season::Spring => {
                    if target == WeatherType::Rain {
                        weight *= 1.4;
                    }
                }
                Season::Autumn => {
                    if matches!(target, WeatherType::Windy | WeatherType::Rain) {
                        weight *= 1.3;
                    }
                }
            }
            (target, weight.min(1.0))
        })
        .collect();

    let total: f64 = adjusted.iter().map(|(_, w)| w).sum();
    if total > 0.0 {
        for entry in &mut adjusted {
            entry.1 /= total;
        }
    }
    adjusted
}

fn weighted_pick<T: Copy>(table: &[(T, f64)], fallback: T, rng: &mut impl Rng) -> T {
    let roll = rng.gen::<f64>();
    let mut cumulative = 0.0;
    for (value, weight) in table {
        cumulative += weight;
        if roll <= cumulative {
            return *value;
        }
    }
    fallback
}

/// Starting intensity when the weather type changes.
pub fn initial_intensity(weather: WeatherType, rng: &mut impl Rng) -> WeatherIntensity {
    use WeatherIntensity::*;
    match weather {
        WeatherType::Rain | WeatherType::Snow | WeatherType::Sleet => {
            if rng.gen_bool(0.5) {
                Light
            } else {
                Moderate
            }
        }
        WeatherType::Storm => {
            if rng.gen_bool(0.7) {
                Heavy
            } else {
                Moderate
            }
        }
        WeatherType::Windy => {
            if rng.gen_bool(0.6) {
                Light
            } else {
                Moderate
            }
        }
        WeatherType::Heatwave => Moderate,
        WeatherType::Overcast => Light,
        WeatherType::Clear => None,
    }
}

/// Temperature band implied by the weather type, falling back to a seasonal
/// pick for neutral types.
pub fn roll_temperature(weather: WeatherType, season: Season, rng: &mut impl Rng) -> TemperatureBand {
    match weather {
        WeatherType::Snow | WeatherType::Sleet => TemperatureBand::Cold,
        WeatherType::Heatwave => TemperatureBand::Hot,
        _ => {
            let options: &[TemperatureBand] = match season {
                Season::Spring | Season::Autumn => &[TemperatureBand::Mild, TemperatureBand::Cool],
                Season::Summer => &[TemperatureBand::Warm, TemperatureBand::Hot],
                Season::Winter => &[TemperatureBand::Cold, TemperatureBand::Cool],
            };
            *options.choose(rng).unwrap_or(&TemperatureBand::Mild)
        }
    }
}

// ============================================================================
// Two-stage re-roll
// ============================================================================

/// Run one weather re-roll. Returns `None` when neither stage produced a
/// change; the caller decides when a roll is due and applies the shift.
pub fn roll_transition(
    current: WeatherType,
    intensity: WeatherIntensity,
    season: Season,
    time: TimeOfDay,
    rng: &mut impl Rng,
) -> Option<WeatherShift> {
    // Stage 1: intensity drift. A self-pick falls through to stage 2.
    if rng.gen::<f64>() < INTENSITY_STAGE_CHANCE {
        let next = weighted_pick(intensity_paths(intensity), intensity, rng);
        if next != intensity {
            return Some(WeatherShift {
                weather: current,
                intensity: next,
                temperature: roll_temperature(current, season, rng),
                message: transition_message(current, intensity, current, next, time, rng),
            });
        }
    }

    // Stage 2: type shift, likelier the calmer the sky already is.
    let type_chance = match intensity {
        WeatherIntensity::None => 0.5,
        WeatherIntensity::Light => 0.3,
        WeatherIntensity::Moderate | WeatherIntensity::Heavy => 0.1,
    };
    if rng.gen::<f64>() < type_chance {
        let paths = season_weighted_paths(current, season);
        let next = weighted_pick(&paths, current, rng);
        if next != current {
            let new_intensity = initial_intensity(next, rng);
            return Some(WeatherShift {
                weather: next,
                intensity: new_intensity,
                temperature: roll_temperature(next, season, rng),
                message: transition_message(current, intensity, next, new_intensity, time, rng),
            });
        }
    }

    None
}

// ============================================================================
// Transition sentences
// ============================================================================

/// Pick a transition sentence for a weather shift. Unlisted keys return
/// `None`; a silent transition is a normal outcome, not an error.
pub fn transition_message(
    old_type: WeatherType,
    old_intensity: WeatherIntensity,
    new_type: WeatherType,
    new_intensity: WeatherIntensity,
    time: TimeOfDay,
    rng: &mut impl Rng,
) -> Option<String> {
    use WeatherIntensity as I;
    use WeatherType as W;

    if old_type == new_type && old_intensity == new_intensity {
        return None;
    }
    let night = time == TimeOfDay::Night;

    let lines: &[&str] = if old_type != new_type {
        match (old_type, new_type) {
            (W::Rain, W::Overcast) => &[
                "The rain trails off, though the clouds overhead refuse to part.",
                "The last drops of rain fall, leaving a flat grey sky behind.",
            ],
            (W::Rain, W::Clear) if night => &[
                "The rain stops and the clouds drift apart, baring the stars.",
                "The night rain ends, and piece by piece the sky opens up.",
            ],
            (W::Rain, W::Clear) => &[
                "The rain stops and patches of blue begin to show through the clouds.",
                "The rain ends, and the clouds thin until the sky stands open.",
            ],
            (W::Rain, W::Storm) => &[
                "The rain hardens suddenly, wind rising with it, until a storm is on you.",
                "What was steady rain gathers into a full storm, thunder rolling close behind.",
            ],
            (W::Storm, W::Rain) => &[
                "The storm loses its anger, settling into steady rain.",
                "The worst of the storm moves on; rain keeps falling in its wake.",
            ],
            (W::Storm, W::Overcast) => &[
                "The storm blows itself out, leaving a lid of heavy cloud.",
                "The storm passes, though the sky stays dark and low.",
            ],
            (W::Overcast, W::Rain) => &[
                "The clouds finally give up their weight and rain begins to fall.",
                "Rain starts to patter down from the grey overhead.",
            ],
            (W::Overcast, W::Clear) if night => &[
                "The cloud cover breaks apart, letting the stars through.",
                "The grey peels back from the night sky, star by star.",
            ],
            (W::Overcast, W::Clear) => &[
                "The cloud cover breaks apart, and blue sky shows through the gaps.",
                "The grey thins and scatters until the sky is clear.",
            ],
            (W::Clear, W::Overcast) if night => &[
                "Clouds slide in across the night, swallowing the stars one by one.",
                "A dark bank of cloud moves in, shutting out the moon.",
            ],
            (W::Clear, W::Overcast) => &[
                "Clouds gather from the horizon, greying out the open sky.",
                "The clear sky slowly films over with cloud.",
            ],
            (W::Clear, W::Rain) if night => &[
                "Clouds pile up fast in the dark, and rain begins to fall.",
                "The night sky closes over without warning and rain comes down.",
            ],
            (W::Clear, W::Rain) => &[
                "Clouds pile up fast and the first rain begins to fall.",
                "The sky darkens in minutes, and rain comes sweeping in.",
            ],
            (W::Snow, W::Sleet) => &[
                "The snowflakes turn fat and wet, coming down as sleet.",
                "The snow softens into stinging sleet as the air warms a touch.",
            ],
            (W::Sleet, W::Rain) => &[
                "The sleet loses its ice and falls as plain rain.",
                "The sleet melts mid-air into a cold, steady rain.",
            ],
            (W::Sleet, W::Snow) => &[
                "The sleet stiffens back into proper snow as the cold deepens.",
                "The wet sleet turns to drifting snowflakes.",
            ],
            (W::Windy, W::Clear) => &[
                "The wind drops away, leaving still air and an open sky.",
                "The gusts settle and the weather turns calm and clear.",
            ],
            (W::Clear, W::Windy) => &[
                "A breeze springs up and keeps strengthening into real wind.",
                "The still air begins to move, building into a steady wind.",
            ],
            (W::Heatwave, W::Clear) => &[
                "The crushing heat finally breaks, and the air turns breathable again.",
                "The heatwave lifts at last, leaving clear skies and kinder air.",
            ],
            _ => &[],
        }
    } else {
        // Same type, intensity moved a band.
        match (old_type, old_intensity, new_intensity) {
            (W::Rain, I::Heavy, I::Moderate) => &[
                "The downpour eases off into a steady rain.",
                "The heavy rain slackens, though it keeps falling.",
            ],
            (W::Rain, I::Moderate, I::Light) => &[
                "The rain thins out to little more than a drizzle.",
                "The steady rain eases into a light patter.",
            ],
            (W::Rain, I::Light, I::None) => &[
                "The drizzle gives out, though the sky stays damp and grey.",
                "The light rain stops, leaving wet ground behind.",
            ],
            (W::Rain, I::Moderate, I::Heavy) => &[
                "The rain picks up hard, drumming down in sheets.",
                "The steady rain swells into a proper downpour.",
            ],
            (W::Rain, I::Light, I::Moderate) => &[
                "The drizzle thickens into steady rain.",
                "The light rain strengthens and settles in.",
            ],
            (W::Storm, I::Heavy, I::Moderate) => &[
                "The storm's fury slips a notch, though it is far from done.",
                "The worst of the storm edges past, still rumbling.",
            ],
            (W::Storm, I::Moderate, I::Heavy) => &[
                "The storm builds to its full pitch, wind and rain flat out.",
                "The storm deepens into a true tempest.",
            ],
            (W::Snow, I::Heavy, I::Moderate) => &[
                "The driving snow relents a little, still falling thickly.",
                "The near-whiteout eases into steady snowfall.",
            ],
            (W::Snow, I::Moderate, I::Light) => &[
                "The snowfall thins to a gentle sifting of flakes.",
                "The steady snow eases into light flurries.",
            ],
            (W::Snow, I::Light, I::None) => &[
                "The last flakes settle, leaving everything under white.",
                "The snow stops falling; the world lies quiet beneath it.",
            ],
            (W::Windy, I::Heavy, I::Moderate) => &[
                "The gale slackens into a hard but steadier wind.",
                "The worst gusts die back, though the wind stays strong.",
            ],
            (W::Windy, I::Moderate, I::Light) => &[
                "The wind falls away to a brisk breeze.",
                "The steady wind gentles noticeably.",
            ],
            (W::Windy, I::Light, I::None) => &[
                "The breeze dies out, leaving the air still.",
                "The last of the wind settles into calm.",
            ],
            (W::Overcast, I::Moderate, I::Light) => &[
                "The heavy cloud thins a little, though the sky stays grey.",
                "The overcast lightens without quite breaking.",
            ],
            _ => &[],
        }
    };

    lines.choose(rng).map(|s| (*s).to_string())
}

/// One-sentence weather report for the current state.
pub fn describe(state: &WeatherState) -> String {
    let temp = state.temperature.as_str();
    let intensity = state.intensity.as_str();
    match state.weather {
        WeatherType::Clear => format!("The sky is clear and the air is {}.", temp),
        WeatherType::Overcast => format!("The sky is overcast and the air is {}.", temp),
        WeatherType::Windy => format!("A {} wind is blowing and the air is {}.", intensity, temp),
        WeatherType::Rain => format!("It is raining ({}) and {}.", intensity, temp),
        WeatherType::Storm => format!("A {} storm is raging.", intensity),
        WeatherType::Snow => format!("It is snowing ({}) and {}.", intensity, temp),
        WeatherType::Sleet => format!("Sleet is falling ({}) and it is {}.", intensity, temp),
        WeatherType::Heatwave => "A heatwave grips the land; the air is sweltering.".to_string(),
    }
}

/// The atmospheric line shown with a room description: a single sentence
/// folding together time of day, weather, and (at night) the moon. Indoor
/// rooms get a view through the windows instead.
pub fn sky_line(state: &WeatherState, time: TimeOfDay, moon: MoonPhase, outdoor: bool) -> String {
    use WeatherIntensity as I;
    use WeatherType as W;

    if !outdoor {
        return match time {
            TimeOfDay::Dawn => "The pale light of dawn filters in from outside.".to_string(),
            TimeOfDay::Day => "The day's light filters in from outside.".to_string(),
            TimeOfDay::Dusk => "Evening light fades as darkness settles outside.".to_string(),
            TimeOfDay::Night => "The night is dark outside, little light reaching in.".to_string(),
        };
    }

    match time {
        TimeOfDay::Day => match (state.weather, state.intensity) {
            (W::Clear, _) => "The sun shines in a clear sky, lighting the land below.".to_string(),
            (W::Overcast, _) => "The day is grey and muted under a flat overcast sky.".to_string(),
            (W::Rain, I::Heavy) => {
                "Heavy rain and thick cloud have darkened the whole day.".to_string()
            }
            (W::Rain, _) => "Rain falls steadily, dimming the day and soaking everything.".to_string(),
            (W::Storm, _) => {
                "A fierce storm darkens the day, thunder and lightning overhead.".to_string()
            }
            (W::Snow, I::Heavy) => {
                "Heavy snow fills the air, muffling sound and shrinking the world.".to_string()
            }
            (W::Snow, _) => "Snow drifts down steadily, softening every edge.".to_string(),
            (W::Sleet, _) => "Sleet comes down at a slant, icy and persistent.".to_string(),
            (W::Heatwave, _) => {
                "The sun beats down without mercy, baking the ground.".to_string()
            }
            (W::Windy, I::Heavy) => {
                "Strong wind tears through the day, hard to stand against.".to_string()
            }
            (W::Windy, _) => "A brisk wind tugs at everything as the day goes on.".to_string(),
        },
        TimeOfDay::Dawn => match state.weather {
            W::Clear => "Dawn paints the sky in pinks and golds under clear air.".to_string(),
            W::Overcast => "Dawn struggles up behind heavy grey cloud.".to_string(),
            W::Rain | W::Storm | W::Sleet => {
                "Dawn breaks weakly through cloud and falling rain.".to_string()
            }
            _ => "Dawn comes on, the light slowly finding its strength.".to_string(),
        },
        TimeOfDay::Dusk => match state.weather {
            W::Clear => {
                "Evening settles in under a clear sky, the horizon deep orange and purple."
                    .to_string()
            }
            W::Overcast => "Evening falls early under heavy grey cloud.".to_string(),
            W::Rain | W::Storm | W::Sleet => {
                "Evening arrives with steady rain, the dark coming down fast.".to_string()
            }
            _ => "Evening settles in, the light going out of the day.".to_string(),
        },
        TimeOfDay::Night => {
            let moon_hidden = matches!(state.weather, W::Overcast | W::Storm);
            match state.weather {
                W::Clear => match moon {
                    MoonPhase::New => {
                        "The night is pitch black under a clear sky; the new moon gives nothing, \
                         and only the faintest stars show."
                            .to_string()
                    }
                    MoonPhase::Full => {
                        "The sky is clear, and the land lies bathed in the silver light of the \
                         full moon."
                            .to_string()
                    }
                    MoonPhase::WaxingGibbous | MoonPhase::WaningGibbous => {
                        "The sky is clear, the land lit by the bright gibbous moon.".to_string()
                    }
                    _ => "The sky is clear; a thin moon and the stars give the only light."
                        .to_string(),
                },
                W::Snow if !moon_hidden && moon == MoonPhase::Full => {
                    "Snow falls steadily through the night, the full moon glowing off the white \
                     ground."
                        .to_string()
                }
                W::Snow => "Snow drifts down through the darkness, silent and steady.".to_string(),
                W::Rain if state.intensity == I::Heavy => {
                    "Heavy rain pounds down through the darkness.".to_string()
                }
                W::Rain => "Rain falls steadily through the night, pattering on the ground."
                    .to_string(),
                W::Storm => {
                    "A storm rages through the night, lightning ripping the darkness open."
                        .to_string()
                }
                W::Sleet => "Icy sleet pelts down through the dark, thoroughly miserable."
                    .to_string(),
                W::Windy if state.intensity == I::Heavy => {
                    "A howling wind tears through the darkness, the night's only voice.".to_string()
                }
                W::Windy => "A night wind moves through, rustling things unseen.".to_string(),
                W::Overcast => {
                    "The night is dark under heavy cloud, stars and moon alike shut out."
                        .to_string()
                }
                W::Heatwave => {
                    "Even at night the heat refuses to lift; the air lies thick and warm."
                        .to_string()
                }
            }
        }
    }
}

// ============================================================================
// Exposure accumulation
// ============================================================================

/// Drift one actor's exposure accumulators toward what the weather implies.
/// Outdoors, precipitation soaks and cold or heat build; indoors everything
/// decays, wet clothes slowing the warm-up. Throttled to one application per
/// [`EXPOSURE_THROTTLE_SECONDS`] of wall time.
pub fn update_exposure(
    exposure: &mut Exposure,
    outdoor: bool,
    weather: &WeatherState,
    season: Season,
    now: DateTime<Utc>,
) {
    if let Some(last) = exposure.last_update {
        if now.signed_duration_since(last).num_seconds() < EXPOSURE_THROTTLE_SECONDS {
            return;
        }
    }
    exposure.last_update = Some(now);

    if !outdoor {
        exposure.bump_wetness(-2);
        if exposure.wetness > 0 {
            exposure.bump_cold(-1);
        } else {
            exposure.bump_cold(-2);
        }
        exposure.bump_heat(-2);
        return;
    }

    let precipitation = matches!(
        weather.weather,
        WeatherType::Rain | WeatherType::Snow | WeatherType::Sleet | WeatherType::Storm
    );
    if precipitation {
        match weather.intensity {
            WeatherIntensity::Light => exposure.bump_wetness(1),
            WeatherIntensity::Moderate => exposure.bump_wetness(2),
            WeatherIntensity::Heavy => exposure.bump_wetness(3),
            WeatherIntensity::None => {}
        }
    } else {
        exposure.bump_wetness(-1);
    }

    let freezing = season == Season::Winter
        || matches!(weather.weather, WeatherType::Snow | WeatherType::Sleet)
        || weather.temperature == TemperatureBand::Cold;
    if freezing {
        let severe = matches!(
            weather.intensity,
            WeatherIntensity::Moderate | WeatherIntensity::Heavy
        ) || weather.temperature == TemperatureBand::Cold;
        exposure.bump_cold(if severe { 2 } else { 1 });
    } else {
        exposure.bump_cold(-1);
    }

    let sweltering = season == Season::Summer
        || weather.weather == WeatherType::Heatwave
        || matches!(
            weather.temperature,
            TemperatureBand::Hot | TemperatureBand::Warm
        );
    if sweltering {
        let severe = weather.temperature == TemperatureBand::Hot
            || (weather.weather == WeatherType::Heatwave
                && matches!(
                    weather.intensity,
                    WeatherIntensity::Moderate | WeatherIntensity::Heavy
                ));
        exposure.bump_heat(if severe { 2 } else { 1 });
    } else if exposure.wetness > 0 {
        // Evaporation: being wet sheds heat faster.
        exposure.bump_heat(-2);
    } else {
        exposure.bump_heat(-1);
    }
}

/// Render an actor's exposure as a status sentence, or `None` when clear.
pub fn exposure_line(exposure: &Exposure) -> Option<String> {
    if !exposure.has_status() {
        return None;
    }
    let mut parts: Vec<String> = Vec::new();
    match exposure.wetness {
        0 => {}
        1..=3 => parts.push("damp".to_string()),
        4..=7 => parts.push("thoroughly wet".to_string()),
        _ => parts.push("soaked to the skin".to_string()),
    }
    match exposure.cold {
        0 => {}
        1..=3 => parts.push("a little chilled".to_string()),
        4..=7 => parts.push("shivering with cold".to_string()),
        _ => parts.push("dangerously cold".to_string()),
    }
    match exposure.heat {
        0 => {}
        1..=3 => parts.push("uncomfortably warm".to_string()),
        4..=7 => parts.push("sweating heavily".to_string()),
        _ => parts.push("dangerously overheated".to_string()),
    }
    if parts.is_empty() {
        None
    } else {
        Some(format!("You are {}.", super::textutil::join_names(&parts)))
    }
}
