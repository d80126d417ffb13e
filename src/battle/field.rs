use schema::WeatherKind;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Weather {
    pub kind: WeatherKind,
    pub turns_remaining: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldEffect {
    TrickRoom,
    Gravity,
    MudSport,
    WaterSport,
}

impl fmt::Display for FieldEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldEffect::TrickRoom => "Trick Room",
            FieldEffect::Gravity => "Gravity",
            FieldEffect::MudSport => "Mud Sport",
            FieldEffect::WaterSport => "Water Sport",
        };
        write!(f, "{}", name)
    }
}

/// Battle-wide state: weather, rooms and per-side hazards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Field {
    pub weather: Weather,
    pub trick_room_turns: u8,
    pub gravity_turns: u8,
    pub mud_sport_turns: u8,
    pub water_sport_turns: u8,
    pub spikes_layers: [u8; 2],
}

impl Field {
    pub fn weather_kind(&self) -> WeatherKind {
        if self.weather.turns_remaining == 0 {
            WeatherKind::None
        } else {
            self.weather.kind
        }
    }

    /// Start weather. Fails when the same weather is already up.
    pub fn set_weather(&mut self, kind: WeatherKind, turns: u8) -> bool {
        if kind == WeatherKind::None || self.weather_kind() == kind {
            return false;
        }
        self.weather = Weather {
            kind,
            turns_remaining: turns,
        };
        true
    }

    /// Count the weather down. Returns the weather that just ended, if any.
    pub fn tick_weather(&mut self) -> Option<WeatherKind> {
        if self.weather.turns_remaining == 0 {
            return None;
        }
        self.weather.turns_remaining -= 1;
        if self.weather.turns_remaining == 0 {
            let ended = self.weather.kind;
            self.weather = Weather::default();
            Some(ended)
        } else {
            None
        }
    }

    fn counter_mut(&mut self, effect: FieldEffect) -> &mut u8 {
        match effect {
            FieldEffect::TrickRoom => &mut self.trick_room_turns,
            FieldEffect::Gravity => &mut self.gravity_turns,
            FieldEffect::MudSport => &mut self.mud_sport_turns,
            FieldEffect::WaterSport => &mut self.water_sport_turns,
        }
    }

    pub fn is_active(&self, effect: FieldEffect) -> bool {
        let turns = match effect {
            FieldEffect::TrickRoom => self.trick_room_turns,
            FieldEffect::Gravity => self.gravity_turns,
            FieldEffect::MudSport => self.mud_sport_turns,
            FieldEffect::WaterSport => self.water_sport_turns,
        };
        turns > 0
    }

    /// Start a room or sport. Returns false if it was already running.
    pub fn start(&mut self, effect: FieldEffect, turns: u8) -> bool {
        if self.is_active(effect) {
            return false;
        }
        *self.counter_mut(effect) = turns;
        true
    }

    pub fn end(&mut self, effect: FieldEffect) {
        *self.counter_mut(effect) = 0;
    }

    /// Count rooms and sports down. Returns the ones that ended this turn.
    pub fn tick_effects(&mut self) -> Vec<FieldEffect> {
        let mut expired = Vec::new();
        for effect in [
            FieldEffect::TrickRoom,
            FieldEffect::Gravity,
            FieldEffect::MudSport,
            FieldEffect::WaterSport,
        ] {
            let counter = self.counter_mut(effect);
            if *counter > 0 {
                *counter -= 1;
                if *counter == 0 {
                    expired.push(effect);
                }
            }
        }
        expired
    }

    /// Lay one layer of Spikes on `side`. Returns the new layer count, or None at the cap.
    pub fn add_spikes(&mut self, side: usize, max_layers: u8) -> Option<u8> {
        let layers = self.spikes_layers.get_mut(side)?;
        if *layers >= max_layers {
            return None;
        }
        *layers += 1;
        Some(*layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_weather_lifecycle() {
        let mut field = Field::default();
        assert!(field.set_weather(WeatherKind::Rain, 2));
        assert!(!field.set_weather(WeatherKind::Rain, 5), "same weather fails");
        assert_eq!(field.weather_kind(), WeatherKind::Rain);
        assert_eq!(field.tick_weather(), None);
        assert_eq!(field.tick_weather(), Some(WeatherKind::Rain));
        assert_eq!(field.weather_kind(), WeatherKind::None);
    }

    #[test]
    fn test_spikes_cap_at_three_layers() {
        let mut field = Field::default();
        assert_eq!(field.add_spikes(1, 3), Some(1));
        assert_eq!(field.add_spikes(1, 3), Some(2));
        assert_eq!(field.add_spikes(1, 3), Some(3));
        assert_eq!(field.add_spikes(1, 3), None);
        assert_eq!(field.spikes_layers[0], 0);
    }

    #[test]
    fn test_rooms_expire() {
        let mut field = Field::default();
        assert!(field.start(FieldEffect::TrickRoom, 1));
        assert!(field.start(FieldEffect::Gravity, 2));
        assert_eq!(field.tick_effects(), vec![FieldEffect::TrickRoom]);
        assert_eq!(field.tick_effects(), vec![FieldEffect::Gravity]);
    }
}
