use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A single scalar cell of the exported table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl Cell {
    /// Convert an arbitrary JSON value into a cell. `null` is the only value
    /// that yields no cell; objects and arrays keep their compact JSON text.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(text) => Some(Cell::Text(text.clone())),
            Value::Bool(flag) => Some(Cell::Bool(*flag)),
            Value::Number(number) => Some(
                number
                    .as_i64()
                    .map(Cell::Integer)
                    .unwrap_or_else(|| Cell::Float(number.as_f64().unwrap_or(f64::NAN))),
            ),
            other => Some(Cell::Text(other.to_string())),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(text) => f.write_str(text),
            Cell::Integer(value) => write!(f, "{value}"),
            Cell::Float(value) => write!(f, "{value}"),
            Cell::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

/// One row per match. Every field is optional: a key missing from the
/// upstream object leaves the cell empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchRecord {
    pub match_id: Option<Cell>,
    pub outcome: Option<Cell>,
    pub map_name: Option<Cell>,
    pub hero_played: Option<Cell>,
    pub duration_seconds: Option<Cell>,
    pub kills: Option<Cell>,
    pub deaths: Option<Cell>,
    pub assists: Option<Cell>,
    pub damage_dealt: Option<Cell>,
    pub healing_done: Option<Cell>,
    pub ultimate_uses: Option<Cell>,
    pub time_played_hero_seconds: Option<Cell>,
    pub game_mode: Option<Cell>,
    pub timestamp: Option<Cell>,
}

impl MatchRecord {
    /// Map one upstream match object. Non-object values produce an empty row.
    pub fn from_value(value: &Value) -> Self {
        let field = |key: &str| value.get(key).and_then(Cell::from_value);

        Self {
            match_id: field("matchId"),
            outcome: field("outcome"),
            map_name: field("mapName"),
            hero_played: field("heroPlayed"),
            duration_seconds: field("durationSeconds"),
            kills: field("kills"),
            deaths: field("deaths"),
            assists: field("assists"),
            damage_dealt: field("damageDealt"),
            healing_done: field("healingDone"),
            ultimate_uses: field("ultimateUses"),
            time_played_hero_seconds: field("timePlayedHeroSeconds"),
            game_mode: field("gameMode"),
            timestamp: field("timestamp"),
        }
    }

    pub fn get(&self, column: Column) -> Option<&Cell> {
        match column {
            Column::MatchId => self.match_id.as_ref(),
            Column::Outcome => self.outcome.as_ref(),
            Column::MapName => self.map_name.as_ref(),
            Column::HeroPlayed => self.hero_played.as_ref(),
            Column::DurationSeconds => self.duration_seconds.as_ref(),
            Column::Kills => self.kills.as_ref(),
            Column::Deaths => self.deaths.as_ref(),
            Column::Assists => self.assists.as_ref(),
            Column::DamageDealt => self.damage_dealt.as_ref(),
            Column::HealingDone => self.healing_done.as_ref(),
            Column::UltimateUses => self.ultimate_uses.as_ref(),
            Column::TimePlayedHeroSeconds => self.time_played_hero_seconds.as_ref(),
            Column::GameMode => self.game_mode.as_ref(),
            Column::Timestamp => self.timestamp.as_ref(),
        }
    }
}

/// Look up `key` in a decoded payload and map every element of the list
/// found there. Returns `None` when the key is absent or not an array, so the
/// caller decides how loudly to complain.
pub fn records_under_key(payload: &Value, key: &str) -> Option<Vec<MatchRecord>> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().map(MatchRecord::from_value).collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    MatchId,
    Outcome,
    MapName,
    HeroPlayed,
    DurationSeconds,
    Kills,
    Deaths,
    Assists,
    DamageDealt,
    HealingDone,
    UltimateUses,
    TimePlayedHeroSeconds,
    GameMode,
    Timestamp,
}

impl Column {
    pub const ALL: [Column; 14] = [
        Column::MatchId,
        Column::Outcome,
        Column::MapName,
        Column::HeroPlayed,
        Column::DurationSeconds,
        Column::Kills,
        Column::Deaths,
        Column::Assists,
        Column::DamageDealt,
        Column::HealingDone,
        Column::UltimateUses,
        Column::TimePlayedHeroSeconds,
        Column::GameMode,
        Column::Timestamp,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Column::MatchId => "match_id",
            Column::Outcome => "outcome",
            Column::MapName => "map_name",
            Column::HeroPlayed => "hero_played",
            Column::DurationSeconds => "duration_seconds",
            Column::Kills => "kills",
            Column::Deaths => "deaths",
            Column::Assists => "assists",
            Column::DamageDealt => "damage_dealt",
            Column::HealingDone => "healing_done",
            Column::UltimateUses => "ultimate_uses",
            Column::TimePlayedHeroSeconds => "time_played_hero_seconds",
            Column::GameMode => "game_mode",
            Column::Timestamp => "timestamp",
        }
    }
}

/// Which columns end up in the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSet {
    /// match id, outcome, map, hero, duration
    #[default]
    Basic,
    Extended,
}

impl FieldSet {
    pub fn columns(self) -> &'static [Column] {
        match self {
            FieldSet::Basic => &Column::ALL[..5],
            FieldSet::Extended => &Column::ALL,
        }
    }
}

impl FromStr for FieldSet {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(FieldSet::Basic),
            "extended" | "full" => Ok(FieldSet::Extended),
            other => Err(format!(
                "unknown field set '{other}', expected 'basic' or 'extended'"
            )),
        }
    }
}
