//! Argument checks run before any write reaches the API.
//!
//! Each entity kind has a [`Schema`]: a table of field descriptors. Known
//! fields with bad values are rejected; unknown fields are dropped with a
//! warning and validation continues.

use std::borrow::Cow;

use serde_json::Value;
use tracing::warn;

use crate::error::Error;
use crate::score::Score;
use crate::types::Snapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextRule {
    Any,
    MaxLen(usize),
    /// Case-insensitive membership.
    OneOf(&'static [&'static str]),
    /// `[A-Za-z0-9_]*`
    Slug,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text(TextRule),
    Integer,
    Decimal,
    Boolean,
    /// Sent as given.
    DateTime,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> Field {
    Field { name, kind }
}

const fn text(name: &'static str) -> Field {
    field(name, FieldKind::Text(TextRule::Any))
}

#[derive(Debug)]
pub struct Schema {
    pub entity: &'static str,
    pub fields: &'static [Field],
}

pub const TOURNAMENT_TYPES: &[&str] = &[
    "single elimination",
    "double elimination",
    "round robin",
    "swiss",
];

pub const RANKINGS: &[&str] = &[
    "match wins",
    "game wins",
    "points scored",
    "points difference",
    "custom",
];

pub static TOURNAMENT: Schema = Schema {
    entity: "tournament",
    fields: &[
        field("name", FieldKind::Text(TextRule::MaxLen(60))),
        field("tournament_type", FieldKind::Text(TextRule::OneOf(TOURNAMENT_TYPES))),
        field("url", FieldKind::Text(TextRule::Slug)),
        field("subdomain", FieldKind::Text(TextRule::Slug)),
        text("description"),
        text("game_name"),
        field("ranked_by", FieldKind::Text(TextRule::OneOf(RANKINGS))),
        text("grand_finals_modifier"),
        field("open_signup", FieldKind::Boolean),
        field("hold_third_place_match", FieldKind::Boolean),
        field("accept_attachments", FieldKind::Boolean),
        field("hide_forum", FieldKind::Boolean),
        field("show_rounds", FieldKind::Boolean),
        field("private", FieldKind::Boolean),
        field("notify_users_when_matches_open", FieldKind::Boolean),
        field("notify_users_when_the_tournament_ends", FieldKind::Boolean),
        field("sequential_pairings", FieldKind::Boolean),
        field("quick_advance", FieldKind::Boolean),
        field("hide_seeds", FieldKind::Boolean),
        field("pts_for_match_win", FieldKind::Decimal),
        field("pts_for_match_tie", FieldKind::Decimal),
        field("pts_for_game_win", FieldKind::Decimal),
        field("pts_for_game_tie", FieldKind::Decimal),
        field("pts_for_bye", FieldKind::Decimal),
        field("rr_pts_for_match_win", FieldKind::Decimal),
        field("rr_pts_for_match_tie", FieldKind::Decimal),
        field("rr_pts_for_game_win", FieldKind::Decimal),
        field("rr_pts_for_game_tie", FieldKind::Decimal),
        field("swiss_rounds", FieldKind::Integer),
        field("signup_cap", FieldKind::Integer),
        field("check_in_duration", FieldKind::Integer),
        field("start_at", FieldKind::DateTime),
    ],
};

pub static PARTICIPANT: Schema = Schema {
    entity: "participant",
    fields: &[
        text("name"),
        text("challonge_username"),
        text("email"),
        text("invite_name_or_email"),
        text("misc"),
        field("seed", FieldKind::Integer),
    ],
};

pub static ATTACHMENT: Schema = Schema {
    entity: "match_attachment",
    fields: &[text("url"), text("description")],
};

/// Optional fields of a match update; `scores_csv` is handled by [`validate_match`].
pub static MATCH_VOTES: Schema = Schema {
    entity: "match",
    fields: &[
        field("player1_votes", FieldKind::Integer),
        field("player2_votes", FieldKind::Integer),
    ],
};

impl Schema {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the fields to send, with decimals normalized.
    pub fn validate(&self, args: &Value) -> Result<Snapshot, Error> {
        let args = as_mapping(args)?;
        let mut accepted = Snapshot::new();

        for (name, value) in args {
            match self.field(name) {
                Some(field) => {
                    accepted.insert(name.clone(), field.check(value)?);
                }
                None => {
                    warn!(entity = self.entity, field = %name, "dropping unrecognized field");
                }
            }
        }

        Ok(accepted)
    }
}

impl Field {
    fn check(&self, value: &Value) -> Result<Value, Error> {
        let text = scalar_text(value)
            .ok_or_else(|| Error::validation(self.name, "expected a scalar value"))?;

        match self.kind {
            FieldKind::Text(rule) => {
                self.check_text(rule, &text)?;
                Ok(value.clone())
            }
            FieldKind::Integer => {
                if !is_digits(&text) {
                    return Err(Error::validation(
                        self.name,
                        format!("`{text}` is not a non-negative integer"),
                    ));
                }
                Ok(value.clone())
            }
            FieldKind::Decimal => normalize_decimal(&text)
                .map(Value::String)
                .ok_or_else(|| {
                    Error::validation(self.name, format!("`{text}` is not a decimal number"))
                }),
            FieldKind::Boolean => {
                if text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("false") {
                    Ok(value.clone())
                } else {
                    Err(Error::validation(
                        self.name,
                        format!("`{text}` is not true or false"),
                    ))
                }
            }
            FieldKind::DateTime => Ok(value.clone()),
        }
    }

    fn check_text(&self, rule: TextRule, text: &str) -> Result<(), Error> {
        match rule {
            TextRule::Any => Ok(()),
            TextRule::MaxLen(max) => {
                let len = text.chars().count();
                if len > max {
                    return Err(Error::validation(
                        self.name,
                        format!("is {len} characters long, the limit is {max}"),
                    ));
                }
                Ok(())
            }
            TextRule::OneOf(allowed) => {
                if allowed.iter().any(|a| a.eq_ignore_ascii_case(text)) {
                    Ok(())
                } else {
                    Err(Error::validation(
                        self.name,
                        format!("`{text}` is not one of: {}", allowed.join(", ")),
                    ))
                }
            }
            TextRule::Slug => {
                if text.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    Ok(())
                } else {
                    Err(Error::validation(
                        self.name,
                        format!("`{text}` may only contain letters, numbers and underscores"),
                    ))
                }
            }
        }
    }
}

/// A validated match update.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchUpdate {
    /// The games exactly as supplied, comma-joined.
    pub scores_csv: String,
    pub scores: Vec<Score>,
    pub votes: Snapshot,
}

/// Accepts either a bare list of `x-y` strings or a mapping holding
/// `scores_csv` and optional vote counts. `winner_id` may not be supplied;
/// it is always derived from the scores.
pub fn validate_match(args: &Value) -> Result<MatchUpdate, Error> {
    match args {
        Value::Array(games) => match_update(string_list(games)?, Snapshot::new()),
        Value::Object(map) => {
            if map.contains_key("winner_id") {
                return Err(Error::validation(
                    "winner_id",
                    "is derived from scores_csv and cannot be set directly",
                ));
            }
            let games = match map.get("scores_csv") {
                Some(Value::String(csv)) => split_csv(csv),
                Some(Value::Array(games)) => string_list(games)?,
                Some(_) => {
                    return Err(Error::validation("scores_csv", "expected a list of strings"))
                }
                None => return Err(Error::validation("scores_csv", "is required")),
            };
            match_update(games, votes(map)?)
        }
        other => Err(Error::NotAMapping {
            found: json_type(other),
        }),
    }
}

fn votes(map: &Snapshot) -> Result<Snapshot, Error> {
    let mut rest = map.clone();
    rest.remove("scores_csv");
    MATCH_VOTES.validate(&Value::Object(rest))
}

fn string_list(games: &[Value]) -> Result<Vec<String>, Error> {
    games
        .iter()
        .map(|game| match game {
            Value::String(s) => Ok(s.clone()),
            _ => Err(Error::validation("scores_csv", "expected a list of strings")),
        })
        .collect()
}

fn split_csv(csv: &str) -> Vec<String> {
    if csv.is_empty() {
        Vec::new()
    } else {
        csv.split(',').map(String::from).collect()
    }
}

fn match_update(games: Vec<String>, votes: Snapshot) -> Result<MatchUpdate, Error> {
    let scores = games
        .iter()
        .map(|game| game.parse())
        .collect::<Result<Vec<Score>, _>>()?;
    Ok(MatchUpdate {
        scores_csv: games.join(","),
        scores,
        votes,
    })
}

fn as_mapping(args: &Value) -> Result<&Snapshot, Error> {
    args.as_object().ok_or(Error::NotAMapping {
        found: json_type(args),
    })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

fn scalar_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s)),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
        Value::Null => Some(Cow::Borrowed("")),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn is_digits(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_digit())
}

/// `^\d*\.?\d*$`, rendered with exactly one decimal place. Works on the
/// digits themselves, rounding half up (`2.25` → `2.3`). Empty stays empty.
fn normalize_decimal(s: &str) -> Option<String> {
    if s.is_empty() {
        return Some(String::new());
    }
    let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));
    if !is_digits(whole) || !is_digits(fraction) || (whole.is_empty() && fraction.is_empty()) {
        return None;
    }

    let whole = if whole.is_empty() { "0" } else { whole };
    let tenths = fraction.get(..1).unwrap_or("0");
    let mut digits: Vec<u8> = format!("{whole}{tenths}").into_bytes();
    if fraction.as_bytes().get(1).is_some_and(|&d| d >= b'5') {
        round_up(&mut digits);
    }

    let digits: String = digits.into_iter().map(char::from).collect();
    let (whole, tenths) = digits.split_at(digits.len() - 1);
    Some(format!("{whole}.{tenths}"))
}

fn round_up(digits: &mut Vec<u8>) {
    for digit in digits.iter_mut().rev() {
        if *digit == b'9' {
            *digit = b'0';
        } else {
            *digit += 1;
            return;
        }
    }
    digits.insert(0, b'1');
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::testing::capture_logs;

    fn rejected_field(result: Result<Snapshot, Error>) -> String {
        match result {
            Err(Error::Validation { field, .. }) => field,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_tournament_accepts_known_fields() {
        let args = json!({
            "name": "Friday Night",
            "tournament_type": "Double Elimination",
            "url": "friday_night_42",
            "ranked_by": "POINTS SCORED",
            "open_signup": "TRUE",
            "hold_third_place_match": false,
            "swiss_rounds": "3",
            "signup_cap": 16,
            "check_in_duration": "",
            "start_at": "next tuesday",
        });
        let accepted = TOURNAMENT.validate(&args).unwrap();
        assert_eq!(accepted.len(), 10);
        assert_eq!(accepted["tournament_type"], "Double Elimination");
        assert_eq!(accepted["signup_cap"], 16);
        assert_eq!(accepted["start_at"], "next tuesday");
    }

    #[test]
    fn test_tournament_rejects_bad_values() {
        let long_name = "x".repeat(61);
        let cases = [
            (json!({"tournament_type": "triple elimination"}), "tournament_type"),
            (json!({"name": long_name}), "name"),
            (json!({"url": "has-dash"}), "url"),
            (json!({"subdomain": "has space"}), "subdomain"),
            (json!({"ranked_by": "vibes"}), "ranked_by"),
            (json!({"swiss_rounds": "3.5"}), "swiss_rounds"),
            (json!({"signup_cap": -4}), "signup_cap"),
            (json!({"pts_for_bye": "1.2.3"}), "pts_for_bye"),
            (json!({"pts_for_bye": "."}), "pts_for_bye"),
            (json!({"private": "yes"}), "private"),
            (json!({"description": ["a", "b"]}), "description"),
        ];
        for (args, field) in cases {
            assert_eq!(rejected_field(TOURNAMENT.validate(&args)), field);
        }
    }

    #[test]
    fn test_name_limit_counts_characters() {
        let name = "é".repeat(60);
        assert!(TOURNAMENT.validate(&json!({ "name": name })).is_ok());
    }

    #[test]
    fn test_unknown_fields_are_dropped() {
        let args = json!({"name": "Cup", "favourite_colour": "green", "seed": 3});
        let (accepted, logs) = capture_logs(|| TOURNAMENT.validate(&args));
        let accepted = accepted.unwrap();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted["name"], "Cup");

        let warnings: Vec<&str> = logs
            .lines()
            .filter(|line| line.contains("WARN") && line.contains("dropping unrecognized field"))
            .collect();
        assert_eq!(warnings.len(), 2);
        assert_eq!(
            warnings
                .iter()
                .filter(|line| line.contains("field=favourite_colour"))
                .count(),
            1
        );
        assert!(warnings.iter().all(|line| line.contains("entity=\"tournament\"")));
    }

    #[test]
    fn test_known_fields_log_nothing() {
        let (accepted, logs) = capture_logs(|| PARTICIPANT.validate(&json!({"name": "Alice"})));
        assert_eq!(accepted.unwrap().len(), 1);
        assert!(logs.is_empty(), "unexpected output: {logs}");
    }

    #[test]
    fn test_decimals_are_normalized() {
        let args = json!({
            "pts_for_match_win": 3,
            "pts_for_match_tie": "0.5",
            "pts_for_game_win": "2.",
            "pts_for_game_tie": ".5",
            "pts_for_bye": "",
        });
        let accepted = TOURNAMENT.validate(&args).unwrap();
        assert_eq!(accepted["pts_for_match_win"], "3.0");
        assert_eq!(accepted["pts_for_match_tie"], "0.5");
        assert_eq!(accepted["pts_for_game_win"], "2.0");
        assert_eq!(accepted["pts_for_game_tie"], "0.5");
        assert_eq!(accepted["pts_for_bye"], "");
    }

    #[test]
    fn test_decimals_round_on_their_digits() {
        let args = json!({
            "pts_for_bye": "12345678901234567890",
            "pts_for_match_win": "2.25",
            "pts_for_match_tie": "2.249",
            "pts_for_game_win": "0.125",
            "pts_for_game_tie": "9.95",
            "rr_pts_for_match_win": 1.5,
            "rr_pts_for_game_win": "99999999999999999999.99",
        });
        let accepted = TOURNAMENT.validate(&args).unwrap();
        assert_eq!(accepted["pts_for_bye"], "12345678901234567890.0");
        assert_eq!(accepted["pts_for_match_win"], "2.3");
        assert_eq!(accepted["pts_for_match_tie"], "2.2");
        assert_eq!(accepted["pts_for_game_win"], "0.1");
        assert_eq!(accepted["pts_for_game_tie"], "10.0");
        assert_eq!(accepted["rr_pts_for_match_win"], "1.5");
        assert_eq!(accepted["rr_pts_for_game_win"], "100000000000000000000.0");
    }

    #[test]
    fn test_requires_mapping() {
        assert!(matches!(
            TOURNAMENT.validate(&json!(["name", "Cup"])),
            Err(Error::NotAMapping { found: "a list" })
        ));
        assert!(matches!(
            PARTICIPANT.validate(&json!("Alice")),
            Err(Error::NotAMapping { found: "a string" })
        ));
    }

    #[test]
    fn test_participant_schema() {
        let accepted = PARTICIPANT
            .validate(&json!({"name": "Alice", "seed": "2", "email": "a@example.com"}))
            .unwrap();
        assert_eq!(accepted.len(), 3);
        assert_eq!(
            rejected_field(PARTICIPANT.validate(&json!({"seed": "first"}))),
            "seed"
        );
    }

    #[test]
    fn test_attachment_url_is_free_text() {
        let accepted = ATTACHMENT
            .validate(&json!({"url": "https://example.com/vod?t=1"}))
            .unwrap();
        assert_eq!(accepted["url"], "https://example.com/vod?t=1");
    }

    #[test]
    fn test_match_from_list() {
        let update = validate_match(&json!(["3-1", "3-2", "1-3"])).unwrap();
        assert_eq!(update.scores_csv, "3-1,3-2,1-3");
        assert_eq!(update.scores.len(), 3);
        assert!(update.votes.is_empty());
    }

    #[test]
    fn test_match_from_mapping() {
        let update = validate_match(&json!({
            "scores_csv": ["1-0"],
            "player1_votes": "2",
            "player2_votes": 1,
            "round": 4,
        }))
        .unwrap();
        assert_eq!(update.scores_csv, "1-0");
        assert_eq!(update.votes.len(), 2);
        assert_eq!(update.votes["player1_votes"], "2");

        let update = validate_match(&json!({"scores_csv": "2-1,0-2"})).unwrap();
        assert_eq!(update.scores.len(), 2);
        assert_eq!(update.scores_csv, "2-1,0-2");

        let update = validate_match(&json!({"scores_csv": ""})).unwrap();
        assert!(update.scores.is_empty());
    }

    #[test]
    fn test_match_rejections() {
        let field = |args: Value| match validate_match(&args) {
            Err(Error::Validation { field, .. }) => field,
            other => panic!("expected a validation error, got {other:?}"),
        };
        assert_eq!(field(json!(["3-1", "three-one"])), "scores_csv");
        assert_eq!(field(json!([3, 1])), "scores_csv");
        assert_eq!(field(json!({"player1_votes": 1})), "scores_csv");
        assert_eq!(
            field(json!({"scores_csv": ["1-0"], "winner_id": 12})),
            "winner_id"
        );
        assert_eq!(
            field(json!({"scores_csv": ["1-0"], "player2_votes": "many"})),
            "player2_votes"
        );
        assert!(matches!(
            validate_match(&json!(42)),
            Err(Error::NotAMapping { .. })
        ));
    }
}
