use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// One stored row, keyed by column name in stored column order.
pub type Row = Map<String, Value>;

/// The three collections the service exposes, one table each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Game,
    Player,
    Tournament,
}

impl Entity {
    pub fn table(self) -> &'static str {
        match self {
            Entity::Game => "games",
            Entity::Player => "players",
            Entity::Tournament => "tournaments",
        }
    }

    /// Key the rows are wrapped under in a response body.
    pub fn plural(self) -> &'static str {
        // Table names double as envelope keys.
        self.table()
    }
}

/// `{ "<plural>": [rows...] }`
#[derive(Debug)]
pub struct Envelope {
    pub key: &'static str,
    pub rows: Vec<Row>,
}

impl Envelope {
    pub fn new(entity: Entity, rows: Vec<Row>) -> Self {
        Self {
            key: entity.plural(),
            rows,
        }
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.key, &self.rows)?;
        map.end()
    }
}

/// Integer path parameter parsed the forgiving way: leading whitespace, an
/// optional sign, an optional `0x`/`0X` prefix, then as many digits of that
/// radix as are present. Anything after the digits is ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LenientInt {
    Int(i64),
    /// Too large for i64; kept as the nearest double.
    Float(f64),
    /// No digits at all. Binds as NULL and therefore never matches a row.
    NaN,
}

impl LenientInt {
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim_start();
        let (negative, rest) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let (radix, rest) = match rest.get(..2) {
            Some("0x" | "0X") => (16, &rest[2..]),
            _ => (10, rest),
        };

        let digits_len = rest
            .chars()
            .take_while(|c| c.is_digit(radix))
            .count();
        if digits_len == 0 {
            return Self::NaN;
        }

        let digits = &rest[..digits_len];
        match i64::from_str_radix(digits, radix) {
            Ok(n) => Self::Int(if negative { -n } else { n }),
            Err(_) => {
                let magnitude = digits
                    .chars()
                    .filter_map(|c| c.to_digit(radix))
                    .fold(0.0_f64, |acc, d| acc * f64::from(radix) + f64::from(d));
                let magnitude = if radix == 10 {
                    // Correctly rounded, unlike the running fold.
                    digits.parse::<f64>().unwrap_or(magnitude)
                } else {
                    magnitude
                };
                Self::Float(if negative { -magnitude } else { magnitude })
            }
        }
    }
}

impl fmt::Display for LenientInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => f.write_str(&whole_double_to_string(x)),
            Self::NaN => f.write_str("NaN"),
        }
    }
}

/// Renders a whole double with the shortest round-trip digits, zero padded
/// below 1e21 and in `d.ddde+N` form from there on.
fn whole_double_to_string(x: f64) -> String {
    if x.is_infinite() {
        return if x > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let sign = if x < 0.0 { "-" } else { "" };
    let sci = format!("{:e}", x.abs());
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return x.to_string();
    };
    let Ok(exp) = exp.parse::<usize>() else {
        return x.to_string();
    };

    if exp < 21 {
        let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
        let zeros = (exp + 1).saturating_sub(digits.len());
        format!("{sign}{digits}{}", "0".repeat(zeros))
    } else {
        format!("{sign}{mantissa}e+{exp}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_wraps_rows_under_plural_key() {
        let mut row = Row::new();
        row.insert("id".into(), json!(1));
        row.insert("prizePool".into(), json!(5000));

        let body = serde_json::to_value(Envelope::new(Entity::Tournament, vec![row])).unwrap();

        assert_eq!(body, json!({ "tournaments": [{ "id": 1, "prizePool": 5000 }] }));
    }

    #[test]
    fn empty_envelope_still_has_key() {
        let body = serde_json::to_string(&Envelope::new(Entity::Player, vec![])).unwrap();
        assert_eq!(body, r#"{"players":[]}"#);
    }

    #[test]
    fn lenient_int_reads_leading_digits() {
        assert_eq!(LenientInt::parse("42"), LenientInt::Int(42));
        assert_eq!(LenientInt::parse("  7"), LenientInt::Int(7));
        assert_eq!(LenientInt::parse("-3"), LenientInt::Int(-3));
        assert_eq!(LenientInt::parse("+3"), LenientInt::Int(3));
        assert_eq!(LenientInt::parse("12abc"), LenientInt::Int(12));
        assert_eq!(LenientInt::parse("1.9"), LenientInt::Int(1));
        assert_eq!(LenientInt::parse("-0").to_string(), "0");
    }

    #[test]
    fn lenient_int_reads_hex_prefix() {
        assert_eq!(LenientInt::parse("0x1"), LenientInt::Int(1));
        assert_eq!(LenientInt::parse("0x10"), LenientInt::Int(16));
        assert_eq!(LenientInt::parse("0X1f"), LenientInt::Int(31));
        assert_eq!(LenientInt::parse(" -0x10"), LenientInt::Int(-16));
        assert_eq!(LenientInt::parse("0x1g"), LenientInt::Int(1));
        assert_eq!(LenientInt::parse("0x"), LenientInt::NaN);
        assert_eq!(LenientInt::parse("0xg"), LenientInt::NaN);
    }

    #[test]
    fn lenient_int_without_digits_is_nan() {
        for raw in ["abc", "", "-", " x1", "--1"] {
            let parsed = LenientInt::parse(raw);
            assert_eq!(parsed, LenientInt::NaN, "{raw:?}");
            assert_eq!(parsed.to_string(), "NaN");
        }
    }

    #[test]
    fn lenient_int_overflow_keeps_the_number() {
        let parsed = LenientInt::parse("99999999999999999999");
        assert_eq!(parsed, LenientInt::Float(1e20));
        assert_eq!(parsed.to_string(), "100000000000000000000");

        assert_eq!(LenientInt::parse("9223372036854775807"), LenientInt::Int(i64::MAX));
        assert_eq!(LenientInt::parse("9223372036854775808").to_string(), "9223372036854776000");
        assert_eq!(LenientInt::parse("-9223372036854775809").to_string(), "-9223372036854776000");
        assert_eq!(LenientInt::parse(&format!("1{}", "0".repeat(29))).to_string(), "1e+29");
        assert_eq!(LenientInt::parse("0xffffffffffffffffffff").to_string(), "1.2089258196146292e+24");
        assert_eq!(LenientInt::parse(&"9".repeat(400)).to_string(), "Infinity");
    }
}
