//! Core type definitions for Chroma outcomes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

use crate::{ChromaError, Result};

/// A validated outcome digit (0-9)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Digit(u8);

impl Digit {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 9;

    /// Validate a raw integer into a digit
    pub fn new(value: i64) -> Result<Self> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ChromaError::InvalidOutcomeValue(value))
        }
    }

    /// Parse a user-entered token ("7", " 3 ")
    pub fn parse(token: &str) -> Result<Self> {
        let trimmed = token.trim();
        let value: i64 = trimmed
            .parse()
            .map_err(|_| ChromaError::NonNumericOutcome(trimmed.to_string()))?;
        Self::new(value)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Derived color, recomputed on every call
    pub fn color(self) -> Color {
        match self.0 {
            0 => Color::RedPurple,
            5 => Color::GreenPurple,
            v if v % 2 == 0 => Color::Red,
            _ => Color::Green,
        }
    }

    /// Derived size, recomputed on every call
    pub fn size(self) -> Size {
        if self.0 >= 5 {
            Size::Big
        } else {
            Size::Small
        }
    }

    /// All ten digits in ascending order
    pub fn all() -> impl Iterator<Item = Digit> {
        (Self::MIN..=Self::MAX).map(Digit)
    }
}

impl TryFrom<u8> for Digit {
    type Error = ChromaError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(i64::from(value))
    }
}

impl From<Digit> for u8 {
    fn from(digit: Digit) -> Self {
        digit.0
    }
}

impl fmt::Display for Digit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome color
///
/// 0 and 5 carry a dual purple label; every projection treats them as
/// their base color (0 is red, 5 is green).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Red,
    Green,
    RedPurple,
    GreenPurple,
}

impl Color {
    /// Strip the purple label
    pub fn base(self) -> Color {
        match self {
            Self::Red | Self::RedPurple => Self::Red,
            Self::Green | Self::GreenPurple => Self::Green,
        }
    }

    pub fn is_dual(self) -> bool {
        matches!(self, Self::RedPurple | Self::GreenPurple)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Red => write!(f, "red"),
            Self::Green => write!(f, "green"),
            Self::RedPurple => write!(f, "red+purple"),
            Self::GreenPurple => write!(f, "green+purple"),
        }
    }
}

impl std::str::FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "red" | "r" => Ok(Self::Red),
            "green" | "g" => Ok(Self::Green),
            "red+purple" | "red_purple" => Ok(Self::RedPurple),
            "green+purple" | "green_purple" => Ok(Self::GreenPurple),
            _ => Err(format!("Invalid color: {}", s)),
        }
    }
}

/// Outcome size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Small,
    Big,
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Small => write!(f, "small"),
            Self::Big => write!(f, "big"),
        }
    }
}

impl std::str::FromStr for Size {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "small" | "s" => Ok(Self::Small),
            "big" | "b" => Ok(Self::Big),
            _ => Err(format!("Invalid size: {}", s)),
        }
    }
}

/// Derived attributes of a digit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub color: Color,
    pub size: Size,
}

/// Classify a raw value. Total over 0-9, fails for anything else.
pub fn classify(value: i64) -> Result<Classification> {
    let digit = Digit::new(value)?;
    Ok(Classification {
        color: digit.color(),
        size: digit.size(),
    })
}

/// Opaque ordering token attached to each outcome
///
/// Typically a zero-padded sequence number such as `"20240101001"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(String);

impl Period {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// First token of a fresh session
    pub fn initial() -> Self {
        Self::new("00001")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Next token in sequence
    ///
    /// Increments the trailing digit run, keeping its zero padding
    /// (`"007"` -> `"008"`, `"A-099"` -> `"A-100"`, `"999"` -> `"1000"`).
    /// A token without trailing digits gets `"1"` appended.
    pub fn successor(&self) -> Self {
        let bytes = self.0.as_bytes();
        let run_start = bytes
            .iter()
            .rposition(|b| !b.is_ascii_digit())
            .map(|i| i + 1)
            .unwrap_or(0);

        if run_start == bytes.len() {
            return Self(format!("{}1", self.0));
        }

        let mut digits: Vec<u8> = bytes[run_start..].to_vec();
        let mut carry = true;
        for d in digits.iter_mut().rev() {
            if !carry {
                break;
            }
            if *d == b'9' {
                *d = b'0';
            } else {
                *d += 1;
                carry = false;
            }
        }
        if carry {
            digits.insert(0, b'1');
        }

        let mut next = self.0[..run_start].to_string();
        // Only ASCII digits were written back
        next.extend(digits.into_iter().map(char::from));
        Self(next)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One submitted data point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub value: Digit,
    pub period: Period,
}

impl Outcome {
    pub fn new(value: Digit, period: Period) -> Self {
        Self { value, period }
    }

    pub fn color(&self) -> Color {
        self.value.color()
    }

    pub fn size(&self) -> Size {
        self.value.size()
    }
}

/// A label space that outcomes can be projected into
///
/// Detectors and the transition model are generic over this trait so the
/// same rule runs on colors, sizes and raw digits.
pub trait Symbol: Copy + Eq + Hash + fmt::Debug + fmt::Display {
    /// Project a digit into this label space
    fn project(digit: Digit) -> Self;

    /// Other side of a two-valued label space; `None` for many-valued spaces
    fn opposite(self) -> Option<Self>;

    /// Canonical `(first, second)` ordering of a binary label space
    fn pair() -> Option<[Self; 2]>;

    /// Whether `digit` projects onto this label
    fn admits(self, digit: Digit) -> bool {
        Self::project(digit) == self
    }

    /// Digits consistent with this label, ascending
    fn digits(self) -> Vec<Digit> {
        Digit::all().filter(|d| self.admits(*d)).collect()
    }
}

impl Symbol for Color {
    fn project(digit: Digit) -> Self {
        digit.color().base()
    }

    fn opposite(self) -> Option<Self> {
        match self.base() {
            Self::Red => Some(Self::Green),
            _ => Some(Self::Red),
        }
    }

    fn pair() -> Option<[Self; 2]> {
        Some([Self::Red, Self::Green])
    }

    fn admits(self, digit: Digit) -> bool {
        digit.color().base() == self.base()
    }
}

impl Symbol for Size {
    fn project(digit: Digit) -> Self {
        digit.size()
    }

    fn opposite(self) -> Option<Self> {
        match self {
            Self::Small => Some(Self::Big),
            Self::Big => Some(Self::Small),
        }
    }

    fn pair() -> Option<[Self; 2]> {
        Some([Self::Small, Self::Big])
    }
}

impl Symbol for Digit {
    fn project(digit: Digit) -> Self {
        digit
    }

    fn opposite(self) -> Option<Self> {
        None
    }

    fn pair() -> Option<[Self; 2]> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_is_total_over_digits() {
        for v in 0..=9 {
            let c = classify(v).unwrap();
            assert_eq!(c.size, if v >= 5 { Size::Big } else { Size::Small });
            assert_eq!(
                c.color.base(),
                if v % 2 == 0 { Color::Red } else { Color::Green }
            );
        }
    }

    #[test]
    fn test_classify_dual_labels() {
        assert_eq!(classify(0).unwrap().color, Color::RedPurple);
        assert_eq!(classify(5).unwrap().color, Color::GreenPurple);
        for v in [2, 4, 6, 8] {
            assert_eq!(classify(v).unwrap().color, Color::Red);
        }
        for v in [1, 3, 7, 9] {
            assert_eq!(classify(v).unwrap().color, Color::Green);
        }
    }

    #[test]
    fn test_classify_rejects_out_of_range() {
        assert!(matches!(
            classify(10),
            Err(ChromaError::InvalidOutcomeValue(10))
        ));
        assert!(matches!(
            classify(-1),
            Err(ChromaError::InvalidOutcomeValue(-1))
        ));
    }

    #[test]
    fn test_digit_parse() {
        assert_eq!(Digit::parse(" 7 ").unwrap().value(), 7);
        assert!(matches!(
            Digit::parse("x"),
            Err(ChromaError::NonNumericOutcome(_))
        ));
        assert!(matches!(
            Digit::parse("12"),
            Err(ChromaError::InvalidOutcomeValue(12))
        ));
        assert!(Digit::parse("x").unwrap_err().is_rejected_input());
    }

    #[test]
    fn test_digit_serde_rejects_out_of_range() {
        let digit: Digit = serde_json::from_str("4").unwrap();
        assert_eq!(digit.value(), 4);
        assert!(serde_json::from_str::<Digit>("11").is_err());
    }

    #[test]
    fn test_period_successor() {
        assert_eq!(Period::new("007").successor().as_str(), "008");
        assert_eq!(Period::new("A-099").successor().as_str(), "A-100");
        assert_eq!(Period::new("999").successor().as_str(), "1000");
        assert_eq!(Period::new("round").successor().as_str(), "round1");
        assert_eq!(Period::initial().successor().as_str(), "00002");
    }

    #[test]
    fn test_symbol_digits() {
        let reds: Vec<u8> = Color::Red.digits().into_iter().map(Digit::value).collect();
        assert_eq!(reds, vec![0, 2, 4, 6, 8]);
        let greens: Vec<u8> = Color::GreenPurple
            .digits()
            .into_iter()
            .map(Digit::value)
            .collect();
        assert_eq!(greens, vec![1, 3, 5, 7, 9]);
        let big: Vec<u8> = Size::Big.digits().into_iter().map(Digit::value).collect();
        assert_eq!(big, vec![5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_symbol_opposites() {
        assert_eq!(Color::RedPurple.opposite(), Some(Color::Green));
        assert_eq!(Size::Big.opposite(), Some(Size::Small));
        assert_eq!(Digit::new(3).unwrap().opposite(), None);
    }

    #[test]
    fn test_color_from_str() {
        assert_eq!("RED".parse::<Color>().unwrap(), Color::Red);
        assert_eq!("green+purple".parse::<Color>().unwrap(), Color::GreenPurple);
        assert!("blue".parse::<Color>().is_err());
    }
}
