//! Feature location expressions
//!
//! A location is a small tree: leaves are single positions or ranges, and
//! `complement`, `join`, `order` and `bond` nodes combine them. Locations on
//! another entry are written `ACCESSION.version:location`.
//!
//! ```text
//! location      := operator '(' location_list ')' | accession ':' location | range | point
//! operator      := "join" | "order" | "complement" | "bond"
//! location_list := location (',' location)*
//! range         := coordinate separator coordinate
//! point         := coordinate
//! coordinate    := ['<' | '>'] digits
//! separator     := ".." | "^" | "."
//! ```
//!
//! Whitespace is ignored, so locations continued over several feature
//! table lines parse as one. Printing produces the canonical form without
//! whitespace.

use std::cmp::Ordering;
use std::fmt;
use std::slice;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::modules::io::error::{ParseError, ParseResult};

/// Fuzzy marker on a coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PositionMarker {
    /// `<`: the feature starts before this position
    Before,
    /// `>`: the feature ends after this position
    After,
}

impl PositionMarker {
    pub fn as_str(self) -> &'static str {
        match self {
            PositionMarker::Before => "<",
            PositionMarker::After => ">",
        }
    }

    /// Parse marker text; the empty string means "no marker"
    pub fn parse_data(data: &str) -> ParseResult<Option<Self>> {
        match data.trim() {
            "" => Ok(None),
            "<" => Ok(Some(PositionMarker::Before)),
            ">" => Ok(Some(PositionMarker::After)),
            other => Err(ParseError::LocationFormat {
                text: other.to_string(),
                reason: "position data must be '<', '>' or empty".to_string(),
            }),
        }
    }
}

/// A 1-based coordinate with an optional fuzzy marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub value: usize,
    pub marker: Option<PositionMarker>,
}

impl Position {
    pub fn exact(value: usize) -> Self {
        Self { value, marker: None }
    }

    pub fn before(value: usize) -> Self {
        Self {
            value,
            marker: Some(PositionMarker::Before),
        }
    }

    pub fn after(value: usize) -> Self {
        Self {
            value,
            marker: Some(PositionMarker::After),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(marker) = self.marker {
            f.write_str(marker.as_str())?;
        }
        write!(f, "{}", self.value)
    }
}

/// Separator between the two coordinates of a range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Separator {
    /// `..`: every base from start to end
    Range,
    /// `^`: the site between two bases
    Between,
    /// `.`: a single unknown base within the span
    Within,
}

impl Separator {
    pub fn as_str(self) -> &'static str {
        match self {
            Separator::Range => "..",
            Separator::Between => "^",
            Separator::Within => ".",
        }
    }
}

/// Operator of a location node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LocationOperator {
    None,
    Complement,
    Join,
    Order,
    Bond,
}

/// A feature location tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Point(Position),
    Range {
        start: Position,
        end: Position,
        separator: Separator,
    },
    Complement(Box<Location>),
    Join(Vec<Location>),
    Order(Vec<Location>),
    Bond(Vec<Location>),
    External {
        accession: String,
        location: Box<Location>,
    },
}

impl Location {
    /// Parse a location expression
    pub fn parse(text: &str) -> ParseResult<Self> {
        LocationParser::new(text).parse()
    }

    /// Exact range `start..end`
    pub fn range(start: usize, end: usize) -> Self {
        Location::Range {
            start: Position::exact(start),
            end: Position::exact(end),
            separator: Separator::Range,
        }
    }

    pub fn point(value: usize) -> Self {
        Location::Point(Position::exact(value))
    }

    pub fn complement(inner: Location) -> Self {
        Location::Complement(Box::new(inner))
    }

    pub fn operator(&self) -> LocationOperator {
        match self {
            Location::Point(_) | Location::Range { .. } => LocationOperator::None,
            Location::Complement(_) => LocationOperator::Complement,
            Location::Join(_) => LocationOperator::Join,
            Location::Order(_) => LocationOperator::Order,
            Location::Bond(_) => LocationOperator::Bond,
            Location::External { location, .. } => location.operator(),
        }
    }

    /// Separator of a range leaf
    pub fn separator(&self) -> Option<Separator> {
        match self {
            Location::Range { separator, .. } => Some(*separator),
            _ => None,
        }
    }

    /// Accession of a location on another entry
    pub fn accession(&self) -> Option<&str> {
        match self {
            Location::External { accession, .. } => Some(accession),
            _ => None,
        }
    }

    /// Direct children of an operator node
    pub fn sub_locations(&self) -> &[Location] {
        match self {
            Location::Point(_) | Location::Range { .. } => &[],
            Location::Complement(inner) | Location::External { location: inner, .. } => {
                slice::from_ref(inner.as_ref())
            }
            Location::Join(children) | Location::Order(children) | Location::Bond(children) => children,
        }
    }

    /// Whether this node is a point or a range
    pub fn is_leaf(&self) -> bool {
        matches!(self, Location::Point(_) | Location::Range { .. })
    }

    pub(super) fn leaf_bounds(&self) -> Option<(&Position, &Position)> {
        match self {
            Location::Point(p) => Some((p, p)),
            Location::Range { start, end, .. } => Some((start, end)),
            _ => None,
        }
    }

    /// Leftmost coordinate over all leaves
    pub fn start(&self) -> usize {
        self.leaf_locations()
            .iter()
            .filter_map(|leaf| leaf.leaf_bounds())
            .map(|(start, _)| start.value)
            .min()
            .unwrap_or(0)
    }

    /// Rightmost coordinate over all leaves
    pub fn end(&self) -> usize {
        self.leaf_locations()
            .iter()
            .filter_map(|leaf| leaf.leaf_bounds())
            .map(|(_, end)| end.value)
            .max()
            .unwrap_or(0)
    }

    /// Position that determines [`Location::start`]
    pub fn start_position(&self) -> Option<Position> {
        let target = self.start();
        self.leaf_locations()
            .iter()
            .filter_map(|leaf| leaf.leaf_bounds())
            .map(|(start, _)| *start)
            .find(|start| start.value == target)
    }

    /// Position that determines [`Location::end`]
    pub fn end_position(&self) -> Option<Position> {
        let target = self.end();
        self.leaf_locations()
            .iter()
            .filter_map(|leaf| leaf.leaf_bounds())
            .map(|(_, end)| *end)
            .find(|end| end.value == target)
    }

    /// Marker text of the start position (`"<"`, `">"` or `""`)
    pub fn start_data(&self) -> &'static str {
        self.start_position()
            .and_then(|p| p.marker)
            .map_or("", PositionMarker::as_str)
    }

    /// Marker text of the end position (`"<"`, `">"` or `""`)
    pub fn end_data(&self) -> &'static str {
        self.end_position()
            .and_then(|p| p.marker)
            .map_or("", PositionMarker::as_str)
    }

    /// Replace the marker of the start position
    pub fn set_start_data(&mut self, data: &str) -> ParseResult<()> {
        let marker = PositionMarker::parse_data(data)?;
        let target = self.start();
        let position = self
            .find_position_mut(target, true)
            .ok_or_else(|| ParseError::UnsupportedOperation("location has no leaves".to_string()))?;
        position.marker = marker;
        Ok(())
    }

    /// Replace the marker of the end position
    pub fn set_end_data(&mut self, data: &str) -> ParseResult<()> {
        let marker = PositionMarker::parse_data(data)?;
        let target = self.end();
        let position = self
            .find_position_mut(target, false)
            .ok_or_else(|| ParseError::UnsupportedOperation("location has no leaves".to_string()))?;
        position.marker = marker;
        Ok(())
    }

    fn find_position_mut(&mut self, target: usize, want_start: bool) -> Option<&mut Position> {
        match self {
            Location::Point(p) => (p.value == target).then_some(p),
            Location::Range { start, end, .. } => {
                let position = if want_start { start } else { end };
                (position.value == target).then_some(position)
            }
            Location::Complement(inner) | Location::External { location: inner, .. } => {
                inner.find_position_mut(target, want_start)
            }
            Location::Join(children) | Location::Order(children) | Location::Bond(children) => children
                .iter_mut()
                .find_map(|child| child.find_position_mut(target, want_start)),
        }
    }

    /// Compare with an optional other location; a missing one sorts first
    pub fn compare_to(&self, other: Option<&Location>) -> Ordering {
        match other {
            Some(other) => self.cmp(other),
            None => Ordering::Greater,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Location::Point(_) => 0,
            Location::Range { .. } => 1,
            Location::Complement(_) => 2,
            Location::Join(_) => 3,
            Location::Order(_) => 4,
            Location::Bond(_) => 5,
            Location::External { .. } => 6,
        }
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start()
            .cmp(&other.start())
            .then_with(|| self.end().cmp(&other.end()))
            .then_with(|| self.rank().cmp(&other.rank()))
            .then_with(|| match (self, other) {
                (Location::Point(a), Location::Point(b)) => a.cmp(b),
                (
                    Location::Range { start, end, separator },
                    Location::Range {
                        start: other_start,
                        end: other_end,
                        separator: other_separator,
                    },
                ) => (start, end, separator).cmp(&(other_start, other_end, other_separator)),
                (Location::Complement(a), Location::Complement(b)) => a.cmp(b),
                (Location::Join(a), Location::Join(b))
                | (Location::Order(a), Location::Order(b))
                | (Location::Bond(a), Location::Bond(b)) => a.cmp(b),
                (
                    Location::External { accession, location },
                    Location::External {
                        accession: other_accession,
                        location: other_location,
                    },
                ) => (accession, location).cmp(&(other_accession, other_location)),
                // Equal ranks imply equal variants
                _ => Ordering::Equal,
            })
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn write_list(f: &mut fmt::Formatter, name: &str, children: &[Location]) -> fmt::Result {
            write!(f, "{}(", name)?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{}", child)?;
            }
            f.write_str(")")
        }

        match self {
            Location::Point(p) => write!(f, "{}", p),
            Location::Range { start, end, separator } => {
                write!(f, "{}{}{}", start, separator.as_str(), end)
            }
            Location::Complement(inner) => write!(f, "complement({})", inner),
            Location::Join(children) => write_list(f, "join", children),
            Location::Order(children) => write_list(f, "order", children),
            Location::Bond(children) => write_list(f, "bond", children),
            Location::External { accession, location } => write!(f, "{}:{}", accession, location),
        }
    }
}

impl FromStr for Location {
    type Err = ParseError;

    fn from_str(s: &str) -> ParseResult<Self> {
        Location::parse(s)
    }
}

/// Recursive-descent parser over a whitespace-free copy of the input
struct LocationParser<'a> {
    text: &'a str,
    bytes: Vec<u8>,
    pos: usize,
}

impl<'a> LocationParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.bytes().filter(|b| !b.is_ascii_whitespace()).collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> ParseError {
        ParseError::LocationFormat {
            text: self.text.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> ParseResult<()> {
        match self.peek() {
            Some(b) if b == byte => {
                self.pos += 1;
                Ok(())
            }
            Some(b) => Err(self.error(format!(
                "expected '{}' at offset {}, found '{}'",
                byte as char, self.pos, b as char
            ))),
            None => Err(self.error(format!("expected '{}' at end of input", byte as char))),
        }
    }

    fn parse(mut self) -> ParseResult<Location> {
        if self.bytes.is_empty() {
            return Err(self.error("empty location"));
        }

        let location = self.parse_location()?;
        if self.pos != self.bytes.len() {
            return Err(self.error(format!("unexpected text at offset {}", self.pos)));
        }
        Ok(location)
    }

    fn parse_location(&mut self) -> ParseResult<Location> {
        match self.peek() {
            Some(b) if b.is_ascii_alphabetic() => self.parse_named(),
            Some(_) => self.parse_range_or_point(),
            None => Err(self.error("unexpected end of input")),
        }
    }

    /// An operator call or an accession prefix
    fn parse_named(&mut self) -> ParseResult<Location> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let word = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();

        match self.peek() {
            Some(b'(') => {
                self.pos += 1;
                let children = self.parse_list()?;
                self.expect(b')')?;
                match word.as_str() {
                    "complement" => {
                        let mut children = children;
                        if children.len() != 1 {
                            return Err(self.error("complement takes exactly one location"));
                        }
                        Ok(Location::Complement(Box::new(children.remove(0))))
                    }
                    "join" => Ok(Location::Join(children)),
                    "order" => Ok(Location::Order(children)),
                    "bond" => Ok(Location::Bond(children)),
                    _ => Err(self.error(format!("unknown operator '{}'", word))),
                }
            }
            Some(b':') => {
                self.pos += 1;
                let location = self.parse_location()?;
                Ok(Location::External {
                    accession: word,
                    location: Box::new(location),
                })
            }
            _ => Err(self.error(format!("expected '(' or ':' after '{}'", word))),
        }
    }

    fn parse_list(&mut self) -> ParseResult<Vec<Location>> {
        let mut children = vec![self.parse_location()?];
        while self.peek() == Some(b',') {
            self.pos += 1;
            children.push(self.parse_location()?);
        }
        Ok(children)
    }

    fn parse_range_or_point(&mut self) -> ParseResult<Location> {
        let start = self.parse_position()?;

        let separator = match (self.peek(), self.bytes.get(self.pos + 1).copied()) {
            (Some(b'.'), Some(b'.')) => {
                self.pos += 2;
                Separator::Range
            }
            (Some(b'^'), _) => {
                self.pos += 1;
                Separator::Between
            }
            (Some(b'.'), _) => {
                self.pos += 1;
                Separator::Within
            }
            _ => return Ok(Location::Point(start)),
        };

        let end = self.parse_position()?;
        Ok(Location::Range {
            start,
            end,
            separator,
        })
    }

    fn parse_position(&mut self) -> ParseResult<Position> {
        let marker = match self.peek() {
            Some(b'<') => Some(PositionMarker::Before),
            Some(b'>') => Some(PositionMarker::After),
            _ => None,
        };
        if marker.is_some() {
            self.pos += 1;
        }

        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error(format!("expected a coordinate at offset {}", start)));
        }

        let digits = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
        let value = digits
            .parse::<usize>()
            .map_err(|_| self.error(format!("coordinate '{}' is too large", digits)))?;

        Ok(Position { value, marker })
    }
}

/// An accession-qualified span used to query features
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationRange {
    pub accession: String,
    pub start: usize,
    pub end: usize,
}

impl LocationRange {
    pub fn new(accession: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            accession: accession.into(),
            start,
            end,
        }
    }

    /// Whether any leaf of `location` overlaps this span
    pub fn overlaps(&self, location: &Location) -> bool {
        location
            .leaf_locations()
            .iter()
            .filter_map(|leaf| leaf.leaf_bounds())
            .any(|(start, end)| start.value <= self.end && end.value >= self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_simple_forms() {
        assert_eq!(Location::parse("467").unwrap(), Location::point(467));
        assert_eq!(Location::parse("340..565").unwrap(), Location::range(340, 565));
        assert_eq!(
            Location::parse("<345..>500").unwrap(),
            Location::Range {
                start: Position::before(345),
                end: Position::after(500),
                separator: Separator::Range,
            }
        );
        assert_eq!(
            Location::parse("123^124").unwrap().separator(),
            Some(Separator::Between)
        );
        assert_eq!(
            Location::parse("102.110").unwrap().separator(),
            Some(Separator::Within)
        );
    }

    #[test]
    fn test_parse_operators() {
        let location = Location::parse("join(57..89,complement(90..121))").unwrap();
        assert_eq!(location.operator(), LocationOperator::Join);
        assert_eq!(location.sub_locations().len(), 2);
        assert_eq!(location.sub_locations()[1].operator(), LocationOperator::Complement);
        assert_eq!(location.start(), 57);
        assert_eq!(location.end(), 121);

        let order = Location::parse("order(1..3,7..9)").unwrap();
        assert_eq!(order.operator(), LocationOperator::Order);
        let bond = Location::parse("bond(12,98)").unwrap();
        assert_eq!(bond.operator(), LocationOperator::Bond);
    }

    #[test]
    fn test_parse_external() {
        let location = Location::parse("J00194.1:100..202").unwrap();
        assert_eq!(location.accession(), Some("J00194.1"));
        assert_eq!(location.start(), 100);
        assert_eq!(location.to_string(), "J00194.1:100..202");

        let nested = Location::parse("join(1..10,AF123.2:complement(5..8))").unwrap();
        assert_eq!(nested.sub_locations()[1].accession(), Some("AF123.2"));
    }

    #[test]
    fn test_parse_ignores_whitespace() {
        let location = Location::parse("join(1..5,\n                     10..15)").unwrap();
        assert_eq!(location.to_string(), "join(1..5,10..15)");
    }

    #[test]
    fn test_parse_errors() {
        for bad in [
            "",
            "join(1..5",
            "join(1..5))",
            "join()",
            "splice(1..5)",
            "1..x",
            "a..b",
            "complement(1..2,3..4)",
            "1..",
            "<",
            "JOIN",
            "99999999999999999999999",
        ] {
            let err = Location::parse(bad).unwrap_err();
            assert!(
                matches!(err, ParseError::LocationFormat { .. }),
                "{} should be a format error",
                bad
            );
        }
    }

    #[test]
    fn test_display_round_trip() {
        for text in [
            "1",
            "<1",
            "1..>888",
            "<1..888",
            "10^11",
            "102.110",
            "complement(34..126)",
            "join(complement(4918..5163),complement(2691..4571))",
            "complement(join(2691..4571,4918..5163))",
            "order(1..2,5..7,complement(9..10))",
            "bond(12,98)",
            "J00194.1:100..202",
        ] {
            assert_eq!(Location::parse(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn test_start_and_end_data() {
        let mut location = Location::parse("join(<5..10,20..>30)").unwrap();
        assert_eq!(location.start_data(), "<");
        assert_eq!(location.end_data(), ">");

        location.set_end_data("").unwrap();
        location.set_start_data(">").unwrap();
        assert_eq!(location.to_string(), "join(>5..10,20..30)");
        assert!(location.set_end_data("?").is_err());

        let mut point = Location::point(7);
        point.set_start_data("<").unwrap();
        assert_eq!(point.to_string(), "<7");
    }

    #[test]
    fn test_ordering() {
        let a = Location::parse("1..10").unwrap();
        let b = Location::parse("2..5").unwrap();
        let c = Location::parse("complement(1..10)").unwrap();

        assert_eq!(a.cmp(&b), Ordering::Less);
        assert_eq!(a.cmp(&c), Ordering::Less);
        assert_eq!(a.cmp(&a.clone()), Ordering::Equal);
        assert_eq!(a.compare_to(None), Ordering::Greater);
        assert_eq!(a.compare_to(Some(&b)), Ordering::Less);

        let fuzzy = Location::parse("<1..10").unwrap();
        assert_ne!(a.cmp(&fuzzy), Ordering::Equal);
        assert_ne!(a, fuzzy);

        let mut sorted = vec![c.clone(), b.clone(), a.clone()];
        sorted.sort();
        assert_eq!(sorted, vec![a, c, b]);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = Location::parse("join(1..5,10..15)").unwrap();
        let mut copy = original.clone();
        copy.set_start_data("<").unwrap();
        assert_eq!(original.to_string(), "join(1..5,10..15)");
        assert_eq!(copy.to_string(), "join(<1..5,10..15)");
    }

    #[test]
    fn test_location_range_overlap() {
        let location = Location::parse("join(10..20,40..50)").unwrap();
        assert!(LocationRange::new("X", 15, 16).overlaps(&location));
        assert!(LocationRange::new("X", 50, 60).overlaps(&location));
        assert!(!LocationRange::new("X", 21, 39).overlaps(&location));
    }

    fn position_strategy() -> impl Strategy<Value = Position> {
        (1usize..100_000, 0u8..3).prop_map(|(value, marker)| match marker {
            0 => Position::exact(value),
            1 => Position::before(value),
            _ => Position::after(value),
        })
    }

    fn location_strategy() -> impl Strategy<Value = Location> {
        let separator = prop_oneof![
            Just(Separator::Range),
            Just(Separator::Between),
            Just(Separator::Within),
        ];
        let leaf = prop_oneof![
            position_strategy().prop_map(Location::Point),
            (position_strategy(), position_strategy(), separator).prop_map(
                |(start, end, separator)| Location::Range {
                    start,
                    end,
                    separator,
                }
            ),
        ];
        leaf.prop_recursive(4, 24, 4, |inner| {
            prop_oneof![
                inner.clone().prop_map(Location::complement),
                prop::collection::vec(inner.clone(), 1..4).prop_map(Location::Join),
                prop::collection::vec(inner.clone(), 1..4).prop_map(Location::Order),
                prop::collection::vec(inner.clone(), 1..4).prop_map(Location::Bond),
                ("[A-Z]{2}[0-9]{4,6}\\.[0-9]", inner).prop_map(|(accession, location)| {
                    Location::External {
                        accession,
                        location: Box::new(location),
                    }
                }),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_display_parses_back(location in location_strategy()) {
            let text = location.to_string();
            prop_assert_eq!(Location::parse(&text).unwrap(), location.clone());
            prop_assert_eq!(Location::parse(&text).unwrap().to_string(), text);
        }
    }
}
