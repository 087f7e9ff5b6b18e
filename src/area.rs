// This module contains the delivery area data model and the parsers for its user-entered fields

use std::fmt::Display;
use std::str::FromStr;

use anyhow::bail;
use egui::Color32;
use nom::{
    branch::alt,
    bytes::complete::take_while_m_n,
    character::complete::{char, digit0, multispace0},
    combinator::{eof, map, map_res, opt},
    error::{convert_error, VerboseError},
    sequence::{delimited, preceded, terminated, tuple},
    IResult,
};
use serde::{Deserialize, Serialize};

/// Minimum number of vertices for a polygon to be drawn closed or stored.
pub const MIN_POLYGON_POINTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lng)
    }
}

/// An exact amount of money, kept in cents.
///
/// Text is rounded half away from zero to two decimals when parsed, so
/// `"8.005"` becomes `8.01`. Negative amounts are allowed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Price(i64);

impl Price {
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }
}

impl Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Price {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Price::default());
        }

        let (negative, int, frac) = match price(s) {
            Ok((_, parts)) => parts,
            Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
                bail!("'{s}' is not a price:\n{}", convert_error(s, e))
            }
            Err(_) => bail!("Unknown error!"),
        };

        let frac = frac.unwrap_or_default();
        if int.is_empty() && frac.is_empty() {
            bail!("'{s}' is not a price: no digits");
        }

        let whole: i64 = if int.is_empty() { 0 } else { int.parse()? };
        let digit = |i: usize| {
            frac.as_bytes()
                .get(i)
                .map(|b| i64::from(b - b'0'))
                .unwrap_or(0)
        };
        let mut cents = digit(0) * 10 + digit(1);
        if digit(2) >= 5 {
            cents += 1;
        }

        let Some(magnitude) = whole.checked_mul(100).and_then(|c| c.checked_add(cents)) else {
            bail!("'{s}' is too large to be a price");
        };

        Ok(Price(if negative { -magnitude } else { magnitude }))
    }
}

// sign, integer digits, fraction digits
fn price(s: &str) -> IResult<&str, (bool, &str, Option<&str>), VerboseError<&str>> {
    terminated(
        tuple((
            map(opt(alt((char('-'), char('+')))), |sign| sign == Some('-')),
            digit0,
            opt(preceded(char('.'), digit0)),
        )),
        eof,
    )(s)
}

/// An opaque RGB color written as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor(pub [u8; 3]);

impl HexColor {
    pub const DEFAULT: HexColor = HexColor([0x77, 0xA2, 0xE8]);

    pub fn to_color32(self) -> Color32 {
        let [r, g, b] = self.0;
        Color32::from_rgb(r, g, b)
    }
}

impl Default for HexColor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Display for HexColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02X}{g:02X}{b:02X}")
    }
}

impl FromStr for HexColor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match hex_color(s) {
            Ok((_, rgb)) => Ok(HexColor(rgb)),
            Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
                bail!("'{s}' is not a color:\n{}", convert_error(s, e))
            }
            Err(_) => bail!("Unknown error!"),
        }
    }
}

fn hex_color(s: &str) -> IResult<&str, [u8; 3], VerboseError<&str>> {
    delimited(
        multispace0,
        preceded(
            char('#'),
            alt((
                map(tuple((hex_byte, hex_byte, hex_byte)), |(r, g, b)| [r, g, b]),
                map(tuple((hex_nibble, hex_nibble, hex_nibble)), |(r, g, b)| {
                    [r, g, b]
                }),
            )),
        ),
        terminated(multispace0, eof),
    )(s)
}

fn hex_byte(s: &str) -> IResult<&str, u8, VerboseError<&str>> {
    map_res(
        take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit()),
        |h| u8::from_str_radix(h, 16),
    )(s)
}

// #abc is shorthand for #aabbcc
fn hex_nibble(s: &str) -> IResult<&str, u8, VerboseError<&str>> {
    map_res(
        take_while_m_n(1, 1, |c: char| c.is_ascii_hexdigit()),
        |h| u8::from_str_radix(h, 16).map(|n| n * 17),
    )(s)
}

/// Everything about an area except its shape.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Metadata {
    pub title: String,
    pub price: Price,
    pub color: HexColor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Area {
    pub metadata: Metadata,
    pub points: Vec<LatLng>,
}

impl Area {
    pub fn new(metadata: Metadata, points: Vec<LatLng>) -> Self {
        Self { metadata, points }
    }

    pub fn is_polygon(&self) -> bool {
        self.points.len() >= MIN_POLYGON_POINTS
    }
}
