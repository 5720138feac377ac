//! Tafkeet: spelling a monetary amount out in Arabic words.
//!
//! The integer algorithm walks four bands (millions, thousands, hundreds and
//! the 0-99 remainder) from the most significant down, joining the non-empty
//! bands with "و". Millions and thousands follow Arabic numeral-noun
//! agreement: a dedicated singular for 1, a dual for 2, the broken plural for
//! 3-10 and the singular noun again above 10.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

pub const ZERO_WORD: &str = "صفر";
pub const NEGATIVE_MARKER: &str = "سالب";
pub const MINOR_UNIT: &str = "قرشاً";
const CONJUNCTION: &str = " و ";

const ONES: [&str; 20] = [
    "",
    "واحد",
    "اثنان",
    "ثلاثة",
    "أربعة",
    "خمسة",
    "ستة",
    "سبعة",
    "ثمانية",
    "تسعة",
    "عشرة",
    "أحد عشر",
    "اثنا عشر",
    "ثلاثة عشر",
    "أربعة عشر",
    "خمسة عشر",
    "ستة عشر",
    "سبعة عشر",
    "ثمانية عشر",
    "تسعة عشر",
];

const TENS: [&str; 10] = [
    "", "", "عشرون", "ثلاثون", "أربعون", "خمسون", "ستون", "سبعون", "ثمانون", "تسعون",
];

const HUNDREDS: [&str; 10] = [
    "",
    "مائة",
    "مائتان",
    "ثلاثمائة",
    "أربعمائة",
    "خمسمائة",
    "ستمائة",
    "سبعمائة",
    "ثمانمائة",
    "تسعمائة",
];

struct ScaleNouns {
    singular: &'static str,
    dual: &'static str,
    plural: &'static str,
}

const MILLIONS: ScaleNouns = ScaleNouns {
    singular: "مليون",
    dual: "مليونان",
    plural: "ملايين",
};

const THOUSANDS: ScaleNouns = ScaleNouns {
    singular: "ألف",
    dual: "ألفان",
    plural: "آلاف",
};

/// Converts an amount of pounds into words, with piasters (qirsh) for the
/// fractional part.
///
/// - `0` (or anything that rounds to zero piasters) gives "صفر".
/// - Negative amounts are spelled as their absolute value prefixed by "سالب".
/// - The fraction is rounded half-to-even to two places; a fraction that
///   rounds up to 100 piasters carries into the pounds.
/// - When there are no whole pounds only the piaster phrase is produced.
pub fn to_words(amount: Decimal) -> String {
    let (major, minor) = split_minor_units(amount.abs());
    if major == 0 && minor == 0 {
        return ZERO_WORD.to_string();
    }

    if amount.is_sign_negative() {
        return format!("{} {}", NEGATIVE_MARKER, to_words(amount.abs()));
    }

    let mut words = integer_to_words(major);
    if minor > 0 {
        if !words.is_empty() {
            words.push_str(CONJUNCTION);
        }
        words.push_str(&integer_to_words(minor));
        words.push(' ');
        words.push_str(MINOR_UNIT);
    }
    words
}

/// Convenience entry point for `f64` aggregates. Non-finite input reads as zero.
pub fn f64_to_words(amount: f64) -> String {
    match Decimal::from_f64(amount) {
        Some(value) => to_words(value),
        None => ZERO_WORD.to_string(),
    }
}

/// Spells out a non-negative integer. Zero yields an empty string so that
/// callers can decide whether a band is present at all.
pub fn integer_to_words(number: u128) -> String {
    if number == 0 {
        return String::new();
    }

    let mut bands: Vec<String> = Vec::with_capacity(4);
    let mut rest = number;

    if rest >= 1_000_000 {
        bands.push(scale_words(rest / 1_000_000, &MILLIONS));
        rest %= 1_000_000;
    }

    if rest >= 1_000 {
        bands.push(scale_words(rest / 1_000, &THOUSANDS));
        rest %= 1_000;
    }

    if rest >= 100 {
        bands.push(HUNDREDS[(rest / 100) as usize].to_string());
        rest %= 100;
    }

    if rest > 0 {
        bands.push(below_hundred(rest as usize));
    }

    bands.join(CONJUNCTION)
}

fn scale_words(count: u128, nouns: &ScaleNouns) -> String {
    match count {
        1 => nouns.singular.to_string(),
        2 => nouns.dual.to_string(),
        3..=10 => format!("{} {}", integer_to_words(count), nouns.plural),
        _ => format!("{} {}", integer_to_words(count), nouns.singular),
    }
}

fn below_hundred(n: usize) -> String {
    if n < 20 {
        return ONES[n].to_string();
    }

    let tens = TENS[n / 10];
    let ones = n % 10;
    if ones == 0 {
        tens.to_string()
    } else {
        format!("{}{}{}", ONES[ones], CONJUNCTION, tens)
    }
}

fn split_minor_units(amount: Decimal) -> (u128, u128) {
    let whole = amount.trunc();
    let fraction = ((amount - whole) * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);

    let mut major = whole.to_u128().unwrap_or_default();
    let mut minor = fraction.to_u128().unwrap_or_default();
    if minor >= 100 {
        major += 1;
        minor -= 100;
    }
    (major, minor)
}
