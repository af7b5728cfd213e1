use crate::runtime::data_structures::arena::Cell;

/// Parse a token as a numeric literal.
///
/// Understood forms:
///
/// * `'c'` gives the character code of `c`.
/// * `%`, `#` or `$` force binary, decimal or hexadecimal, optionally followed by `-`.
/// * A leading `-` negates a number in the current base.
/// * Anything else is digits in the current base.
///
/// Digits past 9 are the letters `A` through `Z`, in either case.  At least one digit is needed
/// and a `-` anywhere else makes the token something other than a number.  Values wrap to a
/// single cell once negated, but the magnitude itself has to fit in 16 bits.
pub fn parse_number(token: &[u8], base: Cell) -> Option<Cell> {
    if let [b'\'', character, b'\''] = token {
        return Some(*character as Cell);
    }

    let (base, rest) = match token.first() {
        Some(b'%') => (2, &token[1..]),
        Some(b'#') => (10, &token[1..]),
        Some(b'$') => (16, &token[1..]),
        _ => (base as u32, token),
    };

    if !(2..=36).contains(&base) {
        return None;
    }

    let (negative, digits) = match rest.first() {
        Some(b'-') => (true, &rest[1..]),
        _ => (false, rest),
    };

    if digits.is_empty() {
        return None;
    }

    let mut magnitude: u32 = 0;

    for character in digits {
        let digit = digit_value(*character)?;

        if digit >= base {
            return None;
        }

        magnitude = magnitude * base + digit;

        if magnitude > Cell::MAX as u32 {
            return None;
        }
    }

    let value = magnitude as Cell;

    Some(if negative { value.wrapping_neg() } else { value })
}

fn digit_value(character: u8) -> Option<u32> {
    match character {
        b'0'..=b'9' => Some((character - b'0') as u32),
        b'A'..=b'Z' => Some((character - b'A') as u32 + 10),
        b'a'..=b'z' => Some((character - b'a') as u32 + 10),
        _ => None,
    }
}

/// Render a number in the given base.  Digits past nine are upper case letters.
pub fn format_number(value: i32, base: Cell) -> String {
    let base = if (2..=36).contains(&base) { base as u32 } else { 10 };
    let mut magnitude = value.unsigned_abs();
    let mut digits = Vec::new();

    loop {
        let digit = magnitude % base;

        digits.push(std::char::from_digit(digit, base).unwrap_or('?').to_ascii_uppercase());
        magnitude /= base;

        if magnitude == 0 {
            break;
        }
    }

    if value < 0 {
        digits.push('-');
    }

    digits.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_literals() {
        assert_eq!(parse_number(b"'A'", 10), Some(65));
        assert_eq!(parse_number(b"' '", 10), Some(32));
    }

    #[test]
    fn current_base_is_used_without_prefix() {
        assert_eq!(parse_number(b"ff", 16), Some(255));
        assert_eq!(parse_number(b"ff", 10), None);
        assert_eq!(parse_number(b"Z", 36), Some(35));
    }

    #[test]
    fn prefix_overrides_base() {
        assert_eq!(parse_number(b"#10", 16), Some(10));
        assert_eq!(parse_number(b"$10", 10), Some(16));
        assert_eq!(parse_number(b"%-11", 10), Some(-3i16 as Cell));
    }

    #[test]
    fn prefix_alone_is_not_a_number() {
        assert_eq!(parse_number(b"$", 10), None);
        assert_eq!(parse_number(b"#-", 10), None);
        assert_eq!(parse_number(b"-", 10), None);
        assert_eq!(parse_number(b"", 10), None);
    }

    #[test]
    fn oversized_magnitudes_fail() {
        assert_eq!(parse_number(b"65535", 10), Some(0xffff));
        assert_eq!(parse_number(b"65536", 10), None);
    }

    #[test]
    fn invalid_base_fails() {
        assert_eq!(parse_number(b"1", 0), None);
        assert_eq!(parse_number(b"1", 37), None);
    }

    #[test]
    fn formatting() {
        assert_eq!(format_number(-125, 10), "-125");
        assert_eq!(format_number(0, 10), "0");
        assert_eq!(format_number(0xa000, 16), "A000");
        assert_eq!(format_number(14, 2), "1110");
    }
}
