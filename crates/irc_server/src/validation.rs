//! Nickname and channel-name validation, per `SPEC_FULL.md` §4.4: a deliberately narrow
//! grammar, not the full RFC 2812 ABNF.

use nom::{
    IResult, Parser,
    bytes::complete::take_while,
    character::complete::satisfy,
    combinator::{recognize, verify},
    sequence::pair,
};

fn is_nick_tail_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// `1–9 characters; first character alphabetic; remaining characters alphanumeric, '-' or '_'.`
pub fn nickname_parser(input: &str) -> IResult<&str, &str> {
    let first = satisfy(|c: char| c.is_ascii_alphabetic());
    let tail = take_while(is_nick_tail_char);
    verify(recognize(pair(first, tail)), |s: &str| s.len() <= 9).parse(input)
}

pub fn is_valid_nickname(s: &str) -> bool {
    matches!(nickname_parser(s), Ok((rest, parsed)) if rest.is_empty() && parsed == s)
}

fn is_channel_tail_char(c: char) -> bool {
    !matches!(c, ' ' | ',' | '\x07')
}

/// `1–50 characters; first character '#' or '&'; no space, comma, or BEL.`
pub fn channel_name_parser(input: &str) -> IResult<&str, &str> {
    let first = satisfy(|c: char| c == '#' || c == '&');
    let tail = take_while(is_channel_tail_char);
    // The mandatory leading `#`/`&` already guarantees at least one character, so only
    // the upper bound needs checking; `chars().count()` (not `len()`) counts characters,
    // not bytes, so a multibyte channel name isn't penalized for its UTF-8 encoding size.
    verify(recognize(pair(first, tail)), |s: &str| s.chars().count() <= 50).parse(input)
}

pub fn is_valid_channel_name(s: &str) -> bool {
    matches!(channel_name_parser(s), Ok((rest, parsed)) if rest.is_empty() && parsed == s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_nicknames() {
        for nick in ["a", "alice", "Bob9", "x-y_z", "ABCDEFGHI"] {
            assert!(is_valid_nickname(nick), "should accept {nick}");
        }
    }

    #[test]
    fn rejects_invalid_nicknames() {
        for nick in ["", "1abc", "-abc", "toolongnick", "has space", "bad!char"] {
            assert!(!is_valid_nickname(nick), "should reject {nick}");
        }
    }

    #[test]
    fn accepts_valid_channel_names() {
        for chan in ["#room", "&local", "#a", "#room-2"] {
            assert!(is_valid_channel_name(chan), "should accept {chan}");
        }
    }

    #[test]
    fn rejects_invalid_channel_names() {
        for chan in ["", "room", "#has space", "#has,comma", "#has\x07bel"] {
            assert!(!is_valid_channel_name(chan), "should reject {chan}");
        }
        let too_long = format!("#{}", "a".repeat(50));
        assert!(!is_valid_channel_name(&too_long));
    }

    #[test]
    fn channel_name_length_is_counted_in_characters_not_bytes() {
        // 50 chars total, each a 3-byte UTF-8 scalar: over the byte limit (150 bytes)
        // but exactly at the character limit, so it must be accepted.
        let multibyte = format!("#{}", "€".repeat(49));
        assert_eq!(multibyte.chars().count(), 50);
        assert!(multibyte.len() > 50);
        assert!(is_valid_channel_name(&multibyte));

        let one_char_too_long = format!("#{}", "€".repeat(50));
        assert!(!is_valid_channel_name(&one_char_too_long));
    }
}
