//! Mode-string parsing, per `SPEC_FULL.md` §9's mode-processing design note: a string
//! like `+kl` or `+o-l` is parsed into a flat list of `(sign, letter)` tokens before any
//! argument is consumed or any mode applied, so mixed strings are handled uniformly
//! regardless of how signs and letters interleave.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeToken {
    pub sign: char,
    pub letter: char,
}

/// Splits a mode string into tokens, carrying the most recently seen sign forward onto
/// every letter that follows it. A string with no leading sign is treated as `+`.
pub fn parse_mode_string(spec: &str) -> Vec<ModeToken> {
    let mut tokens = Vec::new();
    let mut sign = '+';
    for c in spec.chars() {
        match c {
            '+' | '-' => sign = c,
            letter => tokens.push(ModeToken { sign, letter }),
        }
    }
    tokens
}

/// Re-renders a sequence of *applied* tokens back into a mode string, grouping runs that
/// share a sign behind a single `+`/`-` the way the wire format expects (`+i` then `+t`
/// becomes `+it`, not `+i+t`).
pub fn format_applied(tokens: &[ModeToken]) -> String {
    let mut out = String::new();
    let mut last_sign = '\0';
    for tok in tokens {
        if last_sign != tok.sign {
            out.push(tok.sign);
            last_sign = tok.sign;
        }
        out.push(tok.letter);
    }
    out
}
