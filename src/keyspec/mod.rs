//! Key specification parsing.
//!
//! A spec is `{MOD}{MOD}...KEY`, e.g. `"{CTRL}{SHIFT}A"`. Modifier tokens
//! are extracted left to right and matched against a synonym table;
//! unrecognized modifier tokens are dropped rather than rejected. What
//! remains is the base key, resolved through [`keys::resolve`].

pub mod keys;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use bitflags::bitflags;
use regex::Regex;

pub use keys::VirtualKey;

/// First `{...}` pair in a spec.
static MODIFIER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").expect("modifier token pattern is valid"));

bitflags! {
    /// Modifier flags, bit-compatible with the register primitive.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        const ALT = 0x0001;
        const CTRL = 0x0002;
        const SHIFT = 0x0004;
        const WIN = 0x0008;
        /// Suppress auto-repeat notifications while the combination is held.
        const NO_REPEAT = 0x4000;
    }
}

impl Modifiers {
    /// Match one modifier token against the synonym table.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "SHFT" | "SHIFT" => Some(Self::SHIFT),
            "CTRL" | "CONTROL" => Some(Self::CTRL),
            "ALT" => Some(Self::ALT),
            "WIN" => Some(Self::WIN),
            _ => None,
        }
    }

    fn canonical_token(self) -> Option<&'static str> {
        [
            (Self::SHIFT, "SHIFT"),
            (Self::CTRL, "CTRL"),
            (Self::ALT, "ALT"),
            (Self::WIN, "WIN"),
        ]
        .into_iter()
        .find(|(flag, _)| *flag == self)
        .map(|(_, token)| token)
    }
}

/// Key specification parse error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The base-key token matched no table.
    #[error("unknown key '{0}'")]
    UnknownKey(String),
    /// A `{` with no matching `}`.
    #[error("unterminated modifier in '{0}'")]
    UnterminatedModifier(String),
}

/// A parsed hotkey: modifier set plus base key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    modifiers: Modifiers,
    key: VirtualKey,
}

impl KeySpec {
    /// Parse a spec string. See the module docs for the grammar.
    pub fn parse(spec: &str) -> Result<Self, ParseError> {
        let normalized = normalize(spec);
        let (tokens, rest) = split_modifiers(&normalized);
        if rest.contains('{') {
            return Err(ParseError::UnterminatedModifier(normalized));
        }

        let modifiers = tokens
            .iter()
            .filter_map(|token| Modifiers::from_token(token))
            .fold(Modifiers::empty(), |acc, m| acc | m);

        let token = rest.trim();
        let key = if token.is_empty() {
            VirtualKey::NONE
        } else {
            keys::resolve(token).ok_or_else(|| ParseError::UnknownKey(token.to_string()))?
        };

        Ok(Self { modifiers, key })
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn key(&self) -> VirtualKey {
        self.key
    }

    /// Copy with extra modifier flags OR-ed in.
    pub fn with_modifiers(self, extra: Modifiers) -> Self {
        Self {
            modifiers: self.modifiers | extra,
            key: self.key,
        }
    }
}

impl FromStr for KeySpec {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, token) in [
            (Modifiers::CTRL, "CTRL"),
            (Modifiers::ALT, "ALT"),
            (Modifiers::SHIFT, "SHIFT"),
            (Modifiers::WIN, "WIN"),
        ] {
            if self.modifiers.contains(flag) {
                write!(f, "{{{token}}}")?;
            }
        }
        if !self.key.is_none() {
            write!(f, "{}", self.key)?;
        }
        Ok(())
    }
}

/// Parse a spec string into a [`KeySpec`].
pub fn parse(spec: &str) -> Result<KeySpec, ParseError> {
    KeySpec::parse(spec)
}

/// Trim and uppercase; the form stored in the registry table.
pub fn normalize(spec: &str) -> String {
    spec.trim().to_uppercase()
}

/// Comparison key for spec uniqueness.
///
/// Case-insensitive, with modifier brackets sorted and de-duplicated and
/// synonyms folded, so `{SHIFT}{CTRL}a` and `{control}{shft}A` compare
/// equal. Unknown modifier tokens are dropped, as `parse` drops them.
/// Purely lexical: it never fails, even for unparsable specs.
pub fn canonical_spec(spec: &str) -> String {
    let normalized = normalize(spec);
    let (tokens, rest) = split_modifiers(&normalized);

    let mods: BTreeSet<&str> = tokens
        .iter()
        .filter_map(|token| Modifiers::from_token(token).and_then(Modifiers::canonical_token))
        .collect();

    let mut out = String::with_capacity(normalized.len());
    for m in &mods {
        out.push('{');
        out.push_str(m);
        out.push('}');
    }
    out.push_str(rest.trim());
    out
}

/// Strip every `{...}` pair, first match first, returning the tokens in
/// extraction order and the remaining text.
fn split_modifiers(spec: &str) -> (Vec<String>, String) {
    let mut rest = spec.to_string();
    let mut tokens = Vec::new();

    while let Some((range, token)) = MODIFIER_TOKEN
        .captures(&rest)
        .and_then(|caps| Some((caps.get(0)?.range(), caps.get(1)?.as_str().to_string())))
    {
        tokens.push(token);
        rest.replace_range(range, "");
    }

    (tokens, rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_function_key() {
        let spec = parse("F1").unwrap();
        assert_eq!(spec.key(), VirtualKey::F1);
        assert!(spec.modifiers().is_empty());
    }

    #[test]
    fn trims_and_uppercases() {
        assert_eq!(parse("  f5 ").unwrap(), parse("F5").unwrap());
        assert_eq!(parse("{ctrl}a").unwrap(), parse("{CTRL}A").unwrap());
    }

    #[test]
    fn modifier_order_is_irrelevant() {
        let a = parse("{CTRL}{SHIFT}A").unwrap();
        let b = parse("{SHIFT}{CTRL}A").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.modifiers(), Modifiers::CTRL | Modifiers::SHIFT);
        assert_eq!(a.key(), VirtualKey::A);
    }

    #[test]
    fn modifier_synonyms() {
        assert_eq!(
            parse("{SHFT}{CONTROL}{ALT}{WIN}X").unwrap().modifiers(),
            Modifiers::SHIFT | Modifiers::CTRL | Modifiers::ALT | Modifiers::WIN
        );
    }

    #[test]
    fn unknown_modifiers_are_dropped() {
        let spec = parse("{HYPER}{CTRL}Q").unwrap();
        assert_eq!(spec.modifiers(), Modifiers::CTRL);
        assert_eq!(spec.key(), VirtualKey(0x51));
    }

    #[test]
    fn modifiers_anywhere_in_the_spec() {
        assert_eq!(parse("A{CTRL}").unwrap(), parse("{CTRL}A").unwrap());
    }

    #[test]
    fn escape_aliases_agree() {
        assert_eq!(parse("ESC").unwrap(), parse("ESCAPE").unwrap());
        assert_eq!(parse("Escape").unwrap().key(), VirtualKey::ESCAPE);
    }

    #[test]
    fn named_keys_have_no_modifiers() {
        for name in ["PRINTSCREEN", "PLAY", "SPACE", "HOME", "INSERT", "CAPSLOCK"] {
            let spec = parse(name).unwrap();
            assert!(spec.modifiers().is_empty(), "{name}");
        }
    }

    #[test]
    fn win_modifier_versus_win_key() {
        let spec = parse("{WIN}WIN").unwrap();
        assert_eq!(spec.modifiers(), Modifiers::WIN);
        assert_eq!(spec.key(), VirtualKey::LWIN);
    }

    #[test]
    fn symbol_with_modifiers() {
        let spec = parse("{SHIFT}]").unwrap();
        assert_eq!(spec.key(), VirtualKey::OEM_CLOSE_BRACKETS);
        assert_eq!(spec.modifiers(), Modifiers::SHIFT);
    }

    #[test]
    fn modifiers_only_resolves_to_none() {
        let spec = parse("{CTRL}{ALT}").unwrap();
        assert!(spec.key().is_none());
        assert_eq!(spec.modifiers(), Modifiers::CTRL | Modifiers::ALT);
    }

    #[test]
    fn unknown_key_reports_token() {
        assert_eq!(
            parse("{CTRL}BOGUS"),
            Err(ParseError::UnknownKey("BOGUS".into()))
        );
    }

    #[test]
    fn unterminated_modifier() {
        assert!(matches!(
            parse("{CTRL"),
            Err(ParseError::UnterminatedModifier(_))
        ));
    }

    #[test]
    fn from_str_and_display() {
        let spec: KeySpec = "{shift}{ctrl}f12".parse().unwrap();
        assert_eq!(spec.to_string(), "{CTRL}{SHIFT}F12");
        assert_eq!(parse("{ALT}").unwrap().to_string(), "{ALT}");
    }

    #[test]
    fn with_modifiers_adds_no_repeat() {
        let spec = parse("{CTRL}A").unwrap().with_modifiers(Modifiers::NO_REPEAT);
        assert_eq!(spec.modifiers().bits(), 0x4002);
    }

    #[test]
    fn modifier_bits_match_platform_values() {
        assert_eq!(Modifiers::ALT.bits(), 0x0001);
        assert_eq!(Modifiers::CTRL.bits(), 0x0002);
        assert_eq!(Modifiers::SHIFT.bits(), 0x0004);
        assert_eq!(Modifiers::WIN.bits(), 0x0008);
        assert_eq!(Modifiers::NO_REPEAT.bits(), 0x4000);
    }

    #[test]
    fn canonical_spec_folds_order_case_and_synonyms() {
        assert_eq!(canonical_spec("{CTRL}{SHIFT}A"), "{CTRL}{SHIFT}A");
        assert_eq!(canonical_spec("{shift}{ctrl}a"), "{CTRL}{SHIFT}A");
        assert_eq!(canonical_spec("{SHFT}{CONTROL}A"), "{CTRL}{SHIFT}A");
        assert_eq!(canonical_spec("{CTRL}{CTRL}A"), "{CTRL}A");
        assert_eq!(canonical_spec(" f1 "), "F1");
        assert_ne!(canonical_spec("{CTRL}A"), canonical_spec("{ALT}A"));
        assert_eq!(canonical_spec("{FOO}{CTRL}A"), "{CTRL}A");
        assert_eq!(canonical_spec("{HYPER}"), "");
    }
}
