//! Virtual-key codes and the base-key resolution tables.
//!
//! Codes follow the Win32 virtual-key numbering, which is what the
//! register primitive consumes. Resolution runs three tables in a fixed
//! order: named keys (substring containment, first match wins), punctuation
//! and shifted-digit symbols (exact match), then literal key names.

use std::fmt;

/// A platform virtual-key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VirtualKey(pub u16);

impl VirtualKey {
    /// Sentinel for a spec made only of modifiers.
    pub const NONE: Self = Self(0x00);

    pub const BACK: Self = Self(0x08);
    pub const TAB: Self = Self(0x09);
    pub const CLEAR: Self = Self(0x0C);
    pub const RETURN: Self = Self(0x0D);
    pub const SHIFT_KEY: Self = Self(0x10);
    pub const CONTROL_KEY: Self = Self(0x11);
    pub const MENU: Self = Self(0x12);
    pub const PAUSE: Self = Self(0x13);
    pub const CAPS_LOCK: Self = Self(0x14);
    pub const ESCAPE: Self = Self(0x1B);
    pub const SPACE: Self = Self(0x20);
    pub const PAGE_UP: Self = Self(0x21);
    pub const PAGE_DOWN: Self = Self(0x22);
    pub const END: Self = Self(0x23);
    pub const HOME: Self = Self(0x24);
    pub const LEFT: Self = Self(0x25);
    pub const UP: Self = Self(0x26);
    pub const RIGHT: Self = Self(0x27);
    pub const DOWN: Self = Self(0x28);
    pub const SELECT: Self = Self(0x29);
    pub const PRINT: Self = Self(0x2A);
    pub const EXECUTE: Self = Self(0x2B);
    pub const PRINT_SCREEN: Self = Self(0x2C);
    pub const INSERT: Self = Self(0x2D);
    pub const DELETE: Self = Self(0x2E);
    pub const HELP: Self = Self(0x2F);
    pub const D0: Self = Self(0x30);
    pub const D1: Self = Self(0x31);
    pub const D2: Self = Self(0x32);
    pub const D3: Self = Self(0x33);
    pub const D4: Self = Self(0x34);
    pub const D5: Self = Self(0x35);
    pub const D6: Self = Self(0x36);
    pub const D7: Self = Self(0x37);
    pub const D8: Self = Self(0x38);
    pub const D9: Self = Self(0x39);
    pub const A: Self = Self(0x41);
    pub const Z: Self = Self(0x5A);
    pub const LWIN: Self = Self(0x5B);
    pub const RWIN: Self = Self(0x5C);
    pub const APPS: Self = Self(0x5D);
    pub const SLEEP: Self = Self(0x5F);
    pub const NUMPAD0: Self = Self(0x60);
    pub const MULTIPLY: Self = Self(0x6A);
    pub const ADD: Self = Self(0x6B);
    pub const SEPARATOR: Self = Self(0x6C);
    pub const SUBTRACT: Self = Self(0x6D);
    pub const DECIMAL: Self = Self(0x6E);
    pub const DIVIDE: Self = Self(0x6F);
    pub const F1: Self = Self(0x70);
    pub const F2: Self = Self(0x71);
    pub const F3: Self = Self(0x72);
    pub const F4: Self = Self(0x73);
    pub const F5: Self = Self(0x74);
    pub const F6: Self = Self(0x75);
    pub const F7: Self = Self(0x76);
    pub const F8: Self = Self(0x77);
    pub const F9: Self = Self(0x78);
    pub const F10: Self = Self(0x79);
    pub const F11: Self = Self(0x7A);
    pub const F12: Self = Self(0x7B);
    pub const F24: Self = Self(0x87);
    pub const NUM_LOCK: Self = Self(0x90);
    pub const SCROLL: Self = Self(0x91);
    pub const LSHIFT_KEY: Self = Self(0xA0);
    pub const RSHIFT_KEY: Self = Self(0xA1);
    pub const LCONTROL_KEY: Self = Self(0xA2);
    pub const RCONTROL_KEY: Self = Self(0xA3);
    pub const LMENU: Self = Self(0xA4);
    pub const RMENU: Self = Self(0xA5);
    pub const VOLUME_MUTE: Self = Self(0xAD);
    pub const VOLUME_DOWN: Self = Self(0xAE);
    pub const VOLUME_UP: Self = Self(0xAF);
    pub const MEDIA_NEXT_TRACK: Self = Self(0xB0);
    pub const MEDIA_PREVIOUS_TRACK: Self = Self(0xB1);
    pub const MEDIA_STOP: Self = Self(0xB2);
    pub const MEDIA_PLAY_PAUSE: Self = Self(0xB3);
    pub const OEM_SEMICOLON: Self = Self(0xBA);
    pub const OEM_PLUS: Self = Self(0xBB);
    pub const OEM_COMMA: Self = Self(0xBC);
    pub const OEM_MINUS: Self = Self(0xBD);
    pub const OEM_PERIOD: Self = Self(0xBE);
    pub const OEM_QUESTION: Self = Self(0xBF);
    pub const OEM_TILDE: Self = Self(0xC0);
    pub const OEM_OPEN_BRACKETS: Self = Self(0xDB);
    pub const OEM_PIPE: Self = Self(0xDC);
    pub const OEM_CLOSE_BRACKETS: Self = Self(0xDD);
    pub const OEM_QUOTES: Self = Self(0xDE);
    pub const OEM_BACKSLASH: Self = Self(0xE2);
    pub const PLAY: Self = Self(0xFA);
    pub const OEM_CLEAR: Self = Self(0xFE);

    /// Raw code as handed to the register primitive.
    pub fn code(self) -> u16 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// Function key `F{n}` for `n` in `1..=24`.
    pub fn function(n: u8) -> Option<Self> {
        (1..=24)
            .contains(&n)
            .then(|| Self(Self::F1.0 + u16::from(n) - 1))
    }

    /// Canonical name, as accepted by the literal-name table.
    pub fn name(self) -> Option<String> {
        match self.0 {
            0x41..=0x5A => Some(char::from(self.0 as u8).to_string()),
            0x30..=0x39 => Some(format!("D{}", self.0 - 0x30)),
            0x60..=0x69 => Some(format!("NUMPAD{}", self.0 - 0x60)),
            0x70..=0x87 => Some(format!("F{}", self.0 - 0x70 + 1)),
            _ => LITERAL_KEYS
                .iter()
                .find(|(_, vk)| *vk == self)
                .map(|(name, _)| (*name).to_string()),
        }
    }
}

impl fmt::Display for VirtualKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(&name),
            None if self.is_none() => f.write_str("NONE"),
            None => write!(f, "0x{:02X}", self.0),
        }
    }
}

/// Named keys, matched by substring containment in this exact order.
///
/// Order matters: `PAGEUP` contains `UP` and `PAGEDOWN` contains `DOWN`, so
/// both resolve to the arrow keys. Use `PRIOR`/`NEXT` for the paging keys.
const NAMED_KEYS: &[(&str, VirtualKey)] = &[
    ("PRINTSCREEN", VirtualKey::PRINT_SCREEN),
    ("PRINTSCRN", VirtualKey::PRINT_SCREEN),
    ("PRINT", VirtualKey::PRINT),
    ("PLAY", VirtualKey::PLAY),
    ("PAUSE", VirtualKey::PAUSE),
    ("LWIN", VirtualKey::LWIN),
    ("RWIN", VirtualKey::RWIN),
    ("WIN", VirtualKey::LWIN),
    ("UP", VirtualKey::UP),
    ("DOWN", VirtualKey::DOWN),
    ("LEFT", VirtualKey::LEFT),
    ("RIGHT", VirtualKey::RIGHT),
    ("SPACE", VirtualKey::SPACE),
    ("SPC", VirtualKey::SPACE),
    ("ESCAPE", VirtualKey::ESCAPE),
    ("ESC", VirtualKey::ESCAPE),
    ("CLEAR", VirtualKey::OEM_CLEAR),
    ("CLR", VirtualKey::OEM_CLEAR),
    ("CAPSLOCK", VirtualKey::CAPS_LOCK),
    ("END", VirtualKey::END),
    ("HOME", VirtualKey::HOME),
    ("INSERT", VirtualKey::INSERT),
    ("PAGEUP", VirtualKey::PAGE_UP),
    ("PGUP", VirtualKey::PAGE_UP),
    ("PAGEDOWN", VirtualKey::PAGE_DOWN),
    ("PGDOWN", VirtualKey::PAGE_DOWN),
];

/// Punctuation and shifted-digit symbols, matched exactly.
const SYMBOL_KEYS: &[(&str, VirtualKey)] = &[
    ("]", VirtualKey::OEM_CLOSE_BRACKETS),
    ("[", VirtualKey::OEM_OPEN_BRACKETS),
    (",", VirtualKey::OEM_COMMA),
    (".", VirtualKey::OEM_PERIOD),
    ("?", VirtualKey::OEM_QUESTION),
    ("\"", VirtualKey::OEM_QUOTES),
    ("|", VirtualKey::OEM_PIPE),
    ("+", VirtualKey::OEM_PLUS),
    ("-", VirtualKey::OEM_MINUS),
    ("_", VirtualKey::OEM_MINUS),
    ("*", VirtualKey::MULTIPLY),
    ("`", VirtualKey::OEM_TILDE),
    ("~", VirtualKey::OEM_TILDE),
    ("1", VirtualKey::D1),
    ("!", VirtualKey::D1),
    ("2", VirtualKey::D2),
    ("@", VirtualKey::D2),
    ("3", VirtualKey::D3),
    ("#", VirtualKey::D3),
    ("4", VirtualKey::D4),
    ("$", VirtualKey::D4),
    ("5", VirtualKey::D5),
    ("%", VirtualKey::D5),
    ("6", VirtualKey::D6),
    ("^", VirtualKey::D6),
    ("7", VirtualKey::D7),
    ("&", VirtualKey::D7),
    ("8", VirtualKey::D8),
    ("9", VirtualKey::D9),
    ("(", VirtualKey::D9),
    ("0", VirtualKey::D0),
    (")", VirtualKey::D0),
];

/// Literal key names outside the computed ranges (letters, `D0`-`D9`,
/// `NUMPAD0`-`NUMPAD9`, `F1`-`F24`). First entry per code is its canonical
/// name.
const LITERAL_KEYS: &[(&str, VirtualKey)] = &[
    ("BACK", VirtualKey::BACK),
    ("BACKSPACE", VirtualKey::BACK),
    ("TAB", VirtualKey::TAB),
    ("CLEAR", VirtualKey::CLEAR),
    ("RETURN", VirtualKey::RETURN),
    ("ENTER", VirtualKey::RETURN),
    ("SHIFTKEY", VirtualKey::SHIFT_KEY),
    ("CONTROLKEY", VirtualKey::CONTROL_KEY),
    ("MENU", VirtualKey::MENU),
    ("PAUSE", VirtualKey::PAUSE),
    ("CAPITAL", VirtualKey::CAPS_LOCK),
    ("CAPSLOCK", VirtualKey::CAPS_LOCK),
    ("ESCAPE", VirtualKey::ESCAPE),
    ("SPACE", VirtualKey::SPACE),
    ("PRIOR", VirtualKey::PAGE_UP),
    ("NEXT", VirtualKey::PAGE_DOWN),
    ("END", VirtualKey::END),
    ("HOME", VirtualKey::HOME),
    ("LEFT", VirtualKey::LEFT),
    ("UP", VirtualKey::UP),
    ("RIGHT", VirtualKey::RIGHT),
    ("DOWN", VirtualKey::DOWN),
    ("SELECT", VirtualKey::SELECT),
    ("PRINT", VirtualKey::PRINT),
    ("EXECUTE", VirtualKey::EXECUTE),
    ("SNAPSHOT", VirtualKey::PRINT_SCREEN),
    ("INSERT", VirtualKey::INSERT),
    ("DELETE", VirtualKey::DELETE),
    ("DEL", VirtualKey::DELETE),
    ("HELP", VirtualKey::HELP),
    ("LWIN", VirtualKey::LWIN),
    ("RWIN", VirtualKey::RWIN),
    ("APPS", VirtualKey::APPS),
    ("SLEEP", VirtualKey::SLEEP),
    ("MULTIPLY", VirtualKey::MULTIPLY),
    ("ADD", VirtualKey::ADD),
    ("SEPARATOR", VirtualKey::SEPARATOR),
    ("SUBTRACT", VirtualKey::SUBTRACT),
    ("DECIMAL", VirtualKey::DECIMAL),
    ("DIVIDE", VirtualKey::DIVIDE),
    ("NUMLOCK", VirtualKey::NUM_LOCK),
    ("SCROLL", VirtualKey::SCROLL),
    ("LSHIFTKEY", VirtualKey::LSHIFT_KEY),
    ("RSHIFTKEY", VirtualKey::RSHIFT_KEY),
    ("LCONTROLKEY", VirtualKey::LCONTROL_KEY),
    ("RCONTROLKEY", VirtualKey::RCONTROL_KEY),
    ("LMENU", VirtualKey::LMENU),
    ("RMENU", VirtualKey::RMENU),
    ("VOLUMEMUTE", VirtualKey::VOLUME_MUTE),
    ("VOLUMEDOWN", VirtualKey::VOLUME_DOWN),
    ("VOLUMEUP", VirtualKey::VOLUME_UP),
    ("MEDIANEXTTRACK", VirtualKey::MEDIA_NEXT_TRACK),
    ("MEDIAPREVIOUSTRACK", VirtualKey::MEDIA_PREVIOUS_TRACK),
    ("MEDIASTOP", VirtualKey::MEDIA_STOP),
    ("MEDIAPLAYPAUSE", VirtualKey::MEDIA_PLAY_PAUSE),
    ("OEMSEMICOLON", VirtualKey::OEM_SEMICOLON),
    ("OEMPLUS", VirtualKey::OEM_PLUS),
    ("OEMCOMMA", VirtualKey::OEM_COMMA),
    ("OEMMINUS", VirtualKey::OEM_MINUS),
    ("OEMPERIOD", VirtualKey::OEM_PERIOD),
    ("OEMQUESTION", VirtualKey::OEM_QUESTION),
    ("OEMTILDE", VirtualKey::OEM_TILDE),
    ("OEMOPENBRACKETS", VirtualKey::OEM_OPEN_BRACKETS),
    ("OEMPIPE", VirtualKey::OEM_PIPE),
    ("OEMCLOSEBRACKETS", VirtualKey::OEM_CLOSE_BRACKETS),
    ("OEMQUOTES", VirtualKey::OEM_QUOTES),
    ("OEMBACKSLASH", VirtualKey::OEM_BACKSLASH),
    ("PLAY", VirtualKey::PLAY),
    ("OEMCLEAR", VirtualKey::OEM_CLEAR),
];

/// Resolve an uppercased base-key token. `None` if no table matches.
pub fn resolve(token: &str) -> Option<VirtualKey> {
    named_key(token)
        .or_else(|| symbol_key(token))
        .or_else(|| literal_key(token))
}

fn named_key(token: &str) -> Option<VirtualKey> {
    NAMED_KEYS
        .iter()
        .find(|(name, _)| token.contains(name))
        .map(|&(_, vk)| vk)
}

fn symbol_key(token: &str) -> Option<VirtualKey> {
    SYMBOL_KEYS
        .iter()
        .find(|(symbol, _)| token == *symbol)
        .map(|&(_, vk)| vk)
}

fn literal_key(token: &str) -> Option<VirtualKey> {
    let bytes = token.as_bytes();
    if bytes.len() == 1 && bytes[0].is_ascii_uppercase() {
        return Some(VirtualKey(u16::from(bytes[0])));
    }
    if let Some(n) = token.strip_prefix("NUMPAD").and_then(single_digit) {
        return Some(VirtualKey(VirtualKey::NUMPAD0.0 + n));
    }
    if let Some(n) = token.strip_prefix('D').and_then(single_digit) {
        return Some(VirtualKey(VirtualKey::D0.0 + n));
    }
    if let Some(n) = token.strip_prefix('F').and_then(|n| n.parse::<u8>().ok()) {
        if let Some(vk) = VirtualKey::function(n) {
            return Some(vk);
        }
    }
    LITERAL_KEYS
        .iter()
        .find(|(name, _)| token == *name)
        .map(|&(_, vk)| vk)
}

fn single_digit(s: &str) -> Option<u16> {
    match s.as_bytes() {
        [d @ b'0'..=b'9'] => Some(u16::from(d - b'0')),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyspec::Modifiers;

    #[test]
    fn named_keys_resolve_in_table_order() {
        assert_eq!(resolve("PRINTSCREEN"), Some(VirtualKey::PRINT_SCREEN));
        assert_eq!(resolve("PRINTSCRN"), Some(VirtualKey::PRINT_SCREEN));
        assert_eq!(resolve("PRINT"), Some(VirtualKey::PRINT));
        assert_eq!(resolve("PLAY"), Some(VirtualKey::PLAY));
        assert_eq!(resolve("PAUSE"), Some(VirtualKey::PAUSE));
        assert_eq!(resolve("LWIN"), Some(VirtualKey::LWIN));
        assert_eq!(resolve("RWIN"), Some(VirtualKey::RWIN));
        assert_eq!(resolve("WIN"), Some(VirtualKey::LWIN));
        assert_eq!(resolve("LEFT"), Some(VirtualKey::LEFT));
        assert_eq!(resolve("RIGHT"), Some(VirtualKey::RIGHT));
        assert_eq!(resolve("SPC"), Some(VirtualKey::SPACE));
        assert_eq!(resolve("CLR"), Some(VirtualKey::OEM_CLEAR));
        assert_eq!(resolve("CAPSLOCK"), Some(VirtualKey::CAPS_LOCK));
        assert_eq!(resolve("END"), Some(VirtualKey::END));
        assert_eq!(resolve("HOME"), Some(VirtualKey::HOME));
        assert_eq!(resolve("INSERT"), Some(VirtualKey::INSERT));
        assert_eq!(resolve("PGUP"), Some(VirtualKey::UP));
    }

    #[test]
    fn paging_names_are_shadowed_by_arrows() {
        assert_eq!(resolve("PAGEUP"), Some(VirtualKey::UP));
        assert_eq!(resolve("PAGEDOWN"), Some(VirtualKey::DOWN));
        assert_eq!(resolve("PGDOWN"), Some(VirtualKey::DOWN));
        assert_eq!(resolve("PRIOR"), Some(VirtualKey::PAGE_UP));
        assert_eq!(resolve("NEXT"), Some(VirtualKey::PAGE_DOWN));
    }

    #[test]
    fn substring_match_wins_over_literal() {
        assert_eq!(resolve("BACKSPACE"), Some(VirtualKey::SPACE));
        assert_eq!(resolve("VOLUMEUP"), Some(VirtualKey::UP));
    }

    #[test]
    fn symbols_map_to_physical_keys() {
        assert_eq!(resolve("]"), Some(VirtualKey::OEM_CLOSE_BRACKETS));
        assert_eq!(resolve("\""), Some(VirtualKey::OEM_QUOTES));
        assert_eq!(resolve("_"), resolve("-"));
        assert_eq!(resolve("~"), resolve("`"));
        assert_eq!(resolve("*"), Some(VirtualKey::MULTIPLY));
        assert_eq!(resolve("!"), Some(VirtualKey::D1));
        assert_eq!(resolve("("), Some(VirtualKey::D9));
        assert_eq!(resolve(")"), Some(VirtualKey::D0));
        assert_eq!(resolve("8"), Some(VirtualKey::D8));
    }

    #[test]
    fn every_symbol_parses_without_modifiers() {
        for &(symbol, vk) in SYMBOL_KEYS {
            let spec = crate::keyspec::parse(symbol).unwrap();
            assert_eq!(spec.key(), vk, "{symbol}");
            assert_eq!(spec.modifiers(), Modifiers::empty(), "{symbol}");
        }
    }

    #[test]
    fn every_reachable_named_key_parses_without_modifiers() {
        for (i, &(name, vk)) in NAMED_KEYS.iter().enumerate() {
            let shadowed = NAMED_KEYS[..i]
                .iter()
                .any(|(earlier, _)| name.contains(earlier));
            if shadowed {
                continue;
            }
            let spec = crate::keyspec::parse(name).unwrap();
            assert_eq!(spec.key(), vk, "{name}");
            assert_eq!(spec.modifiers(), Modifiers::empty(), "{name}");
        }
        for name in ["UP", "DOWN", "SPACE", "CLEAR", "ESCAPE"] {
            assert!(crate::keyspec::parse(name).is_ok(), "{name}");
        }
        assert_eq!(resolve("UP"), Some(VirtualKey::UP));
        assert_eq!(resolve("DOWN"), Some(VirtualKey::DOWN));
        assert_eq!(resolve("SPACE"), Some(VirtualKey::SPACE));
        assert_eq!(resolve("CLEAR"), Some(VirtualKey::OEM_CLEAR));
        assert_eq!(resolve("ESCAPE"), Some(VirtualKey::ESCAPE));
    }

    #[test]
    fn function_key_constants() {
        assert_eq!(VirtualKey::F2, VirtualKey(0x71));
        assert_eq!(VirtualKey::F12, VirtualKey(0x7B));
        assert_eq!(VirtualKey::function(3), Some(VirtualKey::F3));
    }

    #[test]
    fn literal_names() {
        assert_eq!(resolve("A"), Some(VirtualKey::A));
        assert_eq!(resolve("Z"), Some(VirtualKey::Z));
        assert_eq!(resolve("F1"), Some(VirtualKey::F1));
        assert_eq!(resolve("F24"), Some(VirtualKey::F24));
        assert_eq!(resolve("F25"), None);
        assert_eq!(resolve("D7"), Some(VirtualKey::D7));
        assert_eq!(resolve("NUMPAD3"), Some(VirtualKey(0x63)));
        assert_eq!(resolve("ENTER"), Some(VirtualKey::RETURN));
        assert_eq!(resolve("DELETE"), Some(VirtualKey::DELETE));
        assert_eq!(resolve("TAB"), Some(VirtualKey::TAB));
    }

    #[test]
    fn unknown_tokens() {
        assert_eq!(resolve("NOPE"), None);
        assert_eq!(resolve("a"), None);
        assert_eq!(resolve("=="), None);
    }

    #[test]
    fn display_names() {
        assert_eq!(VirtualKey::A.to_string(), "A");
        assert_eq!(VirtualKey::F1.to_string(), "F1");
        assert_eq!(VirtualKey::D3.to_string(), "D3");
        assert_eq!(VirtualKey::RETURN.to_string(), "RETURN");
        assert_eq!(VirtualKey::NONE.to_string(), "NONE");
        assert_eq!(VirtualKey(0x07).to_string(), "0x07");
    }
}
