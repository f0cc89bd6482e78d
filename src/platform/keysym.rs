//! Virtual-key code → X11 keysym translation.

use crate::keyspec::VirtualKey;

/// X11 keysym for a virtual-key code. `None` for keys X11 has no keysym for
/// (and for [`VirtualKey::NONE`]).
pub fn keysym_for(key: VirtualKey) -> Option<u32> {
    let code = u32::from(key.code());
    let sym = match code {
        // Letters map to the lowercase keysyms; shift is a modifier.
        0x41..=0x5A => code + 0x20,
        0x30..=0x39 => code,
        0x60..=0x69 => 0xffb0 + (code - 0x60),
        0x70..=0x87 => 0xffbe + (code - 0x70),
        0x08 => 0xff08,
        0x09 => 0xff09,
        0x0C => 0xff0b,
        0x0D => 0xff0d,
        0x10 => 0xffe1,
        0x11 => 0xffe3,
        0x12 => 0xffe9,
        0x13 => 0xff13,
        0x14 => 0xffe5,
        0x1B => 0xff1b,
        0x20 => 0x0020,
        0x21 => 0xff55,
        0x22 => 0xff56,
        0x23 => 0xff57,
        0x24 => 0xff50,
        0x25 => 0xff51,
        0x26 => 0xff52,
        0x27 => 0xff53,
        0x28 => 0xff54,
        0x29 => 0xff60,
        0x2A => 0xff61,
        0x2B => 0xff62,
        0x2C => 0xff61,
        0x2D => 0xff63,
        0x2E => 0xffff,
        0x2F => 0xff6a,
        0x5B => 0xffeb,
        0x5C => 0xffec,
        0x5D => 0xff67,
        0x5F => 0x1008ff2f,
        0x6A => 0xffaa,
        0x6B => 0xffab,
        0x6C => 0xffac,
        0x6D => 0xffad,
        0x6E => 0xffae,
        0x6F => 0xffaf,
        0x90 => 0xff7f,
        0x91 => 0xff14,
        0xA0 => 0xffe1,
        0xA1 => 0xffe2,
        0xA2 => 0xffe3,
        0xA3 => 0xffe4,
        0xA4 => 0xffe9,
        0xA5 => 0xffea,
        0xAD => 0x1008ff12,
        0xAE => 0x1008ff11,
        0xAF => 0x1008ff13,
        0xB0 => 0x1008ff17,
        0xB1 => 0x1008ff16,
        0xB2 => 0x1008ff15,
        0xB3 => 0x1008ff14,
        0xBA => 0x003b,
        0xBB => 0x003d,
        0xBC => 0x002c,
        0xBD => 0x002d,
        0xBE => 0x002e,
        0xBF => 0x002f,
        0xC0 => 0x0060,
        0xDB => 0x005b,
        0xDC => 0x005c,
        0xDD => 0x005d,
        0xDE => 0x0027,
        0xE2 => 0x005c,
        0xFA => 0x1008ff14,
        0xFE => 0xff0b,
        _ => return None,
    };
    Some(sym)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_are_lowercase_keysyms() {
        assert_eq!(keysym_for(VirtualKey::A), Some(0x61));
        assert_eq!(keysym_for(VirtualKey::Z), Some(0x7a));
    }

    #[test]
    fn function_keys() {
        assert_eq!(keysym_for(VirtualKey::F1), Some(0xffbe));
        assert_eq!(keysym_for(VirtualKey::F24), Some(0xffd5));
    }

    #[test]
    fn navigation_and_punctuation() {
        assert_eq!(keysym_for(VirtualKey::ESCAPE), Some(0xff1b));
        assert_eq!(keysym_for(VirtualKey::UP), Some(0xff52));
        assert_eq!(keysym_for(VirtualKey::OEM_CLOSE_BRACKETS), Some(0x5d));
        assert_eq!(keysym_for(VirtualKey::D1), Some(0x31));
    }

    #[test]
    fn none_and_unknown() {
        assert_eq!(keysym_for(VirtualKey::NONE), None);
        assert_eq!(keysym_for(VirtualKey(0x07)), None);
    }
}
