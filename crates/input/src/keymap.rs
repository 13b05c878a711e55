//! Host key normalization.
//!
//! Kernels receive legacy DOM `keyCode` integers (A = 65, Enter = 13, Left = 37).
//! Physical keys with no legacy code map to [`KeyCode::UNIDENTIFIED`], which is
//! what browsers report for keys they cannot name. Those are still forwarded.

use harness_common::KeyCode;
use winit::keyboard::{KeyCode as Physical, PhysicalKey};

/// Normalize a winit physical key into the kernel's integer key code.
pub fn dom_key_code(key: PhysicalKey) -> KeyCode {
    match key {
        PhysicalKey::Code(code) => KeyCode(legacy_code(code).unwrap_or(0)),
        PhysicalKey::Unidentified(_) => KeyCode::UNIDENTIFIED,
    }
}

fn legacy_code(code: Physical) -> Option<u32> {
    let n = match code {
        Physical::Backspace => 8,
        Physical::Tab => 9,
        Physical::Enter | Physical::NumpadEnter => 13,
        Physical::ShiftLeft | Physical::ShiftRight => 16,
        Physical::ControlLeft | Physical::ControlRight => 17,
        Physical::AltLeft | Physical::AltRight => 18,
        Physical::Pause => 19,
        Physical::CapsLock => 20,
        Physical::Escape => 27,
        Physical::Space => 32,
        Physical::PageUp => 33,
        Physical::PageDown => 34,
        Physical::End => 35,
        Physical::Home => 36,
        Physical::ArrowLeft => 37,
        Physical::ArrowUp => 38,
        Physical::ArrowRight => 39,
        Physical::ArrowDown => 40,
        Physical::PrintScreen => 44,
        Physical::Insert => 45,
        Physical::Delete => 46,
        Physical::Digit0 => 48,
        Physical::Digit1 => 49,
        Physical::Digit2 => 50,
        Physical::Digit3 => 51,
        Physical::Digit4 => 52,
        Physical::Digit5 => 53,
        Physical::Digit6 => 54,
        Physical::Digit7 => 55,
        Physical::Digit8 => 56,
        Physical::Digit9 => 57,
        Physical::KeyA => 65,
        Physical::KeyB => 66,
        Physical::KeyC => 67,
        Physical::KeyD => 68,
        Physical::KeyE => 69,
        Physical::KeyF => 70,
        Physical::KeyG => 71,
        Physical::KeyH => 72,
        Physical::KeyI => 73,
        Physical::KeyJ => 74,
        Physical::KeyK => 75,
        Physical::KeyL => 76,
        Physical::KeyM => 77,
        Physical::KeyN => 78,
        Physical::KeyO => 79,
        Physical::KeyP => 80,
        Physical::KeyQ => 81,
        Physical::KeyR => 82,
        Physical::KeyS => 83,
        Physical::KeyT => 84,
        Physical::KeyU => 85,
        Physical::KeyV => 86,
        Physical::KeyW => 87,
        Physical::KeyX => 88,
        Physical::KeyY => 89,
        Physical::KeyZ => 90,
        Physical::SuperLeft => 91,
        Physical::SuperRight => 92,
        Physical::ContextMenu => 93,
        Physical::Numpad0 => 96,
        Physical::Numpad1 => 97,
        Physical::Numpad2 => 98,
        Physical::Numpad3 => 99,
        Physical::Numpad4 => 100,
        Physical::Numpad5 => 101,
        Physical::Numpad6 => 102,
        Physical::Numpad7 => 103,
        Physical::Numpad8 => 104,
        Physical::Numpad9 => 105,
        Physical::NumpadMultiply => 106,
        Physical::NumpadAdd => 107,
        Physical::NumpadSubtract => 109,
        Physical::NumpadDecimal => 110,
        Physical::NumpadDivide => 111,
        Physical::F1 => 112,
        Physical::F2 => 113,
        Physical::F3 => 114,
        Physical::F4 => 115,
        Physical::F5 => 116,
        Physical::F6 => 117,
        Physical::F7 => 118,
        Physical::F8 => 119,
        Physical::F9 => 120,
        Physical::F10 => 121,
        Physical::F11 => 122,
        Physical::F12 => 123,
        Physical::NumLock => 144,
        Physical::ScrollLock => 145,
        Physical::Semicolon => 186,
        Physical::Equal => 187,
        Physical::Comma => 188,
        Physical::Minus => 189,
        Physical::Period => 190,
        Physical::Slash => 191,
        Physical::Backquote => 192,
        Physical::BracketLeft => 219,
        Physical::Backslash => 220,
        Physical::BracketRight => 221,
        Physical::Quote => 222,
        _ => return None,
    };
    Some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::NativeKeyCode;

    #[test]
    fn letters_digits_and_arrows() {
        assert_eq!(dom_key_code(PhysicalKey::Code(Physical::KeyA)), KeyCode(65));
        assert_eq!(dom_key_code(PhysicalKey::Code(Physical::KeyZ)), KeyCode(90));
        assert_eq!(dom_key_code(PhysicalKey::Code(Physical::Digit7)), KeyCode(55));
        assert_eq!(dom_key_code(PhysicalKey::Code(Physical::ArrowDown)), KeyCode(40));
    }

    #[test]
    fn left_and_right_modifiers_share_a_code() {
        assert_eq!(
            dom_key_code(PhysicalKey::Code(Physical::ShiftLeft)),
            dom_key_code(PhysicalKey::Code(Physical::ShiftRight))
        );
        assert_eq!(
            dom_key_code(PhysicalKey::Code(Physical::NumpadEnter)),
            dom_key_code(PhysicalKey::Code(Physical::Enter))
        );
    }

    #[test]
    fn unknown_keys_map_to_unidentified() {
        assert_eq!(
            dom_key_code(PhysicalKey::Unidentified(NativeKeyCode::Unidentified)),
            KeyCode::UNIDENTIFIED
        );
        assert_eq!(
            dom_key_code(PhysicalKey::Code(Physical::MediaPlayPause)),
            KeyCode::UNIDENTIFIED
        );
    }
}
