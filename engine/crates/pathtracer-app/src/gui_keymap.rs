//! 平台 KeyCode 到 imgui Key 的映射
//!
//! 字母、数字、功能键、小键盘数字是连续区间，直接按序号查表；
//! 其余按键的表在第一次使用时构建。

use std::collections::HashMap;
use std::sync::OnceLock;

use imgui::Key;
use pathtracer_platform::input_event::KeyCode;

static LETTERS: [Key; 26] = [
    Key::A,
    Key::B,
    Key::C,
    Key::D,
    Key::E,
    Key::F,
    Key::G,
    Key::H,
    Key::I,
    Key::J,
    Key::K,
    Key::L,
    Key::M,
    Key::N,
    Key::O,
    Key::P,
    Key::Q,
    Key::R,
    Key::S,
    Key::T,
    Key::U,
    Key::V,
    Key::W,
    Key::X,
    Key::Y,
    Key::Z,
];

static DIGITS: [Key; 10] = [
    Key::Alpha0,
    Key::Alpha1,
    Key::Alpha2,
    Key::Alpha3,
    Key::Alpha4,
    Key::Alpha5,
    Key::Alpha6,
    Key::Alpha7,
    Key::Alpha8,
    Key::Alpha9,
];

static FUNCTIONS: [Key; 12] = [
    Key::F1,
    Key::F2,
    Key::F3,
    Key::F4,
    Key::F5,
    Key::F6,
    Key::F7,
    Key::F8,
    Key::F9,
    Key::F10,
    Key::F11,
    Key::F12,
];

static KEYPAD_DIGITS: [Key; 10] = [
    Key::Keypad0,
    Key::Keypad1,
    Key::Keypad2,
    Key::Keypad3,
    Key::Keypad4,
    Key::Keypad5,
    Key::Keypad6,
    Key::Keypad7,
    Key::Keypad8,
    Key::Keypad9,
];

fn named_keys() -> &'static HashMap<KeyCode, &'static [Key]> {
    static NAMED_KEYS: OnceLock<HashMap<KeyCode, &'static [Key]>> = OnceLock::new();
    NAMED_KEYS.get_or_init(|| {
        let table: [(KeyCode, &'static [Key]); 45] = [
            (KeyCode::Escape, &[Key::Escape]),
            (KeyCode::Enter, &[Key::Enter]),
            (KeyCode::Tab, &[Key::Tab]),
            (KeyCode::Backspace, &[Key::Backspace]),
            (KeyCode::Space, &[Key::Space]),
            (KeyCode::Insert, &[Key::Insert]),
            (KeyCode::Delete, &[Key::Delete]),
            (KeyCode::Home, &[Key::Home]),
            (KeyCode::End, &[Key::End]),
            (KeyCode::PageUp, &[Key::PageUp]),
            (KeyCode::PageDown, &[Key::PageDown]),
            (KeyCode::ArrowLeft, &[Key::LeftArrow]),
            (KeyCode::ArrowRight, &[Key::RightArrow]),
            (KeyCode::ArrowUp, &[Key::UpArrow]),
            (KeyCode::ArrowDown, &[Key::DownArrow]),
            (KeyCode::CapsLock, &[Key::CapsLock]),
            (KeyCode::ScrollLock, &[Key::ScrollLock]),
            (KeyCode::NumLock, &[Key::NumLock]),
            (KeyCode::PrintScreen, &[Key::PrintScreen]),
            (KeyCode::Pause, &[Key::Pause]),
            (KeyCode::ContextMenu, &[Key::Menu]),
            (KeyCode::Minus, &[Key::Minus]),
            (KeyCode::Equal, &[Key::Equal]),
            (KeyCode::BracketLeft, &[Key::LeftBracket]),
            (KeyCode::BracketRight, &[Key::RightBracket]),
            (KeyCode::Backslash, &[Key::Backslash]),
            (KeyCode::Semicolon, &[Key::Semicolon]),
            (KeyCode::Quote, &[Key::Apostrophe]),
            (KeyCode::Comma, &[Key::Comma]),
            (KeyCode::Period, &[Key::Period]),
            (KeyCode::Slash, &[Key::Slash]),
            (KeyCode::Backquote, &[Key::GraveAccent]),
            (KeyCode::NumpadDecimal, &[Key::KeypadDecimal]),
            (KeyCode::NumpadDivide, &[Key::KeypadDivide]),
            (KeyCode::NumpadMultiply, &[Key::KeypadMultiply]),
            (KeyCode::NumpadSubtract, &[Key::KeypadSubtract]),
            (KeyCode::NumpadAdd, &[Key::KeypadAdd]),
            (KeyCode::NumpadEnter, &[Key::KeypadEnter]),
            (KeyCode::NumpadEqual, &[Key::KeypadEqual]),
            // 修饰键同时映射到具体的按键和 imgui 的修饰状态
            (KeyCode::ShiftLeft, &[Key::LeftShift, Key::ModShift]),
            (KeyCode::ShiftRight, &[Key::RightShift, Key::ModShift]),
            (KeyCode::ControlLeft, &[Key::LeftCtrl, Key::ModCtrl]),
            (KeyCode::ControlRight, &[Key::RightCtrl, Key::ModCtrl]),
            (KeyCode::AltLeft, &[Key::LeftAlt, Key::ModAlt]),
            (KeyCode::AltRight, &[Key::RightAlt, Key::ModAlt]),
        ];
        let mut map: HashMap<KeyCode, &'static [Key]> = table.into_iter().collect();
        map.insert(KeyCode::SuperLeft, &[Key::LeftSuper, Key::ModSuper]);
        map.insert(KeyCode::SuperRight, &[Key::RightSuper, Key::ModSuper]);
        map
    })
}

/// 一个平台按键对应的 imgui 按键，无法映射时为空
pub fn imgui_keys(key_code: KeyCode) -> &'static [Key] {
    if let Some(index) = key_code.letter_index() {
        std::slice::from_ref(&LETTERS[index])
    } else if let Some(index) = key_code.digit_index() {
        std::slice::from_ref(&DIGITS[index])
    } else if let Some(index) = key_code.function_index() {
        std::slice::from_ref(&FUNCTIONS[index])
    } else if let Some(index) = key_code.numpad_digit_index() {
        std::slice::from_ref(&KEYPAD_DIGITS[index])
    } else {
        named_keys().get(&key_code).copied().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_ranges() {
        assert_eq!(imgui_keys(KeyCode::KeyA), &[Key::A]);
        assert_eq!(imgui_keys(KeyCode::KeyZ), &[Key::Z]);
        assert_eq!(imgui_keys(KeyCode::F12), &[Key::F12]);
    }

    #[test]
    fn digits_and_numpad_are_not_swapped() {
        assert_eq!(imgui_keys(KeyCode::Digit3), &[Key::Alpha3]);
        assert_eq!(imgui_keys(KeyCode::Numpad3), &[Key::Keypad3]);
    }

    #[test]
    fn modifiers_map_to_side_key_and_mod() {
        assert_eq!(imgui_keys(KeyCode::ControlRight), &[Key::RightCtrl, Key::ModCtrl]);
        assert_eq!(imgui_keys(KeyCode::SuperLeft), &[Key::LeftSuper, Key::ModSuper]);
        assert!(imgui_keys(KeyCode::Other).is_empty());
    }
}
