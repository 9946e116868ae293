// 参考 winit::MouseButton
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

// 参考 winit::ElementState
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum ElementState {
    Pressed,
    Released,
}

/// 参考 winit::KeyCode
///
/// 字母、数字、功能键、小键盘数字各自占据一段连续的取值，
/// 可以通过 `key as u16 - 起始值` 直接得到区间内的序号
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyCode {
    KeyA = 0,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF,
    KeyG,
    KeyH,
    KeyI,
    KeyJ,
    KeyK,
    KeyL,
    KeyM,
    KeyN,
    KeyO,
    KeyP,
    KeyQ,
    KeyR,
    KeyS,
    KeyT,
    KeyU,
    KeyV,
    KeyW,
    KeyX,
    KeyY,
    KeyZ,

    Digit0 = 32,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,

    F1 = 48,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,

    Numpad0 = 64,
    Numpad1,
    Numpad2,
    Numpad3,
    Numpad4,
    Numpad5,
    Numpad6,
    Numpad7,
    Numpad8,
    Numpad9,
    NumpadDecimal,
    NumpadDivide,
    NumpadMultiply,
    NumpadSubtract,
    NumpadAdd,
    NumpadEnter,
    NumpadEqual,

    Escape = 96,
    Enter,
    Tab,
    Backspace,
    Space,
    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    CapsLock,
    ScrollLock,
    NumLock,
    PrintScreen,
    Pause,
    ContextMenu,

    Minus = 128,
    Equal,
    BracketLeft,
    BracketRight,
    Backslash,
    Semicolon,
    Quote,
    Comma,
    Period,
    Slash,
    Backquote,

    ShiftLeft = 160,
    ShiftRight,
    ControlLeft,
    ControlRight,
    AltLeft,
    AltRight,
    SuperLeft,
    SuperRight,

    Other = 0xFFFF,
}
// 连续区间
impl KeyCode {
    const LETTERS: [KeyCode; 26] = [
        Self::KeyA,
        Self::KeyB,
        Self::KeyC,
        Self::KeyD,
        Self::KeyE,
        Self::KeyF,
        Self::KeyG,
        Self::KeyH,
        Self::KeyI,
        Self::KeyJ,
        Self::KeyK,
        Self::KeyL,
        Self::KeyM,
        Self::KeyN,
        Self::KeyO,
        Self::KeyP,
        Self::KeyQ,
        Self::KeyR,
        Self::KeyS,
        Self::KeyT,
        Self::KeyU,
        Self::KeyV,
        Self::KeyW,
        Self::KeyX,
        Self::KeyY,
        Self::KeyZ,
    ];
    const DIGITS: [KeyCode; 10] = [
        Self::Digit0,
        Self::Digit1,
        Self::Digit2,
        Self::Digit3,
        Self::Digit4,
        Self::Digit5,
        Self::Digit6,
        Self::Digit7,
        Self::Digit8,
        Self::Digit9,
    ];
    const FUNCTIONS: [KeyCode; 12] = [
        Self::F1,
        Self::F2,
        Self::F3,
        Self::F4,
        Self::F5,
        Self::F6,
        Self::F7,
        Self::F8,
        Self::F9,
        Self::F10,
        Self::F11,
        Self::F12,
    ];
    const NUMPAD_DIGITS: [KeyCode; 10] = [
        Self::Numpad0,
        Self::Numpad1,
        Self::Numpad2,
        Self::Numpad3,
        Self::Numpad4,
        Self::Numpad5,
        Self::Numpad6,
        Self::Numpad7,
        Self::Numpad8,
        Self::Numpad9,
    ];

    #[inline]
    fn range_index(self, first: KeyCode, len: usize) -> Option<usize> {
        let index = (self as u16).checked_sub(first as u16)? as usize;
        (index < len).then_some(index)
    }

    /// A-Z 的序号 0..26
    #[inline]
    pub fn letter_index(self) -> Option<usize> {
        self.range_index(Self::KeyA, Self::LETTERS.len())
    }

    /// 主键盘数字 0..10
    #[inline]
    pub fn digit_index(self) -> Option<usize> {
        self.range_index(Self::Digit0, Self::DIGITS.len())
    }

    /// F1..F12 的序号 0..12
    #[inline]
    pub fn function_index(self) -> Option<usize> {
        self.range_index(Self::F1, Self::FUNCTIONS.len())
    }

    /// 小键盘数字 0..10
    #[inline]
    pub fn numpad_digit_index(self) -> Option<usize> {
        self.range_index(Self::Numpad0, Self::NUMPAD_DIGITS.len())
    }

    #[inline]
    pub fn letter(index: usize) -> Option<Self> {
        Self::LETTERS.get(index).copied()
    }

    #[inline]
    pub fn digit(index: usize) -> Option<Self> {
        Self::DIGITS.get(index).copied()
    }

    #[inline]
    pub fn function(index: usize) -> Option<Self> {
        Self::FUNCTIONS.get(index).copied()
    }

    #[inline]
    pub fn numpad_digit(index: usize) -> Option<Self> {
        Self::NUMPAD_DIGITS.get(index).copied()
    }
}

/// 输入事件类型
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// 键盘按键事件
    KeyboardInput {
        key_code: KeyCode,
        state: ElementState,
    },
    /// 文字输入
    ReceivedCharacter(char),
    /// 鼠标按键事件
    MouseButtonInput {
        button: MouseButton,
        state: ElementState,
    },
    /// 鼠标移动事件
    MouseMoved {
        physical_position: [f64; 2],
    },
    /// 鼠标滚轮事件，单位为行：[横向, 纵向]
    MouseWheel {
        delta: [f64; 2],
    },
    /// 窗口大小改变事件
    Resized {
        physical_width: u32,
        physical_height: u32,
    },
    /// DPI 缩放改变
    ScaleFactorChanged {
        scale_factor: f64,
    },

    Other,
}
