use crate::input_event::{KeyCode, MouseButton};
use std::collections::HashMap;

/// 记录输入信息
#[derive(Default, Clone, Debug)]
pub struct InputState {
    /// 当前帧的鼠标位置 pixel
    pub crt_mouse_pos: [f64; 2],
    pub mouse_pressed: HashMap<MouseButton, bool>,
    pub key_pressed: HashMap<KeyCode, bool>,
    /// 本帧累计的滚轮增量
    pub wheel_delta: [f64; 2],
    /// 最近一次 Resized 事件
    pub window_size: Option<[u32; 2]>,
    pub scale_factor: f64,
}

impl InputState {
    /// 检查键盘按键是否被按下
    pub fn is_key_down(&self, key_code: KeyCode) -> bool {
        self.key_pressed.get(&key_code).copied().unwrap_or(false)
    }

    /// 任意一个按键被按下，用于左右两侧的修饰键
    pub fn is_any_key_down(&self, key_codes: &[KeyCode]) -> bool {
        key_codes.iter().any(|key| self.is_key_down(*key))
    }

    pub fn is_ctrl_down(&self) -> bool {
        self.is_any_key_down(&[KeyCode::ControlLeft, KeyCode::ControlRight])
    }

    pub fn is_shift_down(&self) -> bool {
        self.is_any_key_down(&[KeyCode::ShiftLeft, KeyCode::ShiftRight])
    }

    pub fn is_alt_down(&self) -> bool {
        self.is_any_key_down(&[KeyCode::AltLeft, KeyCode::AltRight])
    }

    pub fn is_super_down(&self) -> bool {
        self.is_any_key_down(&[KeyCode::SuperLeft, KeyCode::SuperRight])
    }

    pub fn is_mouse_down(&self, button: MouseButton) -> bool {
        self.mouse_pressed.get(&button).copied().unwrap_or(false)
    }

    /// 获取鼠标位置
    pub fn get_mouse_position(&self) -> [f64; 2] {
        self.crt_mouse_pos
    }
}
