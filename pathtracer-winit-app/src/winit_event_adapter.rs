use pathtracer_platform::input_event::{ElementState, InputEvent, KeyCode, MouseButton};
use winit::event::{KeyEvent, WindowEvent};
use winit::keyboard::PhysicalKey;

/// winit 与平台 KeyCode 同名的按键
macro_rules! same_name_keys {
    ($key:expr; $($name:ident),* $(,)?) => {
        match $key {
            $(winit::keyboard::KeyCode::$name => KeyCode::$name,)*
            _ => KeyCode::Other,
        }
    };
}

pub struct WinitEventAdapter {}
impl WinitEventAdapter {
    /// 一个窗口事件可能对应多个输入事件（按键 + 文字输入），无关的事件返回空
    pub fn from_winit_event(event: &WindowEvent) -> Vec<InputEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => vec![InputEvent::MouseMoved {
                physical_position: [position.x, position.y],
            }],
            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    winit::event::MouseScrollDelta::LineDelta(x, y) => [*x as f64, *y as f64],
                    // 像素滚动量粗略换算成行
                    winit::event::MouseScrollDelta::PixelDelta(pos) => [pos.x / 100.0, pos.y / 100.0],
                };
                vec![InputEvent::MouseWheel { delta }]
            }
            WindowEvent::MouseInput { state, button, .. } => vec![InputEvent::MouseButtonInput {
                button: Self::button_from_winit(*button),
                state: Self::state_from_winit(*state),
            }],
            WindowEvent::KeyboardInput { event, .. } => Self::keyboard_from_winit(event),
            WindowEvent::Resized(physical_size) => vec![InputEvent::Resized {
                physical_width: physical_size.width,
                physical_height: physical_size.height,
            }],
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => vec![InputEvent::ScaleFactorChanged {
                scale_factor: *scale_factor,
            }],
            _ => Vec::new(),
        }
    }

    fn keyboard_from_winit(event: &KeyEvent) -> Vec<InputEvent> {
        let mut events = Vec::with_capacity(2);
        let state = Self::state_from_winit(event.state);

        if let PhysicalKey::Code(key_code) = event.physical_key {
            events.push(InputEvent::KeyboardInput {
                key_code: Self::key_from_winit(key_code),
                state,
            });
        }
        if state == ElementState::Pressed {
            if let Some(text) = &event.text {
                events.extend(text.chars().map(InputEvent::ReceivedCharacter));
            }
        }
        events
    }

    fn button_from_winit(button: winit::event::MouseButton) -> MouseButton {
        match button {
            winit::event::MouseButton::Left => MouseButton::Left,
            winit::event::MouseButton::Right => MouseButton::Right,
            winit::event::MouseButton::Middle => MouseButton::Middle,
            winit::event::MouseButton::Back => MouseButton::Back,
            winit::event::MouseButton::Forward => MouseButton::Forward,
            winit::event::MouseButton::Other(code) => MouseButton::Other(code),
        }
    }

    pub fn key_from_winit(key: winit::keyboard::KeyCode) -> KeyCode {
        same_name_keys!(key;
            KeyA, KeyB, KeyC, KeyD, KeyE, KeyF, KeyG, KeyH, KeyI, KeyJ, KeyK, KeyL, KeyM,
            KeyN, KeyO, KeyP, KeyQ, KeyR, KeyS, KeyT, KeyU, KeyV, KeyW, KeyX, KeyY, KeyZ,
            Digit0, Digit1, Digit2, Digit3, Digit4, Digit5, Digit6, Digit7, Digit8, Digit9,
            F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
            Numpad0, Numpad1, Numpad2, Numpad3, Numpad4, Numpad5, Numpad6, Numpad7, Numpad8, Numpad9,
            NumpadDecimal, NumpadDivide, NumpadMultiply, NumpadSubtract, NumpadAdd, NumpadEnter, NumpadEqual,
            Escape, Enter, Tab, Backspace, Space, Insert, Delete, Home, End, PageUp, PageDown,
            ArrowLeft, ArrowRight, ArrowUp, ArrowDown,
            CapsLock, ScrollLock, NumLock, PrintScreen, Pause, ContextMenu,
            Minus, Equal, BracketLeft, BracketRight, Backslash, Semicolon, Quote, Comma, Period, Slash, Backquote,
            ShiftLeft, ShiftRight, ControlLeft, ControlRight, AltLeft, AltRight, SuperLeft, SuperRight,
        )
    }

    fn state_from_winit(state: winit::event::ElementState) -> ElementState {
        match state {
            winit::event::ElementState::Pressed => ElementState::Pressed,
            winit::event::ElementState::Released => ElementState::Released,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_keep_their_names() {
        assert_eq!(WinitEventAdapter::key_from_winit(winit::keyboard::KeyCode::KeyQ), KeyCode::KeyQ);
        assert_eq!(WinitEventAdapter::key_from_winit(winit::keyboard::KeyCode::Numpad7), KeyCode::Numpad7);
        assert_eq!(WinitEventAdapter::key_from_winit(winit::keyboard::KeyCode::SuperRight), KeyCode::SuperRight);
        assert_eq!(WinitEventAdapter::key_from_winit(winit::keyboard::KeyCode::F24), KeyCode::Other);
    }

    #[test]
    fn resize_is_forwarded() {
        let events = WinitEventAdapter::from_winit_event(&WindowEvent::Resized(winit::dpi::PhysicalSize::new(640, 480)));
        assert_eq!(
            events,
            [InputEvent::Resized {
                physical_width: 640,
                physical_height: 480
            }]
        );
        assert!(WinitEventAdapter::from_winit_event(&WindowEvent::Focused(true)).is_empty());
    }
}
