use crate::input_event::{ElementState, InputEvent};
use crate::input_state::InputState;
use crossbeam_channel::{Receiver, Sender};

/// 可以跨线程发送输入事件的句柄
///
/// 窗口线程持有 InputSender，渲染线程持有 InputManager
#[derive(Clone)]
pub struct InputSender {
    sender: Sender<InputEvent>,
}
impl InputSender {
    /// 发送事件，InputManager 已经被销毁时返回 false
    pub fn send(&self, event: InputEvent) -> bool {
        self.sender.send(event).is_ok()
    }
}

/// 输入管理器
///
/// 事件可能来自其他线程，先缓存在 channel 中，
/// 每帧由 [`InputManager::process_events`] 按到达顺序一次性取出
pub struct InputManager {
    /// 输入状态
    state: InputState,
    sender: Sender<InputEvent>,
    receiver: Receiver<InputEvent>,
    /// 本帧取出的事件
    frame_events: Vec<InputEvent>,
}
impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}
// getter
impl InputManager {
    #[inline]
    pub fn state(&self) -> &InputState {
        &self.state
    }

    /// 本帧的事件，按到达顺序
    #[inline]
    pub fn frame_events(&self) -> &[InputEvent] {
        &self.frame_events
    }

    pub fn sender(&self) -> InputSender {
        InputSender {
            sender: self.sender.clone(),
        }
    }
}
impl InputManager {
    /// 创建新的输入管理器
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            state: InputState {
                scale_factor: 1.0,
                ..Default::default()
            },
            sender,
            receiver,
            frame_events: Vec::new(),
        }
    }

    /// 在当前线程中推送事件
    pub fn push_event(&mut self, event: InputEvent) {
        // receiver 由 self 持有，不会失败
        let _ = self.sender.send(event);
    }

    /// 更新输入状态
    /// 取出队列中的所有事件，更新输入状态；返回本帧的事件
    pub fn process_events(&mut self) -> &[InputEvent] {
        // 滚轮增量只统计本帧
        self.state.wheel_delta = [0.0, 0.0];

        self.frame_events.clear();
        self.frame_events.extend(self.receiver.try_iter());

        for event in &self.frame_events {
            match *event {
                InputEvent::KeyboardInput { key_code, state } => {
                    self.state.key_pressed.insert(key_code, state == ElementState::Pressed);
                }
                InputEvent::MouseButtonInput { button, state } => {
                    self.state.mouse_pressed.insert(button, state == ElementState::Pressed);
                }
                InputEvent::MouseMoved { physical_position } => {
                    self.state.crt_mouse_pos = physical_position;
                }
                InputEvent::MouseWheel { delta } => {
                    self.state.wheel_delta[0] += delta[0];
                    self.state.wheel_delta[1] += delta[1];
                }
                InputEvent::Resized {
                    physical_width,
                    physical_height,
                } => {
                    self.state.window_size = Some([physical_width, physical_height]);
                }
                InputEvent::ScaleFactorChanged { scale_factor } => {
                    self.state.scale_factor = scale_factor;
                }
                InputEvent::ReceivedCharacter(_) | InputEvent::Other => {}
            }
        }

        if !self.frame_events.is_empty() {
            log::trace!("processed {} input events", self.frame_events.len());
        }
        &self.frame_events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input_event::{KeyCode, MouseButton};

    #[test]
    fn events_from_other_thread_drain_in_order_once() {
        let mut manager = InputManager::new();
        let sender = manager.sender();

        std::thread::spawn(move || {
            sender.send(InputEvent::MouseMoved {
                physical_position: [1.0, 2.0],
            });
            sender.send(InputEvent::KeyboardInput {
                key_code: KeyCode::ControlLeft,
                state: ElementState::Pressed,
            });
            sender.send(InputEvent::MouseMoved {
                physical_position: [3.0, 4.0],
            });
        })
        .join()
        .unwrap();

        let events = manager.process_events().to_vec();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[2],
            InputEvent::MouseMoved {
                physical_position: [3.0, 4.0]
            }
        );
        assert_eq!(manager.state().get_mouse_position(), [3.0, 4.0]);
        assert!(manager.state().is_ctrl_down());
        assert!(!manager.state().is_shift_down());

        // 已经取出的事件不会再出现
        assert!(manager.process_events().is_empty());
        assert!(manager.state().is_key_down(KeyCode::ControlLeft));
    }

    #[test]
    fn wheel_is_per_frame_and_buttons_persist() {
        let mut manager = InputManager::new();
        manager.push_event(InputEvent::MouseWheel { delta: [0.0, 1.0] });
        manager.push_event(InputEvent::MouseWheel { delta: [0.0, 2.0] });
        manager.push_event(InputEvent::MouseButtonInput {
            button: MouseButton::Left,
            state: ElementState::Pressed,
        });
        manager.process_events();
        assert_eq!(manager.state().wheel_delta, [0.0, 3.0]);

        manager.process_events();
        assert_eq!(manager.state().wheel_delta, [0.0, 0.0]);
        assert!(manager.state().is_mouse_down(MouseButton::Left));
    }

    #[test]
    fn sender_reports_dropped_manager() {
        let manager = InputManager::new();
        let sender = manager.sender();
        drop(manager);
        assert!(!sender.send(InputEvent::Other));
    }
}
