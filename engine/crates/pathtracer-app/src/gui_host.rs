use std::time::Duration;

use imgui::TextureId;
use pathtracer_gfx::vk;
use pathtracer_gui_backend::gui_draw_data::GuiDrawData;
use pathtracer_gui_backend::gui_pass::GuiFontAtlas;
use pathtracer_gui_backend::texture_registry::FONT_TEXTURE_ID;
use pathtracer_platform::input_event::{ElementState, InputEvent, MouseButton};
use pathtracer_platform::input_state::InputState;

use crate::gui_keymap;

/// 持有 imgui context，负责把平台输入转交给 imgui，并产出每帧的 draw data
///
/// imgui 的坐标是逻辑像素：`display_size = 物理尺寸 / hidpi_factor`，
/// `framebuffer_scale = hidpi_factor`。
pub struct GuiHost {
    imgui_ctx: imgui::Context,
    hidpi_factor: f64,
    physical_size: vk::Extent2D,
}
// new & init
impl GuiHost {
    const FONT_SIZE: f32 = 13.0;

    pub fn new(hidpi_factor: f64, physical_width: u32, physical_height: u32) -> Self {
        let mut imgui_ctx = imgui::Context::create();
        // disable automatic saving .ini file
        imgui_ctx.set_ini_filename(None);

        // theme
        {
            let style = imgui_ctx.style_mut();
            style.use_dark_colors();
            // WindowBg: 半透明深色背景
            style.colors[imgui::StyleColor::WindowBg as usize] = [0.1, 0.1, 0.1, 0.9];
        }

        let mut host = Self {
            imgui_ctx,
            hidpi_factor,
            physical_size: vk::Extent2D {
                width: physical_width,
                height: physical_height,
            },
        };
        host.apply_display_size();
        host
    }

    /// 构建字体图集，并把字体的 TextureId 固定为 [`FONT_TEXTURE_ID`]
    pub fn build_font_atlas(&mut self) -> GuiFontAtlas {
        let font_size = Self::FONT_SIZE * self.hidpi_factor as f32;

        // 字体按物理像素光栅化，再整体缩放回逻辑像素
        self.imgui_ctx.io_mut().font_global_scale = (1.0 / self.hidpi_factor) as f32;

        let fonts = self.imgui_ctx.fonts();
        fonts.clear();
        fonts.add_font(&[imgui::FontSource::DefaultFontData {
            config: Some(imgui::FontConfig {
                size_pixels: font_size,
                ..Default::default()
            }),
        }]);

        let atlas = {
            let atlas_texture = fonts.build_rgba32_texture();
            GuiFontAtlas {
                width: atlas_texture.width,
                height: atlas_texture.height,
                data: atlas_texture.data.to_vec(),
            }
        };
        // build 会把 TexID 重置为 null，必须在 build 之后设置
        fonts.tex_id = TextureId::new(FONT_TEXTURE_ID);

        atlas
    }
}
// getters
impl GuiHost {
    #[inline]
    pub fn hidpi_factor(&self) -> f64 {
        self.hidpi_factor
    }

    #[inline]
    pub fn physical_size(&self) -> vk::Extent2D {
        self.physical_size
    }

    #[inline]
    pub fn io(&self) -> &imgui::Io {
        self.imgui_ctx.io()
    }
}
// update
impl GuiHost {
    pub fn set_display_size(&mut self, physical_width: u32, physical_height: u32) {
        self.physical_size = vk::Extent2D {
            width: physical_width,
            height: physical_height,
        };
        self.apply_display_size();
    }

    fn apply_display_size(&mut self) {
        let scale = self.hidpi_factor as f32;
        let io = self.imgui_ctx.io_mut();
        io.display_size = [
            self.physical_size.width as f32 / scale,
            self.physical_size.height as f32 / scale,
        ];
        io.display_framebuffer_scale = [scale, scale];
    }

    pub fn handle_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::Resized {
                physical_width,
                physical_height,
            } => self.set_display_size(*physical_width, *physical_height),
            InputEvent::ScaleFactorChanged { scale_factor } => {
                self.hidpi_factor = *scale_factor;
                self.apply_display_size();
            }
            InputEvent::MouseMoved { physical_position } => {
                let hidpi = self.hidpi_factor;
                self.imgui_ctx.io_mut().add_mouse_pos_event([
                    (physical_position[0] / hidpi) as f32,
                    (physical_position[1] / hidpi) as f32,
                ]);
            }
            InputEvent::MouseButtonInput { button, state } => {
                if let Some(mb) = match button {
                    MouseButton::Left => Some(imgui::MouseButton::Left),
                    MouseButton::Right => Some(imgui::MouseButton::Right),
                    MouseButton::Middle => Some(imgui::MouseButton::Middle),
                    MouseButton::Back => Some(imgui::MouseButton::Extra1),
                    MouseButton::Forward => Some(imgui::MouseButton::Extra2),
                    MouseButton::Other(_) => None,
                } {
                    let pressed = *state == ElementState::Pressed;
                    self.imgui_ctx.io_mut().add_mouse_button_event(mb, pressed);
                }
            }
            InputEvent::MouseWheel { delta } => {
                self.imgui_ctx.io_mut().add_mouse_wheel_event([delta[0] as f32, delta[1] as f32]);
            }
            InputEvent::KeyboardInput { key_code, state } => {
                let pressed = *state == ElementState::Pressed;
                let io = self.imgui_ctx.io_mut();
                for key in gui_keymap::imgui_keys(*key_code) {
                    io.add_key_event(*key, pressed);
                }
            }
            InputEvent::ReceivedCharacter(ch) => {
                if !ch.is_control() {
                    self.imgui_ctx.io_mut().add_input_character(*ch);
                }
            }
            InputEvent::Other => {}
        }
    }

    /// 焦点切换时可能丢失修饰键的松开事件，每帧按照输入状态重新同步一次
    pub fn sync_modifiers(&mut self, input_state: &InputState) {
        let io = self.imgui_ctx.io_mut();
        io.add_key_event(imgui::Key::ModCtrl, input_state.is_ctrl_down());
        io.add_key_event(imgui::Key::ModShift, input_state.is_shift_down());
        io.add_key_event(imgui::Key::ModAlt, input_state.is_alt_down());
        io.add_key_event(imgui::Key::ModSuper, input_state.is_super_down());
    }

    /// 开始新的一帧，执行 UI 声明，并把结果转换为 [`GuiDrawData`]
    pub fn new_frame(&mut self, duration: Duration, ui_func: impl FnOnce(&imgui::Ui)) -> GuiDrawData {
        let _span = tracy_client::span!("GuiHost::new_frame");

        // imgui 要求 delta time 严格大于 0
        self.imgui_ctx.io_mut().update_delta_time(duration.max(Duration::from_micros(1)));

        let ui = self.imgui_ctx.new_frame();
        ui_func(ui);

        let draw_data = self.imgui_ctx.render();
        GuiDrawData::from_imgui(draw_data)
    }
}

/// 同一进程内只能存在一个 imgui context，测试之间需要串行
#[cfg(test)]
pub(crate) static IMGUI_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;
    use pathtracer_platform::input_event::KeyCode;

    fn lock() -> std::sync::MutexGuard<'static, ()> {
        IMGUI_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn host(hidpi_factor: f64) -> GuiHost {
        let mut host = GuiHost::new(hidpi_factor, 1280, 720);
        let atlas = host.build_font_atlas();
        assert!(atlas.width > 0 && atlas.height > 0);
        assert_eq!(atlas.data.len(), (atlas.width * atlas.height * 4) as usize);
        host
    }

    #[test]
    fn display_size_is_logical() {
        let _guard = lock();
        let mut host = host(2.0);
        assert_eq!(host.io().display_size, [640.0, 360.0]);
        assert_eq!(host.io().display_framebuffer_scale, [2.0, 2.0]);

        host.handle_event(&InputEvent::Resized {
            physical_width: 800,
            physical_height: 600,
        });
        assert_eq!(host.io().display_size, [400.0, 300.0]);

        host.handle_event(&InputEvent::ScaleFactorChanged { scale_factor: 1.0 });
        assert_eq!(host.io().display_size, [800.0, 600.0]);
        assert_eq!(host.physical_size().width, 800);
    }

    #[test]
    fn mouse_position_is_divided_by_hidpi() {
        let _guard = lock();
        let mut host = host(2.0);
        host.handle_event(&InputEvent::MouseMoved {
            physical_position: [200.0, 100.0],
        });
        host.new_frame(Duration::from_millis(16), |_| {});

        assert_eq!(host.io().mouse_pos, [100.0, 50.0]);
    }

    #[test]
    fn keys_reach_imgui() {
        let _guard = lock();
        let mut host = host(1.0);
        host.handle_event(&InputEvent::KeyboardInput {
            key_code: KeyCode::ControlLeft,
            state: ElementState::Pressed,
        });
        host.new_frame(Duration::from_millis(16), |_| {});

        assert!(host.io().key_ctrl);
    }

    #[test]
    fn empty_frame_has_no_draw_lists() {
        let _guard = lock();
        let mut host = host(1.0);

        for _ in 0..3 {
            let draw_data = host.new_frame(Duration::from_millis(16), |_| {});
            assert!(draw_data.draw_lists.is_empty());
            assert_eq!(draw_data.total_idx_count(), 0);
        }
        assert_eq!(host.imgui_ctx.fonts().tex_id.id(), FONT_TEXTURE_ID);
    }

    #[test]
    fn window_produces_draw_lists() {
        let _guard = lock();
        let mut host = host(1.0);

        let empty = host.new_frame(Duration::ZERO, |_| {});
        let with_window = host.new_frame(Duration::from_millis(16), |ui| {
            ui.window("test").size([200.0, 100.0], imgui::Condition::Always).build(|| {
                ui.text("hello");
            });
        });

        assert!(empty.draw_lists.is_empty());
        assert!(!with_window.draw_lists.is_empty());
        assert!(with_window.total_idx_count() > 0);
        assert!(
            with_window
                .draw_lists
                .iter()
                .flat_map(|list| &list.commands)
                .all(|cmd| cmd.texture_id.id() == FONT_TEXTURE_ID)
        );
    }
}
