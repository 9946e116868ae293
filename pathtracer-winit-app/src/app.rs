use anyhow::Context;
use pathtracer_crate_tools::settings::AppSettings;
use winit::window::Window;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow},
    window::WindowId,
};

use crate::render_thread::RenderThread;
use crate::winit_event_adapter::WinitEventAdapter;

/// 窗口线程
///
/// 只负责窗口和事件循环，所有的渲染工作都在 [`RenderThread`] 中完成
pub struct WinitApp {
    settings: AppSettings,

    window: Option<Window>,
    render_thread: Option<RenderThread>,

    /// 创建窗口或渲染线程失败时记录下来，事件循环结束后返回
    startup_error: Option<anyhow::Error>,
}
// 总的 main 函数
impl WinitApp {
    /// 整个程序的入口
    pub fn run(settings: AppSettings) -> anyhow::Result<()> {
        let event_loop = winit::event_loop::EventLoop::new().context("failed to create event loop")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = Self {
            settings,
            window: None,
            render_thread: None,
            startup_error: None,
        };

        event_loop.run_app(&mut app).context("event loop error")?;

        log::info!("end run.");

        app.destroy()
    }
}
// new & init
impl WinitApp {
    /// 在 window 创建之后启动渲染线程，渲染分辨率使用窗口的物理尺寸
    fn init_after_window(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window = Self::create_window(
            event_loop,
            "Path Tracing".to_string(),
            [self.settings.width as f64, self.settings.height as f64],
        )?;

        let inner_size = window.inner_size();
        let render_settings = AppSettings {
            width: inner_size.width.max(1),
            height: inner_size.height.max(1),
            hidpi_factor: window.scale_factor() as f32,
            ..self.settings.clone()
        };
        self.render_thread = Some(RenderThread::spawn(render_settings)?);
        self.window = Some(window);

        Ok(())
    }

    fn create_window(
        event_loop: &ActiveEventLoop,
        window_title: String,
        window_extent: [f64; 2],
    ) -> anyhow::Result<Window> {
        let window_attr = Window::default_attributes()
            .with_title(window_title)
            .with_inner_size(winit::dpi::LogicalSize::new(window_extent[0], window_extent[1]));

        event_loop.create_window(window_attr).context("failed to create window")
    }
}
// destroy
impl WinitApp {
    /// 先停止渲染线程，再销毁窗口
    fn destroy(mut self) -> anyhow::Result<()> {
        let render_result = match self.render_thread.take() {
            Some(render_thread) => render_thread.join(),
            None => Ok(()),
        };
        self.window = None;

        if let Some(e) = self.startup_error.take() {
            return Err(e);
        }
        render_result
    }
}
// 各种 winit 的事件处理
impl ApplicationHandler for WinitApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        log::info!("winit event: resumed");

        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init_after_window(event_loop) {
            log::error!("failed to start: {:#}", e);
            self.startup_error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if let WindowEvent::CloseRequested = event {
            event_loop.exit();
            return;
        }

        // 尺寸变化同样作为输入事件交给渲染线程，由渲染线程重建相关资源
        if let Some(render_thread) = &self.render_thread {
            for input_event in WinitEventAdapter::from_winit_event(&event) {
                render_thread.send_event(input_event);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(render_thread) = &self.render_thread {
            if !render_thread.is_running() {
                log::warn!("render thread stopped, exiting");
                event_loop.exit();
            }
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        log::warn!("winit event: suspended");
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        log::info!("loop exiting");
    }
}
