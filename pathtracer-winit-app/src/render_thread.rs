use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use pathtracer_app::error::StartupError;
use pathtracer_app::frame_driver::FrameDriver;
use pathtracer_crate_tools::settings::AppSettings;
use pathtracer_gfx::device::{GfxBackend, GfxDevice};
use pathtracer_gfx::headless::HeadlessGfx;
use pathtracer_platform::input_event::InputEvent;

use crate::room_scene;

/// 渲染线程控制消息
pub enum RenderThreadMessage {
    /// 输入事件
    InputEvent(InputEvent),
    /// 退出渲染线程
    Shutdown,
}

/// 渲染线程句柄
///
/// 所有 GPU 资源都在渲染线程上创建、修改和销毁，窗口线程只通过消息与其通信
pub struct RenderThread {
    sender: Sender<RenderThreadMessage>,
    thread_handle: Option<JoinHandle<anyhow::Result<()>>>,
    running: Arc<AtomicBool>,
}
impl RenderThread {
    /// headless 设备没有 vsync，手动限制帧率
    const FRAME_INTERVAL: Duration = Duration::from_millis(16);

    /// 创建并启动渲染线程
    pub fn spawn(settings: AppSettings) -> anyhow::Result<Self> {
        let (sender, receiver) = crossbeam_channel::unbounded::<RenderThreadMessage>();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let thread_handle = thread::Builder::new()
            .name("RenderThread".to_string())
            .spawn(move || {
                tracy_client::set_thread_name!("RenderThread");

                let result = Self::render_thread_main(settings, receiver, &running_clone);
                if let Err(e) = &result {
                    log::error!("render thread stopped: {:#}", e);
                }
                running_clone.store(false, Ordering::SeqCst);
                result
            })
            .context("failed to spawn render thread")?;

        Ok(Self {
            sender,
            thread_handle: Some(thread_handle),
            running,
        })
    }

    /// 发送输入事件到渲染线程
    pub fn send_event(&self, event: InputEvent) {
        if self.running.load(Ordering::SeqCst) {
            let _ = self.sender.send(RenderThreadMessage::InputEvent(event));
        }
    }

    /// 请求渲染线程关闭
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.sender.send(RenderThreadMessage::Shutdown);
    }

    /// 等待渲染线程结束，返回渲染线程的错误
    pub fn join(mut self) -> anyhow::Result<()> {
        self.shutdown();
        match self.thread_handle.take() {
            Some(handle) => handle.join().map_err(|_| anyhow::anyhow!("render thread panicked"))?,
            None => Ok(()),
        }
    }

    /// 检查渲染线程是否仍在运行
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// 渲染线程主函数
    fn render_thread_main(
        settings: AppSettings,
        receiver: Receiver<RenderThreadMessage>,
        running: &AtomicBool,
    ) -> anyhow::Result<()> {
        let backend = GfxBackend::from_name(&settings.backend)
            .ok_or_else(|| StartupError::UnsupportedBackend(settings.backend.clone()))?;

        let mut gfx = HeadlessGfx::new(backend);
        let present = room_scene::create_present_target(&mut gfx, backend, settings.width, settings.height)?;
        let scene = room_scene::create_room_scene(&mut gfx)?;
        let mut driver = FrameDriver::new(gfx, &settings, present, scene).context("failed to start frame driver")?;
        let input_sender = driver.input_sender();

        let mut last_tick = Instant::now();
        'render: while running.load(Ordering::SeqCst) {
            // 取出本帧之前到达的所有消息
            loop {
                match receiver.try_recv() {
                    Ok(RenderThreadMessage::InputEvent(event)) => {
                        if let InputEvent::Resized {
                            physical_width,
                            physical_height,
                        } = event
                        {
                            Self::resize(&mut driver, physical_width, physical_height)?;
                        }
                        input_sender.send(event);
                    }
                    Ok(RenderThreadMessage::Shutdown) => {
                        log::info!("render thread: received shutdown signal");
                        break 'render;
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        log::info!("render thread: channel disconnected");
                        break 'render;
                    }
                }
            }

            let now = Instant::now();
            let report = driver.tick_with_control_panel(now - last_tick)?;
            last_tick = now;
            if report.reset {
                log::debug!("frame {}: accumulation restarted", report.frame_id);
            }

            thread::sleep(Self::FRAME_INTERVAL);
        }

        let present = driver.present_target();
        let (mut gfx, scene) = driver.destroy();
        scene.destroy(&mut gfx);
        gfx.destroy_texture(present);
        log::info!("render thread exit, {} resources leaked", gfx.live_resource_count());

        Ok(())
    }

    /// 新建呈现目标后再通知 FrameDriver，旧的呈现目标随后销毁
    fn resize(driver: &mut FrameDriver<HeadlessGfx>, width: u32, height: u32) -> anyhow::Result<()> {
        // 最小化
        if width == 0 || height == 0 {
            return Ok(());
        }

        let old_present = driver.present_target();
        let backend = driver.device().capabilities().backend;
        let new_present = room_scene::create_present_target(driver.device_mut(), backend, width, height)?;
        driver.resize(width, height, new_present)?;
        driver.device_mut().destroy_texture(old_present);
        Ok(())
    }
}
