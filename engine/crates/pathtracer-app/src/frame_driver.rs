use std::time::Duration;

use ash::vk;
use imgui::TextureId;
use pathtracer_crate_tools::settings::AppSettings;
use pathtracer_gfx::command_buffer::GfxCommandBuffer;
use pathtracer_gfx::device::{GfxBackend, GfxDevice};
use pathtracer_gfx::error::GfxError;
use pathtracer_gfx::handles::{GfxBufferHandle, GfxTextureHandle};
use pathtracer_gfx::resources::GfxBufferDesc;
use pathtracer_gui_backend::error::GuiDrawError;
use pathtracer_gui_backend::gui_pass::GuiPass;
use pathtracer_gui_backend::texture_registry::GuiTextureRegistry;
use pathtracer_platform::input_manager::{InputManager, InputSender};
use pathtracer_render_interface::accum::AccumController;
use pathtracer_render_interface::frame_counter::FrameCounter;
use pathtracer_render_interface::frame_settings::FrameSettings;
use pathtracer_render_interface::sample_sequence::SampleSequence;
use pathtracer_render_interface::world_info::WorldInfo;

use crate::control_panel::ControlPanelState;
use crate::error::{FrameError, StartupError};
use crate::gui_host::GuiHost;
use crate::path_tracer_pass::{PathTracerPass, RtScene};

/// 帧驱动所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    /// 两帧之间
    Idle,
    /// 更新累积状态、上传参数、dispatch
    Accumulating,
    /// 将光追输出合成到呈现目标，并绘制 UI
    Presenting,
}

/// 一帧的执行结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame_id: u64,
    /// 本帧上传的 sample_index，即本帧之前已累积的采样数
    pub sample_index: u32,
    pub reset: bool,
    pub dispatched: bool,
    /// UI 引用了失效的 texture，本帧的 UI 绘制被放弃
    pub ui_aborted: bool,
    /// 本帧结束后的累积进度
    pub progress: f32,
}

/// 每帧按固定顺序驱动渲染：
/// 累积检查 -> 上传 [`WorldInfo`] -> dispatch -> blit 到呈现目标 -> UI -> 提交并等待
///
/// 所有 GPU 资源只在持有 FrameDriver 的线程上修改；输入事件可以从其他线程
/// 通过 [`InputSender`] 发送，在每帧的 UI 阶段按到达顺序取出。
pub struct FrameDriver<D: GfxDevice> {
    device: D,
    phase: FramePhase,

    frame_settings: FrameSettings,
    frame_counter: FrameCounter,
    accum: AccumController,

    world_info: WorldInfo,
    world_info_buffer: GfxBufferHandle,

    /// 呈现目标由调用方持有（swapchain image 或离屏 texture）
    present_target: GfxTextureHandle,

    path_tracer: PathTracerPass,

    input_manager: InputManager,
    gui_host: GuiHost,
    gui_pass: GuiPass,
    texture_registry: GuiTextureRegistry,

    show_output_preview: bool,
    output_preview: Option<TextureId>,
}
// new & init
impl<D: GfxDevice> FrameDriver<D> {
    /// 检查后端与硬件能力，并创建帧循环需要的所有资源
    ///
    /// 失败时 device 一同被释放
    pub fn new(
        mut device: D,
        settings: &AppSettings,
        present_target: GfxTextureHandle,
        scene: RtScene,
    ) -> Result<Self, StartupError> {
        let backend = GfxBackend::from_name(&settings.backend)
            .ok_or_else(|| StartupError::UnsupportedBackend(settings.backend.clone()))?;
        let capabilities = device.capabilities().clone();
        if backend != capabilities.backend {
            return Err(StartupError::UnsupportedBackend(format!(
                "{} (device runs {})",
                settings.backend,
                capabilities.backend.name()
            )));
        }
        if !capabilities.ray_tracing {
            return Err(StartupError::RayTracingUnsupported);
        }
        if device.texture_extent(present_target).is_none() {
            return Err(GfxError::InvalidHandle { kind: "present target" }.into());
        }

        let frame_settings = FrameSettings::new(capabilities.present_format, settings.width, settings.height);
        let extent = frame_settings.frame_extent;

        let world_info = WorldInfo::new(extent.width, extent.height);
        let world_info_buffer = device.create_buffer(&GfxBufferDesc::new_constant_buffer(
            size_of::<WorldInfo>() as vk::DeviceSize,
            "world-info",
        ))?;

        let path_tracer = PathTracerPass::new(&mut device, world_info_buffer, scene, extent)?;

        let mut gui_host = GuiHost::new(settings.hidpi_factor as f64, extent.width, extent.height);
        let gui_pass = GuiPass::new(&mut device, frame_settings.present_format, gui_host.build_font_atlas())?;
        let mut texture_registry = gui_pass.new_texture_registry();

        let output_preview = if settings.show_output_preview {
            Some(texture_registry.bind(&mut device, path_tracer.output())?)
        } else {
            None
        };

        log::info!(
            "frame driver ready: backend {}, {}x{}, target {} samples",
            capabilities.backend.name(),
            extent.width,
            extent.height,
            settings.target_samples
        );

        Ok(Self {
            device,
            phase: FramePhase::Idle,
            frame_settings,
            frame_counter: FrameCounter::new(0),
            accum: AccumController::new(settings.target_samples),
            world_info,
            world_info_buffer,
            present_target,
            path_tracer,
            input_manager: InputManager::new(),
            gui_host,
            gui_pass,
            texture_registry,
            show_output_preview: settings.show_output_preview,
            output_preview,
        })
    }
}
// destroy
impl<D: GfxDevice> FrameDriver<D> {
    /// 等待 GPU 空闲后释放所有自己创建的资源
    ///
    /// 返回 device 和场景资源，由调用方继续销毁场景以及呈现目标
    pub fn destroy(mut self) -> (D, RtScene) {
        self.device.wait_idle();

        self.texture_registry.destroy(&mut self.device);
        self.gui_pass.destroy(&mut self.device);
        let scene = self.path_tracer.destroy(&mut self.device);
        self.device.destroy_buffer(self.world_info_buffer);

        log::info!("frame driver destroyed after {} frames", self.frame_counter.frame_id());
        (self.device, scene)
    }
}
// getters
impl<D: GfxDevice> FrameDriver<D> {
    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    /// 用于创建或销毁调用方持有的资源（例如新的呈现目标）
    #[inline]
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    #[inline]
    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    #[inline]
    pub fn frame_settings(&self) -> &FrameSettings {
        &self.frame_settings
    }

    #[inline]
    pub fn frame_id(&self) -> u64 {
        self.frame_counter.frame_id()
    }

    #[inline]
    pub fn accum(&self) -> &AccumController {
        &self.accum
    }

    #[inline]
    pub fn world_info(&self) -> &WorldInfo {
        &self.world_info
    }

    /// 修改会在下一帧的累积检查中生效
    #[inline]
    pub fn world_info_mut(&mut self) -> &mut WorldInfo {
        &mut self.world_info
    }

    #[inline]
    pub fn world_info_buffer(&self) -> GfxBufferHandle {
        self.world_info_buffer
    }

    #[inline]
    pub fn present_target(&self) -> GfxTextureHandle {
        self.present_target
    }

    #[inline]
    pub fn output_texture(&self) -> GfxTextureHandle {
        self.path_tracer.output()
    }

    #[inline]
    pub fn output_preview(&self) -> Option<TextureId> {
        self.output_preview
    }

    #[inline]
    pub fn gui_host(&self) -> &GuiHost {
        &self.gui_host
    }

    #[inline]
    pub fn gui_pass(&self) -> &GuiPass {
        &self.gui_pass
    }

    #[inline]
    pub fn texture_registry(&self) -> &GuiTextureRegistry {
        &self.texture_registry
    }

    /// 其他线程通过该句柄发送输入事件
    #[inline]
    pub fn input_sender(&self) -> InputSender {
        self.input_manager.sender()
    }
}
// update
impl<D: GfxDevice> FrameDriver<D> {
    #[inline]
    pub fn set_target_samples(&mut self, target_samples: u32) {
        self.accum.set_target_samples(target_samples);
    }

    /// 让 UI 可以引用一张 texture；同一张 texture 总是得到同一个 TextureId
    pub fn bind_gui_texture(&mut self, texture: GfxTextureHandle) -> Result<TextureId, GfxError> {
        self.texture_registry.bind(&mut self.device, texture)
    }

    /// texture 销毁之前需要解除绑定，之后再引用旧的 TextureId 会放弃当帧的 UI 绘制
    pub fn unbind_gui_texture(&mut self, texture: GfxTextureHandle) -> bool {
        self.texture_registry.unbind(&mut self.device, texture)
    }

    /// 窗口尺寸变化：重建光追输出，更新相机与 UI 的尺寸
    ///
    /// 累积状态不会因此重置，是否重新累积只取决于参数的 fingerprint
    pub fn resize(&mut self, width: u32, height: u32, present_target: GfxTextureHandle) -> Result<(), FrameError> {
        if width == 0 || height == 0 {
            log::info!("skip resize to {}x{}", width, height);
            return Ok(());
        }
        if self.device.texture_extent(present_target).is_none() {
            return Err(GfxError::InvalidHandle { kind: "present target" }.into());
        }

        // 旧的输出可能仍被上一帧使用
        self.device.wait_idle();

        let extent = vk::Extent2D { width, height };
        if extent != self.frame_settings.frame_extent {
            if self.output_preview.take().is_some() {
                self.texture_registry.unbind(&mut self.device, self.path_tracer.output());
            }
            self.path_tracer.resize(&mut self.device, extent)?;
            if self.show_output_preview {
                self.output_preview = Some(self.texture_registry.bind(&mut self.device, self.path_tracer.output())?);
            }

            self.frame_settings.frame_extent = extent;
            self.world_info.update_camera(width, height);
            self.gui_host.set_display_size(width, height);
        }

        self.present_target = present_target;
        log::info!("frame driver resized to {}x{}", width, height);
        Ok(())
    }

    /// 使用默认的控制面板执行一帧
    pub fn tick_with_control_panel(&mut self, delta: Duration) -> Result<FrameReport, FrameError> {
        self.tick(delta, |ui, panel| panel.draw(ui))
    }

    /// 执行一帧：录制一个 command buffer，提交并等待完成
    ///
    /// `ui_func` 负责声明本帧的 UI，可以通过 [`ControlPanelState`] 修改渲染参数
    pub fn tick(
        &mut self,
        delta: Duration,
        ui_func: impl FnOnce(&imgui::Ui, &mut ControlPanelState),
    ) -> Result<FrameReport, FrameError> {
        let _span = tracy_client::span!("FrameDriver::tick");

        let result = self.run_frame(delta, ui_func);
        self.phase = FramePhase::Idle;
        tracy_client::frame_mark();

        result
    }

    fn run_frame(
        &mut self,
        delta: Duration,
        ui_func: impl FnOnce(&imgui::Ui, &mut ControlPanelState),
    ) -> Result<FrameReport, FrameError> {
        let frame_id = self.frame_counter.next_frame();

        // Accumulating ====================================
        self.phase = FramePhase::Accumulating;
        let decision = self.accum.update(&self.world_info.accum_params());
        // jitter 跟随帧计数，累积停止后也继续变化
        self.world_info.apply_frame(frame_id, &decision, SampleSequence::get(frame_id));
        log::trace!(
            "frame {}: sample {} / {}, dispatch: {}",
            frame_id,
            decision.sample_index,
            self.accum.target_samples(),
            decision.dispatch
        );

        let mut cmd = GfxCommandBuffer::new(&self.frame_counter.frame_name());
        cmd.begin();
        cmd.cmd_update_buffer(self.world_info_buffer, 0, bytemuck::bytes_of(&self.world_info));
        if decision.dispatch {
            self.path_tracer.dispatch(&mut cmd);
        }

        // Presenting ======================================
        self.phase = FramePhase::Presenting;
        cmd.cmd_blit_image(self.path_tracer.output(), self.present_target);
        let ui_aborted = self.draw_ui(&mut cmd, delta, ui_func)?;
        cmd.end();

        self.device.submit(cmd)?;
        self.device.wait_idle();

        Ok(FrameReport {
            frame_id,
            sample_index: decision.sample_index,
            reset: decision.reset,
            dispatched: decision.dispatch,
            ui_aborted,
            progress: self.accum.progress(),
        })
    }

    /// 返回本帧的 UI 绘制是否被放弃
    fn draw_ui(
        &mut self,
        cmd: &mut GfxCommandBuffer,
        delta: Duration,
        ui_func: impl FnOnce(&imgui::Ui, &mut ControlPanelState),
    ) -> Result<bool, FrameError> {
        for event in self.input_manager.process_events() {
            self.gui_host.handle_event(event);
        }
        self.gui_host.sync_modifiers(self.input_manager.state());

        let output_extent = self.path_tracer.output_extent();
        let mut target_samples = self.accum.target_samples();
        let mut panel = ControlPanelState {
            world_info: &mut self.world_info,
            target_samples: &mut target_samples,
            sample_index: self.accum.sample_index(),
            progress: self.accum.progress(),
            output_preview: self
                .output_preview
                .map(|id| (id, [output_extent.width as f32, output_extent.height as f32])),
        };
        let draw_data = self.gui_host.new_frame(delta, |ui| ui_func(ui, &mut panel));
        self.accum.set_target_samples(target_samples);

        if draw_data.draw_lists.is_empty() {
            return Ok(false);
        }
        self.gui_pass.prepare_render_data(&mut self.device, &draw_data)?;

        // UI 直接画在已经合成了光追结果的呈现目标上
        cmd.cmd_begin_rendering(self.present_target, vk::AttachmentLoadOp::LOAD);
        let result = self.gui_pass.draw(cmd, &draw_data, &self.texture_registry);
        cmd.end_rendering();

        match result {
            Ok(()) => Ok(false),
            Err(GuiDrawError::StaleTexture(texture_id)) => {
                log::error!(
                    "frame {}: ui pass aborted, texture id {} is no longer bound",
                    self.frame_counter.frame_id(),
                    texture_id
                );
                Ok(true)
            }
            Err(GuiDrawError::Gfx(e)) => Err(e.into()),
        }
    }
}
