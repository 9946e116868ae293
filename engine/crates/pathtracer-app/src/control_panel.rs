use imgui::TextureId;
use pathtracer_render_interface::world_info::WorldInfo;

/// 每帧交给 UI 回调的可编辑状态
///
/// 滑块直接修改 [`WorldInfo`]，修改会在下一帧的累积检查中生效。
pub struct ControlPanelState<'a> {
    pub world_info: &'a mut WorldInfo,
    pub target_samples: &'a mut u32,

    /// 已累积的采样数
    pub sample_index: u32,
    /// 累积进度，范围 [0, 1]
    pub progress: f32,

    /// 光追输出在 UI 中的 TextureId，以及 texture 的尺寸
    pub output_preview: Option<(TextureId, [f32; 2])>,
}
impl ControlPanelState<'_> {
    pub const WINDOW_NAME: &'static str = "Path Tracing";
    pub const MAX_TARGET_SAMPLES: u32 = 1024;
    const PREVIEW_WIDTH: f32 = 256.0;

    pub fn draw(&mut self, ui: &imgui::Ui) {
        ui.window(Self::WINDOW_NAME)
            .position([10.0, 10.0], imgui::Condition::FirstUseEver)
            .size([320.0, 0.0], imgui::Condition::FirstUseEver)
            .build(|| {
                self.draw_light(ui);
                self.draw_shading(ui);

                ui.separator();
                self.draw_accumulation(ui);

                if let Some((texture_id, size)) = self.output_preview {
                    ui.separator();
                    let aspect = if size[0] > 0.0 { size[1] / size[0] } else { 1.0 };
                    imgui::Image::new(texture_id, [Self::PREVIEW_WIDTH, Self::PREVIEW_WIDTH * aspect]).build(ui);
                }
            });
    }

    fn draw_light(&mut self, ui: &imgui::Ui) {
        let light_position = &mut self.world_info.light_position;
        ui.slider("Light Pos X", -10.0, 10.0, &mut light_position.x);
        ui.slider("Light Pos Y", -10.0, 10.0, &mut light_position.y);
        ui.slider("Light Pos Z", -10.0, 10.0, &mut light_position.z);
        ui.slider("Light Radius", 0.0, 0.2, &mut self.world_info.light_radius);
    }

    fn draw_shading(&mut self, ui: &imgui::Ui) {
        let world_info = &mut *self.world_info;
        ui.slider("AO Num Rays", 0, 32, &mut world_info.num_rays);
        ui.slider("AO Radius", 0.0, 2.0, &mut world_info.ao_radius);
        ui.slider("GI Num Bounces", 0, 3, &mut world_info.num_bounces);
        ui.slider("Reflectance Coef", 0.0, 1.0, &mut world_info.reflectance_coef);
        ui.slider("Roughness", 0.0, 1.0, &mut world_info.roughness);
    }

    fn draw_accumulation(&mut self, ui: &imgui::Ui) {
        ui.slider("Num Samples", 0, Self::MAX_TARGET_SAMPLES, &mut *self.target_samples);
        imgui::ProgressBar::new(self.progress)
            .overlay_text(format!("{} / {}", self.sample_index, self.target_samples))
            .build(ui);
    }
}
