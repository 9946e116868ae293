use ash::vk;

/// 渲染器默认配置
pub struct DefaultRendererSettings;
impl DefaultRendererSettings {
    /// 光追输出使用半精度浮点，避免累积时的精度损失
    pub const RT_OUTPUT_FORMAT: vk::Format = vk::Format::R16G16B16A16_SFLOAT;
    /// 每帧发射的光线深度
    pub const RT_DISPATCH_DEPTH: u32 = 1;
}

/// 帧级渲染配置，尺寸变化时更新
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameSettings {
    /// swapchain 的格式
    pub present_format: vk::Format,
    pub frame_extent: vk::Extent2D,
}
impl FrameSettings {
    pub fn new(present_format: vk::Format, width: u32, height: u32) -> Self {
        Self {
            present_format,
            frame_extent: vk::Extent2D { width, height },
        }
    }
}
