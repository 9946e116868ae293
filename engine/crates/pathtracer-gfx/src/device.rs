use ash::vk;

use crate::command_buffer::GfxCommandBuffer;
use crate::error::GfxError;
use crate::handles::{GfxBufferHandle, GfxPipelineHandle, GfxResourceSetHandle, GfxSamplerHandle, GfxTextureHandle};
use crate::resources::{GfxBufferDesc, GfxPipelineDesc, GfxResourceSetDesc, GfxSamplerDesc, GfxTextureDesc};

/// 图形后端的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GfxBackend {
    Vulkan,
    DirectX12,
}
impl GfxBackend {
    /// 从配置中的名称解析后端，无法识别的名称返回 None
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "vulkan" | "vk" => Some(Self::Vulkan),
            "directx12" | "dx12" | "d3d12" => Some(Self::DirectX12),
            _ => None,
        }
    }

    /// swapchain 使用的格式
    pub fn present_format(self) -> vk::Format {
        match self {
            Self::Vulkan => vk::Format::B8G8R8A8_SRGB,
            Self::DirectX12 => vk::Format::R16G16B16A16_SFLOAT,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Vulkan => "vulkan",
            Self::DirectX12 => "directx12",
        }
    }
}

/// 后端的能力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GfxCapabilities {
    pub backend: GfxBackend,
    /// 是否支持光线追踪管线
    pub ray_tracing: bool,
    /// swapchain 的格式
    pub present_format: vk::Format,
    /// NDC 的 y 轴是否向下（Vulkan），正交投影需要据此翻转
    pub clip_space_y_down: bool,
}
impl GfxCapabilities {
    pub fn new(backend: GfxBackend) -> Self {
        Self {
            backend,
            ray_tracing: true,
            present_format: backend.present_format(),
            clip_space_y_down: backend == GfxBackend::Vulkan,
        }
    }
}

/// GPU 资源工厂与命令提交
///
/// 渲染核心通过这个 trait 使用 GPU，所有资源都以 Handle 的形式返回。
/// 销毁一个已经失效的 Handle 不会 panic，后端只记录一条警告。
pub trait GfxDevice {
    fn capabilities(&self) -> &GfxCapabilities;

    // buffer
    fn create_buffer(&mut self, desc: &GfxBufferDesc) -> Result<GfxBufferHandle, GfxError>;
    fn destroy_buffer(&mut self, buffer: GfxBufferHandle);
    fn buffer_size(&self, buffer: GfxBufferHandle) -> Option<vk::DeviceSize>;

    /// 映射 buffer，之后才可以调用 [`GfxDevice::write_mapped`]
    fn map_buffer(&mut self, buffer: GfxBufferHandle) -> Result<(), GfxError>;
    fn write_mapped(&mut self, buffer: GfxBufferHandle, offset: vk::DeviceSize, data: &[u8]) -> Result<(), GfxError>;
    fn unmap_buffer(&mut self, buffer: GfxBufferHandle);

    // texture
    /// `data` 不为空时作为 texture 的初始内容，需要与 extent 和 format 匹配
    fn create_texture(&mut self, desc: &GfxTextureDesc, data: Option<&[u8]>) -> Result<GfxTextureHandle, GfxError>;
    fn destroy_texture(&mut self, texture: GfxTextureHandle);
    fn texture_extent(&self, texture: GfxTextureHandle) -> Option<vk::Extent2D>;

    fn create_sampler(&mut self, desc: &GfxSamplerDesc, name: &str) -> Result<GfxSamplerHandle, GfxError>;
    fn destroy_sampler(&mut self, sampler: GfxSamplerHandle);

    fn create_resource_set(&mut self, desc: &GfxResourceSetDesc) -> Result<GfxResourceSetHandle, GfxError>;
    fn destroy_resource_set(&mut self, set: GfxResourceSetHandle);

    fn create_pipeline(&mut self, desc: &GfxPipelineDesc) -> Result<GfxPipelineHandle, GfxError>;
    fn destroy_pipeline(&mut self, pipeline: GfxPipelineHandle);

    /// 提交录制完成的命令。同一时间只能有一次提交在执行，
    /// 再次提交之前需要调用 [`GfxDevice::wait_idle`]
    fn submit(&mut self, cmd: GfxCommandBuffer) -> Result<(), GfxError>;

    /// 阻塞直到 GPU 完成所有已提交的工作
    fn wait_idle(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names() {
        assert_eq!(GfxBackend::from_name("Vulkan"), Some(GfxBackend::Vulkan));
        assert_eq!(GfxBackend::from_name(" dx12 "), Some(GfxBackend::DirectX12));
        assert_eq!(GfxBackend::from_name("metal"), None);
        assert_eq!(GfxBackend::from_name(GfxBackend::DirectX12.name()), Some(GfxBackend::DirectX12));
    }
}
