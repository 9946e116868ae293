//! GPU 资源的创建参数
//!
//! GfxDevice 只根据这些描述创建资源，资源的生命周期由调用方通过 Handle 管理。

use ash::vk;

use crate::handles::{GfxBufferHandle, GfxSamplerHandle, GfxTextureHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GfxBufferDesc {
    pub size: vk::DeviceSize,
    pub usage: vk::BufferUsageFlags,
    /// 是否可以被 CPU 映射写入
    pub cpu_write: bool,
    pub name: String,
}
// new & init
impl GfxBufferDesc {
    pub fn new_vertex_buffer(size: vk::DeviceSize, name: impl AsRef<str>) -> Self {
        Self {
            size,
            usage: vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
            cpu_write: true,
            name: name.as_ref().to_string(),
        }
    }

    pub fn new_index_buffer(size: vk::DeviceSize, name: impl AsRef<str>) -> Self {
        Self {
            size,
            usage: vk::BufferUsageFlags::INDEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
            cpu_write: true,
            name: name.as_ref().to_string(),
        }
    }

    /// 常量 buffer，通过 cmd_update_buffer 更新，不需要 CPU 映射
    pub fn new_constant_buffer(size: vk::DeviceSize, name: impl AsRef<str>) -> Self {
        Self {
            size,
            usage: vk::BufferUsageFlags::UNIFORM_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
            cpu_write: false,
            name: name.as_ref().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GfxTextureDesc {
    pub extent: vk::Extent2D,
    pub format: vk::Format,
    pub usage: vk::ImageUsageFlags,
    pub name: String,
}
impl GfxTextureDesc {
    /// 单像素字节数，仅覆盖本项目用到的几种格式
    pub fn texel_size(&self) -> Option<usize> {
        match self.format {
            vk::Format::R8G8B8A8_UNORM | vk::Format::R8G8B8A8_SRGB | vk::Format::B8G8R8A8_UNORM => Some(4),
            vk::Format::B8G8R8A8_SRGB | vk::Format::R32_SFLOAT => Some(4),
            vk::Format::R16G16B16A16_SFLOAT => Some(8),
            vk::Format::R32G32B32A32_SFLOAT => Some(16),
            _ => None,
        }
    }
}

// Sampler descriptor
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GfxSamplerDesc {
    pub mag_filter: vk::Filter,
    pub min_filter: vk::Filter,
    pub address_mode_u: vk::SamplerAddressMode,
    pub address_mode_v: vk::SamplerAddressMode,
    pub max_anisotropy: u32,
}
impl Default for GfxSamplerDesc {
    fn default() -> Self {
        Self {
            mag_filter: vk::Filter::LINEAR,
            min_filter: vk::Filter::LINEAR,
            address_mode_u: vk::SamplerAddressMode::REPEAT,
            address_mode_v: vk::SamplerAddressMode::REPEAT,
            max_anisotropy: 0,
        }
    }
}

/// resource set 中的单个绑定，顺序即 binding 序号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GfxResourceBinding {
    ConstantBuffer(GfxBufferHandle),
    StructuredBuffer(GfxBufferHandle),
    /// 顶层加速结构，由场景提供
    AccelerationStructure(GfxBufferHandle),
    SampledTexture(GfxTextureHandle),
    StorageTexture(GfxTextureHandle),
    Sampler(GfxSamplerHandle),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GfxResourceSetDesc {
    pub bindings: Vec<GfxResourceBinding>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GfxShaderStageInfo {
    pub stage: vk::ShaderStageFlags,
    pub entry_point: String,
    /// 着色器的二进制路径，相对于 shader 根目录
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GfxHitGroup {
    General { name: String, shader: String },
    Triangles { name: String, closest_hit: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GfxRayTracingPipelineDesc {
    pub shader_library: GfxShaderStageInfo,
    pub hit_groups: Vec<GfxHitGroup>,
    pub max_payload_size: u32,
    pub max_attribute_size: u32,
    pub max_recursion_depth: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GfxVertexAttribute {
    pub location: u32,
    pub format: vk::Format,
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GfxGraphicsPipelineDesc {
    pub vertex_shader: GfxShaderStageInfo,
    pub fragment_shader: GfxShaderStageInfo,
    pub vertex_stride: u32,
    pub vertex_attributes: Vec<GfxVertexAttribute>,
    pub color_format: vk::Format,
    /// src-alpha / one-minus-src-alpha 混合
    pub alpha_blend: bool,
    pub cull_mode: vk::CullModeFlags,
    pub depth_test: bool,
    pub scissor_test: bool,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GfxPipelineDesc {
    RayTracing(GfxRayTracingPipelineDesc),
    Graphics(GfxGraphicsPipelineDesc),
}
impl GfxPipelineDesc {
    pub fn name(&self) -> &str {
        match self {
            Self::RayTracing(desc) => &desc.name,
            Self::Graphics(desc) => &desc.name,
        }
    }

    pub fn bind_point(&self) -> vk::PipelineBindPoint {
        match self {
            Self::RayTracing(_) => vk::PipelineBindPoint::RAY_TRACING_KHR,
            Self::Graphics(_) => vk::PipelineBindPoint::GRAPHICS,
        }
    }
}
