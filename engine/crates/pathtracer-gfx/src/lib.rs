//! PathTracer 的 GFX 层
//!
//! 渲染核心只依赖 [`device::GfxDevice`] 描述的一组能力：创建/销毁 buffer、texture、
//! sampler、pipeline、resource set，CPU 映射写入，以及提交录制好的命令。
//! 具体的后端（Vulkan、DX12）不在本 crate 中实现；[`headless::HeadlessGfx`]
//! 是一个只记录命令、不执行着色器的后端，用于 headless 运行和测试。
//!
//! 格式、区域等基础类型直接复用 `ash::vk` 中的定义。

pub mod command_buffer;
pub mod device;
pub mod error;
pub mod handles;
pub mod headless;
pub mod resources;

pub use ash::vk;
