//! 不执行着色器的 GfxDevice 实现
//!
//! 资源保存在 SlotMap 中，buffer 有真实的 CPU 内存，texture 只记录描述。
//! submit 时会校验命令中引用的 Handle 和绘制范围，并统计各类命令的数量，
//! 因此可以用来运行 headless 模式，或者在测试中检查录制出的命令。

use std::collections::VecDeque;

use ash::vk;
use slotmap::SlotMap;

use crate::command_buffer::{GfxCommand, GfxCommandBuffer};
use crate::device::{GfxBackend, GfxCapabilities, GfxDevice};
use crate::error::GfxError;
use crate::handles::{GfxBufferHandle, GfxPipelineHandle, GfxResourceSetHandle, GfxSamplerHandle, GfxTextureHandle};
use crate::resources::{GfxBufferDesc, GfxPipelineDesc, GfxResourceBinding, GfxResourceSetDesc, GfxSamplerDesc, GfxTextureDesc};

/// 保留最近若干次提交，便于调试和测试
const SUBMISSION_HISTORY: usize = 8;

struct HeadlessBuffer {
    desc: GfxBufferDesc,
    data: Vec<u8>,
    mapped: bool,
}

struct HeadlessTexture {
    desc: GfxTextureDesc,
}

/// 各类资源与命令的计数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadlessStats {
    pub buffers_created: usize,
    pub textures_created: usize,
    pub resource_sets_created: usize,
    pub pipelines_created: usize,

    pub submits: usize,
    pub dispatches: usize,
    pub blits: usize,
    pub draws: usize,

    /// 销毁了已经失效的 Handle
    pub invalid_destroys: usize,
}

pub struct HeadlessGfx {
    capabilities: GfxCapabilities,

    buffers: SlotMap<GfxBufferHandle, HeadlessBuffer>,
    textures: SlotMap<GfxTextureHandle, HeadlessTexture>,
    samplers: SlotMap<GfxSamplerHandle, GfxSamplerDesc>,
    resource_sets: SlotMap<GfxResourceSetHandle, GfxResourceSetDesc>,
    pipelines: SlotMap<GfxPipelineHandle, GfxPipelineDesc>,

    /// buffer 内存的上限，用于模拟显存不足
    memory_budget: Option<vk::DeviceSize>,
    allocated_bytes: vk::DeviceSize,

    in_flight: bool,
    submissions: VecDeque<GfxCommandBuffer>,
    stats: HeadlessStats,
}
// new & init
impl HeadlessGfx {
    pub fn new(backend: GfxBackend) -> Self {
        Self::with_capabilities(GfxCapabilities::new(backend))
    }

    pub fn with_capabilities(capabilities: GfxCapabilities) -> Self {
        log::info!(
            "headless gfx created: backend={}, ray tracing={}",
            capabilities.backend.name(),
            capabilities.ray_tracing
        );
        Self {
            capabilities,
            buffers: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            samplers: SlotMap::with_key(),
            resource_sets: SlotMap::with_key(),
            pipelines: SlotMap::with_key(),
            memory_budget: None,
            allocated_bytes: 0,
            in_flight: false,
            submissions: VecDeque::with_capacity(SUBMISSION_HISTORY),
            stats: HeadlessStats::default(),
        }
    }

    /// 限制 buffer 可以使用的总内存
    pub fn with_memory_budget(mut self, bytes: vk::DeviceSize) -> Self {
        self.memory_budget = Some(bytes);
        self
    }
}
// getters
impl HeadlessGfx {
    #[inline]
    pub fn stats(&self) -> &HeadlessStats {
        &self.stats
    }

    /// 最近一次提交的命令
    #[inline]
    pub fn last_submission(&self) -> Option<&GfxCommandBuffer> {
        self.submissions.back()
    }

    pub fn submissions(&self) -> impl Iterator<Item = &GfxCommandBuffer> {
        self.submissions.iter()
    }

    pub fn buffer_data(&self, buffer: GfxBufferHandle) -> Option<&[u8]> {
        self.buffers.get(buffer).map(|b| b.data.as_slice())
    }

    pub fn is_buffer_mapped(&self, buffer: GfxBufferHandle) -> bool {
        self.buffers.get(buffer).is_some_and(|b| b.mapped)
    }

    pub fn texture_desc(&self, texture: GfxTextureHandle) -> Option<&GfxTextureDesc> {
        self.textures.get(texture).map(|t| &t.desc)
    }

    pub fn resource_set_desc(&self, set: GfxResourceSetHandle) -> Option<&GfxResourceSetDesc> {
        self.resource_sets.get(set)
    }

    pub fn pipeline_desc(&self, pipeline: GfxPipelineHandle) -> Option<&GfxPipelineDesc> {
        self.pipelines.get(pipeline)
    }

    /// 当前存活的资源数量：buffer, texture, sampler, resource set, pipeline
    pub fn live_resource_count(&self) -> usize {
        self.buffers.len() + self.textures.len() + self.samplers.len() + self.resource_sets.len() + self.pipelines.len()
    }

    #[inline]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}
// tools
impl HeadlessGfx {
    fn check_buffer(&self, buffer: GfxBufferHandle) -> Result<&HeadlessBuffer, GfxError> {
        self.buffers.get(buffer).ok_or(GfxError::InvalidHandle { kind: "buffer" })
    }

    fn check_texture(&self, texture: GfxTextureHandle) -> Result<(), GfxError> {
        self.textures.get(texture).map(|_| ()).ok_or(GfxError::InvalidHandle { kind: "texture" })
    }

    fn check_binding(&self, binding: &GfxResourceBinding) -> Result<(), GfxError> {
        match *binding {
            GfxResourceBinding::ConstantBuffer(buffer)
            | GfxResourceBinding::StructuredBuffer(buffer)
            | GfxResourceBinding::AccelerationStructure(buffer) => self.check_buffer(buffer).map(|_| ()),
            GfxResourceBinding::SampledTexture(texture) | GfxResourceBinding::StorageTexture(texture) => {
                self.check_texture(texture)
            }
            GfxResourceBinding::Sampler(sampler) => {
                self.samplers.get(sampler).map(|_| ()).ok_or(GfxError::InvalidHandle { kind: "sampler" })
            }
        }
    }

    fn note_invalid_destroy(&mut self, kind: &str) {
        log::warn!("destroying an invalid {} handle", kind);
        self.stats.invalid_destroys += 1;
    }

    /// 校验并"执行"命令，只有 UpdateBuffer 会真正修改 buffer 的内容
    fn execute(&mut self, cmd: &GfxCommandBuffer) -> Result<(), GfxError> {
        let mut index_buffer: Option<(GfxBufferHandle, vk::DeviceSize, vk::IndexType)> = None;
        let mut vertex_bound = false;
        let mut graphics_set_bound = false;
        let mut in_rendering = false;

        for command in cmd.commands() {
            match command {
                GfxCommand::BeginLabel(_) | GfxCommand::EndLabel => {}
                GfxCommand::UpdateBuffer { buffer, offset, data } => {
                    let buffer = self.buffers.get_mut(*buffer).ok_or(GfxError::InvalidHandle { kind: "buffer" })?;
                    let end = offset + data.len() as vk::DeviceSize;
                    if end > buffer.desc.size {
                        return Err(GfxError::WriteOutOfBounds {
                            name: buffer.desc.name.clone(),
                            offset: *offset,
                            len: data.len() as vk::DeviceSize,
                            size: buffer.desc.size,
                        });
                    }
                    buffer.data[*offset as usize..end as usize].copy_from_slice(data);
                }
                GfxCommand::BindPipeline { bind_point, pipeline } => {
                    let desc = self.pipelines.get(*pipeline).ok_or(GfxError::InvalidHandle { kind: "pipeline" })?;
                    if desc.bind_point() != *bind_point {
                        return Err(GfxError::Unsupported(format!(
                            "pipeline '{}' bound to {:?}",
                            desc.name(),
                            bind_point
                        )));
                    }
                }
                GfxCommand::BindResourceSet { bind_point, set, .. } => {
                    let desc = self.resource_sets.get(*set).ok_or(GfxError::InvalidHandle { kind: "resource set" })?;
                    for binding in &desc.bindings {
                        self.check_binding(binding)?;
                    }
                    if *bind_point == vk::PipelineBindPoint::GRAPHICS {
                        graphics_set_bound = true;
                    }
                }
                GfxCommand::DispatchRays { .. } => {
                    if !self.capabilities.ray_tracing {
                        return Err(GfxError::Unsupported("ray tracing".to_string()));
                    }
                    self.stats.dispatches += 1;
                }
                GfxCommand::Blit { src, dst } => {
                    self.check_texture(*src)?;
                    self.check_texture(*dst)?;
                    self.stats.blits += 1;
                }
                GfxCommand::BeginRendering { target, .. } => {
                    self.check_texture(*target)?;
                    in_rendering = true;
                }
                GfxCommand::EndRendering => in_rendering = false,
                GfxCommand::SetViewport { .. } | GfxCommand::SetScissor(_) => {}
                GfxCommand::BindVertexBuffer { buffer, .. } => {
                    self.check_buffer(*buffer)?;
                    vertex_bound = true;
                }
                GfxCommand::BindIndexBuffer {
                    buffer,
                    offset,
                    index_type,
                } => {
                    self.check_buffer(*buffer)?;
                    index_buffer = Some((*buffer, *offset, *index_type));
                }
                GfxCommand::DrawIndexed {
                    index_cnt, first_index, ..
                } => {
                    if !in_rendering || !vertex_bound {
                        return Err(GfxError::Unsupported("draw outside of rendering or without vertex buffer".to_string()));
                    }
                    if !graphics_set_bound {
                        return Err(GfxError::Unsupported("draw without graphics resource set".to_string()));
                    }
                    let (buffer, offset, index_type) =
                        index_buffer.ok_or(GfxError::Unsupported("draw without index buffer".to_string()))?;
                    let index_size = if index_type == vk::IndexType::UINT32 { 4 } else { 2 };
                    let buffer = self.check_buffer(buffer)?;
                    let required = offset + (*first_index as vk::DeviceSize + *index_cnt as vk::DeviceSize) * index_size;
                    if required > buffer.desc.size {
                        return Err(GfxError::DrawOutOfBounds {
                            name: buffer.desc.name.clone(),
                            required,
                            size: buffer.desc.size,
                        });
                    }
                    self.stats.draws += 1;
                }
            }
        }

        Ok(())
    }
}
impl GfxDevice for HeadlessGfx {
    fn capabilities(&self) -> &GfxCapabilities {
        &self.capabilities
    }

    fn create_buffer(&mut self, desc: &GfxBufferDesc) -> Result<GfxBufferHandle, GfxError> {
        if let Some(budget) = self.memory_budget {
            if self.allocated_bytes + desc.size > budget {
                log::error!("buffer '{}' of {} bytes exceeds the memory budget", desc.name, desc.size);
                return Err(GfxError::OutOfMemory {
                    name: desc.name.clone(),
                    size: desc.size,
                });
            }
        }

        self.allocated_bytes += desc.size;
        self.stats.buffers_created += 1;
        Ok(self.buffers.insert(HeadlessBuffer {
            desc: desc.clone(),
            data: vec![0; desc.size as usize],
            mapped: false,
        }))
    }

    fn destroy_buffer(&mut self, buffer: GfxBufferHandle) {
        match self.buffers.remove(buffer) {
            Some(buffer) => self.allocated_bytes -= buffer.desc.size,
            None => self.note_invalid_destroy("buffer"),
        }
    }

    fn buffer_size(&self, buffer: GfxBufferHandle) -> Option<vk::DeviceSize> {
        self.buffers.get(buffer).map(|b| b.desc.size)
    }

    fn map_buffer(&mut self, buffer: GfxBufferHandle) -> Result<(), GfxError> {
        let buffer = self.buffers.get_mut(buffer).ok_or(GfxError::InvalidHandle { kind: "buffer" })?;
        if !buffer.desc.cpu_write {
            return Err(GfxError::Unsupported(format!("buffer '{}' is not cpu writable", buffer.desc.name)));
        }
        buffer.mapped = true;
        Ok(())
    }

    fn write_mapped(&mut self, buffer: GfxBufferHandle, offset: vk::DeviceSize, data: &[u8]) -> Result<(), GfxError> {
        let buffer = self.buffers.get_mut(buffer).ok_or(GfxError::InvalidHandle { kind: "buffer" })?;
        if !buffer.mapped {
            return Err(GfxError::NotMapped {
                name: buffer.desc.name.clone(),
            });
        }

        let end = offset + data.len() as vk::DeviceSize;
        if end > buffer.desc.size {
            return Err(GfxError::WriteOutOfBounds {
                name: buffer.desc.name.clone(),
                offset,
                len: data.len() as vk::DeviceSize,
                size: buffer.desc.size,
            });
        }

        buffer.data[offset as usize..end as usize].copy_from_slice(data);
        Ok(())
    }

    fn unmap_buffer(&mut self, buffer: GfxBufferHandle) {
        if let Some(buffer) = self.buffers.get_mut(buffer) {
            buffer.mapped = false;
        }
    }

    fn create_texture(&mut self, desc: &GfxTextureDesc, data: Option<&[u8]>) -> Result<GfxTextureHandle, GfxError> {
        if desc.extent.width == 0 || desc.extent.height == 0 {
            return Err(GfxError::Unsupported(format!("texture '{}' with zero extent", desc.name)));
        }
        if let (Some(data), Some(texel)) = (data, desc.texel_size()) {
            let expected = desc.extent.width as usize * desc.extent.height as usize * texel;
            if data.len() != expected {
                return Err(GfxError::WriteOutOfBounds {
                    name: desc.name.clone(),
                    offset: 0,
                    len: data.len() as vk::DeviceSize,
                    size: expected as vk::DeviceSize,
                });
            }
        }

        self.stats.textures_created += 1;
        Ok(self.textures.insert(HeadlessTexture { desc: desc.clone() }))
    }

    fn destroy_texture(&mut self, texture: GfxTextureHandle) {
        if self.textures.remove(texture).is_none() {
            self.note_invalid_destroy("texture");
        }
    }

    fn texture_extent(&self, texture: GfxTextureHandle) -> Option<vk::Extent2D> {
        self.textures.get(texture).map(|t| t.desc.extent)
    }

    fn create_sampler(&mut self, desc: &GfxSamplerDesc, name: &str) -> Result<GfxSamplerHandle, GfxError> {
        log::debug!("create sampler '{}'", name);
        Ok(self.samplers.insert(*desc))
    }

    fn destroy_sampler(&mut self, sampler: GfxSamplerHandle) {
        if self.samplers.remove(sampler).is_none() {
            self.note_invalid_destroy("sampler");
        }
    }

    fn create_resource_set(&mut self, desc: &GfxResourceSetDesc) -> Result<GfxResourceSetHandle, GfxError> {
        for binding in &desc.bindings {
            self.check_binding(binding)?;
        }
        self.stats.resource_sets_created += 1;
        Ok(self.resource_sets.insert(desc.clone()))
    }

    fn destroy_resource_set(&mut self, set: GfxResourceSetHandle) {
        if self.resource_sets.remove(set).is_none() {
            self.note_invalid_destroy("resource set");
        }
    }

    fn create_pipeline(&mut self, desc: &GfxPipelineDesc) -> Result<GfxPipelineHandle, GfxError> {
        if matches!(desc, GfxPipelineDesc::RayTracing(_)) && !self.capabilities.ray_tracing {
            return Err(GfxError::Unsupported(format!("ray tracing pipeline '{}'", desc.name())));
        }
        self.stats.pipelines_created += 1;
        Ok(self.pipelines.insert(desc.clone()))
    }

    fn destroy_pipeline(&mut self, pipeline: GfxPipelineHandle) {
        if self.pipelines.remove(pipeline).is_none() {
            self.note_invalid_destroy("pipeline");
        }
    }

    fn submit(&mut self, cmd: GfxCommandBuffer) -> Result<(), GfxError> {
        if cmd.is_recording() {
            return Err(GfxError::Unsupported(format!("submit of '{}' while still recording", cmd.name())));
        }
        if self.in_flight {
            return Err(GfxError::Unsupported("submit while the previous submission is in flight".to_string()));
        }

        self.execute(&cmd)?;

        self.in_flight = true;
        self.stats.submits += 1;
        if self.submissions.len() == SUBMISSION_HISTORY {
            self.submissions.pop_front();
        }
        self.submissions.push_back(cmd);
        Ok(())
    }

    fn wait_idle(&mut self) {
        self.in_flight = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture_desc(name: &str) -> GfxTextureDesc {
        GfxTextureDesc {
            extent: vk::Extent2D { width: 4, height: 4 },
            format: vk::Format::R8G8B8A8_UNORM,
            usage: vk::ImageUsageFlags::SAMPLED,
            name: name.to_string(),
        }
    }

    #[test]
    fn mapped_write_lands_in_buffer() {
        let mut gfx = HeadlessGfx::new(GfxBackend::Vulkan);
        let buffer = gfx.create_buffer(&GfxBufferDesc::new_vertex_buffer(16, "vb")).unwrap();

        assert!(matches!(gfx.write_mapped(buffer, 0, &[1, 2]), Err(GfxError::NotMapped { .. })));

        gfx.map_buffer(buffer).unwrap();
        gfx.write_mapped(buffer, 4, &[7, 8, 9]).unwrap();
        assert!(matches!(gfx.write_mapped(buffer, 14, &[0; 4]), Err(GfxError::WriteOutOfBounds { .. })));
        gfx.unmap_buffer(buffer);

        assert_eq!(&gfx.buffer_data(buffer).unwrap()[4..7], &[7, 8, 9]);
        assert!(!gfx.is_buffer_mapped(buffer));
    }

    #[test]
    fn memory_budget_fails_allocation() {
        let mut gfx = HeadlessGfx::new(GfxBackend::Vulkan).with_memory_budget(100);
        let a = gfx.create_buffer(&GfxBufferDesc::new_vertex_buffer(64, "a")).unwrap();
        assert!(matches!(
            gfx.create_buffer(&GfxBufferDesc::new_vertex_buffer(64, "b")),
            Err(GfxError::OutOfMemory { .. })
        ));

        gfx.destroy_buffer(a);
        assert!(gfx.create_buffer(&GfxBufferDesc::new_vertex_buffer(64, "b")).is_ok());
    }

    #[test]
    fn double_destroy_is_counted_not_fatal() {
        let mut gfx = HeadlessGfx::new(GfxBackend::DirectX12);
        let texture = gfx.create_texture(&texture_desc("t"), None).unwrap();
        gfx.destroy_texture(texture);
        gfx.destroy_texture(texture);

        assert_eq!(gfx.stats().invalid_destroys, 1);
        assert_eq!(gfx.live_resource_count(), 0);
    }

    #[test]
    fn submit_rejects_stale_handles_and_overlap() {
        let mut gfx = HeadlessGfx::new(GfxBackend::Vulkan);
        let src = gfx.create_texture(&texture_desc("src"), None).unwrap();
        let dst = gfx.create_texture(&texture_desc("dst"), None).unwrap();

        let mut cmd = GfxCommandBuffer::new("blit");
        cmd.begin();
        cmd.cmd_blit_image(src, dst);
        cmd.end();

        gfx.submit(cmd.clone()).unwrap();
        assert!(gfx.submit(cmd.clone()).is_err());
        gfx.wait_idle();

        gfx.destroy_texture(src);
        assert_eq!(gfx.submit(cmd), Err(GfxError::InvalidHandle { kind: "texture" }));
        assert_eq!(gfx.stats().blits, 1);
    }

    #[test]
    fn draw_requires_graphics_resource_set() {
        let mut gfx = HeadlessGfx::new(GfxBackend::Vulkan);
        let target = gfx.create_texture(&texture_desc("target"), None).unwrap();
        let vb = gfx.create_buffer(&GfxBufferDesc::new_vertex_buffer(64, "vb")).unwrap();
        let ib = gfx.create_buffer(&GfxBufferDesc::new_index_buffer(64, "ib")).unwrap();
        let cb = gfx.create_buffer(&GfxBufferDesc::new_constant_buffer(64, "cb")).unwrap();
        let set = gfx
            .create_resource_set(&GfxResourceSetDesc {
                bindings: vec![GfxResourceBinding::ConstantBuffer(cb)],
                name: "set".to_string(),
            })
            .unwrap();

        let record = |bind_point: Option<vk::PipelineBindPoint>| {
            let mut cmd = GfxCommandBuffer::new("draw");
            cmd.begin();
            cmd.cmd_begin_rendering(target, vk::AttachmentLoadOp::LOAD);
            if let Some(bind_point) = bind_point {
                cmd.cmd_bind_resource_set(bind_point, 0, set);
            }
            cmd.cmd_bind_vertex_buffer(vb, 0);
            cmd.cmd_bind_index_buffer(ib, 0, vk::IndexType::UINT16);
            cmd.draw_indexed(6, 0, 1, 0);
            cmd.end_rendering();
            cmd.end();
            cmd
        };

        assert!(matches!(gfx.submit(record(None)), Err(GfxError::Unsupported(_))));
        assert!(matches!(
            gfx.submit(record(Some(vk::PipelineBindPoint::RAY_TRACING_KHR))),
            Err(GfxError::Unsupported(_))
        ));
        gfx.submit(record(Some(vk::PipelineBindPoint::GRAPHICS))).unwrap();
        gfx.wait_idle();
        assert_eq!(gfx.stats().draws, 1);
    }

    #[test]
    fn ray_tracing_requires_capability() {
        let mut caps = GfxCapabilities::new(GfxBackend::Vulkan);
        caps.ray_tracing = false;
        let mut gfx = HeadlessGfx::with_capabilities(caps);

        let mut cmd = GfxCommandBuffer::new("rt");
        cmd.begin();
        cmd.trace_rays(1, 1, 1);
        cmd.end();
        assert!(matches!(gfx.submit(cmd), Err(GfxError::Unsupported(_))));
    }
}
