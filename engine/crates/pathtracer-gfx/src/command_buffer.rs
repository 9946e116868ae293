use ash::vk;

use crate::handles::{GfxBufferHandle, GfxPipelineHandle, GfxResourceSetHandle, GfxTextureHandle};

/// 录制到 [`GfxCommandBuffer`] 中的单条命令
///
/// 命令只引用资源的 Handle，具体的执行由 GfxDevice 在 submit 时完成。
#[derive(Debug, Clone, PartialEq)]
pub enum GfxCommand {
    BeginLabel(String),
    EndLabel,

    UpdateBuffer {
        buffer: GfxBufferHandle,
        offset: vk::DeviceSize,
        data: Vec<u8>,
    },

    BindPipeline {
        bind_point: vk::PipelineBindPoint,
        pipeline: GfxPipelineHandle,
    },
    BindResourceSet {
        bind_point: vk::PipelineBindPoint,
        slot: u32,
        set: GfxResourceSetHandle,
    },

    DispatchRays {
        width: u32,
        height: u32,
        depth: u32,
    },
    /// 整张 texture 的拷贝，尺寸不同时做线性缩放
    Blit {
        src: GfxTextureHandle,
        dst: GfxTextureHandle,
    },

    BeginRendering {
        target: GfxTextureHandle,
        load_op: vk::AttachmentLoadOp,
    },
    EndRendering,
    SetViewport {
        width: f32,
        height: f32,
    },
    SetScissor(vk::Rect2D),
    BindVertexBuffer {
        buffer: GfxBufferHandle,
        offset: vk::DeviceSize,
    },
    BindIndexBuffer {
        buffer: GfxBufferHandle,
        offset: vk::DeviceSize,
        index_type: vk::IndexType,
    },
    DrawIndexed {
        index_cnt: u32,
        first_index: u32,
        instance_cnt: u32,
        vertex_offset: i32,
    },
}

/// 命令缓冲
///
/// 只负责按顺序记录命令，不持有任何 GPU 资源；录制完成后交给
/// [`crate::device::GfxDevice::submit`] 执行。
///
/// # 使用示例
/// ```ignore
/// let mut cmd = GfxCommandBuffer::new("my-pass");
/// cmd.begin();
/// cmd.cmd_bind_pipeline(vk::PipelineBindPoint::GRAPHICS, pipeline);
/// // 绘制命令...
/// cmd.end();
/// device.submit(cmd)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct GfxCommandBuffer {
    name: String,
    commands: Vec<GfxCommand>,
    recording: bool,
}
// new & init
impl GfxCommandBuffer {
    pub fn new(debug_name: &str) -> Self {
        Self {
            name: debug_name.to_string(),
            commands: Vec::new(),
            recording: false,
        }
    }
}
// Basic 命令
impl GfxCommandBuffer {
    /// 开始录制 command，会清空之前录制的内容
    ///
    /// 自动设置 debug label
    pub fn begin(&mut self) {
        debug_assert!(!self.recording, "command buffer '{}' is already recording", self.name);
        self.commands.clear();
        self.recording = true;
        let name = self.name.clone();
        self.begin_label(&name);
    }

    /// 结束录制 command
    ///
    /// 结束 debug label
    pub fn end(&mut self) {
        self.end_label();
        self.recording = false;
    }

    /// 将另一个已经录制完成的 command buffer 追加到当前 command buffer 中
    ///
    /// 类似于 vkCmdExecuteCommands
    pub fn cmd_execute_commands(&mut self, secondary: GfxCommandBuffer) {
        debug_assert!(!secondary.recording, "secondary command buffer '{}' is still recording", secondary.name);
        self.push_all(secondary.commands);
    }

    #[inline]
    fn push(&mut self, command: GfxCommand) {
        debug_assert!(self.recording, "command buffer '{}' is not recording", self.name);
        self.commands.push(command);
    }

    #[inline]
    fn push_all(&mut self, commands: Vec<GfxCommand>) {
        debug_assert!(self.recording, "command buffer '{}' is not recording", self.name);
        self.commands.extend(commands);
    }
}
// getters
impl GfxCommandBuffer {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn commands(&self) -> &[GfxCommand] {
        &self.commands
    }

    #[inline]
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// 是否包含 label 之外的命令
    pub fn has_work(&self) -> bool {
        self.commands.iter().any(|cmd| !matches!(cmd, GfxCommand::BeginLabel(_) | GfxCommand::EndLabel))
    }
}
// 数据传输类型
impl GfxCommandBuffer {
    /// 将 data 传输到 buffer 中
    ///
    /// 需要在 render pass 之外进行
    ///
    /// - command type: action
    /// - supported queue types: transfer, graphics, compute
    #[inline]
    pub fn cmd_update_buffer(&mut self, buffer: GfxBufferHandle, offset: vk::DeviceSize, data: &[u8]) {
        self.push(GfxCommand::UpdateBuffer {
            buffer,
            offset,
            data: data.to_vec(),
        });
    }

    /// 将 src 的内容拷贝（缩放）到 dst
    ///
    /// - command type: action
    /// - supported queue types: graphics
    #[inline]
    pub fn cmd_blit_image(&mut self, src: GfxTextureHandle, dst: GfxTextureHandle) {
        self.push(GfxCommand::Blit { src, dst });
    }
}
// 管线与资源绑定
impl GfxCommandBuffer {
    /// - command type: state
    /// - supported queue types: graphics, compute
    #[inline]
    pub fn cmd_bind_pipeline(&mut self, bind_point: vk::PipelineBindPoint, pipeline: GfxPipelineHandle) {
        self.push(GfxCommand::BindPipeline { bind_point, pipeline });
    }

    /// - command type: state
    /// - supported queue types: graphics, compute
    #[inline]
    pub fn cmd_bind_resource_set(&mut self, bind_point: vk::PipelineBindPoint, slot: u32, set: GfxResourceSetHandle) {
        self.push(GfxCommand::BindResourceSet { bind_point, slot, set });
    }
}
// 光线追踪
impl GfxCommandBuffer {
    /// - command type: action
    /// - supported queue types: compute
    #[inline]
    pub fn trace_rays(&mut self, width: u32, height: u32, depth: u32) {
        self.push(GfxCommand::DispatchRays { width, height, depth });
    }
}
// 绘制类型的命令
impl GfxCommandBuffer {
    /// - command type: action, state
    /// - supported queue types: graphics
    #[inline]
    pub fn cmd_begin_rendering(&mut self, target: GfxTextureHandle, load_op: vk::AttachmentLoadOp) {
        self.push(GfxCommand::BeginRendering { target, load_op });
    }

    /// - command type: action, state
    /// - supported queue types: graphics
    #[inline]
    pub fn end_rendering(&mut self) {
        self.push(GfxCommand::EndRendering);
    }

    /// - command type: state
    /// - supported queue types: graphics
    #[inline]
    pub fn cmd_set_viewport(&mut self, width: f32, height: f32) {
        self.push(GfxCommand::SetViewport { width, height });
    }

    /// - command type: state
    /// - supported queue types: graphics
    #[inline]
    pub fn cmd_set_scissor(&mut self, scissor: vk::Rect2D) {
        self.push(GfxCommand::SetScissor(scissor));
    }

    /// - command type: state
    /// - supported queue types: graphics
    #[inline]
    pub fn cmd_bind_vertex_buffer(&mut self, buffer: GfxBufferHandle, offset: vk::DeviceSize) {
        self.push(GfxCommand::BindVertexBuffer { buffer, offset });
    }

    /// - command type: state
    /// - supported queue types: graphics
    #[inline]
    pub fn cmd_bind_index_buffer(&mut self, buffer: GfxBufferHandle, offset: vk::DeviceSize, index_type: vk::IndexType) {
        self.push(GfxCommand::BindIndexBuffer {
            buffer,
            offset,
            index_type,
        });
    }

    /// - command type: action
    /// - supported queue types: graphics
    #[inline]
    pub fn draw_indexed(&mut self, index_cnt: u32, first_index: u32, instance_cnt: u32, vertex_offset: i32) {
        self.push(GfxCommand::DrawIndexed {
            index_cnt,
            first_index,
            instance_cnt,
            vertex_offset,
        });
    }
}
// debug label
impl GfxCommandBuffer {
    #[inline]
    pub fn begin_label(&mut self, label_name: &str) {
        self.push(GfxCommand::BeginLabel(label_name.to_string()));
    }

    #[inline]
    pub fn end_label(&mut self) {
        self.push(GfxCommand::EndLabel);
    }
}
