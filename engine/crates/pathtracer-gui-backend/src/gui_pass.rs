use ash::vk;
use imgui::TextureId;
use pathtracer_gfx::command_buffer::GfxCommandBuffer;
use pathtracer_gfx::device::GfxDevice;
use pathtracer_gfx::error::GfxError;
use pathtracer_gfx::handles::{
    GfxBufferHandle, GfxPipelineHandle, GfxResourceSetHandle, GfxSamplerHandle, GfxTextureHandle,
};
use pathtracer_gfx::resources::{
    GfxBufferDesc, GfxGraphicsPipelineDesc, GfxPipelineDesc, GfxResourceBinding, GfxResourceSetDesc, GfxSamplerDesc,
    GfxShaderStageInfo, GfxTextureDesc,
};

use crate::error::GuiDrawError;
use crate::gui_draw_data::{GuiDrawData, GuiVertex};
use crate::gui_mesh::GuiMesh;
use crate::texture_registry::{FONT_TEXTURE_ID, GuiTextureRegistry};

/// imgui 的着色器常量
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GuiConstants {
    pub ortho: glam::Mat4,
}

/// RGBA8 的字体图集
pub struct GuiFontAtlas {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// 将 imgui 的 draw data 翻译为 GPU 命令
///
/// 持有字体 texture 及其 resource set、imgui 的 pipeline、sampler、常量 buffer 以及 mesh。
/// 其他 texture 的 resource set 由 [`GuiTextureRegistry`] 管理。
pub struct GuiPass {
    pipeline: GfxPipelineHandle,
    sampler: GfxSamplerHandle,
    constant_buffer: GfxBufferHandle,

    font_texture: GfxTextureHandle,
    font_set: GfxResourceSetHandle,

    mesh: GuiMesh,
    clip_space_y_down: bool,
}
// new & init
impl GuiPass {
    pub fn new(
        device: &mut dyn GfxDevice,
        color_format: vk::Format,
        font_atlas: GuiFontAtlas,
    ) -> Result<Self, GfxError> {
        let clip_space_y_down = device.capabilities().clip_space_y_down;

        let pipeline = device.create_pipeline(&GfxPipelineDesc::Graphics(Self::pipeline_desc(color_format)))?;
        let sampler = device.create_sampler(&GfxSamplerDesc::default(), "imgui")?;
        let constant_buffer = device.create_buffer(&GfxBufferDesc {
            cpu_write: true,
            ..GfxBufferDesc::new_constant_buffer(size_of::<GuiConstants>() as vk::DeviceSize, "imgui-constants")
        })?;

        let font_texture = device.create_texture(
            &GfxTextureDesc {
                extent: vk::Extent2D {
                    width: font_atlas.width,
                    height: font_atlas.height,
                },
                format: vk::Format::R8G8B8A8_UNORM,
                usage: vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST,
                name: "imgui-fonts".to_string(),
            },
            Some(&font_atlas.data),
        )?;
        let font_set = device.create_resource_set(&GfxResourceSetDesc {
            bindings: vec![
                GfxResourceBinding::ConstantBuffer(constant_buffer),
                GfxResourceBinding::SampledTexture(font_texture),
                GfxResourceBinding::Sampler(sampler),
            ],
            name: "imgui-fonts".to_string(),
        })?;

        let mesh = GuiMesh::new(device)?;
        log::info!("gui pass created: {}x{} font atlas", font_atlas.width, font_atlas.height);

        Ok(Self {
            pipeline,
            sampler,
            constant_buffer,
            font_texture,
            font_set,
            mesh,
            clip_space_y_down,
        })
    }

    fn pipeline_desc(color_format: vk::Format) -> GfxGraphicsPipelineDesc {
        let stage = |stage, entry_point: &str| GfxShaderStageInfo {
            stage,
            entry_point: entry_point.to_string(),
            path: "imgui/imgui.slang".to_string(),
        };

        GfxGraphicsPipelineDesc {
            vertex_shader: stage(vk::ShaderStageFlags::VERTEX, "vsmain"),
            fragment_shader: stage(vk::ShaderStageFlags::FRAGMENT, "psmain"),
            vertex_stride: size_of::<GuiVertex>() as u32,
            vertex_attributes: GuiVertex::vertex_attributes(),
            color_format,
            alpha_blend: true,
            cull_mode: vk::CullModeFlags::NONE,
            depth_test: false,
            scissor_test: true,
            name: "uipass".to_string(),
        }
    }

    /// 创建使用本 pass 的 sampler 和常量 buffer 的 texture registry
    pub fn new_texture_registry(&self) -> GuiTextureRegistry {
        GuiTextureRegistry::new(self.sampler, self.constant_buffer)
    }
}
// destroy
impl GuiPass {
    pub fn destroy(self, device: &mut dyn GfxDevice) {
        device.destroy_resource_set(self.font_set);
        device.destroy_texture(self.font_texture);
        self.mesh.destroy(device);
        device.destroy_buffer(self.constant_buffer);
        device.destroy_sampler(self.sampler);
        device.destroy_pipeline(self.pipeline);
        log::info!("gui pass destroyed");
    }
}
// getters
impl GuiPass {
    #[inline]
    pub fn mesh(&self) -> &GuiMesh {
        &self.mesh
    }

    #[inline]
    pub fn font_set(&self) -> GfxResourceSetHandle {
        self.font_set
    }

    #[inline]
    pub fn pipeline(&self) -> GfxPipelineHandle {
        self.pipeline
    }
}
// draw
impl GuiPass {
    /// # Phase: Render
    ///
    /// 上传 mesh 和常量。buffer 扩容或写入失败都是不可恢复的错误
    pub fn prepare_render_data(&mut self, device: &mut dyn GfxDevice, draw_data: &GuiDrawData) -> Result<(), GfxError> {
        if draw_data.draw_lists.is_empty() {
            return Ok(());
        }

        self.mesh.upload(device, draw_data)?;

        let constants = GuiConstants {
            ortho: self.ortho(draw_data),
        };
        device.map_buffer(self.constant_buffer)?;
        let result = device.write_mapped(self.constant_buffer, 0, bytemuck::bytes_of(&constants));
        device.unmap_buffer(self.constant_buffer);
        result
    }

    /// 正交投影，左上角为 display_pos
    fn ortho(&self, draw_data: &GuiDrawData) -> glam::Mat4 {
        let left = draw_data.display_pos[0];
        let right = draw_data.display_pos[0] + draw_data.display_size[0];
        let top = draw_data.display_pos[1];
        let bottom = draw_data.display_pos[1] + draw_data.display_size[1];
        if self.clip_space_y_down {
            glam::Mat4::orthographic_rh(left, right, top, bottom, -1.0, 1.0)
        } else {
            glam::Mat4::orthographic_rh(left, right, bottom, top, -1.0, 1.0)
        }
    }

    /// # Phase: Render
    ///
    /// 在调用方已经开启的 rendering 中录制 UI 的绘制命令，需要先调用 [`GuiPass::prepare_render_data`]
    ///
    /// 所有命令先录制到单独的 command buffer 中，全部成功后才追加到 `cmd`；
    /// 遇到失效的 TextureId 时返回错误，`cmd` 保持不变
    pub fn draw(
        &self,
        cmd: &mut GfxCommandBuffer,
        draw_data: &GuiDrawData,
        registry: &GuiTextureRegistry,
    ) -> Result<(), GuiDrawError> {
        let _span = tracy_client::span!("GuiPass::draw");
        if draw_data.draw_lists.is_empty() {
            return Ok(());
        }

        let mut ui_cmd = GfxCommandBuffer::new("[ui-pass]draw");
        ui_cmd.begin();

        let [fb_width, fb_height] = draw_data.framebuffer_size();
        ui_cmd.cmd_bind_pipeline(vk::PipelineBindPoint::GRAPHICS, self.pipeline);
        ui_cmd.cmd_set_viewport(fb_width, fb_height);
        ui_cmd.cmd_bind_vertex_buffer(self.mesh.vertex_buffer(), 0);
        ui_cmd.cmd_bind_index_buffer(self.mesh.index_buffer(), 0, vk::IndexType::UINT16);

        let clip_offset = draw_data.display_pos;
        let clip_scale = draw_data.framebuffer_scale;

        // 缓存之前已经绑定过的 texture
        let mut last_texture_id: Option<TextureId> = None;
        let mut index_offset: u32 = 0;
        let mut vertex_offset: i32 = 0;

        // 简而言之：对于每个 command，设置正确的 texture, scissor, vertex, index 即可
        for draw_list in &draw_data.draw_lists {
            for command in &draw_list.commands {
                // id 为 0 的 texture 沿用之前的绑定
                if command.texture_id.id() != 0 && Some(command.texture_id) != last_texture_id {
                    let resource_set = if command.texture_id.id() == FONT_TEXTURE_ID {
                        self.font_set
                    } else {
                        registry.resolve(command.texture_id)?
                    };
                    ui_cmd.cmd_bind_resource_set(vk::PipelineBindPoint::GRAPHICS, 0, resource_set);
                    last_texture_id = Some(command.texture_id);
                }

                // 完全落在帧缓冲之外的 command 不绘制，但 offset 照常前进
                if let Some(scissor) = Self::scissor(command.clip_rect, clip_offset, clip_scale) {
                    ui_cmd.cmd_set_scissor(scissor);
                    ui_cmd.draw_indexed(command.elem_count, index_offset, 1, vertex_offset);
                }

                index_offset += command.elem_count;
            }

            vertex_offset += draw_list.vertices.len() as i32;
        }

        ui_cmd.end();
        cmd.cmd_execute_commands(ui_cmd);
        Ok(())
    }

    /// 逻辑坐标的 clip rect 转换为帧缓冲上的 scissor
    ///
    /// 左上角裁剪到帧缓冲原点，右下角保持不变；裁剪后为空时返回 None
    fn scissor(clip_rect: [f32; 4], clip_offset: [f32; 2], clip_scale: [f32; 2]) -> Option<vk::Rect2D> {
        let min_x = ((clip_rect[0] - clip_offset[0]) * clip_scale[0]).max(0.0);
        let min_y = ((clip_rect[1] - clip_offset[1]) * clip_scale[1]).max(0.0);
        let max_x = (clip_rect[2] - clip_offset[0]) * clip_scale[0];
        let max_y = (clip_rect[3] - clip_offset[1]) * clip_scale[1];
        if max_x <= min_x || max_y <= min_y {
            return None;
        }

        Some(vk::Rect2D {
            offset: vk::Offset2D {
                x: min_x as i32,
                y: min_y as i32,
            },
            extent: vk::Extent2D {
                width: (max_x - min_x) as u32,
                height: (max_y - min_y) as u32,
            },
        })
    }
}
