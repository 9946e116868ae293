use std::mem::offset_of;

use ash::vk;
use itertools::Itertools;
use pathtracer_gfx::resources::GfxVertexAttribute;

/// imgui 的顶点，AoS 布局
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GuiVertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    /// R8G8B8A8
    pub col: [u8; 4],
}
impl GuiVertex {
    pub fn vertex_attributes() -> Vec<GfxVertexAttribute> {
        vec![
            GfxVertexAttribute {
                location: 0,
                format: vk::Format::R32G32_SFLOAT,
                offset: offset_of!(GuiVertex, pos) as u32,
            },
            GfxVertexAttribute {
                location: 1,
                format: vk::Format::R32G32_SFLOAT,
                offset: offset_of!(GuiVertex, uv) as u32,
            },
            GfxVertexAttribute {
                location: 2,
                format: vk::Format::R8G8B8A8_UNORM,
                offset: offset_of!(GuiVertex, col) as u32,
            },
        ]
    }
}

/// 16 位索引
pub type GuiIndex = u16;

/// 一条绘制命令
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuiDrawCmd {
    /// (x1, y1, x2, y2)，逻辑坐标
    pub clip_rect: [f32; 4],
    /// 0 表示沿用上一条命令的 texture
    pub texture_id: imgui::TextureId,
    pub elem_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuiDrawList {
    pub vertices: Vec<GuiVertex>,
    pub indices: Vec<GuiIndex>,
    pub commands: Vec<GuiDrawCmd>,
}

/// 一帧 imgui 绘制数据的快照
///
/// 从 imgui 内部的 buffer 复制而来，之后不再依赖 imgui context 的生命周期
#[derive(Debug, Clone, PartialEq)]
pub struct GuiDrawData {
    pub display_pos: [f32; 2],
    pub display_size: [f32; 2],
    pub framebuffer_scale: [f32; 2],
    pub draw_lists: Vec<GuiDrawList>,
}
impl Default for GuiDrawData {
    fn default() -> Self {
        Self {
            display_pos: [0.0, 0.0],
            display_size: [0.0, 0.0],
            framebuffer_scale: [1.0, 1.0],
            draw_lists: Vec::new(),
        }
    }
}
// new & init
impl GuiDrawData {
    pub fn from_imgui(draw_data: &imgui::DrawData) -> Self {
        let mut snapshot = Self {
            display_pos: draw_data.display_pos,
            display_size: draw_data.display_size,
            framebuffer_scale: draw_data.framebuffer_scale,
            draw_lists: Vec::new(),
        };
        // 没有任何窗口时 imgui 的 CmdLists 为 null，不能调用 draw_lists()
        if draw_data.draw_lists_count() == 0 {
            return snapshot;
        }

        snapshot.draw_lists = draw_data
            .draw_lists()
            .map(|draw_list| {
                let commands = draw_list
                    .commands()
                    .filter_map(|command| match command {
                        imgui::DrawCmd::Elements { count, cmd_params } => Some(GuiDrawCmd {
                            clip_rect: cmd_params.clip_rect,
                            texture_id: cmd_params.texture_id,
                            elem_count: count as u32,
                        }),
                        imgui::DrawCmd::ResetRenderState => {
                            log::warn!("imgui reset render state");
                            None
                        }
                        imgui::DrawCmd::RawCallback { .. } => {
                            log::warn!("imgui raw callback");
                            None
                        }
                    })
                    .collect_vec();

                GuiDrawList {
                    vertices: draw_list
                        .vtx_buffer()
                        .iter()
                        .map(|v| GuiVertex {
                            pos: v.pos,
                            uv: v.uv,
                            col: v.col,
                        })
                        .collect_vec(),
                    indices: draw_list.idx_buffer().to_vec(),
                    commands,
                }
            })
            .collect();

        snapshot
    }
}
// getters
impl GuiDrawData {
    pub fn total_vtx_count(&self) -> usize {
        self.draw_lists.iter().map(|list| list.vertices.len()).sum()
    }

    pub fn total_idx_count(&self) -> usize {
        self.draw_lists.iter().map(|list| list.indices.len()).sum()
    }

    #[inline]
    pub fn vertex_bytes(&self) -> vk::DeviceSize {
        (self.total_vtx_count() * size_of::<GuiVertex>()) as vk::DeviceSize
    }

    #[inline]
    pub fn index_bytes(&self) -> vk::DeviceSize {
        (self.total_idx_count() * size_of::<GuiIndex>()) as vk::DeviceSize
    }

    /// 帧缓冲上的像素尺寸
    pub fn framebuffer_size(&self) -> [f32; 2] {
        [
            self.display_size[0] * self.framebuffer_scale[0],
            self.display_size[1] * self.framebuffer_scale[1],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(size_of::<GuiVertex>(), 20);
        assert_eq!(size_of::<GuiVertex>(), size_of::<imgui::DrawVert>());
        assert_eq!(GuiVertex::vertex_attributes()[2].offset, 16);
    }

    #[test]
    fn totals_span_all_lists() {
        let list = |v: usize, i: usize| GuiDrawList {
            vertices: vec![GuiVertex::default(); v],
            indices: vec![0; i],
            commands: vec![],
        };
        let data = GuiDrawData {
            draw_lists: vec![list(4, 6), list(3, 3)],
            ..Default::default()
        };

        assert_eq!(data.total_vtx_count(), 7);
        assert_eq!(data.vertex_bytes(), 140);
        assert_eq!(data.index_bytes(), 18);
    }
}
