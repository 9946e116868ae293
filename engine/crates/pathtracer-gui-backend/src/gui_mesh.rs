use ash::vk;
use pathtracer_gfx::device::GfxDevice;
use pathtracer_gfx::error::GfxError;
use pathtracer_gfx::handles::GfxBufferHandle;
use pathtracer_gfx::resources::GfxBufferDesc;

use crate::gui_draw_data::GuiDrawData;

/// imgui 绘制所需的 vertex buffer 和 index buffer
///
/// 容量只增不减：需求超过容量时，销毁旧 buffer，按不小于需求的 2 的幂重新创建
pub struct GuiMesh {
    vertex_buffer: GfxBufferHandle,
    /// bytes
    vertex_capacity: vk::DeviceSize,

    index_buffer: GfxBufferHandle,
    /// bytes
    index_capacity: vk::DeviceSize,
}
// new & init
impl GuiMesh {
    pub const INIT_VERTEX_BYTES: vk::DeviceSize = 8192;
    pub const INIT_INDEX_BYTES: vk::DeviceSize = 2048;

    pub fn new(device: &mut dyn GfxDevice) -> Result<Self, GfxError> {
        let vertex_buffer = device.create_buffer(&Self::vertex_buffer_desc(Self::INIT_VERTEX_BYTES))?;
        let index_buffer = match device.create_buffer(&Self::index_buffer_desc(Self::INIT_INDEX_BYTES)) {
            Ok(buffer) => buffer,
            Err(e) => {
                device.destroy_buffer(vertex_buffer);
                return Err(e);
            }
        };

        Ok(Self {
            vertex_buffer,
            vertex_capacity: Self::INIT_VERTEX_BYTES,
            index_buffer,
            index_capacity: Self::INIT_INDEX_BYTES,
        })
    }

    fn vertex_buffer_desc(size: vk::DeviceSize) -> GfxBufferDesc {
        GfxBufferDesc::new_vertex_buffer(size, "imgui-vertex")
    }

    fn index_buffer_desc(size: vk::DeviceSize) -> GfxBufferDesc {
        GfxBufferDesc::new_index_buffer(size, "imgui-index")
    }
}
// destroy
impl GuiMesh {
    pub fn destroy(self, device: &mut dyn GfxDevice) {
        device.destroy_buffer(self.vertex_buffer);
        device.destroy_buffer(self.index_buffer);
    }
}
// getters
impl GuiMesh {
    #[inline]
    pub fn vertex_buffer(&self) -> GfxBufferHandle {
        self.vertex_buffer
    }

    #[inline]
    pub fn index_buffer(&self) -> GfxBufferHandle {
        self.index_buffer
    }

    #[inline]
    pub fn vertex_capacity(&self) -> vk::DeviceSize {
        self.vertex_capacity
    }

    #[inline]
    pub fn index_capacity(&self) -> vk::DeviceSize {
        self.index_capacity
    }
}
// update
impl GuiMesh {
    /// 根据需求动态增长 buffer 大小，返回是否发生了重新分配
    ///
    /// 分配失败没有降级路径，直接返回错误
    pub fn grow_if_needed(
        &mut self,
        device: &mut dyn GfxDevice,
        vertex_bytes: vk::DeviceSize,
        index_bytes: vk::DeviceSize,
    ) -> Result<bool, GfxError> {
        let mut grown = false;

        if vertex_bytes > self.vertex_capacity {
            let capacity = vertex_bytes.next_power_of_two();
            log::info!("grow imgui vertex buffer: {} -> {} bytes", self.vertex_capacity, capacity);
            // 新 buffer 创建成功后才替换，失败时保留旧 buffer
            let buffer = device.create_buffer(&Self::vertex_buffer_desc(capacity))?;
            device.destroy_buffer(std::mem::replace(&mut self.vertex_buffer, buffer));
            self.vertex_capacity = capacity;
            grown = true;
        }

        if index_bytes > self.index_capacity {
            let capacity = index_bytes.next_power_of_two();
            log::info!("grow imgui index buffer: {} -> {} bytes", self.index_capacity, capacity);
            // 新 buffer 创建成功后才替换，失败时保留旧 buffer
            let buffer = device.create_buffer(&Self::index_buffer_desc(capacity))?;
            device.destroy_buffer(std::mem::replace(&mut self.index_buffer, buffer));
            self.index_capacity = capacity;
            grown = true;
        }

        Ok(grown)
    }

    /// 将所有 draw list 的顶点和索引依次紧密地写入 buffer
    ///
    /// 每个 draw list 的写入位置是之前所有 draw list 的大小之和
    pub fn upload(&mut self, device: &mut dyn GfxDevice, draw_data: &GuiDrawData) -> Result<(), GfxError> {
        let _span = tracy_client::span!("GuiMesh::upload");
        self.grow_if_needed(device, draw_data.vertex_bytes(), draw_data.index_bytes())?;

        device.map_buffer(self.vertex_buffer)?;
        if let Err(e) = device.map_buffer(self.index_buffer) {
            device.unmap_buffer(self.vertex_buffer);
            return Err(e);
        }

        let result = self.write_lists(device, draw_data);

        device.unmap_buffer(self.vertex_buffer);
        device.unmap_buffer(self.index_buffer);
        result
    }

    fn write_lists(&self, device: &mut dyn GfxDevice, draw_data: &GuiDrawData) -> Result<(), GfxError> {
        let mut vertex_offset: vk::DeviceSize = 0;
        let mut index_offset: vk::DeviceSize = 0;
        for draw_list in &draw_data.draw_lists {
            let vertices: &[u8] = bytemuck::cast_slice(&draw_list.vertices);
            let indices: &[u8] = bytemuck::cast_slice(&draw_list.indices);

            device.write_mapped(self.vertex_buffer, vertex_offset, vertices)?;
            device.write_mapped(self.index_buffer, index_offset, indices)?;

            vertex_offset += vertices.len() as vk::DeviceSize;
            index_offset += indices.len() as vk::DeviceSize;
        }
        Ok(())
    }
}
