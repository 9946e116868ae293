use imgui::TextureId;
use pathtracer_gfx::device::GfxDevice;
use pathtracer_gfx::error::GfxError;
use pathtracer_gfx::handles::{GfxBufferHandle, GfxResourceSetHandle, GfxSamplerHandle, GfxTextureHandle};
use pathtracer_gfx::resources::{GfxResourceBinding, GfxResourceSetDesc};
use slotmap::SecondaryMap;

use crate::error::GuiDrawError;

/// 字体 texture 的 TextureId，固定不变，不经过 registry 分配
pub const FONT_TEXTURE_ID: usize = 1;
/// registry 分配的第一个 TextureId，之前的值保留给内置的 texture
pub const FIRST_USER_TEXTURE_ID: usize = 100;

/// 一个 texture 的绑定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuiTextureBinding {
    pub texture_id: TextureId,
    pub texture: GfxTextureHandle,
    pub resource_set: GfxResourceSetHandle,
}

/// 将任意 texture 映射为 imgui 的 TextureId
///
/// 绑定记录保存在一个数组中，下标为 `TextureId - FIRST_USER_TEXTURE_ID`；
/// texture 到下标的反查放在 `by_texture` 中。
/// TextureId 单调递增，移除后也不会复用，避免 UI 代码中残留的 id 指向新的 texture。
///
/// registry 拥有它创建的所有 resource set，字体的 resource set 不在其中。
pub struct GuiTextureRegistry {
    bindings: Vec<Option<GuiTextureBinding>>,
    by_texture: SecondaryMap<GfxTextureHandle, usize>,

    /// 所有 resource set 共享的 sampler 和常量 buffer
    sampler: GfxSamplerHandle,
    constant_buffer: GfxBufferHandle,
}
// new & init
impl GuiTextureRegistry {
    pub fn new(sampler: GfxSamplerHandle, constant_buffer: GfxBufferHandle) -> Self {
        Self {
            bindings: Vec::new(),
            by_texture: SecondaryMap::new(),
            sampler,
            constant_buffer,
        }
    }
}
// destroy
impl GuiTextureRegistry {
    /// 释放所有的 resource set，每个只释放一次
    pub fn destroy(mut self, device: &mut dyn GfxDevice) {
        let mut count = 0;
        for binding in self.bindings.drain(..).flatten() {
            device.destroy_resource_set(binding.resource_set);
            count += 1;
        }
        self.by_texture.clear();
        log::info!("gui texture registry destroyed, {} bindings released", count);
    }
}
impl Drop for GuiTextureRegistry {
    fn drop(&mut self) {
        if self.bindings.iter().any(Option::is_some) {
            log::error!("GuiTextureRegistry dropped with live bindings, call destroy first");
        }
    }
}
// getters
impl GuiTextureRegistry {
    /// 存活的绑定数量
    pub fn len(&self) -> usize {
        self.by_texture.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_texture.is_empty()
    }

    pub fn texture_id_of(&self, texture: GfxTextureHandle) -> Option<TextureId> {
        self.by_texture.get(texture).map(|&index| Self::texture_id_at(index))
    }

    #[inline]
    fn texture_id_at(index: usize) -> TextureId {
        TextureId::new(FIRST_USER_TEXTURE_ID + index)
    }
}
// update
impl GuiTextureRegistry {
    /// 获取 texture 的 TextureId，第一次引用时创建绑定
    pub fn bind(&mut self, device: &mut dyn GfxDevice, texture: GfxTextureHandle) -> Result<TextureId, GfxError> {
        if let Some(texture_id) = self.texture_id_of(texture) {
            return Ok(texture_id);
        }

        let index = self.bindings.len();
        let texture_id = Self::texture_id_at(index);
        let resource_set = device.create_resource_set(&GfxResourceSetDesc {
            bindings: vec![
                GfxResourceBinding::ConstantBuffer(self.constant_buffer),
                GfxResourceBinding::SampledTexture(texture),
                GfxResourceBinding::Sampler(self.sampler),
            ],
            name: format!("imgui-texture-{}", texture_id.id()),
        })?;

        self.bindings.push(Some(GuiTextureBinding {
            texture_id,
            texture,
            resource_set,
        }));
        self.by_texture.insert(texture, index);
        log::info!("gui texture bound: {:?} -> {}", texture, texture_id.id());

        Ok(texture_id)
    }

    /// 移除 texture 的绑定，释放对应的 resource set；没有绑定时什么也不做
    pub fn unbind(&mut self, device: &mut dyn GfxDevice, texture: GfxTextureHandle) -> bool {
        let Some(index) = self.by_texture.remove(texture) else {
            return false;
        };
        let Some(binding) = self.bindings.get_mut(index).and_then(Option::take) else {
            return false;
        };

        device.destroy_resource_set(binding.resource_set);
        log::info!("gui texture unbound: {}", binding.texture_id.id());
        true
    }

    /// 查找 TextureId 对应的 resource set
    ///
    /// 找不到说明 UI 代码引用了一个已经移除的 texture
    pub fn resolve(&self, texture_id: TextureId) -> Result<GfxResourceSetHandle, GuiDrawError> {
        texture_id
            .id()
            .checked_sub(FIRST_USER_TEXTURE_ID)
            .and_then(|index| self.bindings.get(index))
            .and_then(|binding| binding.as_ref())
            .map(|binding| binding.resource_set)
            .ok_or(GuiDrawError::StaleTexture(texture_id.id()))
    }
}
