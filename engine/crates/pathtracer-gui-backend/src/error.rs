use pathtracer_gfx::error::GfxError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuiDrawError {
    /// 绘制命令引用了一个已经被移除的 texture
    ///
    /// 说明调用方的生命周期管理有问题；只放弃本帧的 UI 绘制
    #[error("gui draw command references stale texture id {0}")]
    StaleTexture(usize),

    /// GPU 资源错误（包括 buffer 扩容失败），不可恢复
    #[error(transparent)]
    Gfx(#[from] GfxError),
}
impl GuiDrawError {
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::StaleTexture(_))
    }
}
