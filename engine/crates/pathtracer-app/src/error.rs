use pathtracer_gfx::error::GfxError;

/// 启动阶段的错误，出现时不能进入帧循环
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("ray tracing is not supported by the device")]
    RayTracingUnsupported,

    #[error("unsupported graphics backend '{0}'")]
    UnsupportedBackend(String),

    #[error(transparent)]
    Gfx(#[from] GfxError),
}

/// 帧循环中不可恢复的错误
///
/// UI 引用失效 texture 的情况不在其中，只会放弃当帧的 UI 绘制
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error(transparent)]
    Gfx(#[from] GfxError),
}
