/// 一直递增的帧计数
///
/// 与累积的采样数无关：即使累积已经停止，jitter 仍然随帧计数变化
#[derive(Debug, Clone, Default)]
pub struct FrameCounter {
    frame_id: u64,
}
// new & init
impl FrameCounter {
    pub fn new(init_frame_id: u64) -> Self {
        Self {
            frame_id: init_frame_id,
        }
    }
}
// update
impl FrameCounter {
    /// 进入下一帧，返回新的帧序号
    #[inline]
    pub fn next_frame(&mut self) -> u64 {
        self.frame_id = self.frame_id.wrapping_add(1);
        self.frame_id
    }
}
// getters
impl FrameCounter {
    #[inline]
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    #[inline]
    pub fn frame_name(&self) -> String {
        format!("[F{}]", self.frame_id)
    }
}
