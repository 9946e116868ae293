//! 渐进式累积的控制
//!
//! 每帧根据影响画面的参数计算 fingerprint，参数变化时清零累积的采样数，
//! 否则继续累积直到达到目标采样数。

use std::hash::{DefaultHasher, Hash, Hasher};

/// 影响光追结果的参数子集，只有这些参数变化时才需要重新累积
///
/// 相机不在其中：相机只在窗口尺寸变化时改变
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccumParams {
    pub light_position: glam::Vec3,
    pub light_radius: f32,
    pub ao_ray_count: i32,
    pub ao_radius: f32,
    pub bounces: i32,
    pub reflectance: f32,
    pub roughness: f32,
}
impl AccumParams {
    /// 参数的组合哈希
    ///
    /// 浮点数按 bit 参与哈希，因此任何数值变化都会改变 fingerprint
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.light_position.to_array().map(f32::to_bits).hash(&mut hasher);
        self.light_radius.to_bits().hash(&mut hasher);
        self.ao_ray_count.hash(&mut hasher);
        self.ao_radius.to_bits().hash(&mut hasher);
        self.bounces.hash(&mut hasher);
        self.reflectance.to_bits().hash(&mut hasher);
        self.roughness.to_bits().hash(&mut hasher);
        hasher.finish()
    }
}

/// 累积的状态
///
/// `sample_index` 是当前参数下已经累积进输出图像的采样数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccumState {
    pub sample_index: u32,
    pub target_samples: u32,
    /// 初始为 None，第一帧总是视为 reset
    pub fingerprint: Option<u64>,
}

/// 一帧的累积决策
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccumDecision {
    /// 参数发生了变化，之前累积的结果作废
    pub reset: bool,
    /// 本帧上传给 shader 的采样序号（等于已累积的采样数）
    pub sample_index: u32,
    /// 新采样的混合权重：`1 / (sample_index + 1)`
    pub weight: f32,
    /// 本帧是否 dispatch 光追
    pub dispatch: bool,
}

/// 逐帧累积的控制器
///
/// 每帧调用一次 [`AccumController::update`]。当 `sample_index < target_samples` 时
/// 本帧 dispatch，之后累积数 +1；否则只显示已累积的结果。
/// 因此 target 为 4 时各帧的 sample_index 为 `0, 1, 2, 3, 4, 4, ...`，
/// 前 4 帧 dispatch。
#[derive(Debug, Clone, Default)]
pub struct AccumController {
    state: AccumState,
}
// new & init
impl AccumController {
    pub fn new(target_samples: u32) -> Self {
        Self {
            state: AccumState {
                sample_index: 0,
                target_samples,
                fingerprint: None,
            },
        }
    }
}
// getters
impl AccumController {
    #[inline]
    pub fn state(&self) -> &AccumState {
        &self.state
    }

    #[inline]
    pub fn sample_index(&self) -> u32 {
        self.state.sample_index
    }

    #[inline]
    pub fn target_samples(&self) -> u32 {
        self.state.target_samples
    }

    /// 累积进度，范围 [0, 1]；目标为 0 时返回 0
    pub fn progress(&self) -> f32 {
        if self.state.target_samples == 0 {
            return 0.0;
        }
        (self.state.sample_index as f32 / self.state.target_samples as f32).clamp(0.0, 1.0)
    }
}
// update
impl AccumController {
    /// 运行时修改目标采样数
    ///
    /// 降低目标不会清除已累积的结果，只是停止 dispatch；提高目标会继续累积
    #[inline]
    pub fn set_target_samples(&mut self, target_samples: u32) {
        if target_samples != self.state.target_samples {
            log::debug!("target samples: {} -> {}", self.state.target_samples, target_samples);
        }
        self.state.target_samples = target_samples;
    }

    /// call phase: BeforeRender-CollectData
    pub fn update(&mut self, params: &AccumParams) -> AccumDecision {
        let fingerprint = params.fingerprint();
        let reset = self.state.fingerprint != Some(fingerprint);
        if reset {
            if self.state.fingerprint.is_some() {
                log::debug!("accumulation reset after {} samples", self.state.sample_index);
            }
            self.state.sample_index = 0;
            self.state.fingerprint = Some(fingerprint);
        }

        let sample_index = self.state.sample_index;
        let dispatch = sample_index < self.state.target_samples;
        if dispatch {
            self.state.sample_index += 1;
        }

        AccumDecision {
            reset,
            sample_index,
            weight: 1.0 / (sample_index as f32 + 1.0),
            dispatch,
        }
    }
}
