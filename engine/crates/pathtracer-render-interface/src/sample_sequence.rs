/// 采样序列的长度
pub const SAMPLE_SEQUENCE_LEN: usize = 127;

/// Halton(2, 3) 序列，从 index = 1 开始，编译期生成
///
/// 每一位 digit 按 `d -> base - d` 置换（base 2 上不变，base 3 上 1 和 2 互换）
static HALTON_2_3: [[f32; 2]; SAMPLE_SEQUENCE_LEN] = build_halton();

const fn scrambled_radical_inverse(base: u32, mut index: u32) -> f32 {
    let inv_base = 1.0 / base as f64;
    let mut factor = inv_base;
    let mut result = 0.0;
    while index > 0 {
        let digit = index % base;
        let digit = if digit == 0 { 0 } else { base - digit };
        result += factor * digit as f64;
        index /= base;
        factor *= inv_base;
    }
    result as f32
}

const fn build_halton() -> [[f32; 2]; SAMPLE_SEQUENCE_LEN] {
    let mut table = [[0.0; 2]; SAMPLE_SEQUENCE_LEN];
    let mut i = 0;
    while i < SAMPLE_SEQUENCE_LEN {
        let index = i as u32 + 1;
        table[i] = [scrambled_radical_inverse(2, index), scrambled_radical_inverse(3, index)];
        i += 1;
    }
    table
}

/// 低差异序列，用于每帧的像素 jitter
///
/// 无状态，按 `n % len` 循环取值
pub struct SampleSequence;
impl SampleSequence {
    #[inline]
    pub const fn len() -> usize {
        SAMPLE_SEQUENCE_LEN
    }

    #[inline]
    pub fn points() -> &'static [[f32; 2]] {
        &HALTON_2_3
    }

    /// 第 n 个 jitter offset，n 超过序列长度时回绕
    #[inline]
    pub fn get(n: u64) -> glam::Vec2 {
        glam::Vec2::from(HALTON_2_3[(n % SAMPLE_SEQUENCE_LEN as u64) as usize])
    }
}
