use crate::accum::{AccumDecision, AccumParams};

/// 每帧上传到 GPU 的常量 buffer，布局与 shader 中的 WorldInfo 一致
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct WorldInfo {
    pub camera_position: glam::Vec3,
    pub num_bounces: i32,

    pub light_ambient_color: glam::Vec4,

    pub light_position: glam::Vec3,
    /// AO 的采样光线数量
    pub num_rays: i32,

    pub light_diffuse_color: glam::Vec4,
    pub light_specular_color: glam::Vec4,

    pub diffuse_coef: f32,
    pub specular_coef: f32,
    pub specular_power: f32,
    pub in_shadow_radiance: f32,

    /// 一直累加的帧计数，用于选择 jitter
    pub frame_count: u32,
    pub light_radius: f32,
    /// 已累积的采样数
    pub sample_index: u32,
    /// `1 / (sample_index + 1)`
    pub accumulation_factor: f32,

    pub ao_radius: f32,
    pub ao_ray_min: f32,
    pub pixel_offset: glam::Vec2,

    pub reflectance_coef: f32,
    pub max_recursion_depth: i32,
    pub roughness: f32,
    pub _padding: f32,

    /// 逆 view-projection 矩阵，用于从像素坐标生成相机光线
    pub inv_camera_view_proj: glam::Mat4,
}
const _: () = assert!(size_of::<WorldInfo>() == 208);

impl WorldInfo {
    pub const CAMERA_TARGET: glam::Vec3 = glam::Vec3::new(0.0, 0.5, 0.0);
    pub const CAMERA_FOV_Y: f32 = std::f32::consts::FRAC_PI_4;
    pub const CAMERA_NEAR: f32 = 0.1;
    pub const CAMERA_FAR: f32 = 100.0;

    /// 场景的默认参数，相机矩阵按照给定的输出尺寸计算
    pub fn new(width: u32, height: u32) -> Self {
        let camera_position = glam::vec3(2.05, 2.0, 1.53);
        Self {
            camera_position,
            num_bounces: 1,
            light_ambient_color: glam::Vec4::splat(0.02),
            light_position: glam::vec3(4.44, 2.07, 0.22),
            num_rays: 4,
            light_diffuse_color: glam::Vec4::ONE,
            light_specular_color: glam::Vec4::ONE,
            diffuse_coef: 0.9,
            specular_coef: 0.7,
            specular_power: 50.0,
            in_shadow_radiance: 0.0,
            frame_count: 0,
            light_radius: 0.03,
            sample_index: 0,
            accumulation_factor: 1.0,
            ao_radius: 0.4,
            ao_ray_min: 0.01,
            pixel_offset: glam::Vec2::splat(0.5),
            reflectance_coef: 0.9,
            max_recursion_depth: 2,
            roughness: 1.0,
            _padding: 0.0,
            inv_camera_view_proj: Self::camera_matrix(camera_position, width, height),
        }
    }

    /// 逆 view-projection 矩阵
    pub fn camera_matrix(camera_position: glam::Vec3, width: u32, height: u32) -> glam::Mat4 {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        let view = glam::Mat4::look_at_rh(camera_position, Self::CAMERA_TARGET, glam::Vec3::Y);
        let proj = glam::Mat4::perspective_rh(Self::CAMERA_FOV_Y, aspect, Self::CAMERA_NEAR, Self::CAMERA_FAR);
        (proj * view).inverse()
    }

    /// 输出尺寸变化后重新计算相机矩阵，不影响累积
    pub fn update_camera(&mut self, width: u32, height: u32) {
        self.inv_camera_view_proj = Self::camera_matrix(self.camera_position, width, height);
    }

    /// 参与累积 fingerprint 的参数
    pub fn accum_params(&self) -> AccumParams {
        AccumParams {
            light_position: self.light_position,
            light_radius: self.light_radius,
            ao_ray_count: self.num_rays,
            ao_radius: self.ao_radius,
            bounces: self.num_bounces,
            reflectance: self.reflectance_coef,
            roughness: self.roughness,
        }
    }

    /// 写入本帧的累积决策与 jitter
    pub fn apply_frame(&mut self, frame_count: u64, decision: &AccumDecision, pixel_offset: glam::Vec2) {
        self.frame_count = frame_count as u32;
        self.sample_index = decision.sample_index;
        self.accumulation_factor = decision.weight;
        self.pixel_offset = pixel_offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;

    #[test]
    fn layout_matches_shader() {
        assert_eq!(offset_of!(WorldInfo, num_bounces), 12);
        assert_eq!(offset_of!(WorldInfo, light_ambient_color), 16);
        assert_eq!(offset_of!(WorldInfo, light_position), 32);
        assert_eq!(offset_of!(WorldInfo, num_rays), 44);
        assert_eq!(offset_of!(WorldInfo, light_diffuse_color), 48);
        assert_eq!(offset_of!(WorldInfo, light_specular_color), 64);
        assert_eq!(offset_of!(WorldInfo, diffuse_coef), 80);
        assert_eq!(offset_of!(WorldInfo, frame_count), 96);
        assert_eq!(offset_of!(WorldInfo, light_radius), 100);
        assert_eq!(offset_of!(WorldInfo, sample_index), 104);
        assert_eq!(offset_of!(WorldInfo, accumulation_factor), 108);
        assert_eq!(offset_of!(WorldInfo, ao_radius), 112);
        assert_eq!(offset_of!(WorldInfo, pixel_offset), 120);
        assert_eq!(offset_of!(WorldInfo, reflectance_coef), 128);
        assert_eq!(offset_of!(WorldInfo, max_recursion_depth), 132);
        assert_eq!(offset_of!(WorldInfo, roughness), 136);
        assert_eq!(offset_of!(WorldInfo, inv_camera_view_proj), 144);
        assert_eq!(bytemuck::bytes_of(&WorldInfo::new(4, 4)).len(), 208);
    }

    #[test]
    fn camera_change_does_not_touch_fingerprint() {
        let mut info = WorldInfo::new(1280, 720);
        let before = info.accum_params().fingerprint();
        let matrix = info.inv_camera_view_proj;

        info.update_camera(640, 640);
        assert_ne!(info.inv_camera_view_proj, matrix);
        assert_eq!(info.accum_params().fingerprint(), before);
    }

    #[test]
    fn camera_matrix_maps_center_towards_target() {
        let info = WorldInfo::new(800, 600);
        let near = info.inv_camera_view_proj.project_point3(glam::vec3(0.0, 0.0, 0.0));
        let far = info.inv_camera_view_proj.project_point3(glam::vec3(0.0, 0.0, 1.0));
        let dir = (far - near).normalize();
        let expected = (WorldInfo::CAMERA_TARGET - info.camera_position).normalize();
        assert!(dir.dot(expected) > 0.999);
    }
}
