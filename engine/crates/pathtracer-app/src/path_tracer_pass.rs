use ash::vk;
use pathtracer_gfx::command_buffer::GfxCommandBuffer;
use pathtracer_gfx::device::GfxDevice;
use pathtracer_gfx::error::GfxError;
use pathtracer_gfx::handles::{GfxBufferHandle, GfxPipelineHandle, GfxResourceSetHandle, GfxTextureHandle};
use pathtracer_gfx::resources::{
    GfxHitGroup, GfxPipelineDesc, GfxRayTracingPipelineDesc, GfxResourceBinding, GfxResourceSetDesc,
    GfxShaderStageInfo, GfxTextureDesc,
};
use pathtracer_render_interface::frame_settings::DefaultRendererSettings;

/// 光追用到的场景资源，由调用方创建和销毁
pub struct RtScene {
    /// 顶层加速结构
    pub acceleration_structure: GfxBufferHandle,
    /// 追加在固定绑定之后的资源：index buffer、法线、纹理坐标、材质贴图和 sampler 等
    pub resources: Vec<GfxResourceBinding>,
}
impl RtScene {
    pub fn new(acceleration_structure: GfxBufferHandle) -> Self {
        Self {
            acceleration_structure,
            resources: Vec::new(),
        }
    }

    pub fn with_resources(mut self, resources: impl IntoIterator<Item = GfxResourceBinding>) -> Self {
        self.resources.extend(resources);
        self
    }

    /// 销毁场景中的所有资源，每个资源只能在列表中出现一次
    pub fn destroy(self, device: &mut dyn GfxDevice) {
        device.destroy_buffer(self.acceleration_structure);
        for binding in self.resources {
            match binding {
                GfxResourceBinding::ConstantBuffer(buffer)
                | GfxResourceBinding::StructuredBuffer(buffer)
                | GfxResourceBinding::AccelerationStructure(buffer) => device.destroy_buffer(buffer),
                GfxResourceBinding::SampledTexture(texture) | GfxResourceBinding::StorageTexture(texture) => {
                    device.destroy_texture(texture)
                }
                GfxResourceBinding::Sampler(sampler) => device.destroy_sampler(sampler),
            }
        }
    }
}

/// 渐进式路径追踪的 pass
///
/// 持有光追 pipeline、输出 texture 以及 resource set。resource set 的绑定顺序：
/// 0. world info 常量 buffer
/// 1. 输出 texture（storage）
/// 2. 顶层加速结构
/// 3. 之后为 [`RtScene::resources`]
pub struct PathTracerPass {
    pipeline: GfxPipelineHandle,

    output: GfxTextureHandle,
    output_extent: vk::Extent2D,
    resource_set: GfxResourceSetHandle,

    world_info_buffer: GfxBufferHandle,
    scene: RtScene,
}
// new & init
impl PathTracerPass {
    const SHADER_PATH: &'static str = "rt/pathtracer.slang";
    /// payload 为 5 个 float
    const MAX_PAYLOAD_SIZE: u32 = 5 * size_of::<f32>() as u32;
    /// 三角形的重心坐标
    const MAX_ATTRIBUTE_SIZE: u32 = 2 * size_of::<f32>() as u32;
    const MAX_RECURSION_DEPTH: u32 = 6;

    pub fn new(
        device: &mut dyn GfxDevice,
        world_info_buffer: GfxBufferHandle,
        scene: RtScene,
        extent: vk::Extent2D,
    ) -> Result<Self, GfxError> {
        let pipeline = device.create_pipeline(&GfxPipelineDesc::RayTracing(Self::pipeline_desc()))?;

        let output = match Self::create_output(device, extent) {
            Ok(output) => output,
            Err(e) => {
                device.destroy_pipeline(pipeline);
                return Err(e);
            }
        };
        let resource_set = match Self::create_resource_set(device, world_info_buffer, output, &scene) {
            Ok(set) => set,
            Err(e) => {
                device.destroy_texture(output);
                device.destroy_pipeline(pipeline);
                return Err(e);
            }
        };

        log::info!(
            "path tracer pass created: {}x{}, {} scene bindings",
            extent.width,
            extent.height,
            scene.resources.len()
        );

        Ok(Self {
            pipeline,
            output,
            output_extent: extent,
            resource_set,
            world_info_buffer,
            scene,
        })
    }

    pub fn pipeline_desc() -> GfxRayTracingPipelineDesc {
        let general = |name: &str, shader: &str| GfxHitGroup::General {
            name: name.to_string(),
            shader: shader.to_string(),
        };
        let triangles = |name: &str, closest_hit: &str| GfxHitGroup::Triangles {
            name: name.to_string(),
            closest_hit: closest_hit.to_string(),
        };

        GfxRayTracingPipelineDesc {
            shader_library: GfxShaderStageInfo {
                stage: vk::ShaderStageFlags::RAYGEN_KHR
                    | vk::ShaderStageFlags::MISS_KHR
                    | vk::ShaderStageFlags::CLOSEST_HIT_KHR,
                entry_point: "ray_gen".to_string(),
                path: Self::SHADER_PATH.to_string(),
            },
            hit_groups: vec![
                general("ray_gen", "ray_gen"),
                general("sky_miss", "sky_miss"),
                general("shadow_miss", "shadow_miss"),
                general("ao_miss", "ao_miss"),
                general("gi_miss", "gi_miss"),
                triangles("hit", "closest_hit"),
                triangles("shadow_hit", "shadow_closest_hit"),
                triangles("ao_hit", "ao_closest_hit"),
                triangles("gi_hit", "gi_closest_hit"),
            ],
            max_payload_size: Self::MAX_PAYLOAD_SIZE,
            max_attribute_size: Self::MAX_ATTRIBUTE_SIZE,
            max_recursion_depth: Self::MAX_RECURSION_DEPTH,
            name: "pathtracer".to_string(),
        }
    }

    fn create_output(device: &mut dyn GfxDevice, extent: vk::Extent2D) -> Result<GfxTextureHandle, GfxError> {
        device.create_texture(
            &GfxTextureDesc {
                extent,
                format: DefaultRendererSettings::RT_OUTPUT_FORMAT,
                usage: vk::ImageUsageFlags::STORAGE
                    | vk::ImageUsageFlags::SAMPLED
                    | vk::ImageUsageFlags::TRANSFER_SRC,
                name: "pathtracer-output".to_string(),
            },
            None,
        )
    }

    fn create_resource_set(
        device: &mut dyn GfxDevice,
        world_info_buffer: GfxBufferHandle,
        output: GfxTextureHandle,
        scene: &RtScene,
    ) -> Result<GfxResourceSetHandle, GfxError> {
        let mut bindings = vec![
            GfxResourceBinding::ConstantBuffer(world_info_buffer),
            GfxResourceBinding::StorageTexture(output),
            GfxResourceBinding::AccelerationStructure(scene.acceleration_structure),
        ];
        bindings.extend(scene.resources.iter().copied());

        device.create_resource_set(&GfxResourceSetDesc {
            bindings,
            name: "pathtracer".to_string(),
        })
    }
}
// destroy
impl PathTracerPass {
    /// 场景资源归调用方所有，这里只销毁 pass 自己创建的对象
    pub fn destroy(self, device: &mut dyn GfxDevice) -> RtScene {
        device.destroy_resource_set(self.resource_set);
        device.destroy_texture(self.output);
        device.destroy_pipeline(self.pipeline);
        self.scene
    }
}
// getters
impl PathTracerPass {
    #[inline]
    pub fn output(&self) -> GfxTextureHandle {
        self.output
    }

    #[inline]
    pub fn output_extent(&self) -> vk::Extent2D {
        self.output_extent
    }

    #[inline]
    pub fn resource_set(&self) -> GfxResourceSetHandle {
        self.resource_set
    }

    #[inline]
    pub fn pipeline(&self) -> GfxPipelineHandle {
        self.pipeline
    }
}
// update
impl PathTracerPass {
    /// 按新的尺寸重建输出 texture 以及引用它的 resource set
    ///
    /// 调用前需要确保 GPU 不再使用旧的 texture
    pub fn resize(&mut self, device: &mut dyn GfxDevice, extent: vk::Extent2D) -> Result<(), GfxError> {
        let output = Self::create_output(device, extent)?;
        let resource_set = match Self::create_resource_set(device, self.world_info_buffer, output, &self.scene) {
            Ok(set) => set,
            Err(e) => {
                device.destroy_texture(output);
                return Err(e);
            }
        };

        device.destroy_resource_set(self.resource_set);
        device.destroy_texture(self.output);

        self.output = output;
        self.resource_set = resource_set;
        self.output_extent = extent;
        log::info!("path tracer output resized to {}x{}", extent.width, extent.height);
        Ok(())
    }
}
// draw
impl PathTracerPass {
    /// 每个像素一条光线，累积到输出 texture 上
    pub fn dispatch(&self, cmd: &mut GfxCommandBuffer) {
        cmd.begin_label("Ray trace");
        cmd.cmd_bind_pipeline(vk::PipelineBindPoint::RAY_TRACING_KHR, self.pipeline);
        cmd.cmd_bind_resource_set(vk::PipelineBindPoint::RAY_TRACING_KHR, 0, self.resource_set);
        cmd.trace_rays(
            self.output_extent.width,
            self.output_extent.height,
            DefaultRendererSettings::RT_DISPATCH_DEPTH,
        );
        cmd.end_label();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathtracer_gfx::command_buffer::GfxCommand;
    use pathtracer_gfx::device::{GfxBackend, GfxCapabilities};
    use pathtracer_gfx::headless::HeadlessGfx;
    use pathtracer_gfx::resources::GfxBufferDesc;

    fn setup(gfx: &mut HeadlessGfx) -> (GfxBufferHandle, RtScene) {
        let world = gfx.create_buffer(&GfxBufferDesc::new_constant_buffer(208, "world-info")).unwrap();
        let tlas = gfx
            .create_buffer(&GfxBufferDesc {
                usage: vk::BufferUsageFlags::ACCELERATION_STRUCTURE_STORAGE_KHR,
                ..GfxBufferDesc::new_constant_buffer(64, "tlas")
            })
            .unwrap();
        let normals = gfx.create_buffer(&GfxBufferDesc::new_vertex_buffer(48, "normals")).unwrap();
        (
            world,
            RtScene::new(tlas).with_resources([GfxResourceBinding::StructuredBuffer(normals)]),
        )
    }

    #[test]
    fn resource_set_order() {
        let mut gfx = HeadlessGfx::new(GfxBackend::Vulkan);
        let (world, scene) = setup(&mut gfx);
        let tlas = scene.acceleration_structure;
        let pass = PathTracerPass::new(&mut gfx, world, scene, vk::Extent2D { width: 64, height: 32 }).unwrap();

        let bindings = &gfx.resource_set_desc(pass.resource_set()).unwrap().bindings;
        assert_eq!(bindings.len(), 4);
        assert_eq!(bindings[0], GfxResourceBinding::ConstantBuffer(world));
        assert_eq!(bindings[1], GfxResourceBinding::StorageTexture(pass.output()));
        assert_eq!(bindings[2], GfxResourceBinding::AccelerationStructure(tlas));
        assert!(matches!(bindings[3], GfxResourceBinding::StructuredBuffer(_)));

        let output_desc = gfx.texture_desc(pass.output()).unwrap();
        assert_eq!(output_desc.format, vk::Format::R16G16B16A16_SFLOAT);
        assert!(output_desc.usage.contains(vk::ImageUsageFlags::STORAGE | vk::ImageUsageFlags::SAMPLED));
    }

    #[test]
    fn dispatch_covers_output() {
        let mut gfx = HeadlessGfx::new(GfxBackend::Vulkan);
        let (world, scene) = setup(&mut gfx);
        let pass = PathTracerPass::new(&mut gfx, world, scene, vk::Extent2D { width: 64, height: 32 }).unwrap();

        let mut cmd = GfxCommandBuffer::new("rt");
        cmd.begin();
        pass.dispatch(&mut cmd);
        cmd.end();

        assert!(cmd.commands().contains(&GfxCommand::DispatchRays {
            width: 64,
            height: 32,
            depth: 1
        }));
        gfx.submit(cmd).unwrap();
        assert_eq!(gfx.stats().dispatches, 1);
    }

    #[test]
    fn resize_replaces_output_and_set() {
        let mut gfx = HeadlessGfx::new(GfxBackend::Vulkan);
        let (world, scene) = setup(&mut gfx);
        let mut pass = PathTracerPass::new(&mut gfx, world, scene, vk::Extent2D { width: 64, height: 32 }).unwrap();
        let old_output = pass.output();
        let live = gfx.live_resource_count();

        pass.resize(&mut gfx, vk::Extent2D { width: 128, height: 16 }).unwrap();

        assert_ne!(pass.output(), old_output);
        assert!(gfx.texture_desc(old_output).is_none());
        assert_eq!(gfx.texture_extent(pass.output()), Some(vk::Extent2D { width: 128, height: 16 }));
        assert_eq!(gfx.live_resource_count(), live);

        let scene = pass.destroy(&mut gfx);
        assert_eq!(scene.resources.len(), 1);
        scene.destroy(&mut gfx);
        gfx.destroy_buffer(world);
        assert_eq!(gfx.live_resource_count(), 0);
        assert_eq!(gfx.stats().invalid_destroys, 0);
    }

    #[test]
    fn no_ray_tracing_no_pipeline() {
        let mut gfx = HeadlessGfx::with_capabilities(GfxCapabilities {
            ray_tracing: false,
            ..GfxCapabilities::new(GfxBackend::Vulkan)
        });
        let (world, scene) = setup(&mut gfx);

        let result = PathTracerPass::new(&mut gfx, world, scene, vk::Extent2D { width: 8, height: 8 });
        assert!(matches!(result, Err(GfxError::Unsupported(_))));
    }
}
