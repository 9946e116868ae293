//! 一个最小的房间场景
//!
//! 场景加载不在本项目的范围内，这里只按照光追 shader 需要的绑定创建占位资源：
//! index buffer、法线、纹理坐标、漫反射贴图、粗糙度贴图和 sampler。

use pathtracer_app::path_tracer_pass::RtScene;
use pathtracer_gfx::device::{GfxBackend, GfxDevice};
use pathtracer_gfx::error::GfxError;
use pathtracer_gfx::handles::GfxTextureHandle;
use pathtracer_gfx::resources::{GfxBufferDesc, GfxResourceBinding, GfxSamplerDesc, GfxTextureDesc};
use pathtracer_gfx::vk;

/// 地面 + 背墙，两个 quad
const QUAD_COUNT: u64 = 2;
const TEXTURE_SIZE: u32 = 8;

/// 离屏的呈现目标，格式跟随后端的 swapchain 格式
pub fn create_present_target(
    device: &mut dyn GfxDevice,
    backend: GfxBackend,
    width: u32,
    height: u32,
) -> Result<GfxTextureHandle, GfxError> {
    device.create_texture(
        &GfxTextureDesc {
            extent: vk::Extent2D { width, height },
            format: backend.present_format(),
            usage: vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST,
            name: "present".to_string(),
        },
        None,
    )
}

pub fn create_room_scene(device: &mut dyn GfxDevice) -> Result<RtScene, GfxError> {
    let structured = |size: u64, name: &str| GfxBufferDesc {
        size,
        usage: vk::BufferUsageFlags::STORAGE_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
        cpu_write: false,
        name: name.to_string(),
    };
    let vertex_count = QUAD_COUNT * 4;

    let tlas = device.create_buffer(&GfxBufferDesc {
        size: 256,
        usage: vk::BufferUsageFlags::ACCELERATION_STRUCTURE_STORAGE_KHR,
        cpu_write: false,
        name: "room-tlas".to_string(),
    })?;
    let indices = device.create_buffer(&structured(QUAD_COUNT * 6 * 4, "room-indices"))?;
    let normals = device.create_buffer(&structured(vertex_count * 12, "room-normals"))?;
    let texcoords = device.create_buffer(&structured(vertex_count * 8, "room-texcoords"))?;

    let diffuse = device.create_texture(
        &texture_desc("room-diffuse", vk::Format::R8G8B8A8_SRGB),
        Some(&checkerboard([200, 200, 200, 255], [90, 90, 90, 255])),
    )?;
    let roughness = device.create_texture(
        &texture_desc("room-roughness", vk::Format::R8G8B8A8_UNORM),
        Some(&checkerboard([255, 255, 255, 255], [64, 64, 64, 255])),
    )?;
    let sampler = device.create_sampler(&GfxSamplerDesc::default(), "room")?;

    Ok(RtScene::new(tlas).with_resources([
        GfxResourceBinding::StructuredBuffer(indices),
        GfxResourceBinding::StructuredBuffer(normals),
        GfxResourceBinding::StructuredBuffer(texcoords),
        GfxResourceBinding::SampledTexture(diffuse),
        GfxResourceBinding::SampledTexture(roughness),
        GfxResourceBinding::Sampler(sampler),
    ]))
}

fn texture_desc(name: &str, format: vk::Format) -> GfxTextureDesc {
    GfxTextureDesc {
        extent: vk::Extent2D {
            width: TEXTURE_SIZE,
            height: TEXTURE_SIZE,
        },
        format,
        usage: vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST,
        name: name.to_string(),
    }
}

fn checkerboard(even: [u8; 4], odd: [u8; 4]) -> Vec<u8> {
    (0..TEXTURE_SIZE * TEXTURE_SIZE)
        .flat_map(|i| {
            let (x, y) = (i % TEXTURE_SIZE, i / TEXTURE_SIZE);
            if (x + y) % 2 == 0 { even } else { odd }
        })
        .collect()
}
