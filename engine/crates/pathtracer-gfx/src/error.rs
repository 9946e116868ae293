use ash::vk;

/// GFX 层的错误
///
/// 资源创建失败（包括动态 buffer 的扩容失败）没有降级路径，调用方应当视为致命错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GfxError {
    #[error("out of device memory while creating '{name}' ({size} bytes)")]
    OutOfMemory { name: String, size: vk::DeviceSize },

    #[error("invalid {kind} handle")]
    InvalidHandle { kind: &'static str },

    #[error("buffer '{name}' is not mapped for cpu write")]
    NotMapped { name: String },

    #[error("write of {len} bytes at offset {offset} exceeds buffer '{name}' of {size} bytes")]
    WriteOutOfBounds {
        name: String,
        offset: vk::DeviceSize,
        len: vk::DeviceSize,
        size: vk::DeviceSize,
    },

    #[error("draw reads {required} bytes from '{name}' which only holds {size} bytes")]
    DrawOutOfBounds {
        name: String,
        required: vk::DeviceSize,
        size: vk::DeviceSize,
    },

    #[error("unsupported: {0}")]
    Unsupported(String),
}
