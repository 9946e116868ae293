//! imgui 的渲染后端
//!
//! imgui 每帧输出的 draw data 先被复制为 [`gui_draw_data::GuiDrawData`] 快照，
//! 之后由 [`gui_pass::GuiPass`] 上传到 [`gui_mesh::GuiMesh`] 并翻译为 GPU 命令。
//! UI 代码中引用的任意 texture 通过 [`texture_registry::GuiTextureRegistry`] 获得 TextureId。

pub mod error;
pub mod gui_draw_data;
pub mod gui_mesh;
pub mod gui_pass;
pub mod texture_registry;
