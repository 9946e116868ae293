use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 默认的配置文件名，位于当前工作目录
pub const DEFAULT_SETTINGS_FILE: &str = "pathtracer.toml";

/// TOML 配置文件中的应用配置
///
/// 所有字段都有默认值，配置文件中只需要写出需要覆盖的部分。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// 窗口（以及光追输出）的初始宽度
    pub width: u32,
    /// 窗口（以及光追输出）的初始高度
    pub height: u32,

    /// 图形后端名称：vulkan | directx12
    ///
    /// 其他取值会在启动阶段被拒绝
    pub backend: String,

    /// 累积的目标采样数
    pub target_samples: u32,

    /// headless 模式下运行的帧数
    pub frames: u32,

    pub log_level: String,

    /// 窗口的 DPI 缩放
    pub hidpi_factor: f32,

    /// 是否在面板中显示光追输出的预览图
    pub show_output_preview: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            backend: "vulkan".to_string(),
            target_samples: 128,
            frames: 256,
            log_level: "info".to_string(),
            hidpi_factor: 1.0,
            show_output_preview: true,
        }
    }
}

impl AppSettings {
    /// 从 TOML 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).with_context(|| format!("读取配置文件失败: {:?}", path.as_ref()))?;

        Self::from_toml_str(&content).with_context(|| format!("解析 TOML 配置失败: {:?}", path.as_ref()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let settings: AppSettings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// 配置文件存在时加载，不存在时使用默认配置
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            // logger 可能还没有初始化，因此这里的日志不一定能看到
            log::info!("配置文件 {:?} 不存在，使用默认配置", path.as_ref());
            Ok(Self::default())
        }
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self).context("序列化配置失败")?;

        fs::write(path.as_ref(), content).with_context(|| format!("写入配置文件失败: {:?}", path.as_ref()))?;

        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.width > 0 && self.height > 0, "窗口尺寸不能为 0: {}x{}", self.width, self.height);
        anyhow::ensure!(self.hidpi_factor > 0.0, "hidpi_factor 必须大于 0: {}", self.hidpi_factor);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let settings = AppSettings::from_toml_str("target_samples = 16\nbackend = \"directx12\"\n").unwrap();

        assert_eq!(settings.target_samples, 16);
        assert_eq!(settings.backend, "directx12");
        assert_eq!(settings.width, 1280);
        assert_eq!(settings.height, 720);
        assert!(settings.show_output_preview);
    }

    #[test]
    fn zero_extent_is_rejected() {
        assert!(AppSettings::from_toml_str("width = 0").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let path = "this-file-does-not-exist.toml";
        assert!(AppSettings::from_file(path).is_err());

        let settings = AppSettings::load_or_default(path).unwrap();
        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("pathtracer-settings-{}.toml", std::process::id()));
        let settings = AppSettings {
            frames: 12,
            log_level: "debug".to_string(),
            ..Default::default()
        };

        settings.save_to_file(&path).unwrap();
        let loaded = AppSettings::from_file(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded, settings);
    }
}
