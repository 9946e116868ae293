//! PathTracer 工具集
//!
//! 提供日志初始化、panic 钩子以及 TOML 配置文件的加载。

pub mod init_log;
pub mod settings;
