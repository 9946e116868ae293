use std::io::Write;

/// 使用统一的彩色格式初始化 env_logger
///
/// 格式：`[HH:MM:SS] LEVEL [file:line] message`
pub fn init_log(level: log::LevelFilter) {
    let result = env_logger::Builder::new()
        .format(|buf, record| {
            let info_style = buf
                .default_level_style(log::Level::Info)
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green)));
            let warn_style = buf
                .default_level_style(log::Level::Warn)
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow)));
            let error_style = buf
                .default_level_style(log::Level::Error)
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red)));

            let level_style = match record.level() {
                log::Level::Info => info_style,
                log::Level::Warn => warn_style,
                log::Level::Error => error_style,
                _ => buf.default_level_style(record.level()),
            };
            let grey_style = info_style.fg_color(Some(anstyle::Color::Rgb(anstyle::RgbColor(110, 110, 110))));

            let line = record.line().unwrap_or(!0);
            let file = record.file().unwrap_or("").rsplit(['\\', '/']).next().unwrap_or("");
            let time = chrono::Local::now().format("%H:%M:%S");
            let level = record.level();

            writeln!(
                buf,
                "{level_style}[{time}] {level}{level_style:#} {grey_style}[{file}:{line}]{grey_style:#} {}",
                record.args()
            )
        })
        .filter(None, level)
        .try_init();

    // 重复初始化（例如多个 binary 共用入口）时只保留第一次的 logger
    if result.is_err() {
        log::debug!("logger already initialized");
    }
}

/// 将 panic 信息输出到日志中
pub fn panic_handler(info: &std::panic::PanicHookInfo) {
    log::error!("{}", info);
}

/// 解析配置文件中的日志等级，无法识别时退回到 Info
pub fn parse_level_filter(level: &str) -> log::LevelFilter {
    level.parse().unwrap_or_else(|_| {
        eprintln!("unknown log level '{level}', fallback to info");
        log::LevelFilter::Info
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_and_unknown_levels() {
        assert_eq!(parse_level_filter("debug"), log::LevelFilter::Debug);
        assert_eq!(parse_level_filter("WARN"), log::LevelFilter::Warn);
        assert_eq!(parse_level_filter("loud"), log::LevelFilter::Info);
    }
}
