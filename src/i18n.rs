// ==========================================
// 建筑工作室 S 曲线引擎 - 国际化
// ==========================================
// 使用 rust-i18n，词条位于 locales/*.yml
// 支持中文（默认）和英文；STUDIO_SCURVE_LOCALE 可覆盖启动语言
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 启动语言环境变量
pub const LOCALE_ENV: &str = "STUDIO_SCURVE_LOCALE";

/// 默认语言
pub const DEFAULT_LOCALE: &str = "zh-CN";

/// 支持的语言
pub const SUPPORTED_LOCALES: &[&str] = &["zh-CN", "en"];

/// 将常见写法归一为支持的语言代码（zh / zh_CN / en-US 等）
pub fn normalize_locale(raw: &str) -> Option<&'static str> {
    let lowered = raw.trim().replace('_', "-").to_lowercase();
    let primary = lowered.split(['-', '.']).next().unwrap_or("");
    match primary {
        "zh" => Some("zh-CN"),
        "en" => Some("en"),
        _ => None,
    }
}

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 返回
/// - true: 已切换
/// - false: 不支持的语言，保持原设置
pub fn set_locale(locale: &str) -> bool {
    match normalize_locale(locale) {
        Some(code) => {
            rust_i18n::set_locale(code);
            true
        }
        None => {
            tracing::warn!(locale, "不支持的语言，保持当前设置");
            false
        }
    }
}

/// 按环境变量初始化语言，未设置或不支持时使用默认语言
pub fn init_from_env() {
    let requested = std::env::var(LOCALE_ENV).ok();
    let applied = requested.as_deref().map_or(false, set_locale);
    if !applied {
        rust_i18n::set_locale(DEFAULT_LOCALE);
    }
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use studio_scurve::i18n::t;
/// let msg = t("projection.no_schedule_data");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数，占位符形如 %{name}）
///
/// # 示例
/// ```no_run
/// use studio_scurve::i18n::t_with_args;
/// let msg = t_with_args("schedule.not_a_leaf", &[("code", "01.02")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    fill_args(rust_i18n::t!(key).to_string(), args)
}

/// 按指定语言翻译（不改动全局语言设置）
///
/// locale 为 None 时使用当前全局语言
pub fn t_in(locale: Option<&str>, key: &str, args: &[(&str, &str)]) -> String {
    let raw = match locale.and_then(normalize_locale) {
        Some(loc) => rust_i18n::t!(key, locale = loc).to_string(),
        None => rust_i18n::t!(key).to_string(),
    };
    fill_args(raw, args)
}

fn fill_args(mut result: String, args: &[(&str, &str)]) -> String {
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}
