// ==========================================
// 建筑工作室 S 曲线引擎 - 命令行入口
// ==========================================
// 用法: studio-scurve <project_id> [BALLPARK|ESTIMATES|DETAIL]
// 输出: 投影结果 JSON（stdout）；日志写 stderr
// 数据库: STUDIO_SCURVE_DB_PATH 或用户数据目录
// 语言: STUDIO_SCURVE_LOCALE（zh-CN / en）
// ==========================================

use studio_scurve::app::{get_default_db_path, AppState};
use studio_scurve::i18n::{t, t_with_args};
use studio_scurve::CostMode;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    studio_scurve::logging::init();
    studio_scurve::i18n::init_from_env();

    let mut args = std::env::args().skip(1);
    let project_id = match args
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
    {
        Some(id) => id,
        None => {
            eprintln!("{}", t("cli.usage"));
            std::process::exit(2);
        }
    };

    let mode = match args.next() {
        Some(raw) => match CostMode::from_db_str(&raw) {
            Some(mode) => Some(mode),
            None => {
                eprintln!("{}", t_with_args("cli.invalid_mode", &[("mode", raw.as_str())]));
                eprintln!("{}", t("cli.usage"));
                std::process::exit(2);
            }
        },
        None => None,
    };

    tracing::info!("{} v{}", studio_scurve::APP_NAME, studio_scurve::VERSION);

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path)?;
    let response = state.projection_api.project_curve(&project_id, mode)?;

    for notice in &response.notices {
        tracing::warn!("{}", notice);
    }

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
