// ==========================================
// 建筑工作室 S 曲线引擎 - 性能观测
// ==========================================
// 职责: SQL 语句计数 / 慢 SQL 告警 / API 调用耗时
// 开关（进程内只读取一次）:
// - STUDIO_SCURVE_PERF_SQL=1 强制开启 SQL 追踪（Debug 默认开启）
// - STUDIO_SCURVE_SLOW_SQL_MS=50 慢 SQL 阈值（毫秒）
// ==========================================

use rusqlite::Connection;
use std::cell::Cell;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

pub const PERF_SQL_ENV: &str = "STUDIO_SCURVE_PERF_SQL";
pub const SLOW_SQL_MS_ENV: &str = "STUDIO_SCURVE_SLOW_SQL_MS";

/// 慢 SQL 日志中 SQL 文本的最大字符数
const SQL_LOG_MAX_CHARS: usize = 420;

thread_local! {
    static PERF_DEPTH: Cell<u32> = Cell::new(0);
    static SQL_COUNT: Cell<u64> = Cell::new(0);
    static SLOW_SQL_COUNT: Cell<u64> = Cell::new(0);
}

// ==========================================
// PerfSettings - 追踪开关与阈值
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerfSettings {
    pub sql_tracing: bool,
    pub slow_sql_ms: u64,
}

impl PerfSettings {
    fn parse(perf_sql: Option<&str>, slow_sql_ms: Option<&str>) -> Self {
        let sql_tracing = match perf_sql {
            Some(v) => is_true(v),
            None => cfg!(debug_assertions),
        };
        let default_ms = if cfg!(debug_assertions) { 50 } else { 200 };
        let slow_sql_ms = slow_sql_ms
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(default_ms);
        Self {
            sql_tracing,
            slow_sql_ms,
        }
    }

    pub fn from_env() -> Self {
        let perf_sql = std::env::var(PERF_SQL_ENV).ok();
        let slow_ms = std::env::var(SLOW_SQL_MS_ENV).ok();
        Self::parse(perf_sql.as_deref(), slow_ms.as_deref())
    }
}

/// 进程级设置（首次访问时读取环境变量）
pub fn settings() -> PerfSettings {
    static SETTINGS: OnceLock<PerfSettings> = OnceLock::new();
    *SETTINGS.get_or_init(PerfSettings::from_env)
}

fn is_true(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

/// 压成单行并按字符截断（SQL 中可能含中文字面量）
fn truncate_sql(sql: &str, max_chars: usize) -> String {
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let head: String = flat.chars().take(max_chars).collect();
    format!("{}…", head)
}

// ==========================================
// SQLite 语句追踪
// ==========================================

/// 为连接安装 trace/profile 回调
pub fn install_sqlite_tracing(conn: &mut Connection) {
    if !settings().sql_tracing {
        // 复用连接时清理残留回调
        conn.trace(None);
        conn.profile(None);
        return;
    }

    conn.trace(Some(sql_trace_callback));
    conn.profile(Some(sql_profile_callback));
}

fn within_guard() -> bool {
    PERF_DEPTH.with(|d| d.get() > 0)
}

fn sql_trace_callback(_sql: &str) {
    if within_guard() {
        SQL_COUNT.with(|c| c.set(c.get().saturating_add(1)));
    }
}

fn sql_profile_callback(sql: &str, duration: Duration) {
    let threshold = settings().slow_sql_ms;
    let ms = duration.as_millis() as u64;
    if threshold == 0 || ms < threshold {
        return;
    }

    tracing::warn!(
        target: "slow_sql",
        duration_ms = ms,
        threshold_ms = threshold,
        sql = %truncate_sql(sql, SQL_LOG_MAX_CHARS),
        "慢 SQL"
    );
    if within_guard() {
        SLOW_SQL_COUNT.with(|c| c.set(c.get().saturating_add(1)));
    }
}

// ==========================================
// PerfGuard - API 调用耗时统计
// ==========================================

/// 作用域结束时记录 elapsed_ms / sql_count / slow_sql_count（target = "perf"）
///
/// ```ignore
/// let _perf = studio_scurve::perf::PerfGuard::for_project("project_curve", project_id);
/// ```
pub struct PerfGuard {
    op: &'static str,
    project_id: Option<String>,
    start: Instant,
    sql_start: u64,
    slow_sql_start: u64,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        PERF_DEPTH.with(|d| d.set(d.get().saturating_add(1)));
        Self {
            op,
            project_id: None,
            start: Instant::now(),
            sql_start: SQL_COUNT.with(|c| c.get()),
            slow_sql_start: SLOW_SQL_COUNT.with(|c| c.get()),
        }
    }

    /// 带项目上下文的统计
    pub fn for_project(op: &'static str, project_id: &str) -> Self {
        let mut guard = Self::new(op);
        guard.project_id = Some(project_id.to_string());
        guard
    }

    /// 当前作用域内已执行的 SQL 语句数
    pub fn sql_count(&self) -> u64 {
        SQL_COUNT
            .with(|c| c.get())
            .saturating_sub(self.sql_start)
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        let sql_count = self.sql_count();
        let slow_sql_count = SLOW_SQL_COUNT
            .with(|c| c.get())
            .saturating_sub(self.slow_sql_start);

        tracing::info!(
            target: "perf",
            op = self.op,
            project_id = self.project_id.as_deref().unwrap_or("-"),
            elapsed_ms,
            sql_count,
            slow_sql_count,
            "done"
        );

        PERF_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}
