// ==========================================
// 工厂运营追溯核心 - 命令行入口
// ==========================================
// 用法:
//   factory-trace [--db <path>] init
//   factory-trace [--db <path>] timeline <identifier> [--csv]
//   factory-trace [--db <path>] checkpoints <identifier>
//   factory-trace [--db <path>] downtime <location> <from> <to> [--csv] [--summary]
//
// 时间参数: RFC3339（带时区）或 "YYYY-MM-DD HH:MM:SS"（按工厂本地时间解释）
// 报表写 stdout（JSON 或 CSV），日志写 stderr
// ==========================================

use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use factory_trace::api::{DowntimeApi, TraceabilityApi};
use factory_trace::config::{ConfigManager, TraceConfig};
use factory_trace::db::{get_default_db_path, init_schema, open_sqlite_connection, ConnectionManager};
use factory_trace::export;
use factory_trace::logging;
use factory_trace::repository::{
    EventSource, SqliteEventSource, DOWNTIME_DESTINATION, TRACEABILITY_DESTINATION,
};

const USAGE: &str = "用法:
  factory-trace [--db <path>] init
  factory-trace [--db <path>] timeline <identifier> [--csv]
  factory-trace [--db <path>] checkpoints <identifier>
  factory-trace [--db <path>] downtime <location> <from> <to> [--csv] [--summary]";

struct CliArgs {
    db_path: String,
    command: String,
    positional: Vec<String>,
    csv: bool,
    summary: bool,
}

fn parse_args() -> anyhow::Result<CliArgs> {
    let mut db_path = None;
    let mut csv = false;
    let mut summary = false;
    let mut rest = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => db_path = Some(args.next().context("--db 缺少路径参数")?),
            "--csv" => csv = true,
            "--summary" => summary = true,
            "-h" | "--help" => bail!("{}", USAGE),
            _ => rest.push(arg),
        }
    }

    if rest.is_empty() {
        bail!("缺少子命令\n{}", USAGE);
    }
    let command = rest.remove(0);

    Ok(CliArgs {
        db_path: db_path.unwrap_or_else(get_default_db_path),
        command,
        positional: rest,
        csv,
        summary,
    })
}

fn load_config(db_path: &str) -> anyhow::Result<TraceConfig> {
    let manager = ConfigManager::new(db_path).map_err(|e| anyhow!("无法打开配置: {}", e))?;
    manager
        .load_trace_config()
        .map_err(|e| anyhow!("配置加载失败: {}", e))
}

fn positional<'a>(args: &'a CliArgs, idx: usize, name: &str) -> anyhow::Result<&'a str> {
    args.positional
        .get(idx)
        .map(String::as_str)
        .with_context(|| format!("缺少参数 <{}>\n{}", name, USAGE))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let args = parse_args()?;

    tracing::info!("{} v{}", factory_trace::APP_NAME, factory_trace::VERSION);
    tracing::info!("使用数据库: {}", args.db_path);

    // 建表（幂等）
    {
        let conn = open_sqlite_connection(&args.db_path)
            .with_context(|| format!("无法打开数据库: {}", args.db_path))?;
        init_schema(&conn).context("初始化表结构失败")?;
    }
    if args.command == "init" {
        println!("{}", args.db_path);
        return Ok(());
    }

    let config = load_config(&args.db_path)?;
    let clock = config.plant_clock().map_err(|e| anyhow!("{}", e))?;

    let manager = Arc::new(ConnectionManager::single(
        &[TRACEABILITY_DESTINATION, DOWNTIME_DESTINATION],
        &args.db_path,
        config.pool_idle_timeout(),
    ));
    let source: Arc<dyn EventSource> = Arc::new(SqliteEventSource::new(manager, clock));

    let stdout = std::io::stdout();
    match args.command.as_str() {
        "timeline" => {
            let identifier = positional(&args, 0, "identifier")?;
            let api = TraceabilityApi::new(source, clock, config.checkpoint_catalog);
            let report = api.get_unit_timeline(identifier).await?;
            if args.csv {
                export::write_timeline_csv(&report, stdout.lock())?;
            } else {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        "checkpoints" => {
            let identifier = positional(&args, 0, "identifier")?;
            let api = TraceabilityApi::new(source, clock, config.checkpoint_catalog);
            let unit = api.resolve_unit(identifier).await?;
            let status = api.checkpoint_status(&unit).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        "downtime" => {
            let location = positional(&args, 0, "location")?;
            let from = positional(&args, 1, "from")?;
            let to = positional(&args, 2, "to")?;
            let from = clock
                .parse(from)
                .with_context(|| format!("无法解析 from: {}", from))?;
            let to = clock
                .parse(to)
                .with_context(|| format!("无法解析 to: {}", to))?;

            let api = DowntimeApi::new(source, clock);
            let report = api.attribute_downtime(location, from, to).await?;
            match (args.csv, args.summary) {
                (true, true) => export::write_downtime_summary_csv(&report, stdout.lock())?,
                (true, false) => export::write_downtime_detail_csv(&report, stdout.lock())?,
                (false, _) => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
        other => bail!("未知子命令: {}\n{}", other, USAGE),
    }

    Ok(())
}
