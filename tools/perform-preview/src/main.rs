//! # Perform Preview
//!
//! 表演预览工具：不依赖渲染器，逐帧推进表演并输出每个子图层的透明度和位置。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p perform-preview -- list
//! cargo run -p perform-preview -- phases enBubbleOmit
//! cargo run -p perform-preview -- run enHmm --frames 100
//! cargo run -p perform-preview -- run enAnswer --delta 3 --format table
//! cargo run -p perform-preview -- --config perform.json run bgFlash
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use perform_runtime::{
    EffectDefinition, EffectHandle, PerformConfig, PerformStage, builtin, frames_to_seconds,
};
use serde::Serialize;
use tracing::{Level, debug};

#[derive(Parser)]
#[command(name = "perform-preview")]
#[command(about = "表演预览工具 - 无渲染逐帧采样表演的视觉状态")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件（JSON）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 输出日志（-v 为 info，-vv 为 debug，更多为 trace）
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// 列出全部已注册表演
    List,

    /// 输出表演的命名阶段边界
    Phases {
        /// 表演名
        effect: String,
    },

    /// 逐帧推进表演并输出采样
    Run {
        /// 表演名
        effect: String,

        /// 最多推进的帧数
        #[arg(short, long, default_value = "120")]
        frames: u32,

        /// 每帧的帧增量（1 = 1/60 秒）
        #[arg(short, long, default_value = "1.0")]
        delta: f32,

        /// 自定义 ticker key
        #[arg(short, long)]
        key: Option<String>,

        /// 输出格式
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// 每帧一行 JSON
    Json,
    /// 对齐的文本表格
    Table,
}

/// 单帧采样
#[derive(Debug, Serialize)]
struct FrameSample {
    frame: u32,
    elapsed: f32,
    active: bool,
    visible: bool,
    layers: Vec<LayerSample>,
}

#[derive(Debug, Serialize)]
struct LayerSample {
    opacity: f32,
    x: f32,
    y: f32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => PerformConfig::read(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?,
        None => PerformConfig::default(),
    };
    config.validate().context("配置无效")?;

    match cli.command {
        Commands::List => list(&config),
        Commands::Phases { effect } => phases(&config, &effect),
        Commands::Run {
            effect,
            frames,
            delta,
            key,
            format,
        } => run(&config, &effect, frames, delta, key, format),
    }
}

/// `-v` 次数对应的日志级别
fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// 日志输出到 stderr，stdout 只留给采样数据
fn init_logging(verbose: u8) {
    tracing_subscriber::fmt()
        .with_max_level(log_level(verbose))
        .with_writer(std::io::stderr)
        .init();
}

/// 配置中可用的全部定义（内置 + 额外）
fn definitions(config: &PerformConfig) -> Vec<EffectDefinition> {
    builtin::all()
        .into_iter()
        .filter(|def| !config.is_disabled(&def.name))
        .chain(config.definitions.iter().cloned())
        .collect()
}

fn list(config: &PerformConfig) -> anyhow::Result<()> {
    let stage = PerformStage::new(config)?;
    for name in stage.registry().names() {
        match stage.registry().definition(&name) {
            Some(perform) => println!(
                "{:<16} {:<36} {:>6.2}s  {} 图层  {}",
                name,
                perform.ticker_key,
                perform.total_duration,
                perform.layers.len(),
                perform.layer
            ),
            None => println!("{name}"),
        }
    }
    Ok(())
}

fn phases(config: &PerformConfig, effect: &str) -> anyhow::Result<()> {
    let def = definitions(config)
        .into_iter()
        .find(|def| def.name == effect)
        .with_context(|| format!("未知表演: {effect}"))?;

    for boundary in def.boundaries() {
        println!("{:>6.3}s  {}", boundary.at, boundary.name);
    }
    Ok(())
}

fn run(
    config: &PerformConfig,
    effect: &str,
    frames: u32,
    delta: f32,
    key: Option<String>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if !(delta.is_finite() && delta > 0.0) {
        anyhow::bail!("帧增量必须为正: {delta}");
    }

    let mut stage = PerformStage::new(config)?;
    let handle = match key {
        Some(key) => stage.perform_with_key(effect, key)?,
        None => stage.perform(effect)?,
    };
    debug!(effect = %effect, key = %handle.registry_key, "开始预览");

    if matches!(format, OutputFormat::Table) {
        print_table_header(&handle);
    }

    let mut elapsed = 0.0f32;
    for frame in 0..=frames {
        if frame > 0 {
            stage.update(delta);
            elapsed += frames_to_seconds(delta);
        }

        let active = stage.is_active(&handle.registry_key);
        let sample = sample(frame, elapsed, active, &handle);
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string(&sample)?),
            OutputFormat::Table => print_table_row(&sample),
        }

        if !active {
            break;
        }
    }
    Ok(())
}

fn sample(frame: u32, elapsed: f32, active: bool, handle: &EffectHandle) -> FrameSample {
    let container = handle.container.borrow();
    let layers = container
        .children
        .iter()
        .map(|node| {
            let node = node.borrow();
            LayerSample {
                opacity: node.opacity,
                x: node.position.x,
                y: node.position.y,
            }
        })
        .collect();

    FrameSample {
        frame,
        elapsed,
        active,
        visible: container.visible,
        layers,
    }
}

fn print_table_header(handle: &EffectHandle) {
    let count = handle.container.borrow().children.len();
    let mut header = format!("{:>5} {:>7}", "frame", "t");
    for i in 0..count {
        header.push_str(&format!(" | {:>5} {:>8} {:>8}", format!("a{i}"), "x", "y"));
    }
    println!("{header}");
}

fn print_table_row(sample: &FrameSample) {
    let mut row = format!("{:>5} {:>7.3}", sample.frame, sample.elapsed);
    for layer in &sample.layers {
        row.push_str(&format!(
            " | {:>5.2} {:>8.1} {:>8.1}",
            layer.opacity, layer.x, layer.y
        ));
    }
    if !sample.active {
        row.push_str("  (done)");
    }
    println!("{row}");
}
