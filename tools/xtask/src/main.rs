//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test，再检查表演定义
//! - `cov-runtime`: 运行 perform-runtime 覆盖率
//! - `defs-check`: 检查表演定义文件（JSON）

use std::path::{Path, PathBuf};
use std::process::Command;

use perform_runtime::{EffectDefinition, PerformConfig, ScreenGeometry, resolve};
use walkdir::WalkDir;

/// `check-all` 依次执行的 cargo 步骤
const GATE_STEPS: &[&[&str]] = &[
    &["fmt", "--all", "--", "--check"],
    &["clippy", "--workspace", "--all-targets"],
    &["test", "--workspace"],
];

/// 执行一条 cargo 命令，失败时带上完整命令行
fn cargo(args: &[&str]) -> anyhow::Result<()> {
    let line = format!("cargo {}", args.join(" "));
    eprintln!("\n==> {line}");
    let status = Command::new("cargo").args(args).status()?;
    anyhow::ensure!(status.success(), "{line} failed with {status}");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());

    match sub.as_str() {
        "check-all" => {
            for step in GATE_STEPS {
                cargo(step)?;
            }
            if Path::new(DEFAULT_DEFS_DIR).exists() {
                defs_check(None)?;
            }
        }
        "cov-runtime" => {
            let has_llvm_cov = Command::new("cargo")
                .args(["llvm-cov", "--version"])
                .output()
                .is_ok_and(|out| out.status.success());
            anyhow::ensure!(
                has_llvm_cov,
                "cargo llvm-cov 不可用，请先安装 cargo-llvm-cov 与 llvm-tools-preview"
            );

            cargo(&["llvm-cov", "-p", "perform-runtime", "--html"])?;
            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "defs-check" => {
            let path = args.next();
            defs_check(path.as_deref())?;
        }
        "help" | "-h" | "--help" => print_help(),
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 门禁检查，并检查默认目录下的表演定义
  cov-runtime     运行 perform-runtime 覆盖率报告
  defs-check      检查表演定义文件

DEFS-CHECK:
  cargo xtask defs-check [path]

  不带参数：检查 assets/performs/ 下所有 .json 文件
  带路径参数：检查指定文件或目录

  文件内容可以是单个定义、定义数组，或完整的表演配置。

  检查内容：
    - JSON 结构
    - 时长、阶段边界、锚点等参数是否有效
    - 表演名是否重复
    - 纹理文件是否存在（相对 workspace 根目录）

ALIASES (in .cargo/config.toml):
  cargo check-all     -> cargo xtask check-all
  cargo cov-runtime   -> cargo xtask cov-runtime
  cargo defs-check    -> cargo xtask defs-check
"#
    );
}

//=============================================================================
// defs-check 命令实现
//=============================================================================

/// 默认定义目录（相对于 workspace root）
const DEFAULT_DEFS_DIR: &str = "assets/performs";

/// 检查结果
#[derive(Default)]
struct DefsCheckResult {
    files_checked: usize,
    definitions_checked: usize,
    errors: Vec<String>,
    missing_textures: Vec<String>,
}

/// 执行定义检查
fn defs_check(path: Option<&str>) -> anyhow::Result<()> {
    let root = PathBuf::from(path.unwrap_or(DEFAULT_DEFS_DIR));
    if !root.exists() {
        anyhow::bail!(
            "路径不存在: {}\n请在 workspace 根目录运行，或指定定义路径",
            root.display()
        );
    }

    let files = collect_definition_files(&root);
    if files.is_empty() {
        eprintln!("未找到定义文件（.json）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个定义文件...\n", files.len());

    let mut result = DefsCheckResult::default();
    let mut seen = std::collections::HashMap::new();
    for file in &files {
        check_definition_file(file, &mut seen, &mut result);
    }

    print_check_result(&result);

    if !result.errors.is_empty() {
        anyhow::bail!("定义检查发现错误");
    }
    Ok(())
}

/// 收集目录下的所有 JSON 文件
fn collect_definition_files(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

/// 解析文件内容：单个定义、定义数组或完整配置
fn parse_definitions(content: &str) -> anyhow::Result<(Vec<EffectDefinition>, ScreenGeometry)> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    if value.is_array() {
        return Ok((serde_json::from_value(value)?, ScreenGeometry::default()));
    }
    if value.get("name").is_some() {
        return Ok((vec![serde_json::from_value(value)?], ScreenGeometry::default()));
    }
    let config: PerformConfig = serde_json::from_value(value)?;
    Ok((config.definitions, config.screen))
}

/// 检查单个定义文件
fn check_definition_file(
    file: &Path,
    seen: &mut std::collections::HashMap<String, PathBuf>,
    result: &mut DefsCheckResult,
) {
    let file_id = file.display().to_string();
    result.files_checked += 1;

    let content = match std::fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            result.errors.push(format!("{file_id}: 无法读取文件 - {e}"));
            return;
        }
    };

    let (defs, screen) = match parse_definitions(&content) {
        Ok(parsed) => parsed,
        Err(e) => {
            result.errors.push(format!("{file_id}: {e}"));
            return;
        }
    };

    for def in defs {
        result.definitions_checked += 1;

        if let Some(first) = seen.get(&def.name) {
            result.errors.push(format!(
                "{file_id}: 表演名 '{}' 与 {} 重复",
                def.name,
                first.display()
            ));
        } else {
            seen.insert(def.name.clone(), file.to_path_buf());
        }

        if let Err(e) = resolve(&def, &screen) {
            result.errors.push(format!("{file_id}: {e}"));
        }

        for layer in &def.layers {
            if !Path::new(&layer.texture).exists() {
                result
                    .missing_textures
                    .push(format!("{file_id}: [{}] {}", def.name, layer.texture));
            }
        }
    }
}

/// 输出检查结果
fn print_check_result(result: &DefsCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!(
        "检查完成: {} 个文件, {} 个定义",
        result.files_checked, result.definitions_checked
    );
    eprintln!();

    for e in &result.errors {
        eprintln!("[ERROR] {e}");
    }
    for m in &result.missing_textures {
        eprintln!("[WARN] 纹理不存在 {m}");
    }

    let error_count = result.errors.len();
    let warn_count = result.missing_textures.len();

    eprintln!();
    if error_count > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", error_count, warn_count);
    } else if warn_count > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", warn_count);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_definition() {
        let json = serde_json::to_string(&perform_runtime::builtin::en_sweat()).unwrap();
        let (defs, screen) = parse_definitions(&json).unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(screen, ScreenGeometry::default());
    }

    #[test]
    fn test_parse_config() {
        let (defs, screen) =
            parse_definitions(r#"{ "screen": { "width": 800, "height": 600 } }"#).unwrap();
        assert!(defs.is_empty());
        assert_eq!(screen, ScreenGeometry::new(800.0, 600.0));
    }

    #[test]
    fn test_check_reports_invalid_and_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let mut bad = perform_runtime::builtin::en_answer();
        bad.timeline.duration = Some(0.0);
        let defs = vec![perform_runtime::builtin::en_answer(), bad];
        std::fs::write(
            dir.path().join("performs.json"),
            serde_json::to_string(&defs).unwrap(),
        )
        .unwrap();

        let mut result = DefsCheckResult::default();
        let mut seen = std::collections::HashMap::new();
        for file in collect_definition_files(dir.path()) {
            check_definition_file(&file, &mut seen, &mut result);
        }

        assert_eq!(result.files_checked, 1);
        assert_eq!(result.definitions_checked, 2);
        // 一个重复名 + 一个无效时长
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn test_gate_steps() {
        let commands: Vec<&str> = GATE_STEPS.iter().map(|step| step[0]).collect();
        assert_eq!(commands, ["fmt", "clippy", "test"]);
        assert!(GATE_STEPS.iter().skip(1).all(|step| step.contains(&"--workspace")));
    }
}
