//! # petctl
//!
//! 宠物资源检查工具。
//!
//! ## 用法
//!
//! ```bash
//! # 检查 pets/hiyori 的配置与模型资源
//! cargo run -p pet-host -- validate hiyori
//! cargo run -p pet-host -- validate hiyori --root pets --folder live2d --model hiyori.model3.json
//!
//! # 从打包的 ZIP 检查
//! cargo run -p pet-host -- validate hiyori --zip pets.zip
//!
//! # 列出触摸区域与反应
//! cargo run -p pet-host -- regions hiyori
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use pet_host::resources::path::{audio_path, join_logical, model_home, pet_config_path};
use pet_host::{AssetProvider, FsSource, RuntimeOptions, SourceProvider, ZipSource};
use pet_runtime::{ModelSettings, PetConfig};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "petctl")]
#[command(about = "宠物资源检查工具")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 宠物根目录（默认读取选项文件中的 pets_root）
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// 从 ZIP 读取宠物资源
    #[arg(short, long, global = true)]
    zip: Option<PathBuf>,

    /// 选项文件
    #[arg(long, default_value = "pet_host.json", global = true)]
    options: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// 检查宠物配置与模型资源是否完整
    Validate {
        /// 宠物目录（相对宠物根目录）
        pet_dir: String,

        /// 模型所在子目录
        #[arg(short, long, default_value = "live2d")]
        folder: String,

        /// 模型设定文件名（默认：<宠物目录名>.model3.json）
        #[arg(short, long)]
        model: Option<String>,
    },

    /// 列出触摸区域与反应
    Regions {
        /// 宠物目录（相对宠物根目录）
        pet_dir: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("❌ 无法创建异步运行时: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cli)) {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let options = RuntimeOptions::load(&cli.options);
    options.validate()?;

    let provider = match (&cli.zip, &options.zip_path) {
        (Some(zip), _) => SourceProvider::new(ZipSource::new(zip)),
        (None, Some(zip)) if options.asset_source == pet_host::AssetSourceType::Zip => {
            SourceProvider::new(ZipSource::new(zip))
        }
        _ => {
            let root = cli.root.clone().unwrap_or_else(|| options.pets_root.clone());
            SourceProvider::new(FsSource::new(root))
        }
    };
    debug!(provider = ?provider, "资源来源");

    match cli.command {
        Commands::Validate {
            pet_dir,
            folder,
            model,
        } => {
            let model = model.unwrap_or_else(|| default_model_name(&pet_dir));
            validate(&provider, &pet_dir, &folder, &model).await
        }
        Commands::Regions { pet_dir } => regions(&provider, &pet_dir).await,
    }
}

/// 默认模型设定文件名：`<宠物目录名>.model3.json`
fn default_model_name(pet_dir: &str) -> String {
    let name = pet_dir
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(pet_dir);
    format!("{}.model3.json", name)
}

async fn read_config(provider: &SourceProvider, pet_dir: &str) -> Result<PetConfig> {
    let path = pet_config_path(pet_dir);
    let bytes = provider
        .read_bytes(&path)
        .await
        .with_context(|| format!("读取宠物配置失败: {}", path))?;
    PetConfig::from_bytes(&bytes).with_context(|| format!("解析宠物配置失败: {}", path))
}

async fn validate(
    provider: &SourceProvider,
    pet_dir: &str,
    folder: &str,
    model: &str,
) -> Result<()> {
    println!("🔍 检查宠物: {}", pet_dir);

    let config = read_config(provider, pet_dir).await?;
    let mut problems: Vec<String> = config
        .validate()
        .into_iter()
        .map(|warning| warning.to_string())
        .collect();

    let home = model_home(pet_dir, folder);
    let settings_path = join_logical(&home, model);
    let bytes = provider
        .read_bytes(&settings_path)
        .await
        .with_context(|| format!("读取模型设定失败: {}", settings_path))?;
    let settings = ModelSettings::from_bytes(&bytes)
        .with_context(|| format!("解析模型设定失败: {}", settings_path))?;
    problems.extend(settings.validate().into_iter().map(|w| w.to_string()));

    // 配置引用的表情必须在模型设定中声明
    let declared: HashSet<&str> = settings
        .expressions()
        .iter()
        .map(|expression| expression.name.as_str())
        .collect();
    for name in config.referenced_expressions() {
        if !declared.contains(name) {
            problems.push(format!("表情未在模型设定中声明: {}", name));
        }
    }

    let source = provider.source();
    for name in config.referenced_audio() {
        let path = audio_path(pet_dir, name);
        if !source.exists(&path) {
            problems.push(format!("音频不存在: {}", path));
        }
    }

    let mut files = vec![settings.model_file_name().to_string()];
    files.extend(settings.textures().map(|(_, file)| file.to_string()));
    files.extend(settings.expressions().iter().map(|e| e.file.clone()));
    files.extend(
        settings
            .motion_groups()
            .flat_map(|(_, motions)| motions.iter().map(|m| m.file.clone())),
    );
    files.extend(
        [
            settings.physics_file_name(),
            settings.pose_file_name(),
            settings.user_data_file_name(),
        ]
        .into_iter()
        .flatten()
        .map(str::to_string),
    );
    for file in &files {
        let path = join_logical(&home, file);
        if !source.exists(&path) {
            problems.push(format!("模型文件不存在: {}", path));
        }
    }
    info!(files = files.len(), "模型文件检查完成");

    println!("   表情: {}", declared.len());
    println!("   触摸区域: {}", config.touch_list.len());
    println!("   模型文件: {}", files.len());

    if problems.is_empty() {
        println!("✅ 检查通过");
        return Ok(());
    }

    println!();
    for problem in &problems {
        println!("  ⚠ {}", problem);
    }
    bail!("发现 {} 个问题", problems.len())
}

async fn regions(provider: &SourceProvider, pet_dir: &str) -> Result<()> {
    let config = read_config(provider, pet_dir).await?;

    println!("📋 默认表情: {}", config.default_expression);
    for region in &config.touch_list {
        println!(
            "  [{}] {} ({} 个反应)",
            region.drawable_id,
            region.drawable_name,
            region.relationship.len()
        );
        for entry in &region.relationship {
            let audio = entry.audio_name.as_deref().unwrap_or("-");
            let text = entry.caption().unwrap_or("");
            println!(
                "      {} | 音频: {} | 延迟: {}ms | {}",
                entry.expression_name, audio, entry.delayed_ms, text
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model_name() {
        assert_eq!(default_model_name("hiyori"), "hiyori.model3.json");
        assert_eq!(default_model_name("pets/mark/"), "mark.model3.json");
    }

    #[test]
    fn test_cli_parses_validate() {
        let cli = Cli::try_parse_from(["petctl", "validate", "hiyori", "--folder", "model"])
            .expect("parse");
        match cli.command {
            Commands::Validate { pet_dir, folder, model } => {
                assert_eq!(pet_dir, "hiyori");
                assert_eq!(folder, "model");
                assert!(model.is_none());
            }
            Commands::Regions { .. } => panic!("wrong subcommand"),
        }
    }
}
