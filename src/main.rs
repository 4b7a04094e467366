// ==========================================
// 商品目录后台 - 命令行入口
// ==========================================
// 职责: 解析命令行参数，调用 API 层，输出 JSON
// ==========================================

use anyhow::{Context, Result};
use catalog_admin::api::{
    ProductInput, ProductQuery, UploadedFile, VariantInput,
};
use catalog_admin::app::{get_default_db_path, AppState};
use catalog_admin::config::ImportConfigReader;
use catalog_admin::domain::{ProductPatch, ProductSource, VariantPatch};
use catalog_admin::importer::file_parser::content_type_for_path;
use catalog_admin::logging::{self, LogFormat};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "catalog-admin", version, about = "商品目录后台")]
struct Cli {
    /// 数据库文件路径
    #[arg(long, env = "CATALOG_DB_PATH")]
    db: Option<String>,

    /// 管理员会话令牌
    #[arg(long, env = "ADMIN_SESSION_TOKEN")]
    token: Option<String>,

    /// 会话签名密钥（未设置时不校验会话）
    #[arg(long, env = "ADMIN_SESSION_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// 日志格式
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    log_format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 初始化数据库结构
    #[command(name = "init-db")]
    InitDb,
    /// 导入 CSV / Excel 文件
    #[command(name = "import")]
    Import {
        file: PathBuf,
        /// 显式指定内容类型（默认按扩展名推断）
        #[arg(long)]
        content_type: Option<String>,
    },
    /// 上传批次历史
    #[command(name = "batches")]
    Batches {
        #[arg(long)]
        page: Option<i64>,
        #[arg(long)]
        limit: Option<i64>,
    },
    /// 查看单个批次
    #[command(name = "batch")]
    Batch { batch_id: String },
    /// 商品管理
    #[command(name = "products")]
    Products {
        #[command(subcommand)]
        command: ProductCommand,
    },
    /// 规格管理
    #[command(name = "variants")]
    Variants {
        #[command(subcommand)]
        command: VariantCommand,
    },
    /// 配置管理
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ProductCommand {
    #[command(name = "list")]
    List {
        #[arg(long)]
        page: Option<i64>,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        search: Option<String>,
        /// own | dropship
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
    #[command(name = "get")]
    Get { id: i64 },
    /// 从 JSON 文件新建商品
    #[command(name = "create")]
    Create { json: PathBuf },
    /// 以 JSON 文件中的字段更新商品
    #[command(name = "update")]
    Update { id: i64, json: PathBuf },
    #[command(name = "delete")]
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum VariantCommand {
    #[command(name = "get")]
    Get { id: i64 },
    #[command(name = "create")]
    Create { json: PathBuf },
    #[command(name = "update")]
    Update { id: i64, json: PathBuf },
    #[command(name = "delete")]
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    #[command(name = "get")]
    Get { key: String },
    #[command(name = "set")]
    Set { key: String, value: String },
    /// 输出全部 global 配置与导入生效值
    #[command(name = "show")]
    Show,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("无法读取文件: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("JSON 格式错误: {}", path.display()))
}

fn parse_source(raw: Option<String>) -> Result<Option<ProductSource>> {
    match raw {
        None => Ok(None),
        Some(s) => ProductSource::parse(&s)
            .map(Some)
            .ok_or_else(|| anyhow::anyhow!("unknown source: {}", s)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_with_format(match cli.log_format.as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    });

    let db_path = cli.db.clone().unwrap_or_else(get_default_db_path);
    tracing::info!(version = catalog_admin::VERSION, db_path = %db_path, "{}", catalog_admin::APP_NAME);

    let state = AppState::new(db_path, cli.secret.clone()).map_err(anyhow::Error::msg)?;

    if let Command::InitDb = cli.command {
        println!("schema ready: {}", state.get_db_path());
        return Ok(());
    }

    state.authorize(cli.token.as_deref())?;

    match cli.command {
        Command::InitDb => {}
        Command::Import { file, content_type } => {
            let content_type = match content_type {
                Some(ct) => ct,
                None => content_type_for_path(&file)
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
            };
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("无法读取文件: {}", file.display()))?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            let response = state
                .import_api
                .upload_products(Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes,
                }))
                .await?;
            print_json(&response)?;
        }
        Command::Batches { page, limit } => {
            print_json(&state.import_api.list_upload_batches(page, limit).await?)?;
        }
        Command::Batch { batch_id } => {
            print_json(&state.import_api.get_upload_batch(&batch_id).await?)?;
        }
        Command::Products { command } => match command {
            ProductCommand::List {
                page,
                limit,
                search,
                source,
                active,
            } => {
                let query = ProductQuery {
                    page,
                    limit,
                    search,
                    source: parse_source(source)?,
                    active,
                };
                print_json(&state.product_api.list_products(query).await?)?;
            }
            ProductCommand::Get { id } => print_json(&state.product_api.get_product(id)?)?,
            ProductCommand::Create { json } => {
                let input: ProductInput = read_json(&json)?;
                print_json(&state.product_api.create_product(input)?)?;
            }
            ProductCommand::Update { id, json } => {
                let patch: ProductPatch = read_json(&json)?;
                print_json(&state.product_api.update_product(id, patch)?)?;
            }
            ProductCommand::Delete { id } => {
                state.product_api.delete_product(id)?;
                print_json(&serde_json::json!({ "success": true }))?;
            }
        },
        Command::Variants { command } => match command {
            VariantCommand::Get { id } => print_json(&state.variant_api.get_variant(id)?)?,
            VariantCommand::Create { json } => {
                let input: VariantInput = read_json(&json)?;
                print_json(&state.variant_api.create_variant(input)?)?;
            }
            VariantCommand::Update { id, json } => {
                let patch: VariantPatch = read_json(&json)?;
                print_json(&state.variant_api.update_variant(id, patch)?)?;
            }
            VariantCommand::Delete { id } => {
                state.variant_api.delete_variant(id)?;
                print_json(&serde_json::json!({ "success": true }))?;
            }
        },
        Command::Config { command } => {
            let config = &state.config_manager;
            match command {
                ConfigCommand::Get { key } => {
                    print_json(&serde_json::json!({
                        "key": key,
                        "value": config.get_global_config_value(&key)?,
                    }))?;
                }
                ConfigCommand::Set { key, value } => {
                    config.set_global_config_value(&key, &value)?;
                    print_json(&serde_json::json!({ "key": key, "value": value }))?;
                }
                ConfigCommand::Show => {
                    print_json(&serde_json::json!({
                        "stored": config.get_config_snapshot()?,
                        "effective": {
                            "csvMode": config.get_csv_mode().await?.as_str(),
                            "uploadedBy": config.get_uploaded_by().await?,
                            "displayLimits": config.get_display_limits().await?,
                            "defaultPageSize": config.get_default_page_size().await?,
                        },
                    }))?;
                }
            }
        }
    }

    Ok(())
}
