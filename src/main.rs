use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;

mod api;
mod config;
mod content;
mod error;
mod repository;
mod state;

use config::{AppConfig, DEFAULT_CONFIG_FILE};
use content::excerpt;

#[derive(Parser)]
#[command(name = "pasci", about = "PASCI API 新闻服务", version)]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// 启动 HTTP 服务
    Serve {
        /// 监听地址
        #[arg(long)]
        host: Option<String>,

        /// 监听端口
        #[arg(long)]
        port: Option<u16>,
    },

    /// 为文件或标准输入中的正文生成摘要
    Excerpt {
        /// 输入文件（省略时读取标准输入）
        file: Option<PathBuf>,

        /// 摘要最大长度（默认取配置）
        #[arg(long)]
        max_length: Option<usize>,

        /// 断点最小位置（默认取配置）
        #[arg(long)]
        min_length: Option<usize>,

        /// 按 HTML 处理，优先使用第一个段落（断点下限固定为默认值）
        #[arg(long, conflicts_with = "min_length")]
        html: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // None 等同于 Serve { host: None, port: None }
    let command = cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
    });

    let app_config = AppConfig::load(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&app_config.server.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| app_config.server.host.clone());
            let port = port.unwrap_or(app_config.server.port);

            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?
                .block_on(async move { run_server(app_config, &host, port).await })?;
        }
        Commands::Excerpt {
            file,
            max_length,
            min_length,
            html,
        } => {
            let input = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .map_err(|e| anyhow::anyhow!("读取 {} 失败：{}", path.display(), e))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };

            let options = content::ExcerptOptions {
                max_length: max_length.unwrap_or(app_config.excerpt.max_length),
                min_length: min_length.unwrap_or(app_config.excerpt.min_length),
                preserve_paragraphs: false,
            };
            if options.max_length == 0 {
                anyhow::bail!("--max-length 必须大于 0");
            }

            let output = if html {
                excerpt::generate_excerpt_from_html(&input, options.max_length, true)
            } else {
                excerpt::generate_excerpt(&input, &options)
            };
            println!("{output}");
        }
    }

    Ok(())
}

async fn run_server(app_config: AppConfig, host: &str, port: u16) -> anyhow::Result<()> {
    let app_state = state::AppState::new(app_config).await?;
    let app = api::router(app_state);

    let addr = format!("{host}:{port}");
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            tracing::error!("端口 {port} 已被占用");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!("服务启动：http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("服务已停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("监听退出信号失败：{e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_html_conflicts_with_min_length() {
        let err = Cli::try_parse_from(["pasci", "excerpt", "--html", "--min-length", "5"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);

        assert!(Cli::try_parse_from(["pasci", "excerpt", "--html", "--max-length", "80"]).is_ok());
        assert!(Cli::try_parse_from(["pasci", "excerpt", "--min-length", "5"]).is_ok());
    }
}
