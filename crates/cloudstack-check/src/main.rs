mod report;

use anyhow::Context;
use clap::Parser;
use cloudstack_api::{ClientConfig, CloudStackClient};
use colored::Colorize;
use report::OutputFormat;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cloudstack-check")]
#[command(
    version,
    about = "CloudStack の認証情報を確認し、アカウントとユーザーを一覧表示",
    long_about = "CLOUDSTACK_API_URL / CLOUDSTACK_API_KEY / CLOUDSTACK_SECRET_KEY を使って \
    CloudStack API に接続し、listAccounts と listUsers を順に実行します。"
)]
struct Cli {
    /// 出力形式
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdoutは一覧の出力に使うので、ログはstderrに出力
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ClientConfig::from_env()?;
    let client = CloudStackClient::new(config)?;
    eprintln!("{} {}", "接続先:".bold(), client.api_url().as_str().cyan());

    eprintln!("{}", "アカウント一覧を取得中...".blue());
    let accounts = client
        .list_accounts()
        .await
        .context("listAccounts failed")?;
    report::write_accounts(&mut std::io::stdout().lock(), &accounts, cli.output)?;

    eprintln!("{}", "ユーザー一覧を取得中...".blue());
    let users = client.list_users().await.context("listUsers failed")?;
    report::write_users(&mut std::io::stdout().lock(), &users, cli.output)?;

    eprintln!(
        "{}",
        format!(
            "✓ アカウント {} 件、ユーザー {} 件",
            accounts.len(),
            users.len()
        )
        .green()
    );

    Ok(())
}
