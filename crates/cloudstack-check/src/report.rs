use clap::ValueEnum;
use cloudstack_api::{Account, User};
use std::io::{self, Write};

/// 出力形式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// 1行1件のテキスト
    #[default]
    Text,
    /// 1行1件の JSON
    Json,
}

/// アカウントを API の返却順に1行ずつ出力
pub fn write_accounts<W: Write>(
    out: &mut W,
    accounts: &[Account],
    format: OutputFormat,
) -> io::Result<()> {
    for account in accounts {
        match format {
            OutputFormat::Text => {
                writeln!(out, "Account: {} (ID: {})", account.name, account.id)?;
            }
            OutputFormat::Json => {
                serde_json::to_writer(&mut *out, account)?;
                writeln!(out)?;
            }
        }
    }
    out.flush()
}

/// ユーザーを API の返却順に1行ずつ出力
pub fn write_users<W: Write>(out: &mut W, users: &[User], format: OutputFormat) -> io::Result<()> {
    for user in users {
        match format {
            OutputFormat::Text => {
                writeln!(
                    out,
                    "User: {} (ID: {}, Account: {})",
                    user.username, user.id, user.account
                )?;
            }
            OutputFormat::Json => {
                serde_json::to_writer(&mut *out, user)?;
                writeln!(out)?;
            }
        }
    }
    out.flush()
}
