//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use openwechat::endpoints::oauth::SCOPE_BASE;

/// Call WeChat Pay and Open Platform APIs from the command line.
#[derive(Parser, Debug)]
#[command(name = "openwechat", version, propagate_version = true)]
pub struct Cli {
    /// Path to the client configuration file (TOML).
    #[arg(long, short = 'c', env = "OPENWECHAT_CONFIG", default_value = "openwechat.toml")]
    pub config: PathBuf,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the bundled endpoints.
    Apis,
    /// Print the web authorization link for an application.
    AuthorizeUrl(AuthorizeUrlArgs),
    /// Load the configuration and report problems without calling any API.
    Check,
    /// Download a merchant bill.
    DownloadBill(DownloadBillArgs),
    /// Exchange an authorization code for an access token.
    AccessToken(AccessTokenArgs),
    /// Read the profile of an authorized user.
    UserInfo(UserInfoArgs),
}

/// Arguments for `authorize-url`.
#[derive(Parser, Debug)]
pub struct AuthorizeUrlArgs {
    /// Application id.
    #[arg(long, env = "OPENWECHAT_APP_ID")]
    pub app_id: String,

    /// Requested scope.
    #[arg(long, default_value = SCOPE_BASE)]
    pub scope: String,

    /// Where the provider sends the user back with `code`.
    #[arg(long)]
    pub redirect_uri: String,
}

/// Arguments for `download-bill`.
#[derive(Parser, Debug)]
pub struct DownloadBillArgs {
    /// Application id.
    #[arg(long, env = "OPENWECHAT_APP_ID")]
    pub app_id: String,

    /// Merchant id.
    #[arg(long, env = "OPENWECHAT_MCH_ID")]
    pub mch_id: String,

    /// Bill date, `YYYYMMDD`.
    #[arg(long)]
    pub bill_date: String,

    /// `ALL`, `SUCCESS`, `REFUND` or `RECHARGE_REFUND`.
    #[arg(long)]
    pub bill_type: Option<String>,

    /// Request a gzip archive instead of plain text.
    #[arg(long)]
    pub gzip: bool,

    /// Write the bill here instead of standard output.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Arguments for `access-token`.
#[derive(Parser, Debug)]
pub struct AccessTokenArgs {
    /// Application id.
    #[arg(long, env = "OPENWECHAT_APP_ID")]
    pub app_id: String,

    /// Code from the authorization redirect.
    #[arg(long)]
    pub code: String,
}

/// Arguments for `user-info`.
#[derive(Parser, Debug)]
pub struct UserInfoArgs {
    /// Application id.
    #[arg(long, env = "OPENWECHAT_APP_ID")]
    pub app_id: String,

    /// Web access token.
    #[arg(long)]
    pub access_token: String,

    /// User id.
    #[arg(long)]
    pub openid: String,

    /// Profile language.
    #[arg(long, default_value = "")]
    pub lang: String,
}
