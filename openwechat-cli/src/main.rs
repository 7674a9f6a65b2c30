//! `openwechat`: call WeChat Pay and Open Platform APIs from the command line.
//!
//! Credentials come from a TOML file (see [`openwechat::config`]); responses
//! are printed as JSON on stdout, logs go to stderr.

#![allow(clippy::multiple_crate_versions, reason = "transitive dependencies from reqwest")]

mod cli;
mod observability;

use std::{
    fs,
    io::{self, Write},
    path::Path,
    process::ExitCode,
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::Parser;
use openwechat::{
    Client, ClientConfig,
    endpoints::{
        oauth::{AccessToken, AccessTokenRequest, UserInfo, UserInfoRequest, web_authorize_url},
        pay::{BillType, DownloadBill, DownloadBillRequest, TAR_TYPE_GZIP},
        supported_apis,
    },
    transport::HttpTransport,
};
use serde_json::Value;
use tracing::info;

use crate::{
    cli::{Cli, Command, DownloadBillArgs},
    observability::{CheckStatus, ConfigReport, LogFormat, init_observability},
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_observability(LogFormat::from_env());
    let Cli { config, command } = Cli::parse();

    match command {
        Command::Apis => {
            for api in supported_apis() {
                println!("{:<24} {:<4} {:?} {}", api.name, api.method.as_str(), api.auth, api.url);
            }
        }
        Command::AuthorizeUrl(args) => {
            println!("{}", web_authorize_url(&args.app_id, &args.scope, &args.redirect_uri));
        }
        Command::Check => {
            let report = ConfigReport::from_config(&load_config(&config)?);
            println!("{}", report.to_json()?);
            if report.status == CheckStatus::Unusable {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::DownloadBill(args) => {
            let client = connect(&config, &args.app_id)?;
            download_bill(&client, args).await?;
        }
        Command::AccessToken(args) => {
            let client = connect(&config, &args.app_id)?;
            let mut call = client.call::<AccessToken>();
            call.set_app_id(args.app_id)?.set_request(AccessTokenRequest::new(args.code))?;
            let token = call.run().await?;
            print_json(&serde_json::to_value(token)?)?;
        }
        Command::UserInfo(args) => {
            let client = connect(&config, &args.app_id)?;
            let request = UserInfoRequest {
                access_token: args.access_token,
                openid: args.openid,
                lang: args.lang,
            };
            let mut call = client.call::<UserInfo>();
            call.set_app_id(args.app_id)?.set_request(request)?;
            let profile = call.run().await?;
            print_json(&serde_json::to_value(profile)?)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn load_config(path: &Path) -> Result<ClientConfig> {
    ClientConfig::from_file(path).with_context(|| format!("failed to load {}", path.display()))
}

/// Builds a client whose transport presents `app_id`'s certificate, if any.
fn connect(path: &Path, app_id: &str) -> Result<Client<HttpTransport>> {
    let config = load_config(path)?;
    let http = config.http.clone();
    let store = Arc::new(config.into_store()?);

    let transport = match store.lookup(app_id).certificate {
        Some(pem) => HttpTransport::with_identity(&http, &pem)
            .with_context(|| format!("invalid client certificate for {app_id}"))?,
        None => HttpTransport::with_config(&http)?,
    };
    info!(app_id, store_size = store.len(), "client ready");

    Ok(Client::new(store, transport))
}

async fn download_bill(client: &Client<HttpTransport>, args: DownloadBillArgs) -> Result<()> {
    let bill_type = args.bill_type.as_deref().map(str::parse::<BillType>).transpose()?;
    let request = DownloadBillRequest {
        mch_id: args.mch_id,
        bill_date: args.bill_date,
        bill_type,
        tar_type: if args.gzip { TAR_TYPE_GZIP.to_owned() } else { String::new() },
        ..Default::default()
    };

    let mut call = client.call::<DownloadBill>();
    call.set_app_id(args.app_id)?.set_request(request)?;
    let reply = call.run_opaque().await?;

    if reply.status.is_error() {
        print_json(&serde_json::to_value(&reply.status)?)?;
        anyhow::bail!("bill download refused: {}", reply.status.return_msg);
    }

    match args.output {
        Some(path) => {
            fs::write(&path, &reply.data)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), bytes = reply.data.len(), "bill saved");
        }
        None => io::stdout().write_all(&reply.data).context("failed to write bill to stdout")?,
    }
    Ok(())
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
