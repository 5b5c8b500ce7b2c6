//! Non-interactive operator tool for provisioning tenants and users.

use std::collections::HashMap;
use std::env;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

use polycampus::{
    config::AppConfig,
    db,
    provisioning::{self, TenantRequest, UserRequest},
};

const USAGE: &str = "Usage:
  provision create-tenant --name <name> --schema <schema> --email <admin email>
                          --first <first name> --last <last name> --domain <domain>
                          [--quater <quater>] [--address <address line 1>]
                          (--password <password> | --generate-password)
  provision create-user   --email <email> --first <first name> --last <last name>
                          --schema <schema> --role <role>
                          (--password <password> | --generate-password)";

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut args = env::args().skip(1);
    let command = args.next();
    let result = match command.as_deref() {
        Some("create-tenant") => create_tenant(args.collect()),
        Some("create-user") => create_user(args.collect()),
        Some(cmd) => {
            eprintln!("Unknown command: {cmd}\n{USAGE}");
            return ExitCode::FAILURE;
        }
        None => {
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error occurred: {err}");
            eprintln!("No partial state was left behind; all changes were rolled back.");
            ExitCode::FAILURE
        }
    }
}

fn create_tenant(args: Vec<String>) -> Result<()> {
    let mut flags = parse_flags(&args)?;
    let (password, generated) = resolve_password(&mut flags)?;

    let request = TenantRequest {
        name: take_required(&mut flags, "name")?,
        schema_name: take_required(&mut flags, "schema")?,
        quater: flags.remove("quater"),
        address_line1: flags.remove("address"),
        email: take_required(&mut flags, "email")?,
        first_name: take_required(&mut flags, "first")?,
        last_name: take_required(&mut flags, "last")?,
        domain: take_required(&mut flags, "domain")?,
        password,
    };
    reject_unknown(&flags)?;

    let config = AppConfig::from_env()?;
    let pool = db::init_pool(&config.database_url)?;
    let mut conn = pool.get().context("failed to get database connection")?;

    let provisioned =
        provisioning::provision_tenant(&mut conn, &config.public_schema_name, request)?;

    if let Some(password) = generated {
        println!("Generated password: {password}");
    }
    println!(
        "Successfully created tenant \"{}\" (schema: {}, code: {}), admin \"{}\", and domain \"{}\" with role {}",
        provisioned.tenant.name,
        provisioned.tenant.schema_name,
        provisioned.tenant.organisation_code.as_deref().unwrap_or("-"),
        provisioned.admin.email,
        provisioned.domain.domain,
        provisioned.role,
    );
    Ok(())
}

fn create_user(args: Vec<String>) -> Result<()> {
    let mut flags = parse_flags(&args)?;
    let (password, generated) = resolve_password(&mut flags)?;

    let request = UserRequest {
        email: take_required(&mut flags, "email")?,
        first_name: take_required(&mut flags, "first")?,
        last_name: take_required(&mut flags, "last")?,
        schema_name: take_required(&mut flags, "schema")?,
        role: take_required(&mut flags, "role")?,
        password,
    };
    reject_unknown(&flags)?;

    let config = AppConfig::from_env()?;
    let pool = db::init_pool(&config.database_url)?;
    let mut conn = pool.get().context("failed to get database connection")?;

    let provisioned = provisioning::provision_user(&mut conn, request)?;

    if let Some(password) = generated {
        println!("Generated password: {password}");
    }
    println!(
        "Successfully created user \"{}\" for tenant \"{}\" with role \"{}\"",
        provisioned.user.email, provisioned.tenant.schema_name, provisioned.role,
    );
    Ok(())
}

fn parse_flags(args: &[String]) -> Result<HashMap<String, String>> {
    let mut flags = HashMap::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let Some(name) = arg.strip_prefix("--") else {
            bail!("unexpected argument {arg:?}\n{USAGE}");
        };
        if name == "generate-password" {
            flags.insert(name.to_string(), "true".to_string());
            continue;
        }
        let value = iter
            .next()
            .with_context(|| format!("missing value for --{name}"))?;
        flags.insert(name.to_string(), value.clone());
    }
    Ok(flags)
}

fn resolve_password(flags: &mut HashMap<String, String>) -> Result<(String, Option<String>)> {
    let generate = flags.remove("generate-password").is_some();
    let explicit = flags.remove("password");
    match (generate, explicit) {
        (true, None) => {
            let password = provisioning::generate_password(&mut rand::thread_rng());
            Ok((password.clone(), Some(password)))
        }
        (false, Some(password)) => Ok((password, None)),
        (true, Some(_)) => bail!("--password and --generate-password are mutually exclusive"),
        (false, None) => bail!("either --password or --generate-password is required"),
    }
}

fn take_required(flags: &mut HashMap<String, String>, name: &str) -> Result<String> {
    flags
        .remove(name)
        .with_context(|| format!("--{name} is required\n{USAGE}"))
}

fn reject_unknown(flags: &HashMap<String, String>) -> Result<()> {
    if let Some(name) = flags.keys().next() {
        bail!("unknown flag --{name}\n{USAGE}");
    }
    Ok(())
}
