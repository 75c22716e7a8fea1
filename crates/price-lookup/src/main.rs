//! price-lookup: Browse Aspel installations and look up product prices.
//!
//! Usage:
//!   cargo run -p price-lookup -- systems
//!   cargo run -p price-lookup -- versions SAE
//!   cargo run -p price-lookup -- companies SAE "C:\...\Sistemas Aspel\SAE90"
//!   cargo run -p price-lookup -- lookup SAE --company "...\Empresas\Empresa01" --code A1 --with-tax
//!
//! Firebird credentials and the installation root come from the environment
//! (see `.env.example`).

use anyhow::{anyhow, bail, Context};
use firebird_client::FirebirdConnectionProvider;
use installation_discovery::{InstallationDiscoveryCache, COMPANIES_FOLDER};
use pricing_core::{Company, PricingConfig, ProductQuery, SystemVariant};
use product_resolver::ProductResolver;
use std::path::{Path, PathBuf};

const USAGE: &str = "usage: price-lookup <systems | versions <VARIANT> | companies <VARIANT> <VERSION_PATH> | \
lookup <VARIANT> --company <PATH> [--version <PATH>] [--suffix NN] --code <CODE> [--with-tax]>";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Systems,
    Versions(SystemVariant),
    Companies(SystemVariant, PathBuf),
    Lookup(ProductQuery),
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn variant_arg(args: &[String]) -> anyhow::Result<SystemVariant> {
    let code = args.get(1).ok_or_else(|| anyhow!("missing system variant\n{}", USAGE))?;
    Ok(code.parse()?)
}

/// The version folder holding `company`: its parent, skipping an `Empresas` level.
fn version_of(company: &Path) -> PathBuf {
    let Some(parent) = company.parent() else {
        return PathBuf::new();
    };
    let is_companies_folder = parent
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.eq_ignore_ascii_case(COMPANIES_FOLDER));
    match parent.parent() {
        Some(version) if is_companies_folder => version.to_path_buf(),
        _ => parent.to_path_buf(),
    }
}

fn parse_command(args: &[String]) -> anyhow::Result<Command> {
    match args.first().map(|s| s.as_str()) {
        Some("systems") => Ok(Command::Systems),
        Some("versions") => Ok(Command::Versions(variant_arg(args)?)),
        Some("companies") => {
            let variant = variant_arg(args)?;
            let version = args
                .get(2)
                .ok_or_else(|| anyhow!("missing version path\n{}", USAGE))?;
            Ok(Command::Companies(variant, PathBuf::from(version)))
        }
        Some("lookup") => {
            let system_variant = variant_arg(args)?;
            let company_path = PathBuf::from(
                flag_value(args, "--company").ok_or_else(|| anyhow!("missing --company\n{}", USAGE))?,
            );
            let product_code = flag_value(args, "--code")
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .ok_or_else(|| anyhow!("missing --code\n{}", USAGE))?
                .to_string();
            let version_path = flag_value(args, "--version")
                .map(PathBuf::from)
                .unwrap_or_else(|| version_of(&company_path));
            let table_suffix = match flag_value(args, "--suffix") {
                Some(suffix) => suffix.to_string(),
                None => {
                    let folder = company_path
                        .file_name()
                        .map(|name| name.to_string_lossy())
                        .unwrap_or_default();
                    Company::table_suffix_for(&folder)
                }
            };

            Ok(Command::Lookup(ProductQuery {
                system_variant,
                version_path,
                company_path,
                table_suffix,
                product_code,
                include_tax: args.iter().any(|a| a == "--with-tax"),
            }))
        }
        Some(other) => bail!("unknown command '{}'\n{}", other, USAGE),
        None => bail!("{}", USAGE),
    }
}

fn init_logging() {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "price_lookup=info,product_resolver=info,installation_discovery=info".into()
        })
    };

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    }

    // Panic hook: log panic info before crashing
    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        tracing::error!("PANIC: {info}");
    }));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_command(&args)?;
    let config = PricingConfig::from_env()?;
    tracing::debug!("Configuration: {:?}", config);

    match command {
        Command::Systems => {
            let codes: Vec<&str> = SystemVariant::all().iter().map(|v| v.code()).collect();
            println!("{}", serde_json::to_string_pretty(&codes)?);
        }
        Command::Versions(variant) => {
            let discovery = InstallationDiscoveryCache::new(&config.discovery);
            let versions = discovery.list_versions(variant);
            tracing::info!(
                "Found {} {} versions under {}",
                versions.len(),
                variant,
                discovery.base_path().display()
            );
            println!("{}", serde_json::to_string_pretty(versions.as_ref())?);
        }
        Command::Companies(variant, version_path) => {
            let discovery = InstallationDiscoveryCache::new(&config.discovery);
            let companies = discovery.list_companies(variant, &version_path);
            tracing::info!(
                "Found {} companies in {}",
                companies.len(),
                version_path.display()
            );
            println!("{}", serde_json::to_string_pretty(companies.as_ref())?);
        }
        Command::Lookup(query) => {
            let resolver = ProductResolver::new(FirebirdConnectionProvider::new(&config.connection));
            let code = query.product_code.clone();

            let product = tokio::task::spawn_blocking(move || resolver.resolve(&query))
                .await
                .context("lookup task failed")?;

            match product {
                Some(product) => println!("{}", serde_json::to_string_pretty(&product)?),
                None => bail!("product not found: {}", code),
            }
        }
    }

    Ok(())
}
