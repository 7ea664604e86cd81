use clap::Parser;
use reqwest::Client;

use datawave_cli::adapters::http::{build_client, load_identity, resolve_base_url, Service};
use datawave_cli::adapters::kubernetes::KubePods;
use datawave_cli::config::{
    AccumuloArgs, AuthorizationArgs, Cli, Command, ConnectionOpts, DictionaryArgs, IngestArgs,
    QueryArgs,
};
use datawave_cli::core::ingest::IngestOutcome;
use datawave_cli::core::query::QueryParams;
use datawave_cli::core::{accumulo, authorization, dictionary, ingest, query};
use datawave_cli::utils::logger;
use datawave_cli::utils::validation::Validate;
use datawave_cli::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.log_level());

    if let Err(e) = run(cli).await {
        tracing::error!("{}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Accumulo(args) => run_accumulo(args).await,
        Command::Authorization(args) => run_authorization(args).await,
        Command::Dictionary(args) => run_dictionary(args).await,
        Command::Ingest(args) => run_ingest(args).await,
        Command::Query(args) => run_query(args).await,
    }
}

fn http_client(conn: &ConnectionOpts) -> Result<Client> {
    let identity = load_identity(&conn.cert, conn.key.as_deref())?;
    build_client(Some(identity), &conn.headers)
}

async fn run_accumulo(args: AccumuloArgs) -> Result<()> {
    args.validate()?;
    let client = http_client(&args.conn)?;
    let base_url = resolve_base_url(Service::Datawave, &args.conn).await?;

    if args.view {
        let status = accumulo::view_cache(&client, &base_url).await?;
        tracing::info!("{}", status);
    } else {
        accumulo::reload_cache(&client, &base_url).await?;
    }
    Ok(())
}

async fn run_authorization(args: AuthorizationArgs) -> Result<()> {
    args.validate()?;
    let client = http_client(&args.conn)?;
    let base_url = resolve_base_url(Service::Authorization, &args.conn).await?;

    let details = authorization::whoami(&client, &base_url).await?;
    tracing::info!("{}", details);
    Ok(())
}

async fn run_dictionary(args: DictionaryArgs) -> Result<()> {
    args.validate()?;
    let client = http_client(&args.conn)?;
    let base_url = resolve_base_url(Service::Dictionary, &args.conn).await?;

    let fields = dictionary::fetch_dictionary(
        &client,
        &base_url,
        &args.auths,
        args.data_types.as_deref(),
    )
    .await?;

    match &args.output {
        Some(output) => dictionary::save_dictionary(output, &fields)?,
        None => dictionary::display_dictionary(&fields),
    }
    Ok(())
}

async fn run_ingest(args: IngestArgs) -> Result<()> {
    args.validate()?;
    ingest::check_required_cmds(&["kubectl"])?;
    let pods = KubePods::connect().await?;

    match &args.file {
        Some(file) => {
            let data_type = args.data_type.as_deref().unwrap_or_default();
            match ingest::ingest_file(&pods, &args.namespace, file, data_type).await? {
                IngestOutcome::AlreadyLoaded => {}
                IngestOutcome::Completed => tracing::info!("Ingest complete."),
            }
        }
        None => {
            let states = ingest::application_states(&pods, &args.namespace).await?;
            tracing::info!("MapReduce App Status: {:?}", states);
        }
    }
    Ok(())
}

async fn run_query(args: QueryArgs) -> Result<()> {
    args.validate()?;
    let client = http_client(&args.conn)?;
    let base_url = resolve_base_url(Service::Datawave, &args.conn).await?;

    let params = QueryParams::new(&args.query_name, &args.query, &args.auths);
    let cert_stem = args
        .conn
        .cert
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    let outcome = query::run_query(
        &client,
        &base_url,
        params,
        args.filter.as_deref(),
        &cert_stem,
    )
    .await?;

    match &args.output {
        Some(output) => query::save_query(&outcome, output, args.decode_raw)?,
        None => query::print_query(&outcome),
    }
    Ok(())
}
