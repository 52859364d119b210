// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use brasil_dashboard::digits::normalize;
use brasil_dashboard::documents::{phone, postal_code, registry_number};
use brasil_dashboard::entities::bank;
use brasil_dashboard::entities::company::{display_date, SAMPLE_COMPANIES};
use brasil_dashboard::entities::rate::split_main_indicators;
use brasil_dashboard::{
    export, filter, history, insert_lookup_event, logging, lookup_stats, money, open_database,
    recent_lookup_events, Address, ApiError, BankDirectory, BrasilApiClient, ConfigArgs,
    FilterCriteria, LoadTracker, LookupEvent, RegistrationStatus, RegistryNumber, Resource,
    SearchHistory, SortField, SortOrder,
};
use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use rusqlite::Connection;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "brasil-dashboard", version, about = "Brazilian public registry dashboard")]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Look up an address by CEP
    Cep { value: String },

    /// Look up a company by CNPJ (without one, list sample numbers)
    Cnpj { value: Option<String> },

    /// List, search and export banks
    Banks {
        /// Case-insensitive match on name, full name or code
        #[arg(short, long, default_value = "")]
        search: String,

        /// name | fullName | code
        #[arg(long, default_value = "name")]
        sort: String,

        /// asc | desc
        #[arg(long, default_value = "asc")]
        order: String,

        /// Only the main retail banks
        #[arg(long)]
        main: bool,

        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,

        #[arg(long, default_value_t = filter::DEFAULT_PAGE_SIZE)]
        page_size: usize,

        /// Count banks per category instead of listing them
        #[arg(long)]
        categories: bool,

        /// Show the single bank with this code
        #[arg(long)]
        code: Option<i64>,

        /// Write the filtered listing as CSV into this directory
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Show economic rates and indicators
    Rates {
        /// Refresh every N seconds until interrupted
        #[arg(long)]
        watch: Option<u64>,

        /// Write the rates as CSV into this directory
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Check a document number offline
    Validate { kind: DocumentArg, value: String },

    /// Punctuate a document number offline
    Format { kind: DocumentArg, value: String },

    /// Recent successful lookups
    History {
        kind: HistoryArg,

        #[arg(long)]
        clear: bool,
    },

    /// Lookup counters and the most recent calls
    Stats {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Interactive dashboard (default)
    Tui {
        /// Directory for CSV exports made from the dashboard
        #[arg(long, default_value = ".")]
        export_dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DocumentArg {
    Cep,
    Cnpj,
    Phone,
}

#[derive(Clone, Copy, ValueEnum)]
enum HistoryArg {
    Cep,
    Cnpj,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(logging::level_for(cli.verbose));

    let client = BrasilApiClient::new(cli.config.api_config())?;
    let db_path = cli.config.db.clone();

    match cli.command.unwrap_or(Command::Tui {
        export_dir: PathBuf::from("."),
    }) {
        Command::Cep { value } => run_cep(&client, &open_database(&db_path)?, &value).await,
        Command::Cnpj { value: None } => {
            print_sample_companies();
            Ok(())
        }
        Command::Cnpj { value: Some(value) } => {
            run_cnpj(&client, &open_database(&db_path)?, &value).await
        }
        Command::Banks {
            search,
            sort,
            order,
            main,
            page,
            page_size,
            categories,
            code,
            export,
        } => {
            let conn = open_database(&db_path)?;
            let criteria = FilterCriteria::new(
                &search,
                SortField::parse(&sort),
                SortOrder::parse(&order).unwrap_or_default(),
            );
            let listing = BankListing {
                criteria,
                main_only: main,
                page,
                page_size,
                categories,
                code,
                export,
            };
            run_banks(&client, &conn, listing).await
        }
        Command::Rates { watch, export } => {
            run_rates(&client, &open_database(&db_path)?, watch, export).await
        }
        Command::Validate { kind, value } => run_validate(kind, &value),
        Command::Format { kind, value } => {
            println!("{}", format_document(kind, &value));
            Ok(())
        }
        Command::History { kind, clear } => run_history(&open_database(&db_path)?, kind, clear),
        Command::Stats { limit } => run_stats(&open_database(&db_path)?, limit),
        Command::Tui { export_dir } => {
            run_ui_mode(&client, &open_database(&db_path)?, export_dir).await
        }
    }
}

// ============================================================================
// LOOKUP LOG
// ============================================================================

/// Record how an upstream call went. Logging failures never fail the command.
fn record_lookup<T>(
    conn: &Connection,
    resource: Resource,
    key: &str,
    started: Instant,
    result: &Result<T, ApiError>,
) {
    let outcome = match result {
        Ok(_) => "success",
        Err(e) => e.code(),
    };
    let event = LookupEvent::new(
        resource.as_str(),
        key,
        outcome,
        started.elapsed().as_millis() as i64,
    );

    if let Err(e) = insert_lookup_event(conn, &event) {
        tracing::warn!("could not record lookup: {:#}", e);
    }
}

// ============================================================================
// DOCUMENT LOOKUPS
// ============================================================================

async fn run_cep(client: &BrasilApiClient, conn: &Connection, value: &str) -> Result<()> {
    let started = Instant::now();
    let result = client.lookup_postal_code(value).await;
    record_lookup(conn, Resource::PostalCode, &normalize(value), started, &result);

    let address = result?;
    print_address(&address);
    history::remember(conn, address)?;
    Ok(())
}

fn print_address(address: &Address) {
    println!("📍 CEP {}", address.formatted_cep());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Logradouro: {}", address.street);
    println!("Bairro:     {}", address.neighborhood);
    println!("Cidade:     {}", address.city);
    println!("Estado:     {}", address.state);
    if let Some((lat, lng)) = address.coordinates() {
        println!("Coordenadas: {}, {}", lat, lng);
    }
    if !address.service.is_empty() {
        println!("Fonte:      {}", address.service);
    }
}

fn print_sample_companies() {
    println!("🏢 Exemplos de CNPJ");
    for (name, cnpj) in SAMPLE_COMPANIES {
        println!("  {:<18} {}", name, registry_number::format(cnpj));
    }
}

async fn run_cnpj(client: &BrasilApiClient, conn: &Connection, value: &str) -> Result<()> {
    let started = Instant::now();
    let result = client.lookup_company(value).await;
    record_lookup(conn, Resource::RegistryNumber, &normalize(value), started, &result);

    let company = result?;

    println!("🏢 {}", company.display_name());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("CNPJ:          {}", company.formatted_cnpj());
    println!("Razão social:  {}", company.legal_name);
    println!(
        "Tipo:          {}",
        if company.is_head_office() { "Matriz" } else { "Filial" }
    );
    let status_icon = match company.status() {
        RegistrationStatus::Active => "🟢",
        RegistrationStatus::Suspended => "🟡",
        RegistrationStatus::Canceled => "🔴",
        RegistrationStatus::Unknown => "⚪",
    };
    println!(
        "Situação:      {} {} ({})",
        status_icon,
        company.status_text(),
        display_date(&company.status_date)
    );
    println!(
        "Abertura:      {}",
        display_date(&company.activity_start)
    );
    println!("Porte:         {}", company.size_description());
    println!("Capital:       {}", company.share_capital_text());
    println!("Atividade:     {}", company.main_activity);
    println!("Endereço:      {}", company.address_line());
    for phone in company.phones() {
        println!("Telefone:      {}", phone);
    }

    if !company.qsa.is_empty() {
        println!("\n👥 Sócios ({})", company.qsa.len());
        for partner in &company.qsa {
            println!("  • {} - {}", partner.name, partner.qualification);
        }
    }

    let number = registry_number::validate(&company.cnpj)
        .or_else(|_| registry_number::validate(value))
        .context("Upstream returned an unreadable CNPJ")?;
    history::remember(conn, number)?;
    Ok(())
}

// ============================================================================
// BANKS
// ============================================================================

struct BankListing {
    criteria: FilterCriteria,
    main_only: bool,
    page: usize,
    page_size: usize,
    categories: bool,
    code: Option<i64>,
    export: Option<PathBuf>,
}

async fn run_banks(client: &BrasilApiClient, conn: &Connection, listing: BankListing) -> Result<()> {
    let mut loading = LoadTracker::new();
    loading.set_loading(Resource::Banks, true);

    let started = Instant::now();
    let result = client.list_banks().await;
    record_lookup(conn, Resource::Banks, "", started, &result);

    let banks = match result {
        Ok(banks) => {
            loading.set_success(Resource::Banks);
            banks
        }
        Err(e) => {
            loading.set_error(Resource::Banks, &e.message);
            return Err(e.into());
        }
    };
    let directory = BankDirectory::new(banks);

    if let Some(code) = listing.code {
        match directory.get_by_code(code) {
            Some(b) => {
                println!("🏦 {} - {}", b.code_label(), b.name);
                println!("Nome completo: {}", b.full_name);
                println!("ISPB:          {}", b.ispb);
                println!("Tipo:          {}", b.category().as_str());
            }
            None => bail!("Banco {} não encontrado", code),
        }
        return Ok(());
    }

    if listing.categories {
        println!("🏦 {} bancos por tipo", directory.len());
        for (category, count) in directory.category_counts() {
            println!("  {:<28} {:>5}", category.as_str(), count);
        }
        return Ok(());
    }

    let source = if listing.main_only {
        directory.main_banks()
    } else {
        directory.all().to_vec()
    };
    let filtered = filter::filter_records(&source, Some(&listing.criteria));

    if let Some(dir) = &listing.export {
        let csv = export::banks_to_csv(&filtered)?;
        let path = export::write_export(dir, &export::banks_file_name(Utc::now().date_naive()), &csv)?;
        println!("✓ {} bancos exportados para {}", filtered.len(), path.display());
        return Ok(());
    }

    let pages = filter::page_count(filtered.len(), listing.page_size);
    let page = filter::paginate(&filtered, listing.page.saturating_sub(1), listing.page_size);

    println!(
        "🏦 Bancos: {} de {} (página {}/{})",
        filtered.len(),
        directory.len(),
        listing.page.max(1),
        pages.max(1)
    );
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if page.is_empty() {
        println!("Nenhum banco encontrado");
    }
    for b in page {
        println!(
            "{} {:>4}  {:<30} {}",
            if bank::is_main_bank(b.code) { "★" } else { " " },
            b.code_label(),
            b.name,
            b.ispb
        );
    }

    Ok(())
}

// ============================================================================
// RATES
// ============================================================================

async fn run_rates(
    client: &BrasilApiClient,
    conn: &Connection,
    watch: Option<u64>,
    export_dir: Option<PathBuf>,
) -> Result<()> {
    let mut loading = LoadTracker::new();

    loop {
        loading.set_loading(Resource::Rates, true);
        let started = Instant::now();
        let result = client.list_rates().await;
        record_lookup(conn, Resource::Rates, "", started, &result);

        match result {
            Ok(rates) => {
                loading.set_success(Resource::Rates);
                let last_updated = loading.state(Resource::Rates).last_updated;

                if let Some(dir) = &export_dir {
                    let csv = export::rates_to_csv(&rates, last_updated)?;
                    let path = export::write_export(
                        dir,
                        &export::rates_file_name(Utc::now().date_naive()),
                        &csv,
                    )?;
                    println!("✓ {} taxas exportadas para {}", rates.len(), path.display());
                    return Ok(());
                }

                print_rates(&rates, last_updated);
            }
            Err(e) => {
                loading.set_error(Resource::Rates, &e.message);
                if watch.is_none() {
                    return Err(e.into());
                }
                let state = loading.state(Resource::Rates);
                eprintln!("❌ {} (falhas: {})", e.message, state.retry_count);
            }
        }

        match watch {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs.max(1))).await,
            None => return Ok(()),
        }
    }
}

fn print_rates(rates: &[brasil_dashboard::Rate], last_updated: Option<chrono::DateTime<Utc>>) {
    let (cards, others) = split_main_indicators(rates);

    println!("📈 Indicadores principais");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if cards.is_empty() {
        println!("Nenhum indicador principal encontrado");
    }
    for card in &cards {
        println!(
            "{:<5} {:>14}  {}",
            card.display_name,
            card.formatted_value(),
            card.description
        );
    }

    if !others.is_empty() {
        println!("\n📊 Outras taxas");
        for rate in &others {
            println!(
                "{} {:<30} {:>14} {}",
                rate.trend().arrow(),
                rate.name,
                money::format_by_magnitude(rate.value),
                rate.unit()
            );
        }
    }

    if let Some(last) = last_updated {
        println!("\n{}", money::last_update_text(last, Utc::now()));
    }
}

// ============================================================================
// OFFLINE DOCUMENT TOOLS
// ============================================================================

fn run_validate(kind: DocumentArg, value: &str) -> Result<()> {
    let result = match kind {
        DocumentArg::Cep => postal_code::validate(value).map(|code| code.to_string()),
        DocumentArg::Cnpj => registry_number::validate(value).map(|number| {
            format!(
                "{} (raiz {}, {} {})",
                number,
                number.root(),
                if number.is_head_office() { "matriz" } else { "filial" },
                number.branch()
            )
        }),
        DocumentArg::Phone => phone::validate(value).map(|digits| phone::format(&digits)),
    };

    match result {
        Ok(formatted) => {
            println!("✓ {} válido", formatted);
            Ok(())
        }
        Err(e) => bail!("{}", e),
    }
}

fn format_document(kind: DocumentArg, value: &str) -> String {
    match kind {
        DocumentArg::Cep => postal_code::format(value),
        DocumentArg::Cnpj => registry_number::mask_input(value),
        DocumentArg::Phone => phone::format(value),
    }
}

// ============================================================================
// HISTORY + STATS
// ============================================================================

fn run_history(conn: &Connection, kind: HistoryArg, clear: bool) -> Result<()> {
    match kind {
        HistoryArg::Cep => {
            let mut history = SearchHistory::<Address>::load(conn)?;
            if clear {
                history.clear_stored(conn)?;
                println!("✓ Histórico de CEP apagado");
                return Ok(());
            }
            print_history(
                "CEP",
                history.entries().iter().map(|address| address.one_line()),
            );
        }
        HistoryArg::Cnpj => {
            let mut history = SearchHistory::<RegistryNumber>::load(conn)?;
            if clear {
                history.clear_stored(conn)?;
                println!("✓ Histórico de CNPJ apagado");
                return Ok(());
            }
            print_history("CNPJ", history.entries().iter().map(|n| n.to_string()));
        }
    }
    Ok(())
}

fn print_history(label: &str, lines: impl Iterator<Item = String>) {
    println!("🕘 Últimas consultas de {}", label);
    let mut any = false;
    for (i, line) in lines.enumerate() {
        println!("{}. {}", i + 1, line);
        any = true;
    }
    if !any {
        println!("Nenhuma consulta");
    }
}

fn run_stats(conn: &Connection, limit: usize) -> Result<()> {
    println!("📊 Consultas por recurso");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for stat in lookup_stats(conn)? {
        println!(
            "{:<6} total {:>5}  falhas {:>5}  última {}",
            stat.resource,
            stat.total,
            stat.failures,
            stat.last_at.map(money::format_timestamp).unwrap_or_default()
        );
    }

    println!("\n🕘 Últimas {} consultas", limit);
    for event in recent_lookup_events(conn, None, limit)? {
        println!(
            "{}  {:<6} {:<14} {:<14} {} ms",
            money::format_timestamp(event.timestamp),
            event.resource,
            event.key,
            event.outcome,
            event.duration_ms
        );
    }
    Ok(())
}

// ============================================================================
// DASHBOARD
// ============================================================================

#[cfg(feature = "tui")]
async fn run_ui_mode(client: &BrasilApiClient, conn: &Connection, export_dir: PathBuf) -> Result<()> {
    println!("🖥️  Loading Brasil Dashboard...\n");

    let mut loading = LoadTracker::new();
    loading.set_loading(Resource::Banks, true);
    loading.set_loading(Resource::Rates, true);

    let started = Instant::now();
    let (banks, rates) = tokio::join!(client.list_banks(), client.list_rates());
    record_lookup(conn, Resource::Banks, "", started, &banks);
    record_lookup(conn, Resource::Rates, "", started, &rates);

    let banks = match banks {
        Ok(banks) => {
            loading.set_success(Resource::Banks);
            println!("✓ Loaded {} banks", banks.len());
            banks
        }
        Err(e) => {
            loading.set_error(Resource::Banks, &e.message);
            Vec::new()
        }
    };
    let rates = match rates {
        Ok(rates) => {
            loading.set_success(Resource::Rates);
            println!("✓ Loaded {} rates", rates.len());
            rates
        }
        Err(e) => {
            loading.set_error(Resource::Rates, &e.message);
            Vec::new()
        }
    };

    let cep_history = SearchHistory::<Address>::load(conn)?;
    let cnpj_history = SearchHistory::<RegistryNumber>::load(conn)?;

    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(
        banks,
        rates,
        cep_history.entries().to_vec(),
        cnpj_history.entries().to_vec(),
        loading,
        export_dir,
    );
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
async fn run_ui_mode(_client: &BrasilApiClient, _conn: &Connection, _export_dir: PathBuf) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the web API: cargo run --bin brasil-server --features server");
    std::process::exit(1);
}
