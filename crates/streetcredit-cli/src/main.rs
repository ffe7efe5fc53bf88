use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use streetcredit_intake::{AdvisoryCheck, EventSink, OrderIntake, TopUpAmount, TopUpDesk};
use streetcredit_pricing::{PriceFeed, Selection};
use streetcredit_settlement::{Ledger, ReconciliationView, SettlementDispatcher, reconcile_user};
use streetcredit_store::InMemoryStore;
use streetcredit_types::{
    EngineConfig, ExportFormat, PriceConfig, SelectionItem, SelectionMode, SettlementEvent,
    TopUpPlan, UserId, constants,
};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "streetcredit", about = "StreetCredit settlement engine operator tool")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Engine configuration file (JSON). Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and effective configuration
    Info,
    /// List the top-up plans
    Plans,
    /// Quote a street selection and check it against a cached balance
    Quote {
        /// Buildings in the generated street
        #[arg(short, long, default_value = "3")]
        buildings: usize,
        /// Trees in the generated street
        #[arg(short, long, default_value = "2")]
        trees: usize,
        /// Balance the client believes it has
        #[arg(long)]
        cached_balance: Option<u64>,
        /// Selection preset (road, everything)
        #[arg(short, long, default_value = "everything")]
        mode: SelectionMode,
    },
    /// Run one user through top-up, export orders and settlement
    Demo(DemoArgs),
}

#[derive(Args)]
struct DemoArgs {
    /// Opening balance
    #[arg(long, default_value = "10")]
    balance: u64,
    /// Objects per export order
    #[arg(short, long, value_delimiter = ',', default_value = "3,4")]
    orders: Vec<usize>,
    /// Buy a plan before ordering (basic, pro, ultimate)
    #[arg(long)]
    top_up: Option<TopUpPlan>,
    /// Unit price to publish after the first order is submitted
    #[arg(long)]
    reprice: Option<u64>,
    /// Extra deliveries of every event
    #[arg(long, default_value = "1")]
    redeliver: u32,
    /// Export format recorded on the orders
    #[arg(long, default_value = "obj")]
    format: ExportFormat,
}

fn init_logging(verbose: bool, json: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    EngineConfig::from_json(&raw).with_context(|| format!("parsing config {}", path.display()))
}

/// A generated street: road, sidewalks, trees, buildings, plus props the
/// street-set selection leaves out.
fn street_scene(buildings: usize, trees: usize) -> Vec<SelectionItem> {
    let mut scene = vec![
        SelectionItem::new("Ground", "Mesh").scaled([200.0, 1.0, 200.0]),
        SelectionItem::new("Road", "Mesh").colored("333333"),
        SelectionItem::new("Sidewalk Left", "Mesh").at([-6.0, 0.1, 0.0]),
        SelectionItem::new("Sidewalk Right", "Mesh").at([6.0, 0.1, 0.0]),
        SelectionItem::new("Sun", "DirectionalLight"),
    ];
    for i in 0..trees {
        scene.push(SelectionItem::new(format!("Tree {i}"), "Group").at([-8.0, 0.0, i as f32 * 10.0]));
    }
    for i in 0..buildings {
        scene.push(
            SelectionItem::new(format!("Building {i}"), "Mesh")
                .at([12.0, 0.0, i as f32 * 15.0])
                .scaled([8.0, 20.0, 8.0]),
        );
    }
    scene
}

/// Emits every event `1 + extra` times.
struct Redelivering<S> {
    inner: S,
    extra: u32,
}

impl<S: EventSink> EventSink for Redelivering<S> {
    fn emit(&self, event: SettlementEvent) -> streetcredit_types::Result<()> {
        for _ in 0..=self.extra {
            self.inner.emit(event)?;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Info => {
            println!("{} v{}", constants::ENGINE_NAME, constants::VERSION);
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Plans => {
            for plan in TopUpPlan::ALL {
                println!("{:<14} {:>4} credits  {:>3} EUR", plan.label(), plan.credits(), plan.price_eur());
            }
        }
        Commands::Quote {
            buildings,
            trees,
            cached_balance,
            mode,
        } => {
            let mut selection = Selection::new();
            let picked = selection.select_preset(mode, &street_scene(buildings, trees))?;
            let quote = selection.quote(config.price.object_unit_price)?;
            println!("{mode}: selected {picked} objects: {}", serde_json::to_string(&quote)?);
            if let Some(balance) = cached_balance {
                let check = AdvisoryCheck::evaluate(&quote, balance);
                println!("advisory: {}", serde_json::to_string(&check)?);
            }
        }
        Commands::Demo(args) => run_demo(&config, &args).await?,
    }

    Ok(())
}

async fn run_demo(config: &EngineConfig, args: &DemoArgs) -> anyhow::Result<()> {
    let ledger = Arc::new(Ledger::new());
    let store = Arc::new(InMemoryStore::new());
    let feed = PriceFeed::new(config.price);
    let dispatcher = Arc::new(SettlementDispatcher::new(
        ledger.clone(),
        store.clone(),
        config.dispatcher.clone(),
    ));

    let (tx, rx) = mpsc::channel::<SettlementEvent>(config.dispatcher.queue_capacity);
    let sink = Arc::new(Redelivering {
        inner: tx,
        extra: args.redeliver,
    });
    let intake = OrderIntake::new(store.clone(), sink.clone());
    let desk = TopUpDesk::new(store.clone(), sink.clone());
    let runner = tokio::spawn(dispatcher.clone().run(rx));

    let user = UserId::new();
    ledger.open_account(user, "demo", args.balance)?;
    tracing::info!(user_id = %user, balance = args.balance, "demo account opened");
    if let Some(plan) = args.top_up {
        let request_id = desk.approve(user, TopUpAmount::Plan(plan), plan.price_eur(), None)?;
        tracing::info!(%request_id, plan = plan.label(), "top-up approved");
    }

    for (i, &count) in args.orders.iter().enumerate() {
        let scene = street_scene(count, 0);
        let mut selection = Selection::new();
        for item in scene.into_iter().filter(|it| it.name.starts_with("Building")) {
            selection.select(item)?;
        }
        let unit_price = feed.unit_price();
        let quote = selection.quote(unit_price)?;
        let hint = AdvisoryCheck::evaluate(&quote, ledger.balance(user)?);
        println!("order {i}: {count} objects at {unit_price} -> {:?}, advisory {hint:?}", quote.total());
        intake.submit(user, &selection, unit_price, args.format)?;

        if i == 0 {
            if let Some(price) = args.reprice {
                feed.publish(PriceConfig {
                    object_unit_price: price,
                })?;
                tracing::info!(unit_price = price, "unit price republished");
            }
        }
    }

    drop(intake);
    drop(desk);
    drop(sink);
    let stats = runner.await.context("dispatcher task")?;
    tracing::info!(settled = stats.settled, rejected = stats.rejected, alerts = stats.alerts, "event queue drained");

    let view = ReconciliationView::new(store.clone(), config.reconciliation.clone());
    println!("history (newest first):");
    for row in view.order_views(user, chrono::Utc::now())? {
        println!(
            "  {}  {:>3} objects  {:>4} credits  {}",
            row.order_id, row.objects_count, row.quoted_price, row.display
        );
    }
    for request in view.list_balance_requests(user)? {
        println!(
            "  {}  +{} credits  {} EUR  {}",
            request.id,
            request.credits,
            request.amount_paid.round_dp(2),
            request.status
        );
    }

    println!("balance: {}", ledger.balance(user)?);
    println!("stats: {}", serde_json::to_string(&stats)?);
    let report = reconcile_user(&ledger, store.as_ref(), user)?;
    println!("audit: {}", serde_json::to_string_pretty(&report)?);
    if !report.is_clean() {
        anyhow::bail!("ledger and store disagree for {user}");
    }
    Ok(())
}
