use capguard::application::notify::StatusChangedBus;
use capguard::application::reconciler::CaptureReconciler;
use capguard::domain::config::{PaymentFormConfig, PaymentItemConfig, PaymentMethod};
use capguard::domain::ports::{NotificationStoreBox, PaymentStoreBox};
use capguard::infrastructure::in_memory::{
    InMemoryGateway, InMemoryItemCatalog, InMemoryNotificationStore, InMemoryPaymentStore,
};
use capguard::interfaces::json::payload;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Capture scenario JSON file (form config, item and gateway payload)
    scenario: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Print the item's installment table instead of running the capture
    #[arg(long)]
    plans: bool,
}

/// One capture scenario: the merchant's configuration plus the raw gateway
/// payload the capture callback would have fetched.
#[derive(Deserialize)]
struct Scenario {
    token: String,
    form_config: FormConfigInput,
    item: ItemInput,
    transaction: serde_json::Value,
}

#[derive(Deserialize)]
struct FormConfigInput {
    max_installments: u32,
    free_installment: u32,
    interest_rate: Decimal,
    #[serde(default)]
    payment_methods: Vec<PaymentMethod>,
}

#[derive(Deserialize)]
struct ItemInput {
    id: String,
    name: String,
    price: i64,
    #[serde(default)]
    tangible: bool,
}

fn in_memory_stores() -> (PaymentStoreBox, NotificationStoreBox) {
    (
        Box::new(InMemoryPaymentStore::new()),
        Box::new(InMemoryNotificationStore::new()),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let raw = fs::read_to_string(&cli.scenario).into_diagnostic()?;
    let scenario: Scenario = serde_json::from_str(&raw).into_diagnostic()?;

    let config = Arc::new(PaymentFormConfig::new(
        scenario.form_config.max_installments,
        scenario.form_config.free_installment,
        scenario.form_config.interest_rate,
        scenario.form_config.payment_methods,
    )?);
    let item = PaymentItemConfig::new(
        scenario.item.id,
        scenario.item.name,
        scenario.item.price,
        scenario.item.tangible,
        config,
    )?;

    if cli.plans {
        println!("installments      total  per_installment");
        for entry in item.payment_plans()? {
            println!(
                "{:>12}  {:>9}  {:>15}",
                entry.installments, entry.total, entry.per_installment
            );
        }
        return Ok(());
    }

    let transaction = payload::transaction_from_value(scenario.transaction)?;

    let gateway = InMemoryGateway::new();
    gateway.authorize(&scenario.token, transaction).await;
    let catalog = InMemoryItemCatalog::new();
    catalog.register(&scenario.token, item).await;

    #[cfg(feature = "storage-rocksdb")]
    let (payments, notifications) = match cli.db_path.as_deref() {
        Some(path) => {
            let store = capguard::infrastructure::rocksdb::RocksDbStore::open(path)?;
            (
                Box::new(store.clone()) as PaymentStoreBox,
                Box::new(store) as NotificationStoreBox,
            )
        }
        None => in_memory_stores(),
    };
    #[cfg(not(feature = "storage-rocksdb"))]
    let (payments, notifications) = in_memory_stores();

    let status_bus = Arc::new(StatusChangedBus::new());
    status_bus.subscribe(Box::new(|payment_id| {
        tracing::info!(%payment_id, "payment status changed");
        Ok(())
    }));

    let reconciler = CaptureReconciler::new(
        Box::new(gateway),
        Box::new(catalog),
        payments,
        notifications,
        status_bus,
    );

    let payment = reconciler.reconcile_capture(&scenario.token).await?;
    println!(
        "payment {} captured: transaction {}, {} installment(s)",
        payment.id, payment.transaction_id, payment.installments
    );

    Ok(())
}
