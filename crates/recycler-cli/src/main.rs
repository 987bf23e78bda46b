// ============================================================================
// recycler - command-line front end for the Ijong Mechanics storefront core
// ============================================================================
// Usage:
//   recycler catalog [--category gpu] [--search rtx]   Browse the catalog
//   recycler roster                                     List showcase agents
//   recycler simulate --seed 7 [--fast] [--method dana] Scripted purchase + case opening
//   recycler chat --persona support "ada RTX?"          Ask a chat persona
// ============================================================================

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use recycler_core::chat::get_reply;
use recycler_core::{
    drive_payment, drive_reveal, CancelToken, Catalog, Category, CheckoutStep, GeminiClient,
    PaymentMethod, Persona, Roster, ShippingInfo, ShopConfig, SimulatedGateway, Storefront,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Ijong Mechanics storefront tool
#[derive(Parser)]
#[command(name = "recycler", version, about = "Browse, buy and open cases in the tech recycler storefront")]
struct Cli {
    /// Load the catalog from a JSON file instead of the built-in one
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog items
    Catalog {
        /// Category slug: gpu, cpu, monitor, keyboard, mouse, case, wallet
        #[arg(long)]
        category: Option<String>,

        /// Case-insensitive name/description filter
        #[arg(long)]
        search: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List showcase agents
    Roster,

    /// Run a scripted session: fill cart, check out, open every case
    Simulate {
        /// Seed for the reward reel
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Skip the simulated payment and reveal delays
        #[arg(long)]
        fast: bool,

        /// Payment method: qris, gopay, dana, paypal, seabank
        #[arg(long, default_value = "qris")]
        method: String,
    },

    /// Send one message to a chat persona
    Chat {
        /// support | agent:<ID> | advisor:<ITEM_ID>
        #[arg(long, default_value = "support")]
        persona: String,

        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Could not load .env file: {}", e);
    }
    init_logging();

    let cli = Cli::parse();
    let catalog = match &cli.catalog {
        Some(path) => Catalog::from_path(path)?,
        None => Catalog::builtin(),
    };

    match cli.command {
        Commands::Catalog { category, search, json } => {
            cmd_catalog(&catalog, category.as_deref(), search.as_deref(), json)
        }
        Commands::Roster => cmd_roster(&Roster::builtin()),
        Commands::Simulate { seed, fast, method } => {
            cmd_simulate(catalog, seed, fast, parse_method(&method)?).await
        }
        Commands::Chat { persona, message } => cmd_chat(catalog, &persona, &message).await,
    }
}

fn init_logging() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["recycler_core=info", "recycler=info"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_catalog(catalog: &Catalog, category: Option<&str>, search: Option<&str>, json: bool) -> Result<()> {
    let category = category
        .map(|slug| {
            Category::from_slug(slug).ok_or_else(|| {
                anyhow!("Unknown category '{}'. Valid values: gpu, cpu, monitor, keyboard, mouse, case, wallet", slug)
            })
        })
        .transpose()?;

    let mut items: Vec<_> = match search {
        Some(query) => catalog.search(query),
        None => catalog.items().iter().collect(),
    };
    if let Some(category) = category {
        items.retain(|item| item.category == category);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No items found.");
        return Ok(());
    }

    println!("{:<22}  {:<28}  {:<16}  {:>9}  {}", "ID", "NAME", "CATEGORY", "PRICE", "RARITY");
    println!("{}", "-".repeat(90));
    for item in &items {
        println!(
            "{:<22}  {:<28}  {:<16}  {:>9.2}  {}",
            item.id,
            item.name,
            item.category.label(),
            item.price,
            item.rarity.map(|r| r.display_name()).unwrap_or("-")
        );
    }
    println!("\nTotal: {} items", items.len());
    Ok(())
}

fn cmd_roster(roster: &Roster) -> Result<()> {
    for agent in roster.agents() {
        println!("{} [{}] {} ({})", agent.name, agent.id, agent.role, agent.origin);
        println!(
            "  aggression {:>3}  tactical {:>3}  difficulty {:>3}",
            agent.stats.aggression, agent.stats.tactical, agent.stats.difficulty
        );
        for ability in &agent.abilities {
            println!("  {}  {:<16} {}", ability.slot, ability.name, ability.description);
        }
        println!();
    }
    Ok(())
}

fn parse_method(s: &str) -> Result<PaymentMethod> {
    PaymentMethod::from_slug(s).ok_or_else(|| {
        let valid: Vec<_> = PaymentMethod::ALL.iter().map(|m| m.slug()).collect();
        anyhow!("Unknown payment method '{}'. Valid values: {}", s, valid.join(", "))
    })
}

async fn cmd_simulate(catalog: Catalog, seed: u64, fast: bool, method: PaymentMethod) -> Result<()> {
    let config = if fast { ShopConfig::instant() } else { ShopConfig::from_env() };
    let gateway = SimulatedGateway::from_config(&config).with_seed(seed);
    let storefront = Storefront::new(Arc::new(catalog), Arc::new(Roster::builtin()), config)?;
    let shop = recycler_core::tasks::shared(storefront);
    let cancel = CancelToken::new();
    let mut rng = StdRng::seed_from_u64(seed);

    {
        let mut guard = shop.write().await;
        let picks = pick_cart(guard.catalog());
        if picks.is_empty() {
            anyhow::bail!("Catalog has nothing to buy");
        }
        for id in &picks {
            guard.add_to_cart(id)?;
        }
        println!("Cart: {} ({:.2})", picks.join(", "), guard.cart_total());

        guard.begin_checkout()?;
        guard.submit_shipping(ShippingInfo {
            recipient: "Ijong Mechanic".into(),
            street: "Jl. Daur Ulang 12".into(),
            city: "Bandung".into(),
            postal_code: "40115".into(),
            phone: "+62 812 0000 0000".into(),
        })?;
        guard.select_payment_method(method)?;
        println!("Paying with {}", method.label());
        guard.proceed_to_confirm()?;
    }

    println!("Authorizing payment...");
    let step = drive_payment(&shop, &gateway, &cancel)
        .await
        .context("payment failed")?;
    match step {
        Some(CheckoutStep::Success) => {
            let guard = shop.read().await;
            let reference = guard.checkout().and_then(|s| s.reference()).unwrap_or("-");
            println!("Payment approved ({})", reference);
        }
        Some(step) => {
            let guard = shop.read().await;
            let reason = guard.checkout().and_then(|s| s.failure_reason()).unwrap_or("unknown");
            println!("Checkout ended at {:?}: {}", step, reason);
        }
        None => println!("Payment cancelled"),
    }
    shop.write().await.close_checkout()?;

    loop {
        let next = shop.read().await.containers().into_iter().next();
        let Some(held) = next else { break };

        println!("Opening {} ({} left)...", held.id, held.count);
        match drive_reveal(&shop, &held.id, &mut rng, &cancel).await? {
            Some(reward) => {
                let guard = shop.read().await;
                let name = guard.catalog().get(&reward).map(|i| i.name.as_str()).unwrap_or("?");
                println!("  -> {} [{}]", name, reward);
            }
            None => break,
        }
    }

    let guard = shop.read().await;
    println!("\nInventory:");
    for id in guard.collections().inventory() {
        println!("  {}", id);
    }
    info!("Simulation finished with seed {}", seed);
    Ok(())
}

/// First recommended part plus one of each supply case
fn pick_cart(catalog: &Catalog) -> Vec<String> {
    let mut picks: Vec<String> = catalog
        .recommended()
        .into_iter()
        .filter(|item| !item.is_container())
        .take(1)
        .map(|item| item.id.clone())
        .collect();
    picks.extend(catalog.by_category(Category::SupplyCase).into_iter().map(|item| item.id.clone()));
    picks
}

async fn cmd_chat(catalog: Catalog, persona: &str, message: &str) -> Result<()> {
    let config = ShopConfig::from_env();
    let persona = resolve_persona(&catalog, persona)?;
    let client = GeminiClient::from_config(&config)?;

    if let Some(greeting) = &persona.greeting {
        println!("{}: {}", persona.name, greeting);
    }
    let reply = get_reply(&client, &persona, message, config.chat_timeout()).await;
    println!("{}: {}", persona.name, reply);
    Ok(())
}

fn resolve_persona(catalog: &Catalog, selector: &str) -> Result<Persona> {
    match selector.split_once(':') {
        None if selector == "support" => Ok(Persona::customer_service()),
        Some(("agent", id)) => Roster::builtin()
            .get(id)
            .map(Persona::agent)
            .ok_or_else(|| anyhow!("Unknown agent '{}'", id)),
        Some(("advisor", id)) => catalog
            .get(id)
            .map(Persona::tech_advisor)
            .ok_or_else(|| anyhow!("Unknown item '{}'", id)),
        _ => anyhow::bail!("Unknown persona '{}'. Use support, agent:<ID> or advisor:<ITEM_ID>", selector),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_persona() {
        let catalog = Catalog::builtin();
        assert_eq!(resolve_persona(&catalog, "support").unwrap().name, "Ijong-Support");
        assert_eq!(resolve_persona(&catalog, "agent:sage").unwrap().name, "SAGE");
        assert_eq!(
            resolve_persona(&catalog, "advisor:rtx-4090-reforged").unwrap().name,
            "TECH-ADVISOR"
        );
        assert!(resolve_persona(&catalog, "agent:nobody").is_err());
        assert!(resolve_persona(&catalog, "sales").is_err());
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("dana").unwrap(), PaymentMethod::Dana);
        assert_eq!(parse_method("PayPal").unwrap(), PaymentMethod::PayPal);
        let err = parse_method("cash").unwrap_err().to_string();
        assert!(err.contains("qris, gopay, dana, paypal, seabank"));
    }

    #[test]
    fn test_pick_cart_includes_cases() {
        let catalog = Catalog::builtin();
        let picks = pick_cart(&catalog);
        assert!(picks.iter().any(|id| id == "case-alpha"));
        assert!(picks.iter().any(|id| id == "case-omega"));
        assert!(!catalog.get(&picks[0]).unwrap().is_container());
    }
}
