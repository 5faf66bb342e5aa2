//! Terminal client for the cart and wishlist stores.
//!
//! State lives in JSON slots under `--data-dir`; products are looked up in the
//! catalog database named by `DATABASE_URL`.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use hat_store::{
    db::create_orm_conn,
    models::Product,
    services::product_service::find_product,
    store::{FileStorage, ONE_SIZE, StorageBackend, Storefront},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "shop", about = "Manage the local Hat Store cart and wishlist")]
struct Cli {
    /// Directory holding the persisted cart and wishlist.
    #[arg(long, default_value = ".hat-store", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Cart actions.
    #[command(subcommand)]
    Cart(CartCommand),
    /// Wishlist actions.
    #[command(subcommand)]
    Wishlist(WishlistCommand),
}

#[derive(Debug, Subcommand)]
enum CartCommand {
    List,
    /// Add a product by id or slug.
    Add {
        product: String,
        #[arg(long, default_value = ONE_SIZE)]
        size: String,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
    Remove {
        id: Uuid,
        #[arg(long, default_value = ONE_SIZE)]
        size: String,
    },
    /// Set a line's quantity; 0 removes the line.
    Set {
        id: Uuid,
        #[arg(long, default_value = ONE_SIZE)]
        size: String,
        #[arg(long)]
        quantity: u32,
    },
    Clear,
    MoveToWishlist {
        id: Uuid,
        #[arg(long, default_value = ONE_SIZE)]
        size: String,
    },
}

#[derive(Debug, Subcommand)]
enum WishlistCommand {
    List,
    Add { product: String },
    Remove { id: Uuid },
    Toggle { product: String },
    Clear,
    MoveToCart {
        id: Uuid,
        #[arg(long, default_value = ONE_SIZE)]
        size: String,
    },
    AddAllToCart,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let storage: Option<Arc<dyn StorageBackend>> = match FileStorage::open(&cli.data_dir) {
        Ok(storage) => Some(Arc::new(storage)),
        Err(err) => {
            tracing::warn!(error = %err, dir = %cli.data_dir.display(), "no durable storage, changes will not be kept");
            None
        }
    };

    let mut shop = Storefront::client(storage);
    shop.mount();

    match cli.command {
        Command::Cart(command) => run_cart(&mut shop, command).await?,
        Command::Wishlist(command) => run_wishlist(&mut shop, command).await?,
    }

    Ok(())
}

async fn run_cart(shop: &mut Storefront, command: CartCommand) -> anyhow::Result<()> {
    match command {
        CartCommand::List => {}
        CartCommand::Add {
            product,
            size,
            quantity,
        } => {
            let product = lookup(&product).await?;
            if !product.sizes.is_empty() && !product.sizes.contains(&size) {
                anyhow::bail!("{} is not sold in size {size}", product.name);
            }
            shop.cart_mut().add_item(&product, &size, quantity);
        }
        CartCommand::Remove { id, size } => shop.cart_mut().remove_item(id, &size),
        CartCommand::Set { id, size, quantity } => {
            shop.cart_mut().update_item_quantity(id, &size, quantity)
        }
        CartCommand::Clear => shop.cart_mut().clear_cart(),
        CartCommand::MoveToWishlist { id, size } => {
            if !shop.move_to_wishlist(id, &size) {
                println!("No cart line for {id} in size {size}");
            }
        }
    }
    print_cart(shop);
    Ok(())
}

async fn run_wishlist(shop: &mut Storefront, command: WishlistCommand) -> anyhow::Result<()> {
    match command {
        WishlistCommand::List => {}
        WishlistCommand::Add { product } => {
            let product = lookup(&product).await?;
            shop.wishlist_mut().add_item(&product);
        }
        WishlistCommand::Remove { id } => shop.wishlist_mut().remove_item(id),
        WishlistCommand::Toggle { product } => {
            let product = lookup(&product).await?;
            let saved = shop.wishlist_mut().toggle_item(&product);
            println!(
                "{} {}",
                product.name,
                if saved { "saved" } else { "removed" }
            );
        }
        WishlistCommand::Clear => shop.wishlist_mut().clear_wishlist(),
        WishlistCommand::MoveToCart { id, size } => {
            if !shop.move_to_cart(id, &size) {
                println!("{id} is not in the wishlist");
            }
            print_cart(shop);
        }
        WishlistCommand::AddAllToCart => {
            let added = shop.add_all_to_cart();
            println!("Added {added} item(s) to the cart");
            print_cart(shop);
        }
    }
    print_wishlist(shop);
    Ok(())
}

async fn lookup(key: &str) -> anyhow::Result<Product> {
    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL is needed to look products up")?;
    let orm = create_orm_conn(&database_url).await?;
    find_product(&orm, key)
        .await?
        .with_context(|| format!("no product with id or slug {key}"))
}

fn print_cart(shop: &Storefront) {
    let cart = shop.use_cart().value;
    if cart.items.is_empty() {
        println!("Cart is empty");
        return;
    }
    println!("Cart ({} item(s))", cart.total_items);
    for line in &cart.items {
        println!(
            "  {} [{}] {} x {} = {}  ({})",
            line.name,
            line.size,
            line.quantity,
            money(line.effective_price()),
            money(line.line_total()),
            line.id
        );
    }
    println!("Subtotal: {}", money(cart.subtotal));
}

fn print_wishlist(shop: &Storefront) {
    let wishlist = shop.use_wishlist().value;
    if wishlist.is_empty() {
        println!("Wishlist is empty");
        return;
    }
    println!("Wishlist ({} item(s))", wishlist.len());
    for item in &wishlist.items {
        println!(
            "  {} {}  ({})",
            item.name,
            money(item.sale_price.unwrap_or(item.price)),
            item.id
        );
    }
}

fn money(minor: i64) -> String {
    format!("${}.{:02}", minor / 100, (minor % 100).abs())
}
