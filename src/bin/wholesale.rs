//! CLI binary for the wholesale storefront.
#![allow(
    clippy::exit,
    reason = "CLI binary uses process::exit for fatal errors"
)]

use std::io::{self, Write as _};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use wholesale_rs::cart::Cart;
use wholesale_rs::config::{ACCESS_TOKEN_VAR, Config, PUBLISHABLE_KEY_VAR, URL_VAR};
use wholesale_rs::error::{Result as WholesaleResult, WholesaleError};
use wholesale_rs::models::{
    Category, Order, OrderDetails, OrderId, OrderLine, OrderStatus, Product, ProductId, Shop,
    ShopApplication, ShopId, ShopOrder, ShopRegistration, ShopStatus, ShopWithOwner,
    SubmittedOrder, UserId,
};
use wholesale_rs::pricing::PricingSummary;
use wholesale_rs::storage::{BlockingCartStorage, FileStorage};
use wholesale_rs::storefront::{DashboardStats, StorefrontBlocking};

/// Wholesale storefront CLI: browse the catalog, fill a cart, submit and
/// manage orders.
#[derive(Debug, Parser)]
#[command(name = "wholesale", version, about)]
struct Cli {
    /// Override the cart directory (default: XDG data dir).
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// List the catalog with its tier prices.
    Products,
    /// List product categories.
    Categories,
    /// Show or change the local cart.
    Cart {
        /// Cart operation.
        #[command(subcommand)]
        action: CartCommand,
    },
    /// Submit the cart as an order for your approved shop.
    Submit,
    /// List the orders of your shops.
    Orders,
    /// List every order (administrators).
    AdminOrders,
    /// Approve a pending order (administrators).
    ApproveOrder {
        /// Order ID.
        id: String,
        /// Delivery estimate shown to the shop, e.g. "3-5 days".
        #[arg(long)]
        estimate: Option<String>,
    },
    /// Reject a pending order (administrators).
    RejectOrder {
        /// Order ID.
        id: String,
    },
    /// Mark an approved order as delivered (administrators).
    DeliverOrder {
        /// Order ID.
        id: String,
    },
    /// List shops with their owners (administrators).
    Shops,
    /// Approve a pending shop (administrators).
    ApproveShop {
        /// Shop ID.
        id: String,
    },
    /// Reject a pending shop (administrators).
    RejectShop {
        /// Shop ID.
        id: String,
    },
    /// Suspend an approved shop (administrators).
    SuspendShop {
        /// Shop ID.
        id: String,
    },
    /// Re-approve a rejected or suspended shop (administrators).
    ReinstateShop {
        /// Shop ID.
        id: String,
    },
    /// Apply for a shop of your own; it starts pending.
    OpenShop {
        /// Shop name.
        #[arg(long)]
        name: String,
        /// Shop address.
        #[arg(long)]
        location: String,
    },
    /// Register an approved shop for an existing user (administrators).
    RegisterShop {
        /// User ID of the owner.
        #[arg(long)]
        owner: String,
        /// Shop name.
        #[arg(long)]
        name: String,
        /// Shop address.
        #[arg(long)]
        location: String,
        /// Latitude in decimal degrees.
        #[arg(long, allow_negative_numbers = true)]
        latitude: Option<f64>,
        /// Longitude in decimal degrees.
        #[arg(long, allow_negative_numbers = true)]
        longitude: Option<f64>,
    },
    /// Show dashboard numbers for your role.
    Stats,
}

/// Cart subcommands.
#[derive(Debug, Subcommand)]
enum CartCommand {
    /// Show the cart with tier prices and totals.
    Show,
    /// Add units of a product.
    Add {
        /// Product ID.
        product: String,
        /// Units to add.
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Set a line's quantity; 0 or less removes it.
    Set {
        /// Product ID.
        product: String,
        /// New quantity.
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line.
    Remove {
        /// Product ID.
        product: String,
    },
    /// Empty the cart.
    Clear,
}

/// Loads the backend configuration, printing a hint on failure.
fn read_config() -> io::Result<Option<Config>> {
    match Config::from_env() {
        Ok(config) => Ok(Some(config)),
        Err(err) => {
            let mut stderr = io::stderr().lock();
            writeln!(stderr, "{} {err}", "error:".red().bold())?;
            writeln!(
                stderr,
                "  {} create a .env file with {}=<url> and {}=<key>",
                "hint:".cyan(),
                URL_VAR,
                PUBLISHABLE_KEY_VAR
            )?;
            Ok(None)
        }
    }
}

/// Runs the CLI, returning an appropriate exit code.
fn run() -> io::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let _dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let Some(config) = read_config()? else {
        return Ok(ExitCode::FAILURE);
    };

    let storage = match create_storage(cli.data_dir.or_else(|| config.data_dir.clone())) {
        Ok(storage) => storage,
        Err(err) => return report("failed to initialize storage", &err),
    };

    let store = match StorefrontBlocking::builder()
        .config(&config)
        .storage(storage)
        .build()
    {
        Ok(store) => store,
        Err(err) => return report("failed to build storefront", &err),
    };

    if let Err(err) = store.restore_cart() {
        return report("failed to restore cart", &err);
    }

    dispatch(&store, cli.command)
}

/// Creates the storage backend, using `data_dir` if provided or the
/// default XDG data directory otherwise.
fn create_storage(data_dir: Option<PathBuf>) -> WholesaleResult<FileStorage> {
    let dir = match data_dir {
        Some(dir) => dir,
        None => FileStorage::default_dir()?,
    };
    FileStorage::new(dir)
}

/// Dispatches to the appropriate subcommand handler.
fn dispatch<S: BlockingCartStorage>(
    store: &StorefrontBlocking<S>,
    command: Command,
) -> io::Result<ExitCode> {
    match command {
        Command::Products => cmd_products(store),
        Command::Categories => cmd_categories(store),
        Command::Cart { action } => cmd_cart(store, action),
        Command::Submit => cmd_submit(store),
        Command::Orders => cmd_orders(store),
        Command::AdminOrders => cmd_admin_orders(store),
        Command::ApproveOrder { id, estimate } => cmd_order_update("approve order", || {
            store.approve_order(&OrderId::from(id), estimate)
        }),
        Command::RejectOrder { id } => {
            cmd_order_update("reject order", || store.reject_order(&OrderId::from(id)))
        }
        Command::DeliverOrder { id } => {
            cmd_order_update("deliver order", || store.deliver_order(&OrderId::from(id)))
        }
        Command::Shops => cmd_shops(store),
        Command::ApproveShop { id } => {
            cmd_shop_update("approve shop", || store.approve_shop(&ShopId::from(id)))
        }
        Command::RejectShop { id } => {
            cmd_shop_update("reject shop", || store.reject_shop(&ShopId::from(id)))
        }
        Command::SuspendShop { id } => {
            cmd_shop_update("suspend shop", || store.suspend_shop(&ShopId::from(id)))
        }
        Command::ReinstateShop { id } => {
            cmd_shop_update("reinstate shop", || store.reinstate_shop(&ShopId::from(id)))
        }
        Command::OpenShop { name, location } => cmd_shop_update("open shop", || {
            store.open_shop(&ShopApplication::new(&name, &location))
        }),
        Command::RegisterShop {
            owner,
            name,
            location,
            latitude,
            longitude,
        } => cmd_shop_update("register shop", || {
            store.register_shop(&ShopRegistration {
                owner_id: UserId::from(owner),
                name,
                location,
                latitude,
                longitude,
            })
        }),
        Command::Stats => cmd_stats(store),
    }
}

/// Prints an error (with a sign-in hint for authorization failures) and
/// returns a failing exit code.
fn report(context: &str, err: &WholesaleError) -> io::Result<ExitCode> {
    let mut stderr = io::stderr().lock();
    writeln!(stderr, "{} {context}: {err}", "error:".red().bold())?;
    if matches!(*err, WholesaleError::Unauthenticated) {
        writeln!(
            stderr,
            "  {} set {}=<access token> in your .env file",
            "hint:".cyan(),
            ACCESS_TOKEN_VAR
        )?;
    }
    Ok(ExitCode::FAILURE)
}

/// Executes the `products` subcommand.
fn cmd_products<S: BlockingCartStorage>(store: &StorefrontBlocking<S>) -> io::Result<ExitCode> {
    let spinner = make_spinner("Loading catalog...");
    let result = store.products();
    spinner.finish_and_clear();
    match result {
        Ok(products) => {
            print_products_table(&products)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report("failed to load products", &err),
    }
}

/// Executes the `categories` subcommand.
fn cmd_categories<S: BlockingCartStorage>(store: &StorefrontBlocking<S>) -> io::Result<ExitCode> {
    match store.categories() {
        Ok(categories) => {
            print_categories_table(&categories)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report("failed to load categories", &err),
    }
}

/// Executes a `cart` subcommand and prints the resulting cart.
fn cmd_cart<S: BlockingCartStorage>(
    store: &StorefrontBlocking<S>,
    action: CartCommand,
) -> io::Result<ExitCode> {
    let result = match action {
        CartCommand::Show => store.cart(),
        CartCommand::Add { product, quantity } => {
            store.add_product_to_cart(&ProductId::from(product), quantity)
        }
        CartCommand::Set { product, quantity } => {
            store.update_cart_quantity(&ProductId::from(product), quantity)
        }
        CartCommand::Remove { product } => store.remove_from_cart(&ProductId::from(product)),
        CartCommand::Clear => store.clear_cart().map(|()| Cart::new()),
    };
    let cart = match result {
        Ok(cart) => cart,
        Err(err) => return report("cart update failed", &err),
    };
    match store.cart_summary() {
        Ok(summary) => {
            print_cart(&cart, &summary)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report("failed to price cart", &err),
    }
}

/// Executes the `submit` subcommand.
fn cmd_submit<S: BlockingCartStorage>(store: &StorefrontBlocking<S>) -> io::Result<ExitCode> {
    let spinner = make_spinner("Submitting order...");
    let result = store.submit_order();
    spinner.finish_and_clear();
    match result {
        Ok(submitted) => {
            print_submitted(&submitted)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report("order submission failed", &err),
    }
}

/// Executes the `orders` subcommand.
fn cmd_orders<S: BlockingCartStorage>(store: &StorefrontBlocking<S>) -> io::Result<ExitCode> {
    let spinner = make_spinner("Loading orders...");
    let result = store.my_orders();
    spinner.finish_and_clear();
    match result {
        Ok(orders) => {
            print_shop_orders_table(&orders)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report("failed to load orders", &err),
    }
}

/// Executes the `admin-orders` subcommand.
fn cmd_admin_orders<S: BlockingCartStorage>(
    store: &StorefrontBlocking<S>,
) -> io::Result<ExitCode> {
    let spinner = make_spinner("Loading all orders...");
    let result = store.all_orders();
    spinner.finish_and_clear();
    match result {
        Ok(orders) => {
            print_order_details_table(&orders)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report("failed to load orders", &err),
    }
}

/// Runs an order status change and prints the outcome.
fn cmd_order_update<F>(label: &str, update: F) -> io::Result<ExitCode>
where
    F: FnOnce() -> WholesaleResult<Order>,
{
    match update() {
        Ok(order) => {
            let mut out = io::stdout().lock();
            writeln!(
                out,
                "{} order {} is now {}",
                "done:".green().bold(),
                order.id,
                order_status_label(order.status)
            )?;
            if let Some(estimate) = order.delivery_estimate.as_deref() {
                writeln!(out, "  {} {estimate}", "Delivery estimate:".bold())?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report(&format!("failed to {label}"), &err),
    }
}

/// Executes the `shops` subcommand.
fn cmd_shops<S: BlockingCartStorage>(store: &StorefrontBlocking<S>) -> io::Result<ExitCode> {
    let spinner = make_spinner("Loading shops...");
    let result = store.shops_with_owners();
    spinner.finish_and_clear();
    match result {
        Ok(shops) => {
            print_shops_table(&shops)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report("failed to load shops", &err),
    }
}

/// Runs a shop status change and prints the outcome.
fn cmd_shop_update<F>(label: &str, update: F) -> io::Result<ExitCode>
where
    F: FnOnce() -> WholesaleResult<Shop>,
{
    match update() {
        Ok(shop) => {
            writeln!(
                io::stdout().lock(),
                "{} shop {} ({}) is now {}",
                "done:".green().bold(),
                shop.name,
                shop.id,
                shop_status_label(shop.status)
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report(&format!("failed to {label}"), &err),
    }
}

/// Executes the `stats` subcommand.
fn cmd_stats<S: BlockingCartStorage>(store: &StorefrontBlocking<S>) -> io::Result<ExitCode> {
    let spinner = make_spinner("Counting...");
    let result = store.dashboard_stats();
    spinner.finish_and_clear();
    match result {
        Ok(stats) => {
            print_stats(&stats)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report("failed to load dashboard", &err),
    }
}

// ── Output formatting ────────────────────────────────────────────────

/// Formats an amount with two decimals.
fn money(amount: f64) -> String {
    format!("{amount:.2}")
}

/// Colored cell for an order status.
fn order_status_cell(status: OrderStatus) -> Cell {
    let color = match status {
        OrderStatus::Pending => Color::Yellow,
        OrderStatus::Approved => Color::Blue,
        OrderStatus::Rejected => Color::Red,
        OrderStatus::Delivered => Color::Green,
    };
    Cell::new(status).fg(color)
}

/// Colored label for an order status.
fn order_status_label(status: OrderStatus) -> String {
    match status {
        OrderStatus::Pending => status.yellow().to_string(),
        OrderStatus::Approved => status.blue().to_string(),
        OrderStatus::Rejected => status.red().to_string(),
        OrderStatus::Delivered => status.green().to_string(),
    }
}

/// Colored label for a shop status.
fn shop_status_label(status: ShopStatus) -> String {
    match status {
        ShopStatus::Pending => status.yellow().to_string(),
        ShopStatus::Approved => status.green().to_string(),
        ShopStatus::Rejected => status.red().to_string(),
    }
}

/// Joins order lines into one `CODE x qty` cell.
fn lines_summary(lines: &[OrderLine]) -> String {
    lines
        .iter()
        .map(|line| {
            let code = line
                .product
                .as_ref()
                .map_or("?", |product| product.code.as_str());
            format!("{code} x{}", line.quantity)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Prints the catalog in a table.
fn print_products_table(products: &[Product]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if products.is_empty() {
        writeln!(out, "{}", "No products found.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Code").fg(Color::Cyan),
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Category").fg(Color::Cyan),
        Cell::new("1+").fg(Color::Cyan),
        Cell::new("10+").fg(Color::Cyan),
        Cell::new("50+").fg(Color::Cyan),
        Cell::new("100+").fg(Color::Cyan),
        Cell::new("ID").fg(Color::Cyan),
    ]);

    for product in products {
        let category = product
            .category
            .as_ref()
            .map_or("\u{2014}", |category| category.name.as_str());
        _ = table.add_row(vec![
            Cell::new(&product.code),
            Cell::new(&product.name),
            Cell::new(category),
            Cell::new(money(product.prices.price_1)),
            Cell::new(money(product.prices.price_10)),
            Cell::new(money(product.prices.price_50)),
            Cell::new(money(product.prices.price_100)),
            Cell::new(&product.id).fg(Color::DarkGrey),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Products".green().bold(),
        format_args!("({})", products.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints categories in a table.
fn print_categories_table(categories: &[Category]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if categories.is_empty() {
        writeln!(out, "{}", "No categories found.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Code").fg(Color::Cyan),
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("ID").fg(Color::Cyan),
    ]);
    for category in categories {
        _ = table.add_row(vec![
            Cell::new(&category.code),
            Cell::new(&category.name),
            Cell::new(&category.id).fg(Color::DarkGrey),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Categories".green().bold(),
        format_args!("({})", categories.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints the cart lines and its totals.
fn print_cart(cart: &Cart, summary: &PricingSummary) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if cart.is_empty() {
        writeln!(out, "{}", "Cart is empty.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Code").fg(Color::Cyan),
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Qty").fg(Color::Cyan),
        Cell::new("Unit").fg(Color::Cyan),
        Cell::new("Line").fg(Color::Cyan),
    ]);
    for item in cart.items() {
        _ = table.add_row(vec![
            Cell::new(&item.product.code),
            Cell::new(&item.product.name),
            Cell::new(item.quantity),
            Cell::new(money(item.unit_price())),
            Cell::new(money(item.line_total())),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Cart".green().bold(),
        format_args!("({} units)", cart.item_count()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    writeln!(out, "  {} {}", "Subtotal:".bold(), money(summary.subtotal))?;
    if summary.discount_applied {
        writeln!(
            out,
            "  {} -{}",
            "Discount:".bold(),
            money(summary.discount).green()
        )?;
    }
    writeln!(out, "  {} {}", "Total:".bold(), money(summary.total).bold())?;
    Ok(())
}

/// Prints a freshly submitted order.
fn print_submitted(submitted: &SubmittedOrder) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(
        out,
        "{} {}",
        "Order submitted!".green().bold(),
        format_args!("(id: {})", submitted.order.id).dimmed()
    )?;
    writeln!(out, "  {} {}", "Lines:".bold(), submitted.items.len())?;
    let total = submitted.order.total_amount.map_or_else(|| "\u{2014}".to_owned(), money);
    writeln!(out, "  {} {total}", "Total:".bold())?;
    writeln!(
        out,
        "  {} {}",
        "Status:".bold(),
        order_status_label(submitted.order.status)
    )?;
    if !submitted.cart_saved {
        writeln!(
            out,
            "{} the stored cart still holds the submitted lines; run `wholesale cart clear` before ordering again",
            "warning:".yellow().bold()
        )?;
    }
    Ok(())
}

/// Prints the owner's orders in a table.
fn print_shop_orders_table(orders: &[ShopOrder]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if orders.is_empty() {
        writeln!(out, "{}", "No orders yet.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Placed").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
        Cell::new("Total").fg(Color::Cyan),
        Cell::new("Delivery").fg(Color::Cyan),
        Cell::new("Items").fg(Color::Cyan),
        Cell::new("ID").fg(Color::Cyan),
    ]);
    for entry in orders {
        let order = &entry.order;
        _ = table.add_row(vec![
            Cell::new(order.created_at.format("%Y-%m-%d %H:%M")),
            order_status_cell(order.status),
            Cell::new(order.total_amount.map_or_else(|| "\u{2014}".to_owned(), money)),
            Cell::new(order.delivery_estimate.as_deref().unwrap_or("\u{2014}")),
            Cell::new(lines_summary(&entry.order_items)),
            Cell::new(&order.id).fg(Color::DarkGrey),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Orders".green().bold(),
        format_args!("({})", orders.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints every order with its shop and owner.
fn print_order_details_table(orders: &[OrderDetails]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if orders.is_empty() {
        writeln!(out, "{}", "No orders found.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Placed").fg(Color::Cyan),
        Cell::new("Shop").fg(Color::Cyan),
        Cell::new("Owner").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
        Cell::new("Total").fg(Color::Cyan),
        Cell::new("Items").fg(Color::Cyan),
        Cell::new("ID").fg(Color::Cyan),
    ]);
    for order in orders {
        let shop = order
            .shops
            .as_ref()
            .map_or("\u{2014}", |shop| shop.name.as_str());
        let owner = order
            .shops
            .as_ref()
            .and_then(|shop| shop.profiles.as_ref())
            .and_then(|owner| owner.full_name.as_deref())
            .unwrap_or("\u{2014}");
        _ = table.add_row(vec![
            Cell::new(order.created_at.format("%Y-%m-%d %H:%M")),
            Cell::new(shop),
            Cell::new(owner),
            order_status_cell(order.status),
            Cell::new(order.total_amount.map_or_else(|| "\u{2014}".to_owned(), money)),
            Cell::new(lines_summary(&order.order_items)),
            Cell::new(&order.id).fg(Color::DarkGrey),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "All Orders".green().bold(),
        format_args!("({})", orders.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints shops with their owners in a table.
fn print_shops_table(shops: &[ShopWithOwner]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if shops.is_empty() {
        writeln!(out, "{}", "No shops found.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Location").fg(Color::Cyan),
        Cell::new("Owner").fg(Color::Cyan),
        Cell::new("Phone").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
        Cell::new("ID").fg(Color::Cyan),
    ]);
    for entry in shops {
        let owner = entry.owner.as_ref();
        let status_color = match entry.shop.status {
            ShopStatus::Pending => Color::Yellow,
            ShopStatus::Approved => Color::Green,
            ShopStatus::Rejected => Color::Red,
        };
        _ = table.add_row(vec![
            Cell::new(&entry.shop.name),
            Cell::new(&entry.shop.location),
            Cell::new(
                owner
                    .and_then(|profile| profile.full_name.as_deref())
                    .unwrap_or("\u{2014}"),
            ),
            Cell::new(
                owner
                    .and_then(|profile| profile.phone.as_deref())
                    .unwrap_or("\u{2014}"),
            ),
            Cell::new(entry.shop.status).fg(status_color),
            Cell::new(&entry.shop.id).fg(Color::DarkGrey),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Shops".green().bold(),
        format_args!("({})", shops.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints the dashboard numbers.
fn print_stats(stats: &DashboardStats) -> io::Result<()> {
    let mut out = io::stdout().lock();
    let (title, rows): (&str, Vec<(&str, u64)>) = match *stats {
        DashboardStats::Admin(admin) => (
            "Admin Dashboard",
            vec![
                ("Shops", admin.shops),
                ("Products", admin.products),
                ("Pending orders", admin.pending_orders),
                ("Categories", admin.categories),
            ],
        ),
        DashboardStats::BusinessOwner(owner) => (
            "Shop Dashboard",
            vec![("Products", owner.products), ("My orders", owner.orders)],
        ),
    };

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Metric").fg(Color::Cyan),
        Cell::new("Count").fg(Color::Cyan),
    ]);
    for (name, count) in rows {
        let count_cell = if count > 0 {
            Cell::new(count).fg(Color::Green)
        } else {
            Cell::new(count).fg(Color::DarkGrey)
        };
        _ = table.add_row(vec![Cell::new(name), count_cell]);
    }

    writeln!(out, "{}", title.green().bold())?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Creates a spinner with the given message.
fn make_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_owned());
    spinner.enable_steady_tick(core::time::Duration::from_millis(80));
    spinner
}

/// Entry point.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            // stderr itself may be gone
            let _ignored = writeln!(io::stderr(), "fatal I/O error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::DateTime;
    use clap::CommandFactory as _;
    use wholesale_rs::models::{
        CategoryId, CategoryRef, OrderShopSummary, OwnerProfile, ProductLabel, UserId,
    };
    use wholesale_rs::pricing::TierPrices;
    use wholesale_rs::storage::InMemoryStorage;
    use wholesale_rs::storefront::{AdminStats, OwnerStats};

    /// Storefront with an unroutable backend and no access token.
    fn offline_store() -> StorefrontBlocking<InMemoryStorage> {
        StorefrontBlocking::builder()
            .base_url("http://127.0.0.1:9")
            .publishable_key("anon")
            .storage(InMemoryStorage::new())
            .build()
            .unwrap()
    }

    /// Creates a test product.
    fn test_product(id: &str, code: &str) -> Product {
        Product {
            id: ProductId::from(id),
            code: code.to_owned(),
            name: format!("Product {code}"),
            description: None,
            image_url: None,
            prices: TierPrices::new(12.0, 11.0, 10.0, 9.0),
            category_id: CategoryId::from("cat-1"),
            category: Some(CategoryRef {
                code: "BEV".to_owned(),
                name: "Beverages".to_owned(),
            }),
        }
    }

    /// Creates a test order.
    fn test_order(id: &str, status: OrderStatus) -> Order {
        Order {
            id: OrderId::from(id),
            shop_id: ShopId::from("shop-1"),
            status,
            total_amount: Some(2375.0),
            delivery_estimate: Some("3-5 days".to_owned()),
            created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    /// Creates an order line.
    fn test_line(code: &str, quantity: u32) -> OrderLine {
        OrderLine {
            quantity,
            unit_price: 9.0,
            total_price: 9.0 * f64::from(quantity),
            product: Some(ProductLabel {
                code: code.to_owned(),
                name: format!("Product {code}"),
            }),
        }
    }

    /// Creates a test shop.
    fn test_shop(id: &str, status: ShopStatus) -> Shop {
        Shop {
            id: ShopId::from(id),
            owner_id: UserId::from("user-1"),
            name: "Corner Store".to_owned(),
            location: "Main Street 1".to_owned(),
            latitude: Some(6.9),
            longitude: Some(79.8),
            status,
            registered_by: None,
            created_at: None,
        }
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_approve_order_with_estimate() {
        let cli =
            Cli::try_parse_from(["wholesale", "approve-order", "o-1", "--estimate", "3-5 days"])
                .unwrap();
        let Command::ApproveOrder { id, estimate } = cli.command else {
            panic!("expected approve-order");
        };
        assert_eq!(id, "o-1");
        assert_eq!(estimate.as_deref(), Some("3-5 days"));
    }

    #[test]
    fn parse_cart_add() {
        let cli = Cli::try_parse_from(["wholesale", "cart", "add", "p-1", "25"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Cart {
                action: CartCommand::Add { quantity: 25, .. }
            }
        ));
    }

    #[test]
    fn parse_cart_set_negative_quantity() {
        let cli = Cli::try_parse_from(["wholesale", "cart", "set", "p-1", "-1"]).unwrap();
        let Command::Cart {
            action: CartCommand::Set { product, quantity },
        } = cli.command
        else {
            panic!("expected cart set");
        };
        assert_eq!(product, "p-1");
        assert_eq!(quantity, -1);
    }

    #[test]
    fn parse_register_shop_with_negative_longitude() {
        let cli = Cli::try_parse_from([
            "wholesale",
            "register-shop",
            "--owner",
            "u-9",
            "--name",
            "Corner Market",
            "--location",
            "12 High St",
            "--latitude",
            "51.5",
            "--longitude",
            "-0.12",
        ])
        .unwrap();
        let Command::RegisterShop {
            owner,
            latitude,
            longitude,
            ..
        } = cli.command
        else {
            panic!("expected register-shop");
        };
        assert_eq!(owner, "u-9");
        assert_eq!(latitude, Some(51.5));
        assert_eq!(longitude, Some(-0.12));
    }

    #[test]
    fn parse_open_shop() {
        let cli = Cli::try_parse_from([
            "wholesale",
            "open-shop",
            "--name",
            "Kiosk",
            "--location",
            "Station",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::OpenShop { .. }));
    }

    #[test]
    fn parse_global_data_dir() {
        let cli =
            Cli::try_parse_from(["wholesale", "cart", "show", "--data-dir", "/tmp/cart"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/cart")));
    }

    #[test]
    fn lines_summary_joins_codes() {
        let mut unlabeled = test_line("X", 3);
        unlabeled.product = None;
        assert_eq!(
            lines_summary(&[test_line("BEV1", 10), unlabeled]),
            "BEV1 x10, ? x3"
        );
        assert_eq!(lines_summary(&[]), "");
    }

    #[test]
    fn money_has_two_decimals() {
        assert_eq!(money(2375.0), "2375.00");
        assert_eq!(money(0.125), "0.12");
    }

    #[test]
    fn print_products_table_empty() {
        print_products_table(&[]).unwrap();
    }

    #[test]
    fn print_products_table_with_data() {
        let mut uncategorized = test_product("p-2", "SN1");
        uncategorized.category = None;
        print_products_table(&[test_product("p-1", "BEV1"), uncategorized]).unwrap();
    }

    #[test]
    fn print_categories_table_with_data() {
        print_categories_table(&[]).unwrap();
        print_categories_table(&[Category {
            id: CategoryId::from("cat-1"),
            code: "BEV".to_owned(),
            name: "Beverages".to_owned(),
        }])
        .unwrap();
    }

    #[test]
    fn print_cart_with_discount() {
        let mut cart = Cart::new();
        let _added = cart.add(&test_product("p-1", "BEV1"), 300);
        let summary = cart.summary(wholesale_rs::pricing::DiscountPolicy::SubtotalThreshold);
        assert!(summary.discount_applied);
        print_cart(&cart, &summary).unwrap();
        print_cart(&Cart::new(), &summary).unwrap();
    }

    #[test]
    fn print_orders_tables() {
        print_shop_orders_table(&[]).unwrap();
        print_shop_orders_table(&[ShopOrder {
            order: test_order("o-1", OrderStatus::Approved),
            order_items: vec![test_line("BEV1", 10)],
        }])
        .unwrap();

        print_order_details_table(&[]).unwrap();
        print_order_details_table(&[OrderDetails {
            id: OrderId::from("o-2"),
            status: OrderStatus::Pending,
            total_amount: None,
            delivery_estimate: None,
            created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            shops: Some(OrderShopSummary {
                name: "Corner Store".to_owned(),
                location: "Main Street 1".to_owned(),
                profiles: None,
            }),
            order_items: vec![test_line("SN4", 60)],
        }])
        .unwrap();
    }

    #[test]
    fn print_submitted_order() {
        print_submitted(&SubmittedOrder {
            order: test_order("o-1", OrderStatus::Pending),
            items: Vec::new(),
            cart_saved: true,
        })
        .unwrap();
        print_submitted(&SubmittedOrder {
            order: test_order("o-2", OrderStatus::Pending),
            items: Vec::new(),
            cart_saved: false,
        })
        .unwrap();
    }

    #[test]
    fn print_shops_table_with_owner() {
        print_shops_table(&[]).unwrap();
        print_shops_table(&[
            ShopWithOwner {
                shop: test_shop("s-1", ShopStatus::Approved),
                owner: Some(OwnerProfile {
                    user_id: UserId::from("user-1"),
                    full_name: Some("Ada".to_owned()),
                    phone: Some("+94 77 000 0000".to_owned()),
                }),
            },
            ShopWithOwner {
                shop: test_shop("s-2", ShopStatus::Pending),
                owner: None,
            },
        ])
        .unwrap();
    }

    #[test]
    fn print_stats_for_both_roles() {
        print_stats(&DashboardStats::Admin(AdminStats {
            shops: 4,
            products: 20,
            pending_orders: 0,
            categories: 3,
        }))
        .unwrap();
        print_stats(&DashboardStats::BusinessOwner(OwnerStats {
            products: 20,
            orders: 2,
        }))
        .unwrap();
    }

    #[test]
    fn make_spinner_creates_spinner() {
        let spinner = make_spinner("Testing...");
        spinner.finish_and_clear();
    }

    #[test]
    fn cmd_cart_show_empty() {
        let store = offline_store();
        assert_eq!(cmd_cart(&store, CartCommand::Show).unwrap(), ExitCode::SUCCESS);
    }

    #[test]
    fn cmd_cart_set_and_clear() {
        let store = offline_store();
        let _cart = store.add_to_cart(&test_product("p-1", "BEV1"), 4).unwrap();
        let set = CartCommand::Set {
            product: "p-1".to_owned(),
            quantity: 12,
        };
        assert_eq!(cmd_cart(&store, set).unwrap(), ExitCode::SUCCESS);
        assert_eq!(store.cart().unwrap().item_count(), 12);

        let negative = CartCommand::Set {
            product: "p-1".to_owned(),
            quantity: -1,
        };
        assert_eq!(cmd_cart(&store, negative).unwrap(), ExitCode::SUCCESS);
        assert!(store.cart().unwrap().is_empty());
        let _cart = store.add_to_cart(&test_product("p-1", "BEV1"), 12).unwrap();

        let remove = CartCommand::Remove {
            product: "p-1".to_owned(),
        };
        assert_eq!(cmd_cart(&store, remove).unwrap(), ExitCode::SUCCESS);
        assert!(store.cart().unwrap().is_empty());

        assert_eq!(cmd_cart(&store, CartCommand::Clear).unwrap(), ExitCode::SUCCESS);
    }

    #[test]
    fn cmd_submit_empty_cart_fails() {
        let store = offline_store();
        assert_eq!(cmd_submit(&store).unwrap(), ExitCode::FAILURE);
    }

    #[test]
    fn cmd_stats_without_token_fails() {
        let store = offline_store();
        assert_eq!(cmd_stats(&store).unwrap(), ExitCode::FAILURE);
    }

    #[test]
    fn dispatch_admin_command_without_token_fails() {
        let store = offline_store();
        let command = Command::RejectOrder {
            id: "o-1".to_owned(),
        };
        assert_eq!(dispatch(&store, command).unwrap(), ExitCode::FAILURE);
    }

    #[test]
    fn dispatch_open_shop_without_token_fails() {
        let store = offline_store();
        let command = Command::OpenShop {
            name: "Kiosk".to_owned(),
            location: "Station".to_owned(),
        };
        assert_eq!(dispatch(&store, command).unwrap(), ExitCode::FAILURE);
    }

    #[test]
    fn order_update_reports_result() {
        let ok = cmd_order_update("approve order", || {
            Ok(test_order("o-1", OrderStatus::Approved))
        })
        .unwrap();
        assert_eq!(ok, ExitCode::SUCCESS);

        let failed = cmd_order_update("approve order", || {
            Err(WholesaleError::InvalidOrderTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Approved,
            })
        })
        .unwrap();
        assert_eq!(failed, ExitCode::FAILURE);
    }

    #[test]
    fn shop_update_reports_result() {
        let ok = cmd_shop_update("suspend shop", || Ok(test_shop("s-1", ShopStatus::Rejected)))
            .unwrap();
        assert_eq!(ok, ExitCode::SUCCESS);
        let failed = cmd_shop_update("suspend shop", || Err(WholesaleError::Unauthenticated))
            .unwrap();
        assert_eq!(failed, ExitCode::FAILURE);
    }
}
