//! MS-Scooter support CLI - the portal's front end on the command line.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! ms-support migrate
//!
//! # Log in (any six digits are accepted)
//! ms-support login --phone 9876543210 --otp 123456
//!
//! # Ask a predefined question, with a photo attached
//! ms-support support ask --category battery --question 2 --attach photo.jpg
//!
//! # Place an order, then ask about it
//! ms-support orders place --model ms_sport --address "1 Main St" --city Springfield \
//!     --postal-code 12345 --phone 9876543210
//! ms-support orders inquiry MS-20260101-000001
//!
//! # Work in a second "tab" with its own session cache
//! ms-support --tab other whoami
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `login` / `logout` / `whoami` - Phone login and the ambient identity
//! - `support` - Browse the question catalog and submit support requests
//! - `tickets` - List submitted tickets
//! - `orders` - Place, list and ask about orders
//! - `profile` - Show and edit the profile
//! - `questions` - Manage the predefined question catalog

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use scooter_support_portal::config::PortalConfig;
use scooter_support_portal::telemetry;

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "ms-support")]
#[command(author, version, about = "MS-Scooter support portal")]
struct Cli {
    /// Tab name; each tab keeps its own session cache
    #[arg(long, global = true, env = "MS_SUPPORT_TAB", default_value = "default")]
    tab: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Log in with a phone number and passcode
    Login {
        /// Mobile number, 10 to 15 digits
        #[arg(short, long)]
        phone: String,

        /// Six-digit passcode
        #[arg(short, long)]
        otp: String,
    },
    /// Sign out of this device's session
    Logout,
    /// Show the identity this tab is acting as
    Whoami,
    /// Browse questions and submit support requests
    Support {
        #[command(subcommand)]
        action: SupportAction,
    },
    /// Submitted support tickets
    Tickets {
        #[command(subcommand)]
        action: TicketsAction,
    },
    /// Scooter orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// The customer profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Manage the predefined question catalog
    Questions {
        #[command(subcommand)]
        action: QuestionsAction,
    },
}

#[derive(Subcommand)]
enum SupportAction {
    /// Show the question catalog
    Questions,
    /// Submit a support request
    Ask(AskArgs),
}

#[derive(Args)]
struct AskArgs {
    /// Category (`battery`, `mechanical`, `safety`, `general`)
    #[arg(short, long, default_value = "")]
    category: String,

    /// Pick the Nth catalog question of the category (1-based)
    #[arg(short, long)]
    question: Option<usize>,

    /// Title (overrides the pre-filled one)
    #[arg(short, long)]
    title: Option<String>,

    /// Description (overrides the pre-filled one)
    #[arg(short, long)]
    description: Option<String>,

    /// Priority (`low`, `medium`, `high`, `urgent`)
    #[arg(short, long)]
    priority: Option<String>,

    /// File to attach
    #[arg(short, long)]
    attach: Option<PathBuf>,
}

#[derive(Subcommand)]
enum TicketsAction {
    /// List your tickets, newest first
    List,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Place an order
    Place {
        /// Model (`ms_classic`, `ms_sport`, `ms_electric`, `ms_premium`)
        #[arg(short, long)]
        model: String,

        /// Quantity, 1 to 10
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Delivery street address
        #[arg(long)]
        address: String,

        /// Delivery city
        #[arg(long)]
        city: String,

        /// Delivery postal code
        #[arg(long)]
        postal_code: String,

        /// Contact phone for delivery
        #[arg(long)]
        phone: String,

        /// Delivery notes
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// List your orders, newest first
    List,
    /// Open a support request about an order
    Inquiry {
        /// Order number, e.g. `MS-20260101-000001`
        order_number: String,

        /// Priority (`low`, `medium`, `high`, `urgent`)
        #[arg(short, long)]
        priority: Option<String>,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Show your profile
    Show,
    /// Update display name and phone; omitted or blank values are cleared
    Update {
        /// Display name
        #[arg(short, long)]
        name: Option<String>,

        /// Mobile number
        #[arg(short, long)]
        phone: Option<String>,
    },
}

#[derive(Subcommand)]
enum QuestionsAction {
    /// List stored questions
    List,
    /// Add a question
    Add(QuestionArgs),
    /// Replace a question
    Update {
        /// Question id
        id: String,

        #[command(flatten)]
        question: QuestionArgs,
    },
    /// Delete a question
    Delete {
        /// Question id
        id: String,
    },
}

#[derive(Args)]
struct QuestionArgs {
    /// Category id, e.g. `battery`
    #[arg(long)]
    category: String,

    /// Category title
    #[arg(long)]
    category_title: String,

    /// Category description
    #[arg(long, default_value = "")]
    category_description: String,

    /// Category icon name
    #[arg(long, default_value = "")]
    icon: String,

    /// Question text
    #[arg(long)]
    text: String,
}

#[tokio::main]
async fn main() {
    let config = match PortalConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Configuration error: {e}");
            }
            std::process::exit(2);
        }
    };

    let _telemetry = telemetry::init(&config);

    let cli = Cli::parse();

    if let Err(e) = run(cli, config).await {
        e.report();
        #[allow(clippy::print_stderr)]
        {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: PortalConfig) -> Result<(), CliError> {
    if matches!(cli.command, Commands::Migrate) {
        return commands::migrate::run(&config).await;
    }

    let portal = commands::connect(config, &cli.tab).await?;

    match cli.command {
        Commands::Migrate => {}
        Commands::Login { phone, otp } => commands::auth::login(&portal, &phone, &otp).await?,
        Commands::Logout => commands::auth::logout(&portal).await?,
        Commands::Whoami => commands::auth::whoami(&portal).await?,
        Commands::Support { action } => match action {
            SupportAction::Questions => commands::support::questions(&portal).await?,
            SupportAction::Ask(args) => {
                let request = commands::support::AskRequest {
                    category: args.category,
                    question: args.question,
                    title: args.title,
                    description: args.description,
                    priority: args.priority,
                    attach: args.attach,
                };
                commands::support::ask(&portal, request).await?;
            }
        },
        Commands::Tickets { action } => match action {
            TicketsAction::List => commands::support::list_tickets(&portal).await?,
        },
        Commands::Orders { action } => match action {
            OrdersAction::Place {
                model,
                quantity,
                address,
                city,
                postal_code,
                phone,
                notes,
            } => {
                let form = scooter_support_portal::models::OrderForm {
                    model,
                    quantity,
                    delivery_address: address,
                    delivery_city: city,
                    delivery_postal_code: postal_code,
                    delivery_phone: phone,
                    notes,
                };
                commands::orders::place(&portal, &form).await?;
            }
            OrdersAction::List => commands::orders::list(&portal).await?,
            OrdersAction::Inquiry {
                order_number,
                priority,
            } => commands::orders::inquiry(&portal, &order_number, priority).await?,
        },
        Commands::Profile { action } => match action {
            ProfileAction::Show => commands::profile::show(&portal).await?,
            ProfileAction::Update { name, phone } => {
                commands::profile::update(&portal, name.as_deref(), phone.as_deref()).await?;
            }
        },
        Commands::Questions { action } => match action {
            QuestionsAction::List => commands::questions::list(&portal).await?,
            QuestionsAction::Add(args) => {
                commands::questions::add(&portal, args.into()).await?;
            }
            QuestionsAction::Update { id, question } => {
                commands::questions::update(&portal, &id, question.into()).await?;
            }
            QuestionsAction::Delete { id } => commands::questions::delete(&portal, &id).await?,
        },
    }
    Ok(())
}

impl From<QuestionArgs> for scooter_support_portal::models::QuestionInput {
    fn from(args: QuestionArgs) -> Self {
        Self {
            category_id: args.category,
            category_title: args.category_title,
            category_description: args.category_description,
            category_icon: args.icon,
            question_text: args.text,
        }
    }
}
