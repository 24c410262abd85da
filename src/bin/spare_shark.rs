use std::{
    io::{self},
    path::PathBuf,
    process::ExitCode,
};

use clap::{Parser, Subcommand};
use time::{Date, Month, OffsetDateTime, macros::format_description};

use spare_shark::{
    App, Credentials, DatabaseLocation, Error, RegistrationProfile, SQLiteKeyValueStore,
    SimulatedAuthenticator, TransactionRecord, TransactionType, format_currency, setup_logging,
};

/// Track your expenses and income from the command line.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "SPARE_SHARK_DB", default_value = "spare_shark.db")]
    db_path: PathBuf,

    /// Also write debug logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and log in.
    Register {
        /// The display name.
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        /// Prompted for if not given.
        #[arg(long)]
        password: Option<String>,
    },
    /// Log in to an existing account.
    Login {
        #[arg(long)]
        email: String,
        /// Prompted for if not given.
        #[arg(long)]
        password: Option<String>,
    },
    /// Log out and forget the saved session.
    Logout,
    /// Show who is logged in.
    Whoami,
    /// Add an expense or income.
    Add {
        /// "expense" or "income".
        #[arg(long = "type")]
        kind: TransactionType,
        /// The amount of money. The sign is taken from the type.
        #[arg(long, allow_negative_numbers = true)]
        amount: f64,
        #[arg(long)]
        category: String,
        #[arg(long, default_value = "")]
        description: String,
        /// The date as YYYY-MM-DD. Defaults to today.
        #[arg(long, value_parser = parse_date)]
        date: Option<Date>,
    },
    /// List all transactions, newest first.
    List {
        /// Print the transactions as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Delete a transaction.
    Delete {
        /// The ID shown by `list`.
        id: String,
    },
    /// Manage your categories.
    #[command(subcommand)]
    Categories(CategoryCommand),
    /// Show the spending of a month by category.
    Chart {
        /// Defaults to the current year.
        #[arg(long)]
        year: Option<i32>,
        /// 1 to 12. Defaults to the current month.
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=12))]
        month: Option<u8>,
    },
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    /// List the expense and income categories.
    List,
    /// Add a category.
    Add {
        #[arg(long = "type")]
        kind: TransactionType,
        name: String,
    },
    /// Delete a category.
    Delete {
        #[arg(long = "type")]
        kind: TransactionType,
        name: String,
    },
}

type CliApp = App<SimulatedAuthenticator, SQLiteKeyValueStore>;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(error) = setup_logging(args.log_file.as_deref()) {
        print_error(format!("Could not open the log file: {error}"));
        return ExitCode::FAILURE;
    }

    let mut app = App::open(
        SimulatedAuthenticator::new(),
        DatabaseLocation::File(args.db_path),
    );

    let result = match app.start().await {
        Ok(_) => run(&mut app, args.command).await,
        Err(error) => Err(error),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            print_error(&error);
            ExitCode::FAILURE
        }
    }
}

async fn run(app: &mut CliApp, command: Command) -> Result<(), Error> {
    match command {
        Command::Register {
            username,
            email,
            password,
        } => {
            let password = password_or_prompt(password)?;
            let user = app
                .register(&RegistrationProfile {
                    username,
                    email,
                    password,
                })
                .await?;
            println!("Welcome, {}!", user.username);
        }
        Command::Login { email, password } => {
            let password = password_or_prompt(password)?;
            let user = app.log_in(&Credentials { email, password }).await?;
            println!("Logged in as {}.", user.username);
        }
        Command::Logout => {
            app.log_out()?;
            println!("Logged out.");
        }
        Command::Whoami => {
            let user = app.current_user()?;
            println!("{} <{}>", user.username, user.email);
        }
        Command::Add {
            kind,
            amount,
            category,
            description,
            date,
        } => {
            let date = date.unwrap_or_else(today);
            let builder =
                TransactionRecord::build(kind, amount, &category, date).description(&description);
            let record = app.add_transaction(builder).await?;
            println!("Added {} {}.", record.kind, record.id);
        }
        Command::List { json } => {
            let mut transactions = app.transactions()?.to_vec();
            transactions.sort_by(|a, b| b.date.cmp(&a.date));

            if json {
                println!("{}", serde_json::to_string_pretty(&transactions)?);
            } else {
                print_transactions(&transactions);
            }
        }
        Command::Delete { id } => {
            app.delete_transaction(&id).await?;
            println!("Deleted {id}.");
        }
        Command::Categories(CategoryCommand::List) => {
            let categories = app.categories()?;
            println!("expense: {}", categories.expense.join(", "));
            println!("income:  {}", categories.income.join(", "));
        }
        Command::Categories(CategoryCommand::Add { kind, name }) => {
            let categories = app.add_category(kind, &name)?;
            println!("{kind}: {}", categories.names(kind).join(", "));
        }
        Command::Categories(CategoryCommand::Delete { kind, name }) => {
            let categories = app.delete_category(kind, &name)?;
            println!("{kind}: {}", categories.names(kind).join(", "));
        }
        Command::Chart { year, month } => {
            let today = today();
            let month = match month {
                Some(month) => Month::try_from(month).unwrap_or(today.month()),
                None => today.month(),
            };
            let year = year.unwrap_or(today.year());

            print_chart(app, year, month)?;
        }
    }

    Ok(())
}

fn print_transactions(transactions: &[TransactionRecord]) {
    if transactions.is_empty() {
        println!("No transactions yet.");
        return;
    }

    for record in transactions {
        println!(
            "{}  {:<7}  {:>14}  {:<14}  {}  [{}]",
            record.date,
            record.kind,
            format_currency(record.amount),
            record.category,
            record.description,
            record.id
        );
    }
}

fn print_chart(app: &CliApp, year: i32, month: Month) -> Result<(), Error> {
    let breakdown = app.expense_breakdown(year, month)?;

    println!("{month} {year}");

    if breakdown.is_empty() {
        let years: Vec<String> = app
            .available_years()?
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("No expenses. Years with transactions: {}", years.join(", "));
        return Ok(());
    }

    for slice in &breakdown.slices {
        let share = breakdown.share(slice);
        let bar = "#".repeat((share * 40.0).round() as usize);

        println!(
            "{:<14} {:>14} {:>4.0}% {bar}",
            slice.name,
            format_currency(slice.value),
            share * 100.0
        );
    }

    println!("{:<14} {:>14}", "total", format_currency(breakdown.total));

    Ok(())
}

fn password_or_prompt(password: Option<String>) -> Result<String, Error> {
    if let Some(password) = password {
        return Ok(password);
    }

    match rpassword::prompt_password("Password: ") {
        Ok(password) => Ok(password),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
            Err(Error::MissingCredentials)
        }
        Err(error) => {
            print_error(format!("Could not read password from stdin: {error}"));
            Err(Error::MissingCredentials)
        }
    }
}

fn parse_date(text: &str) -> Result<Date, String> {
    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .map_err(|error| format!("expected a date like 2024-01-05: {error}"))
}

fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

fn print_error(error: impl ToString) {
    eprintln!("\x1b[31;1m{}\x1b[0m", error.to_string());
}
