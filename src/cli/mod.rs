use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};

use crate::application::{AppError, Ledger, RequestContext};
use crate::domain::{
    format_cents, parse_cents, AccountDraft, AccountId, AccountPatch, NewUser, TransactionDraft,
    TransferDraft, TransferId, UserId,
};

/// Librum - multi-user personal finance ledger
#[derive(Parser)]
#[command(name = "librum")]
#[command(about = "A personal finance ledger with double-entry transfers")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "librum.db")]
    pub database: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Register an account owner
    UserAdd {
        /// Display name
        name: String,

        /// Mail address (unique)
        #[arg(short, long)]
        mail: String,
    },

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Record a single transaction against an account
    Record {
        /// Amount (e.g. "50.00"); the sign is normalized to the type
        amount: String,

        /// Description of the entry
        #[arg(short, long)]
        description: String,

        /// Entry type: I (inflow) or O (outflow)
        #[arg(short, long)]
        r#type: String,

        /// Account id the entry belongs to
        #[arg(short, long)]
        account: AccountId,

        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Record the entry as pending instead of settled
        #[arg(long)]
        pending: bool,

        /// Acting user id
        #[arg(short, long)]
        user: UserId,
    },

    /// Transfer management commands
    #[command(subcommand)]
    Transfer(TransferCommands),

    /// Show per-account balances for a user
    Balance {
        /// Acting user id
        #[arg(short, long)]
        user: UserId,

        /// Print the report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create an account
    Add {
        /// Account name (unique per owner)
        name: String,

        /// Acting user id
        #[arg(short, long)]
        user: UserId,
    },

    /// List the user's accounts
    Ls {
        /// Acting user id
        #[arg(short, long)]
        user: UserId,
    },

    /// Rename an account
    Rename {
        /// Account id
        id: AccountId,

        /// New name
        name: String,

        /// Acting user id
        #[arg(short, long)]
        user: UserId,
    },

    /// Delete an account (refused while transactions reference it)
    Rm {
        /// Account id
        id: AccountId,

        /// Acting user id
        #[arg(short, long)]
        user: UserId,
    },
}

#[derive(Subcommand)]
pub enum TransferCommands {
    /// Record a transfer between two accounts
    Add {
        /// Amount to transfer (e.g. "200.00")
        amount: String,

        /// Source account id
        #[arg(long)]
        from: AccountId,

        /// Destination account id
        #[arg(long)]
        to: AccountId,

        /// Description of the transfer
        #[arg(short, long)]
        description: String,

        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Acting user id
        #[arg(short, long)]
        user: UserId,
    },

    /// List the user's transfers
    Ls {
        /// Acting user id
        #[arg(short, long)]
        user: UserId,
    },

    /// Edit a transfer, regenerating its transaction pair
    Edit {
        /// Transfer id
        id: TransferId,

        /// New amount
        amount: String,

        /// Source account id
        #[arg(long)]
        from: AccountId,

        /// Destination account id
        #[arg(long)]
        to: AccountId,

        /// Description of the transfer
        #[arg(short, long)]
        description: String,

        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Acting user id
        #[arg(short, long)]
        user: UserId,
    },

    /// Remove a transfer and its transaction pair
    Rm {
        /// Transfer id
        id: TransferId,

        /// Acting user id
        #[arg(short, long)]
        user: UserId,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        if let Commands::Init = self.command {
            Ledger::init(&self.database).await?;
            println!("Initialized database at {}", self.database);
            return Ok(());
        }

        let ledger = Ledger::connect(&self.database).await?;
        match self.execute(&ledger).await {
            Ok(()) => Ok(()),
            Err(err) => {
                // Same body the HTTP layer would send, on stderr.
                eprintln!("error: {}", err.payload().error);
                std::process::exit(1);
            }
        }
    }

    async fn execute(self, ledger: &Ledger) -> Result<(), AppError> {
        match self.command {
            Commands::Init => unreachable!("handled in run"),

            Commands::UserAdd { name, mail } => {
                let user = ledger.create_user(NewUser { name, mail }).await?;
                println!("Created user {} ({})", user.id, user.mail);
            }

            Commands::Account(cmd) => Self::execute_account(ledger, cmd).await?,

            Commands::Record {
                amount,
                description,
                r#type,
                account,
                date,
                pending,
                user,
            } => {
                // Routing-layer guard: the account must exist and be ours.
                ledger.accounts.check_ownership(account, user).await?;

                let draft = TransactionDraft {
                    description: Some(description),
                    transaction_type: Some(r#type),
                    date: Some(parse_cli_date(date.as_deref())?),
                    amount: Some(parse_cli_amount(&amount)?),
                    status: Some(!pending),
                    acc_id: account,
                    transfer_id: None,
                };
                let entry = ledger.transactions.save(draft).await?;
                println!(
                    "Recorded transaction {}: {} {} on account {}",
                    entry.id,
                    entry.transaction_type,
                    format_cents(entry.amount),
                    entry.acc_id
                );
            }

            Commands::Transfer(cmd) => Self::execute_transfer(ledger, cmd).await?,

            Commands::Balance { user, json } => {
                let ctx = RequestContext::new(user);
                let lines = ledger.balance.get_balance(ctx).await?;
                if json {
                    let body = serde_json::to_string_pretty(&lines)
                        .map_err(|err| AppError::Internal(err.into()))?;
                    println!("{body}");
                } else {
                    if lines.is_empty() {
                        println!("No settled transactions yet.");
                    }
                    for line in lines {
                        println!("account {:>6}  {:>14}", line.id, format_cents(line.sum));
                    }
                }
            }
        }

        Ok(())
    }

    async fn execute_account(ledger: &Ledger, cmd: AccountCommands) -> Result<(), AppError> {
        match cmd {
            AccountCommands::Add { name, user } => {
                let ctx = RequestContext::new(user);
                let account = ledger
                    .accounts
                    .save(ctx, AccountDraft { name: Some(name) })
                    .await?;
                println!("Created account {} ({})", account.id, account.name);
            }
            AccountCommands::Ls { user } => {
                let ctx = RequestContext::new(user);
                for account in ledger.accounts.find(ctx).await? {
                    println!("{:>6}  {}", account.id, account.name);
                }
            }
            AccountCommands::Rename { id, name, user } => {
                ledger.accounts.check_ownership(id, user).await?;
                let account = ledger
                    .accounts
                    .update(id, AccountPatch { name: Some(name) })
                    .await?;
                println!("Renamed account {} to {}", account.id, account.name);
            }
            AccountCommands::Rm { id, user } => {
                ledger.accounts.check_ownership(id, user).await?;
                ledger.accounts.remove(id).await?;
                println!("Deleted account {}", id);
            }
        }
        Ok(())
    }

    async fn execute_transfer(ledger: &Ledger, cmd: TransferCommands) -> Result<(), AppError> {
        match cmd {
            TransferCommands::Add {
                amount,
                from,
                to,
                description,
                date,
                user,
            } => {
                let ctx = RequestContext::new(user);
                let draft = TransferDraft {
                    description: Some(description),
                    date: Some(parse_cli_date(date.as_deref())?),
                    amount: Some(parse_cli_amount(&amount)?),
                    acc_ori_id: Some(from),
                    acc_dest_id: Some(to),
                };
                let transfer = ledger.transfers.save(ctx, draft).await?;
                println!(
                    "Transfer {}: {} from account {} to account {}",
                    transfer.id,
                    format_cents(transfer.amount),
                    transfer.acc_ori_id,
                    transfer.acc_dest_id
                );
            }
            TransferCommands::Ls { user } => {
                let ctx = RequestContext::new(user);
                for transfer in ledger.transfers.find(ctx).await? {
                    println!(
                        "{:>6}  {}  {} -> {}  {}",
                        transfer.id,
                        format_cents(transfer.amount),
                        transfer.acc_ori_id,
                        transfer.acc_dest_id,
                        transfer.description
                    );
                }
            }
            TransferCommands::Edit {
                id,
                amount,
                from,
                to,
                description,
                date,
                user,
            } => {
                let ctx = RequestContext::new(user);
                ledger.transfers.check_ownership(id, user).await?;
                let draft = TransferDraft {
                    description: Some(description),
                    date: Some(parse_cli_date(date.as_deref())?),
                    amount: Some(parse_cli_amount(&amount)?),
                    acc_ori_id: Some(from),
                    acc_dest_id: Some(to),
                };
                let transfer = ledger.transfers.update(ctx, id, draft).await?;
                println!("Updated transfer {}", transfer.id);
            }
            TransferCommands::Rm { id, user } => {
                ledger.transfers.check_ownership(id, user).await?;
                ledger.transfers.remove(id).await?;
                println!("Removed transfer {}", id);
            }
        }
        Ok(())
    }
}

fn parse_cli_amount(input: &str) -> Result<i64, AppError> {
    parse_cents(input).map_err(|err| AppError::Validation(err.to_string()))
}

fn parse_cli_date(input: Option<&str>) -> Result<DateTime<Utc>, AppError> {
    let Some(input) = input else {
        return Ok(Utc::now());
    };

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("dates must be in YYYY-MM-DD format".to_string()))?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| AppError::Validation("invalid date".to_string()))
}
