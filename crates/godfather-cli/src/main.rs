//! `godfather`: play The Godfather from a terminal.
//!
//! Every command restores the saved session first, then goes through the
//! same route guard as the app: signed-out players land on the login
//! screen, non-admins never reach the admin commands.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use godfather::prelude::*;
use godfather::protocol::{AssignRole, MoneyUpdate, ProtocolError, UpdateMoney};
use godfather::{DEFAULT_STATE_FILE, logging};

#[derive(Parser, Debug)]
#[command(name = "godfather", version, about = "Client for The Godfather office mafia game")]
struct Cli {
    /// Game server base URL.
    #[arg(long, env = "GODFATHER_API_URL", global = true)]
    api_url: Option<String>,

    /// Where the session and saved login are kept.
    #[arg(long, env = "GODFATHER_STATE_FILE", default_value = DEFAULT_STATE_FILE, global = true)]
    state_file: PathBuf,

    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in. Omitted fields come from the saved login.
    Login {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
        /// One of Godfather, Don, Caporegime, Detective, Merchant, Doctor, Citizen.
        #[arg(long)]
        role: Option<String>,
    },

    /// Sign out and forget the saved login.
    Logout,

    /// Show who is signed in.
    Status,

    /// Print the screen a path would show.
    Open { path: String },

    /// Print the navigation bar.
    Nav,

    /// Fetch and cache your profile.
    Profile,

    /// Top players by balance.
    Leaderboard {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },

    /// The news feed.
    News,

    /// List missions.
    Missions {
        /// Only today's missions.
        #[arg(long, conflicts_with = "day")]
        today: bool,
        /// Missions of one game day.
        #[arg(long)]
        day: Option<u32>,
    },

    /// Black market status and offers.
    Market,

    /// Buy a black market offer.
    Buy { offer_id: EntityId },

    /// Your family, or the named one.
    Family { name: Option<String> },

    /// Report yourself as eliminated.
    MarkDead,

    /// Game master commands.
    Admin {
        #[command(subcommand)]
        cmd: AdminCommand,
    },
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    /// Every player record.
    Players,

    /// Current day and unlock hours.
    GameState,

    /// Move the game to another day.
    SetDay { day: u32 },

    /// Hour (IST) at which the day's missions unlock.
    SetUnlockHour { hour: u32 },

    /// Add to (or, with a negative amount, take from) a player's balance.
    UpdateMoney {
        player_id: PlayerId,
        #[arg(long, allow_negative_numbers = true)]
        amount: f64,
        #[arg(long)]
        reason: Option<String>,
    },

    /// Give a player their role, family and starting balance.
    AssignRole {
        player_id: PlayerId,
        role: String,
        #[arg(long)]
        family: Option<String>,
        #[arg(long, default_value_t = 0.0)]
        balance: f64,
    },
}

impl Command {
    /// The screen a command belongs to. The guard decides whether the
    /// current player may see it; signed-in players never reach the login
    /// screen. The other session commands have none.
    fn route(&self) -> Option<Route> {
        match self {
            Self::Logout | Self::Status | Self::Open { .. } | Self::Nav => None,
            Self::Login { .. } => Some(Route::Login),
            Self::Profile | Self::News | Self::MarkDead => Some(Route::Dashboard),
            Self::Leaderboard { .. } => Some(Route::Leaderboard),
            Self::Missions { .. } => Some(Route::Missions),
            Self::Market | Self::Buy { .. } => Some(Route::Trade),
            Self::Family { .. } => Some(Route::Family),
            Self::Admin { .. } => Some(Route::Admin),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(if cli.verbose { "debug" } else { "warn" });

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            eprintln!("{}", err.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), GodfatherError> {
    let mut builder = GameClient::<FileStorage>::builder().state_file(cli.state_file);
    if let Some(url) = cli.api_url {
        builder = builder.api_url(url);
    }
    let client = builder.build()?;
    client.bootstrap().await?;

    if let Some(route) = cli.cmd.route() {
        let screen = client.navigate(route.path());
        if route.screen() != Some(screen) {
            tracing::debug!(%route, %screen, "redirected");
            println!("{screen}");
            return Ok(());
        }
    }

    let api = client.api();
    match cli.cmd {
        Command::Login {
            email,
            password,
            role,
        } => {
            let mut form = match client.saved_credentials()? {
                Some(saved) => LoginForm::prefilled(&saved),
                None => LoginForm::default(),
            };
            if let Some(email) = email {
                form.email = email;
            }
            if let Some(password) = password {
                form.password = password;
            }
            if let Some(role) = role {
                form.role = Some(Role::from(role.as_str()));
            }
            let session = client.login(&form).await?;
            let player = session.player();
            println!("signed in as {} ({})", player.name, player.effective_role());
        }
        Command::Logout => {
            client.logout()?;
            println!("signed out");
        }
        Command::Status => print_status(&client.state()),
        Command::Open { path } => println!("{}", client.navigate(&path)),
        Command::Nav => {
            for link in client.nav_links() {
                println!("{}\t{}", link.label, link.path());
            }
        }
        Command::Profile => print_json(&client.refresh_profile().await?)?,
        Command::Leaderboard { limit } => print_json(&api.leaderboard(limit).await?)?,
        Command::News => print_json(&api.news().await?)?,
        Command::Missions { today: true, .. } => print_json(&api.today_missions().await?)?,
        Command::Missions { day, .. } => print_json(&api.all_missions(day, false).await?)?,
        Command::Market => {
            let status = MarketStatus::now();
            match status.opens_in_minutes {
                None => println!("market: open"),
                Some(minutes) => println!("market: closed, opens in {minutes} min"),
            }
            print_json(&api.market_offers().await?)?;
        }
        Command::Buy { offer_id } => print_json(&api.purchase_offer(&offer_id).await?)?,
        Command::Family { name: None } => print_json(&api.my_family().await?)?,
        Command::Family { name: Some(name) } => print_json(&api.family(&name).await?)?,
        Command::MarkDead => print_json(&api.mark_dead().await?)?,
        Command::Admin { cmd } => match client.admin_api() {
            Some(admin) => run_admin(admin, cmd).await?,
            None => println!("{}", client.navigate(Route::Admin.path())),
        },
    }
    Ok(())
}

async fn run_admin(
    admin: &GameApi<godfather::Controller<FileStorage>>,
    cmd: AdminCommand,
) -> Result<(), GodfatherError> {
    match cmd {
        AdminCommand::Players => print_json(&admin.admin_players().await?),
        AdminCommand::GameState => print_json(&admin.game_state().await?),
        AdminCommand::SetDay { day } => print_json(&admin.set_game_day(day).await?),
        AdminCommand::SetUnlockHour { hour } => print_json(&admin.set_unlock_hour(hour).await?),
        AdminCommand::UpdateMoney {
            player_id,
            amount,
            reason,
        } => {
            let update: MoneyUpdate = admin
                .update_money(&UpdateMoney {
                    player_id,
                    amount,
                    reason,
                })
                .await?;
            println!(
                "{}: {} -> {}",
                update.player_name, update.old_balance, update.new_balance
            );
            Ok(())
        }
        AdminCommand::AssignRole {
            player_id,
            role,
            family,
            balance,
        } => {
            let body = AssignRole {
                player_id,
                role: Role::from(role.as_str()),
                family,
                balance,
            };
            print_json(&admin.assign_role(&body).await?)
        }
    }
}

fn print_status(state: &AuthState) {
    match state.session() {
        Some(session) => {
            let player = session.player();
            println!("signed in");
            println!("player: {} ({})", player.name, player.player_id);
            println!("role: {}", player.effective_role());
            println!("admin: {}", if session.is_admin() { "yes" } else { "no" });
        }
        None if state.is_loading() => println!("loading"),
        None => println!("signed out"),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), GodfatherError> {
    let text = serde_json::to_string_pretty(value).map_err(ProtocolError::Encode)?;
    println!("{text}");
    Ok(())
}
