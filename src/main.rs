use chrono::NaiveTime;
use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use dailysong::{
    cli::{self, AnnotateMode, Context},
    config::{self, AuthFlowKind, Config},
    error,
    types::TimeRange,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default())
        .placeholder(AnsiColor::BrightBlue.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Connect with Spotify
    Auth(AuthOptions),

    /// Forget the stored Spotify session
    Logout,

    /// Check the stored Spotify session
    Status,

    /// Show your top tracks
    Top(TopOptions),

    /// Show recently played tracks
    Recent(RecentOptions),

    /// Get your song recommendation
    Recommend(RecommendOptions),

    /// Save or show the phone number for daily songs
    Phone(PhoneOptions),

    /// Recommend a song every day at a fixed time
    Daily(DailyOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
#[command(args_conflicts_with_subcommands = true)]
pub struct AuthOptions {
    /// Redirect flow: `token` (fragment) or `code` (PKCE)
    #[clap(long)]
    pub flow: Option<AuthFlowKind>,

    #[command(subcommand)]
    pub command: Option<AuthSubcommand>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum AuthSubcommand {
    /// Finish authorization with a redirect URL copied from the browser
    Complete { redirect_url: String },
}

#[derive(Parser, Debug, Clone)]
pub struct TopOptions {
    /// Ranking window: short, medium or long
    #[clap(long, default_value = "medium")]
    pub window: TimeRange,

    /// Number of tracks (1-50)
    #[clap(long)]
    pub limit: Option<u32>,
}

#[derive(Parser, Debug, Clone)]
pub struct RecentOptions {
    #[clap(long, default_value_t = 20)]
    pub limit: u32,
}

#[derive(Parser, Debug, Clone)]
pub struct RecommendOptions {
    /// Ranking window the seeds are taken from
    #[clap(long, default_value = "medium")]
    pub window: TimeRange,

    /// How to explain the recommendation
    #[clap(long, value_enum, default_value_t = AnnotateMode::Features)]
    pub annotate: AnnotateMode,
}

#[derive(Parser, Debug, Clone)]
pub struct PhoneOptions {
    pub number: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct DailyOptions {
    /// Time of day (HH:MM), defaults to DAILY_AT
    #[clap(long, value_parser = parse_time)]
    pub at: Option<NaiveTime>,

    #[clap(long, default_value = "medium")]
    pub window: TimeRange,

    #[clap(long, value_enum, default_value_t = AnnotateMode::Features)]
    pub annotate: AnnotateMode,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

fn parse_time(value: &str) -> Result<NaiveTime, String> {
    config::parse_daily_at(value).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Command::Completions(opt) = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => error!("{}", e.user_message()),
    };
    let ctx = Context::from_config(config);

    match cli.command {
        Command::Auth(opt) => match opt.command {
            Some(AuthSubcommand::Complete { redirect_url }) => {
                cli::complete_auth(&ctx, &redirect_url).await
            }
            None => cli::auth(&ctx, opt.flow).await,
        },
        Command::Logout => cli::logout(&ctx).await,
        Command::Status => cli::status(&ctx).await,
        Command::Top(opt) => cli::top(&ctx, opt.window, opt.limit).await,
        Command::Recent(opt) => cli::recent(&ctx, opt.limit).await,
        Command::Recommend(opt) => cli::recommend(&ctx, opt.window, opt.annotate).await,
        Command::Phone(opt) => cli::phone(&ctx, opt.number).await,
        Command::Daily(opt) => cli::daily(&ctx, opt.at, opt.window, opt.annotate).await,
        Command::Completions(_) => {}
    }
}
