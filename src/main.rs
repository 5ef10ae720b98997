use clap::Parser;
use mimalloc::MiMalloc;
use roster::config::Config;
use roster::console::{self, EditorSource};
use roster::{Database, Repository, SqlLogger, Student};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[command(name = "roster")]
#[command(about = "Open the students database and explore it from a console")]
#[command(version)]
struct Cli {
    /// Database URL, overrides ROSTER_DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,

    /// Bootstrap the schema and exit without starting the console
    #[arg(long)]
    no_console: bool,

    /// Execute a single console command and exit
    #[arg(short, long)]
    command: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // A bad setting stops startup before anything connects
    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_level(true)
                .with_target(false),
        )
        .init();

    let database_url = cli.database_url.as_deref().unwrap_or(&cfg.database_url);
    info!(
        database_url = %database_url,
        loglevel = %cfg.loglevel,
        interactive = cfg.interactive && !cli.no_console,
    );

    let db = Database::connect(database_url).await?;
    db.bootstrap().await?;

    // Everything from here on is mirrored to stdout
    let db = db.with_logger(SqlLogger::stdout());
    let students: Repository<Student> = Repository::new(db.clone());

    if let Some(input) = cli.command.as_deref() {
        let output = console::run_once(&students, input).await?;
        println!("=> {output}");
    } else if cli.no_console || !cfg.interactive {
        info!("console disabled; exiting");
    } else {
        let source = EditorSource::new(cfg.history_file.clone())?;
        console::enter(students, source, std::io::stdout()).await?;
    }

    db.close().await;
    Ok(())
}
