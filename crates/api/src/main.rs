use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum_server::tls_rustls::RustlsConfig;
use clap::{Parser, Subcommand};
use sqlx::ConnectOptions;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

use api::routes;
use api::state::AppState;
use common::token::hash_password;
use common::{init_logging, settings::Settings};
use data::user::NewUser;
use repos::Repo;
use repos::user::UserRepo;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    #[arg(short = 'C', long, default_value = "config")]
    config_dir: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create a user account
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value_t = false)]
        admin: bool,
    },
}

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

struct AnnotatorApp {
    settings: Arc<Settings>,
    _guard: Option<WorkerGuard>,
}

impl AnnotatorApp {
    fn new(config_dir: &str) -> AppResult<Self> {
        let settings = Settings::with_config_dir(config_dir)?;
        let guard = init_logging(&settings.logger);

        Ok(Self {
            settings: Arc::new(settings),
            _guard: guard,
        })
    }

    async fn init_db(&self) -> AppResult<Repo> {
        let opts = SqliteConnectOptions::from_str(&self.settings.database.uri)?
            .foreign_keys(true)
            .log_statements(log::LevelFilter::Debug);

        let pool: SqlitePool = SqlitePoolOptions::new()
            .max_connections(self.settings.database.max_connections)
            .connect_with(opts)
            .await?;

        let repo = Repo::new(pool);
        repo.migrate().await?;
        Ok(repo)
    }

    async fn create_user(&self, username: &str, password: &str, is_admin: bool) -> AppResult<()> {
        let repo = self.init_db().await?;

        let password_hash = hash_password(password).map_err(|err| err.to_string())?;
        let user_id = UserRepo::create(
            &repo.pool,
            NewUser {
                username: username.to_string(),
                password_hash,
                is_admin,
            },
        )
        .await?;

        info!("Created user {} with id {}", username, user_id);
        Ok(())
    }

    async fn serve(&self) -> AppResult<()> {
        let server = &self.settings.server;
        info!("Starting server on {}:{}", server.host, server.port);

        let repo = self.init_db().await?;

        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let state = AppState {
            repo,
            settings: self.settings.clone(),
        };

        let routes_all = Router::new()
            .nest("/api", routes::routes(state.clone()).await)
            .layer(DefaultBodyLimit::max(server.max_upload_size))
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let addr: SocketAddr = format!("{}:{}", server.host, server.port).parse()?;

        match (&server.tls_cert, &server.tls_key) {
            (Some(cert), Some(key)) => {
                let config = RustlsConfig::from_pem_file(cert, key).await?;
                axum_server::bind_rustls(addr, config)
                    .serve(routes_all.into_make_service())
                    .await?;
            }
            _ => {
                axum_server::bind(addr)
                    .serve(routes_all.into_make_service())
                    .await?;
            }
        }

        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let app = match AnnotatorApp::new(&args.config_dir) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("Failed to load settings: {err}");
            std::process::exit(1);
        }
    };

    let result = match args.command.unwrap_or(Command::Serve) {
        Command::Serve => app.serve().await,
        Command::CreateUser {
            username,
            password,
            admin,
        } => app.create_user(&username, &password, admin).await,
    };

    if let Err(err) = result {
        error!("{}", err);
        std::process::exit(1);
    }
}
