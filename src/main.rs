use clap::Parser;
use site_prompt::crawlers::{PageController, SnapshotController, WebDriverController};
use site_prompt::inspector::dom::PageSnapshot;
use site_prompt::notify::LogNotifier;
use site_prompt::store::JsonFileStore;
use site_prompt::{App, AppConfig, AppError, Command, Outcome, PromptSource};
use std::error::Error;
use std::io::Read;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

mod args;
use args::{Args, CommandArg, convert_scope};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match AppConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                ::log::error!("Failed to load config from {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => AppConfig::default(),
    }
    .apply_env();
    if let Some(webdriver_url) = args.webdriver {
        config.webdriver_url = webdriver_url;
    }

    let cancel = CancellationToken::new();
    let signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ::log::warn!("Interrupted, stopping");
            signal.cancel();
        }
    });

    let command = args.command;
    let result = if command.needs_browser() {
        run_in_browser(command, config, &cancel).await
    } else {
        let controller = match &command {
            CommandArg::Page {
                file: Some(path),
                base_url: Some(base_url),
                ..
            } => match std::fs::read_to_string(path) {
                Ok(html) => SnapshotController::new(PageSnapshot::new(base_url.as_str(), html)),
                Err(e) => {
                    ::log::error!("Failed to read {}: {}", path.display(), e);
                    std::process::exit(1);
                }
            },
            _ => SnapshotController::blank(),
        };
        let mut app = build_app(controller, config);
        run(&mut app, command, &cancel).await
    };

    if let Err(e) = result {
        match e.downcast_ref::<AppError>() {
            Some(app_error) => {
                ::log::error!("{}", app_error);
                eprintln!("{}", app_error.user_message());
            }
            None => eprintln!("Error: {}", e),
        }
        std::process::exit(1);
    }
}

fn build_app<C: PageController>(controller: C, config: AppConfig) -> App<C> {
    let store = Arc::new(JsonFileStore::new(&config.store_path));
    App::new(controller, store, Box::new(LogNotifier), config)
}

async fn run_in_browser(
    command: CommandArg,
    config: AppConfig,
    cancel: &CancellationToken,
) -> Result<(), Box<dyn Error>> {
    let controller = match WebDriverController::connect(&config.webdriver_url).await {
        Ok(controller) => controller,
        Err(e) => {
            eprintln!("Note: this command requires a WebDriver server (e.g., ChromeDriver).");
            eprintln!(
                "Set WEBDRIVER_URL or pass --webdriver if not using {}",
                config.webdriver_url
            );
            return Err(AppError::from(e).into());
        }
    };
    if let Some(url) = command.url() {
        if let Err(e) = controller.navigate(url).await {
            controller.shutdown().await;
            return Err(AppError::from(e).into());
        }
    }

    let mut app = build_app(controller, config);
    let result = run(&mut app, command, cancel).await;
    app.into_controller().shutdown().await;
    result
}

async fn run<C: PageController>(
    app: &mut App<C>,
    command: CommandArg,
    cancel: &CancellationToken,
) -> Result<(), Box<dyn Error>> {
    match command {
        CommandArg::Page { json, quick, .. } => {
            let command = if quick {
                Command::QuickPage
            } else {
                Command::ExtractPage
            };
            let outcome = app.dispatch(command, cancel).await?;
            if json {
                if let Some(PromptSource::Site(site)) = app.state().source() {
                    println!("{}", serde_json::to_string_pretty(site.primary())?);
                }
            } else {
                print_outcome(outcome)?;
            }
        }
        CommandArg::Crawl { json, .. } => {
            let outcome = app.dispatch(Command::Crawl, cancel).await?;
            if json {
                if let Some(PromptSource::Site(site)) = app.state().source() {
                    println!("{}", serde_json::to_string_pretty(site)?);
                }
            } else {
                print_outcome(outcome)?;
            }
        }
        CommandArg::Selection {
            selector, quick, ..
        } => {
            let command = if quick {
                Command::QuickSelection
            } else {
                Command::ExtractSelection { selector }
            };
            print_outcome(app.dispatch(command, cancel).await?)?;
        }
        CommandArg::Visible { .. } => {
            print_outcome(app.dispatch(Command::ExtractVisible, cancel).await?)?;
        }
        CommandArg::Capture { rect, .. } => {
            print_outcome(app.dispatch(Command::Capture { rect }, cancel).await?)?;
        }
        CommandArg::Pickup => {
            print_outcome(app.dispatch(Command::PickupCapture, cancel).await?)?;
        }
        CommandArg::Image { path, analyze } => {
            let image = std::fs::read(&path)?;
            let command = Command::Mockup {
                image,
                analyze: analyze.map(convert_scope),
            };
            print_outcome(app.dispatch(command, cancel).await?)?;
        }
        CommandArg::ImageUrl { src } => {
            print_outcome(app.dispatch(Command::ImageUrl { src }, cancel).await?)?;
        }
        CommandArg::Options { set } => {
            for (key, value) in set {
                app.dispatch(Command::SetOption { key, value }, cancel)
                    .await?;
            }
            print_outcome(app.dispatch(Command::ShowOptions, cancel).await?)?;
        }
        CommandArg::Deliver { prompt_file } => {
            let prompt = match prompt_file {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut prompt = String::new();
                    std::io::stdin().read_to_string(&mut prompt)?;
                    prompt
                }
            };
            app.dispatch(Command::Edit { prompt }, cancel).await?;
            print_outcome(app.dispatch(Command::Deliver, cancel).await?)?;
        }
    }
    Ok(())
}

fn print_outcome(outcome: Outcome) -> Result<(), Box<dyn Error>> {
    match outcome {
        Outcome::Prompt(prompt) => println!("{}", prompt),
        Outcome::Visible(visible) => println!("{}", serde_json::to_string_pretty(&visible)?),
        Outcome::Captured(rect) => println!(
            "Captured {}×{} region at {},{}. Run `site-prompt pickup` to use it.",
            rect.width, rect.height, rect.x, rect.y
        ),
        Outcome::NothingPending => println!("No screenshot is waiting to be used."),
        Outcome::Options(options) => println!("{}", serde_json::to_string_pretty(&options)?),
        Outcome::Delivery(url) => println!("{}", url),
    }
    Ok(())
}
