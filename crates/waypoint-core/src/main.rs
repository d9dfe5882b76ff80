use std::io::{BufRead, Write as _};
use std::sync::Arc;

use clap::{Arg, ArgAction, Command};
use tracing_subscriber::EnvFilter;

use waypoint_capability::{
    LanguageModel, MemorySideEffects, RuleBasedLanguageModel, StaticLocationLookup,
};
use waypoint_core::{PlanCompiler, Router, RouterConfig};
use waypoint_store::{ConversationStore, SessionId};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut cli = Command::new("waypoint")
        .version(waypoint_core::VERSION)
        .about("Conversational task router")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("chat")
                .about("Interactive chat loop against the built-in capabilities")
                .arg(
                    Arg::new("session")
                        .long("session")
                        .default_value("local")
                        .help("Session identifier for conversation history"),
                )
                .arg(
                    Arg::new("authenticated")
                        .long("authenticated")
                        .action(ArgAction::SetTrue)
                        .help("Attach a caller identity so posting tasks are allowed"),
                )
                .arg(
                    Arg::new("region")
                        .long("region")
                        .help("Default region hint for lookups"),
                ),
        )
        .subcommand(
            Command::new("ask")
                .about("Answer a single utterance and exit")
                .arg(Arg::new("utterance").required(true))
                .arg(
                    Arg::new("authenticated")
                        .long("authenticated")
                        .action(ArgAction::SetTrue)
                        .help("Attach a caller identity so posting tasks are allowed"),
                ),
        )
        .subcommand(
            Command::new("plan")
                .about("Show the work plan an utterance compiles to, without running it")
                .arg(Arg::new("utterance").required(true)),
        );

    let matches = cli.clone().get_matches();

    match matches.subcommand() {
        Some(("chat", args)) => {
            let session = SessionId::new(args.get_one::<String>("session").cloned().unwrap_or_else(|| "local".into()));
            let auth = args
                .get_flag("authenticated")
                .then(|| waypoint_capability::AuthToken::new("local-cli"));
            let region = args.get_one::<String>("region").cloned();

            let mut config = RouterConfig::new();
            if let Some(region) = region {
                config = config.with_default_region(region);
            }
            let router = build_router(config);

            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            println!("waypoint chat (Ctrl-D to quit)");
            loop {
                write!(stdout, "> ")?;
                stdout.flush()?;
                let mut line = String::new();
                if stdin.lock().read_line(&mut line)? == 0 {
                    break;
                }
                let utterance = line.trim();
                if utterance.is_empty() {
                    continue;
                }
                match router.respond(&session, utterance, auth.as_ref()).await {
                    Ok(response) => println!("{}\n", response.text),
                    Err(err) => eprintln!("error: {err}"),
                }
            }
        }
        Some(("ask", args)) => {
            let utterance = args
                .get_one::<String>("utterance")
                .cloned()
                .unwrap_or_default();
            let auth = args
                .get_flag("authenticated")
                .then(|| waypoint_capability::AuthToken::new("local-cli"));

            let router = build_router(RouterConfig::new());
            let response = router
                .respond(&SessionId::new("oneshot"), &utterance, auth.as_ref())
                .await?;
            println!("{}", response.text);
        }
        Some(("plan", args)) => {
            let utterance = args
                .get_one::<String>("utterance")
                .cloned()
                .unwrap_or_default();

            let model: Arc<dyn LanguageModel> = Arc::new(RuleBasedLanguageModel::new());
            let registry = Arc::new(waypoint_core::agents::default_registry(
                Arc::clone(&model),
                Arc::new(StaticLocationLookup::haman_sample()),
                Arc::new(MemorySideEffects::new()),
            ));
            let compiler = PlanCompiler::new(model, registry, RouterConfig::new());
            let history = waypoint_store::ConversationSnapshot::empty(SessionId::new("plan"));
            let plan = compiler.compile(&utterance, &history).await?;
            for task in plan.tasks() {
                println!("{}. {}", task.sequence_index + 1, task.kind.as_str());
            }
        }
        _ => {
            cli.print_help()?;
        }
    }

    Ok(())
}

fn build_router(config: RouterConfig) -> Router {
    let model: Arc<dyn LanguageModel> = Arc::new(RuleBasedLanguageModel::new());
    let registry = waypoint_core::agents::default_registry(
        Arc::clone(&model),
        Arc::new(StaticLocationLookup::haman_sample()),
        Arc::new(MemorySideEffects::new()),
    );
    Router::new(config, model, registry, Arc::new(ConversationStore::new()))
}
