//! AlgoViz command line player
//!
//! Loads an animation config (or a built-in template), invokes one of its
//! functions and prints every step as it is played.

use std::path::PathBuf;
use std::time::Duration;

use algoviz_rs::{
    animation::AnimationObserver,
    config::{AnimationConfig, DisplayLine, PlaybackSettings},
    scripting::builtins,
    Animator,
};
use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "algoviz", version, about = "Play step-by-step algorithm animations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the built-in templates
    Templates,
    /// List the functions an animation declares
    Functions(SourceArgs),
    /// Invoke a function and play its steps
    Run(RunArgs),
    /// Write a built-in template to a config file
    Export {
        /// Template key or title
        template: String,
        /// Output path
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct SourceArgs {
    /// Animation config file (JSON)
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Built-in template key or title
    #[arg(long, short)]
    template: Option<String>,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// Function to invoke
    #[arg(long, short)]
    function: String,
    /// Parameter values, in declaration order
    #[arg(long = "arg", short = 'a')]
    args: Vec<String>,
    /// Playback settings file (TOML)
    #[arg(long, short)]
    settings: Option<PathBuf>,
    /// Delay between steps in milliseconds
    #[arg(long, short)]
    delay: Option<u64>,
    /// Play without waiting between steps
    #[arg(long)]
    instant: bool,
}

impl SourceArgs {
    fn load(&self) -> anyhow::Result<AnimationConfig> {
        match (&self.config, &self.template) {
            (Some(path), _) => AnimationConfig::load(path)
                .with_context(|| format!("loading config {}", path.display())),
            (None, Some(name)) => builtins::find(name)
                .map(AnimationConfig::from_template)
                .with_context(|| format!("no built-in template named '{}'", name)),
            (None, None) => bail!("either --config or --template is required"),
        }
    }
}

/// Prints each step next to its code line
struct StepPrinter {
    lines: Vec<DisplayLine>,
}

impl AnimationObserver for StepPrinter {
    fn on_step(&mut self, line: usize, comment: &str) {
        let code = self.lines.get(line).map(|l| l.code.as_str()).unwrap_or("");
        println!("{:>4} | {:<48} {}", line, code, comment);
    }

    fn on_finished(&mut self) {
        println!("done");
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,algoviz_rs=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Templates => {
            for template in builtins::all() {
                println!("{:<12} {} ({})", template.key, template.title, template.structure);
            }
        }
        Command::Functions(source) => {
            let config = source.load()?;
            let mut animator = Animator::default();
            animator.load_config(config)?;
            for function in animator.registry().iter() {
                let params: Vec<String> = function
                    .params
                    .iter()
                    .map(|p| format!("{}: {}", p.name, p.kind))
                    .collect();
                println!(
                    "{}({})  lines {}..={}",
                    function.name,
                    params.join(", "),
                    function.line_range.start,
                    function.line_range.end
                );
            }
        }
        Command::Export { template, output } => {
            let template = builtins::find(&template)
                .with_context(|| format!("no built-in template named '{}'", template))?;
            AnimationConfig::from_template(template).save(&output)?;
            tracing::info!("Wrote {} to {}", template.title, output.display());
        }
        Command::Run(args) => run(args)?,
    }
    Ok(())
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    let mut settings = match &args.settings {
        Some(path) => PlaybackSettings::load(path)?,
        None => PlaybackSettings::default(),
    };
    if let Some(delay) = args.delay {
        settings.step_delay_ms = delay;
    }

    let config = args.source.load()?;
    let mut printer = StepPrinter {
        lines: config.display_lines.clone(),
    };
    let mut animator = Animator::new(settings);
    animator.load_config(config)?;

    let inputs: Vec<&str> = args.args.iter().map(String::as_str).collect();
    animator.run(&args.function, &inputs)?;

    if args.instant {
        animator.run_to_end(&mut printer)?;
    } else {
        while animator.state().is_running() {
            let executor = animator.executor();
            let Some(due) = executor.next_tick_at() else {
                break;
            };
            let wait = due.saturating_sub(executor.clock_ms());
            std::thread::sleep(Duration::from_millis(wait));
            animator.advance_by(wait, &mut printer)?;
        }
    }

    if let Some(graph) = animator.graph() {
        let values: Vec<String> = graph.values().iter().map(|v| v.to_string()).collect();
        println!("[{}]", values.join(", "));
    }
    Ok(())
}
