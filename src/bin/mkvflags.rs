use std::{
    env, fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use mkvflags::{
    BatchPropertyEditor, CancellationToken, DEFAULT_PATTERN, EditDirective, EditOptions,
    ErrorPolicy, FileOutcome, FilePattern, Mkvpropedit, ProgressCallback, ProgressInfo,
    PropertyEditor, RunReport, default_directives,
};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Edits applied to every file:\n  track:a1  flag-default=0\n  track:a3  flag-default=1\n  track:s1  flag-default=1\n\nExamples:\n  mkvflags\n  mkvflags /media/show/season-01 --dry-run\n  mkvflags . --keep-going --progress\n  mkvflags --select\n  mkvflags completions zsh > _mkvflags\n\nA directory literally named `completions` must be written as ./completions.";

const EXIT_INTERRUPTED: u8 = 130;

#[derive(Debug, Parser)]
#[command(
    name = "mkvflags",
    version,
    about = "Set default audio and subtitle tracks on every .mkv file in a directory",
    after_help = CLI_AFTER_HELP,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(flatten)]
    options: RunOptions,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Parser, Clone, Default)]
struct RunOptions {
    /// Directory containing the files to edit (defaults to the current directory).
    directory: Option<PathBuf>,

    /// Keep going after a file fails instead of stopping at the first failure.
    #[arg(long)]
    keep_going: bool,

    /// Print the commands that would run without running them.
    #[arg(long)]
    dry_run: bool,

    /// Editor binary to invoke.
    #[arg(long, default_value = mkvflags::MKVPROPEDIT)]
    tool: PathBuf,

    /// Print the run summary as JSON.
    #[arg(long)]
    json: bool,

    /// Choose which of the matched files to edit before running.
    #[arg(long, conflicts_with = "json")]
    select: bool,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,

    /// Show debug logging output.
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter),
    )
    .format_timestamp(None)
    .target(env_logger::Target::Stderr)
    .try_init();
}

fn policy_for(keep_going: bool) -> ErrorPolicy {
    if keep_going {
        ErrorPolicy::BestEffort
    } else {
        ErrorPolicy::FailFast
    }
}

fn exit_code_for(report: &RunReport) -> u8 {
    if report.interrupted {
        EXIT_INTERRUPTED
    } else if report.failures.is_empty() {
        0
    } else {
        1
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Per-file terminal output: a status line, a progress bar tick, or the
/// planned command in a dry run.
struct TerminalProgress {
    tool: Mkvpropedit,
    directives: Vec<EditDirective>,
    bar: Option<ProgressBar>,
}

impl TerminalProgress {
    fn print(&self, line: String) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => println!("{line}"),
        }
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let name = display_name(&info.file);
        match info.outcome {
            FileOutcome::Planned => {
                self.print(self.tool.command_line(&info.file, &self.directives));
            }
            FileOutcome::Edited => {
                self.print(format!("{} {name}", "edited".green().bold()));
            }
            FileOutcome::Failed => {
                self.print(format!("{} {name}", "failed".red().bold()));
            }
        }

        if let Some(bar) = &self.bar {
            bar.set_position(info.current);
            bar.set_message(name);
        }
    }
}

fn print_summary(
    report: &RunReport,
    directory: &Path,
    json: bool,
) -> Result<(), serde_json::Error> {
    if json {
        let payload = json!({
            "directory": directory.display().to_string(),
            "policy": report.policy.to_string(),
            "dry_run": report.dry_run,
            "interrupted": report.interrupted,
            "matched": report.matched_count(),
            "edited": report.edited.iter().map(|path| path.display().to_string()).collect::<Vec<_>>(),
            "failed": report.failures.iter().map(|failure| json!({
                "file": failure.file.display().to_string(),
                "cause": failure.cause.to_string(),
            })).collect::<Vec<_>>(),
            "not_attempted": report.not_attempted.iter().map(|path| path.display().to_string()).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    for failure in &report.failures {
        eprintln!(
            "{} {}: {}",
            "error:".red().bold(),
            failure.file.display(),
            failure.cause
        );
    }

    if report.matched_count() == 0 {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!("no files matching {DEFAULT_PATTERN} in {}", directory.display()).yellow()
        );
        return Ok(());
    }

    if report.interrupted {
        eprintln!(
            "{} {}",
            "interrupted:".yellow().bold(),
            format!("{} file(s) not attempted", report.not_attempted.len()).yellow()
        );
    } else if !report.not_attempted.is_empty() {
        eprintln!(
            "{} {}",
            "stopped:".yellow().bold(),
            format!(
                "{} file(s) not attempted (use --keep-going to continue past failures)",
                report.not_attempted.len()
            )
            .yellow()
        );
    }

    let verb = if report.dry_run { "Planned" } else { "Edited" };
    let summary = format!(
        "{verb} {}/{} file(s)",
        report.processed_count(),
        report.matched_count()
    );
    if report.is_success() {
        println!("{} {}", "success:".green().bold(), summary.green());
    } else {
        println!("{} {}", "done:".yellow().bold(), summary.yellow());
    }
    Ok(())
}

/// One line of input at the selection prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectionCommand {
    All,
    Clear,
    Invert,
    /// 1-based file number.
    Toggle(usize),
    Go,
    Quit,
}

fn parse_selection_command(value: &str) -> Option<SelectionCommand> {
    let value = value.trim().to_ascii_lowercase();
    match value.as_str() {
        "a" | "all" => Some(SelectionCommand::All),
        "n" | "none" => Some(SelectionCommand::Clear),
        "i" | "invert" => Some(SelectionCommand::Invert),
        "g" | "go" => Some(SelectionCommand::Go),
        "q" | "quit" => Some(SelectionCommand::Quit),
        number => number.parse::<usize>().ok().map(SelectionCommand::Toggle),
    }
}

/// Matched files and which of them are ticked. Everything starts ticked.
struct Selection {
    files: Vec<PathBuf>,
    selected: Vec<bool>,
}

impl Selection {
    fn new(files: Vec<PathBuf>) -> Self {
        let selected = vec![true; files.len()];
        Self { files, selected }
    }

    fn selected_count(&self) -> usize {
        self.selected.iter().filter(|ticked| **ticked).count()
    }

    /// Apply a list-changing command. `Go` and `Quit` are handled by the
    /// caller and leave the selection unchanged.
    fn apply(&mut self, command: SelectionCommand) -> Result<(), String> {
        match command {
            SelectionCommand::All => self.selected.fill(true),
            SelectionCommand::Clear => self.selected.fill(false),
            SelectionCommand::Invert => {
                for ticked in &mut self.selected {
                    *ticked = !*ticked;
                }
            }
            SelectionCommand::Toggle(number) => {
                let total = self.files.len();
                let ticked = number
                    .checked_sub(1)
                    .and_then(|index| self.selected.get_mut(index))
                    .ok_or_else(|| format!("Invalid number. Enter 1-{total}"))?;
                *ticked = !*ticked;
            }
            SelectionCommand::Go | SelectionCommand::Quit => {}
        }
        Ok(())
    }

    fn into_selected(self) -> Vec<PathBuf> {
        self.files
            .into_iter()
            .zip(self.selected)
            .filter_map(|(file, ticked)| ticked.then_some(file))
            .collect()
    }
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

fn print_selection(selection: &Selection, output: &mut impl Write) -> io::Result<()> {
    writeln!(output)?;
    writeln!(output, "Found {} file(s)", selection.files.len())?;
    for (index, (file, ticked)) in selection.files.iter().zip(&selection.selected).enumerate() {
        let mark = if *ticked { "[x]" } else { "[ ]" };
        let size = fs::metadata(file)
            .map(|metadata| format_size(metadata.len()))
            .unwrap_or_else(|_| "?".to_string());
        writeln!(output, "  {:2}. {mark} {} ({size})", index + 1, display_name(file))?;
    }
    writeln!(output)?;
    writeln!(
        output,
        "Selected: {}/{}",
        selection.selected_count(),
        selection.files.len()
    )?;
    writeln!(
        output,
        "Commands: [a]ll, [n]one, [i]nvert, <number> toggle, [g]o, [q]uit"
    )
}

/// Let the user tick files at a prompt. Returns `None` on quit or end of
/// input.
fn interactive_selection(
    files: Vec<PathBuf>,
    mut input: impl BufRead,
    mut output: impl Write,
) -> io::Result<Option<Vec<PathBuf>>> {
    let mut selection = Selection::new(files);
    loop {
        print_selection(&selection, &mut output)?;
        write!(output, "> ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(None);
        }

        match parse_selection_command(&line) {
            Some(SelectionCommand::Quit) => return Ok(None),
            Some(SelectionCommand::Go) if selection.selected_count() == 0 => {
                writeln!(output, "No files selected!")?;
            }
            Some(SelectionCommand::Go) => return Ok(Some(selection.into_selected())),
            Some(command) => {
                if let Err(message) = selection.apply(command) {
                    writeln!(output, "{message}")?;
                }
            }
            None => writeln!(output, "Unknown command")?,
        }
    }
}

fn run() -> Result<u8, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "mkvflags", &mut std::io::stdout());
        return Ok(0);
    }

    let options = cli.options;
    init_logging(options.verbose);

    let directory = match options.directory {
        Some(directory) => directory,
        None => env::current_dir()?,
    };
    let pattern = FilePattern::new(DEFAULT_PATTERN)?;
    let directives = default_directives();
    let tool = Mkvpropedit::with_program(&options.tool);

    if !options.dry_run {
        let version = tool.version()?;
        log::info!("Using {version}");
    }

    let planner = BatchPropertyEditor::new(&tool, EditOptions::new());
    let mut files = planner.plan(&directory, &pattern)?;
    if options.select && !files.is_empty() {
        match interactive_selection(files, io::stdin().lock(), io::stdout())? {
            Some(chosen) => files = chosen,
            None => {
                println!("Cancelled.");
                return Ok(0);
            }
        }
    }

    // Installed after selection so Ctrl-C at the prompt still ends the process.
    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || {
        if handler_token.is_cancelled() {
            std::process::exit(i32::from(EXIT_INTERRUPTED));
        }
        eprintln!(
            "{} {}",
            "interrupt:".yellow().bold(),
            "finishing the current file, press Ctrl-C again to abort".yellow()
        );
        handler_token.cancel();
    })?;

    let bar = if options.progress && !options.json {
        let bar = ProgressBar::new(files.len() as u64);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Some(bar)
    } else {
        None
    };

    let mut edit_options = EditOptions::new()
        .with_policy(policy_for(options.keep_going))
        .with_dry_run(options.dry_run)
        .with_cancellation(token);
    if !options.json {
        edit_options = edit_options.with_progress(Arc::new(TerminalProgress {
            tool: tool.clone(),
            directives: directives.clone(),
            bar: bar.clone(),
        }));
    }

    let editor = BatchPropertyEditor::new(&tool, edit_options);
    let report = editor.run_files(files, &directives)?;

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    print_summary(&report, &directory, options.json)?;
    Ok(exit_code_for(&report))
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code),
        Err(error) => {
            eprintln!("{} {error}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
