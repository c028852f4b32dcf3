//! runspan - run-aware editing of Word documents
//!
//! Command-line front end for find/replace, highlight removal, splitting by
//! highlight colour, template profiles and setting extraction.

use anyhow::{Context as _, Result, bail};
use clap::{Args, Parser, Subcommand};
use runspan::edit::{
    EditContext, FindReplace, ParagraphRange, RemovalOptions, clear_highlighting,
    remove_highlighted, split_by_highlight,
};
use runspan::ooxml::docx::{Document, Package, WdColorIndex};
use runspan::profile::{Config, apply_profile};
use runspan::settings::{AspenOptions, SettingsLayout, extract_settings, merge_aspen, write_flat};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "runspan",
    version,
    about = "Run-aware find/replace and highlight-based content removal for Word documents",
    after_help = "EXAMPLES:\n  \
                  runspan find-replace calcs.docx --find 'OUT(\\d)01' --replace 'OUT${1}02'\n  \
                  runspan remove-highlight master.docx --color red --color cyan --clean-tables\n  \
                  runspan split master.docx\n  \
                  runspan apply-profile master.docx --config profiles.yaml --profile PP115-230E1A3A\n  \
                  runspan extract-settings calcs.docx --aspen-template export.txt"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also append log lines to this file
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Regex find & replace across run boundaries
    FindReplace(FindReplaceArgs),
    /// Remove content highlighted in the given colours
    RemoveHighlight(RemoveHighlightArgs),
    /// Remove highlighting in the given colours, keeping the text
    ClearHighlight(ClearHighlightArgs),
    /// Write one document per highlight colour in use
    Split(InputArgs),
    /// Apply configured profiles, one output document each
    ApplyProfile(ApplyProfileArgs),
    /// Extract settings to a flat text file
    ExtractSettings(ExtractSettingsArgs),
}

#[derive(Args)]
struct InputArgs {
    /// Input .docx document
    input: PathBuf,
}

#[derive(Args)]
struct OutputArgs {
    /// Output path (default: "<input> (modified).docx")
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct FindReplaceArgs {
    #[command(flatten)]
    input: InputArgs,
    #[command(flatten)]
    output: OutputArgs,

    /// Pattern to find (regex unless --literal)
    #[arg(short, long)]
    find: String,

    /// Replacement; `$1` and `${name}` refer to groups unless --literal
    #[arg(short, long)]
    replace: String,

    /// Treat both texts literally
    #[arg(long)]
    literal: bool,

    /// Stop after the paragraph holding this bookmark
    #[arg(long, value_name = "BOOKMARK")]
    until_bookmark: Option<String>,
}

#[derive(Args)]
struct RemoveHighlightArgs {
    #[command(flatten)]
    input: InputArgs,
    #[command(flatten)]
    output: OutputArgs,

    /// Highlight colour to remove (repeatable). Exact XML values win over
    /// names, so `green` is bright green and `GREEN` is dark green
    /// (`darkGreen`)
    #[arg(short, long = "color", required = true)]
    colors: Vec<WdColorIndex>,

    /// Delete rows and tables left empty
    #[arg(long)]
    clean_tables: bool,

    /// Also treat logic-table placeholder rows as empty (implies --clean-tables)
    #[arg(long)]
    logic_placeholders: bool,

    /// Extra regex for row texts treated as empty (implies --clean-tables)
    #[arg(long = "empty-row", value_name = "REGEX")]
    empty_rows: Vec<String>,
}

#[derive(Args)]
struct ClearHighlightArgs {
    #[command(flatten)]
    input: InputArgs,
    #[command(flatten)]
    output: OutputArgs,

    /// Highlight colour to clear (repeatable). Exact XML values win over
    /// names, so `green` is bright green and `GREEN` is dark green
    /// (`darkGreen`)
    #[arg(short, long = "color", required = true)]
    colors: Vec<WdColorIndex>,
}

#[derive(Args)]
struct ApplyProfileArgs {
    #[command(flatten)]
    input: InputArgs,

    /// YAML configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// Profile to apply (repeatable; default: all)
    #[arg(short, long = "profile")]
    profiles: Vec<String>,

    /// Directory for outputs (default: next to the input)
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Args)]
struct ExtractSettingsArgs {
    #[command(flatten)]
    input: InputArgs,

    /// YAML configuration with a `settings` section
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output path (default: "<input> settings.txt")
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Aspen database export to merge the settings into
    #[arg(long, value_name = "PATH")]
    aspen_template: Option<PathBuf>,

    /// Aspen import file (default: "<input> aspen.txt")
    #[arg(long, value_name = "PATH", requires = "aspen_template")]
    aspen_output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::FindReplace(args) => cmd_find_replace(args),
        Commands::RemoveHighlight(args) => cmd_remove_highlight(args),
        Commands::ClearHighlight(args) => cmd_clear_highlight(args),
        Commands::Split(args) => cmd_split(args),
        Commands::ApplyProfile(args) => cmd_apply_profile(args),
        Commands::ExtractSettings(args) => cmd_extract_settings(args),
    }
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            )
        },
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();
    Ok(())
}

/// Input path without its extension, used to derive output names.
fn base_of(input: &Path) -> PathBuf {
    input.with_extension("")
}

fn with_suffix(input: &Path, suffix: &str) -> PathBuf {
    let base = base_of(input);
    let name = base
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    base.with_file_name(format!("{}{}", name, suffix))
}

fn ensure_distinct(input: &Path, output: &Path) -> Result<()> {
    let same = match (input.canonicalize(), output.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => input == output,
    };
    if same {
        bail!("refusing to overwrite the input document {}", input.display());
    }
    Ok(())
}

fn open(input: &Path) -> Result<Package> {
    info!(path = %input.display(), "opening document");
    Package::open(input).with_context(|| format!("Failed to open {}", input.display()))
}

fn save(pkg: &Package, input: &Path, output: &Path) -> Result<()> {
    ensure_distinct(input, output)?;
    pkg.save(output)
        .with_context(|| format!("Failed to save {}", output.display()))?;
    info!(path = %output.display(), "saved");
    Ok(())
}

fn context_for(input: &Path) -> EditContext {
    EditContext::new(&input.display().to_string())
}

fn bookmark_range(doc: &Document, bookmark: Option<&str>) -> Result<ParagraphRange> {
    match bookmark {
        Some(name) => {
            let end = doc
                .bookmark_paragraph(name)
                .with_context(|| format!("Bookmark `{}` not found", name))?;
            Ok(ParagraphRange::until(end))
        },
        None => Ok(ParagraphRange::all()),
    }
}

fn cmd_find_replace(args: FindReplaceArgs) -> Result<()> {
    let input = &args.input.input;
    let output = args
        .output
        .output
        .unwrap_or_else(|| with_suffix(input, " (modified).docx"));

    let edit = if args.literal {
        FindReplace::literal(&args.find, &args.replace)?
    } else {
        FindReplace::new(&args.find, &args.replace)?
    };

    let mut pkg = open(input)?;
    let mut ctx = context_for(input);
    let range = bookmark_range(pkg.document(), args.until_bookmark.as_deref())?;
    edit.apply(pkg.document_mut(), range, &mut ctx)?;
    info!(stats = %ctx.stats(), "done");
    save(&pkg, input, &output)
}

fn cmd_remove_highlight(args: RemoveHighlightArgs) -> Result<()> {
    let input = &args.input.input;
    let output = args
        .output
        .output
        .unwrap_or_else(|| with_suffix(input, " (modified).docx"));

    let mut options = if args.empty_rows.is_empty() {
        RemovalOptions::new()
    } else {
        RemovalOptions::with_row_patterns(&args.empty_rows)?
    };
    if args.logic_placeholders {
        options
            .empty_row_patterns
            .extend(RemovalOptions::with_logic_placeholders().empty_row_patterns);
    }
    options.clean_tables |= args.clean_tables || args.logic_placeholders;

    let mut pkg = open(input)?;
    let mut ctx = context_for(input);
    for color in args.colors {
        remove_highlighted(pkg.document_mut(), color, &options, ParagraphRange::all(), &mut ctx);
    }
    info!(stats = %ctx.stats(), "done");
    save(&pkg, input, &output)
}

fn cmd_clear_highlight(args: ClearHighlightArgs) -> Result<()> {
    let input = &args.input.input;
    let output = args
        .output
        .output
        .unwrap_or_else(|| with_suffix(input, " (modified).docx"));

    let mut pkg = open(input)?;
    let mut ctx = context_for(input);
    for color in args.colors {
        clear_highlighting(pkg.document_mut(), color, ParagraphRange::all(), &mut ctx);
    }
    info!(stats = %ctx.stats(), "done");
    save(&pkg, input, &output)
}

fn cmd_split(args: InputArgs) -> Result<()> {
    let input = &args.input;
    let pkg = open(input)?;
    let mut ctx = context_for(input);

    let outputs = split_by_highlight(&pkg, &mut ctx);
    if outputs.is_empty() {
        info!("no highlighting found, nothing to split");
    }
    for (color, part) in &outputs {
        let output = with_suffix(input, &format!(" ({}).docx", color));
        save(part, input, &output)?;
    }
    Ok(())
}

fn cmd_apply_profile(args: ApplyProfileArgs) -> Result<()> {
    let input = &args.input.input;
    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load configuration {}", args.config.display()))?;

    let names: Vec<String> = if args.profiles.is_empty() {
        config.profiles().iter().map(|p| p.name.clone()).collect()
    } else {
        args.profiles
    };
    if names.is_empty() {
        bail!("no profiles configured in {}", args.config.display());
    }

    let source = open(input)?;
    let out_dir = match args.out_dir {
        Some(dir) => dir,
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };

    for name in &names {
        let profile = config
            .profile(name)
            .with_context(|| format!("Unknown profile `{}`", name))?;
        let mut pkg = source.clone();
        let mut ctx = EditContext::new(&format!("{} [{}]", input.display(), name));
        apply_profile(pkg.document_mut(), &config, name, &mut ctx)
            .with_context(|| format!("Failed to apply profile `{}`", name))?;
        let output = out_dir.join(format!("{}.docx", profile.output));
        save(&pkg, input, &output)?;
    }
    Ok(())
}

fn cmd_extract_settings(args: ExtractSettingsArgs) -> Result<()> {
    let input = &args.input.input;
    let output = args
        .output
        .unwrap_or_else(|| with_suffix(input, " settings.txt"));

    let config = match &args.config {
        Some(path) => Some(
            Config::load(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        ),
        None => None,
    };
    let default_layout;
    let (layout, aliases, aspen) = match &config {
        Some(config) => (
            config.settings_layout(),
            config.group_aliases().clone(),
            config.aspen().clone(),
        ),
        None => {
            default_layout = SettingsLayout::default();
            (&default_layout, BTreeMap::new(), AspenOptions::default())
        },
    };

    let pkg = open(input)?;
    let groups = extract_settings(pkg.document(), &layout);
    ensure_distinct(input, &output)?;
    std::fs::write(&output, write_flat(&groups, &aliases))
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(path = %output.display(), groups = groups.len(), "settings written");

    if let Some(template) = &args.aspen_template {
        let aspen_output = args
            .aspen_output
            .unwrap_or_else(|| with_suffix(input, " aspen.txt"));
        let text = std::fs::read_to_string(template)
            .with_context(|| format!("Failed to read Aspen export {}", template.display()))?;
        let merged = merge_aspen(&text, &groups, &aspen)
            .with_context(|| format!("Failed to merge into {}", template.display()))?;
        ensure_distinct(template, &aspen_output)?;
        std::fs::write(&aspen_output, merged)
            .with_context(|| format!("Failed to write {}", aspen_output.display()))?;
        info!(path = %aspen_output.display(), "Aspen import file written");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_color_help_explains_green() {
        let mut cmd = Cli::command();
        for name in ["remove-highlight", "clear-highlight"] {
            let help = cmd
                .find_subcommand_mut(name)
                .unwrap()
                .render_long_help()
                .to_string();
            assert!(help.contains("`GREEN` is dark green"), "{}", help);
        }
    }

    #[test]
    fn test_color_arguments() {
        let cli = Cli::try_parse_from([
            "runspan",
            "remove-highlight",
            "master.docx",
            "-c",
            "green",
            "--color",
            "GREEN",
        ])
        .unwrap();
        match cli.command {
            Commands::RemoveHighlight(args) => {
                assert_eq!(args.colors, vec![WdColorIndex::BrightGreen, WdColorIndex::Green])
            },
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_aspen_output_needs_template() {
        let err = Cli::try_parse_from(["runspan", "extract-settings", "calcs.docx", "--aspen-output", "out.txt"]);
        assert!(err.is_err());

        let cli = Cli::try_parse_from(["runspan", "extract-settings", "calcs.docx", "--aspen-template", "export.txt"])
            .unwrap();
        match cli.command {
            Commands::ExtractSettings(args) => {
                assert_eq!(args.aspen_template, Some(PathBuf::from("export.txt")));
                assert_eq!(args.aspen_output, None);
            },
            _ => panic!("wrong subcommand"),
        }
    }
}
