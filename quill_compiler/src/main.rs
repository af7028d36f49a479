//! CLI entry point for quill.
//!
//! ```text
//! quill assemblage catalog/molecules/door-frame.md
//! quill act docs/act-1.md --format ron --out build/act-1.ron
//! quill catalog catalog/ --check-compositions
//! quill lint catalog/ --deny-warnings
//! quill section docs/act-1.md "Scene 2" --fuzzy
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use quill_compiler::{
    CompilerConfig, compile_act_script_with, extract_frontmatter, extract_section, extract_section_fuzzy,
    load_catalog, load_config, parse_assemblage_markdown, resolve_compositions,
};
use quill_data::{validate_assemblage, validate_scene};
use regex::Regex;
use serde::Serialize;

#[derive(Parser)]
#[command(author, version, about = "Compile Markdown design documents into game data.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a single assemblage catalog file.
    Assemblage(AssemblageArgs),
    /// Compile an act script into scene records.
    Act(ActArgs),
    /// Compile every assemblage under a catalog directory.
    Catalog(CatalogArgs),
    /// Validate a catalog directory and report problems.
    Lint(LintArgs),
    /// Print the text under a heading.
    Section(SectionArgs),
}

#[derive(Args)]
struct OutputOptions {
    /// Write output here instead of stdout.
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
    /// Serialization format.
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,
}

#[derive(Args)]
struct AssemblageArgs {
    /// Catalog Markdown file.
    file: PathBuf,
    #[command(flatten)]
    output: OutputOptions,
}

#[derive(Args)]
struct ActArgs {
    /// Act script Markdown file.
    file: PathBuf,
    /// Act number (defaults to the first number in the file name, else 1).
    #[arg(long)]
    act: Option<u32>,
    /// TOML file with extra map names and level ranges.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(flatten)]
    output: OutputOptions,
}

#[derive(Args)]
struct CatalogArgs {
    /// Catalog root directory.
    dir: PathBuf,
    /// Fail if compositions form a cycle.
    #[arg(long)]
    check_compositions: bool,
    #[command(flatten)]
    output: OutputOptions,
}

#[derive(Args)]
struct LintArgs {
    /// Catalog root directory.
    dir: PathBuf,
    /// Exit with an error if any problem is found.
    #[arg(long)]
    deny_warnings: bool,
}

#[derive(Args)]
struct SectionArgs {
    /// Markdown file.
    file: PathBuf,
    /// Heading text to look for.
    heading: String,
    /// Allow substring and keyword matches.
    #[arg(long)]
    fuzzy: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Ron,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Assemblage(args) => assemblage(&args),
        Commands::Act(args) => act(&args),
        Commands::Catalog(args) => catalog(&args),
        Commands::Lint(args) => lint(&args),
        Commands::Section(args) => section(&args),
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading '{}'", path.display()))
}

fn emit<T: Serialize>(value: &T, output: &OutputOptions) -> Result<()> {
    let text = match output.format {
        Format::Json => serde_json::to_string_pretty(value).context("serializing JSON")?,
        Format::Ron => {
            ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default()).context("serializing RON")?
        },
    };
    match &output.out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).with_context(|| format!("creating '{}'", parent.display()))?;
            }
            fs::write(path, text).with_context(|| format!("writing '{}'", path.display()))?;
            info!("wrote '{}'", path.display());
        },
        None => println!("{text}"),
    }
    Ok(())
}

fn assemblage(args: &AssemblageArgs) -> Result<()> {
    let text = read(&args.file)?;
    let parsed = parse_assemblage_markdown(&text, &args.file)
        .with_context(|| format!("compiling '{}'", args.file.display()))?;
    for problem in validate_assemblage(&parsed.definition) {
        warn!("{}: {problem}", args.file.display());
    }
    emit(&parsed, &args.output)
}

/// First run of digits in the file stem (`act-2.md` -> 2).
fn act_number_from_path(path: &Path) -> Option<u32> {
    let stem = path.file_stem()?.to_str()?;
    let digits = Regex::new(r"\d+").ok()?;
    digits.find(stem)?.as_str().parse().ok()
}

fn act(args: &ActArgs) -> Result<()> {
    let text = read(&args.file)?;
    let act = args.act.or_else(|| act_number_from_path(&args.file)).unwrap_or(1);
    let config = args
        .config
        .as_deref()
        .map_or_else(CompilerConfig::default, load_config);
    let script = compile_act_script_with(&text, act, &config);
    for scene in &script.scenes {
        for problem in validate_scene(scene) {
            warn!("{}: {problem}", scene.id);
        }
    }
    emit(&script, &args.output)
}

fn catalog(args: &CatalogArgs) -> Result<()> {
    let catalog = load_catalog(&args.dir).with_context(|| format!("loading catalog '{}'", args.dir.display()))?;
    if args.check_compositions {
        resolve_compositions(&catalog).context("checking compositions")?;
    }
    emit(&catalog.entries, &args.output)
}

fn lint(args: &LintArgs) -> Result<()> {
    let catalog = load_catalog(&args.dir).with_context(|| format!("loading catalog '{}'", args.dir.display()))?;
    let mut problems: Vec<String> = Vec::new();

    for overwrite in &catalog.overwritten {
        problems.push(format!(
            "id '{}' in '{}' is replaced by '{}'",
            overwrite.id,
            overwrite.replaced.display(),
            overwrite.by.display()
        ));
    }
    for (id, parsed) in &catalog.entries {
        for problem in validate_assemblage(&parsed.definition) {
            problems.push(format!("{id} ({}): {problem}", parsed.file_path));
        }
    }
    match resolve_compositions(&catalog) {
        Ok(graph) => {
            for dangling in &graph.dangling {
                problems.push(format!(
                    "{}: composes missing '{}' (looked for '{}')",
                    dangling.from,
                    dangling.link,
                    dangling.resolved.display()
                ));
            }
        },
        Err(e) => problems.push(e.to_string()),
    }

    for problem in &problems {
        println!("warning: {problem}");
    }
    println!("{} assemblages checked, {} problems", catalog.len(), problems.len());
    if args.deny_warnings && !problems.is_empty() {
        bail!("lint found {} problems", problems.len());
    }
    Ok(())
}

fn section(args: &SectionArgs) -> Result<()> {
    let text = read(&args.file)?;
    let body = extract_frontmatter(&text)
        .with_context(|| format!("parsing frontmatter of '{}'", args.file.display()))?
        .body;
    let found = if args.fuzzy {
        extract_section_fuzzy(body, &args.heading)
    } else {
        extract_section(body, &args.heading, None)
    };
    match found {
        Some(text) => {
            println!("{}", text.trim_end());
            Ok(())
        },
        None => bail!("no heading matching '{}' in '{}'", args.heading, args.file.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn act_number_comes_from_file_name() {
        assert_eq!(act_number_from_path(Path::new("docs/act-2-the-mill.md")), Some(2));
        assert_eq!(act_number_from_path(Path::new("docs/act10.md")), Some(10));
        assert_eq!(act_number_from_path(Path::new("docs/prologue.md")), None);
    }
}
