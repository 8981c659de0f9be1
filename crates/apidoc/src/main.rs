use anyhow::{Context, Result, bail};
use clap::Parser;
use libapidoc::{ApiDoc, DeclarationIndex, RenderConfig, highlight_markdown};
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Page templates to render. Pages call converters such as
    /// `{{ auto_module("pkg.mod") }}`
    pages: Vec<PathBuf>,

    /// Declaration index (JSON)
    #[arg(long, env = "APIDOC_INDEX")]
    index: PathBuf,

    /// Render configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Render a whole module by dotted path, without a page template
    #[arg(long = "module", value_name = "PATH")]
    modules: Vec<String>,

    /// Write each rendered page into this directory instead of stdout
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Execute code examples in docstrings and insert their output
    #[arg(long, default_value_t = false)]
    execute_examples: bool,

    /// Fail on modules that do not declare an export list
    #[arg(long, default_value_t = false)]
    strict_exports: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "APIDOC_LOG_LEVEL")]
    log_level: Option<String>,

    /// Colorize output
    #[arg(long, default_value = "auto", value_parser = ["auto", "always", "never"], env = "APIDOC_COLOR")]
    color: String,

    /// Disable paging
    #[arg(long, default_value_t = false)]
    no_page: bool,
}

/// One rendered output: where it came from and what it contains.
struct Rendered {
    /// File name used when writing to an output directory.
    file_name: String,
    /// Rendered markdown.
    markdown: String,
}

fn load_config(cli: &Cli) -> Result<RenderConfig> {
    let mut config = match &cli.config {
        Some(path) => RenderConfig::load(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => RenderConfig::default(),
    };
    if cli.execute_examples {
        config = config.with_execute_examples(true);
    }
    if cli.strict_exports {
        config = config.with_strict_exports(true);
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn render_all(cli: &Cli, docs: &ApiDoc) -> Result<Vec<Rendered>> {
    let mut rendered = Vec::new();
    for page in &cli.pages {
        let text = fs::read_to_string(page)
            .with_context(|| format!("failed to read page {}", page.display()))?;
        let markdown = docs
            .render_page(&text)
            .with_context(|| format!("failed to render page {}", page.display()))?;
        rendered.push(Rendered {
            file_name: output_name(page),
            markdown,
        });
    }
    for module in &cli.modules {
        let markdown = docs
            .auto_module(module)
            .with_context(|| format!("failed to render module {module}"))?;
        rendered.push(Rendered {
            file_name: format!("{module}.md"),
            markdown,
        });
    }
    Ok(rendered)
}

/// Output file name for a page template: its name with a `.md` extension.
fn output_name(page: &Path) -> String {
    let stem = page
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());
    format!("{stem}.md")
}

fn run(cli: &Cli) -> Result<()> {
    if cli.pages.is_empty() && cli.modules.is_empty() {
        bail!("nothing to render: pass page templates or --module");
    }

    let config = load_config(cli)?;
    init_logging(&config.log_level);

    let index = DeclarationIndex::load(&cli.index)
        .with_context(|| format!("failed to load index {}", cli.index.display()))?;
    let docs = ApiDoc::new(index).with_config(config);
    let rendered = render_all(cli, &docs)?;

    if let Some(out_dir) = &cli.out_dir {
        fs::create_dir_all(out_dir)?;
        for output in &rendered {
            let path = out_dir.join(&output.file_name);
            fs::write(&path, &output.markdown)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        return Ok(());
    }

    let should_highlight = match cli.color.as_str() {
        "never" => false,
        "always" => true,
        _ => io::stdout().is_terminal(),
    };

    let mut output = rendered
        .into_iter()
        .map(|r| r.markdown)
        .collect::<Vec<_>>()
        .join("\n");
    if should_highlight {
        output = highlight_markdown(&output)?;
    }

    if io::stdout().is_terminal() && !cli.no_page {
        page_output(output)?;
    } else {
        println!("{output}");
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

fn page_output(content: String) -> Result<()> {
    let pager = std::env::var("PAGER").unwrap_or_else(|_| "less -R".to_string());
    let mut parts = pager.split_whitespace();
    let program = parts.next().unwrap_or("less");
    let mut child = Command::new(program)
        .args(parts)
        .stdin(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to start pager {program}"))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| io::Error::other("Failed to open stdin for pager"))?;

    std::thread::spawn(move || {
        stdin.write_all(content.as_bytes()).ok();
        // Explicitly drop stdin to signal EOF to the pager
        drop(stdin);
    });

    let status = child.wait().context("failed to wait for pager")?;
    if !status.success() {
        eprintln!("Pager exited with non-zero status: {status}");
    }
    Ok(())
}
