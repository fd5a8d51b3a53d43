use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use drawstyle_lib::dom::dom_tree::NodeRef;
use drawstyle_lib::editor::{EditorMode, PickOutcome};
use drawstyle_lib::picker::{classify, Classification};
use drawstyle_lib::style::{category_for, CssNode, Stylesheet};
use drawstyle_lib::{DrawingEditor, DrawingOptions};
use env_logger::Env;
use log::info;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "drawstyle")]
#[command(about = "Inspect and edit the stylesheet of IFC drawings")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the category block a selector is filed into.
    Category { selector: String },
    /// List the category blocks and rule selectors of a stylesheet.
    Rules {
        #[arg(long)]
        css: PathBuf,
    },
    /// Show how a click on an element resolves.
    Pick {
        svg: PathBuf,
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        resources: Resources,
    },
    /// Click an element, commit control values and save.
    Edit {
        svg: PathBuf,
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        resources: Resources,
        /// Child index to edit when the element is a symbol instance. Every
        /// part of the symbol is styled when omitted.
        #[arg(long)]
        part: Option<usize>,
        /// Control value, e.g. `stroke=#ff0000` or `fill=url(#brick)`.
        #[arg(long = "set", value_parser = parse_assignment, required = true)]
        values: Vec<(String, String)>,
    },
    /// Inject the definitions the stylesheet references into the drawing.
    SyncDefs {
        svg: PathBuf,
        #[command(flatten)]
        resources: Resources,
        /// Where to write the drawing; stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct Target {
    /// Element id.
    #[arg(long)]
    id: Option<String>,
    /// Position of the element below <svg>, counting from zero.
    #[arg(long)]
    nth: Option<usize>,
}

#[derive(Args)]
struct Resources {
    /// External stylesheet of the drawing.
    #[arg(long)]
    css: Option<PathBuf>,
    /// Asset map JSON resolving the drawing's resources.
    #[arg(long)]
    assets: Option<PathBuf>,
    #[arg(long)]
    patterns: Option<PathBuf>,
    #[arg(long)]
    markers: Option<PathBuf>,
    #[arg(long)]
    symbols: Option<PathBuf>,
}

impl Resources {
    fn options(&self) -> DrawingOptions {
        DrawingOptions {
            assets: self.assets.clone(),
            stylesheet: self.css.clone(),
            patterns: self.patterns.clone(),
            markers: self.markers.clone(),
            symbols: self.symbols.clone(),
        }
    }
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (property, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected property=value, got `{raw}`"))?;
    Ok((property.trim().to_owned(), value.trim().to_owned()))
}

fn find_target(editor: &DrawingEditor, target: &Target) -> Result<NodeRef> {
    let node = match (&target.id, target.nth) {
        (Some(id), _) => editor.document().find_by_id(id),
        (None, Some(nth)) => editor.document().nth_element(nth),
        (None, None) => None,
    };
    node.ok_or_else(|| anyhow!("target element not found"))
}

fn describe(outcome: &PickOutcome) -> String {
    match outcome {
        PickOutcome::Ignored(reason) => format!("ignored ({reason:?})"),
        PickOutcome::Symbol { id } => format!("symbol #{id}"),
        PickOutcome::DefaultText => "default text styling".to_owned(),
        PickOutcome::NoSelector => "no selector".to_owned(),
        PickOutcome::NotLoaded => "stylesheet not loaded".to_owned(),
        PickOutcome::Bound(rule) => format!("bound to `{}`", rule.borrow().selector()),
        PickOutcome::PendingNew { selector, fallback } => match fallback {
            Some(rule) => format!("new rule `{selector}` (values from `{}`)", rule.borrow().selector()),
            None => format!("new rule `{selector}`"),
        },
    }
}

fn list_rules(css: &str) {
    let sheet = Stylesheet::parse(css);
    for node in sheet.nodes() {
        match node {
            CssNode::Comment(comment) => {
                if let Some(label) = comment.block_label() {
                    println!("[{label}]");
                }
            }
            CssNode::Rule(rule) => println!("  {}", rule.borrow().selector()),
            CssNode::AtRule(at_rule) => println!("  @{}", at_rule.name),
        }
    }
}

fn pick(svg: PathBuf, target: Target, resources: Resources) -> Result<()> {
    let mut editor = DrawingEditor::open(&svg, &resources.options())?;
    let node = find_target(&editor, &target)?;
    let element = editor
        .document()
        .element(&node)
        .ok_or_else(|| anyhow!("target is not an element"))?;

    match classify(&element) {
        Classification::Candidates { ideal, priority, kind } => {
            println!("classification: {kind:?}");
            println!("ideal selector: {ideal}");
            println!("search priority: {}", priority.join(" | "));
        }
        other => println!("classification: {other:?}"),
    }
    let outcome = editor.click(&node).ok_or_else(|| anyhow!("target is not an element"))?;
    println!("outcome: {}", describe(&outcome));
    println!("title: {}", editor.session().title());
    Ok(())
}

fn edit(
    svg: PathBuf,
    target: Target,
    resources: Resources,
    part: Option<usize>,
    assignments: Vec<(String, String)>,
) -> Result<()> {
    let mut editor = DrawingEditor::open(&svg, &resources.options())?;
    let node = find_target(&editor, &target)?;
    let outcome = editor.click(&node).ok_or_else(|| anyhow!("target is not an element"))?;
    info!("{}", describe(&outcome));

    let in_symbol = matches!(editor.session().mode(), EditorMode::Symbol { .. });
    if let (true, Some(index)) = (in_symbol, part) {
        if editor.select_symbol_part(index)?.is_none() {
            bail!("symbol has no child at index {index}");
        }
    }

    let mut values = editor.session().values().clone();
    for (property, value) in &assignments {
        if !values.set(property, value) {
            bail!("`{property}` is not a control of this selection");
        }
    }

    // Without --part, a symbol is styled as a whole.
    if in_symbol && part.is_none() {
        let written = editor.apply_symbol_style_to_all(&values)?;
        println!("styled {written} symbol parts");
        editor.save()?;
        return Ok(());
    }

    let result = editor.commit(&values)?;
    if let Some(insertion) = result.insertion {
        println!("created `{}` in {}", result.rule.borrow().selector(), insertion.category());
    } else {
        println!("updated `{}`", result.rule.borrow().selector());
    }
    editor.save()?;
    Ok(())
}

fn sync_defs(svg: PathBuf, resources: Resources, output: Option<PathBuf>) -> Result<()> {
    let mut editor = DrawingEditor::open(&svg, &resources.options())?;
    let report = editor.refresh();
    for id in &report.unknown {
        eprintln!("no definition for #{id}");
    }
    let markup = editor.document().to_markup();
    match output {
        Some(path) => {
            fs::write(&path, markup).with_context(|| format!("writing {}", path.display()))?;
            println!("{} definitions injected into {}", report.inserted.len(), path.display());
        }
        None => println!("{markup}"),
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // parse the args given in terminal
    let cli = Cli::parse();

    match cli.command {
        Command::Category { selector } => println!("{}", category_for(&selector)),
        Command::Rules { css } => {
            let text = fs::read_to_string(&css).with_context(|| format!("reading {}", css.display()))?;
            list_rules(&text);
        }
        Command::Pick { svg, target, resources } => pick(svg, target, resources)?,
        Command::Edit {
            svg,
            target,
            resources,
            part,
            values,
        } => edit(svg, target, resources, part, values)?,
        Command::SyncDefs {
            svg,
            resources,
            output,
        } => sync_defs(svg, resources, output)?,
    }
    Ok(())
}
