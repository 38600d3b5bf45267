//! Command-level tests against temporary directories

use clap::Parser;
use std::fs;
use tempfile::TempDir;
use texkg_cli::commands::{execute_extract, execute_prune};
use texkg_cli::config::OutputFormat;
use texkg_cli::{Cli, Command, Config, Formatter};
use texkg_domain::{EntityType, Graph, GraphNode};
use texkg_store::{read_graph_file, write_graph_file};

fn quiet() -> Formatter {
    Formatter::new(OutputFormat::Quiet, false)
}

fn parse(argv: &[&str]) -> Command {
    let mut full = vec!["texkg"];
    full.extend_from_slice(argv);
    Cli::parse_from(full).command
}

#[tokio::test]
async fn test_local_extract_writes_graph() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(
        src.join("book.tex"),
        "\\section{Basics}\n\\begin{definition}\\label{def:x}An object $x$.\\end{definition}\n\\section{Results}\n\\begin{theorem}\\label{thm:y}By \\ref{def:x}, $x = x$.\\end{theorem}\n",
    )
    .unwrap();
    let out = dir.path().join("graph.json");

    let src_arg = src.to_string_lossy().into_owned();
    let out_arg = out.to_string_lossy().into_owned();
    let Command::Extract(args) = parse(&["extract", &src_arg, "-o", &out_arg, "-m", "local"]) else {
        panic!("Expected Extract command");
    };
    execute_extract(args, &Config::default(), &quiet()).await.unwrap();

    let graph = read_graph_file(&out).unwrap();
    assert!(graph.node("tex:x").is_some());
    assert!(graph.node("tex:y").is_some());
}

#[test]
fn test_prune_rewrites_graph() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("graph.json");
    let graph = Graph {
        nodes: vec![
            GraphNode::new("f1", EntityType::Formula, "Step").with_content("a = b + c"),
            GraphNode::new("tex:main", EntityType::Theorem, "Main").with_content("Every bounded sequence converges."),
        ],
        edges: vec![],
    };
    write_graph_file(&path, &graph).unwrap();

    let path_arg = path.to_string_lossy().into_owned();
    let Command::Prune(args) = parse(&["prune", &path_arg]) else {
        panic!("Expected Prune command");
    };
    execute_prune(args, &Config::default(), &quiet()).unwrap();

    let pruned = read_graph_file(&path).unwrap();
    let ids: Vec<&str> = pruned.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["tex:main"]);
}

#[test]
fn test_prune_dry_run_leaves_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("graph.json");
    let graph = Graph {
        nodes: vec![GraphNode::new("f1", EntityType::Formula, "Step").with_content("a = b + c")],
        edges: vec![],
    };
    write_graph_file(&path, &graph).unwrap();
    let before = fs::read_to_string(&path).unwrap();

    let path_arg = path.to_string_lossy().into_owned();
    let Command::Prune(args) = parse(&["prune", &path_arg, "--dry-run"]) else {
        panic!("Expected Prune command");
    };
    execute_prune(args, &Config::default(), &quiet()).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}
