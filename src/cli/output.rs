//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;
use termtree::Tree;

use crate::domain::{FlatEntry, Forest, Node, SequenceItem};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print completed action (green label)
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Print plain output (no color, for data)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// One-line label of a node: `#id title (order n)`.
pub fn node_label(node: &Node) -> String {
    format!(
        "{} {} {}",
        format!("#{}", node.id).dimmed(),
        node.payload.title,
        format!("(order {})", node.sibling_order).dimmed()
    )
}

/// One-line label of an item: `[position] no. number  title  #id`.
pub fn item_label(item: &SequenceItem) -> String {
    format!(
        "[{}] {} {}  {}",
        item.position,
        format!("no. {}", item.number).bold(),
        item.payload.title,
        format!("#{}", item.id).dimmed()
    )
}

/// Indented listing of a flattened tree, two spaces per level.
pub fn flat_line(entry: &FlatEntry<Node>) -> String {
    format!("{}{}", "  ".repeat(entry.depth), node_label(&entry.item))
}

/// Rebuild display trees from a pre-order, depth-annotated listing.
///
/// Each entry becomes a child of the nearest preceding entry one level up;
/// depth 0 entries start a new tree.
pub fn render_forest(entries: &[FlatEntry<Node>]) -> Vec<Tree<String>> {
    let mut finished = Vec::new();
    let mut stack: Vec<Tree<String>> = Vec::new();

    for entry in entries {
        while stack.len() > entry.depth {
            fold_top(&mut stack, &mut finished);
        }
        stack.push(Tree::new(node_label(&entry.item)));
    }
    while !stack.is_empty() {
        fold_top(&mut stack, &mut finished);
    }
    finished
}

/// Footer for a rendered forest: node count, number of levels, leaf count.
pub fn forest_summary(forest: &Forest) -> String {
    format!(
        "{} node(s), {} level(s), {} leaf node(s)",
        forest.len(),
        forest.depth(),
        forest.leaves().len()
    )
}

fn fold_top(stack: &mut Vec<Tree<String>>, finished: &mut Vec<Tree<String>>) {
    if let Some(top) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => {
                parent.push(top);
            }
            None => finished.push(top),
        }
    }
}
